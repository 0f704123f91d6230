//! Byte-exact line reading over a seekable source.
//!
//! Lines are identified by the offset of their first byte. A line ends at
//! `\n`, `\r\n` or a lone `\r`, and the terminator is never part of the line's
//! bytes. Content is handed out as raw bytes; [`decode_line`] turns them into
//! text without ever failing on malformed UTF-8.
use memchr::memchr2;
use std::borrow::Cow;
use std::fs::File;
use std::io::{self, BufRead, BufReader, Read, Seek, SeekFrom};
use std::path::Path;

use crate::errors::{FinderError, FinderResult};

const BUFFER_CAPACITY: usize = 8192;
const BACKSCAN_WINDOW: u64 = 4096;

/// Decodes raw line bytes, replacing invalid UTF-8 sequences with U+FFFD
pub fn decode_line(bytes: &[u8]) -> Cow<'_, str> {
    String::from_utf8_lossy(bytes)
}

/// Buffered reader that tracks the absolute offset of its cursor
#[derive(Debug)]
pub struct LineReader<R> {
    inner: BufReader<R>,
    pos: u64,
}

impl LineReader<File> {
    /// Opens `path` for reading with its own independent cursor
    pub fn open(path: &Path) -> FinderResult<Self> {
        let file = File::open(path).map_err(|e| FinderError::from_io(path, e))?;
        Ok(Self::new(file))
    }
}

impl<R: Read + Seek> LineReader<R> {
    /// Wraps a source whose cursor sits at offset 0
    pub fn new(inner: R) -> Self {
        Self {
            inner: BufReader::with_capacity(BUFFER_CAPACITY, inner),
            pos: 0,
        }
    }

    /// Absolute offset of the next byte to be read
    pub fn position(&self) -> u64 {
        self.pos
    }

    /// Moves the cursor to `offset`, reusing buffered bytes when possible
    pub fn seek(&mut self, offset: u64) -> io::Result<()> {
        if offset == self.pos {
            return Ok(());
        }
        match i64::try_from(offset).ok().zip(i64::try_from(self.pos).ok()) {
            Some((to, from)) => self.inner.seek_relative(to - from)?,
            None => {
                self.inner.seek(SeekFrom::Start(offset))?;
            }
        }
        self.pos = offset;
        Ok(())
    }

    /// Reads the next line into `buf` without its terminator.
    /// Returns `false` when the cursor is already at end of input.
    pub fn read_line(&mut self, buf: &mut Vec<u8>) -> io::Result<bool> {
        buf.clear();
        let mut read_any = false;
        loop {
            let (terminator, used) = {
                let available = match self.inner.fill_buf() {
                    Ok(bytes) => bytes,
                    Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
                    Err(e) => return Err(e),
                };
                if available.is_empty() {
                    return Ok(read_any);
                }
                match memchr2(b'\n', b'\r', available) {
                    Some(i) => {
                        buf.extend_from_slice(&available[..i]);
                        (Some(available[i]), i + 1)
                    }
                    None => {
                        buf.extend_from_slice(available);
                        (None, available.len())
                    }
                }
            };
            read_any = true;
            self.consume(used);

            match terminator {
                Some(b'\r') => {
                    self.skip_newline()?;
                    return Ok(true);
                }
                Some(_) => return Ok(true),
                None => {}
            }
        }
    }

    /// Positions the cursor at the first line start at or after `offset`.
    ///
    /// Reading starts one byte early so that an `offset` which already is a
    /// line start is kept rather than skipped.
    pub fn seek_line_start(&mut self, offset: u64) -> io::Result<()> {
        if offset == 0 {
            return self.seek(0);
        }
        self.seek(offset - 1)?;
        let mut discarded = Vec::new();
        self.read_line(&mut discarded)?;
        Ok(())
    }

    /// Returns up to `count` offsets of the non-empty lines that precede the
    /// line starting at `line_start`, in ascending order. The cursor is left
    /// where it was.
    pub fn preceding_line_starts(&mut self, line_start: u64, count: usize) -> io::Result<Vec<u64>> {
        if count == 0 || line_start == 0 {
            return Ok(Vec::new());
        }

        let restore = self.pos;
        let mut window = BACKSCAN_WINDOW;
        let starts = loop {
            let from = line_start.saturating_sub(window);
            let mut bytes = vec![0u8; (line_start - from) as usize];
            self.seek(from)?;
            self.inner.read_exact(&mut bytes)?;
            self.pos = line_start;

            let starts = non_empty_line_starts(&bytes, from, from == 0);
            if starts.len() >= count || from == 0 {
                break starts[starts.len().saturating_sub(count)..].to_vec();
            }
            window = window.saturating_mul(2);
        };

        self.seek(restore)?;
        Ok(starts)
    }

    fn consume(&mut self, n: usize) {
        self.inner.consume(n);
        self.pos += n as u64;
    }

    fn skip_newline(&mut self) -> io::Result<()> {
        let newline = loop {
            match self.inner.fill_buf() {
                Ok(bytes) => break bytes.first() == Some(&b'\n'),
                Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
                Err(e) => return Err(e),
            }
        };
        if newline {
            self.consume(1);
        }
        Ok(())
    }
}

/// Start offsets of the non-empty lines fully contained in `bytes`, where
/// `bytes[0]` sits at file offset `base`. The leading fragment only counts as
/// a line when `at_file_start` is set.
fn non_empty_line_starts(bytes: &[u8], base: u64, at_file_start: bool) -> Vec<u64> {
    let mut starts = Vec::new();
    let mut line_begin = at_file_start.then_some(0usize);
    let mut i = 0;

    while let Some(found) = memchr2(b'\n', b'\r', &bytes[i..]) {
        let terminator = i + found;
        if let Some(begin) = line_begin {
            if terminator > begin {
                starts.push(base + begin as u64);
            }
        }
        let mut next = terminator + 1;
        if bytes[terminator] == b'\r' && bytes.get(next) == Some(&b'\n') {
            next += 1;
        }
        line_begin = Some(next);
        i = next;
    }

    starts
}
