//! Keyword scanning over one byte range of a file.
//!
//! A range owns every line whose first byte lies inside it. Scanning a range
//! therefore starts at the first line start at or after `range.start` and
//! stops once the cursor reaches `range.end`; the line that straddles the end
//! is finished by this range and skipped by the next one.
//!
//! For each matching line the scanner records a context window: up to
//! `context_size` non-empty lines before it, the line itself, and the
//! non-empty lines among the next `context_size` lines after it. Blank lines
//! use up forward context without being recorded. Context may reach across range
//! boundaries in both directions, so a match near a chunk edge gets the same
//! window it would get in a single-range scan.
use std::collections::VecDeque;
use std::io::{Read, Seek};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use tracing::trace;

use crate::errors::{FinderError, FinderResult};
use crate::lines::{decode_line, LineReader};
use crate::planner::ByteRange;
use crate::progress::ScanProgress;
use crate::results::{LineOffset, MatchContext, ResultSet};

/// Something that can find the context offsets of matches inside a range.
///
/// The coordinator only talks to this trait, which keeps the worker pool
/// independent of where the bytes come from.
pub trait RangeScan: Send + Sync {
    fn scan(
        &self,
        range: ByteRange,
        progress: &ScanProgress,
        cancel: &AtomicBool,
    ) -> FinderResult<ResultSet>;
}

/// Case-insensitive keyword scanner over a file on disk
#[derive(Debug, Clone)]
pub struct LineScanner {
    path: PathBuf,
    keyword_lower: String,
    context_size: u32,
}

impl LineScanner {
    pub fn new(path: impl Into<PathBuf>, keyword: &str, context_size: u32) -> Self {
        Self {
            path: path.into(),
            keyword_lower: keyword.to_lowercase(),
            context_size,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn keyword(&self) -> &str {
        &self.keyword_lower
    }

    pub fn context_size(&self) -> u32 {
        self.context_size
    }

    fn is_match(&self, line: &[u8]) -> bool {
        decode_line(line).to_lowercase().contains(&self.keyword_lower)
    }

    /// Scans `range` using an already opened reader
    pub fn scan_reader<R: Read + Seek>(
        &self,
        reader: &mut LineReader<R>,
        range: ByteRange,
        progress: &ScanProgress,
        cancel: &AtomicBool,
    ) -> FinderResult<ResultSet> {
        let window = self.context_size as usize;
        let mut result = ResultSet::new();

        reader.seek_line_start(range.start)?;
        let first = reader.position();
        if first >= range.end {
            return Ok(result);
        }

        let mut history: VecDeque<LineOffset> = VecDeque::with_capacity(window);
        history.extend(reader.preceding_line_starts(first, window)?);

        let mut line = Vec::new();
        while reader.position() < range.end {
            if cancel.load(Ordering::Relaxed) {
                return Err(FinderError::Cancelled);
            }

            let offset = reader.position();
            if !reader.read_line(&mut line)? {
                break;
            }
            if line.is_empty() {
                continue;
            }
            progress.record_line();

            if self.is_match(&line) {
                progress.record_match();
                trace!(offset, "keyword match");

                let mut context: MatchContext = history.iter().copied().collect();
                context.insert(offset);
                self.read_following(reader, &mut line, &mut context)?;
                result.add_context(context);
            }

            if window > 0 {
                if history.len() == window {
                    history.pop_front();
                }
                history.push_back(offset);
            }
        }

        Ok(result)
    }

    /// Adds the offsets of the non-empty lines among the next `context_size`
    /// lines, then puts the cursor back right after the matching line so those
    /// lines still get tested themselves.
    fn read_following<R: Read + Seek>(
        &self,
        reader: &mut LineReader<R>,
        line: &mut Vec<u8>,
        context: &mut MatchContext,
    ) -> FinderResult<()> {
        let resume = reader.position();
        let mut gathered = 0;
        while gathered < self.context_size {
            let offset = reader.position();
            if !reader.read_line(line)? {
                break;
            }
            gathered += 1;
            if !line.is_empty() {
                context.insert(offset);
            }
        }
        reader.seek(resume)?;
        Ok(())
    }
}

impl RangeScan for LineScanner {
    fn scan(
        &self,
        range: ByteRange,
        progress: &ScanProgress,
        cancel: &AtomicBool,
    ) -> FinderResult<ResultSet> {
        let mut reader = LineReader::open(&self.path)?;
        self.scan_reader(&mut reader, range, progress, cancel)
            .map_err(|e| match e {
                FinderError::IoError(io) => FinderError::from_io(&self.path, io),
                other => other,
            })
    }
}
