use std::io::{BufWriter, Read, Seek, Write};
use std::path::Path;
use tempfile::NamedTempFile;
use tracing::debug;

use crate::errors::{FinderError, FinderResult};
use crate::lines::{decode_line, LineReader};
use crate::results::ResultSet;

/// Terminator written after every output line
#[cfg(windows)]
pub const LINE_TERMINATOR: &str = "\r\n";
#[cfg(not(windows))]
pub const LINE_TERMINATOR: &str = "\n";

/// Written instead of results when no keyword was given
pub const PLACEHOLDER: &str = " ";

/// Reads the line at each offset of `path`, in ascending offset order
pub fn materialize(path: &Path, offsets: &ResultSet) -> FinderResult<Vec<String>> {
    let mut reader = LineReader::open(path)?;
    read_lines(&mut reader, offsets).map_err(|e| match e {
        FinderError::IoError(io) => FinderError::from_io(path, io),
        other => other,
    })
}

/// Same as [`materialize`] over an already opened reader; empty lines are
/// left out.
pub fn read_lines<R: Read + Seek>(
    reader: &mut LineReader<R>,
    offsets: &ResultSet,
) -> FinderResult<Vec<String>> {
    let mut lines = Vec::with_capacity(offsets.len());
    let mut buf = Vec::new();
    for &offset in offsets {
        reader.seek(offset)?;
        if reader.read_line(&mut buf)? && !buf.is_empty() {
            lines.push(decode_line(&buf).into_owned());
        }
    }
    Ok(lines)
}

/// Writes each line followed by [`LINE_TERMINATOR`].
///
/// Content goes to a temporary file beside `output` that replaces it only
/// once everything is written, so a failed run never leaves a partial file.
pub fn write_lines(output: &Path, lines: &[String]) -> FinderResult<()> {
    write_atomically(output, |writer| {
        for line in lines {
            writer.write_all(line.as_bytes())?;
            writer.write_all(LINE_TERMINATOR.as_bytes())?;
        }
        Ok(())
    })?;
    debug!("Wrote {} lines to {}", lines.len(), output.display());
    Ok(())
}

/// Writes the single-space placeholder
pub fn write_placeholder(output: &Path) -> FinderResult<()> {
    write_atomically(output, |writer| writer.write_all(PLACEHOLDER.as_bytes()))
}

fn write_atomically<F>(output: &Path, fill: F) -> FinderResult<()>
where
    F: FnOnce(&mut BufWriter<&mut NamedTempFile>) -> std::io::Result<()>,
{
    let dir = match output.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    let mut temp = NamedTempFile::new_in(dir).map_err(|e| FinderError::from_io(dir, e))?;
    {
        let mut writer = BufWriter::new(&mut temp);
        fill(&mut writer).map_err(|e| FinderError::from_io(output, e))?;
        writer.flush().map_err(|e| FinderError::from_io(output, e))?;
    }
    temp.persist(output)
        .map_err(|e| FinderError::from_io(output, e.error))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;
    use tempfile::tempdir;

    #[test]
    fn test_read_lines_in_offset_order() {
        let text = b"foo\nbar\nTARGET\nbaz\nqux\n".to_vec();
        let mut reader = LineReader::new(Cursor::new(text));
        let offsets: ResultSet = [15, 4, 8].into_iter().collect();
        assert_eq!(
            read_lines(&mut reader, &offsets).unwrap(),
            vec!["bar", "TARGET", "baz"]
        );
    }

    #[test]
    fn test_read_lines_skips_empty() {
        let text = b"a\n\nb\r\n".to_vec();
        let mut reader = LineReader::new(Cursor::new(text));
        let offsets: ResultSet = [0, 2, 3, 100].into_iter().collect();
        assert_eq!(read_lines(&mut reader, &offsets).unwrap(), vec!["a", "b"]);
    }

    #[test]
    fn test_materialize_and_write() {
        let dir = tempdir().unwrap();
        let input = dir.path().join("input.txt");
        let output = dir.path().join("output.txt");
        std::fs::write(&input, "first\nsecond é\nthird\n").unwrap();

        let lines = materialize(&input, &[0, 6].into_iter().collect()).unwrap();
        write_lines(&output, &lines).unwrap();

        let expected = format!("first{0}second é{0}", LINE_TERMINATOR);
        assert_eq!(std::fs::read_to_string(&output).unwrap(), expected);
    }

    #[test]
    fn test_write_replaces_existing_file() {
        let dir = tempdir().unwrap();
        let output = dir.path().join("output.txt");
        std::fs::write(&output, "stale content that is longer\n").unwrap();

        write_lines(&output, &["fresh".to_string()]).unwrap();
        assert_eq!(
            std::fs::read_to_string(&output).unwrap(),
            format!("fresh{}", LINE_TERMINATOR)
        );
    }

    #[test]
    fn test_write_placeholder() {
        let dir = tempdir().unwrap();
        let output = dir.path().join("output.txt");
        write_placeholder(&output).unwrap();
        assert_eq!(std::fs::read(&output).unwrap(), b" ");
    }

    #[test]
    fn test_write_into_missing_directory_fails() {
        let dir = tempdir().unwrap();
        let output = dir.path().join("missing").join("output.txt");
        let result = write_lines(&output, &["x".to_string()]);
        assert!(matches!(result, Err(FinderError::FileNotFound(_))));
        assert!(!output.exists());
    }

    #[test]
    fn test_materialize_missing_file() {
        let result = materialize(Path::new("/no/such/file.txt"), &ResultSet::new());
        assert!(matches!(result, Err(FinderError::FileNotFound(_))));
    }
}
