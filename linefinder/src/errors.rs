//! Error types for linefinder.
//!
//! Every failure of a `find` run surfaces as a single [`FinderError`]. The
//! variants follow the life of a run:
//!
//! 1. **Argument validation** happens before any file is touched
//!    (`InvalidArgument`, `NegativeContextSize`).
//! 2. **I/O** failures from any worker abort the whole run
//!    (`FileNotFound`, `PermissionDenied`, `IoError`).
//! 3. **Coordination** failures come from the worker pool itself
//!    (`Timeout`, `Aggregation`, `Cancelled`, `WorkerPool`).
//!
//! ```rust,ignore
//! match finder.find(input, output, Some("target"), 2) {
//!     Ok(summary) => println!("{} lines written", summary.lines_written),
//!     Err(FinderError::FileNotFound(path)) => eprintln!("missing {}", path.display()),
//!     Err(FinderError::Timeout { timeout }) => eprintln!("gave up after {:?}", timeout),
//!     Err(e) => eprintln!("{}", e),
//! }
//! ```
use std::io;
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;

/// Result type for line finder operations
pub type FinderResult<T> = Result<T, FinderError>;

/// Errors that can occur while finding lines
#[derive(Error, Debug)]
pub enum FinderError {
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),
    #[error("Context line count must be non-negative, got {0}")]
    NegativeContextSize(i64),
    #[error("File not found: {0}")]
    FileNotFound(PathBuf),
    #[error("Permission denied: {0}")]
    PermissionDenied(PathBuf),
    #[error("IO error: {0}")]
    IoError(#[from] io::Error),
    #[error("Search did not finish within {}", display_duration(.timeout))]
    Timeout { timeout: Duration },
    #[error("Error combining results: {0}")]
    Aggregation(String),
    #[error("Scan cancelled")]
    Cancelled,
    #[error("Worker pool error: {0}")]
    WorkerPool(String),
    #[error("Configuration error: {0}")]
    ConfigError(String),
}

fn display_duration(duration: &Duration) -> humantime::FormattedDuration {
    humantime::format_duration(*duration)
}

impl FinderError {
    pub fn invalid_argument(msg: impl Into<String>) -> Self {
        Self::InvalidArgument(msg.into())
    }

    pub fn file_not_found(path: impl Into<PathBuf>) -> Self {
        Self::FileNotFound(path.into())
    }

    pub fn permission_denied(path: impl Into<PathBuf>) -> Self {
        Self::PermissionDenied(path.into())
    }

    pub fn timeout(timeout: Duration) -> Self {
        Self::Timeout { timeout }
    }

    pub fn aggregation(msg: impl Into<String>) -> Self {
        Self::Aggregation(msg.into())
    }

    pub fn worker_pool(msg: impl Into<String>) -> Self {
        Self::WorkerPool(msg.into())
    }

    pub fn config_error(msg: impl Into<String>) -> Self {
        Self::ConfigError(msg.into())
    }

    /// Classifies an I/O error raised while working on `path`
    pub fn from_io(path: &Path, err: io::Error) -> Self {
        match err.kind() {
            io::ErrorKind::NotFound => Self::file_not_found(path),
            io::ErrorKind::PermissionDenied => Self::permission_denied(path),
            _ => Self::IoError(err),
        }
    }
}

impl From<config::ConfigError> for FinderError {
    fn from(err: config::ConfigError) -> Self {
        Self::ConfigError(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_creation() {
        let path = Path::new("input.txt");
        let err = FinderError::file_not_found(path);
        assert!(matches!(err, FinderError::FileNotFound(_)));

        let err = FinderError::permission_denied(path);
        assert!(matches!(err, FinderError::PermissionDenied(_)));

        let err = FinderError::invalid_argument("Input filename shouldn't be empty");
        assert!(matches!(err, FinderError::InvalidArgument(_)));

        let err = FinderError::aggregation("worker 3 disconnected");
        assert!(matches!(err, FinderError::Aggregation(_)));
    }

    #[test]
    fn test_error_messages() {
        let err = FinderError::NegativeContextSize(-1);
        assert_eq!(
            err.to_string(),
            "Context line count must be non-negative, got -1"
        );

        let err = FinderError::timeout(Duration::from_secs(60));
        assert_eq!(err.to_string(), "Search did not finish within 1m");

        let err = FinderError::file_not_found("input.txt");
        assert_eq!(err.to_string(), "File not found: input.txt");

        let err = FinderError::config_error("chunk_size must be positive");
        assert_eq!(
            err.to_string(),
            "Configuration error: chunk_size must be positive"
        );
    }

    #[test]
    fn test_io_classification() {
        let path = Path::new("missing.txt");
        let err = FinderError::from_io(path, io::Error::from(io::ErrorKind::NotFound));
        assert!(matches!(err, FinderError::FileNotFound(p) if p == path));

        let err = FinderError::from_io(path, io::Error::from(io::ErrorKind::PermissionDenied));
        assert!(matches!(err, FinderError::PermissionDenied(_)));

        let err = FinderError::from_io(path, io::Error::from(io::ErrorKind::UnexpectedEof));
        assert!(matches!(err, FinderError::IoError(_)));
    }
}
