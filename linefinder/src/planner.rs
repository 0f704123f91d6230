use std::num::NonZeroU64;
use std::path::Path;

use crate::errors::{FinderError, FinderResult};

/// Half-open interval `[start, end)` over the bytes of a file
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ByteRange {
    pub start: u64,
    pub end: u64,
}

impl ByteRange {
    pub fn new(start: u64, end: u64) -> Self {
        debug_assert!(start <= end, "range start {start} past end {end}");
        Self { start, end }
    }

    pub fn len(&self) -> u64 {
        self.end - self.start
    }

    pub fn is_empty(&self) -> bool {
        self.start == self.end
    }
}

/// Splits `[0, file_size)` into contiguous ranges of `chunk_size` bytes.
/// The last range is shorter when the size is not a multiple of the chunk.
pub fn plan(file_size: u64, chunk_size: NonZeroU64) -> Vec<ByteRange> {
    let chunk = chunk_size.get();
    let count = file_size.div_ceil(chunk);
    (0..count)
        .map(|i| {
            let start = i * chunk;
            ByteRange::new(start, (start + chunk).min(file_size))
        })
        .collect()
}

/// Plans the ranges of the file at `path` from its current size
pub fn plan_file(path: &Path, chunk_size: NonZeroU64) -> FinderResult<Vec<ByteRange>> {
    let file_size = path
        .metadata()
        .map_err(|e| FinderError::from_io(path, e))?
        .len();
    Ok(plan(file_size, chunk_size))
}
