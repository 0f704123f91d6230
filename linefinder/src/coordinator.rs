//! Runs range scans on a fixed-size worker pool and merges their results.
//!
//! # Partitioning
//!
//! The planned ranges are dealt out round-robin: worker `w` of `n` gets ranges
//! `w`, `w + n`, `w + 2n`, ... Every range is scanned by exactly one worker,
//! and interleaving keeps the per-worker byte count balanced even when the
//! last range is short.
//!
//! # Completion and cancellation
//!
//! Each worker sends one message with its merged offsets over a channel. The
//! coordinator waits for all of them against a single deadline. When the
//! deadline passes, or a worker reports an error, it raises a shared
//! cancellation flag that the scanners check before every line, discards
//! whatever was merged so far and fails the whole run. A worker that panics
//! never sends, which shows up as a disconnected channel.
use rayon::ThreadPoolBuilder;
use std::num::NonZeroUsize;
use std::path::Path;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::{self, RecvTimeoutError};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{debug, error, info};

use crate::config::FinderConfig;
use crate::errors::{FinderError, FinderResult};
use crate::planner::{plan_file, ByteRange};
use crate::progress::ScanProgress;
use crate::results::ResultSet;
use crate::scanner::{LineScanner, RangeScan};

/// Deals `ranges` round-robin into at most `workers` non-empty partitions
pub fn partition(ranges: &[ByteRange], workers: NonZeroUsize) -> Vec<Vec<ByteRange>> {
    let count = workers.get().min(ranges.len());
    let mut partitions = vec![Vec::new(); count];
    for (i, range) in ranges.iter().enumerate() {
        partitions[i % count].push(*range);
    }
    partitions
}

/// Scans every range with `worker_count` threads and merges the offsets.
///
/// Fails as a whole if any worker fails, panics, or the `timeout` elapses.
pub fn run_workers<S: RangeScan + 'static>(
    scanner: Arc<S>,
    ranges: &[ByteRange],
    worker_count: NonZeroUsize,
    timeout: Duration,
    progress: Arc<ScanProgress>,
) -> FinderResult<ResultSet> {
    let partitions = partition(ranges, worker_count);
    if partitions.is_empty() {
        return Ok(ResultSet::new());
    }
    debug!(
        "Dealt {} ranges to {} workers",
        ranges.len(),
        partitions.len()
    );

    let pool = ThreadPoolBuilder::new()
        .num_threads(partitions.len())
        .thread_name(|i| format!("linefinder-worker-{}", i))
        .panic_handler(|_| error!("Scan worker panicked"))
        .build()
        .map_err(|e| FinderError::worker_pool(e.to_string()))?;

    let cancel = Arc::new(AtomicBool::new(false));
    let (tx, rx) = mpsc::channel::<(usize, FinderResult<ResultSet>)>();
    let expected = partitions.len();

    for (worker, assigned) in partitions.into_iter().enumerate() {
        let tx = tx.clone();
        let scanner = Arc::clone(&scanner);
        let progress = Arc::clone(&progress);
        let cancel = Arc::clone(&cancel);
        pool.spawn(move || {
            let outcome = scan_assigned(scanner.as_ref(), &assigned, &progress, &cancel);
            if outcome.is_ok() {
                progress.worker_finished(worker);
            }
            let _ = tx.send((worker, outcome));
        });
    }
    drop(tx);

    let deadline = Instant::now() + timeout;
    let mut merged = ResultSet::new();
    for _ in 0..expected {
        let remaining = deadline.saturating_duration_since(Instant::now());
        match rx.recv_timeout(remaining) {
            Ok((worker, Ok(offsets))) => {
                debug!(worker, offsets = offsets.len(), "Worker finished");
                merged.merge(offsets);
            }
            Ok((worker, Err(e))) => {
                cancel.store(true, Ordering::Relaxed);
                error!(worker, "Worker failed: {}", e);
                return Err(e);
            }
            Err(RecvTimeoutError::Timeout) => {
                cancel.store(true, Ordering::Relaxed);
                error!("Workers did not finish within {:?}, cancelling", timeout);
                return Err(FinderError::timeout(timeout));
            }
            Err(RecvTimeoutError::Disconnected) => {
                cancel.store(true, Ordering::Relaxed);
                return Err(FinderError::aggregation(
                    "a worker exited without returning its results",
                ));
            }
        }
    }

    Ok(merged)
}

fn scan_assigned<S: RangeScan + ?Sized>(
    scanner: &S,
    ranges: &[ByteRange],
    progress: &ScanProgress,
    cancel: &AtomicBool,
) -> FinderResult<ResultSet> {
    let mut found = ResultSet::new();
    for range in ranges {
        found.merge(scanner.scan(*range, progress, cancel)?);
        progress.record_range();
    }
    Ok(found)
}

/// Finds the context offsets of every line of `path` containing `keyword`,
/// ignoring case, in ascending file order.
pub fn find_matches(
    path: &Path,
    keyword: &str,
    context_size: u32,
    config: &FinderConfig,
    progress: Arc<ScanProgress>,
) -> FinderResult<ResultSet> {
    let ranges = plan_file(path, config.chunk_size)?;
    scan_ranges(path, &ranges, keyword, context_size, config, progress)
}

/// Same as [`find_matches`] over ranges the caller already planned
pub fn scan_ranges(
    path: &Path,
    ranges: &[ByteRange],
    keyword: &str,
    context_size: u32,
    config: &FinderConfig,
    progress: Arc<ScanProgress>,
) -> FinderResult<ResultSet> {
    info!(
        "Scanning {} ({} bytes, {} ranges) for {:?} with {} workers",
        path.display(),
        ranges.last().map_or(0, |r| r.end),
        ranges.len(),
        keyword,
        config.worker_count
    );

    let scanner = Arc::new(LineScanner::new(path, keyword, context_size));
    run_workers(scanner, ranges, config.worker_count, config.timeout, progress)
}
