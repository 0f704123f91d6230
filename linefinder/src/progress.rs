use indicatif::{ProgressBar, ProgressDrawTarget, ProgressStyle};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Mutex;
use tracing::{debug, info};

/// Counters shared by every worker of a single run.
///
/// Updates are lock-free; only the textual report of a finished worker takes
/// the console lock, so two workers finishing together never interleave
/// their output.
#[derive(Debug)]
pub struct ScanProgress {
    lines_scanned: AtomicU64,
    matches_found: AtomicU64,
    ranges_completed: AtomicU64,
    workers_finished: AtomicU64,
    bar: Option<ProgressBar>,
    console: Mutex<()>,
}

impl ScanProgress {
    /// Creates counters that only report through the log
    pub fn new() -> Self {
        Self {
            lines_scanned: AtomicU64::new(0),
            matches_found: AtomicU64::new(0),
            ranges_completed: AtomicU64::new(0),
            workers_finished: AtomicU64::new(0),
            bar: None,
            console: Mutex::new(()),
        }
    }

    /// Creates counters that also drive a progress bar over `total_ranges`
    pub fn with_bar(total_ranges: u64) -> Self {
        let bar = ProgressBar::with_draw_target(Some(total_ranges), ProgressDrawTarget::stderr());
        if let Ok(style) =
            ProgressStyle::default_bar().template("[{elapsed_precise}] {bar:40.cyan/blue} {pos}/{len} ranges {msg}")
        {
            bar.set_style(style.progress_chars("=>-"));
        }
        Self {
            bar: Some(bar),
            ..Self::new()
        }
    }

    pub fn record_line(&self) {
        self.lines_scanned.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_match(&self) {
        self.matches_found.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_range(&self) {
        self.ranges_completed.fetch_add(1, Ordering::Relaxed);
        if let Some(bar) = &self.bar {
            bar.inc(1);
        }
    }

    /// Reports the running totals once a worker has scanned all its ranges
    pub fn worker_finished(&self, worker: usize) {
        self.workers_finished.fetch_add(1, Ordering::Relaxed);
        let stats = self.snapshot();
        let line = format!(
            "Processed: {}, matches found {}",
            stats.lines_scanned, stats.matches_found
        );

        let _console = self.console.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
        match &self.bar {
            Some(bar) => bar.set_message(line),
            None => debug!(worker, "{}", line),
        }
    }

    /// Gets a copy of the current counter values
    pub fn snapshot(&self) -> ProgressStats {
        ProgressStats {
            lines_scanned: self.lines_scanned.load(Ordering::Relaxed),
            matches_found: self.matches_found.load(Ordering::Relaxed),
            ranges_completed: self.ranges_completed.load(Ordering::Relaxed),
            workers_finished: self.workers_finished.load(Ordering::Relaxed),
        }
    }

    /// Removes the progress bar, if any, and logs the final totals
    pub fn finish(&self) {
        if let Some(bar) = &self.bar {
            bar.finish_and_clear();
        }
        let stats = self.snapshot();
        info!(
            "Scan finished: {} lines scanned, {} matches, {} ranges, {} workers",
            stats.lines_scanned, stats.matches_found, stats.ranges_completed, stats.workers_finished
        );
    }
}

impl Default for ScanProgress {
    fn default() -> Self {
        Self::new()
    }
}

/// Point-in-time copy of the progress counters
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ProgressStats {
    pub lines_scanned: u64,
    pub matches_found: u64,
    pub ranges_completed: u64,
    pub workers_finished: u64,
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::thread;

    #[test]
    fn test_counters() {
        let progress = ScanProgress::new();
        progress.record_line();
        progress.record_line();
        progress.record_match();
        progress.record_range();
        progress.worker_finished(0);

        assert_eq!(
            progress.snapshot(),
            ProgressStats {
                lines_scanned: 2,
                matches_found: 1,
                ranges_completed: 1,
                workers_finished: 1,
            }
        );
    }

    #[test]
    fn test_concurrent_updates() {
        let progress = Arc::new(ScanProgress::new());
        let handles: Vec<_> = (0..8)
            .map(|worker| {
                let progress = Arc::clone(&progress);
                thread::spawn(move || {
                    for _ in 0..1000 {
                        progress.record_line();
                    }
                    progress.record_match();
                    progress.worker_finished(worker);
                })
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }

        let stats = progress.snapshot();
        assert_eq!(stats.lines_scanned, 8000);
        assert_eq!(stats.matches_found, 8);
        assert_eq!(stats.workers_finished, 8);
    }

    #[test]
    fn test_bar_tracks_ranges() {
        let progress = ScanProgress::with_bar(3);
        progress.record_range();
        progress.record_range();
        assert_eq!(progress.snapshot().ranges_completed, 2);
        progress.finish();
    }
}
