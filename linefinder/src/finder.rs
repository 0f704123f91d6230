use std::path::Path;
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, info};

use crate::config::FinderConfig;
use crate::coordinator::scan_ranges;
use crate::errors::{FinderError, FinderResult};
use crate::materializer::{materialize, write_lines, write_placeholder};
use crate::planner::plan_file;
use crate::progress::ScanProgress;
use crate::results::FindSummary;

/// Finds the lines of a file that contain a keyword, together with their
/// surrounding context, and writes them to an output file in file order.
#[derive(Debug, Clone, Default)]
pub struct LineFinder {
    config: FinderConfig,
}

impl LineFinder {
    pub fn new(config: FinderConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &FinderConfig {
        &self.config
    }

    /// Searches `input` for `keyword` (ignoring case) and writes every
    /// matching line plus up to `context_size` lines on each side to `output`.
    ///
    /// * `context_size < 0` fails with [`FinderError::NegativeContextSize`].
    /// * An empty `output` path fails with [`FinderError::InvalidArgument`].
    /// * A missing or empty `keyword` writes a single space to `output` and
    ///   scans nothing.
    /// * An empty `input` path with a keyword fails with
    ///   [`FinderError::InvalidArgument`].
    ///
    /// On any failure `output` is left untouched.
    pub fn find(
        &self,
        input: &Path,
        output: &Path,
        keyword: Option<&str>,
        context_size: i64,
    ) -> FinderResult<FindSummary> {
        if context_size < 0 {
            return Err(FinderError::NegativeContextSize(context_size));
        }
        let context_size = u32::try_from(context_size).map_err(|_| {
            FinderError::invalid_argument(format!("context size {} is too large", context_size))
        })?;
        if output.as_os_str().is_empty() {
            return Err(FinderError::invalid_argument(
                "Output filename shouldn't be empty",
            ));
        }

        let keyword = match keyword {
            Some(keyword) if !keyword.is_empty() => keyword,
            _ => {
                debug!("No keyword given, writing placeholder to {}", output.display());
                write_placeholder(output)?;
                return Ok(FindSummary::placeholder());
            }
        };

        if input.as_os_str().is_empty() {
            return Err(FinderError::invalid_argument(
                "Input filename shouldn't be empty",
            ));
        }

        let started = Instant::now();
        let ranges = plan_file(input, self.config.chunk_size)?;
        let ranges_planned = ranges.len();
        let progress = Arc::new(if self.config.show_progress {
            ScanProgress::with_bar(ranges_planned as u64)
        } else {
            ScanProgress::new()
        });

        let scanned = scan_ranges(
            input,
            &ranges,
            keyword,
            context_size,
            &self.config,
            Arc::clone(&progress),
        );
        progress.finish();
        let offsets = scanned?;

        let lines = materialize(input, &offsets)?;
        write_lines(output, &lines)?;

        let stats = progress.snapshot();
        let summary = FindSummary {
            keyword: keyword.to_string(),
            context_size,
            ranges_planned,
            workers: self.config.worker_count.get().min(ranges_planned),
            lines_scanned: stats.lines_scanned,
            matches_found: stats.matches_found,
            offsets_collected: offsets.len(),
            lines_written: lines.len(),
            elapsed_ms: u64::try_from(started.elapsed().as_millis()).unwrap_or(u64::MAX),
        };
        info!(
            "Wrote {} lines ({} matches) to {}",
            summary.lines_written,
            summary.matches_found,
            output.display()
        );
        Ok(summary)
    }
}
