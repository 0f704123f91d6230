pub mod config;
pub mod coordinator;
pub mod errors;
pub mod finder;
pub mod lines;
pub mod materializer;
pub mod planner;
pub mod progress;
pub mod results;
pub mod scanner;

pub use config::{CliOverrides, FinderConfig};
pub use coordinator::{find_matches, scan_ranges};
pub use errors::{FinderError, FinderResult};
pub use finder::LineFinder;
pub use materializer::materialize;
pub use planner::{plan, plan_file, ByteRange};
pub use progress::{ProgressStats, ScanProgress};
pub use results::{FindSummary, LineOffset, MatchContext, ResultSet};
pub use scanner::{LineScanner, RangeScan};
