use config::{Config as ConfigBuilder, File};
use serde::{Deserialize, Deserializer};
use std::num::{NonZeroU64, NonZeroUsize};
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::errors::{FinderError, FinderResult};

/// Default size of one planned byte range
pub const DEFAULT_CHUNK_SIZE: u64 = 1024;

/// Default bound on the total wait for the worker pool
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(60);

/// Tuning knobs for a find run.
///
/// # Configuration Locations
///
/// The configuration is read from the following files, later ones overriding
/// earlier ones:
/// 1. Global `$HOME/.config/linefinder/config.yaml`
/// 2. Local `.linefinder.yaml` in the current directory
/// 3. Custom config file specified via the `--config` flag
///
/// # Configuration Format
///
/// ```yaml
/// # Bytes per planned range
/// chunk_size: 4096
///
/// # Worker threads (default: CPU cores)
/// worker_count: 4
///
/// # Give up after this long (humantime syntax)
/// timeout: "90s"
///
/// # Draw a progress bar on stderr
/// show_progress: true
///
/// # Log level (trace, debug, info, warn, error)
/// log_level: "info"
/// ```
///
/// Every field is optional. Command-line flags take precedence over file
/// values, see [`FinderConfig::merge_with_cli`].
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct FinderConfig {
    /// Size of each byte range handed to the scanner
    pub chunk_size: NonZeroU64,

    /// Number of worker threads scanning ranges concurrently
    pub worker_count: NonZeroUsize,

    /// Upper bound on the time spent waiting for workers
    #[serde(deserialize_with = "deserialize_duration")]
    pub timeout: Duration,

    /// Whether to draw a progress bar while scanning
    pub show_progress: bool,

    /// Log level (trace, debug, info, warn, error)
    pub log_level: String,
}

fn default_chunk_size() -> NonZeroU64 {
    NonZeroU64::new(DEFAULT_CHUNK_SIZE).unwrap_or(NonZeroU64::MIN)
}

fn default_worker_count() -> NonZeroUsize {
    NonZeroUsize::new(num_cpus::get()).unwrap_or(NonZeroUsize::MIN)
}

fn default_log_level() -> String {
    "warn".to_string()
}

fn deserialize_duration<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Duration, D::Error> {
    let text = String::deserialize(deserializer)?;
    humantime::parse_duration(&text).map_err(serde::de::Error::custom)
}

impl Default for FinderConfig {
    fn default() -> Self {
        Self {
            chunk_size: default_chunk_size(),
            worker_count: default_worker_count(),
            timeout: DEFAULT_TIMEOUT,
            show_progress: false,
            log_level: default_log_level(),
        }
    }
}

/// Values supplied on the command line; `None` leaves the file value alone
#[derive(Debug, Clone, Default)]
pub struct CliOverrides {
    pub chunk_size: Option<NonZeroU64>,
    pub worker_count: Option<NonZeroUsize>,
    pub timeout: Option<Duration>,
    pub show_progress: bool,
    pub log_level: Option<String>,
}

impl FinderConfig {
    /// Loads configuration from the default locations
    pub fn load() -> FinderResult<Self> {
        Self::load_from(None)
    }

    /// Loads configuration, layering `config_path` over the default locations.
    /// An explicit path that does not exist is an error.
    pub fn load_from(config_path: Option<&Path>) -> FinderResult<Self> {
        if let Some(path) = config_path {
            if !path.exists() {
                return Err(FinderError::config_error(format!(
                    "config file not found: {}",
                    path.display()
                )));
            }
        }

        let mut builder = ConfigBuilder::builder();

        let config_files = [
            dirs::config_dir().map(|p| p.join("linefinder/config.yaml")),
            Some(PathBuf::from(".linefinder.yaml")),
            config_path.map(PathBuf::from),
        ];

        for path in config_files.iter().flatten() {
            if path.exists() {
                builder = builder.add_source(File::from(path.as_path()));
            }
        }

        Ok(builder.build()?.try_deserialize()?)
    }

    /// Merges CLI arguments with configuration file values
    pub fn merge_with_cli(mut self, cli: CliOverrides) -> Self {
        if let Some(chunk_size) = cli.chunk_size {
            self.chunk_size = chunk_size;
        }
        if let Some(worker_count) = cli.worker_count {
            self.worker_count = worker_count;
        }
        if let Some(timeout) = cli.timeout {
            self.timeout = timeout;
        }
        if cli.show_progress {
            self.show_progress = true;
        }
        if let Some(log_level) = cli.log_level {
            self.log_level = log_level;
        }
        self
    }
}
