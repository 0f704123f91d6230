use clap::Parser;
use colored::Colorize;
use linefinder::{CliOverrides, FindSummary, FinderConfig, FinderError, LineFinder};
use std::num::{NonZeroU64, NonZeroUsize};
use std::path::PathBuf;
use std::process::ExitCode;
use std::time::Duration;
use tracing_subscriber::EnvFilter;

type Result<T> = std::result::Result<T, FinderError>;

/// Find the lines of a file containing a keyword, with surrounding context
#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// File to search
    #[arg(short, long, default_value = "", value_parser = clap::builder::TypedValueParser::map(clap::builder::OsStringValueParser::new(), PathBuf::from))]
    input: PathBuf,

    /// File that receives the matching lines
    #[arg(short, long)]
    output: PathBuf,

    /// Keyword to look for, ignoring case; omit to write a placeholder
    #[arg(short, long)]
    keyword: Option<String>,

    /// Number of context lines before and after each match
    #[arg(short = 'C', long, default_value = "0", allow_negative_numbers = true)]
    context: i64,

    /// Number of worker threads
    #[arg(short = 'j', long)]
    threads: Option<NonZeroUsize>,

    /// Bytes per scanned range
    #[arg(long)]
    chunk_size: Option<NonZeroU64>,

    /// Give up after this long (e.g. 30s, 2m)
    #[arg(long, value_parser = humantime::parse_duration)]
    timeout: Option<Duration>,

    /// Configuration file layered over the default locations
    #[arg(long)]
    config: Option<PathBuf>,

    /// Show a progress bar while scanning
    #[arg(long)]
    progress: bool,

    /// Print the run summary as JSON
    #[arg(long)]
    json: bool,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long)]
    log_level: Option<String>,
}

fn main() -> ExitCode {
    match run() {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("{} {}", "error:".red().bold(), e);
            ExitCode::FAILURE
        }
    }
}

fn run() -> Result<()> {
    let cli = Cli::parse();

    let config = FinderConfig::load_from(cli.config.as_deref())?.merge_with_cli(CliOverrides {
        chunk_size: cli.chunk_size,
        worker_count: cli.threads,
        timeout: cli.timeout,
        show_progress: cli.progress,
        log_level: cli.log_level.clone(),
    });
    init_logging(&config.log_level);
    tracing::debug!(?config, "Effective configuration");

    let finder = LineFinder::new(config);
    let summary = finder.find(&cli.input, &cli.output, cli.keyword.as_deref(), cli.context)?;

    if cli.json {
        let json =
            serde_json::to_string_pretty(&summary).map_err(|e| FinderError::IoError(e.into()))?;
        println!("{}", json);
    } else {
        print_summary(&summary, &cli.output);
    }
    Ok(())
}

fn init_logging(level: &str) {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(level))
        .unwrap_or_else(|_| EnvFilter::new("warn"));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init();
}

fn print_summary(summary: &FindSummary, output: &std::path::Path) {
    if summary.is_placeholder() {
        println!(
            "No keyword given, wrote placeholder to {}",
            output.display().to_string().blue()
        );
        return;
    }

    println!(
        "Found {} matches for {} in {} lines, wrote {} lines to {} ({} ms)",
        summary.matches_found.to_string().green(),
        summary.keyword.yellow(),
        summary.lines_scanned,
        summary.lines_written.to_string().green(),
        output.display().to_string().blue(),
        summary.elapsed_ms
    );
}
