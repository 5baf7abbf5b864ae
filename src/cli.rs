//! Command-line interface definitions.
//!
//! Flags override the YAML configuration. Every option can also be set via
//! an environment variable.

use clap::Parser;

/// Command-line arguments for the news ingester.
///
/// # Examples
///
/// ```sh
/// # One run with the built-in defaults, report written to ./reports
/// android_news_ingest --once --report-dir ./reports
///
/// # Scheduled runs every 30 minutes with a custom config and store
/// android_news_ingest -c config.yaml -s /var/lib/news/store.json --interval-minutes 30
/// ```
#[derive(Parser, Debug)]
#[command(author, version, about)]
pub struct Cli {
    /// Optional path to a config.yaml file
    #[arg(short, long, env = "NEWS_INGEST_CONFIG")]
    pub config: Option<String>,

    /// Path of the JSON store file
    #[arg(short, long, env = "NEWS_INGEST_STORE", default_value = "news_store.json")]
    pub store: String,

    /// Directory for per-run JSON reports (no reports when unset)
    #[arg(short, long, env = "NEWS_INGEST_REPORT_DIR")]
    pub report_dir: Option<String>,

    /// Run a single ingestion and exit instead of scheduling
    #[arg(long)]
    pub once: bool,

    /// Minutes between scheduled runs (overrides schedule.interval_minutes)
    #[arg(long, env = "NEWS_INGEST_INTERVAL_MINUTES")]
    pub interval_minutes: Option<u64>,
}
