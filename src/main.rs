//! # Android News Ingest
//!
//! Crawls Android news sources (Google News, Android Authority, Android
//! Police), classifies and tags each story, and stores new articles in a JSON
//! store keyed by source URL.
//!
//! ## Usage
//!
//! ```sh
//! # Single run
//! android_news_ingest --once --report-dir ./reports
//!
//! # Hourly runs (the default schedule) until Ctrl-C
//! android_news_ingest -c config.yaml
//! ```
//!
//! `RUST_LOG` controls log verbosity (default `info`).

use clap::Parser;
use std::error::Error;
use std::sync::Arc;
use tracing::{debug, error, info};
use tracing_subscriber::{EnvFilter, fmt as tfmt};

use android_news_ingest::classify::Classifier;
use android_news_ingest::cli::Cli;
use android_news_ingest::config::{Config, MAX_INTERVAL_MINUTES, load_config};
use android_news_ingest::fetch::HttpFetcher;
use android_news_ingest::ingest::Ingestor;
use android_news_ingest::scheduler;
use android_news_ingest::scrapers::build_adapters;
use android_news_ingest::storage::JsonFileStore;
use android_news_ingest::utils::ensure_writable_dir;

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error>> {
    // --- Tracing init ---
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tfmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_file(false)
        .with_line_number(false)
        .with_timer(tracing_subscriber::fmt::time::UtcTime::rfc_3339())
        .init();

    let start_time = std::time::Instant::now();
    info!(version = env!("CARGO_PKG_VERSION"), "android_news_ingest starting up");

    let args = Cli::parse();
    debug!(?args, "Parsed CLI arguments");

    let mut config = match args.config.as_deref() {
        Some(path) => load_config(path)?,
        None => {
            info!("No config file given; using built-in defaults");
            Config::default()
        }
    };
    if let Some(minutes) = args.interval_minutes {
        config.schedule.interval_minutes = minutes.clamp(1, MAX_INTERVAL_MINUTES);
    }

    // Early check: ensure the report dir is writable
    if let Some(dir) = args.report_dir.as_deref() {
        if let Err(e) = ensure_writable_dir(dir).await {
            error!(
                path = %dir,
                error = %e,
                "Report directory is not writable (fix perms or choose a different path)"
            );
            return Err(e.into());
        }
    }

    let store = JsonFileStore::open(&args.store, config.categories.clone()).await?;
    let fetcher = HttpFetcher::new(&config.fetch)?;
    let adapters = build_adapters(&config.sources);
    let ingestor = Arc::new(Ingestor::new(
        adapters,
        Arc::new(store),
        Arc::new(fetcher),
        Classifier::new(config.rules.clone()),
        config.fetch.item_concurrency,
    ));

    if args.once {
        let report = scheduler::run_once(&ingestor, args.report_dir.as_deref()).await?;
        let elapsed = start_time.elapsed();
        info!(
            ?elapsed,
            saved = report.total_saved(),
            skipped = report.total_skipped(),
            errored = report.total_errored(),
            failed_sources = report.failed_sources(),
            succeeded_sources = report.succeeded_sources(),
            "Execution complete"
        );
        return Ok(());
    }

    let every = config.schedule.period();
    info!(
        interval_minutes = config.schedule.interval_minutes,
        "Starting scheduled ingestion; press Ctrl-C to stop"
    );
    scheduler::run_every(ingestor, every, args.report_dir).await;

    info!(elapsed = ?start_time.elapsed(), "Scheduler stopped");
    Ok(())
}
