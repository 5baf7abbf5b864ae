//! Time-based trigger.
//!
//! [`run_every`] fires an ingestion run on a fixed interval until Ctrl-C.
//! Each tick spawns its run, so a slow run never delays the clock; a tick
//! that lands while the previous run is still going is rejected by the
//! ingestor's single-flight guard and logged. Missed ticks are skipped rather
//! than bunched up.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio::time::{MissedTickBehavior, interval};
use tracing::{error, info, instrument, warn};

use crate::error::IngestError;
use crate::ingest::{Ingestor, RunReport};
use crate::outputs::json::write_report;

/// Run once and, when `report_dir` is set, write the report there.
///
/// A report that cannot be written is logged; the run itself still counts.
pub async fn run_once(
    ingestor: &Ingestor,
    report_dir: Option<&str>,
) -> Result<RunReport, IngestError> {
    let report = ingestor.run_ingestion().await?;
    if let Some(dir) = report_dir {
        if let Err(e) = write_report(&report, dir).await {
            error!(error = %e, dir, "Failed to write run report");
        }
    }
    Ok(report)
}

/// Run on `every` until Ctrl-C, then wait for the in-flight run.
pub async fn run_every(ingestor: Arc<Ingestor>, every: Duration, report_dir: Option<String>) {
    let shutdown = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            error!(error = %e, "Failed to listen for Ctrl-C");
            std::future::pending::<()>().await;
        }
    };
    run_until(ingestor, every, report_dir, shutdown).await;
}

/// Interval loop behind [`run_every`], stopped by `shutdown`.
#[instrument(level = "info", skip_all, fields(every_secs = every.as_secs()))]
pub async fn run_until(
    ingestor: Arc<Ingestor>,
    every: Duration,
    report_dir: Option<String>,
    shutdown: impl Future<Output = ()>,
) {
    let mut ticker = interval(every);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
    tokio::pin!(shutdown);

    let mut in_flight: Option<JoinHandle<()>> = None;
    loop {
        tokio::select! {
            _ = &mut shutdown => {
                info!("Shutdown requested; stopping scheduler");
                break;
            }
            _ = ticker.tick() => {
                let ingestor = Arc::clone(&ingestor);
                let report_dir = report_dir.clone();
                let handle = tokio::spawn(async move {
                    match run_once(&ingestor, report_dir.as_deref()).await {
                        Ok(report) => info!(
                            saved = report.total_saved(),
                            failed_sources = report.failed_sources(),
                            "Scheduled run finished"
                        ),
                        Err(IngestError::AlreadyRunning) => {
                            warn!("Previous run still in progress; skipping this tick")
                        }
                        Err(e) => error!(error = %e, "Scheduled run failed"),
                    }
                });
                // Keep the handle of the run that owns the guard.
                if in_flight.as_ref().is_none_or(|h| h.is_finished()) {
                    in_flight = Some(handle);
                }
            }
        }
    }

    if let Some(handle) = in_flight {
        if !handle.is_finished() {
            info!("Waiting for the in-flight run to finish");
        }
        if let Err(e) = handle.await {
            error!(error = %e, "Run task panicked");
        }
    }
}
