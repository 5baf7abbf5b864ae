//! JSON run reports.
//!
//! Each completed run is written as one pretty-printed JSON file, grouped by
//! the UTC date the run started:
//!
//! ```text
//! report_dir/
//! └── 2025-05-06/
//!     ├── 08-00-00.json
//!     └── 09-00-00.json
//! ```

use std::path::PathBuf;
use tokio::fs;
use tracing::{error, info, instrument};

use crate::error::IngestError;
use crate::ingest::RunReport;

/// Write a [`RunReport`] under `report_dir`.
///
/// # Arguments
///
/// * `report` - The completed run to serialize
/// * `report_dir` - Base directory for reports
///
/// # Returns
///
/// The path written: `{report_dir}/{YYYY-MM-DD}/{HH-MM-SS}.json`, named after
/// the run's start time.
#[instrument(level = "info", skip_all, fields(report_dir = %report_dir))]
pub async fn write_report(report: &RunReport, report_dir: &str) -> Result<PathBuf, IngestError> {
    let json = serde_json::to_string_pretty(report)
        .map_err(|e| IngestError::Storage(format!("serializing run report: {e}")))?;

    let day_dir = PathBuf::from(report_dir).join(report.started_at.format("%Y-%m-%d").to_string());
    if let Err(e) = fs::create_dir_all(&day_dir).await {
        error!(dir = %day_dir.display(), error = %e, "Failed to create report dir");
        return Err(e.into());
    }

    let path = day_dir.join(format!("{}.json", report.started_at.format("%H-%M-%S")));
    fs::write(&path, json).await?;
    info!(path = %path.display(), "Wrote run report");
    Ok(path)
}
