//! Error taxonomy for the ingestion pipeline.
//!
//! Errors fall into three groups:
//!
//! - **Item/source failures** ([`IngestError::Transport`], [`IngestError::Status`],
//!   [`IngestError::Feed`], [`IngestError::EmptyContent`], [`IngestError::Conflict`]):
//!   caught at the adapter or orchestrator boundary and recorded in the run report.
//! - **Fatal conditions** ([`IngestError::EmptyCategoryRegistry`], [`IngestError::Storage`]):
//!   terminate the current run early. See [`IngestError::is_fatal`].
//! - **Run control** ([`IngestError::AlreadyRunning`], [`IngestError::Config`]).
//!
//! Selector misses are never errors; the extractor and classifier resolve
//! them through their fallback chains.

use thiserror::Error;

/// Every failure the pipeline can report.
#[derive(Debug, Error)]
pub enum IngestError {
    /// DNS, connect, timeout or body-read failure.
    #[error("transport error fetching {url}: {message}")]
    Transport { url: String, message: String },

    /// The server answered with a non-2xx status.
    #[error("HTTP {status} fetching {url}")]
    Status { url: String, status: u16 },

    /// A listing feed could not be parsed as RSS.
    #[error("malformed feed from {url}: {message}")]
    Feed { url: String, message: String },

    /// Neither the article page nor the listing produced any content.
    #[error("no extractable content for {url}")]
    EmptyContent { url: String },

    /// A unique key is already held by a different record.
    #[error("conflict: {0}")]
    Conflict(String),

    /// No category exists, so classification has no fallback target.
    #[error("category registry is empty; seed at least one category before ingesting")]
    EmptyCategoryRegistry,

    /// The storage backend cannot be read or written.
    #[error("storage unavailable: {0}")]
    Storage(String),

    /// Another ingestion run holds the single-flight guard.
    #[error("an ingestion run is already in progress")]
    AlreadyRunning,

    #[error("configuration error: {0}")]
    Config(String),
}

impl IngestError {
    /// Build a [`IngestError::Transport`] from a `reqwest` error.
    pub fn transport(url: &str, err: reqwest::Error) -> Self {
        let message = if err.is_timeout() {
            format!("timed out: {err}")
        } else {
            err.to_string()
        };
        IngestError::Transport {
            url: url.to_string(),
            message,
        }
    }

    /// Whether this error must abort the whole run rather than a single item or source.
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            IngestError::EmptyCategoryRegistry | IngestError::Storage(_)
        )
    }
}

impl From<std::io::Error> for IngestError {
    fn from(err: std::io::Error) -> Self {
        IngestError::Storage(err.to_string())
    }
}

impl From<serde_yaml::Error> for IngestError {
    fn from(err: serde_yaml::Error) -> Self {
        IngestError::Config(err.to_string())
    }
}
