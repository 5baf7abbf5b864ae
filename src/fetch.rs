//! Network fetch primitive shared by listing and article requests.
//!
//! The pipeline only ever needs `fetch(url) -> markup`. It is expressed as the
//! [`Fetch`] trait so adapters can be driven by [`HttpFetcher`] in production
//! and by in-memory fakes in tests.
//!
//! # Timeouts and retries
//!
//! - Every call is bounded by the configured request timeout
//! - Non-2xx responses are failures ([`IngestError::Status`])
//! - Failures are terminal for that call; nothing is retried

use async_trait::async_trait;
use std::fmt;
use std::time::{Duration, Instant};
use tracing::{debug, instrument, warn};

use crate::config::FetchConfig;
use crate::error::IngestError;

/// Fetch a URL and return its body as text.
#[async_trait]
pub trait Fetch: Send + Sync {
    /// Download `url`.
    ///
    /// # Errors
    ///
    /// [`IngestError::Transport`] for connection/timeout/body failures and
    /// [`IngestError::Status`] for non-2xx responses.
    async fn fetch(&self, url: &str) -> Result<String, IngestError>;
}

/// [`Fetch`] over a shared `reqwest` client.
pub struct HttpFetcher {
    client: reqwest::Client,
    timeout: Duration,
}

impl HttpFetcher {
    /// Build the shared client from configuration.
    pub fn new(config: &FetchConfig) -> Result<Self, IngestError> {
        let timeout = Duration::from_secs(config.timeout_secs);
        let client = reqwest::Client::builder()
            .user_agent(config.user_agent.clone())
            .timeout(timeout)
            .connect_timeout(Duration::from_secs(config.connect_timeout_secs))
            .build()
            .map_err(|e| IngestError::Config(format!("building HTTP client: {e}")))?;
        Ok(Self { client, timeout })
    }
}

impl fmt::Debug for HttpFetcher {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HttpFetcher")
            .field("timeout", &self.timeout)
            .finish()
    }
}

#[async_trait]
impl Fetch for HttpFetcher {
    #[instrument(level = "debug", skip(self))]
    async fn fetch(&self, url: &str) -> Result<String, IngestError> {
        let t0 = Instant::now();
        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| IngestError::transport(url, e))?;

        let status = response.status();
        if !status.is_success() {
            warn!(
                %url,
                status = status.as_u16(),
                elapsed_ms = t0.elapsed().as_millis() as u64,
                "Non-success response"
            );
            return Err(IngestError::Status {
                url: url.to_string(),
                status: status.as_u16(),
            });
        }

        let body = response
            .text()
            .await
            .map_err(|e| IngestError::transport(url, e))?;
        debug!(
            %url,
            bytes = body.len(),
            elapsed_ms = t0.elapsed().as_millis() as u64,
            "Fetched"
        );
        Ok(body)
    }
}
