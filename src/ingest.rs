//! Ingestion orchestrator.
//!
//! One [`Ingestor::run_ingestion`] call is one pipeline run:
//!
//! 1. Take the single-flight guard (an overlapping call gets
//!    [`IngestError::AlreadyRunning`])
//! 2. Load the category registry once; an empty registry is fatal
//! 3. Crawl every adapter concurrently, each isolated from the others
//! 4. Persist new articles idempotently, keyed by source URL
//! 5. Return a [`RunReport`] with one [`SourceReport`] per adapter
//!
//! Only fatal errors ([`IngestError::is_fatal`]) end a run without a report.

use chrono::{DateTime, Utc};
use futures::future;
use serde::Serialize;
use std::sync::Arc;
use std::time::Instant;
use tokio::sync::Mutex;
use tracing::{error, info, instrument, warn};

use crate::classify::{CategoryRegistry, Classifier};
use crate::error::IngestError;
use crate::fetch::Fetch;
use crate::models::Article;
use crate::scrapers::{CrawlContext, CrawledItem, SourceAdapter};
use crate::storage::{SaveOutcome, Storage};

/// What happened to one candidate.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum ItemOutcome {
    Saved { url: String },
    /// Already stored; nothing written.
    Skipped { url: String },
    Failed { url: String, error: String },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum SourceStatus {
    Succeeded,
    Failed { error: String },
}

/// Per-source counts and item outcomes; `items` follows listing order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SourceReport {
    pub source: String,
    #[serde(flatten)]
    pub status: SourceStatus,
    /// Candidates taken from the listing.
    pub fetched: usize,
    pub saved: usize,
    pub skipped: usize,
    pub errored: usize,
    pub items: Vec<ItemOutcome>,
}

impl SourceReport {
    fn new(source: String, status: SourceStatus) -> Self {
        Self {
            source,
            status,
            fetched: 0,
            saved: 0,
            skipped: 0,
            errored: 0,
            items: Vec::new(),
        }
    }

    fn record(&mut self, outcome: ItemOutcome) {
        match outcome {
            ItemOutcome::Saved { .. } => self.saved += 1,
            ItemOutcome::Skipped { .. } => self.skipped += 1,
            ItemOutcome::Failed { .. } => self.errored += 1,
        }
        self.items.push(outcome);
    }

    pub fn is_failed(&self) -> bool {
        matches!(self.status, SourceStatus::Failed { .. })
    }
}

/// Outcome of one completed run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RunReport {
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    pub sources: Vec<SourceReport>,
}

impl RunReport {
    pub fn total_saved(&self) -> usize {
        self.sources.iter().map(|s| s.saved).sum()
    }

    pub fn total_skipped(&self) -> usize {
        self.sources.iter().map(|s| s.skipped).sum()
    }

    pub fn total_errored(&self) -> usize {
        self.sources.iter().map(|s| s.errored).sum()
    }

    pub fn failed_sources(&self) -> usize {
        self.sources.iter().filter(|s| s.is_failed()).count()
    }

    pub fn succeeded_sources(&self) -> usize {
        self.sources.len() - self.failed_sources()
    }
}

/// Runs every configured adapter against one store.
pub struct Ingestor {
    adapters: Vec<Box<dyn SourceAdapter>>,
    storage: Arc<dyn Storage>,
    fetcher: Arc<dyn Fetch>,
    classifier: Arc<Classifier>,
    item_concurrency: usize,
    guard: Mutex<()>,
}

impl Ingestor {
    pub fn new(
        adapters: Vec<Box<dyn SourceAdapter>>,
        storage: Arc<dyn Storage>,
        fetcher: Arc<dyn Fetch>,
        classifier: Classifier,
        item_concurrency: usize,
    ) -> Self {
        Self {
            adapters,
            storage,
            fetcher,
            classifier: Arc::new(classifier),
            item_concurrency,
            guard: Mutex::new(()),
        }
    }

    /// Run all sources once.
    ///
    /// # Errors
    ///
    /// - [`IngestError::AlreadyRunning`] if another run holds the guard
    /// - [`IngestError::EmptyCategoryRegistry`] if storage has no categories
    /// - [`IngestError::Storage`] if the store fails mid-run
    ///
    /// Source and item failures are not errors; they are in the report.
    #[instrument(level = "info", skip_all)]
    pub async fn run_ingestion(&self) -> Result<RunReport, IngestError> {
        let Ok(_running) = self.guard.try_lock() else {
            warn!("Ingestion already in progress; rejecting overlapping run");
            return Err(IngestError::AlreadyRunning);
        };

        let started = Instant::now();
        let started_at = Utc::now();

        let categories = self.storage.list_categories().await?;
        if categories.is_empty() {
            error!("No categories in storage; aborting run");
            return Err(IngestError::EmptyCategoryRegistry);
        }
        info!(
            sources = self.adapters.len(),
            categories = categories.len(),
            "Starting ingestion run"
        );

        let ctx = CrawlContext {
            fetcher: Arc::clone(&self.fetcher),
            storage: Arc::clone(&self.storage),
            classifier: Arc::clone(&self.classifier),
            categories: Arc::new(CategoryRegistry::new(categories)),
            item_concurrency: self.item_concurrency,
        };

        let sources = future::try_join_all(
            self.adapters
                .iter()
                .map(|adapter| self.run_source(adapter.as_ref(), &ctx)),
        )
        .await?;

        let report = RunReport {
            started_at,
            finished_at: Utc::now(),
            sources,
        };
        info!(
            saved = report.total_saved(),
            skipped = report.total_skipped(),
            errored = report.total_errored(),
            failed_sources = report.failed_sources(),
            elapsed_ms = started.elapsed().as_millis() as u64,
            "Ingestion run complete"
        );
        Ok(report)
    }

    async fn run_source(
        &self,
        adapter: &dyn SourceAdapter,
        ctx: &CrawlContext,
    ) -> Result<SourceReport, IngestError> {
        let name = adapter.source_name().to_string();
        let output = match adapter.crawl(ctx).await {
            Ok(output) => output,
            Err(e) if e.is_fatal() => return Err(e),
            Err(e) => {
                error!(source = %name, error = %e, "Source failed");
                return Ok(SourceReport::new(
                    name,
                    SourceStatus::Failed {
                        error: e.to_string(),
                    },
                ));
            }
        };

        let mut report = SourceReport::new(name, SourceStatus::Succeeded);
        report.fetched = output.candidates;

        for item in output.items {
            let outcome = match item {
                CrawledItem::Known(url) => ItemOutcome::Skipped { url },
                CrawledItem::Built(article) => self.store_article(article).await?,
                CrawledItem::Failed(failure) => ItemOutcome::Failed {
                    url: failure.link,
                    error: failure.error,
                },
            };
            report.record(outcome);
        }

        info!(
            source = %report.source,
            fetched = report.fetched,
            saved = report.saved,
            skipped = report.skipped,
            errored = report.errored,
            "Source complete"
        );
        Ok(report)
    }

    async fn store_article(&self, article: Article) -> Result<ItemOutcome, IngestError> {
        let url = article.source_url.clone();
        if self.storage.exists_article_by_source_url(&url).await? {
            return Ok(ItemOutcome::Skipped { url });
        }
        Ok(match self.storage.save_article(article).await? {
            SaveOutcome::Inserted(_) => ItemOutcome::Saved { url },
            SaveOutcome::Duplicate => ItemOutcome::Skipped { url },
        })
    }
}
