//! Fakes shared by unit tests: an in-memory fetcher, a scripted adapter and
//! record builders.

use async_trait::async_trait;
use chrono::{TimeZone, Utc};
use std::collections::{BTreeSet, HashMap};
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use crate::classify::{CategoryRegistry, Classifier};
use crate::config::default_categories;
use crate::error::IngestError;
use crate::fetch::Fetch;
use crate::models::{Article, Candidate, Source};
use crate::scrapers::{CrawlContext, SourceAdapter};
use crate::storage::Storage;

pub fn article(url: &str) -> Article {
    Article {
        source_url: url.to_string(),
        title: "Pixel 9 review".to_string(),
        content: "<p>Body</p>".to_string(),
        summary: "Body".to_string(),
        image_url: None,
        published_at: Utc.with_ymd_and_hms(2024, 10, 15, 14, 30, 0).unwrap(),
        author: None,
        author_bio: None,
        author_avatar: None,
        tags: BTreeSet::from(["Pixel".to_string()]),
        category: "phones".to_string(),
        source: "Stub".to_string(),
    }
}

pub fn source(name: &str, url: &str) -> Source {
    Source {
        name: name.to_string(),
        url: url.to_string(),
        logo_url: None,
        description: None,
    }
}

enum Response {
    Body(String),
    Status(u16),
}

/// [`Fetch`] answering from a fixed URL table. Unknown URLs fail as a refused connection.
#[derive(Default)]
pub struct StaticFetcher {
    responses: HashMap<String, Response>,
    calls: Arc<AtomicUsize>,
}

impl StaticFetcher {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_page(mut self, url: &str, body: &str) -> Self {
        self.responses
            .insert(url.to_string(), Response::Body(body.to_string()));
        self
    }

    pub fn with_status(mut self, url: &str, status: u16) -> Self {
        self.responses.insert(url.to_string(), Response::Status(status));
        self
    }

    /// Shared count of `fetch` calls; stays readable after the fetcher is moved.
    pub fn call_counter(&self) -> Arc<AtomicUsize> {
        Arc::clone(&self.calls)
    }
}

#[async_trait]
impl Fetch for StaticFetcher {
    async fn fetch(&self, url: &str) -> Result<String, IngestError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        match self.responses.get(url) {
            Some(Response::Body(body)) => Ok(body.clone()),
            Some(Response::Status(status)) => Err(IngestError::Status {
                url: url.to_string(),
                status: *status,
            }),
            None => Err(IngestError::Transport {
                url: url.to_string(),
                message: "connection refused".to_string(),
            }),
        }
    }
}

/// Crawl context over `fetcher` and `storage` with the stock rules and taxonomy.
pub fn context(fetcher: StaticFetcher, storage: Arc<dyn Storage>) -> CrawlContext {
    CrawlContext {
        fetcher: Arc::new(fetcher),
        storage,
        classifier: Arc::new(Classifier::default()),
        categories: Arc::new(CategoryRegistry::new(default_categories())),
        item_concurrency: 4,
    }
}

/// Scripted adapter: a fixed listing whose items either build or fail.
pub struct StubAdapter {
    name: String,
    items: Vec<(Candidate, bool)>,
    listing_error: bool,
    delay: Option<Duration>,
}

impl StubAdapter {
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            items: Vec::new(),
            listing_error: false,
            delay: None,
        }
    }

    pub fn with_item(mut self, title: &str, link: &str) -> Self {
        self.items.push((Candidate::new(title, link), false));
        self
    }

    pub fn with_failing_item(mut self, title: &str, link: &str) -> Self {
        self.items.push((Candidate::new(title, link), true));
        self
    }

    pub fn with_listing_error(mut self) -> Self {
        self.listing_error = true;
        self
    }

    /// Sleep this long while listing.
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }
}

#[async_trait]
impl SourceAdapter for StubAdapter {
    fn source_name(&self) -> &str {
        &self.name
    }

    fn source_info(&self) -> Source {
        let host = self.name.to_lowercase().replace(' ', "-");
        source(&self.name, &format!("https://{host}.example"))
    }

    async fn list_candidates(&self, _fetcher: &dyn Fetch) -> Result<Vec<Candidate>, IngestError> {
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        if self.listing_error {
            return Err(IngestError::Transport {
                url: format!("https://{}.example/feed", self.name.to_lowercase()),
                message: "connection refused".to_string(),
            });
        }
        Ok(self.items.iter().map(|(c, _)| c.clone()).collect())
    }

    async fn build_article(
        &self,
        candidate: Candidate,
        ctx: &CrawlContext,
        source: &Source,
    ) -> Result<Article, IngestError> {
        let fails = self
            .items
            .iter()
            .any(|(c, fail)| *fail && c.link == candidate.link);
        if fails {
            return Err(IngestError::Status {
                url: candidate.link,
                status: 500,
            });
        }
        let category = ctx
            .classifier
            .classify(&candidate.title, None, &ctx.categories)?;
        Ok(Article {
            title: candidate.title.clone(),
            tags: ctx.classifier.tag(&candidate.title),
            category: category.slug,
            source: source.name.clone(),
            ..article(&candidate.link)
        })
    }
}
