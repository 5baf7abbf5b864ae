//! In-process storage backend.
//!
//! [`StoreState`] holds the records and enforces the uniqueness rules; the
//! JSON backend reuses it and adds persistence. [`MemoryStore`] guards one
//! state behind a mutex, which makes every check-then-write atomic.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::sync::{Mutex, MutexGuard};
use tracing::debug;

use super::{SaveOutcome, Storage};
use crate::error::IngestError;
use crate::models::{Article, Category, Source};

/// Records plus the source-URL index used for dedup.
#[derive(Debug, Default, Clone, Serialize, Deserialize)]
pub(crate) struct StoreState {
    #[serde(default)]
    pub(crate) categories: Vec<Category>,
    #[serde(default)]
    pub(crate) sources: Vec<Source>,
    #[serde(default)]
    pub(crate) articles: Vec<Article>,
    #[serde(skip)]
    urls: HashSet<String>,
}

impl StoreState {
    pub(crate) fn with_categories(categories: Vec<Category>) -> Self {
        Self {
            categories,
            ..Self::default()
        }
    }

    /// Rebuild the URL index after deserializing.
    pub(crate) fn reindex(&mut self) {
        self.urls = self.articles.iter().map(|a| a.source_url.clone()).collect();
    }

    pub(crate) fn source_by_name(&self, name: &str) -> Option<&Source> {
        self.sources.iter().find(|s| s.name == name)
    }

    pub(crate) fn category_by_slug(&self, slug: &str) -> Option<&Category> {
        self.categories.iter().find(|c| c.slug == slug)
    }

    pub(crate) fn contains_article(&self, url: &str) -> bool {
        self.urls.contains(url)
    }

    pub(crate) fn insert_source(&mut self, source: Source) -> Result<Source, IngestError> {
        if self.source_by_name(&source.name).is_some() {
            return Err(IngestError::Conflict(format!(
                "source name {:?} already exists",
                source.name
            )));
        }
        if let Some(existing) = self.sources.iter().find(|s| s.url == source.url) {
            return Err(IngestError::Conflict(format!(
                "source URL {} already belongs to {:?}",
                source.url, existing.name
            )));
        }
        self.sources.push(source.clone());
        Ok(source)
    }

    /// Existing source with this name, or the newly inserted one. The flag is
    /// `true` when a record was created.
    pub(crate) fn find_or_insert_source(
        &mut self,
        source: Source,
    ) -> Result<(Source, bool), IngestError> {
        if let Some(existing) = self.source_by_name(&source.name) {
            return Ok((existing.clone(), false));
        }
        self.insert_source(source).map(|s| (s, true))
    }

    pub(crate) fn insert_article(&mut self, article: Article) -> SaveOutcome {
        if !self.urls.insert(article.source_url.clone()) {
            return SaveOutcome::Duplicate;
        }
        self.articles.push(article.clone());
        SaveOutcome::Inserted(article)
    }
}

/// Mutex-guarded in-memory [`Storage`].
#[derive(Debug, Default)]
pub struct MemoryStore {
    state: Mutex<StoreState>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// A store seeded with the given taxonomy, in order.
    pub fn with_categories(categories: Vec<Category>) -> Self {
        Self {
            state: Mutex::new(StoreState::with_categories(categories)),
        }
    }

    pub fn article_count(&self) -> usize {
        self.lock().map(|s| s.articles.len()).unwrap_or(0)
    }

    /// Snapshot of stored articles in insertion order.
    pub fn articles(&self) -> Vec<Article> {
        self.lock().map(|s| s.articles.clone()).unwrap_or_default()
    }

    pub fn sources(&self) -> Vec<Source> {
        self.lock().map(|s| s.sources.clone()).unwrap_or_default()
    }

    fn lock(&self) -> Result<MutexGuard<'_, StoreState>, IngestError> {
        self.state
            .lock()
            .map_err(|_| IngestError::Storage("memory store lock poisoned".into()))
    }
}

#[async_trait]
impl Storage for MemoryStore {
    async fn find_source_by_name(&self, name: &str) -> Result<Option<Source>, IngestError> {
        Ok(self.lock()?.source_by_name(name).cloned())
    }

    async fn create_source(&self, source: Source) -> Result<Source, IngestError> {
        self.lock()?.insert_source(source)
    }

    async fn find_or_create_source(&self, source: Source) -> Result<Source, IngestError> {
        let (source, created) = self.lock()?.find_or_insert_source(source)?;
        if created {
            debug!(name = %source.name, "Created source");
        }
        Ok(source)
    }

    async fn find_category_by_slug(&self, slug: &str) -> Result<Option<Category>, IngestError> {
        Ok(self.lock()?.category_by_slug(slug).cloned())
    }

    async fn list_categories(&self) -> Result<Vec<Category>, IngestError> {
        Ok(self.lock()?.categories.clone())
    }

    async fn exists_article_by_source_url(&self, url: &str) -> Result<bool, IngestError> {
        Ok(self.lock()?.contains_article(url))
    }

    async fn save_article(&self, article: Article) -> Result<SaveOutcome, IngestError> {
        Ok(self.lock()?.insert_article(article))
    }
}
