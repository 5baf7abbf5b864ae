//! JSON-file storage backend.
//!
//! The whole store is one JSON document:
//!
//! ```text
//! {
//!   "categories": [...],
//!   "sources": [...],
//!   "articles": [...]
//! }
//! ```
//!
//! Every write produces the next state in memory, persists it (temp file +
//! rename) and only then makes it visible, so a failed write leaves both the
//! file and the in-memory view unchanged.

use async_trait::async_trait;
use std::path::{Path, PathBuf};
use tokio::fs;
use tokio::sync::Mutex;
use tracing::{debug, info, instrument};

use super::memory::StoreState;
use super::{SaveOutcome, Storage};
use crate::error::IngestError;
use crate::models::{Article, Category, Source};

/// [`Storage`] persisted to a single JSON file.
#[derive(Debug)]
pub struct JsonFileStore {
    path: PathBuf,
    state: Mutex<StoreState>,
}

impl JsonFileStore {
    /// Open (or create) the store at `path`.
    ///
    /// `seed_categories` are written only when the file holds no categories,
    /// so an existing taxonomy is never replaced.
    ///
    /// # Errors
    ///
    /// [`IngestError::Storage`] if the file cannot be read, parsed or written.
    #[instrument(level = "info", skip_all, fields(path = %path.as_ref().display()))]
    pub async fn open(
        path: impl AsRef<Path>,
        seed_categories: Vec<Category>,
    ) -> Result<Self, IngestError> {
        let path = path.as_ref().to_path_buf();
        let mut state = if fs::try_exists(&path).await? {
            let bytes = fs::read(&path).await?;
            serde_json::from_slice::<StoreState>(&bytes).map_err(|e| {
                IngestError::Storage(format!("parsing {}: {e}", path.display()))
            })?
        } else {
            StoreState::default()
        };
        state.reindex();

        if state.categories.is_empty() && !seed_categories.is_empty() {
            info!(count = seed_categories.len(), "Seeding categories");
            state.categories = seed_categories;
            persist(&path, &state).await?;
        }

        info!(
            categories = state.categories.len(),
            sources = state.sources.len(),
            articles = state.articles.len(),
            "Opened JSON store"
        );
        Ok(Self {
            path,
            state: Mutex::new(state),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub async fn article_count(&self) -> usize {
        self.state.lock().await.articles.len()
    }

    /// Apply `change` to a copy of the state; persist and publish it if it reports a write.
    async fn write<T>(
        &self,
        change: impl FnOnce(&mut StoreState) -> Result<(T, bool), IngestError>,
    ) -> Result<T, IngestError> {
        let mut state = self.state.lock().await;
        let mut next = state.clone();
        let (out, dirty) = change(&mut next)?;
        if dirty {
            persist(&self.path, &next).await?;
            *state = next;
        }
        Ok(out)
    }
}

async fn persist(path: &Path, state: &StoreState) -> Result<(), IngestError> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent).await?;
    }
    let json = serde_json::to_vec_pretty(state)
        .map_err(|e| IngestError::Storage(format!("serializing store: {e}")))?;
    let tmp = path.with_extension("json.tmp");
    fs::write(&tmp, json).await?;
    fs::rename(&tmp, path).await?;
    debug!(path = %path.display(), articles = state.articles.len(), "Persisted store");
    Ok(())
}

#[async_trait]
impl Storage for JsonFileStore {
    async fn find_source_by_name(&self, name: &str) -> Result<Option<Source>, IngestError> {
        Ok(self.state.lock().await.source_by_name(name).cloned())
    }

    async fn create_source(&self, source: Source) -> Result<Source, IngestError> {
        self.write(|state| state.insert_source(source).map(|s| (s, true)))
            .await
    }

    async fn find_or_create_source(&self, source: Source) -> Result<Source, IngestError> {
        self.write(|state| state.find_or_insert_source(source)).await
    }

    async fn find_category_by_slug(&self, slug: &str) -> Result<Option<Category>, IngestError> {
        Ok(self.state.lock().await.category_by_slug(slug).cloned())
    }

    async fn list_categories(&self) -> Result<Vec<Category>, IngestError> {
        Ok(self.state.lock().await.categories.clone())
    }

    async fn exists_article_by_source_url(&self, url: &str) -> Result<bool, IngestError> {
        Ok(self.state.lock().await.contains_article(url))
    }

    async fn save_article(&self, article: Article) -> Result<SaveOutcome, IngestError> {
        self.write(|state| {
            let outcome = state.insert_article(article);
            let dirty = matches!(outcome, SaveOutcome::Inserted(_));
            Ok((outcome, dirty))
        })
        .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::default_categories;
    use crate::test_support::{article, source};

    #[tokio::test]
    async fn seeds_categories_on_first_open_only() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("store.json");

        let store = JsonFileStore::open(&path, default_categories()).await.unwrap();
        assert_eq!(store.list_categories().await.unwrap().len(), 8);
        drop(store);

        let reopened = JsonFileStore::open(&path, vec![Category::new("tv", "TV")])
            .await
            .unwrap();
        let categories = reopened.list_categories().await.unwrap();
        assert_eq!(categories.len(), 8);
        assert_eq!(categories[0].slug, "phones");
    }

    #[tokio::test]
    async fn articles_and_sources_survive_reopen() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("nested/store.json");
        let url = "https://www.androidauthority.com/pixel-9-review-123/";

        let store = JsonFileStore::open(&path, default_categories()).await.unwrap();
        store
            .find_or_create_source(source("Android Authority", "https://www.androidauthority.com"))
            .await
            .unwrap();
        assert!(matches!(
            store.save_article(article(url)).await.unwrap(),
            SaveOutcome::Inserted(_)
        ));
        drop(store);

        let reopened = JsonFileStore::open(&path, vec![]).await.unwrap();
        assert!(reopened.exists_article_by_source_url(url).await.unwrap());
        assert_eq!(
            reopened.save_article(article(url)).await.unwrap(),
            SaveOutcome::Duplicate
        );
        assert_eq!(reopened.article_count().await, 1);
        assert!(
            reopened
                .find_source_by_name("Android Authority")
                .await
                .unwrap()
                .is_some()
        );
        assert!(!tmp.path().join("nested/store.json.tmp").exists());
    }

    #[tokio::test]
    async fn corrupt_file_is_a_storage_error() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("store.json");
        std::fs::write(&path, b"{ not json").unwrap();

        let err = JsonFileStore::open(&path, default_categories()).await.unwrap_err();
        assert!(matches!(err, IngestError::Storage(_)));
        assert!(err.is_fatal());
    }

    #[tokio::test]
    async fn rejected_source_leaves_file_untouched() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("store.json");
        let store = JsonFileStore::open(&path, default_categories()).await.unwrap();
        store
            .create_source(source("Google News", "https://news.google.com"))
            .await
            .unwrap();
        let before = std::fs::read(&path).unwrap();

        let dup = store
            .create_source(source("Google News", "https://news.google.com"))
            .await;
        assert!(matches!(dup, Err(IngestError::Conflict(_))));
        assert_eq!(std::fs::read(&path).unwrap(), before);
    }
}
