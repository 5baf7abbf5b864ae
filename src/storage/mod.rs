//! Storage port consumed by the pipeline.
//!
//! The pipeline reads the category taxonomy, finds or creates source records,
//! and writes articles idempotently keyed by source URL. Both write paths are
//! atomic in every backend, so concurrent source processing cannot create a
//! duplicate source or a second article for the same URL.
//!
//! # Backends
//!
//! | Backend | Module | Notes |
//! |---------|--------|-------|
//! | In-memory | [`memory`] | Process-local; used by tests and dry runs |
//! | JSON file | [`json`] | Snapshot rewritten after every write |

pub mod json;
pub mod memory;

use async_trait::async_trait;

use crate::error::IngestError;
use crate::models::{Article, Category, Source};

pub use json::JsonFileStore;
pub use memory::MemoryStore;

/// Result of an idempotent article write.
#[derive(Debug, Clone, PartialEq)]
pub enum SaveOutcome {
    /// The article was new and has been stored.
    Inserted(Article),
    /// An article with the same source URL already existed; nothing was written.
    Duplicate,
}

#[async_trait]
pub trait Storage: Send + Sync {
    async fn find_source_by_name(&self, name: &str) -> Result<Option<Source>, IngestError>;

    /// Insert a new source.
    ///
    /// # Errors
    ///
    /// [`IngestError::Conflict`] if the name or URL is already taken.
    async fn create_source(&self, source: Source) -> Result<Source, IngestError>;

    /// Return the source stored under `source.name`, creating it if absent.
    ///
    /// Atomic: concurrent callers with the same name observe one record.
    async fn find_or_create_source(&self, source: Source) -> Result<Source, IngestError>;

    async fn find_category_by_slug(&self, slug: &str) -> Result<Option<Category>, IngestError>;

    /// All categories in insertion order. The first one is the default category.
    async fn list_categories(&self) -> Result<Vec<Category>, IngestError>;

    async fn exists_article_by_source_url(&self, url: &str) -> Result<bool, IngestError>;

    /// Insert `article` unless one with the same source URL exists (first write wins).
    async fn save_article(&self, article: Article) -> Result<SaveOutcome, IngestError>;
}
