//! # Android News Ingest
//!
//! An ingestion pipeline that crawls Android news sources, normalizes each
//! story into an [`Article`](models::Article), classifies it into a fixed
//! category taxonomy, derives tags, and stores it idempotently keyed by the
//! article's source URL.
//!
//! ## Architecture
//!
//! 1. **Trigger**: [`scheduler`] fires runs on an interval (or once, from the CLI)
//! 2. **Orchestration**: [`ingest::Ingestor`] runs all sources concurrently,
//!    isolates their failures and persists new articles
//! 3. **Adapters**: [`scrapers`] list candidates per source and build articles,
//!    using [`extract`] for page content and [`classify`] for category and tags
//! 4. **Storage**: [`storage`] backends behind the [`storage::Storage`] port
//! 5. **Output**: [`outputs::json`] writes one report per run

pub mod classify;
pub mod cli;
pub mod config;
pub mod error;
pub mod extract;
pub mod fetch;
pub mod ingest;
pub mod models;
pub mod outputs;
pub mod scheduler;
pub mod scrapers;
pub mod storage;
pub mod utils;

#[cfg(test)]
pub(crate) mod test_support;
