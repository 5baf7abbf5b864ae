//! Source adapters: one per upstream publisher.
//!
//! Every adapter implements [`SourceAdapter`] and follows the same two-phase
//! pattern:
//!
//! 1. **Listing**: fetch the source's feed or index page and turn it into
//!    [`Candidate`]s
//! 2. **Building**: for each candidate, fetch the article page (where the
//!    source needs it), run the extractor and classifier, and assemble an
//!    [`Article`]
//!
//! The shared driver [`crawl_source`] handles everything in between: source
//! find-or-create, listing cleanup, skipping URLs that are already stored,
//! bounded parallel item processing, and per-item failure isolation. New
//! sources are added by implementing the trait; the orchestrator never
//! branches on a source name.
//!
//! # Supported Sources
//!
//! | Source | Module | Method | Notes |
//! |--------|--------|--------|-------|
//! | Google News | [`google_news`] | RSS search feed | Fetches each linked article page |
//! | Android Authority | [`android_authority`] | HTML listing | URL-path category rules apply |
//! | Android Police | [`android_police`] | RSS feed | Digest only; no page fetch |

pub mod android_authority;
pub mod android_police;
pub mod feed;
pub mod google_news;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use futures::stream::{self, StreamExt};
use itertools::Itertools;
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, info, instrument, warn};

use crate::classify::{CategoryRegistry, Classifier};
use crate::config::SourcesConfig;
use crate::error::IngestError;
use crate::fetch::Fetch;
use crate::models::{Article, Candidate, Source};
use crate::storage::Storage;
use crate::utils::{cap_summary, markup_to_text, parse_published};

/// Summary cap for general listings.
pub const SUMMARY_MAX_CHARS: usize = 500;

/// Shared collaborators for one crawl.
#[derive(Clone)]
pub struct CrawlContext {
    pub fetcher: Arc<dyn Fetch>,
    pub storage: Arc<dyn Storage>,
    pub classifier: Arc<Classifier>,
    pub categories: Arc<CategoryRegistry>,
    /// Article builds in flight at once within this source.
    pub item_concurrency: usize,
}

/// A candidate that could not be turned into an article.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ItemFailure {
    pub link: String,
    pub error: String,
}

/// Result of crawling one candidate.
#[derive(Debug)]
pub enum CrawledItem {
    /// Already stored; skipped before fetching.
    Known(String),
    Built(Article),
    Failed(ItemFailure),
}

/// What one adapter produced in one run.
#[derive(Debug, Default)]
pub struct CrawlOutput {
    /// Candidates left after listing cleanup.
    pub candidates: usize,
    /// One entry per candidate, in listing order.
    pub items: Vec<CrawledItem>,
}

impl CrawlOutput {
    pub fn known(&self) -> Vec<&str> {
        self.items
            .iter()
            .filter_map(|item| match item {
                CrawledItem::Known(link) => Some(link.as_str()),
                _ => None,
            })
            .collect()
    }

    pub fn articles(&self) -> Vec<&Article> {
        self.items
            .iter()
            .filter_map(|item| match item {
                CrawledItem::Built(article) => Some(article),
                _ => None,
            })
            .collect()
    }

    pub fn failures(&self) -> Vec<&ItemFailure> {
        self.items
            .iter()
            .filter_map(|item| match item {
                CrawledItem::Failed(failure) => Some(failure),
                _ => None,
            })
            .collect()
    }
}

/// A crawlable upstream source.
#[async_trait]
pub trait SourceAdapter: Send + Sync {
    /// Display name; also the key for the source record.
    fn source_name(&self) -> &str;

    /// The record created for this source the first time it is crawled.
    fn source_info(&self) -> Source;

    /// Upper bound on candidates taken from one listing.
    fn max_items(&self) -> Option<usize> {
        None
    }

    /// Fetch and parse the listing.
    async fn list_candidates(&self, fetcher: &dyn Fetch) -> Result<Vec<Candidate>, IngestError>;

    /// Turn one candidate into an article.
    async fn build_article(
        &self,
        candidate: Candidate,
        ctx: &CrawlContext,
        source: &Source,
    ) -> Result<Article, IngestError>;

    /// Run the whole listing-then-items pipeline for this source.
    async fn crawl(&self, ctx: &CrawlContext) -> Result<CrawlOutput, IngestError> {
        crawl_source(self, ctx).await
    }
}

/// Build the adapters enabled in configuration, in a fixed order.
pub fn build_adapters(config: &SourcesConfig) -> Vec<Box<dyn SourceAdapter>> {
    let mut adapters: Vec<Box<dyn SourceAdapter>> = Vec::new();
    if config.google_news.enabled {
        adapters.push(Box::new(google_news::GoogleNews::new(&config.google_news)));
    }
    if config.android_authority.enabled {
        adapters.push(Box::new(android_authority::AndroidAuthority::new(
            &config.android_authority,
        )));
    }
    if config.android_police.enabled {
        adapters.push(Box::new(android_police::AndroidPolice::new(
            &config.android_police,
        )));
    }
    info!(count = adapters.len(), "Configured source adapters");
    adapters
}

/// Default crawl driver shared by all adapters.
///
/// A listing failure fails the source. Item failures are collected in the
/// output, except fatal ones, which abort the crawl.
#[instrument(level = "info", skip_all, fields(source = %adapter.source_name()))]
pub async fn crawl_source<A: SourceAdapter + ?Sized>(
    adapter: &A,
    ctx: &CrawlContext,
) -> Result<CrawlOutput, IngestError> {
    let started = Instant::now();
    let source = ctx.storage.find_or_create_source(adapter.source_info()).await?;

    let listed = adapter.list_candidates(ctx.fetcher.as_ref()).await?;
    let listed_count = listed.len();
    let candidates = clean_listing(listed, adapter.max_items());
    debug!(
        listed = listed_count,
        kept = candidates.len(),
        "Cleaned listing"
    );

    let candidate_count = candidates.len();
    let results: Vec<Result<CrawledItem, IngestError>> = stream::iter(candidates)
        .map(|candidate| crawl_item(adapter, candidate, ctx, &source))
        .buffered(ctx.item_concurrency.max(1))
        .collect()
        .await;

    let output = CrawlOutput {
        candidates: candidate_count,
        items: results.into_iter().collect::<Result<_, _>>()?,
    };

    info!(
        candidates = output.candidates,
        known = output.known().len(),
        built = output.articles().len(),
        errored = output.failures().len(),
        elapsed_ms = started.elapsed().as_millis() as u64,
        "Crawled source"
    );
    Ok(output)
}

/// Skip a stored link or build the article. Only fatal errors are `Err`.
async fn crawl_item<A: SourceAdapter + ?Sized>(
    adapter: &A,
    candidate: Candidate,
    ctx: &CrawlContext,
    source: &Source,
) -> Result<CrawledItem, IngestError> {
    if ctx.storage.exists_article_by_source_url(&candidate.link).await? {
        return Ok(CrawledItem::Known(candidate.link));
    }
    let link = candidate.link.clone();
    match adapter.build_article(candidate, ctx, source).await {
        Ok(article) => Ok(CrawledItem::Built(article)),
        Err(e) if e.is_fatal() => Err(e),
        Err(e) => {
            warn!(url = %link, error = %e, "Skipping item");
            Ok(CrawledItem::Failed(ItemFailure {
                link,
                error: e.to_string(),
            }))
        }
    }
}

/// Drop items without a title or link, collapse repeated links to their first
/// occurrence, then apply the per-source cap.
pub fn clean_listing(candidates: Vec<Candidate>, max_items: Option<usize>) -> Vec<Candidate> {
    candidates
        .into_iter()
        .filter(|c| !c.title.trim().is_empty() && !c.link.trim().is_empty())
        .unique_by(|c| c.link.clone())
        .take(max_items.unwrap_or(usize::MAX))
        .collect()
}

/// Content synthesized from listing data when no page body is available.
pub fn digest_content(summary: &str, link: &str) -> String {
    format!(
        "<p>{}</p><p>Read more: <a href=\"{}\">{}</a></p>",
        html_escape::encode_text(summary),
        html_escape::encode_double_quoted_attribute(link),
        html_escape::encode_text(link)
    )
}

/// Settle content and summary for an article built from a fetched page.
///
/// An empty body falls back to [`digest_content`]; an empty summary is derived
/// from the body text. Both empty is [`IngestError::EmptyContent`].
pub fn settle_content(
    body: String,
    summary: String,
    link: &str,
) -> Result<(String, String), IngestError> {
    match (body.trim().is_empty(), summary.trim().is_empty()) {
        (true, true) => Err(IngestError::EmptyContent {
            url: link.to_string(),
        }),
        (true, false) => Ok((digest_content(&summary, link), summary)),
        (false, true) => {
            let derived = cap_summary(&markup_to_text(&body), SUMMARY_MAX_CHARS, false);
            Ok((body, derived))
        }
        (false, false) => Ok((body, summary)),
    }
}

/// Parsed upstream date, or the crawl time when there is none.
pub fn published_or_now(raw: Option<&str>) -> DateTime<Utc> {
    raw.and_then(parse_published).unwrap_or_else(Utc::now)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{AndroidAuthorityConfig, default_categories};
    use crate::storage::MemoryStore;
    use crate::test_support::{StaticFetcher, StubAdapter, article, context};

    #[test]
    fn clean_listing_drops_blanks_and_repeats() {
        let listed = vec![
            Candidate::new("First", "https://example.com/a"),
            Candidate::new("", "https://example.com/b"),
            Candidate::new("No link", "  "),
            Candidate::new("First again", "https://example.com/a"),
            Candidate::new("Second", "https://example.com/c"),
            Candidate::new("Third", "https://example.com/d"),
        ];
        let kept = clean_listing(listed, Some(2));
        let titles: Vec<_> = kept.iter().map(|c| c.title.as_str()).collect();
        assert_eq!(titles, vec!["First", "Second"]);
    }

    #[test]
    fn digest_content_escapes_listing_text() {
        let html = digest_content("Tips & <tricks>", "https://example.com/a?x=1&y=\"2\"");
        assert_eq!(
            html,
            "<p>Tips &amp; &lt;tricks&gt;</p><p>Read more: <a href=\"https://example.com/a?x=1&amp;y=&quot;2&quot;\">https://example.com/a?x=1&amp;y=\"2\"</a></p>"
        );
    }

    #[test]
    fn settle_content_fallbacks() {
        let link = "https://example.com/a";

        let (content, summary) = settle_content(String::new(), "Teaser".into(), link).unwrap();
        assert!(content.starts_with("<p>Teaser</p>"));
        assert_eq!(summary, "Teaser");

        let (content, summary) =
            settle_content("<p>Body  text</p>".into(), String::new(), link).unwrap();
        assert_eq!(content, "<p>Body  text</p>");
        assert_eq!(summary, "Body text");

        let err = settle_content(" ".into(), String::new(), link).unwrap_err();
        assert!(matches!(err, IngestError::EmptyContent { .. }));
    }

    #[test]
    fn published_or_now_prefers_upstream_date() {
        let parsed = published_or_now(Some("Tue, 15 Oct 2024 14:30:00 GMT"));
        assert_eq!(parsed.to_rfc3339(), "2024-10-15T14:30:00+00:00");

        let before = Utc::now();
        assert!(published_or_now(Some("yesterday-ish")) >= before);
        assert!(published_or_now(None) >= before);
    }

    #[test]
    fn build_adapters_honours_enable_flags() {
        let mut config = SourcesConfig::default();
        assert_eq!(build_adapters(&config).len(), 3);

        config.android_authority = AndroidAuthorityConfig {
            enabled: false,
            ..AndroidAuthorityConfig::default()
        };
        let names: Vec<_> = build_adapters(&config)
            .iter()
            .map(|a| a.source_name().to_string())
            .collect();
        assert_eq!(names, vec!["Google News", "Android Police"]);
    }

    #[tokio::test]
    async fn crawl_isolates_item_failures_and_skips_known_links() {
        let store = Arc::new(MemoryStore::with_categories(default_categories()));
        store
            .save_article(article("https://stub.example/known"))
            .await
            .unwrap();
        let ctx = context(StaticFetcher::new(), store.clone());

        let adapter = StubAdapter::new("Stub")
            .with_item("Known", "https://stub.example/known")
            .with_item("Good", "https://stub.example/good")
            .with_failing_item("Broken", "https://stub.example/broken")
            .with_item("Good again", "https://stub.example/good");

        let output = adapter.crawl(&ctx).await.unwrap();
        assert_eq!(output.candidates, 3);
        assert_eq!(output.known(), vec!["https://stub.example/known"]);
        assert_eq!(output.articles().len(), 1);
        assert_eq!(output.articles()[0].source_url, "https://stub.example/good");
        assert_eq!(output.failures().len(), 1);
        assert_eq!(output.failures()[0].link, "https://stub.example/broken");

        let order: Vec<_> = output
            .items
            .iter()
            .map(|item| match item {
                CrawledItem::Known(_) => "known",
                CrawledItem::Built(_) => "built",
                CrawledItem::Failed(_) => "failed",
            })
            .collect();
        assert_eq!(order, vec!["known", "built", "failed"]);

        // The source record was created on first crawl.
        assert_eq!(store.sources().len(), 1);
        assert_eq!(store.sources()[0].name, "Stub");
    }

    #[tokio::test]
    async fn listing_failure_fails_the_source() {
        let store = Arc::new(MemoryStore::with_categories(default_categories()));
        let ctx = context(StaticFetcher::new(), store);
        let adapter = StubAdapter::new("Down").with_listing_error();

        let err = adapter.crawl(&ctx).await.unwrap_err();
        assert!(matches!(err, IngestError::Transport { .. }));
    }
}
