//! Google News search feed.
//!
//! The listing is the Google News RSS search endpoint for the configured
//! query. Each item links to a publisher's article page, which is fetched and
//! run through the extractor.
//!
//! # URL Pattern
//!
//! ```text
//! https://news.google.com/rss/search?q=<query>&hl=en-US&gl=US&ceid=US:en
//! ```

use async_trait::async_trait;
use tracing::{debug, instrument};

use super::feed::parse_rss;
use super::{
    CrawlContext, SUMMARY_MAX_CHARS, SourceAdapter, published_or_now, settle_content,
};
use crate::config::GoogleNewsConfig;
use crate::error::IngestError;
use crate::extract::{extract_body, extract_image};
use crate::fetch::Fetch;
use crate::models::{Article, Candidate, Source};
use crate::utils::{cap_summary, markup_to_text};

const SOURCE_NAME: &str = "Google News";

/// Adapter for the Google News RSS search feed.
#[derive(Debug, Clone)]
pub struct GoogleNews {
    feed_url: String,
    max_items: Option<usize>,
}

impl GoogleNews {
    pub fn new(config: &GoogleNewsConfig) -> Self {
        Self {
            feed_url: search_feed_url(&config.query),
            max_items: config.max_items,
        }
    }

    pub fn feed_url(&self) -> &str {
        &self.feed_url
    }
}

/// RSS search URL for `query`.
pub fn search_feed_url(query: &str) -> String {
    format!(
        "https://news.google.com/rss/search?q={}&hl=en-US&gl=US&ceid=US:en",
        urlencoding::encode(query.trim())
    )
}

/// Everything taken from the article page. Parsed synchronously so no DOM
/// lives across an await.
struct PageParts {
    body: String,
    image: String,
}

fn parse_page(markup: &str, link: &str) -> PageParts {
    PageParts {
        body: extract_body(markup),
        image: extract_image(markup, link),
    }
}

#[async_trait]
impl SourceAdapter for GoogleNews {
    fn source_name(&self) -> &str {
        SOURCE_NAME
    }

    fn source_info(&self) -> Source {
        Source {
            name: SOURCE_NAME.to_string(),
            url: "https://news.google.com".to_string(),
            logo_url: Some("https://www.google.com/favicon.ico".to_string()),
            description: Some(
                "Google News aggregates headlines from news sources worldwide".to_string(),
            ),
        }
    }

    fn max_items(&self) -> Option<usize> {
        self.max_items
    }

    #[instrument(level = "info", skip_all, fields(url = %self.feed_url))]
    async fn list_candidates(&self, fetcher: &dyn Fetch) -> Result<Vec<Candidate>, IngestError> {
        let xml = fetcher.fetch(&self.feed_url).await?;
        parse_rss(&xml, &self.feed_url)
    }

    #[instrument(level = "debug", skip_all, fields(url = %candidate.link))]
    async fn build_article(
        &self,
        candidate: Candidate,
        ctx: &CrawlContext,
        source: &Source,
    ) -> Result<Article, IngestError> {
        let markup = ctx.fetcher.fetch(&candidate.link).await?;
        let page = parse_page(&markup, &candidate.link);

        let description = candidate
            .raw_summary
            .as_deref()
            .map(markup_to_text)
            .unwrap_or_default();
        let text = format!("{} {}", candidate.title, description);
        let category = ctx.classifier.classify(&text, None, &ctx.categories)?;
        let tags = ctx.classifier.tag(&text);

        let summary = cap_summary(&description, SUMMARY_MAX_CHARS, false);
        let (content, summary) = settle_content(page.body, summary, &candidate.link)?;
        debug!(bytes = content.len(), category = %category.slug, "Built article");

        Ok(Article {
            source_url: candidate.link,
            title: candidate.title,
            content,
            summary,
            image_url: Some(page.image).filter(|i| !i.is_empty()),
            published_at: published_or_now(candidate.raw_published.as_deref()),
            author: candidate.raw_author,
            author_bio: None,
            author_avatar: None,
            tags,
            category: category.slug,
            source: source.name.clone(),
        })
    }
}
