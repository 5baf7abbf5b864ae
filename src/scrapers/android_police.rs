//! Android Police feed digest.
//!
//! Built from the RSS feed alone: article pages are never fetched. Each
//! item's content is a short digest (the feed summary plus a "Read more" link
//! back to the article), and the summary is capped tighter than for other
//! sources.

use async_trait::async_trait;
use tracing::{debug, instrument};

use super::feed::parse_rss;
use super::{CrawlContext, SourceAdapter, digest_content, published_or_now};
use crate::config::AndroidPoliceConfig;
use crate::error::IngestError;
use crate::fetch::Fetch;
use crate::models::{Article, Candidate, Source};
use crate::utils::{cap_summary, markup_to_text};

const SOURCE_NAME: &str = "Android Police";

/// Digest summaries are cut here and marked with `...`.
pub const DIGEST_SUMMARY_MAX_CHARS: usize = 200;

/// Adapter for the Android Police RSS feed.
#[derive(Debug, Clone)]
pub struct AndroidPolice {
    feed_url: String,
    max_items: Option<usize>,
}

impl AndroidPolice {
    pub fn new(config: &AndroidPoliceConfig) -> Self {
        Self {
            feed_url: config.feed_url.clone(),
            max_items: config.max_items,
        }
    }
}

#[async_trait]
impl SourceAdapter for AndroidPolice {
    fn source_name(&self) -> &str {
        SOURCE_NAME
    }

    fn source_info(&self) -> Source {
        Source {
            name: SOURCE_NAME.to_string(),
            url: "https://www.androidpolice.com".to_string(),
            logo_url: Some("https://www.androidpolice.com/favicon.ico".to_string()),
            description: Some("Android Police covers Android news, reviews and apps".to_string()),
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

    async fn build_article(
        &self,
        candidate: Candidate,
        ctx: &CrawlContext,
        source: &Source,
    ) -> Result<Article, IngestError> {
        let text = candidate
            .raw_summary
            .as_deref()
            .map(markup_to_text)
            .unwrap_or_default();
        if text.is_empty() {
            return Err(IngestError::EmptyContent {
                url: candidate.link,
            });
        }
        let summary = cap_summary(&text, DIGEST_SUMMARY_MAX_CHARS, true);

        let classified = format!("{} {}", candidate.title, summary);
        let category = ctx.classifier.classify(&classified, None, &ctx.categories)?;
        let tags = ctx.classifier.tag(&classified);
        debug!(url = %candidate.link, category = %category.slug, "Built digest article");

        Ok(Article {
            content: digest_content(&summary, &candidate.link),
            summary,
            image_url: candidate.raw_image,
            published_at: published_or_now(candidate.raw_published.as_deref()),
            author: Some(
                candidate
                    .raw_author
                    .unwrap_or_else(|| source.name.clone()),
            ),
            author_bio: None,
            author_avatar: None,
            tags,
            category: category.slug,
            source: source.name.clone(),
            source_url: candidate.link,
            title: candidate.title,
        })
    }
}
