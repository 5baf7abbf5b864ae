//! Android Authority news listing scraper.
//!
//! The listing page renders one `<article>` card per story with the headline
//! link in `h3 a`. Article pages carry a meta description, Open Graph image,
//! `article:published_time` and an author byline plus bio box, all of which
//! are picked up here.
//!
//! Android Authority organises stories under topical paths (`/phones/`,
//! `/wearables/`, ...), so URL rules get a say in classification before the
//! text rules.

use async_trait::async_trait;
use once_cell::sync::Lazy;
use scraper::{Html, Selector};
use tracing::{debug, info, instrument};
use url::Url;

use super::{CrawlContext, SUMMARY_MAX_CHARS, SourceAdapter, settle_content};
use crate::config::AndroidAuthorityConfig;
use crate::error::IngestError;
use crate::extract::{author_card, extract_body, extract_image, meta_content, published_at, select_text};
use crate::fetch::Fetch;
use crate::models::{Article, Candidate, Source};
use crate::utils::{cap_summary, collapse_whitespace, url_path};

const SOURCE_NAME: &str = "Android Authority";

static CARD: Lazy<Selector> = Lazy::new(|| Selector::parse("article").expect("valid selector"));
static HEADLINE: Lazy<Selector> = Lazy::new(|| Selector::parse("h3 a").expect("valid selector"));

/// Adapter for the Android Authority news listing.
#[derive(Debug, Clone)]
pub struct AndroidAuthority {
    listing_url: String,
    max_items: Option<usize>,
}

impl AndroidAuthority {
    pub fn new(config: &AndroidAuthorityConfig) -> Self {
        Self {
            listing_url: config.listing_url.clone(),
            max_items: config.max_items,
        }
    }
}

/// Headline cards on the listing page, with links made absolute.
pub fn parse_listing(markup: &str, listing_url: &str) -> Vec<Candidate> {
    let base = Url::parse(listing_url).ok();
    let document = Html::parse_document(markup);

    let mut candidates = Vec::new();
    for card in document.select(&CARD) {
        let Some(headline) = card.select(&HEADLINE).next() else {
            continue;
        };
        let title = collapse_whitespace(&headline.text().collect::<Vec<_>>().join(" "));
        let Some(href) = headline.value().attr("href") else {
            continue;
        };
        let link = match base.as_ref() {
            Some(base) => match base.join(href.trim()) {
                Ok(resolved) => resolved.to_string(),
                Err(_) => continue,
            },
            None => href.trim().to_string(),
        };
        candidates.push(Candidate::new(title, link));
    }
    candidates
}

struct PageParts {
    body: String,
    summary: String,
    image: String,
    author: Option<String>,
    author_bio: Option<String>,
    author_avatar: Option<String>,
    published: Option<chrono::DateTime<chrono::Utc>>,
}

fn parse_page(markup: &str, link: &str) -> PageParts {
    let card = author_card(markup, link);
    PageParts {
        body: extract_body(markup),
        summary: meta_content(markup, r#"meta[name="description"]"#).unwrap_or_default(),
        image: extract_image(markup, link),
        author: select_text(markup, ".aa_author_name"),
        author_bio: card.bio,
        author_avatar: card.avatar,
        published: published_at(markup),
    }
}

#[async_trait]
impl SourceAdapter for AndroidAuthority {
    fn source_name(&self) -> &str {
        SOURCE_NAME
    }

    fn source_info(&self) -> Source {
        Source {
            name: SOURCE_NAME.to_string(),
            url: "https://www.androidauthority.com".to_string(),
            logo_url: Some("https://www.androidauthority.com/favicon.ico".to_string()),
            description: Some(
                "Android Authority is the largest publication dedicated to Android OS and the tech ecosystem around it"
                    .to_string(),
            ),
        }
    }

    fn max_items(&self) -> Option<usize> {
        self.max_items
    }

    #[instrument(level = "info", skip_all, fields(url = %self.listing_url))]
    async fn list_candidates(&self, fetcher: &dyn Fetch) -> Result<Vec<Candidate>, IngestError> {
        let markup = fetcher.fetch(&self.listing_url).await?;
        let candidates = parse_listing(&markup, &self.listing_url);
        info!(count = candidates.len(), "Indexed Android Authority articles");
        Ok(candidates)
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

        let summary = cap_summary(&page.summary, SUMMARY_MAX_CHARS, false);
        let text = format!("{} {}", candidate.title, summary);
        let path = url_path(&candidate.link);
        let category = ctx
            .classifier
            .classify(&text, path.as_deref(), &ctx.categories)?;
        let tags = ctx
            .classifier
            .tag(&format!("{} {}", text, candidate.link));

        let (content, summary) = settle_content(page.body, summary, &candidate.link)?;
        debug!(bytes = content.len(), category = %category.slug, "Built article");

        Ok(Article {
            source_url: candidate.link,
            title: candidate.title,
            content,
            summary,
            image_url: Some(page.image).filter(|i| !i.is_empty()),
            published_at: page.published.unwrap_or_else(chrono::Utc::now),
            author: page.author,
            author_bio: page.author_bio,
            author_avatar: page.author_avatar,
            tags,
            category: category.slug,
            source: source.name.clone(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::default_categories;
    use crate::storage::MemoryStore;
    use crate::test_support::{StaticFetcher, context};
    use std::sync::Arc;

    const LISTING: &str = r#"<html><body>
      <article><h3><a href="/wearables/pixel-watch-3-review-3456/">Pixel Watch 3 review</a></h3></article>
      <article><h3><a href="https://www.androidauthority.com/samsung-one-ui-7-1234/"> Samsung One UI 7 beta </a></h3></article>
      <article><h2>Sponsored</h2></article>
      <article><h3><a href="/wearables/pixel-watch-3-review-3456/">Pixel Watch 3 review</a></h3></article>
    </body></html>"#;

    const WATCH_PAGE: &str = r#"<html><head>
      <meta name="description" content="The Pixel Watch 3 is bigger and brighter.">
      <meta property="og:image" content="https://cdn.androidauthority.com/pw3.jpg">
      <meta property="article:published_time" content="2024-09-05T09:00:00+02:00">
    </head><body>
      <span class="aa_author_name">Alex Writer</span>
      <article><div class="content">
        <p>Google's watch grows up.</p>
        <div class="social-share">Share</div>
      </div></article>
      <div class="author-bio"><img src="/avatars/alex.png"> Alex covers wearables.</div>
    </body></html>"#;

    const BARE_PAGE: &str = "<html><head><title>x</title></head><body></body></html>";

    fn adapter() -> AndroidAuthority {
        AndroidAuthority::new(&AndroidAuthorityConfig::default())
    }

    #[test]
    fn listing_cards_resolve_relative_links() {
        let items = parse_listing(LISTING, "https://www.androidauthority.com/news/");
        let pairs: Vec<_> = items
            .iter()
            .map(|c| (c.title.as_str(), c.link.as_str()))
            .collect();
        assert_eq!(
            pairs,
            vec![
                (
                    "Pixel Watch 3 review",
                    "https://www.androidauthority.com/wearables/pixel-watch-3-review-3456/"
                ),
                (
                    "Samsung One UI 7 beta",
                    "https://www.androidauthority.com/samsung-one-ui-7-1234/"
                ),
                (
                    "Pixel Watch 3 review",
                    "https://www.androidauthority.com/wearables/pixel-watch-3-review-3456/"
                ),
            ]
        );
    }

    #[tokio::test]
    async fn builds_article_with_page_metadata() {
        let fetcher = StaticFetcher::new()
            .with_page("https://www.androidauthority.com/news/", LISTING)
            .with_page(
                "https://www.androidauthority.com/wearables/pixel-watch-3-review-3456/",
                WATCH_PAGE,
            )
            .with_page(
                "https://www.androidauthority.com/samsung-one-ui-7-1234/",
                BARE_PAGE,
            );
        let store = Arc::new(MemoryStore::with_categories(default_categories()));
        let ctx = context(fetcher, store);

        let output = adapter().crawl(&ctx).await.unwrap();
        assert_eq!(output.candidates, 2);

        let articles = output.articles();
        let watch = articles[0];
        // URL rule beats the "pixel" text rule.
        assert_eq!(watch.category, "wearables");
        assert_eq!(watch.summary, "The Pixel Watch 3 is bigger and brighter.");
        assert!(watch.content.contains("Google's watch grows up."));
        assert!(!watch.content.contains("Share"));
        assert_eq!(
            watch.image_url.as_deref(),
            Some("https://cdn.androidauthority.com/pw3.jpg")
        );
        assert_eq!(watch.author.as_deref(), Some("Alex Writer"));
        assert_eq!(watch.author_bio.as_deref(), Some("Alex covers wearables."));
        assert_eq!(
            watch.author_avatar.as_deref(),
            Some("https://www.androidauthority.com/avatars/alex.png")
        );
        assert_eq!(watch.published_at.to_rfc3339(), "2024-09-05T07:00:00+00:00");
        assert!(watch.tags.contains("Pixel"));

        // No body and no description: the item fails, the source does not.
        assert_eq!(output.articles().len(), 1);
        assert_eq!(output.failures().len(), 1);
        assert!(output.failures()[0].error.contains("no extractable content"));
    }
}
