//! Minimal RSS 2.0 reader shared by the feed-based adapters.
//!
//! Only the item fields the adapters consume are mapped; everything else in
//! the document is ignored. HTML named entities that are not valid XML
//! (`&nbsp;`, `&copy;` and friends) are resolved from the HTML5 table, and
//! unknown ones are dropped instead of failing the listing.

use quick_xml::de::{Deserializer, EntityResolver};
use quick_xml::escape::resolve_html5_entity;
use quick_xml::events::BytesText;
use serde::Deserialize;
use std::convert::Infallible;
use tracing::{debug, warn};

use crate::error::IngestError;
use crate::models::Candidate;
use crate::utils::truncate_for_log;

#[derive(Debug, Deserialize)]
struct Rss {
    channel: Channel,
}

#[derive(Debug, Deserialize)]
struct Channel {
    #[serde(rename = "item", default)]
    items: Vec<Item>,
}

#[derive(Debug, Deserialize)]
struct Item {
    title: Option<String>,
    link: Option<String>,
    #[serde(rename = "pubDate")]
    pub_date: Option<String>,
    description: Option<String>,
    /// Google News names the original publisher here.
    source: Option<ItemSource>,
    #[serde(rename = "creator", alias = "dc:creator")]
    creator: Option<String>,
    enclosure: Option<Enclosure>,
}

#[derive(Debug, Deserialize)]
struct ItemSource {
    #[serde(rename = "$text")]
    name: Option<String>,
}

#[derive(Debug, Deserialize)]
struct Enclosure {
    #[serde(rename = "@url")]
    url: Option<String>,
}

/// Parse an RSS document into listing candidates, in feed order.
///
/// Items keep whatever fields they have; filtering of items without a title
/// or link happens when the listing is deduplicated.
///
/// # Errors
///
/// [`IngestError::Feed`] if `xml` is not a well-formed RSS document.
pub fn parse_rss(xml: &str, feed_url: &str) -> Result<Vec<Candidate>, IngestError> {
    let mut de = Deserializer::from_str_with_resolver(xml, HtmlEntities);
    let rss = Rss::deserialize(&mut de).map_err(|e| {
        warn!(
            url = feed_url,
            error = %e,
            preview = %truncate_for_log(xml, 200),
            "Listing is not a well-formed RSS feed"
        );
        IngestError::Feed {
            url: feed_url.to_string(),
            message: e.to_string(),
        }
    })?;

    let candidates: Vec<Candidate> = rss
        .channel
        .items
        .into_iter()
        .map(|item| Candidate {
            title: trimmed(item.title).unwrap_or_default(),
            link: trimmed(item.link).unwrap_or_default(),
            raw_summary: trimmed(item.description),
            raw_author: trimmed(item.creator).or_else(|| trimmed(item.source.and_then(|s| s.name))),
            raw_published: trimmed(item.pub_date),
            raw_image: trimmed(item.enclosure.and_then(|e| e.url)),
        })
        .collect();

    debug!(url = feed_url, items = candidates.len(), "Parsed RSS feed");
    Ok(candidates)
}

fn trimmed(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

/// Resolves HTML named entities in feed text.
struct HtmlEntities;

impl EntityResolver for HtmlEntities {
    type Error = Infallible;

    fn capture(&mut self, _doctype: BytesText) -> Result<(), Self::Error> {
        Ok(())
    }

    fn resolve(&self, entity: &str) -> Option<&str> {
        match entity {
            "nbsp" => Some(" "),
            other => resolve_html5_entity(other).or(Some("")),
        }
    }
}
