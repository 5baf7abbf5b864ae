//! Data models for crawled articles, their sources and the category taxonomy.
//!
//! This module defines the records that flow through the pipeline:
//! - [`Candidate`]: a raw listing item discovered on a source's feed or index page
//! - [`Article`]: a normalized, classified record ready for storage
//! - [`Source`]: the upstream publisher an article came from
//! - [`Category`]: one entry of the fixed topic taxonomy
//!
//! An article's identity is its canonical source URL. Sources are keyed by
//! name (and URL), categories by slug.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// A raw item discovered on a source listing, before the article page is fetched.
///
/// Adapters produce these from RSS items or HTML listing cards. Only `title`
/// and `link` are guaranteed to be non-empty.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Candidate {
    /// The headline as shown on the listing.
    pub title: String,
    /// Absolute URL of the article page. Becomes the article's identity.
    pub link: String,
    /// Listing description or teaser, possibly containing markup.
    pub raw_summary: Option<String>,
    /// Author or publisher name as given by the listing.
    pub raw_author: Option<String>,
    /// Publication date string exactly as the listing gave it.
    pub raw_published: Option<String>,
    /// Image URL advertised by the listing (e.g. an RSS enclosure).
    pub raw_image: Option<String>,
}

impl Candidate {
    pub fn new(title: impl Into<String>, link: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            link: link.into(),
            raw_summary: None,
            raw_author: None,
            raw_published: None,
            raw_image: None,
        }
    }
}

/// A fully processed article, as written to storage.
///
/// Exactly one category and one source are referenced, by slug and by name.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Article {
    /// Canonical article URL; unique across all sources.
    pub source_url: String,
    pub title: String,
    /// Main body as an HTML fragment.
    pub content: String,
    /// Plain-text teaser, capped per source.
    pub summary: String,
    pub image_url: Option<String>,
    pub published_at: DateTime<Utc>,
    pub author: Option<String>,
    pub author_bio: Option<String>,
    pub author_avatar: Option<String>,
    /// Topical labels; always at least one.
    pub tags: BTreeSet<String>,
    /// Slug of the assigned [`Category`].
    pub category: String,
    /// Name of the originating [`Source`].
    pub source: String,
}

/// An upstream publisher.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Source {
    /// Display name; unique.
    pub name: String,
    /// Homepage URL; unique.
    pub url: String,
    pub logo_url: Option<String>,
    pub description: Option<String>,
}

/// One entry of the pre-seeded topic taxonomy.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Category {
    /// Stable identifier used by classification rules, e.g. `"phones"`.
    pub slug: String,
    /// Human readable name; unique.
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
}

impl Category {
    pub fn new(slug: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            slug: slug.into(),
            name: name.into(),
            description: None,
        }
    }
}
