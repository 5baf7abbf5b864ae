//! Utility functions for text normalization, summaries, dates and file system checks.
//!
//! This module provides helper functions used throughout the crate:
//! - Markup-to-text flattening and whitespace collapsing
//! - Summary capping with an optional ellipsis marker
//! - Lenient publish-date parsing for feeds and article pages
//! - String truncation for logging
//! - File system validation for output directories

use chrono::{DateTime, Utc};
use once_cell::sync::Lazy;
use regex::Regex;
use scraper::Html;
use std::fs as stdfs;
use tokio::fs;
use tracing::{info, instrument};

use crate::error::IngestError;

static WHITESPACE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s+").expect("valid regex"));

/// Collapse runs of whitespace into single spaces and trim the ends.
pub fn collapse_whitespace(s: &str) -> String {
    WHITESPACE.replace_all(s, " ").trim().to_string()
}

/// Flatten an HTML fragment (or plain text) into normalized plain text.
///
/// Tags are dropped, entities decoded, whitespace collapsed. Plain text passes
/// through unchanged apart from whitespace.
///
/// # Examples
///
/// ```ignore
/// assert_eq!(markup_to_text("<a href=\"x\">Pixel&nbsp;9</a>  <b>out</b>"), "Pixel 9 out");
/// ```
pub fn markup_to_text(markup: &str) -> String {
    let fragment = Html::parse_fragment(markup);
    let text = fragment.root_element().text().collect::<Vec<_>>().join(" ");
    collapse_whitespace(&text)
}

/// Cap a summary at `max_chars` characters.
///
/// When the text is longer than the cap it is cut on a character boundary and,
/// if `ellipsis` is set, `"..."` is appended to mark the truncation.
pub fn cap_summary(text: &str, max_chars: usize, ellipsis: bool) -> String {
    if text.chars().count() <= max_chars {
        return text.to_string();
    }
    let mut out: String = text.chars().take(max_chars).collect();
    if ellipsis {
        out.push_str("...");
    }
    out
}

/// Lowercased path component of a URL, or `None` when the link does not parse.
pub fn url_path(link: &str) -> Option<String> {
    url::Url::parse(link).ok().map(|u| u.path().to_lowercase())
}

/// Parse an upstream publish date.
///
/// Accepts RFC 2822 (RSS `pubDate`) and RFC 3339 (`article:published_time`).
/// Returns `None` for anything else; callers substitute the crawl time.
pub fn parse_published(raw: &str) -> Option<DateTime<Utc>> {
    let raw = raw.trim();
    if raw.is_empty() {
        return None;
    }
    DateTime::parse_from_rfc2822(raw)
        .or_else(|_| DateTime::parse_from_rfc3339(raw))
        .ok()
        .map(|dt| dt.with_timezone(&Utc))
}

/// Truncate a string for logging purposes.
///
/// Long strings are truncated to at most `max` bytes (on a character boundary)
/// with an ellipsis and byte count indicator appended.
///
/// # Examples
///
/// ```ignore
/// assert_eq!(truncate_for_log("short", 100), "short");
/// assert_eq!(truncate_for_log("a".repeat(500), 10), "aaaaaaaaaa…(+490 bytes)");
/// ```
pub fn truncate_for_log(s: &str, max: usize) -> String {
    if s.len() <= max {
        return s.to_string();
    }
    let mut cut = max;
    while !s.is_char_boundary(cut) {
        cut -= 1;
    }
    format!("{}…(+{} bytes)", &s[..cut], s.len() - cut)
}

/// Ensure a directory exists and is writable.
///
/// This function creates the directory if it doesn't exist, then performs
/// a write test by creating and immediately deleting a probe file.
///
/// # Errors
///
/// Returns [`IngestError::Storage`] if the directory cannot be created or is
/// not writable (permission denied, read-only filesystem, etc.).
#[instrument(level = "info", skip_all, fields(path = %path))]
pub async fn ensure_writable_dir(path: &str) -> Result<(), IngestError> {
    fs::create_dir_all(path).await?;
    // Try a small sync write using std fs (simpler error surface)
    let probe_path = format!("{}/..__probe_write__", path.trim_end_matches('/'));
    stdfs::File::create(&probe_path)?;
    let _ = stdfs::remove_file(&probe_path);
    info!("Output directory is writable");
    Ok(())
}
