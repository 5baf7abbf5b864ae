//! Main-content and image extraction from arbitrary article markup.
//!
//! Extraction never fails: every lookup degrades to a documented fallback.
//!
//! # Body
//!
//! 1. Strip non-content elements (scripts, styles, frames, ads, related
//!    posts, comments) from the whole document.
//! 2. Pick the content region: the first element matching a known article
//!    selector, else the block container with the most direct `<p>` children
//!    (first in document order wins ties), else the whole `<body>`.
//! 3. Strip share widgets, author-bio boxes and newsletter prompts from the
//!    chosen region only, and return its inner HTML.
//!
//! # Image
//!
//! `og:image`, else the first image inside an article container, else the
//! first image anywhere whose URL does not mention `logo` or `icon`, else `""`.

use chrono::{DateTime, Utc};
use once_cell::sync::Lazy;
use scraper::{ElementRef, Html, Selector};
use url::Url;

use crate::utils::{collapse_whitespace, parse_published};

fn selector(css: &str) -> Selector {
    Selector::parse(css).expect("static selector")
}

static NOISE: Lazy<Selector> = Lazy::new(|| {
    selector("script, style, iframe, noscript, .advertisement, .ads, .related-posts, .comments")
});
static REGION_NOISE: Lazy<Selector> =
    Lazy::new(|| selector(".social-share, .author-bio, .newsletter-signup"));
static CONTENT: Lazy<Selector> = Lazy::new(|| {
    selector("article .content, .post-content, .entry-content, .article-content, main")
});
static BLOCKS: Lazy<Selector> = Lazy::new(|| selector("div, section, article"));
static BODY: Lazy<Selector> = Lazy::new(|| selector("body"));
static OG_IMAGE: Lazy<Selector> = Lazy::new(|| selector(r#"meta[property="og:image"]"#));
static ARTICLE_IMAGES: Lazy<Selector> =
    Lazy::new(|| selector("article img, .post-content img, .entry-content img"));
static ANY_IMAGE: Lazy<Selector> = Lazy::new(|| selector("img"));
static PUBLISHED: Lazy<Selector> = Lazy::new(|| {
    selector(r#"meta[property="article:published_time"], meta[itemprop="datePublished"]"#)
});
static AUTHOR_CARD: Lazy<Selector> = Lazy::new(|| selector(".author-bio"));
static AUTHOR_AVATAR: Lazy<Selector> = Lazy::new(|| selector("img"));

/// Extract the main content of an article page as an HTML fragment.
///
/// Empty input yields an empty string; anything else yields at least the body markup.
pub fn extract_body(markup: &str) -> String {
    let mut doc = Html::parse_document(markup);

    let noise: Vec<_> = doc.select(&NOISE).map(|el| el.id()).collect();
    for id in noise {
        if let Some(mut node) = doc.tree.get_mut(id) {
            node.detach();
        }
    }

    let Some(region) = find_main_content(&doc).map(|el| el.id()) else {
        return doc
            .select(&BODY)
            .next()
            .map(|body| body.inner_html().trim().to_string())
            .unwrap_or_default();
    };

    let region_noise: Vec<_> = doc
        .tree
        .get(region)
        .and_then(ElementRef::wrap)
        .map(|el| el.select(&REGION_NOISE).map(|n| n.id()).collect())
        .unwrap_or_default();
    for id in region_noise {
        if let Some(mut node) = doc.tree.get_mut(id) {
            node.detach();
        }
    }

    doc.tree
        .get(region)
        .and_then(ElementRef::wrap)
        .map(|el| el.inner_html().trim().to_string())
        .unwrap_or_default()
}

/// Extract a representative image URL, resolved against `page_url`.
///
/// Returns an empty string when the page has no usable image.
pub fn extract_image(markup: &str, page_url: &str) -> String {
    let doc = Html::parse_document(markup);
    let base = Url::parse(page_url).ok();

    if let Some(og) = attr_of_first(&doc, &OG_IMAGE, "content") {
        if let Some(resolved) = resolve(base.as_ref(), &og) {
            return resolved;
        }
    }

    if let Some(resolved) = doc
        .select(&ARTICLE_IMAGES)
        .filter_map(|img| img.value().attr("src"))
        .find_map(|src| resolve(base.as_ref(), src))
    {
        return resolved;
    }

    doc.select(&ANY_IMAGE)
        .filter_map(|img| img.value().attr("src"))
        .filter_map(|src| resolve(base.as_ref(), src))
        .find(|src| !src.contains("logo") && !src.contains("icon"))
        .unwrap_or_default()
}

/// `content` attribute of the first `<meta>` matching `css`, if non-empty.
pub fn meta_content(markup: &str, css: &str) -> Option<String> {
    let sel = Selector::parse(css).ok()?;
    let doc = Html::parse_document(markup);
    attr_of_first(&doc, &sel, "content").map(|c| collapse_whitespace(&c))
}

/// Normalized text of the first element matching `css`, if non-empty.
pub fn select_text(markup: &str, css: &str) -> Option<String> {
    let sel = Selector::parse(css).ok()?;
    let doc = Html::parse_document(markup);
    let text = doc
        .select(&sel)
        .next()
        .map(|el| collapse_whitespace(&el.text().collect::<Vec<_>>().join(" ")))?;
    (!text.is_empty()).then_some(text)
}

/// Publish time from `article:published_time` / `datePublished` metadata.
pub fn published_at(markup: &str) -> Option<DateTime<Utc>> {
    let doc = Html::parse_document(markup);
    doc.select(&PUBLISHED)
        .filter_map(|m| m.value().attr("content"))
        .find_map(parse_published)
}

/// Author bio text and avatar URL from the page's author-bio box.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AuthorCard {
    pub bio: Option<String>,
    pub avatar: Option<String>,
}

/// Read the author-bio box that [`extract_body`] strips from the content.
pub fn author_card(markup: &str, page_url: &str) -> AuthorCard {
    let doc = Html::parse_document(markup);
    let Some(card) = doc.select(&AUTHOR_CARD).next() else {
        return AuthorCard::default();
    };
    let base = Url::parse(page_url).ok();
    let bio = collapse_whitespace(&card.text().collect::<Vec<_>>().join(" "));
    let avatar = card
        .select(&AUTHOR_AVATAR)
        .filter_map(|img| img.value().attr("src"))
        .find_map(|src| resolve(base.as_ref(), src));
    AuthorCard {
        bio: (!bio.is_empty()).then_some(bio),
        avatar,
    }
}

fn find_main_content(doc: &Html) -> Option<ElementRef<'_>> {
    if let Some(el) = doc.select(&CONTENT).next() {
        return Some(el);
    }

    let mut best: Option<(ElementRef<'_>, usize)> = None;
    for block in doc.select(&BLOCKS) {
        let paragraphs = block
            .children()
            .filter_map(ElementRef::wrap)
            .filter(|child| child.value().name() == "p")
            .count();
        if paragraphs > best.map_or(0, |(_, n)| n) {
            best = Some((block, paragraphs));
        }
    }
    best.map(|(el, _)| el)
}

fn attr_of_first(doc: &Html, sel: &Selector, attr: &str) -> Option<String> {
    doc.select(sel)
        .filter_map(|el| el.value().attr(attr))
        .map(str::trim)
        .find(|v| !v.is_empty())
        .map(str::to_string)
}

/// Resolve `src` against the page URL; absolute URLs pass through.
fn resolve(base: Option<&Url>, src: &str) -> Option<String> {
    let src = src.trim();
    if src.is_empty() || src.starts_with("data:") {
        return None;
    }
    match base {
        Some(base) => base.join(src).ok().map(|u| u.to_string()),
        None => Url::parse(src).ok().map(|u| u.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const PAGE_URL: &str = "https://www.example.com/news/pixel-9-review/";

    #[test]
    fn semantic_container_wins_over_denser_div() {
        let html = r#"<html><body>
            <div><p>n1</p><p>n2</p><p>n3</p><p>n4</p></div>
            <div class="post-content"><p>Real story.</p></div>
        </body></html>"#;
        assert_eq!(extract_body(html), "<p>Real story.</p>");
    }

    #[test]
    fn first_semantic_match_in_document_order() {
        let html = r#"<body>
            <main><p>Main region</p></main>
            <div class="entry-content"><p>Entry</p></div>
        </body>"#;
        assert_eq!(extract_body(html), "<p>Main region</p>");
    }

    #[test]
    fn densest_block_is_chosen_without_semantic_match() {
        let html = r#"<body>
            <div id="nav"><p>Home</p></div>
            <div id="story"><p>One.</p><p>Two.</p><p>Three.</p></div>
            <section><p>Footer</p><p>Links</p></section>
        </body>"#;
        assert_eq!(extract_body(html), "<p>One.</p><p>Two.</p><p>Three.</p>");
    }

    #[test]
    fn only_direct_paragraphs_count_and_ties_keep_the_first() {
        let html = r#"<body>
            <div id="outer"><div id="a"><p>a1</p><p>a2</p></div><div id="b"><p>b1</p><p>b2</p></div></div>
        </body>"#;
        // #outer has no direct <p>; #a and #b tie, #a comes first.
        assert_eq!(extract_body(html), "<p>a1</p><p>a2</p>");
    }

    #[test]
    fn falls_back_to_body_without_paragraphs() {
        let html = "<html><body><span>Just a line</span></body></html>";
        assert_eq!(extract_body(html), "<span>Just a line</span>");
    }

    #[test]
    fn noise_is_removed_before_selection() {
        let html = r#"<body>
            <div class="comments"><p>c1</p><p>c2</p><p>c3</p></div>
            <div id="story"><p>Story</p><script>track()</script></div>
        </body>"#;
        assert_eq!(extract_body(html), "<p>Story</p>");
    }

    #[test]
    fn region_noise_is_stripped_only_inside_the_region() {
        let html = r#"<body>
            <div class="social-share">outside</div>
            <article><div class="content"><p>Body</p><div class="social-share">share</div><div class="author-bio">bio</div></div></article>
        </body>"#;
        assert_eq!(extract_body(html), "<p>Body</p>");

        // Outside the region the widget survives, so the body fallback keeps it.
        let no_region = r#"<body><div class="social-share">share me</div></body>"#;
        assert!(extract_body(no_region).contains("share me"));
    }

    #[test]
    fn malformed_and_empty_markup_never_panics() {
        assert_eq!(extract_body(""), "");
        assert_eq!(extract_body("<div><p>unclosed"), "<p>unclosed</p>");
        assert_eq!(extract_body("plain text only"), "plain text only");
        let _ = extract_body("<<<>>></p></div><html><body>");
        assert_eq!(extract_image("<img", PAGE_URL), "");
    }

    #[test]
    fn og_image_is_preferred() {
        let html = r#"<head><meta property="og:image" content="https://cdn.example.com/hero.jpg"></head>
            <body><article><img src="/inline.jpg"></article></body>"#;
        assert_eq!(extract_image(html, PAGE_URL), "https://cdn.example.com/hero.jpg");
    }

    #[test]
    fn article_image_is_resolved_against_the_page() {
        let html = r#"<body><img src="/static/banner.png"><article><p>x</p><img src="../img/shot.jpg"></article></body>"#;
        assert_eq!(
            extract_image(html, PAGE_URL),
            "https://www.example.com/news/img/shot.jpg"
        );
    }

    #[test]
    fn logo_and_icon_images_are_skipped() {
        let html = r#"<body>
            <img src="/assets/logo.svg"><img src="/assets/icon-share.png"><img src="/uploads/photo.jpg">
        </body>"#;
        assert_eq!(
            extract_image(html, PAGE_URL),
            "https://www.example.com/uploads/photo.jpg"
        );
    }

    #[test]
    fn missing_image_is_empty_not_an_error() {
        let html = r#"<body><img src="/logo.png"><p>text</p></body>"#;
        assert_eq!(extract_image(html, PAGE_URL), "");
    }

    #[test]
    fn metadata_helpers() {
        let html = r#"<head>
            <meta name="description" content="  A   short teaser. ">
            <meta property="article:published_time" content="2024-10-15T16:30:00+02:00">
        </head><body><span class="aa_author_name"> Jane  Doe </span></body>"#;
        assert_eq!(
            meta_content(html, r#"meta[name="description"]"#).as_deref(),
            Some("A short teaser.")
        );
        assert_eq!(select_text(html, ".aa_author_name").as_deref(), Some("Jane Doe"));
        assert_eq!(select_text(html, ".missing"), None);
        assert_eq!(
            published_at(html).map(|d| d.to_rfc3339()).as_deref(),
            Some("2024-10-15T14:30:00+00:00")
        );
    }

    #[test]
    fn author_card_reads_bio_and_avatar() {
        let html = r#"<body><div class="author-bio"><img src="/avatars/jane.png"><p>Jane covers Android.</p></div></body>"#;
        let card = author_card(html, PAGE_URL);
        assert_eq!(card.bio.as_deref(), Some("Jane covers Android."));
        assert_eq!(
            card.avatar.as_deref(),
            Some("https://www.example.com/avatars/jane.png")
        );
        assert_eq!(author_card("<body></body>", PAGE_URL), AuthorCard::default());
    }
}
