//! Keyword classification of articles into categories and tags.
//!
//! Classification is deterministic substring containment over lowercased
//! text, driven by an ordered [`RuleTable`]:
//!
//! 1. URL rules are tried first against the article's URL path.
//! 2. Text rules are tried next against `title + summary`.
//! 3. The first rule with any matching trigger wins. If nothing matches, or the
//!    winning slug is not in the registry, the **default category** (the first
//!    category in registry order) is used.
//!
//! Tagging is independent and non-exclusive: every tag rule with a matching
//! trigger contributes its tag, and the fallback tag is used when none match.

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

use crate::error::IngestError;
use crate::models::Category;

/// Maps any of `triggers` to the category `slug`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CategoryRule {
    pub slug: String,
    pub triggers: Vec<String>,
}

/// Attaches `tag` when any of `triggers` occurs.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TagRule {
    pub tag: String,
    pub triggers: Vec<String>,
}

/// Ordered rule lists. Order is significant: evaluation is first-match-wins.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RuleTable {
    pub url_rules: Vec<CategoryRule>,
    pub text_rules: Vec<CategoryRule>,
    pub tag_rules: Vec<TagRule>,
    pub fallback_tag: String,
}

fn category_rule(slug: &str, triggers: &[&str]) -> CategoryRule {
    CategoryRule {
        slug: slug.to_string(),
        triggers: triggers.iter().map(|t| t.to_string()).collect(),
    }
}

fn tag_rule(tag: &str, triggers: &[&str]) -> TagRule {
    TagRule {
        tag: tag.to_string(),
        triggers: triggers.iter().map(|t| t.to_string()).collect(),
    }
}

impl Default for RuleTable {
    fn default() -> Self {
        Self {
            url_rules: vec![
                category_rule("phones", &["/phones/"]),
                category_rule("tablets", &["/tablet/", "/tablets/"]),
                category_rule("wearables", &["/wearables/"]),
                category_rule("apps", &["/apps/"]),
                category_rule("development", &["/android-development/"]),
                category_rule("google", &["/google/"]),
            ],
            text_rules: vec![
                category_rule("phones", &["phone", "smartphone", "pixel", "galaxy"]),
                category_rule("tablets", &["tablet", "ipad"]),
                category_rule("wearables", &["wear", "watch", "wearable"]),
                category_rule("apps", &["app", "application"]),
                category_rule("os", &["android 13", "android 14", "os", "update"]),
                category_rule("development", &["develop", "code", "programming"]),
                category_rule("google", &["google"]),
            ],
            tag_rules: vec![
                tag_rule("Android 13", &["android 13"]),
                tag_rule("Android 14", &["android 14"]),
                tag_rule("Pixel", &["pixel"]),
                tag_rule("Samsung", &["samsung"]),
                tag_rule("Galaxy", &["galaxy"]),
                tag_rule("Google", &["google"]),
                tag_rule("App", &["app"]),
                tag_rule("Update", &["update"]),
            ],
            fallback_tag: "Android".to_string(),
        }
    }
}

/// The categories known to storage, in insertion order.
#[derive(Debug, Clone, Default)]
pub struct CategoryRegistry {
    categories: Vec<Category>,
}

impl CategoryRegistry {
    pub fn new(categories: Vec<Category>) -> Self {
        Self { categories }
    }

    pub fn get(&self, slug: &str) -> Option<&Category> {
        self.categories.iter().find(|c| c.slug == slug)
    }

    /// First category in registry order.
    pub fn default_category(&self) -> Option<&Category> {
        self.categories.first()
    }

    pub fn is_empty(&self) -> bool {
        self.categories.is_empty()
    }

    pub fn len(&self) -> usize {
        self.categories.len()
    }
}

/// Applies a [`RuleTable`]. Triggers are lowercased once at construction.
#[derive(Debug, Clone)]
pub struct Classifier {
    rules: RuleTable,
}

impl Classifier {
    pub fn new(mut rules: RuleTable) -> Self {
        for rule in rules.url_rules.iter_mut().chain(rules.text_rules.iter_mut()) {
            lowercase_all(&mut rule.triggers);
        }
        for rule in rules.tag_rules.iter_mut() {
            lowercase_all(&mut rule.triggers);
        }
        Self { rules }
    }

    /// Slug of the first matching rule, URL rules before text rules.
    pub fn resolve_slug(&self, text: &str, url_path: Option<&str>) -> Option<&str> {
        if let Some(path) = url_path {
            if let Some(rule) = first_match(&self.rules.url_rules, &path.to_lowercase()) {
                return Some(rule.slug.as_str());
            }
        }
        first_match(&self.rules.text_rules, &text.to_lowercase()).map(|rule| rule.slug.as_str())
    }

    /// Pick the category for an article.
    ///
    /// # Errors
    ///
    /// [`IngestError::EmptyCategoryRegistry`] when the registry has no
    /// categories and there is nothing to fall back to.
    pub fn classify(
        &self,
        text: &str,
        url_path: Option<&str>,
        registry: &CategoryRegistry,
    ) -> Result<Category, IngestError> {
        let default = registry
            .default_category()
            .ok_or(IngestError::EmptyCategoryRegistry)?;
        let category = self
            .resolve_slug(text, url_path)
            .and_then(|slug| registry.get(slug))
            .unwrap_or(default);
        Ok(category.clone())
    }

    /// Derive the tag set for `text`. Never empty.
    pub fn tag(&self, text: &str) -> BTreeSet<String> {
        let haystack = text.to_lowercase();
        let mut tags: BTreeSet<String> = self
            .rules
            .tag_rules
            .iter()
            .filter(|rule| rule.triggers.iter().any(|t| haystack.contains(t.as_str())))
            .map(|rule| rule.tag.clone())
            .collect();
        if tags.is_empty() {
            tags.insert(self.rules.fallback_tag.clone());
        }
        tags
    }
}

impl Default for Classifier {
    fn default() -> Self {
        Self::new(RuleTable::default())
    }
}

fn lowercase_all(triggers: &mut [String]) {
    for t in triggers.iter_mut() {
        *t = t.to_lowercase();
    }
}

fn first_match<'a>(rules: &'a [CategoryRule], haystack: &str) -> Option<&'a CategoryRule> {
    rules
        .iter()
        .find(|rule| rule.triggers.iter().any(|t| haystack.contains(t.as_str())))
}
