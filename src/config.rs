//! YAML configuration for the ingestion pipeline.
//!
//! Every section is optional; missing sections fall back to the defaults
//! below, which reproduce the stock Android news setup: three sources, the
//! eight-category taxonomy and the standard keyword rule table.
//!
//! ```yaml
//! fetch:
//!   timeout_secs: 20
//!   item_concurrency: 6
//! schedule:
//!   interval_minutes: 60
//! sources:
//!   google_news:
//!     query: "android"
//! ```

use itertools::Itertools;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;
use tracing::{info, instrument};

use crate::classify::RuleTable;
use crate::error::IngestError;
use crate::models::Category;

/// Top-level configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub fetch: FetchConfig,
    pub schedule: ScheduleConfig,
    /// Seed taxonomy, in the order that defines the default category.
    pub categories: Vec<Category>,
    pub sources: SourcesConfig,
    pub rules: RuleTable,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            fetch: FetchConfig::default(),
            schedule: ScheduleConfig::default(),
            categories: default_categories(),
            sources: SourcesConfig::default(),
            rules: RuleTable::default(),
        }
    }
}

/// HTTP client settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FetchConfig {
    /// Whole-request timeout for every listing and article fetch.
    pub timeout_secs: u64,
    pub connect_timeout_secs: u64,
    pub user_agent: String,
    /// Article pages fetched in parallel within one source.
    pub item_concurrency: usize,
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            timeout_secs: 20,
            connect_timeout_secs: 10,
            user_agent: concat!(
                "Mozilla/5.0 (compatible; android_news_ingest/",
                env!("CARGO_PKG_VERSION"),
                ")"
            )
            .to_string(),
            item_concurrency: 6,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScheduleConfig {
    pub interval_minutes: u64,
}

/// Longest accepted schedule: one week.
pub const MAX_INTERVAL_MINUTES: u64 = 7 * 24 * 60;

impl ScheduleConfig {
    /// Time between scheduled runs.
    pub fn period(&self) -> Duration {
        Duration::from_secs(self.interval_minutes.saturating_mul(60))
    }
}

impl Default for ScheduleConfig {
    fn default() -> Self {
        Self {
            interval_minutes: 60,
        }
    }
}

/// Per-source switches and parameters.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SourcesConfig {
    pub google_news: GoogleNewsConfig,
    pub android_authority: AndroidAuthorityConfig,
    pub android_police: AndroidPoliceConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GoogleNewsConfig {
    pub enabled: bool,
    /// Search terms for the RSS search feed.
    pub query: String,
    pub max_items: Option<usize>,
}

impl Default for GoogleNewsConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            query: "android".to_string(),
            max_items: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AndroidAuthorityConfig {
    pub enabled: bool,
    pub listing_url: String,
    pub max_items: Option<usize>,
}

impl Default for AndroidAuthorityConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            listing_url: "https://www.androidauthority.com/news/".to_string(),
            max_items: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AndroidPoliceConfig {
    pub enabled: bool,
    pub feed_url: String,
    pub max_items: Option<usize>,
}

impl Default for AndroidPoliceConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            feed_url: "https://www.androidpolice.com/feed/".to_string(),
            max_items: Some(20),
        }
    }
}

/// The stock eight-category taxonomy.
pub fn default_categories() -> Vec<Category> {
    [
        ("phones", "Phones", "Android phone news"),
        ("tablets", "Tablets", "Android tablet news"),
        ("wearables", "Wearables", "Android wearable news"),
        ("apps", "Apps", "Android app news"),
        ("os", "OS", "Android operating system news"),
        ("development", "Development", "Android development news"),
        ("google", "Google", "Google news"),
        ("hardware", "Hardware", "Android hardware news"),
    ]
    .into_iter()
    .map(|(slug, name, description)| Category {
        slug: slug.to_string(),
        name: name.to_string(),
        description: Some(description.to_string()),
    })
    .collect()
}

/// Parse configuration from YAML text.
pub fn parse_config(yaml: &str) -> Result<Config, IngestError> {
    let config: Config = serde_yaml::from_str(yaml)?;
    config.validate()?;
    Ok(config)
}

/// Load configuration from a YAML file.
///
/// # Errors
///
/// [`IngestError::Config`] if the file cannot be read, is not valid YAML, or
/// fails validation.
#[instrument(level = "info", skip_all, fields(path = %path.as_ref().display()))]
pub fn load_config(path: impl AsRef<Path>) -> Result<Config, IngestError> {
    let path = path.as_ref();
    let yaml = std::fs::read_to_string(path)
        .map_err(|e| IngestError::Config(format!("reading {}: {e}", path.display())))?;
    let config = parse_config(&yaml)?;
    info!(
        categories = config.categories.len(),
        text_rules = config.rules.text_rules.len(),
        "Loaded configuration"
    );
    Ok(config)
}

impl Config {
    fn validate(&self) -> Result<(), IngestError> {
        if self.fetch.item_concurrency == 0 {
            return Err(IngestError::Config(
                "fetch.item_concurrency must be at least 1".into(),
            ));
        }
        if self.fetch.timeout_secs == 0 {
            return Err(IngestError::Config(
                "fetch.timeout_secs must be at least 1".into(),
            ));
        }
        if self.fetch.connect_timeout_secs == 0 {
            return Err(IngestError::Config(
                "fetch.connect_timeout_secs must be at least 1".into(),
            ));
        }
        if !(1..=MAX_INTERVAL_MINUTES).contains(&self.schedule.interval_minutes) {
            return Err(IngestError::Config(format!(
                "schedule.interval_minutes must be between 1 and {MAX_INTERVAL_MINUTES}"
            )));
        }
        let mut slugs = self.categories.iter().map(|c| c.slug.as_str()).duplicates();
        if let Some(slug) = slugs.next() {
            return Err(IngestError::Config(format!(
                "categories: duplicate slug '{slug}'"
            )));
        }
        let mut names = self.categories.iter().map(|c| c.name.as_str()).duplicates();
        if let Some(name) = names.next() {
            return Err(IngestError::Config(format!(
                "categories: duplicate name '{name}'"
            )));
        }
        if self.rules.fallback_tag.trim().is_empty() {
            return Err(IngestError::Config("rules.fallback_tag must not be empty".into()));
        }
        Ok(())
    }
}
