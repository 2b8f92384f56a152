//! TOML configuration parsing and validation.
//!
//! ```toml
//! [cache]
//! dir = "./data/cache"
//! stale_after_secs = 3600
//!
//! [refresh]
//! wait_timeout_secs = 30
//!
//! [sources]
//! timeout_secs = 30
//! use_fallback = true
//!
//! [sources.embedded_list]
//! url = "https://www.caffeineinformer.com/the-caffeine-database"
//!
//! [sources.html_table]
//! url = "http://caffeinewiz.com/"
//!
//! [answers]
//! units = "imperial"
//! ```

use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};

#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    #[serde(default)]
    pub cache: CacheConfig,
    #[serde(default)]
    pub refresh: RefreshConfig,
    #[serde(default)]
    pub sources: SourcesConfig,
    #[serde(default)]
    pub answers: AnswersConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct CacheConfig {
    #[serde(default = "default_cache_dir")]
    pub dir: PathBuf,
    #[serde(default = "default_stale_after_secs")]
    pub stale_after_secs: i64,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            dir: default_cache_dir(),
            stale_after_secs: default_stale_after_secs(),
        }
    }
}

fn default_cache_dir() -> PathBuf {
    PathBuf::from("./data/cache")
}
fn default_stale_after_secs() -> i64 {
    3600
}

#[derive(Debug, Deserialize, Clone)]
pub struct RefreshConfig {
    /// How long a query waits for an in-flight refresh before answering
    /// from whatever is loaded.
    #[serde(default = "default_wait_timeout_secs")]
    pub wait_timeout_secs: u64,
}

impl Default for RefreshConfig {
    fn default() -> Self {
        Self {
            wait_timeout_secs: default_wait_timeout_secs(),
        }
    }
}

fn default_wait_timeout_secs() -> u64 {
    30
}

#[derive(Debug, Deserialize, Clone)]
pub struct SourcesConfig {
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
    #[serde(default = "default_use_fallback")]
    pub use_fallback: bool,
    /// Replaces the bundled fallback dataset when set.
    #[serde(default)]
    pub fallback_path: Option<PathBuf>,
    #[serde(default)]
    pub embedded_list: EmbeddedListSourceConfig,
    #[serde(default)]
    pub html_table: HtmlTableSourceConfig,
}

impl Default for SourcesConfig {
    fn default() -> Self {
        Self {
            timeout_secs: default_timeout_secs(),
            use_fallback: default_use_fallback(),
            fallback_path: None,
            embedded_list: EmbeddedListSourceConfig::default(),
            html_table: HtmlTableSourceConfig::default(),
        }
    }
}

fn default_timeout_secs() -> u64 {
    30
}
fn default_use_fallback() -> bool {
    true
}

/// Source A: a page embedding its table as a literal list in a script.
#[derive(Debug, Deserialize, Clone)]
pub struct EmbeddedListSourceConfig {
    #[serde(default = "default_embedded_list_url")]
    pub url: String,
    #[serde(default = "default_start_marker")]
    pub start_marker: String,
    #[serde(default = "default_end_marker")]
    pub end_marker: String,
}

impl Default for EmbeddedListSourceConfig {
    fn default() -> Self {
        Self {
            url: default_embedded_list_url(),
            start_marker: default_start_marker(),
            end_marker: default_end_marker(),
        }
    }
}

fn default_embedded_list_url() -> String {
    "https://www.caffeineinformer.com/the-caffeine-database".to_string()
}
fn default_start_marker() -> String {
    "tbldata = [".to_string()
}
fn default_end_marker() -> String {
    "function pause".to_string()
}

/// Source B: a page rendering its drinks as a plain HTML table.
#[derive(Debug, Deserialize, Clone)]
pub struct HtmlTableSourceConfig {
    #[serde(default = "default_html_table_url")]
    pub url: String,
}

impl Default for HtmlTableSourceConfig {
    fn default() -> Self {
        Self {
            url: default_html_table_url(),
        }
    }
}

fn default_html_table_url() -> String {
    "http://caffeinewiz.com/".to_string()
}

#[derive(Debug, Deserialize, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum UnitSystem {
    #[default]
    Imperial,
    Metric,
}

#[derive(Debug, Deserialize, Clone, Default)]
pub struct AnswersConfig {
    #[serde(default)]
    pub units: UnitSystem,
}

impl Config {
    /// Defaults for every section, used when no config file exists.
    pub fn minimal() -> Self {
        Self {
            cache: CacheConfig::default(),
            refresh: RefreshConfig::default(),
            sources: SourcesConfig::default(),
            answers: AnswersConfig::default(),
        }
    }
}

pub fn load_config(path: &Path) -> Result<Config> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file: {}", path.display()))?;

    let config: Config = toml::from_str(&content).with_context(|| "Failed to parse config file")?;

    validate(&config)?;
    Ok(config)
}

fn validate(config: &Config) -> Result<()> {
    if config.cache.stale_after_secs <= 0 {
        anyhow::bail!("cache.stale_after_secs must be > 0");
    }

    if config.refresh.wait_timeout_secs == 0 {
        anyhow::bail!("refresh.wait_timeout_secs must be > 0");
    }

    if config.sources.timeout_secs == 0 {
        anyhow::bail!("sources.timeout_secs must be > 0");
    }

    let list = &config.sources.embedded_list;
    if list.url.trim().is_empty() {
        anyhow::bail!("sources.embedded_list.url must not be empty");
    }
    if list.start_marker.is_empty() || list.end_marker.is_empty() {
        anyhow::bail!("sources.embedded_list markers must not be empty");
    }

    if config.sources.html_table.url.trim().is_empty() {
        anyhow::bail!("sources.html_table.url must not be empty");
    }

    Ok(())
}
