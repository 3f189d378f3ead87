//! Site configuration module.
//!
//! Handles loading, validating, and merging `lenta.toml`. The user file is
//! sparse: it is merged on top of the stock defaults, so it only needs the
//! keys it wants to change.
//!
//! ## Config File Location
//!
//! ```text
//! site/
//! ├── lenta.toml            # Optional, overrides stock defaults
//! ├── posts/
//! │   ├── index.json        # Feed
//! │   └── *.html            # Post detail pages
//! ├── shop-data.json        # Catalog
//! └── private-posts.json    # Private timeline
//! ```
//!
//! ## Configuration Options
//!
//! ```toml
//! locale = "ru_RU"                  # Date label locale
//!
//! [feed]
//! endpoint = "/posts/index.json"    # Feed JSON, fetched uncached
//! overlay_list_size = 9             # Overlay items after the hero
//!
//! [timeline]
//! posts = "private-posts.json"
//! page_size = 5
//! root_margin_px = 400              # Sentinel lookahead
//! author = "Almir"
//! handle = "@pereuloq"
//! unlock_key = "privateUnlocked"    # Storage flag that unlocks the timeline
//!
//! [shop]
//! catalog = "shop-data.json"
//! section_size = 18                 # popular / new / recommended
//! home_section_size = 16            # popularGrid / newGrid
//! related_count = 3                 # Related products on the product page
//! promo_interval_ms = 3000
//! promo_fade_ms = 160
//! reduced_motion = false            # Disables promo rotation
//! ```
//!
//! Unknown keys are rejected to catch typos early.

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use thiserror::Error;

/// Config file name looked up in the site root.
pub const CONFIG_FILE: &str = "lenta.toml";

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),
    #[error("Config validation error: {0}")]
    Validation(String),
}

/// Site configuration loaded from `lenta.toml`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SiteConfig {
    /// Locale for date labels, e.g. `ru_RU`. Unknown locales fall back to
    /// numeric dates.
    pub locale: String,
    pub feed: FeedConfig,
    pub timeline: TimelineConfig,
    pub shop: ShopConfig,
}

impl Default for SiteConfig {
    fn default() -> Self {
        Self {
            locale: "ru_RU".to_string(),
            feed: FeedConfig::default(),
            timeline: TimelineConfig::default(),
            shop: ShopConfig::default(),
        }
    }
}

impl SiteConfig {
    /// Validate config values are within acceptable ranges.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !self.feed.endpoint.starts_with('/') {
            return Err(ConfigError::Validation(
                "feed.endpoint must be an absolute path".into(),
            ));
        }
        if self.timeline.page_size == 0 {
            return Err(ConfigError::Validation(
                "timeline.page_size must be non-zero".into(),
            ));
        }
        if self.timeline.root_margin_px < 0 {
            return Err(ConfigError::Validation(
                "timeline.root_margin_px must not be negative".into(),
            ));
        }
        if self.shop.section_size == 0 || self.shop.home_section_size == 0 {
            return Err(ConfigError::Validation(
                "shop section sizes must be non-zero".into(),
            ));
        }
        if self.shop.promo_interval_ms == 0 {
            return Err(ConfigError::Validation(
                "shop.promo_interval_ms must be non-zero".into(),
            ));
        }
        if self.shop.promo_fade_ms >= self.shop.promo_interval_ms {
            return Err(ConfigError::Validation(
                "shop.promo_fade_ms must be shorter than shop.promo_interval_ms".into(),
            ));
        }
        Ok(())
    }
}

/// Feed loading settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct FeedConfig {
    /// Site path of the feed JSON.
    pub endpoint: String,
    /// Overlay list items rendered after the hero.
    pub overlay_list_size: usize,
}

impl Default for FeedConfig {
    fn default() -> Self {
        Self {
            endpoint: "/posts/index.json".to_string(),
            overlay_list_size: 9,
        }
    }
}

/// Private timeline settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct TimelineConfig {
    /// Private posts JSON, relative to the site root.
    pub posts: String,
    pub page_size: usize,
    /// How far outside the viewport the sentinel triggers the next page.
    pub root_margin_px: i64,
    pub author: String,
    pub handle: String,
    /// Storage key whose value `"1"` unlocks the timeline.
    pub unlock_key: String,
}

impl Default for TimelineConfig {
    fn default() -> Self {
        Self {
            posts: "private-posts.json".to_string(),
            page_size: 5,
            root_margin_px: 400,
            author: "Almir".to_string(),
            handle: "@pereuloq".to_string(),
            unlock_key: "privateUnlocked".to_string(),
        }
    }
}

/// Catalog and shop page settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ShopConfig {
    /// Catalog JSON, relative to the site root.
    pub catalog: String,
    pub section_size: usize,
    pub home_section_size: usize,
    pub related_count: usize,
    pub promo_interval_ms: u64,
    pub promo_fade_ms: u64,
    pub reduced_motion: bool,
}

impl Default for ShopConfig {
    fn default() -> Self {
        Self {
            catalog: "shop-data.json".to_string(),
            section_size: 18,
            home_section_size: 16,
            related_count: 3,
            promo_interval_ms: 3000,
            promo_fade_ms: 160,
            reduced_motion: false,
        }
    }
}

/// Returns the stock default config as a `toml::Value::Table`.
///
/// The base layer user overrides are merged onto.
pub fn stock_defaults_value() -> toml::Value {
    toml::Value::try_from(SiteConfig::default()).expect("default config must serialize")
}

/// Recursively merge `overlay` on top of `base`.
///
/// - Tables are merged key-by-key (overlay keys override base keys).
/// - Non-table values in overlay replace base values entirely.
/// - Keys in base that are not in overlay are preserved.
pub fn merge_toml(base: toml::Value, overlay: toml::Value) -> toml::Value {
    match (base, overlay) {
        (toml::Value::Table(mut base_table), toml::Value::Table(overlay_table)) => {
            for (key, overlay_val) in overlay_table {
                let merged = match base_table.remove(&key) {
                    Some(base_val) => merge_toml(base_val, overlay_val),
                    None => overlay_val,
                };
                base_table.insert(key, merged);
            }
            toml::Value::Table(base_table)
        }
        (_, overlay) => overlay,
    }
}

/// Load `lenta.toml` from a directory as a raw TOML value.
///
/// Returns `Ok(None)` if the directory has no config file.
pub fn load_raw_config(dir: &Path) -> Result<Option<toml::Value>, ConfigError> {
    let config_path = dir.join(CONFIG_FILE);
    if !config_path.exists() {
        return Ok(None);
    }
    let content = fs::read_to_string(&config_path)?;
    let value: toml::Value = toml::from_str(&content)?;
    Ok(Some(value))
}

/// Merge an optional overlay onto a base value, then deserialize and validate.
pub fn resolve_config(
    base: toml::Value,
    overlay: Option<toml::Value>,
) -> Result<SiteConfig, ConfigError> {
    let merged = match overlay {
        Some(ov) => merge_toml(base, ov),
        None => base,
    };
    let config: SiteConfig = merged.try_into()?;
    config.validate()?;
    Ok(config)
}

/// Load config from `lenta.toml` in the site root.
pub fn load_config(root: &Path) -> Result<SiteConfig, ConfigError> {
    let base = stock_defaults_value();
    let overlay = load_raw_config(root)?;
    resolve_config(base, overlay)
}

/// Returns a fully-commented stock `lenta.toml`.
///
/// Used by the `gen-config` CLI command.
pub fn stock_config_toml() -> &'static str {
    r##"# Lenta Configuration
# ===================
# All settings are optional. Remove or comment out any you don't need.
# Values shown below are the defaults.
# Unknown keys will cause an error.

# Locale for date labels (e.g. "ru_RU", "en_US").
# Unknown locales fall back to numeric dates (dd.mm.yyyy).
locale = "ru_RU"

# ---------------------------------------------------------------------------
# Feed
# ---------------------------------------------------------------------------
[feed]
# Site path of the feed JSON array. Always fetched uncached.
endpoint = "/posts/index.json"

# Items shown in the overlay list after the hero card.
overlay_list_size = 9

# ---------------------------------------------------------------------------
# Private timeline
# ---------------------------------------------------------------------------
[timeline]
# Private posts JSON, relative to the site root.
posts = "private-posts.json"

# Posts appended per page in the "all" tab.
page_size = 5

# Load the next page when the sentinel is this close to the viewport.
root_margin_px = 400

# Author line on every post.
author = "Almir"
handle = "@pereuloq"

# Storage flag that must be "1" for the timeline to initialize.
unlock_key = "privateUnlocked"

# ---------------------------------------------------------------------------
# Shop
# ---------------------------------------------------------------------------
[shop]
# Catalog JSON ({ products, categories }), relative to the site root.
catalog = "shop-data.json"

# Tiles in the popular / new / recommended sections.
section_size = 18

# Tiles in the category-scoped popularGrid / newGrid sections.
home_section_size = 16

# Related products on the product page.
related_count = 3

# Promo strip rotation interval and cross-fade duration.
promo_interval_ms = 3000
promo_fade_ms = 160

# Set to true to keep the promo strip still.
reduced_motion = false
"##
}
