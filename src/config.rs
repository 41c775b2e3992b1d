//! Site configuration module.
//!
//! Handles loading, validating, and merging `config.toml`. Stock defaults are
//! serialized to a TOML table and the user file is merged on top, so a config
//! file only needs the keys it wants to change.
//!
//! ## Config File Location
//!
//! ```text
//! content/
//! ├── config.toml      # Overrides stock defaults
//! ├── article/
//! ├── about/
//! ├── index/
//! └── static/
//! ```
//!
//! ## Configuration Options
//!
//! ```toml
//! # All options are optional - defaults shown below
//!
//! [site]
//! title = "My Blog"
//! # domain = "blog.example.com"   # Enables sitemap.xml and CNAME
//!
//! [paths]
//! article_root = "article"        # Output directory of article pages
//! index_page = "index.html"
//! timeline_page = "timeline.html"
//! archive_page = "archive.html"
//! about_page = "about.html"
//!
//! [processing]
//! max_processes = 4               # Max parallel workers (omit for auto = CPU cores)
//! ```
//!
//! Unknown keys are rejected to catch typos early.

use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fs;
use std::path::Path;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),
    #[error("Config validation error: {0}")]
    Validation(String),
    #[error("Missing required configuration: {0}")]
    Missing(&'static str),
}

/// Site configuration loaded from `config.toml`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SiteConfig {
    /// Site identity.
    pub site: SiteInfo,
    /// Output locations of article and special pages.
    pub paths: PathsConfig,
    /// Parallel processing settings.
    pub processing: ProcessingConfig,
}

impl SiteConfig {
    /// Validate values that serde alone cannot check.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.paths.article_root.trim_matches('/').is_empty() {
            return Err(ConfigError::Missing("paths.article_root"));
        }

        let mut seen = HashSet::new();
        for (key, path) in self.paths.special_pages() {
            if path.trim_matches('/').is_empty() {
                return Err(ConfigError::Validation(format!(
                    "paths.{key} must not be empty"
                )));
            }
            if !path.ends_with(".html") {
                return Err(ConfigError::Validation(format!(
                    "paths.{key} must end in .html, got `{path}`"
                )));
            }
            if !seen.insert(path.trim_start_matches('/')) {
                return Err(ConfigError::Validation(format!(
                    "paths.{key} duplicates another page path: `{path}`"
                )));
            }
        }

        if let Some(domain) = &self.site.domain
            && domain.trim().is_empty()
        {
            return Err(ConfigError::Validation(
                "site.domain must not be empty when set".into(),
            ));
        }
        Ok(())
    }
}

/// Site identity.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SiteInfo {
    /// Shown in page titles and the header.
    pub title: String,
    /// Bare host name, e.g. `blog.example.com`. Enables sitemap and CNAME.
    pub domain: Option<String>,
}

impl Default for SiteInfo {
    fn default() -> Self {
        Self {
            title: "My Blog".to_string(),
            domain: None,
        }
    }
}

/// Output locations, relative to the output root.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct PathsConfig {
    /// Directory article pages are placed in.
    pub article_root: String,
    pub index_page: String,
    pub timeline_page: String,
    pub archive_page: String,
    pub about_page: String,
}

impl Default for PathsConfig {
    fn default() -> Self {
        Self {
            article_root: "article".to_string(),
            index_page: "index.html".to_string(),
            timeline_page: "timeline.html".to_string(),
            archive_page: "archive.html".to_string(),
            about_page: "about.html".to_string(),
        }
    }
}

impl PathsConfig {
    /// `(key, path)` for every non-article page.
    pub fn special_pages(&self) -> [(&'static str, &str); 4] {
        [
            ("index_page", self.index_page.as_str()),
            ("timeline_page", self.timeline_page.as_str()),
            ("archive_page", self.archive_page.as_str()),
            ("about_page", self.about_page.as_str()),
        ]
    }
}

/// Parallel processing settings.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ProcessingConfig {
    /// Maximum number of parallel parse/render workers.
    /// When absent or null, defaults to the number of CPU cores.
    /// Values larger than the core count are clamped down.
    pub max_processes: Option<usize>,
}

/// Resolve the effective thread count from config.
///
/// - `None` → use all available cores
/// - `Some(n)` → use `min(n, cores)` (user can constrain down, not up)
pub fn effective_threads(config: &ProcessingConfig) -> usize {
    let cores = std::thread::available_parallelism()
        .map(|n| n.get())
        .unwrap_or(1);
    config
        .max_processes
        .map(|n| n.clamp(1, cores))
        .unwrap_or(cores)
}

// =============================================================================
// Config loading, merging, and validation
// =============================================================================

/// Returns the stock default config as a `toml::Value::Table`.
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

/// Load a `config.toml` from a directory as a raw TOML value.
///
/// Returns `Ok(None)` if no `config.toml` exists in the directory.
pub fn load_raw_config(path: &Path) -> Result<Option<toml::Value>, ConfigError> {
    let config_path = path.join("config.toml");
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

/// Load config from `config.toml` in the content root.
pub fn load_config(root: &Path) -> Result<SiteConfig, ConfigError> {
    let base = stock_defaults_value();
    let overlay = load_raw_config(root)?;
    resolve_config(base, overlay)
}

/// Returns a fully-commented stock `config.toml` with all keys and explanations.
///
/// Used by the `gen-config` CLI command.
pub fn stock_config_toml() -> &'static str {
    r##"# Simple Blog Configuration
# =========================
# All settings are optional. Remove or comment out any you don't need.
# Values shown below are the defaults.
#
# Place this file at content/config.toml.
# Unknown keys will cause an error.

# ---------------------------------------------------------------------------
# Site
# ---------------------------------------------------------------------------
[site]
# Shown in page titles and the header of every page.
title = "My Blog"

# Bare host name the site is served from. When set, the build also writes
# sitemap.xml and a CNAME file.
# domain = "blog.example.com"

# ---------------------------------------------------------------------------
# Output paths (relative to the output directory)
# ---------------------------------------------------------------------------
[paths]
# Directory article pages are written to: article/<name>.html
article_root = "article"

index_page = "index.html"
timeline_page = "timeline.html"
archive_page = "archive.html"
about_page = "about.html"

# ---------------------------------------------------------------------------
# Processing
# ---------------------------------------------------------------------------
[processing]
# Maximum parallel workers for parsing and rendering documents.
# Omit or comment out to auto-detect (= number of CPU cores).
# max_processes = 4
"##
}
