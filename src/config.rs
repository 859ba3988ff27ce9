//! Configuration loading.
//!
//! Settings come from an optional `mdbundle.toml`, layered over stock defaults,
//! and are then overridden by command-line flags in `main.rs`:
//!
//! ```text
//! stock defaults  →  mdbundle.toml (sparse)  →  CLI flags
//! ```
//!
//! ## Configuration Options
//!
//! ```toml
//! # All options are optional - defaults shown below
//!
//! directories = []          # Directories to bundle, relative to the working directory
//! mode = "plain"            # plain | html
//! quiet = false             # Suppress progress output
//! continue_on_error = false # Skip broken directories instead of aborting
//! extension = "md"          # Document extension (no dot)
//!
//! [validation]
//! title_matches_filename = false
//!
//! [render]
//! smart_punctuation = true
//! hard_breaks = true
//! definition_lists = true
//! external_links_new_tab = true
//! ```
//!
//! ## Partial Configuration
//!
//! Config files are sparse, so override just the values you want:
//!
//! ```toml
//! directories = ["views/faq", "views/news"]
//! mode = "html"
//! ```
//!
//! Unknown keys are rejected to catch typos early.

use crate::types::RenderMode;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Config file looked up in the working directory when `--config` is not given.
pub const CONFIG_FILENAME: &str = "mdbundle.toml";

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),
    #[error("Config validation error: {0}")]
    Validation(String),
    #[error("Config file not found: {0}")]
    NotFound(PathBuf),
}

/// Top-level configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SyncConfig {
    /// Directories to bundle, in processing order.
    pub directories: Vec<PathBuf>,
    /// Whether bundles store raw Markdown or rendered HTML.
    pub mode: RenderMode,
    pub quiet: bool,
    pub continue_on_error: bool,
    /// Document file extension, without the dot.
    pub extension: String,
    pub validation: ValidationConfig,
    pub render: RenderConfig,
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            directories: Vec::new(),
            mode: RenderMode::Plain,
            quiet: false,
            continue_on_error: false,
            extension: "md".to_string(),
            validation: ValidationConfig::default(),
            render: RenderConfig::default(),
        }
    }
}

impl SyncConfig {
    /// Validate config values are usable.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let ext = self.extension.trim();
        if ext.is_empty() {
            return Err(ConfigError::Validation("extension must not be empty".into()));
        }
        if ext.contains(['.', '/', '\\']) {
            return Err(ConfigError::Validation(format!(
                "extension must be a bare extension like \"md\", got \"{}\"",
                self.extension
            )));
        }
        if self.directories.iter().any(|d| d.as_os_str().is_empty()) {
            return Err(ConfigError::Validation(
                "directories must not contain empty paths".into(),
            ));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ValidationConfig {
    /// Require each document's `title` to equal its file name (without extension).
    pub title_matches_filename: bool,
}

/// Markdown renderer switches, used in `html` mode.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct RenderConfig {
    pub smart_punctuation: bool,
    pub hard_breaks: bool,
    pub definition_lists: bool,
    pub external_links_new_tab: bool,
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            smart_punctuation: true,
            hard_breaks: true,
            definition_lists: true,
            external_links_new_tab: true,
        }
    }
}

/// Returns the stock default config as a `toml::Value::Table`.
///
/// This is the base layer user overrides are merged onto.
pub fn stock_defaults_value() -> toml::Value {
    toml::Value::try_from(SyncConfig::default()).expect("default config must serialize")
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

/// Read a config file as a raw TOML value.
///
/// Returns `Ok(None)` if the file does not exist.
pub fn load_raw_config(path: &Path) -> Result<Option<toml::Value>, ConfigError> {
    if !path.exists() {
        return Ok(None);
    }
    let content = fs::read_to_string(path)?;
    let value: toml::Value = toml::from_str(&content)?;
    Ok(Some(value))
}

/// Merge an optional overlay onto a base value, then deserialize and validate.
pub fn resolve_config(
    base: toml::Value,
    overlay: Option<toml::Value>,
) -> Result<SyncConfig, ConfigError> {
    let merged = match overlay {
        Some(ov) => merge_toml(base, ov),
        None => base,
    };
    let config: SyncConfig = merged.try_into()?;
    config.validate()?;
    Ok(config)
}

/// Load the effective configuration.
///
/// An explicit path must exist. Without one, `mdbundle.toml` in `dir` is used
/// if present, and stock defaults otherwise.
pub fn load_config(explicit: Option<&Path>, dir: &Path) -> Result<SyncConfig, ConfigError> {
    let overlay = match explicit {
        Some(path) => Some(
            load_raw_config(path)?.ok_or_else(|| ConfigError::NotFound(path.to_path_buf()))?,
        ),
        None => load_raw_config(&dir.join(CONFIG_FILENAME))?,
    };
    resolve_config(stock_defaults_value(), overlay)
}

/// Returns a fully-commented stock `mdbundle.toml`.
///
/// Used by the `gen-config` CLI command.
pub fn stock_config_toml() -> &'static str {
    r##"# mdbundle configuration
# ======================
# All settings are optional. Remove or comment out any you don't need.
# Values shown below are the defaults.
#
# Command-line flags override these values. Unknown keys will cause an error.

# Directories to bundle, in processing order. Relative paths resolve against
# the working directory. Each directory gets a bundle named after itself,
# e.g. views/faq/faq.json.
directories = []

# What `content` holds in the bundle: "plain" keeps the Markdown body,
# "html" stores it rendered.
mode = "plain"

# Suppress progress output.
quiet = false

# Record broken directories in the report and keep going instead of aborting.
# Missing or empty directories always abort.
continue_on_error = false

# Extension of source documents, without the dot. Matched case-insensitively.
extension = "md"

# ---------------------------------------------------------------------------
# Document validation
# ---------------------------------------------------------------------------
[validation]
# Require each document's title to equal its file name (without extension).
title_matches_filename = false

# ---------------------------------------------------------------------------
# Markdown rendering (html mode only)
# ---------------------------------------------------------------------------
[render]
# Curly quotes, en/em dashes and ellipses.
smart_punctuation = true

# Treat single line breaks inside a paragraph as <br />.
hard_breaks = true

# "Term\n: Definition" lists.
definition_lists = true

# Open links to http(s) targets in a new tab.
external_links_new_tab = true
"##
}
