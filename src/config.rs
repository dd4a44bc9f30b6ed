//! Library configuration.
//!
//! Handles loading, validating, and merging `config.toml`. Stock defaults are
//! the base layer; a user config file only needs the keys it wants to change.
//!
//! ## Config File Location
//!
//! `config.toml` sits in the library root, next to the uploads directory and
//! the `library.json` manifest:
//!
//! ```text
//! site/
//! ├── config.toml        # Optional, overrides stock defaults
//! ├── library.json       # Written by `scan` and `generate`
//! └── uploads/
//!     └── 2024/05/
//!         ├── dawn.jpg
//!         ├── dawn.txt           # Caption sidecar
//!         ├── dawn.alt.txt       # Alt text sidecar
//!         └── dawn-300x225.jpg   # Generated `medium` variant
//! ```
//!
//! ## Configuration Options
//!
//! ```toml
//! [uploads]
//! dir = "uploads"        # Uploads directory, relative to the library root
//! url = "/uploads"       # Public URL the uploads directory is served from
//!
//! [images]
//! quality = 82           # JPEG quality for generated variants (0-100)
//!
//! [sizes.thumbnail]
//! width = 150
//! height = 150
//! crop = true
//!
//! [processing]
//! max_processes = 4      # Max parallel workers (omit for auto = CPU cores)
//! ```
//!
//! Unknown keys are rejected to catch typos early.

use crate::sizes::SizeRegistry;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
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
}

/// Library configuration loaded from `config.toml`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct LibraryConfig {
    /// Where uploads live on disk and where they are served from.
    pub uploads: UploadsConfig,
    /// Encoding settings for generated variants.
    pub images: ImagesConfig,
    /// Registered image sizes, keyed by name.
    pub sizes: BTreeMap<String, SizeConfig>,
    /// Parallel processing settings.
    pub processing: ProcessingConfig,
}

impl Default for LibraryConfig {
    fn default() -> Self {
        Self {
            uploads: UploadsConfig::default(),
            images: ImagesConfig::default(),
            sizes: default_sizes(),
            processing: ProcessingConfig::default(),
        }
    }
}

fn default_sizes() -> BTreeMap<String, SizeConfig> {
    SizeRegistry::default()
        .iter()
        .map(|size| {
            (
                size.name.clone(),
                SizeConfig {
                    width: size.width,
                    height: size.height,
                    crop: size.crop,
                },
            )
        })
        .collect()
}

impl LibraryConfig {
    /// Validate config values are within acceptable ranges.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.images.quality > 100 {
            return Err(ConfigError::Validation(
                "images.quality must be 0-100".into(),
            ));
        }
        if self.uploads.dir.trim().is_empty() {
            return Err(ConfigError::Validation(
                "uploads.dir must not be empty".into(),
            ));
        }
        if self.processing.max_processes == Some(0) {
            return Err(ConfigError::Validation(
                "processing.max_processes must be at least 1".into(),
            ));
        }
        self.size_registry()?;
        Ok(())
    }

    /// The registered sizes as a [`SizeRegistry`].
    pub fn size_registry(&self) -> Result<SizeRegistry, ConfigError> {
        SizeRegistry::from_config(&self.sizes)
            .map_err(|e| ConfigError::Validation(format!("sizes: {e}")))
    }
}

/// Uploads directory and its public URL.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct UploadsConfig {
    /// Uploads directory, relative to the library root.
    pub dir: String,
    /// Public base URL for the uploads directory. May be absolute
    /// (`https://cdn.example.com/uploads`) or site-relative (`/uploads`).
    pub url: String,
}

impl Default for UploadsConfig {
    fn default() -> Self {
        Self {
            dir: "uploads".to_string(),
            url: "/uploads".to_string(),
        }
    }
}

/// Encoding settings for generated variants.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ImagesConfig {
    /// JPEG encoding quality (0 = worst, 100 = best).
    pub quality: u32,
}

impl Default for ImagesConfig {
    fn default() -> Self {
        Self { quality: 82 }
    }
}

/// One `[sizes.<name>]` table.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SizeConfig {
    /// Maximum width in pixels, 0 for unbounded.
    pub width: u32,
    /// Maximum height in pixels, 0 for unbounded.
    pub height: u32,
    /// Fill and center-crop to exactly `width` × `height`.
    pub crop: bool,
}

/// Parallel processing settings.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ProcessingConfig {
    /// Maximum number of parallel variant-generation workers.
    /// When absent, defaults to the number of CPU cores.
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
    config.max_processes.map(|n| n.min(cores)).unwrap_or(cores)
}

// =============================================================================
// Config loading, merging, and validation
// =============================================================================

/// Returns the stock default config as a `toml::Value::Table`.
pub fn stock_defaults_value() -> toml::Value {
    toml::Value::try_from(LibraryConfig::default()).expect("default config must serialize")
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

/// Load `config.toml` from a directory as a raw TOML value.
///
/// Returns `Ok(None)` if no `config.toml` exists in the directory.
pub fn load_raw_config(root: &Path) -> Result<Option<toml::Value>, ConfigError> {
    let config_path = root.join("config.toml");
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
) -> Result<LibraryConfig, ConfigError> {
    let merged = match overlay {
        Some(ov) => merge_toml(base, ov),
        None => base,
    };
    let config: LibraryConfig = merged.try_into()?;
    config.validate()?;
    Ok(config)
}

/// Load config from `config.toml` in the given library root.
pub fn load_config(root: &Path) -> Result<LibraryConfig, ConfigError> {
    let overlay = load_raw_config(root)?;
    resolve_config(stock_defaults_value(), overlay)
}

/// Returns a fully-commented stock `config.toml` with all keys and explanations.
///
/// Used by the `gen-config` CLI command.
pub fn stock_config_toml() -> &'static str {
    r##"# Media Library Configuration
# ===========================
# All settings are optional. Remove or comment out any you don't need.
# Values shown below are the defaults.
# Unknown keys will cause an error.

# ---------------------------------------------------------------------------
# Uploads
# ---------------------------------------------------------------------------
[uploads]
# Uploads directory, relative to the library root.
dir = "uploads"

# Public base URL the uploads directory is served from.
# Absolute ("https://cdn.example.com/uploads") or site-relative ("/uploads").
url = "/uploads"

# ---------------------------------------------------------------------------
# Variant encoding
# ---------------------------------------------------------------------------
[images]
# JPEG quality for generated variants (0 = worst, 100 = best).
quality = 82

# ---------------------------------------------------------------------------
# Image sizes
# ---------------------------------------------------------------------------
# Each [sizes.<name>] table registers a named size. A variant is generated
# for every size smaller than the original upload.
#   width/height: bounding box in pixels, 0 = unbounded
#   crop: fill the box exactly and center-crop the overflow
# "full" and "original" are reserved names.
[sizes.thumbnail]
width = 150
height = 150
crop = true

[sizes.medium]
width = 300
height = 300
crop = false

[sizes.medium_large]
width = 768
height = 0
crop = false

[sizes.large]
width = 1024
height = 1024
crop = false

# ---------------------------------------------------------------------------
# Processing
# ---------------------------------------------------------------------------
[processing]
# Maximum parallel variant-generation workers.
# Omit or comment out to auto-detect (= number of CPU cores).
# max_processes = 4
"##
}
