//! Configuration for the `img-compress` CLI.
//!
//! Loaded from a TOML file passed with `--config`. Stock defaults are
//! serialized to a TOML table and the user file is merged on top, so a config
//! only needs the keys it overrides. Unknown keys are rejected.
//!
//! ```toml
//! [defaults]
//! quality = 0.92    # JPEG quality, 0.0–1.0
//! type = "jpg"      # jpg | jpeg | png
//! fit = "scale"     # scale | fill
//!
//! [render]
//! filter = "triangle"  # nearest | triangle | catmullrom | gaussian | lanczos3
//! ```
//!
//! These only supply CLI defaults and the resampling filter. Requests built
//! in code keep the library defaults regardless of any config file.

use crate::imaging::{FitMode, OutputFormat};
use image::imageops::FilterType;
use serde::{Deserialize, Serialize};
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

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct CompressConfig {
    /// Values used when the command line leaves them out.
    pub defaults: DefaultsConfig,
    /// Rendering settings.
    pub render: RenderConfig,
}

impl CompressConfig {
    /// Validate config values are within acceptable ranges.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(0.0..=1.0).contains(&self.defaults.quality) {
            return Err(ConfigError::Validation(
                "defaults.quality must be between 0.0 and 1.0".into(),
            ));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct DefaultsConfig {
    /// Lossy encoding quality, 0.0–1.0.
    pub quality: f32,
    /// Output format.
    #[serde(rename = "type")]
    pub format: OutputFormat,
    pub fit: FitMode,
}

impl Default for DefaultsConfig {
    fn default() -> Self {
        Self {
            quality: 0.92,
            format: OutputFormat::Jpg,
            fit: FitMode::Scale,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct RenderConfig {
    /// Resampling filter used when scaling into the target size.
    pub filter: ResizeFilter,
}

/// Resampling filters, named as in the config file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ResizeFilter {
    Nearest,
    /// Bilinear.
    #[default]
    Triangle,
    CatmullRom,
    Gaussian,
    Lanczos3,
}

impl From<ResizeFilter> for FilterType {
    fn from(filter: ResizeFilter) -> Self {
        match filter {
            ResizeFilter::Nearest => FilterType::Nearest,
            ResizeFilter::Triangle => FilterType::Triangle,
            ResizeFilter::CatmullRom => FilterType::CatmullRom,
            ResizeFilter::Gaussian => FilterType::Gaussian,
            ResizeFilter::Lanczos3 => FilterType::Lanczos3,
        }
    }
}

// =============================================================================
// Config loading, merging, and validation
// =============================================================================

/// Returns the stock default config as a `toml::Value::Table`.
pub fn stock_defaults_value() -> toml::Value {
    toml::Value::try_from(CompressConfig::default()).expect("default config must serialize")
}

/// Recursively merge `overlay` on top of `base`.
///
/// Tables merge key-by-key; any other overlay value replaces the base value.
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

/// Merge an optional overlay onto the stock defaults, then deserialize and
/// validate.
pub fn resolve_config(overlay: Option<toml::Value>) -> Result<CompressConfig, ConfigError> {
    let base = stock_defaults_value();
    let merged = match overlay {
        Some(ov) => merge_toml(base, ov),
        None => base,
    };
    let config: CompressConfig = merged.try_into()?;
    config.validate()?;
    Ok(config)
}

/// Load config from a TOML file. A missing file yields the stock defaults.
pub fn load_config(path: &Path) -> Result<CompressConfig, ConfigError> {
    if !path.exists() {
        return resolve_config(None);
    }
    let content = fs::read_to_string(path)?;
    let value: toml::Value = toml::from_str(&content)?;
    resolve_config(Some(value))
}

/// Returns a fully-commented stock config with every key.
///
/// Printed by the `gen-config` command.
pub fn stock_config_toml() -> &'static str {
    r##"# img-compress configuration
# ==========================
# All settings are optional; values shown are the defaults.
# Unknown keys cause an error.

# ---------------------------------------------------------------------------
# Defaults for options left off the command line
# ---------------------------------------------------------------------------
[defaults]
# Lossy encoding quality, 0.0 (smallest) to 1.0 (best). Ignored for png.
quality = 0.92

# Output format: "jpg", "jpeg" or "png".
type = "jpg"

# "scale" keeps the aspect ratio and never upscales.
# "fill" stretches to exactly the requested width and height.
fit = "scale"

# ---------------------------------------------------------------------------
# Rendering
# ---------------------------------------------------------------------------
[render]
# Resampling filter: "nearest", "triangle", "catmullrom", "gaussian", "lanczos3".
filter = "triangle"
"##
}
