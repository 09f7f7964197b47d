//! Configuration module.
//!
//! Handles loading, validating, and merging `webp-renditions.toml`. Stock
//! defaults are overridden by the user's config file, and command-line flags
//! override both. The merged result is an immutable [`RenditionConfig`] that
//! is turned into a [`RenditionRequest`](crate::plan::RenditionRequest)
//! before planning, so nothing downstream reads global state.
//!
//! ## Config File Location
//!
//! `--config <path>` names a file explicitly. Without it, `webp-renditions.toml`
//! in the working directory is used when present.
//!
//! ## Configuration Options
//!
//! ```toml
//! # All options are optional - defaults shown below
//!
//! [output]
//! dir = "webp"                          # Where renditions are written
//!
//! [sizes]
//! widths = [2560, 1920, 1280, 960, 640] # Used when --widths is not given
//!
//! [encoding]
//! quality = 82                          # WebP quality (0-100)
//! # thumb_quality = 75                  # Smallest rendition (default: quality)
//! method = 4                            # cwebp effort (0 = fast, 6 = smallest)
//! # preset = "photo"                    # photo | picture | drawing | icon | text
//!
//! [probe]
//! fallback = [2560, 1440]               # Assumed size when probing fails
//! on_failure = "warn"                   # "warn" (use fallback) or "fail"
//!
//! [processing]
//! backend = "tools"                     # "tools" (ImageMagick + cwebp) or "rust"
//! # max_processes = 4                   # Parallel encodes (default: 1)
//! ```
//!
//! Unknown keys are rejected to catch typos early.

use crate::imaging::{FALLBACK_DIMENSIONS, Method, Preset};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use thiserror::Error;

/// File looked up in the working directory when `--config` is not given.
pub const CONFIG_FILENAME: &str = "webp-renditions.toml";

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),
    #[error("Config validation error: {0}")]
    Validation(String),
}

/// Configuration loaded from `webp-renditions.toml`.
///
/// All fields have sensible defaults. User config files need only specify
/// the values they want to override. Unknown keys are rejected.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct RenditionConfig {
    /// Output location.
    pub output: OutputConfig,
    /// Default width list.
    pub sizes: SizesConfig,
    /// Quality, effort and preset.
    pub encoding: EncodingConfig,
    /// What to do when the source dimensions cannot be read.
    pub probe: ProbeConfig,
    /// Backend choice and parallelism.
    pub processing: ProcessingConfig,
}

impl RenditionConfig {
    /// Validate config values are within acceptable ranges.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.output.dir.trim().is_empty() {
            return Err(ConfigError::Validation(
                "output.dir must not be empty".into(),
            ));
        }
        if self.sizes.widths.is_empty() {
            return Err(ConfigError::Validation(
                "sizes.widths must not be empty".into(),
            ));
        }
        if self.sizes.widths.contains(&0) {
            return Err(ConfigError::Validation(
                "sizes.widths values must be non-zero".into(),
            ));
        }
        if self.encoding.quality > 100 {
            return Err(ConfigError::Validation(
                "encoding.quality must be 0-100".into(),
            ));
        }
        if self.encoding.thumb_quality.is_some_and(|q| q > 100) {
            return Err(ConfigError::Validation(
                "encoding.thumb_quality must be 0-100".into(),
            ));
        }
        if self.encoding.method > Method::MAX {
            return Err(ConfigError::Validation(
                "encoding.method must be 0-6".into(),
            ));
        }
        if self.probe.fallback[0] == 0 || self.probe.fallback[1] == 0 {
            return Err(ConfigError::Validation(
                "probe.fallback values must be non-zero".into(),
            ));
        }
        if self.processing.max_processes == Some(0) {
            return Err(ConfigError::Validation(
                "processing.max_processes must be at least 1".into(),
            ));
        }
        Ok(())
    }
}

/// Output location.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct OutputConfig {
    /// Directory renditions are written to, relative to the working directory.
    pub dir: String,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            dir: "webp".to_string(),
        }
    }
}

/// Responsive width list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SizesConfig {
    /// Pixel widths to generate when none are given on the command line.
    pub widths: Vec<u32>,
}

impl Default for SizesConfig {
    fn default() -> Self {
        Self {
            widths: vec![2560, 1920, 1280, 960, 640],
        }
    }
}

/// Encoder settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct EncodingConfig {
    /// WebP quality (0 = worst, 100 = best).
    pub quality: u32,
    /// Quality for the smallest rendition. Falls back to `quality`.
    pub thumb_quality: Option<u32>,
    /// cwebp compression effort (0-6).
    pub method: u32,
    /// Encoder tuning preset.
    pub preset: Option<Preset>,
}

impl Default for EncodingConfig {
    fn default() -> Self {
        Self {
            quality: 82,
            thumb_quality: None,
            method: Method::default().value(),
            preset: None,
        }
    }
}

/// Policy when the dimension probe cannot read the source.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProbeFailurePolicy {
    /// Continue with the fallback dimensions and print a warning.
    #[default]
    Warn,
    /// Abort the run before anything is written.
    Fail,
}

/// Dimension probe settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ProbeConfig {
    /// Assumed `[width, height]` when probing fails.
    pub fallback: [u32; 2],
    pub on_failure: ProbeFailurePolicy,
}

impl Default for ProbeConfig {
    fn default() -> Self {
        Self {
            fallback: [FALLBACK_DIMENSIONS.0, FALLBACK_DIMENSIONS.1],
            on_failure: ProbeFailurePolicy::Warn,
        }
    }
}

/// Which backend performs identify/encode.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BackendKind {
    /// ImageMagick + cwebp on `PATH`.
    #[default]
    Tools,
    /// Built-in `image` crate decoders and lossless WebP encoder.
    Rust,
}

/// Backend and parallelism settings.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ProcessingConfig {
    pub backend: BackendKind,
    /// Maximum number of renditions encoded at once.
    /// When absent, renditions are encoded one at a time.
    /// Values larger than the core count are clamped down.
    pub max_processes: Option<usize>,
}

/// Resolve the effective worker count from config.
///
/// - `None` → 1 (sequential)
/// - `Some(n)` → `min(n, cores)` (user can constrain down, not up)
pub fn effective_threads(config: &ProcessingConfig) -> usize {
    let cores = std::thread::available_parallelism()
        .map(|n| n.get())
        .unwrap_or(1);
    config
        .max_processes
        .map(|n| n.clamp(1, cores))
        .unwrap_or(1)
}

// =============================================================================
// Config loading, merging, and validation
// =============================================================================

/// Returns the stock default config as a `toml::Value::Table`.
///
/// This is the canonical representation of all default values, used as the
/// base layer for merging user overrides on top.
pub fn stock_defaults_value() -> toml::Value {
    toml::Value::try_from(RenditionConfig::default()).expect("default config must serialize")
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
pub fn load_raw_config(path: &Path) -> Result<toml::Value, ConfigError> {
    let content = fs::read_to_string(path)?;
    let value: toml::Value = toml::from_str(&content)?;
    Ok(value)
}

/// Merge an optional overlay onto a base value, then deserialize and validate.
pub fn resolve_config(
    base: toml::Value,
    overlay: Option<toml::Value>,
) -> Result<RenditionConfig, ConfigError> {
    let merged = match overlay {
        Some(ov) => merge_toml(base, ov),
        None => base,
    };
    let config: RenditionConfig = merged.try_into()?;
    config.validate()?;
    Ok(config)
}

/// Load an explicitly named config file. A missing file is an error.
pub fn load_config_file(path: &Path) -> Result<RenditionConfig, ConfigError> {
    let overlay = load_raw_config(path)?;
    resolve_config(stock_defaults_value(), Some(overlay))
}

/// Load `webp-renditions.toml` from `dir` if it exists, else stock defaults.
pub fn load_config(dir: &Path) -> Result<RenditionConfig, ConfigError> {
    let path = dir.join(CONFIG_FILENAME);
    let overlay = if path.exists() {
        Some(load_raw_config(&path)?)
    } else {
        None
    };
    resolve_config(stock_defaults_value(), overlay)
}

/// Returns a fully-commented stock `webp-renditions.toml` with all keys and
/// explanations.
///
/// Used by the `gen-config` CLI command.
pub fn stock_config_toml() -> &'static str {
    r##"# webp-renditions configuration
# =============================
# All settings are optional. Remove or comment out any you don't need.
# Values shown below are the defaults. Command-line flags override them.
# Unknown keys will cause an error.

# ---------------------------------------------------------------------------
# Output
# ---------------------------------------------------------------------------
[output]
# Directory renditions are written to. Created if missing.
dir = "webp"

# ---------------------------------------------------------------------------
# Responsive widths
# ---------------------------------------------------------------------------
[sizes]
# Pixel widths to generate when --widths is not given. Widths larger than
# the source image are skipped, never upscaled. The largest remaining width
# is written as <name>.webp, the rest as <name>-<w>x<h>.webp.
widths = [2560, 1920, 1280, 960, 640]

# ---------------------------------------------------------------------------
# Encoding
# ---------------------------------------------------------------------------
[encoding]
# WebP quality (0 = worst, 100 = best).
quality = 82

# Quality for the smallest rendition only. Defaults to `quality`.
# thumb_quality = 75

# cwebp compression effort: 0 = fastest, 6 = smallest files.
method = 4

# Encoder tuning preset: photo, picture, drawing, icon or text.
# preset = "photo"

# ---------------------------------------------------------------------------
# Dimension probe
# ---------------------------------------------------------------------------
[probe]
# Size assumed when the source dimensions cannot be read. Rendition heights
# and file names derived from it may not match the real image.
fallback = [2560, 1440]

# "warn" continues with the fallback size, "fail" aborts the run.
on_failure = "warn"

# ---------------------------------------------------------------------------
# Processing
# ---------------------------------------------------------------------------
[processing]
# "tools" shells out to ImageMagick and cwebp. "rust" uses the built-in
# decoder and a lossless WebP encoder (quality and presets are ignored).
backend = "tools"

# Renditions encoded in parallel. Omit for one at a time.
# max_processes = 4
"##
}
