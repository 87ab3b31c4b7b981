//! Tool configuration module.
//!
//! Handles loading, validating, and merging `hajj-photos.toml`. Every
//! threshold the crop, encoder, and compliance checks use lives here, so
//! behaviour can be tuned without touching the logic. Stock defaults are
//! overridden by whatever keys the user file sets.
//!
//! ## Configuration Options
//!
//! ```toml
//! # All options are optional - defaults shown below
//!
//! [geometry]
//! preview = 240             # Side of the interactive crop viewport (px)
//! output = 200              # Side of the exported photo (px)
//! min_zoom = 1.0
//! max_zoom = 3.0
//!
//! [encoder]
//! max_bytes = 1048576       # Exported JPEG must not exceed this
//! initial_quality = 0.92    # First attempt
//! quality_step = 0.07       # Lowered by this much per retry
//! min_quality = 0.5         # Never encode below this
//! preview_quality = 0.85    # Live preview, no budget search
//!
//! [compliance]
//! target_x = 0.5            # Where the face center should sit (fraction of frame)
//! target_y = 0.45
//! center_tol_x = 0.10
//! center_tol_y = 0.15
//! min_face_frac = 0.35      # Face height as fraction of frame height
//! max_face_frac = 0.55
//! min_brightness = 170.0    # Mean background luminance (0-255)
//! max_std_dev = 28.0        # Background luminance spread
//! grid_size = 64            # Analysis grid side, independent of camera resolution
//! face_margin = 0.06        # Face box growth before excluding it from background
//! corner_frac = 0.12        # Corner square side for the "corners" strategy
//! background = "full-frame" # or "corners"
//! ```
//!
//! ## Partial Configuration
//!
//! Config files are sparse: override just the values you want:
//!
//! ```toml
//! [compliance]
//! min_brightness = 150.0
//! ```
//!
//! Unknown keys are rejected to catch typos early.

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use thiserror::Error;

/// File name looked up in the working directory when `--config` is not given.
pub const DEFAULT_CONFIG_FILE: &str = "hajj-photos.toml";

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),
    #[error("Config validation error: {0}")]
    Validation(String),
}

/// Tool configuration loaded from `hajj-photos.toml`.
///
/// All fields have defaults matching the photo requirements (200×200 JPEG,
/// at most 1 MiB). User config files need only specify what they override.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct AppConfig {
    /// Viewport and output raster sizes, zoom range.
    pub geometry: GeometryConfig,
    /// Budget search for the exported JPEG.
    pub encoder: EncoderConfig,
    /// Face position/size and background thresholds.
    pub compliance: ComplianceConfig,
}

impl AppConfig {
    /// Validate config values are within acceptable ranges.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let g = &self.geometry;
        if g.preview == 0 || g.output == 0 {
            return Err(ConfigError::Validation(
                "geometry.preview and geometry.output must be non-zero".into(),
            ));
        }
        if !(g.min_zoom >= 1.0 && g.min_zoom <= g.max_zoom) {
            return Err(ConfigError::Validation(
                "geometry zoom range must satisfy 1 <= min_zoom <= max_zoom".into(),
            ));
        }

        let e = &self.encoder;
        if e.max_bytes == 0 {
            return Err(ConfigError::Validation(
                "encoder.max_bytes must be non-zero".into(),
            ));
        }
        for (name, q) in [
            ("initial_quality", e.initial_quality),
            ("min_quality", e.min_quality),
            ("preview_quality", e.preview_quality),
        ] {
            if !(q > 0.0 && q <= 1.0) {
                return Err(ConfigError::Validation(format!(
                    "encoder.{name} must be in (0, 1]"
                )));
            }
        }
        if e.min_quality > e.initial_quality {
            return Err(ConfigError::Validation(
                "encoder.min_quality must not exceed encoder.initial_quality".into(),
            ));
        }
        if !(e.quality_step >= MIN_QUALITY_STEP && e.quality_step <= 1.0) {
            return Err(ConfigError::Validation(format!(
                "encoder.quality_step must be in [{MIN_QUALITY_STEP}, 1]"
            )));
        }

        let c = &self.compliance;
        for (name, value) in [
            ("target_x", c.target_x),
            ("target_y", c.target_y),
            ("center_tol_x", c.center_tol_x),
            ("center_tol_y", c.center_tol_y),
            ("min_face_frac", c.min_face_frac),
            ("max_face_frac", c.max_face_frac),
            ("min_brightness", c.min_brightness),
            ("max_std_dev", c.max_std_dev),
            ("face_margin", c.face_margin),
        ] {
            if !(value.is_finite() && value >= 0.0) {
                return Err(ConfigError::Validation(format!(
                    "compliance.{name} must be a non-negative number"
                )));
            }
        }
        if c.min_face_frac > c.max_face_frac {
            return Err(ConfigError::Validation(
                "compliance.min_face_frac must not exceed compliance.max_face_frac".into(),
            ));
        }
        if c.grid_size == 0 {
            return Err(ConfigError::Validation(
                "compliance.grid_size must be non-zero".into(),
            ));
        }
        if !(c.corner_frac > 0.0 && c.corner_frac <= 0.5) {
            return Err(ConfigError::Validation(
                "compliance.corner_frac must be in (0, 0.5]".into(),
            ));
        }
        // First grid point sits half a cell in from the edge
        if c.corner_frac * c.grid_size as f64 <= 0.5 {
            return Err(ConfigError::Validation(format!(
                "compliance.corner_frac is too small to cover any point of a {0}x{0} grid",
                c.grid_size
            )));
        }
        Ok(())
    }
}

/// Smallest accepted `encoder.quality_step`; keeps the quality search short.
pub const MIN_QUALITY_STEP: f32 = 0.01;

/// Crop viewport settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct GeometryConfig {
    /// Side of the square preview viewport, in preview pixels.
    pub preview: u32,
    /// Side of the exported square photo, in pixels.
    pub output: u32,
    pub min_zoom: f64,
    pub max_zoom: f64,
}

impl Default for GeometryConfig {
    fn default() -> Self {
        Self {
            preview: 240,
            output: 200,
            min_zoom: 1.0,
            max_zoom: 3.0,
        }
    }
}

/// Budget-constrained JPEG encoding settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct EncoderConfig {
    /// Largest acceptable encoded size, in bytes.
    pub max_bytes: usize,
    pub initial_quality: f32,
    pub quality_step: f32,
    pub min_quality: f32,
    /// Quality for the live preview encode.
    pub preview_quality: f32,
}

impl Default for EncoderConfig {
    fn default() -> Self {
        Self {
            max_bytes: 1024 * 1024,
            initial_quality: 0.92,
            quality_step: 0.07,
            min_quality: 0.5,
            preview_quality: 0.85,
        }
    }
}

/// How background quality is scored.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum BackgroundStrategy {
    /// Mean and spread of luminance over every grid cell outside the face.
    FullFrame,
    /// Mean luminance of four corner squares only; no plainness check.
    Corners,
}

/// Live compliance heuristics thresholds.
///
/// All positions and sizes are fractions of the frame; luminance values are
/// on the 0–255 scale.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ComplianceConfig {
    pub target_x: f64,
    pub target_y: f64,
    pub center_tol_x: f64,
    pub center_tol_y: f64,
    pub min_face_frac: f64,
    pub max_face_frac: f64,
    pub min_brightness: f64,
    pub max_std_dev: f64,
    pub grid_size: u32,
    pub face_margin: f64,
    pub corner_frac: f64,
    pub background: BackgroundStrategy,
}

impl Default for ComplianceConfig {
    fn default() -> Self {
        Self {
            target_x: 0.5,
            // Slightly above center to leave room for the shoulders
            target_y: 0.45,
            center_tol_x: 0.10,
            center_tol_y: 0.15,
            min_face_frac: 0.35,
            max_face_frac: 0.55,
            min_brightness: 170.0,
            max_std_dev: 28.0,
            grid_size: 64,
            face_margin: 0.06,
            corner_frac: 0.12,
            background: BackgroundStrategy::FullFrame,
        }
    }
}

// =============================================================================
// Config loading, merging, and validation
// =============================================================================

/// Returns the stock default config as a `toml::Value::Table`.
///
/// This is the canonical representation of all default values, used as the
/// base layer for merging user overrides on top.
pub fn stock_defaults_value() -> toml::Value {
    toml::Value::try_from(AppConfig::default()).expect("default config must serialize")
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

/// Load a config file as a raw TOML value.
///
/// Returns `Ok(None)` if the file does not exist.
/// Returns `Err` if the file exists but contains invalid TOML.
pub fn load_raw_config(path: &Path) -> Result<Option<toml::Value>, ConfigError> {
    if !path.exists() {
        return Ok(None);
    }
    let content = fs::read_to_string(path)?;
    let value: toml::Value = toml::from_str(&content)?;
    Ok(Some(value))
}

/// Merge an optional overlay onto the stock defaults, then deserialize and validate.
pub fn resolve_config(overlay: Option<toml::Value>) -> Result<AppConfig, ConfigError> {
    let base = stock_defaults_value();
    let merged = match overlay {
        Some(ov) => merge_toml(base, ov),
        None => base,
    };
    let config: AppConfig = merged.try_into()?;
    config.validate()?;
    Ok(config)
}

/// Load config from the file at `path`, falling back to stock defaults when
/// it does not exist. Rejects unknown keys and validates the result.
pub fn load_config(path: &Path) -> Result<AppConfig, ConfigError> {
    let overlay = load_raw_config(path)?;
    let config = resolve_config(overlay)?;
    log::debug!("loaded config from {}", path.display());
    Ok(config)
}

/// Returns a fully-commented stock config with all keys and explanations.
///
/// Used by the `gen-config` CLI command.
pub fn stock_config_toml() -> &'static str {
    r##"# Hajj Photos Configuration
# =========================
# All settings are optional. Remove or comment out any you don't need.
# Values shown below are the defaults.
# Unknown keys will cause an error.

# ---------------------------------------------------------------------------
# Crop viewport
# ---------------------------------------------------------------------------
[geometry]
# Side of the square viewport the photo is positioned in (preview pixels).
# Pan offsets are expressed in these units.
preview = 240

# Side of the exported square photo in pixels.
output = 200

# Zoom slider range. The minimum must be at least 1 so the photo always
# covers the whole viewport.
min_zoom = 1.0
max_zoom = 3.0

# ---------------------------------------------------------------------------
# JPEG encoding
# ---------------------------------------------------------------------------
[encoder]
# Largest accepted file size in bytes (1 MiB).
max_bytes = 1048576

# First encode quality (0-1), lowered by quality_step until the file fits,
# never below min_quality. quality_step must be between 0.01 and 1.
initial_quality = 0.92
quality_step = 0.07
min_quality = 0.5

# Quality for the live preview image.
preview_quality = 0.85

# ---------------------------------------------------------------------------
# Live guidance heuristics (best-effort only)
# ---------------------------------------------------------------------------
[compliance]
# Target face center as a fraction of the frame, and allowed deviation.
target_x = 0.5
target_y = 0.45
center_tol_x = 0.10
center_tol_y = 0.15

# Face height as a fraction of frame height.
min_face_frac = 0.35
max_face_frac = 0.55

# Background luminance (0-255): minimum mean, maximum standard deviation.
min_brightness = 170.0
max_std_dev = 28.0

# Frames are sampled on a grid_size x grid_size grid.
grid_size = 64

# The face box is grown by this fraction before it is excluded from the
# background sample.
face_margin = 0.06

# "full-frame": mean + spread over all background cells.
# "corners": mean of four corner squares (corner_frac of the frame), no
# plainness check.
background = "full-frame"
corner_frac = 0.12
"##
}
