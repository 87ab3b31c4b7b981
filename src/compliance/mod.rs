//! Per-frame compliance heuristics.
//!
//! [`analyze`] is a pure function of one frame and its (optional) face box.
//! Nothing is carried between calls: every tick produces a fresh
//! [`ComplianceSnapshot`] and the previous one is dropped.
//!
//! Checks, in guidance priority order:
//!
//! 1. **Size**: face height as a fraction of frame height within
//!    `[min_face_frac, max_face_frac]`.
//! 2. **Centering**: face center within `±center_tol` of the target point,
//!    which sits slightly above the frame center to leave room for shoulders.
//! 3. **Background brightness**: mean sampled luminance `≥ min_brightness`.
//! 4. **Background plainness**: luminance std dev `≤ max_std_dev`. Only
//!    scored by the full-frame strategy; the corner strategy leaves it `None`.
//!
//! All thresholds come from [`ComplianceConfig`].

pub mod background;
pub mod face;
pub mod guidance;

pub use background::{LuminanceStats, luminance};
pub use face::{
    Detection, DetectorError, FaceBox, FaceDetector, FixedDetector, PixelBox, largest_face,
    largest_face_box,
};
pub use guidance::Guidance;

use crate::config::{BackgroundStrategy, ComplianceConfig};
use image::RgbaImage;
use serde::Serialize;
use std::cmp::Ordering;

/// Result of one analysis tick.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ComplianceSnapshot {
    pub face_detected: bool,
    pub centered_ok: bool,
    pub size_ok: bool,
    pub bg_bright_ok: bool,
    /// `None` when the background strategy does not score plainness.
    pub bg_plain_ok: Option<bool>,
    pub guidance: Guidance,
    pub guidance_text: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub face: Option<FaceBox>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bg_mean: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bg_std_dev: Option<f64>,
}

impl ComplianceSnapshot {
    fn unscored(guidance: Guidance, plain: Option<bool>) -> Self {
        Self {
            face_detected: false,
            centered_ok: false,
            size_ok: false,
            bg_bright_ok: false,
            bg_plain_ok: plain,
            guidance,
            guidance_text: guidance.message().to_string(),
            face: None,
            bg_mean: None,
            bg_std_dev: None,
        }
    }

    /// Snapshot for a frame in which no face was found.
    pub fn no_face(config: &ComplianceConfig) -> Self {
        Self::unscored(Guidance::NoFace, scores_plainness(config).then_some(false))
    }

    /// Snapshot for a tick where the detector could not run.
    pub fn detector_unavailable() -> Self {
        Self::unscored(Guidance::DetectorUnavailable, None)
    }

    /// All checks passed.
    pub fn is_compliant(&self) -> bool {
        self.guidance.is_ready()
    }
}

fn scores_plainness(config: &ComplianceConfig) -> bool {
    config.background == BackgroundStrategy::FullFrame
}

/// Where the face height sits relative to the accepted range.
fn size_ordering(h: f64, config: &ComplianceConfig) -> Ordering {
    if h < config.min_face_frac {
        Ordering::Less
    } else if h > config.max_face_frac {
        Ordering::Greater
    } else {
        Ordering::Equal
    }
}

fn is_centered(face: &FaceBox, config: &ComplianceConfig) -> bool {
    let (cx, cy) = face.center();
    (cx - config.target_x).abs() <= config.center_tol_x
        && (cy - config.target_y).abs() <= config.center_tol_y
}

/// Score one frame against the compliance rules.
pub fn analyze(
    frame: &RgbaImage,
    face: Option<FaceBox>,
    config: &ComplianceConfig,
) -> ComplianceSnapshot {
    let Some(face) = face else {
        return ComplianceSnapshot::no_face(config);
    };

    let size = size_ordering(face.h, config);
    let centered_ok = is_centered(&face, config);

    let stats = match config.background {
        BackgroundStrategy::FullFrame => {
            background::full_frame_stats(frame, &face, config.grid_size, config.face_margin)
        }
        BackgroundStrategy::Corners => {
            background::corner_stats(frame, config.grid_size, config.corner_frac)
        }
    };
    let bg_bright_ok = stats.is_some_and(|s| s.mean >= config.min_brightness);
    let bg_plain_ok = scores_plainness(config)
        .then(|| stats.is_some_and(|s| s.std_dev <= config.max_std_dev));

    let guidance = guidance::choose(size, centered_ok, bg_bright_ok, bg_plain_ok);

    ComplianceSnapshot {
        face_detected: true,
        centered_ok,
        size_ok: size == Ordering::Equal,
        bg_bright_ok,
        bg_plain_ok,
        guidance,
        guidance_text: guidance.message().to_string(),
        face: Some(face),
        bg_mean: stats.map(|s| s.mean),
        bg_std_dev: stats.map(|s| s.std_dev),
    }
}

/// Pick the largest detection and score the frame against it.
pub fn analyze_detections(
    frame: &RgbaImage,
    detections: &[Detection],
    config: &ComplianceConfig,
) -> ComplianceSnapshot {
    let face = largest_face_box(detections, frame.width(), frame.height());
    analyze(frame, face, config)
}
