//! Face detector interface and face-box normalization.
//!
//! The detector model itself is not part of this crate. Anything that turns a
//! frame into pixel-space bounding boxes can be plugged in through
//! [`FaceDetector`]; the heuristics only ever see the largest box, normalized
//! to the frame.

use image::RgbaImage;
use serde::Serialize;
use std::time::Duration;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum DetectorError {
    /// The model is still loading or failed to load.
    #[error("Face detector not ready: {0}")]
    NotReady(String),
    #[error("Face detection failed: {0}")]
    Inference(String),
}

/// Bounding box in frame pixels, top-left origin.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PixelBox {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

impl PixelBox {
    pub fn area(&self) -> f64 {
        self.width.max(0.0) * self.height.max(0.0)
    }
}

/// One face found by a detector.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Detection {
    pub bounding_box: PixelBox,
    pub score: f32,
}

/// Face box normalized to `[0, 1]` relative to the frame it was found in.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct FaceBox {
    pub x: f64,
    pub y: f64,
    pub w: f64,
    pub h: f64,
}

impl FaceBox {
    /// Normalize a pixel box against a `width × height` frame.
    pub fn from_pixels(bbox: &PixelBox, width: u32, height: u32) -> Self {
        let (fw, fh) = (width.max(1) as f64, height.max(1) as f64);
        Self {
            x: bbox.x / fw,
            y: bbox.y / fh,
            w: bbox.width / fw,
            h: bbox.height / fh,
        }
    }

    pub fn center(&self) -> (f64, f64) {
        (self.x + self.w / 2.0, self.y + self.h / 2.0)
    }

    /// Grow the box by `margin` on every side.
    pub fn expanded(&self, margin: f64) -> Self {
        Self {
            x: self.x - margin,
            y: self.y - margin,
            w: self.w + 2.0 * margin,
            h: self.h + 2.0 * margin,
        }
    }

    pub fn contains(&self, u: f64, v: f64) -> bool {
        u >= self.x && u <= self.x + self.w && v >= self.y && v <= self.y + self.h
    }
}

/// Pluggable face detection capability.
///
/// `timestamp` is the frame's presentation time; video-mode detectors use it
/// to track across frames and may reject non-increasing values.
pub trait FaceDetector {
    fn detect(
        &mut self,
        frame: &RgbaImage,
        timestamp: Duration,
    ) -> Result<Vec<Detection>, DetectorError>;
}

/// Pick the detection with the largest box area.
///
/// When every box is degenerate the first detection is kept, so a detector
/// that reports zero-size boxes still counts as "a face was found".
pub fn largest_face(detections: &[Detection]) -> Option<&Detection> {
    let mut best = detections.first()?;
    let mut best_area = 0.0;
    for detection in detections {
        let area = detection.bounding_box.area();
        if area > best_area {
            best_area = area;
            best = detection;
        }
    }
    Some(best)
}

/// Largest detection, normalized to the frame.
pub fn largest_face_box(detections: &[Detection], width: u32, height: u32) -> Option<FaceBox> {
    largest_face(detections).map(|d| FaceBox::from_pixels(&d.bounding_box, width, height))
}

/// A detector that returns the same boxes for every frame.
///
/// Used by the CLI, where the face box of a still photo is given on the
/// command line instead of being inferred by a model.
#[derive(Debug, Clone, Default)]
pub struct FixedDetector {
    boxes: Vec<Detection>,
}

impl FixedDetector {
    pub fn new(boxes: Vec<PixelBox>) -> Self {
        Self {
            boxes: boxes
                .into_iter()
                .map(|bounding_box| Detection {
                    bounding_box,
                    score: 1.0,
                })
                .collect(),
        }
    }
}

impl FaceDetector for FixedDetector {
    fn detect(
        &mut self,
        _frame: &RgbaImage,
        _timestamp: Duration,
    ) -> Result<Vec<Detection>, DetectorError> {
        Ok(self.boxes.clone())
    }
}
