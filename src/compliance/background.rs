//! Background luminance sampling.
//!
//! Frames are read on a fixed `grid × grid` lattice of sample points rather
//! than at display resolution, so the cost per tick is the same for a VGA
//! webcam and a 4K phone camera.
//!
//! Luminance uses the Rec. 709 weights
//! `L = 0.2126 R + 0.7152 G + 0.0722 B` on the 0–255 scale.

use super::face::FaceBox;
use image::RgbaImage;

/// Rec. 709 luminance of one RGBA pixel.
pub fn luminance(px: &[u8; 4]) -> f64 {
    0.2126 * px[0] as f64 + 0.7152 * px[1] as f64 + 0.0722 * px[2] as f64
}

/// Mean and spread of the sampled luminance.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LuminanceStats {
    pub mean: f64,
    pub std_dev: f64,
    pub samples: usize,
}

impl LuminanceStats {
    fn from_samples(samples: &[f64]) -> Option<Self> {
        if samples.is_empty() {
            return None;
        }
        let n = samples.len() as f64;
        let mean = samples.iter().sum::<f64>() / n;
        let variance = samples.iter().map(|l| (l - mean).powi(2)).sum::<f64>() / n;
        Some(Self {
            mean,
            std_dev: variance.sqrt(),
            samples: samples.len(),
        })
    }
}

/// Iterate the grid sample points as `(u, v)` fractions of the frame, each
/// at the center of its grid cell.
fn grid_points(grid: u32) -> impl Iterator<Item = (f64, f64)> {
    let g = grid.max(1);
    (0..g).flat_map(move |gy| {
        (0..g).map(move |gx| {
            (
                (gx as f64 + 0.5) / g as f64,
                (gy as f64 + 0.5) / g as f64,
            )
        })
    })
}

fn sample(frame: &RgbaImage, u: f64, v: f64) -> f64 {
    let x = ((u * frame.width() as f64) as u32).min(frame.width() - 1);
    let y = ((v * frame.height() as f64) as u32).min(frame.height() - 1);
    luminance(&frame.get_pixel(x, y).0)
}

fn stats_where(
    frame: &RgbaImage,
    grid: u32,
    keep: impl Fn(f64, f64) -> bool,
) -> Option<LuminanceStats> {
    if frame.width() == 0 || frame.height() == 0 {
        return None;
    }
    let samples: Vec<f64> = grid_points(grid)
        .filter(|&(u, v)| keep(u, v))
        .map(|(u, v)| sample(frame, u, v))
        .collect();
    LuminanceStats::from_samples(&samples)
}

/// Luminance over every grid point outside `face` grown by `margin`.
///
/// `None` when the face (or an empty frame) leaves nothing to sample.
pub fn full_frame_stats(
    frame: &RgbaImage,
    face: &FaceBox,
    grid: u32,
    margin: f64,
) -> Option<LuminanceStats> {
    let excluded = face.expanded(margin);
    stats_where(frame, grid, |u, v| !excluded.contains(u, v))
}

/// Luminance over grid points inside the four corner squares, each
/// `corner_frac` of the frame width and height.
pub fn corner_stats(frame: &RgbaImage, grid: u32, corner_frac: f64) -> Option<LuminanceStats> {
    let in_corner = |u: f64, v: f64| {
        let left_or_right = u < corner_frac || u > 1.0 - corner_frac;
        let top_or_bottom = v < corner_frac || v > 1.0 - corner_frac;
        left_or_right && top_or_bottom
    };
    stats_where(frame, grid, in_corner)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_helpers::{checkerboard, solid_frame};

    #[test]
    fn luminance_of_white_and_black() {
        assert!((luminance(&[255, 255, 255, 255]) - 255.0).abs() < 1e-9);
        assert_eq!(luminance(&[0, 0, 0, 255]), 0.0);
    }

    #[test]
    fn green_dominates_luminance() {
        assert!(luminance(&[0, 255, 0, 255]) > luminance(&[255, 0, 0, 255]));
        assert!(luminance(&[255, 0, 0, 255]) > luminance(&[0, 0, 255, 255]));
    }

    #[test]
    fn grid_sample_count_is_resolution_independent() {
        let face = FaceBox {
            x: 2.0,
            y: 2.0,
            w: 0.1,
            h: 0.1,
        };
        let small = full_frame_stats(&solid_frame(64, 48, 200), &face, 32, 0.0).unwrap();
        let large = full_frame_stats(&solid_frame(1920, 1080, 200), &face, 32, 0.0).unwrap();
        assert_eq!(small.samples, 32 * 32);
        assert_eq!(large.samples, 32 * 32);
    }

    #[test]
    fn uniform_frame_has_zero_spread() {
        let face = FaceBox {
            x: 0.4,
            y: 0.3,
            w: 0.2,
            h: 0.4,
        };
        let stats = full_frame_stats(&solid_frame(320, 240, 220), &face, 64, 0.05).unwrap();
        assert!((stats.mean - 220.0).abs() < 1e-6);
        assert!(stats.std_dev < 1e-6);
        assert!(stats.samples < 64 * 64);
    }

    #[test]
    fn checkerboard_has_large_spread() {
        let face = FaceBox {
            x: 0.4,
            y: 0.3,
            w: 0.2,
            h: 0.4,
        };
        let stats = full_frame_stats(&checkerboard(256, 8, 255, 120), &face, 64, 0.05).unwrap();
        assert!(stats.std_dev > 50.0);
    }

    #[test]
    fn face_covering_frame_leaves_no_samples() {
        let face = FaceBox {
            x: 0.0,
            y: 0.0,
            w: 1.0,
            h: 1.0,
        };
        assert!(full_frame_stats(&solid_frame(100, 100, 255), &face, 16, 0.0).is_none());
    }

    #[test]
    fn corners_ignore_center() {
        // Bright frame with a dark center block
        let mut frame = solid_frame(200, 200, 240);
        for y in 40..160 {
            for x in 40..160 {
                frame.put_pixel(x, y, image::Rgba([10, 10, 10, 255]));
            }
        }
        let stats = corner_stats(&frame, 64, 0.12).unwrap();
        assert!((stats.mean - 240.0).abs() < 1e-6);
        // 8 of 64 cell centers per axis fall inside each 12% band
        assert_eq!(stats.samples, 4 * 8 * 8);
    }
}
