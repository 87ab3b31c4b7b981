//! Shared test utilities for the hajj-photos test suite.
//!
//! Synthetic rasters and encoded images, so no test depends on fixture files:
//!
//! ```rust
//! use crate::test_helpers::*;
//!
//! let jpeg = gradient_jpeg(640, 480);          // decodable JPEG bytes
//! let wall = solid_frame(320, 240, 230);       // plain light wall
//! let busy = checkerboard(256, 8, 255, 120);   // high-variance background
//! let hard = noise_raster(200);                // worst case for JPEG size
//! ```

use image::codecs::jpeg::JpegEncoder;
use image::{ExtendedColorType, ImageEncoder, Rgb, RgbImage, Rgba, RgbaImage};

// =========================================================================
// Rasters
// =========================================================================

/// Uniform grey frame.
pub fn solid_frame(width: u32, height: u32, level: u8) -> RgbaImage {
    RgbaImage::from_pixel(width, height, Rgba([level, level, level, 255]))
}

/// Square checkerboard of `cell`-pixel squares alternating `a` and `b` grey.
pub fn checkerboard(size: u32, cell: u32, a: u8, b: u8) -> RgbaImage {
    RgbaImage::from_fn(size, size, |x, y| {
        let level = if (x / cell + y / cell) % 2 == 0 { a } else { b };
        Rgba([level, level, level, 255])
    })
}

/// Deterministic pseudo-random noise. Compresses badly, which is the point.
pub fn noise_raster(size: u32) -> RgbaImage {
    let mut state: u32 = 0x9E37_79B9;
    RgbaImage::from_fn(size, size, |_, _| {
        state ^= state << 13;
        state ^= state >> 17;
        state ^= state << 5;
        let [r, g, b, _] = state.to_le_bytes();
        Rgba([r, g, b, 255])
    })
}

// =========================================================================
// Encoded inputs
// =========================================================================

/// Encode a smooth color gradient as JPEG bytes.
pub fn gradient_jpeg(width: u32, height: u32) -> Vec<u8> {
    let img = RgbImage::from_fn(width, height, |x, y| {
        Rgb([
            (x * 255 / width.max(1)) as u8,
            (y * 255 / height.max(1)) as u8,
            128,
        ])
    });
    let mut bytes = Vec::new();
    JpegEncoder::new_with_quality(&mut bytes, 90)
        .write_image(img.as_raw(), width, height, ExtendedColorType::Rgb8)
        .unwrap();
    bytes
}
