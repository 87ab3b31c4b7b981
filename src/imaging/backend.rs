//! Image processing backend trait and shared types.
//!
//! The [`ImageBackend`] trait is the raster surface the rest of the crate
//! drives: decode bytes into a [`SourceImage`], draw a crop of it into a fixed
//! square raster, and encode a raster as JPEG at a given quality.
//!
//! The production implementation is
//! [`RustBackend`](super::rust_backend::RustBackend), built on the `image`
//! crate. Tests use a recording mock so the encoder search and the session
//! can be checked without touching real codecs.

use super::geometry::PixelRect;
use super::params::Quality;
use image::RgbaImage;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum BackendError {
    #[error("Decode failed: {0}")]
    Decode(String),
    #[error("Encode failed: {0}")]
    Encode(String),
    #[error("Processing failed: {0}")]
    ProcessingFailed(String),
}

/// Pixel size of a decoded image.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Dimensions {
    pub width: u32,
    pub height: u32,
}

/// A decoded picture. Never mutated after decode; a new upload or capture
/// replaces it wholesale.
#[derive(Debug, Clone, PartialEq)]
pub struct SourceImage {
    pixels: RgbaImage,
}

impl SourceImage {
    pub fn new(pixels: RgbaImage) -> Self {
        Self { pixels }
    }

    pub fn width(&self) -> u32 {
        self.pixels.width()
    }

    pub fn height(&self) -> u32 {
        self.pixels.height()
    }

    pub fn dimensions(&self) -> Dimensions {
        Dimensions {
            width: self.width(),
            height: self.height(),
        }
    }

    pub fn pixels(&self) -> &RgbaImage {
        &self.pixels
    }
}

/// Trait for raster backends.
///
/// Every backend must implement all three operations so the editing session
/// and the encoder are backend-agnostic.
pub trait ImageBackend {
    /// Decode an encoded image (JPEG, PNG, ...) into RGBA pixels.
    fn decode(&self, bytes: &[u8]) -> Result<SourceImage, BackendError>;

    /// Resample the square `crop` of `source` into a fresh `size × size` raster.
    fn render_crop(
        &self,
        source: &SourceImage,
        crop: PixelRect,
        size: u32,
    ) -> Result<RgbaImage, BackendError>;

    /// Encode a raster as baseline JPEG.
    fn encode_jpeg(&self, raster: &RgbaImage, quality: Quality) -> Result<Vec<u8>, BackendError>;
}
