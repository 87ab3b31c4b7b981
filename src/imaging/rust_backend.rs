//! Pure Rust raster backend.
//!
//! ## Crate mapping
//!
//! | Operation | Crate / function |
//! |---|---|
//! | Decode (JPEG, PNG) | `image::load_from_memory` |
//! | Crop | `image::imageops::crop_imm` |
//! | Resample to output size | `image::imageops::resize` with `Lanczos3` |
//! | Encode → JPEG | `image::codecs::jpeg::JpegEncoder` (alpha flattened onto white) |
//!
//! HEIC/HEIF uploads pass the extension check but there is no pure Rust HEVC
//! decoder in the stack, so they are recognised by their `ftyp` brand and
//! rejected with a message that tells the user what to do instead.

use super::backend::{BackendError, ImageBackend, SourceImage};
use super::geometry::PixelRect;
use super::params::Quality;
use image::codecs::jpeg::JpegEncoder;
use image::imageops::FilterType;
use image::{ImageEncoder, RgbImage, RgbaImage};
use std::path::Path;

/// Extensions accepted for conversion, compared case-insensitively.
const ACCEPTED_EXTENSIONS: &[&str] = &["jpg", "jpeg", "heic", "heif"];

/// ISO-BMFF brands used by HEIC/HEIF stills.
const HEIF_BRANDS: &[&[u8; 4]] = &[b"heic", b"heix", b"heim", b"heis", b"hevc", b"mif1", b"msf1"];

/// Whether `path` carries one of the accepted extensions.
pub fn is_accepted_file(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| {
            ACCEPTED_EXTENSIONS
                .iter()
                .any(|accepted| e.eq_ignore_ascii_case(accepted))
        })
}

/// Sniff the `ftyp` box of an ISO-BMFF file for a HEIF brand.
fn is_heif(bytes: &[u8]) -> bool {
    bytes.len() >= 12
        && &bytes[4..8] == b"ftyp"
        && HEIF_BRANDS.iter().any(|brand| &bytes[8..12] == *brand)
}

/// Pure Rust backend using the `image` crate.
///
/// See the [module docs](self) for the crate-to-operation mapping.
pub struct RustBackend {
    filter: FilterType,
}

impl RustBackend {
    pub fn new() -> Self {
        Self {
            filter: FilterType::Lanczos3,
        }
    }
}

impl Default for RustBackend {
    fn default() -> Self {
        Self::new()
    }
}

/// Composite RGBA onto white; JPEG has no alpha channel.
fn flatten_alpha(raster: &RgbaImage) -> RgbImage {
    RgbImage::from_fn(raster.width(), raster.height(), |x, y| {
        let [r, g, b, a] = raster.get_pixel(x, y).0;
        let alpha = a as f32 / 255.0;
        let over_white = |c: u8| (c as f32 * alpha + 255.0 * (1.0 - alpha)).round() as u8;
        image::Rgb([over_white(r), over_white(g), over_white(b)])
    })
}

impl ImageBackend for RustBackend {
    fn decode(&self, bytes: &[u8]) -> Result<SourceImage, BackendError> {
        if is_heif(bytes) {
            return Err(BackendError::Decode(
                "HEIC/HEIF photos cannot be decoded here; export the photo as JPG and try again"
                    .to_string(),
            ));
        }
        let decoded = image::load_from_memory(bytes)
            .map_err(|e| BackendError::Decode(format!("Failed to decode image: {}", e)))?;
        if decoded.width() == 0 || decoded.height() == 0 {
            return Err(BackendError::Decode("Image has zero dimensions".to_string()));
        }
        Ok(SourceImage::new(decoded.to_rgba8()))
    }

    fn render_crop(
        &self,
        source: &SourceImage,
        crop: PixelRect,
        size: u32,
    ) -> Result<RgbaImage, BackendError> {
        let (iw, ih) = (source.width(), source.height());
        if crop.side == 0 || crop.x + crop.side > iw || crop.y + crop.side > ih {
            return Err(BackendError::ProcessingFailed(format!(
                "Crop {}x{}+{}+{} outside {}x{} source",
                crop.side, crop.side, crop.x, crop.y, iw, ih
            )));
        }
        let cropped =
            image::imageops::crop_imm(source.pixels(), crop.x, crop.y, crop.side, crop.side)
                .to_image();
        Ok(image::imageops::resize(&cropped, size, size, self.filter))
    }

    fn encode_jpeg(&self, raster: &RgbaImage, quality: Quality) -> Result<Vec<u8>, BackendError> {
        let rgb = flatten_alpha(raster);
        let mut buffer = Vec::new();
        JpegEncoder::new_with_quality(&mut buffer, quality.percent())
            .write_image(
                rgb.as_raw(),
                rgb.width(),
                rgb.height(),
                image::ExtendedColorType::Rgb8,
            )
            .map_err(|e| BackendError::Encode(format!("JPEG encode failed: {}", e)))?;
        Ok(buffer)
    }
}
