//! Size-constrained JPEG encoding.
//!
//! Encodes the output raster at a high quality and steps the quality down
//! until the file fits the byte budget. The quality schedule comes from
//! [`EncodeParams::schedule`]: it is fixed up front, non-increasing, and ends
//! at the floor, so the number of encodes (and the worst-case latency) is
//! known before the first attempt.
//!
//! If the floor-quality encode still exceeds the budget the call fails with
//! [`EncodeError::BudgetUnmet`]; an oversized result is never returned.

use super::backend::{BackendError, ImageBackend};
use super::params::{EncodeParams, Quality};
use image::RgbaImage;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum EncodeError {
    #[error("Encoded size {smallest} bytes exceeds budget of {max_bytes} bytes at quality {quality}")]
    BudgetUnmet {
        smallest: usize,
        max_bytes: usize,
        quality: Quality,
    },
    #[error(transparent)]
    Backend(#[from] BackendError),
}

/// An encode that met its budget.
#[derive(Debug, Clone, PartialEq)]
pub struct EncodedImage {
    pub bytes: Vec<u8>,
    pub quality: Quality,
    /// Number of encodes it took to get here.
    pub attempts: usize,
}

impl EncodedImage {
    pub fn size_bytes(&self) -> usize {
        self.bytes.len()
    }
}

/// Encode `raster` as JPEG no larger than `params.max_bytes`.
pub fn encode_within_budget(
    backend: &impl ImageBackend,
    raster: &RgbaImage,
    params: &EncodeParams,
) -> Result<EncodedImage, EncodeError> {
    let schedule = params.schedule();
    let mut smallest = usize::MAX;
    let mut last_quality = params.initial;

    for (attempt, quality) in schedule.into_iter().enumerate() {
        let bytes = backend.encode_jpeg(raster, quality)?;
        log::debug!(
            "encode attempt {} at quality {}: {} bytes (budget {})",
            attempt + 1,
            quality,
            bytes.len(),
            params.max_bytes
        );
        if bytes.len() <= params.max_bytes {
            return Ok(EncodedImage {
                bytes,
                quality,
                attempts: attempt + 1,
            });
        }
        smallest = smallest.min(bytes.len());
        last_quality = quality;
    }

    log::warn!(
        "could not fit {} byte budget; smallest encode was {} bytes",
        params.max_bytes,
        smallest
    );
    Err(EncodeError::BudgetUnmet {
        smallest,
        max_bytes: params.max_bytes,
        quality: last_quality,
    })
}

/// Encode once at a fixed quality, ignoring the budget. Used for live previews.
pub fn encode_preview(
    backend: &impl ImageBackend,
    raster: &RgbaImage,
    quality: Quality,
) -> Result<Vec<u8>, EncodeError> {
    Ok(backend.encode_jpeg(raster, quality)?)
}
