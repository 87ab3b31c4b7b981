//! Camera source interface.
//!
//! Platform camera access is outside this crate. A [`CameraSource`] opens a
//! [`VideoStream`] for a requested facing mode; the stream yields frames until
//! it is stopped, and stopping releases the hardware.

use image::RgbaImage;
use std::time::Duration;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum CameraError {
    #[error("No suitable camera: {0}")]
    Unavailable(String),
    #[error("Camera permission denied")]
    PermissionDenied,
    #[error("Camera failed: {0}")]
    Other(String),
}

/// Which camera to ask for. Best effort: devices may ignore it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FacingMode {
    /// Selfie camera.
    #[default]
    Front,
    Back,
}

impl FacingMode {
    pub fn toggled(self) -> Self {
        match self {
            FacingMode::Front => FacingMode::Back,
            FacingMode::Back => FacingMode::Front,
        }
    }
}

/// One video frame with its presentation time.
#[derive(Debug, Clone, PartialEq)]
pub struct Frame {
    pub pixels: RgbaImage,
    pub timestamp: Duration,
}

pub trait VideoStream {
    fn start(&mut self) -> Result<(), CameraError>;

    /// Latest frame, or `None` once the stream has ended.
    fn next_frame(&mut self) -> Option<Frame>;

    /// Release the underlying device. Must be safe to call more than once.
    fn stop(&mut self);
}

pub trait CameraSource {
    fn open(&mut self, facing: FacingMode) -> Result<Box<dyn VideoStream>, CameraError>;
}

/// Open and start a stream. If starting fails the half-open stream is
/// stopped before the error is returned.
pub fn acquire_stream(
    source: &mut dyn CameraSource,
    facing: FacingMode,
) -> Result<Box<dyn VideoStream>, CameraError> {
    let mut stream = source.open(facing)?;
    if let Err(e) = stream.start() {
        stream.stop();
        return Err(e);
    }
    Ok(stream)
}
