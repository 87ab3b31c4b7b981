//! The editing session: one loaded photo, its crop, and its converted result.
//!
//! [`Session`] owns every stateful piece of the tool and is the only thing
//! that mutates it:
//!
//! - the decoded [`SourceImage`] plus a preview handle for its original bytes
//! - the [`ViewportTransform`] and the 200×200 output raster rendered from it
//! - the latest [`CaptureResult`] and its export handle
//! - the live camera stream, the face detector, and the analysis loop flag
//!
//! # Render contract
//!
//! Every transform change re-renders the output raster immediately, reading
//! the transform stored on the session at draw time. Converting renders again
//! from the same state, so what gets encoded is always the current crop.
//!
//! # Failure contract
//!
//! Operations return `Result<_, SessionError>` and also record the error's
//! user-facing message in [`Session::last_error`]. A failed convert or capture
//! leaves the previous result in place. Camera failures leave the session in a
//! recoverable [`Status`]; calling [`Session::start_camera`] again retries.
//!
//! # Handles
//!
//! Export handles are [`ExportHandle`]s, released when replaced, cleared, or
//! when the session is torn down (or dropped).

pub mod camera;
pub mod export;
pub mod handle;

pub use camera::{CameraError, CameraSource, FacingMode, Frame, VideoStream};
pub use export::{DirectoryExport, FileExport, JPEG_MIME, ShareOutcome, output_file_name};
pub use handle::{ExportHandle, HandleId, HandleProvider, InMemoryHandles};

use crate::compliance::{self, ComplianceSnapshot, FaceDetector};
use crate::config::AppConfig;
use crate::imaging::geometry::{self, DisplayRect, PixelRect, ViewportTransform};
use crate::imaging::{
    EncodeError, EncodeParams, EncodedImage, ImageBackend, Quality, SourceImage, encode_preview,
    encode_within_budget, is_accepted_file,
};
use crate::output::format_size;
use image::RgbaImage;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum SessionError {
    #[error("Unsupported file type. Please upload JPG/JPEG or HEIC/HEIF only.")]
    UnsupportedFormat,
    #[error("Could not read this photo: {0}")]
    DecodeFailed(String),
    #[error("No suitable camera found (or requested camera not available).")]
    CameraUnavailable,
    #[error("Camera permission denied. Please allow camera access and retry.")]
    PermissionDenied,
    #[error("Failed to start camera: {0}")]
    CameraFailed(String),
    #[error("Cannot compress under {}. Try a simpler original photo.", budget_label(.max_bytes))]
    BudgetUnmet { smallest: usize, max_bytes: usize },
    #[error("Sharing is not available here. Download the photo instead.")]
    ExportUnavailable,
    #[error("Image processing failed: {0}")]
    Processing(String),
    #[error("Upload a photo first.")]
    NoSource,
    #[error("Nothing to export yet. Convert or capture a photo first.")]
    NoResult,
    #[error("Could not save photo: {0}")]
    Io(#[from] std::io::Error),
}

fn budget_label(max_bytes: &usize) -> String {
    const MIB: usize = 1024 * 1024;
    let max_bytes = *max_bytes;
    if max_bytes >= MIB && max_bytes % MIB == 0 {
        format!("{}MB", max_bytes / MIB)
    } else {
        format_size(max_bytes)
    }
}

impl From<EncodeError> for SessionError {
    fn from(e: EncodeError) -> Self {
        match e {
            EncodeError::BudgetUnmet {
                smallest,
                max_bytes,
                ..
            } => SessionError::BudgetUnmet {
                smallest,
                max_bytes,
            },
            EncodeError::Backend(e) => SessionError::Processing(e.to_string()),
        }
    }
}

impl From<CameraError> for SessionError {
    fn from(e: CameraError) -> Self {
        match e {
            CameraError::Unavailable(_) => SessionError::CameraUnavailable,
            CameraError::PermissionDenied => SessionError::PermissionDenied,
            CameraError::Other(msg) => SessionError::CameraFailed(msg),
        }
    }
}

/// Camera lifecycle state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Status {
    #[default]
    Idle,
    Starting,
    Ready,
    /// Permission was refused. Retry is possible after the user allows access.
    Denied,
    Error,
}

impl std::fmt::Display for Status {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            Status::Idle => "Idle",
            Status::Starting => "Starting camera…",
            Status::Ready => "Camera ready",
            Status::Denied => "Permission needed",
            Status::Error => "Camera error",
        })
    }
}

/// A converted photo that met the byte budget.
#[derive(Debug)]
pub struct CaptureResult {
    encoded: EncodedImage,
    handle: ExportHandle,
}

impl CaptureResult {
    pub fn bytes(&self) -> &[u8] {
        &self.encoded.bytes
    }

    pub fn quality(&self) -> Quality {
        self.encoded.quality
    }

    pub fn size_bytes(&self) -> usize {
        self.encoded.size_bytes()
    }

    /// Number of encodes the budget search needed.
    pub fn attempts(&self) -> usize {
        self.encoded.attempts
    }

    pub fn handle_id(&self) -> HandleId {
        self.handle.id()
    }
}

/// Partial transform change. `None` fields keep their current value.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct TransformUpdate {
    pub zoom: Option<f64>,
    pub offset_x: Option<f64>,
    pub offset_y: Option<f64>,
}

impl TransformUpdate {
    pub fn zoom(zoom: f64) -> Self {
        Self {
            zoom: Some(zoom),
            ..Self::default()
        }
    }

    pub fn pan(offset_x: f64, offset_y: f64) -> Self {
        Self {
            offset_x: Some(offset_x),
            offset_y: Some(offset_y),
            ..Self::default()
        }
    }
}

#[derive(Debug, Clone, Copy)]
struct Drag {
    pointer: u64,
    start: (f64, f64),
    start_offset: (f64, f64),
}

struct LoadedSource {
    image: SourceImage,
    /// Held for as long as the original is shown; `None` for camera frames.
    _preview: Option<ExportHandle>,
}

pub struct Session<B: ImageBackend> {
    backend: B,
    config: AppConfig,
    params: EncodeParams,
    handles: Arc<dyn HandleProvider>,

    source: Option<LoadedSource>,
    transform: ViewportTransform,
    output: Option<RgbaImage>,
    result: Option<CaptureResult>,
    drag: Option<Drag>,

    camera_source: Option<Box<dyn CameraSource>>,
    stream: Option<Box<dyn VideoStream>>,
    facing: FacingMode,
    detector: Option<Box<dyn FaceDetector>>,
    detector_down: bool,
    analysis_active: Arc<AtomicBool>,
    snapshot: Option<ComplianceSnapshot>,

    status: Status,
    last_error: Option<String>,
}

impl<B: ImageBackend> Session<B> {
    pub fn new(backend: B, config: AppConfig) -> Self {
        let params = EncodeParams::from(&config.encoder);
        Self {
            backend,
            config,
            params,
            handles: Arc::new(InMemoryHandles::new()),
            source: None,
            transform: ViewportTransform::IDENTITY,
            output: None,
            result: None,
            drag: None,
            camera_source: None,
            stream: None,
            facing: FacingMode::default(),
            detector: None,
            detector_down: false,
            analysis_active: Arc::new(AtomicBool::new(false)),
            snapshot: None,
            status: Status::Idle,
            last_error: None,
        }
    }

    pub fn with_handles(mut self, handles: Arc<dyn HandleProvider>) -> Self {
        self.handles = handles;
        self
    }

    pub fn with_camera(mut self, camera: Box<dyn CameraSource>) -> Self {
        self.camera_source = Some(camera);
        self
    }

    pub fn with_detector(mut self, detector: Box<dyn FaceDetector>) -> Self {
        self.detector = Some(detector);
        self
    }

    // ------------------------------------------------------------------
    // Accessors
    // ------------------------------------------------------------------

    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    pub fn transform(&self) -> ViewportTransform {
        self.transform
    }

    pub fn source(&self) -> Option<&SourceImage> {
        self.source.as_ref().map(|s| &s.image)
    }

    /// The most recently rendered output raster.
    pub fn output(&self) -> Option<&RgbaImage> {
        self.output.as_ref()
    }

    pub fn result(&self) -> Option<&CaptureResult> {
        self.result.as_ref()
    }

    pub fn status(&self) -> Status {
        self.status
    }

    pub fn last_error(&self) -> Option<&str> {
        self.last_error.as_deref()
    }

    pub fn facing(&self) -> FacingMode {
        self.facing
    }

    pub fn snapshot(&self) -> Option<&ComplianceSnapshot> {
        self.snapshot.as_ref()
    }

    /// Shared flag the analysis loop checks before every tick.
    pub fn analysis_flag(&self) -> Arc<AtomicBool> {
        Arc::clone(&self.analysis_active)
    }

    fn preview_side(&self) -> f64 {
        self.config.geometry.preview as f64
    }

    fn fail<T>(&mut self, error: SessionError) -> Result<T, SessionError> {
        log::debug!("session error: {error}");
        self.last_error = Some(error.to_string());
        Err(error)
    }

    // ------------------------------------------------------------------
    // Source and transform
    // ------------------------------------------------------------------

    /// Replace the source with the photo in `bytes`.
    ///
    /// `file_name` is only used for the extension check. Resets the
    /// transform, drops any previous result, and renders the identity crop.
    pub fn load_source(&mut self, bytes: &[u8], file_name: &str) -> Result<(), SessionError> {
        self.last_error = None;
        if !is_accepted_file(Path::new(file_name)) {
            return self.fail(SessionError::UnsupportedFormat);
        }
        let image = match self.backend.decode(bytes) {
            Ok(image) => image,
            Err(e) => return self.fail(SessionError::DecodeFailed(e.to_string())),
        };
        log::info!(
            "loaded {} ({}x{})",
            file_name,
            image.width(),
            image.height()
        );
        let preview = ExportHandle::acquire(&self.handles, bytes, JPEG_MIME);
        self.install_source(image, Some(preview));
        self.render()
    }

    /// Read `path` and load it.
    pub fn load_file(&mut self, path: &Path) -> Result<(), SessionError> {
        if !is_accepted_file(path) {
            return self.fail(SessionError::UnsupportedFormat);
        }
        let bytes = match std::fs::read(path) {
            Ok(bytes) => bytes,
            Err(e) => return self.fail(SessionError::Io(e)),
        };
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        self.load_source(&bytes, &name)
    }

    fn install_source(&mut self, image: SourceImage, preview: Option<ExportHandle>) {
        self.result = None;
        self.source = Some(LoadedSource {
            image,
            _preview: preview,
        });
        self.transform = ViewportTransform::IDENTITY;
        self.drag = None;
        self.output = None;
    }

    /// Merge a transform change, clamp zoom, and re-render.
    pub fn update_transform(&mut self, update: TransformUpdate) -> Result<(), SessionError> {
        let merged = ViewportTransform {
            zoom: update.zoom.unwrap_or(self.transform.zoom),
            offset_x: update.offset_x.unwrap_or(self.transform.offset_x),
            offset_y: update.offset_y.unwrap_or(self.transform.offset_y),
        };
        let geometry = &self.config.geometry;
        self.transform = merged.sanitized(geometry.min_zoom, geometry.max_zoom);
        if self.source.is_some() {
            self.render()
        } else {
            Ok(())
        }
    }

    /// Start a pan gesture at preview coordinates `(x, y)`.
    pub fn begin_drag(&mut self, pointer: u64, x: f64, y: f64) {
        self.drag = Some(Drag {
            pointer,
            start: (x, y),
            start_offset: (self.transform.offset_x, self.transform.offset_y),
        });
    }

    /// Move the active gesture. Moves from any other pointer are ignored.
    pub fn drag_to(&mut self, pointer: u64, x: f64, y: f64) -> Result<(), SessionError> {
        let Some(drag) = self.drag.filter(|d| d.pointer == pointer) else {
            return Ok(());
        };
        let dx = x - drag.start.0;
        let dy = y - drag.start.1;
        self.update_transform(TransformUpdate::pan(
            drag.start_offset.0 + dx,
            drag.start_offset.1 + dy,
        ))
    }

    pub fn end_drag(&mut self, pointer: u64) {
        if self.drag.is_some_and(|d| d.pointer == pointer) {
            self.drag = None;
        }
    }

    /// Back to the identity transform, dropping any converted result.
    pub fn reset_crop(&mut self) -> Result<(), SessionError> {
        self.transform = ViewportTransform::IDENTITY;
        self.drag = None;
        self.result = None;
        if self.source.is_some() {
            self.render()
        } else {
            Ok(())
        }
    }

    /// Where the source currently sits in the preview, in preview pixels.
    pub fn display_rect(&self) -> Option<DisplayRect> {
        let source = self.source.as_ref()?;
        Some(geometry::display_rect(
            source.image.width(),
            source.image.height(),
            self.preview_side(),
            &self.transform,
        ))
    }

    /// The source pixels the current transform renders.
    pub fn crop(&self) -> Option<PixelRect> {
        let image = &self.source.as_ref()?.image;
        Some(
            geometry::crop_rect(image.width(), image.height(), self.preview_side(), &self.transform)
                .to_pixels(image.width(), image.height()),
        )
    }

    /// [`Session::display_rect`] as percentages of the preview side.
    pub fn display_rect_percent(&self) -> Option<DisplayRect> {
        self.display_rect()
            .map(|r| r.as_percent(self.preview_side()))
    }

    fn render_raster(
        &self,
        image: &SourceImage,
        transform: &ViewportTransform,
    ) -> Result<RgbaImage, SessionError> {
        let crop = geometry::crop_rect(image.width(), image.height(), self.preview_side(), transform)
            .to_pixels(image.width(), image.height());
        log::trace!("render crop {crop:?} at zoom {:.2}", transform.zoom);
        self.backend
            .render_crop(image, crop, self.config.geometry.output)
            .map_err(|e| SessionError::Processing(e.to_string()))
    }

    /// Redraw the output raster from the current source and transform.
    pub fn render(&mut self) -> Result<(), SessionError> {
        let Some(source) = self.source.as_ref() else {
            return self.fail(SessionError::NoSource);
        };
        match self.render_raster(&source.image, &self.transform) {
            Ok(raster) => {
                self.output = Some(raster);
                Ok(())
            }
            Err(e) => self.fail(e),
        }
    }

    // ------------------------------------------------------------------
    // Convert / capture
    // ------------------------------------------------------------------

    fn store_result(&mut self, encoded: EncodedImage) {
        log::info!(
            "converted: {} at quality {} after {} attempt(s)",
            format_size(encoded.size_bytes()),
            encoded.quality,
            encoded.attempts
        );
        let handle = ExportHandle::acquire(&self.handles, &encoded.bytes, JPEG_MIME);
        self.result = Some(CaptureResult { encoded, handle });
    }

    /// Render the current crop and encode it under the byte budget.
    ///
    /// On failure the previous result is kept.
    pub fn convert(&mut self) -> Result<&CaptureResult, SessionError> {
        self.last_error = None;
        self.render()?;
        let Some(raster) = self.output.as_ref() else {
            return self.fail(SessionError::NoSource);
        };
        match encode_within_budget(&self.backend, raster, &self.params) {
            Ok(encoded) => self.store_result(encoded),
            Err(e) => return self.fail(e.into()),
        }
        self.result.as_ref().ok_or(SessionError::NoResult)
    }

    /// Take the next camera frame as the new source and convert its centered crop.
    ///
    /// Nothing is replaced unless the encode meets the budget.
    pub fn capture(&mut self) -> Result<&CaptureResult, SessionError> {
        self.last_error = None;
        let Some(frame) = self.stream.as_mut().and_then(|s| s.next_frame()) else {
            return self.fail(SessionError::CameraUnavailable);
        };
        let image = SourceImage::new(frame.pixels);
        let outcome = self
            .render_raster(&image, &ViewportTransform::IDENTITY)
            .and_then(|raster| {
                let encoded = encode_within_budget(&self.backend, &raster, &self.params)?;
                Ok((raster, encoded))
            });
        match outcome {
            Ok((raster, encoded)) => {
                self.install_source(image, None);
                self.output = Some(raster);
                self.store_result(encoded);
            }
            Err(e) => return self.fail(e),
        }
        self.result.as_ref().ok_or(SessionError::NoResult)
    }

    /// Encode the current crop once at preview quality, for display only.
    pub fn live_preview(&mut self) -> Result<Vec<u8>, SessionError> {
        self.render()?;
        let Some(raster) = self.output.as_ref() else {
            return self.fail(SessionError::NoSource);
        };
        let quality = Quality::new(self.config.encoder.preview_quality);
        match encode_preview(&self.backend, raster, quality) {
            Ok(bytes) => Ok(bytes),
            Err(e) => self.fail(e.into()),
        }
    }

    /// Drop the current result and release its handle.
    pub fn clear(&mut self) {
        if let Some(result) = self.result.take() {
            result.handle.release();
        }
    }

    // ------------------------------------------------------------------
    // Export
    // ------------------------------------------------------------------

    /// File name the result is exported under.
    pub fn output_file_name(&self) -> String {
        output_file_name(self.config.geometry.output)
    }

    pub fn download(&mut self, export: &mut dyn FileExport) -> Result<PathBuf, SessionError> {
        let Some(result) = self.result.as_ref() else {
            return self.fail(SessionError::NoResult);
        };
        match export.download(result.bytes(), &self.output_file_name()) {
            Ok(path) => Ok(path),
            Err(e) => self.fail(SessionError::Io(e)),
        }
    }

    /// Share the result. An unavailable share target is reported as
    /// [`SessionError::ExportUnavailable`] and leaves everything else as is.
    pub fn share(&mut self, export: &mut dyn FileExport) -> Result<ShareOutcome, SessionError> {
        let Some(result) = self.result.as_ref() else {
            return self.fail(SessionError::NoResult);
        };
        match export.share(result.bytes(), &self.output_file_name(), JPEG_MIME) {
            Ok(ShareOutcome::Unavailable) => self.fail(SessionError::ExportUnavailable),
            Ok(outcome) => Ok(outcome),
            Err(e) => self.fail(SessionError::Io(e)),
        }
    }

    // ------------------------------------------------------------------
    // Camera and live analysis
    // ------------------------------------------------------------------

    /// Open the camera for the current facing mode.
    ///
    /// Any running stream is stopped first, so at most one is ever open.
    pub fn start_camera(&mut self) -> Result<(), SessionError> {
        self.stop_camera();
        self.last_error = None;
        self.status = Status::Starting;

        let facing = self.facing;
        let Some(camera) = self.camera_source.as_mut() else {
            self.status = Status::Error;
            return self.fail(SessionError::CameraUnavailable);
        };
        match camera::acquire_stream(camera.as_mut(), facing) {
            Ok(stream) => {
                log::info!("camera started ({facing:?})");
                self.stream = Some(stream);
                self.status = Status::Ready;
                self.analysis_active.store(true, Ordering::SeqCst);
                Ok(())
            }
            Err(e) => {
                log::warn!("camera failed to start: {e}");
                self.status = match e {
                    CameraError::PermissionDenied => Status::Denied,
                    _ => Status::Error,
                };
                self.fail(e.into())
            }
        }
    }

    /// Flip between front and back cameras and restart the stream.
    pub fn switch_camera(&mut self) -> Result<(), SessionError> {
        self.facing = self.facing.toggled();
        self.start_camera()
    }

    /// Stop the analysis loop and release the camera, if any.
    pub fn stop_camera(&mut self) {
        self.stop_analysis();
        if let Some(mut stream) = self.stream.take() {
            stream.stop();
            log::info!("camera stopped");
            self.status = Status::Idle;
        }
    }

    pub fn stop_analysis(&mut self) {
        self.analysis_active.store(false, Ordering::SeqCst);
    }

    /// Run one analysis tick against the next camera frame.
    ///
    /// Returns `Ok(None)` when the stream has ended. A detector failure does
    /// not fail the tick: the snapshot falls back to static guidance.
    pub fn analyze_frame(&mut self) -> Result<Option<&ComplianceSnapshot>, SessionError> {
        let Some(stream) = self.stream.as_mut() else {
            return Err(SessionError::CameraUnavailable);
        };
        let Some(frame) = stream.next_frame() else {
            return Ok(None);
        };

        let detections = match self.detector.as_mut() {
            Some(detector) => detector
                .detect(&frame.pixels, frame.timestamp)
                .map_err(|e| e.to_string()),
            None => Err("no face detector configured".to_string()),
        };
        let snapshot = match detections {
            Ok(detections) => {
                if self.detector_down {
                    log::info!("face detector available again");
                    self.detector_down = false;
                }
                compliance::analyze_detections(&frame.pixels, &detections, &self.config.compliance)
            }
            Err(reason) => {
                if !self.detector_down {
                    log::warn!("face detector unavailable: {reason}");
                    self.detector_down = true;
                }
                ComplianceSnapshot::detector_unavailable()
            }
        };
        self.snapshot = Some(snapshot);
        Ok(self.snapshot.as_ref())
    }

    /// Poll frames until the analysis flag is cleared or the stream ends.
    ///
    /// The flag is checked before every tick; clearing it (from
    /// `on_snapshot`, another thread, or [`Session::teardown`]) stops the
    /// loop before the next frame. Returns the number of ticks run.
    pub fn run_analysis(
        &mut self,
        interval: Duration,
        mut on_snapshot: impl FnMut(&ComplianceSnapshot),
    ) -> usize {
        let active = Arc::clone(&self.analysis_active);
        let mut ticks = 0;
        while active.load(Ordering::SeqCst) {
            match self.analyze_frame() {
                Ok(Some(snapshot)) => on_snapshot(snapshot),
                Ok(None) | Err(_) => {
                    log::debug!("analysis loop ended: no more frames");
                    active.store(false, Ordering::SeqCst);
                    break;
                }
            }
            ticks += 1;
            if !interval.is_zero() {
                std::thread::sleep(interval);
            }
        }
        ticks
    }

    /// End the session: stop the camera and analysis, release every handle.
    pub fn teardown(&mut self) {
        self.stop_camera();
        self.clear();
        self.source = None;
        self.output = None;
        self.snapshot = None;
        self.drag = None;
    }
}

impl<B: ImageBackend> Drop for Session<B> {
    fn drop(&mut self) {
        self.teardown();
    }
}
