//! # Hajj Photos
//!
//! Produces a compliant square portrait photo: exactly 200×200 pixels, at
//! most 1 MiB, framed and lit the way visa photo rules ask for. A photo comes
//! either from an existing file or from a live camera, and the user gets live
//! guidance on face position and background while framing it.
//!
//! # Architecture: One Session, Three Engines
//!
//! ```text
//!   file / camera ──► Session ──► geometry ──► 200×200 raster ──► encoder ──► export
//!                        │                          │
//!                        └──── camera frames ───────┴──► compliance ──► guidance
//! ```
//!
//! The engines are pure and independently testable; the session is the only
//! stateful piece and the only owner of external resources (camera stream,
//! export handles).
//!
//! # Module Map
//!
//! | Module | Role |
//! |--------|------|
//! | [`imaging`] | Crop geometry, the raster backend trait and its `image` crate implementation, the byte-budget encoder |
//! | [`compliance`] | Per-frame face size / centering / background heuristics and the face detector interface |
//! | [`session`] | Editing session: load, transform, convert, capture, camera lifecycle, analysis loop, export |
//! | [`config`] | `hajj-photos.toml` loading, validation, and merging over stock defaults |
//! | [`output`] | CLI output formatting |
//!
//! # Design Decisions
//!
//! ## Cover, Then Clamp
//!
//! At zoom 1 the source *covers* the preview square (short edge fits). Pan
//! offsets are unbounded; only the derived crop rectangle is clamped into the
//! source. The renderer therefore never reads outside the source buffer, no
//! matter how far the user drags.
//!
//! ## Bounded Quality Search
//!
//! The encoder walks a fixed, non-increasing quality schedule (0.92 down to
//! 0.50 in 0.07 steps). Worst-case latency is seven encodes, and a photo that
//! still does not fit is reported as [`session::SessionError::BudgetUnmet`]
//! instead of being written oversized.
//!
//! ## Grid-Sampled Background
//!
//! Background statistics are read on a fixed grid of sample points, so
//! per-frame cost does not grow with camera resolution. The face box (plus a
//! margin) is excluded so skin tone does not count as background.
//!
//! ## Pluggable Platform Pieces
//!
//! Face detection, cameras, export handles and share targets are traits
//! ([`compliance::FaceDetector`], [`session::CameraSource`],
//! [`session::HandleProvider`], [`session::FileExport`]). The crate ships
//! process-local implementations and tests use scripted fakes.

pub mod compliance;
pub mod config;
pub mod imaging;
pub mod output;
pub mod session;

#[cfg(test)]
pub(crate) mod test_helpers;
