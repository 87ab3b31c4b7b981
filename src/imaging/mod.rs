//! Image processing in pure Rust, no system codecs.
//!
//! | Operation | Crate / function |
//! |---|---|
//! | **Viewport ↔ crop math** | [`geometry`] (pure functions) |
//! | **Decode** | `image::load_from_memory` |
//! | **Crop → 200×200** | `crop_imm` + Lanczos3 `resize` |
//! | **Encode under budget** | `JpegEncoder` in a stepped quality search |
//!
//! The module is split into:
//! - **Geometry**: pure functions for the cover/zoom/pan mapping (unit testable)
//! - **Parameters**: data structures describing encode operations
//! - **Backend**: [`ImageBackend`] trait + [`RustBackend`]
//! - **Encoder**: the budget search on top of any backend

pub mod backend;
pub mod encoder;
pub mod geometry;
mod params;
pub mod rust_backend;

pub use backend::{BackendError, Dimensions, ImageBackend, SourceImage};
pub use encoder::{EncodeError, EncodedImage, encode_preview, encode_within_budget};
pub use geometry::{CropRect, DisplayRect, PixelRect, ViewportTransform};
pub use params::{EncodeParams, Quality};
pub use rust_backend::{RustBackend, is_accepted_file};
