//! Viewport geometry for the interactive crop.
//!
//! All functions here are pure and testable without any I/O or images.
//!
//! A source image of arbitrary size is shown inside a fixed `preview × preview`
//! square. At the identity transform it is scaled to *cover* the square (the
//! short edge fits exactly, the long edge overflows and is centered). Zoom
//! multiplies that base scale; pan shifts the scaled image in preview pixels.
//!
//! ```text
//!  display_left = (preview - iw·scale) / 2 + offset_x
//!  source_x     = (viewport_x - display_left) / scale
//!  crop side    = min(preview / scale, iw, ih)
//! ```
//!
//! The crop is what actually gets rendered, and its origin is clamped into the
//! source on each axis. Pan offsets themselves are never bounded: panning past
//! an edge just pins the crop to that edge.

/// Zoom and pan state for one editing session.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ViewportTransform {
    pub zoom: f64,
    pub offset_x: f64,
    pub offset_y: f64,
}

impl ViewportTransform {
    pub const IDENTITY: ViewportTransform = ViewportTransform {
        zoom: 1.0,
        offset_x: 0.0,
        offset_y: 0.0,
    };

    /// Clamp zoom into `[min_zoom, max_zoom]` and replace non-finite values.
    pub fn sanitized(self, min_zoom: f64, max_zoom: f64) -> Self {
        Self {
            zoom: clamp_zoom(self.zoom, min_zoom, max_zoom),
            offset_x: finite_or_zero(self.offset_x),
            offset_y: finite_or_zero(self.offset_y),
        }
    }
}

impl Default for ViewportTransform {
    fn default() -> Self {
        Self::IDENTITY
    }
}

/// Where the scaled source image sits inside the preview square, in preview pixels.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DisplayRect {
    pub left: f64,
    pub top: f64,
    pub width: f64,
    pub height: f64,
}

impl DisplayRect {
    /// The same rectangle expressed as percentages of the preview side,
    /// which is what a resizable on-screen viewport positions by.
    pub fn as_percent(&self, preview: f64) -> DisplayRect {
        DisplayRect {
            left: self.left / preview * 100.0,
            top: self.top / preview * 100.0,
            width: self.width / preview * 100.0,
            height: self.height / preview * 100.0,
        }
    }
}

/// Square region of the source image, in (fractional) source pixels.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CropRect {
    pub x: f64,
    pub y: f64,
    pub side: f64,
}

/// Integer crop rectangle, ready to hand to a pixel backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PixelRect {
    pub x: u32,
    pub y: u32,
    pub side: u32,
}

impl CropRect {
    /// Snap to whole pixels without leaving the source.
    ///
    /// The side is rounded (at least 1, at most the short edge) and the origin
    /// floored, then pulled back in if rounding pushed the far edge outside.
    pub fn to_pixels(&self, iw: u32, ih: u32) -> PixelRect {
        let short = iw.min(ih).max(1);
        let side = (self.side.round() as u32).clamp(1, short);
        let x = (self.x.max(0.0).floor() as u32).min(iw.saturating_sub(side));
        let y = (self.y.max(0.0).floor() as u32).min(ih.saturating_sub(side));
        PixelRect { x, y, side }
    }
}

/// Clamp a requested zoom, mapping NaN to the minimum.
pub fn clamp_zoom(zoom: f64, min_zoom: f64, max_zoom: f64) -> f64 {
    if zoom.is_nan() {
        return min_zoom;
    }
    zoom.max(min_zoom).min(max_zoom)
}

fn finite_or_zero(v: f64) -> f64 {
    if v.is_finite() { v } else { 0.0 }
}

/// Smallest scale at which an `iw × ih` image fully covers the preview square.
pub fn base_scale(iw: u32, ih: u32, preview: f64) -> f64 {
    let iw = iw.max(1) as f64;
    let ih = ih.max(1) as f64;
    (preview / iw).max(preview / ih)
}

/// Base scale multiplied by zoom.
pub fn effective_scale(iw: u32, ih: u32, preview: f64, transform: &ViewportTransform) -> f64 {
    base_scale(iw, ih, preview) * transform.zoom
}

/// Forward mapping: center the scaled image in the preview, then apply pan.
pub fn display_rect(iw: u32, ih: u32, preview: f64, transform: &ViewportTransform) -> DisplayRect {
    let scale = effective_scale(iw, ih, preview, transform);
    let width = iw as f64 * scale;
    let height = ih as f64 * scale;
    DisplayRect {
        left: (preview - width) / 2.0 + transform.offset_x,
        top: (preview - height) / 2.0 + transform.offset_y,
        width,
        height,
    }
}

/// Inverse mapping of a single viewport point into source pixel space.
pub fn viewport_to_source(point: (f64, f64), display: &DisplayRect, scale: f64) -> (f64, f64) {
    (
        (point.0 - display.left) / scale,
        (point.1 - display.top) / scale,
    )
}

/// The square of the source that the preview currently shows, clamped inside the source.
pub fn crop_rect(iw: u32, ih: u32, preview: f64, transform: &ViewportTransform) -> CropRect {
    let scale = effective_scale(iw, ih, preview, transform);
    let display = display_rect(iw, ih, preview, transform);
    let (x0, y0) = viewport_to_source((0.0, 0.0), &display, scale);
    let side0 = preview / scale;

    let (w, h) = (iw.max(1) as f64, ih.max(1) as f64);
    let side = side0.min(w).min(h);
    CropRect {
        x: clamp_axis(x0, w - side),
        y: clamp_axis(y0, h - side),
        side,
    }
}

/// `v` clamped to `[0, limit]`; a NaN origin pins to 0.
fn clamp_axis(v: f64, limit: f64) -> f64 {
    let limit = limit.max(0.0);
    if v.is_nan() {
        return 0.0;
    }
    v.max(0.0).min(limit)
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    const PREVIEW: f64 = 240.0;

    fn zoomed(zoom: f64) -> ViewportTransform {
        ViewportTransform {
            zoom,
            ..ViewportTransform::IDENTITY
        }
    }

    // =========================================================================
    // base scale and forward mapping
    // =========================================================================

    #[test]
    fn landscape_covers_by_height() {
        // 480x240 → height fits exactly, width overflows
        assert_eq!(base_scale(480, 240, PREVIEW), 1.0);
        let d = display_rect(480, 240, PREVIEW, &ViewportTransform::IDENTITY);
        assert_eq!(d.width, 480.0);
        assert_eq!(d.height, 240.0);
        assert_eq!(d.left, -120.0);
        assert_eq!(d.top, 0.0);
    }

    #[test]
    fn small_image_is_upscaled_to_cover() {
        // 120x60 needs 4x to cover 240 on the short edge
        assert_eq!(base_scale(120, 60, PREVIEW), 4.0);
    }

    #[test]
    fn pan_shifts_display_rect() {
        let t = ViewportTransform {
            zoom: 1.0,
            offset_x: 15.0,
            offset_y: -10.0,
        };
        let d = display_rect(240, 240, PREVIEW, &t);
        assert_eq!(d.left, 15.0);
        assert_eq!(d.top, -10.0);
    }

    #[test]
    fn percent_rect_relative_to_preview() {
        let d = display_rect(480, 240, PREVIEW, &ViewportTransform::IDENTITY).as_percent(PREVIEW);
        assert_eq!(d.left, -50.0);
        assert_eq!(d.width, 200.0);
    }

    // =========================================================================
    // crop rectangle
    // =========================================================================

    #[test]
    fn identity_crop_is_centered_square_of_short_edge() {
        let c = crop_rect(1000, 800, PREVIEW, &ViewportTransform::IDENTITY);
        assert!((c.side - 800.0).abs() < 1e-9);
        assert!((c.x - 100.0).abs() < 1e-9);
        assert!(c.y.abs() < 1e-9);
    }

    #[test]
    fn zoom_two_halves_crop_side() {
        let c = crop_rect(1000, 1000, PREVIEW, &zoomed(2.0));
        assert!((c.side - 500.0).abs() < 1e-9);
        assert!((c.x - 250.0).abs() < 1e-9);
        assert!((c.y - 250.0).abs() < 1e-9);
    }

    #[test]
    fn far_pan_pins_crop_to_edge() {
        let t = ViewportTransform {
            zoom: 2.0,
            offset_x: 1e6,
            offset_y: -1e6,
        };
        let c = crop_rect(1000, 1000, PREVIEW, &t);
        // panned right → image moves right → crop pins to the left edge
        assert_eq!(c.x, 0.0);
        assert!((c.y - (1000.0 - c.side)).abs() < 1e-9);
    }

    #[test]
    fn viewport_origin_maps_back_to_crop_origin_when_unclamped() {
        let t = ViewportTransform {
            zoom: 1.5,
            offset_x: 12.0,
            offset_y: -7.0,
        };
        let scale = effective_scale(900, 1200, PREVIEW, &t);
        let d = display_rect(900, 1200, PREVIEW, &t);
        let (sx, sy) = viewport_to_source((0.0, 0.0), &d, scale);
        let c = crop_rect(900, 1200, PREVIEW, &t);
        assert!((c.x - sx).abs() < 1e-9);
        assert!((c.y - sy).abs() < 1e-9);
    }

    #[test]
    fn one_pixel_source() {
        let c = crop_rect(1, 1, PREVIEW, &zoomed(3.0));
        let p = c.to_pixels(1, 1);
        assert_eq!(p, PixelRect { x: 0, y: 0, side: 1 });
    }

    #[test]
    fn clamp_zoom_handles_nan_and_range() {
        assert_eq!(clamp_zoom(f64::NAN, 1.0, 3.0), 1.0);
        assert_eq!(clamp_zoom(0.2, 1.0, 3.0), 1.0);
        assert_eq!(clamp_zoom(7.0, 1.0, 3.0), 3.0);
        assert_eq!(clamp_zoom(2.25, 1.0, 3.0), 2.25);
    }

    #[test]
    fn sanitized_drops_infinite_offsets() {
        let t = ViewportTransform {
            zoom: 9.0,
            offset_x: f64::INFINITY,
            offset_y: 4.0,
        }
        .sanitized(1.0, 3.0);
        assert_eq!(t.zoom, 3.0);
        assert_eq!(t.offset_x, 0.0);
        assert_eq!(t.offset_y, 4.0);
    }

    // =========================================================================
    // properties
    // =========================================================================

    proptest! {
        #[test]
        fn crop_stays_inside_source(
            iw in 1u32..6000,
            ih in 1u32..6000,
            zoom in 1.0f64..=3.0,
            offset_x in -1e6f64..1e6,
            offset_y in -1e6f64..1e6,
        ) {
            let t = ViewportTransform { zoom, offset_x, offset_y };
            let c = crop_rect(iw, ih, PREVIEW, &t);
            prop_assert!(c.side > 0.0);
            prop_assert!(c.x >= 0.0 && c.y >= 0.0);
            prop_assert!(c.x + c.side <= iw as f64 + 1e-9);
            prop_assert!(c.y + c.side <= ih as f64 + 1e-9);

            let p = c.to_pixels(iw, ih);
            prop_assert!(p.side > 0);
            prop_assert!(p.x + p.side <= iw);
            prop_assert!(p.y + p.side <= ih);
        }

        #[test]
        fn identity_transform_covers_preview(iw in 1u32..6000, ih in 1u32..6000) {
            let scale = base_scale(iw, ih, PREVIEW);
            prop_assert!(scale * iw.min(ih) as f64 >= PREVIEW - 1e-9);
        }
    }
}
