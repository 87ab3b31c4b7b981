//! CLI output formatting.
//!
//! # Output Format
//!
//! ## Convert
//!
//! ```text
//! Source: portrait.jpg (3024×4032)
//!     Crop: 3024px square at (0, 504), zoom 1.00
//! Converted hajj-photo-200x200.jpg
//!     Size: 41 KB (limit 1.00 MB)
//!     Quality: 0.92 after 1 attempt
//!     Saved: out/hajj-photo-200x200.jpg
//! ```
//!
//! ## Analyze
//!
//! ```text
//! Face          yes
//! Size          ok
//! Centered      ok
//! Background    ok (mean luminance 231.4)
//! Plain         ok (std dev 3.2)
//!
//! Looks good. Hold still and capture.
//! ```
//!
//! # Architecture
//!
//! Each command has a `format_*` function (returns `Vec<String>`) for
//! testability and a `print_*` wrapper that writes to stdout. Format functions
//! are pure: no I/O, no side effects.

use crate::compliance::ComplianceSnapshot;
use crate::config::AppConfig;
use crate::imaging::geometry::PixelRect;
use crate::imaging::{Dimensions, ViewportTransform};
use crate::session::CaptureResult;
use std::path::Path;

// ============================================================================
// Shared helpers
// ============================================================================

/// Human-readable byte size: whole KB below 1 MB, two decimals above.
///
/// ```text
/// 41_984     → "41 KB"
/// 1_572_864  → "1.50 MB"
/// ```
pub fn format_size(bytes: usize) -> String {
    let kb = bytes as f64 / 1024.0;
    if kb >= 1024.0 {
        format!("{:.2} MB", kb / 1024.0)
    } else {
        format!("{:.0} KB", kb)
    }
}

fn indent(depth: usize) -> String {
    "    ".repeat(depth)
}

fn check_label(ok: bool) -> &'static str {
    if ok { "ok" } else { "no" }
}

fn row(label: &str, value: &str) -> String {
    format!("{:<14}{}", label, value)
}

// ============================================================================
// Convert
// ============================================================================

/// Describe the loaded source and the crop taken from it.
pub fn format_source(
    name: &str,
    dims: Dimensions,
    crop: PixelRect,
    transform: &ViewportTransform,
) -> Vec<String> {
    vec![
        format!("Source: {} ({}×{})", name, dims.width, dims.height),
        format!(
            "{}Crop: {}px square at ({}, {}), zoom {:.2}",
            indent(1),
            crop.side,
            crop.x,
            crop.y,
            transform.zoom
        ),
    ]
}

/// Describe a converted photo and, if it was written, where it went.
pub fn format_convert_result(
    result: &CaptureResult,
    file_name: &str,
    max_bytes: usize,
    saved_to: Option<&Path>,
) -> Vec<String> {
    let attempts = result.attempts();
    let mut lines = vec![
        format!("Converted {}", file_name),
        format!(
            "{}Size: {} (limit {})",
            indent(1),
            format_size(result.size_bytes()),
            format_size(max_bytes)
        ),
        format!(
            "{}Quality: {} after {} attempt{}",
            indent(1),
            result.quality(),
            attempts,
            if attempts == 1 { "" } else { "s" }
        ),
    ];
    if let Some(path) = saved_to {
        lines.push(format!("{}Saved: {}", indent(1), path.display()));
    }
    lines
}

pub fn print_convert_result(
    result: &CaptureResult,
    file_name: &str,
    max_bytes: usize,
    saved_to: Option<&Path>,
) {
    for line in format_convert_result(result, file_name, max_bytes, saved_to) {
        println!("{}", line);
    }
}

// ============================================================================
// Analyze
// ============================================================================

/// Render a compliance snapshot as a checklist followed by the guidance.
pub fn format_snapshot(snapshot: &ComplianceSnapshot) -> Vec<String> {
    let mut lines = vec![row(
        "Face",
        if snapshot.face_detected { "yes" } else { "no" },
    )];

    if snapshot.face_detected {
        lines.push(row("Size", check_label(snapshot.size_ok)));
        lines.push(row("Centered", check_label(snapshot.centered_ok)));

        let bright = match snapshot.bg_mean {
            Some(mean) => format!(
                "{} (mean luminance {:.1})",
                check_label(snapshot.bg_bright_ok),
                mean
            ),
            None => format!("{} (no background visible)", check_label(false)),
        };
        lines.push(row("Background", &bright));

        let plain = match (snapshot.bg_plain_ok, snapshot.bg_std_dev) {
            (None, _) => "not scored".to_string(),
            (Some(ok), Some(sd)) => format!("{} (std dev {:.1})", check_label(ok), sd),
            (Some(ok), None) => check_label(ok).to_string(),
        };
        lines.push(row("Plain", &plain));
    }

    lines.push(String::new());
    lines.push(snapshot.guidance_text.clone());
    lines
}

pub fn print_snapshot(snapshot: &ComplianceSnapshot) {
    for line in format_snapshot(snapshot) {
        println!("{}", line);
    }
}

// ============================================================================
// Requirements
// ============================================================================

/// The photo requirements, numbered. The first two are enforced by the tool.
pub fn format_requirements(config: &AppConfig) -> Vec<String> {
    let size = config.geometry.output;
    let items = [
        format!("{size} × {size} pixels (enforced)"),
        format!(
            "File size at most {} (enforced)",
            format_size(config.encoder.max_bytes)
        ),
        "No shadow on face or background".to_string(),
        "No accessories like glasses or hat".to_string(),
        "About 70% face plus part of the shoulders".to_string(),
        "Natural white or light plain background".to_string(),
        "Headscarf allowed for women".to_string(),
        "Natural look: neutral expression, not smiling".to_string(),
        "Modest clothing (does not need to be formal)".to_string(),
    ];
    let mut lines: Vec<String> = items
        .iter()
        .enumerate()
        .map(|(i, item)| format!("{}. {}", i + 1, item))
        .collect();
    lines.push(String::new());
    lines.push(
        "Checks are best-effort guidance only; final acceptance is decided by the receiving authority."
            .to_string(),
    );
    lines
}

pub fn print_requirements(config: &AppConfig) {
    for line in format_requirements(config) {
        println!("{}", line);
    }
}

// ============================================================================
// Tests
// ============================================================================
