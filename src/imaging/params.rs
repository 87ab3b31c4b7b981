//! Parameter types for image operations.
//!
//! These structs describe *what* to do, not *how* to do it. They sit between
//! the [`encoder`](super::encoder) (which decides how many attempts to make and
//! at which quality) and the [`backend`](super::backend) (which does the actual
//! pixel work), so the search logic can be exercised against a mock backend.
//!
//! ## Types
//!
//! - [`Quality`]: lossy encoding quality on a `0.0..=1.0` scale, as canvas
//!   encoders take it. Clamped on construction.
//! - [`EncodeParams`]: the budget search: start quality, step, floor, byte budget.

use crate::config::EncoderConfig;

/// Hard ceiling on encode attempts, whatever the step.
pub const MAX_ATTEMPTS: usize = 100;

/// Lossy encoding quality on a `0.0..=1.0` scale.
///
/// Stored as a fraction; JPEG encoders want an integer percentage, which
/// [`Quality::percent`] provides.
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd)]
pub struct Quality(f32);

impl Quality {
    pub fn new(value: f32) -> Self {
        if value.is_nan() {
            return Self(1.0);
        }
        Self(value.clamp(0.01, 1.0))
    }

    pub fn value(self) -> f32 {
        self.0
    }

    /// Integer quality for encoders that take `1..=100`.
    pub fn percent(self) -> u8 {
        (self.0 * 100.0).round().clamp(1.0, 100.0) as u8
    }
}

impl Default for Quality {
    fn default() -> Self {
        Self(0.92)
    }
}

impl std::fmt::Display for Quality {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:.2}", self.0)
    }
}

/// Parameters for a budget-constrained encode.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EncodeParams {
    pub max_bytes: usize,
    pub initial: Quality,
    pub step: f32,
    pub floor: Quality,
}

impl EncodeParams {
    /// Upper bound on encode attempts: the first try plus one per step
    /// between `initial` and `floor`, never more than [`MAX_ATTEMPTS`].
    pub fn max_attempts(&self) -> usize {
        let span = (self.initial.value() - self.floor.value()).max(0.0);
        if self.step <= 0.0 || self.step.is_nan() || span == 0.0 {
            return 1;
        }
        // f32 subtraction leaves 0.42 / 0.07 at 6.0000005
        let steps = ((span / self.step) - 1e-3).ceil().max(0.0) as usize;
        steps.saturating_add(1).min(MAX_ATTEMPTS)
    }

    /// The qualities tried, in order. Non-increasing, and the last entry is
    /// always the floor (unless the initial quality already sits below it).
    pub fn schedule(&self) -> Vec<Quality> {
        let attempts = self.max_attempts();
        let floor = self.floor.value();
        (0..attempts)
            .map(|k| {
                let q = self.initial.value() - k as f32 * self.step;
                if k + 1 == attempts || q - floor < 1e-3 {
                    Quality::new(floor.min(self.initial.value()))
                } else {
                    Quality::new(q)
                }
            })
            .collect()
    }
}

impl From<&EncoderConfig> for EncodeParams {
    fn from(config: &EncoderConfig) -> Self {
        Self {
            max_bytes: config.max_bytes,
            initial: Quality::new(config.initial_quality),
            step: config.quality_step,
            floor: Quality::new(config.min_quality),
        }
    }
}

impl Default for EncodeParams {
    fn default() -> Self {
        Self::from(&EncoderConfig::default())
    }
}
