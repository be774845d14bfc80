//! Volume rules: configured limits, clamping, and change detection.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Highest level the OS mixers understand.
pub const MAX_LEVEL: u8 = 100;

/// Error returned when configured limits are inconsistent.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum VolumeLimitsError {
    #[error("volume min {min} is greater than max {max}")]
    Inverted { min: u8, max: u8 },
    #[error("volume max {0} exceeds {MAX_LEVEL}")]
    AboveRange(u8),
}

/// Inclusive `[min, max]` range applied to every `set-volume` request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct VolumeLimits {
    min: u8,
    max: u8,
}

impl Default for VolumeLimits {
    fn default() -> Self {
        Self {
            min: 0,
            max: MAX_LEVEL,
        }
    }
}

impl VolumeLimits {
    /// Builds limits, rejecting `min > max` and `max > 100`.
    pub fn new(min: u8, max: u8) -> Result<Self, VolumeLimitsError> {
        if max > MAX_LEVEL {
            return Err(VolumeLimitsError::AboveRange(max));
        }
        if min > max {
            return Err(VolumeLimitsError::Inverted { min, max });
        }
        Ok(Self { min, max })
    }

    pub fn min(&self) -> u8 {
        self.min
    }

    pub fn max(&self) -> u8 {
        self.max
    }

    /// Rounds `requested` to the nearest integer and clamps it into range.
    ///
    /// Returns `None` for NaN, which callers treat as a rejected request.
    /// Infinities clamp to the nearest bound.
    pub fn clamp(&self, requested: f64) -> Option<u8> {
        if requested.is_nan() {
            return None;
        }
        let rounded = requested.round();
        let bounded = rounded.max(f64::from(self.min)).min(f64::from(self.max));
        // In range 0..=100 after clamping, so the cast is exact.
        Some(bounded as u8)
    }
}

/// A detected volume transition.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VolumeChange {
    pub previous: u8,
    pub current: u8,
}

/// Remembers the last observed level and reports transitions.
///
/// The first observation only establishes a baseline; identical readings
/// are silent.
#[derive(Debug, Default)]
pub struct VolumeChangeDetector {
    last: Option<u8>,
}

impl VolumeChangeDetector {
    pub fn new() -> Self {
        Self::default()
    }

    /// Records `current` and returns a change if it differs from the baseline.
    pub fn observe(&mut self, current: u8) -> Option<VolumeChange> {
        let previous = self.last.replace(current)?;
        (previous != current).then_some(VolumeChange { previous, current })
    }

    /// Last observed level, `None` before the first reading.
    pub fn last(&self) -> Option<u8> {
        self.last
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
