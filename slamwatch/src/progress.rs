//! Progress normalization and frame estimation.
//!
//! The backend reports progress as a bare percentage that may overshoot,
//! be missing, or briefly go backwards. [`MonotonicProgress`] turns that
//! stream into a value that only ever rises within `[0, 100]`, and
//! [`estimate_frame`] maps a percentage onto a frame index once the total
//! frame count is known.

use std::fmt;

/// Estimated current frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FrameEstimate {
    Known(u64),
    /// The total frame count is not known yet.
    Unknown,
}

impl FrameEstimate {
    pub fn known(self) -> Option<u64> {
        match self {
            FrameEstimate::Known(n) => Some(n),
            FrameEstimate::Unknown => None,
        }
    }
}

impl fmt::Display for FrameEstimate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FrameEstimate::Known(n) => write!(f, "{}", n),
            FrameEstimate::Unknown => write!(f, "unknown"),
        }
    }
}

/// Clamp a reported percentage into `[0, 100]`; non-finite values become 0.
pub fn clamp_percent(percent: f64) -> f64 {
    if percent.is_finite() {
        percent.clamp(0.0, 100.0)
    } else {
        0.0
    }
}

/// Estimate the frame index reached at `progress_percent`.
///
/// Returns [`FrameEstimate::Unknown`] when the total is absent or zero. The
/// result is `floor(percent / 100 * total)`, clamped to `[0, total]`.
///
/// # Example
///
/// ```
/// use slamwatch::progress::{estimate_frame, FrameEstimate};
///
/// assert_eq!(estimate_frame(50.0, Some(8450)), FrameEstimate::Known(4225));
/// assert_eq!(estimate_frame(50.0, None), FrameEstimate::Unknown);
/// ```
pub fn estimate_frame(progress_percent: f64, total_frames: Option<u64>) -> FrameEstimate {
    let total = match total_frames {
        Some(total) if total > 0 => total,
        _ => return FrameEstimate::Unknown,
    };

    let percent = clamp_percent(progress_percent);
    let frame = (percent * total as f64 / 100.0).floor();

    FrameEstimate::Known((frame as u64).min(total))
}

/// High-water mark over reported progress.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct MonotonicProgress {
    high_water: f64,
}

impl MonotonicProgress {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a reported value and return the normalized progress.
    ///
    /// The returned value never decreases between calls.
    pub fn observe(&mut self, reported: f64) -> f64 {
        let percent = clamp_percent(reported);
        if percent > self.high_water {
            self.high_water = percent;
        }
        self.high_water
    }

    pub fn current(&self) -> f64 {
        self.high_water
    }

    pub fn reset(&mut self) {
        self.high_water = 0.0;
    }
}
