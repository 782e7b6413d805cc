//! One-pole smoothing state
//!
//! Smoothing needs the previous output, so it lives outside [`Lane`] in a
//! state object owned by whoever steps through time. Each render pass owns
//! its own states and resets them before the first frame.

use super::lane::Lane;

/// One-pole low-pass state for a single lane
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LaneState {
    previous: Option<f64>,
}

impl LaneState {
    /// Create a state with no history
    pub fn new() -> Self {
        Self::default()
    }

    /// Forget the previous output
    pub fn reset(&mut self) {
        self.previous = None;
    }

    /// Last smoothed output, if any
    pub fn previous(&self) -> Option<f64> {
        self.previous
    }

    /// Smooth `value` towards the previous output
    ///
    /// `rate_hz` is how often this is called per second, so a driver stepping
    /// control frames passes its frame rate rather than the audio sample rate
    /// to keep `smooth_ms` a time constant in milliseconds. The first value
    /// after a reset passes straight through. `None` (a disabled lane) also
    /// passes through and clears the history.
    pub fn process(&mut self, lane: &Lane, value: Option<f64>, rate_hz: f64) -> Option<f64> {
        let Some(value) = value else {
            self.previous = None;
            return None;
        };

        let smoothed = match (self.previous, coefficient(lane.smooth_ms, rate_hz)) {
            (Some(prev), Some(a)) => a * prev + (1.0 - a) * value,
            _ => value,
        };
        self.previous = Some(smoothed);
        Some(smoothed)
    }
}

/// `exp(-1 / (smooth_ms * 0.001 * rate_hz))`, or `None` when smoothing is off
pub fn coefficient(smooth_ms: f64, rate_hz: f64) -> Option<f64> {
    let frames = smooth_ms * 0.001 * rate_hz;
    if frames > 0.0 && frames.is_finite() {
        Some((-1.0 / frames).exp())
    } else {
        None
    }
}
