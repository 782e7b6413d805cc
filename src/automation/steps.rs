//! Step sequencer source
//!
//! A table of `n` values played once per beat, with optional glide towards
//! the following step and swing on odd steps.

use serde::{Deserialize, Serialize};

/// Step sequencer descriptor
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Steps {
    /// Number of steps per beat cycle
    pub n: usize,

    /// Value for each step
    #[serde(default)]
    pub vals: Vec<f64>,

    /// Portion of each step spent ramping to the next value (0.0-1.0)
    #[serde(default)]
    pub glide: f64,

    /// Trigger probability, reserved for the playback driver
    #[serde(default = "default_prob")]
    pub prob: f64,

    /// Timing jitter in milliseconds, reserved for the playback driver
    #[serde(default, alias = "humanizeMs")]
    pub humanize_ms: f64,
}

fn default_prob() -> f64 { 1.0 }

/// Position of a time within the step table
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StepPosition {
    /// Current step index in `0..n`
    pub index: usize,
    /// Progress through the current step (0.0-1.0)
    pub fraction: f64,
}

impl Steps {
    /// Create a step table with `n` equal to the number of values
    pub fn new(vals: Vec<f64>) -> Self {
        Self {
            n: vals.len(),
            vals,
            glide: 0.0,
            prob: 1.0,
            humanize_ms: 0.0,
        }
    }

    /// Set the glide amount
    pub fn with_glide(mut self, glide: f64) -> Self {
        self.glide = glide;
        self
    }

    /// Trigger probability (not used by [`Steps::evaluate`])
    pub fn trigger_probability(&self) -> f64 {
        self.prob.clamp(0.0, 1.0)
    }

    /// Humanize offset in milliseconds (not used by [`Steps::evaluate`])
    pub fn humanize_ms(&self) -> f64 {
        self.humanize_ms
    }

    /// Locate `t` seconds in the table at the given tempo
    ///
    /// Returns `None` when the table has no steps.
    pub fn position(&self, t: f64, bpm: f64) -> Option<StepPosition> {
        if self.n == 0 {
            return None;
        }
        let beat = t * bpm / 60.0;
        let step = beat * self.n as f64;
        let whole = step.floor();
        let index = (whole as i64).rem_euclid(self.n as i64) as usize;
        Some(StepPosition {
            index,
            fraction: step - whole,
        })
    }

    /// Current step index at `t` seconds, for triggering playback events
    pub fn step_index(&self, t: f64, bpm: f64) -> Option<usize> {
        self.position(t, bpm).map(|pos| pos.index)
    }

    /// Evaluate the sequencer at `t` seconds
    ///
    /// Odd steps are pushed later by `swing * 0.5` of a step. Returns `None`
    /// when there are no steps or no values.
    pub fn evaluate(&self, t: f64, bpm: f64, swing: f64) -> Option<f64> {
        if self.vals.is_empty() {
            return None;
        }
        let pos = self.position(t, bpm)?;

        let fraction = if pos.index % 2 == 1 {
            (pos.fraction + swing * 0.5).min(1.0)
        } else {
            pos.fraction
        };

        let current = self.value(pos.index);
        let next = self.value((pos.index + 1) % self.n);
        let glide = self.glide.clamp(0.0, 1.0);

        Some(current + (next - current) * glide * fraction)
    }

    /// Table entries past the end of `vals` read as zero
    fn value(&self, index: usize) -> f64 {
        self.vals.get(index).copied().unwrap_or(0.0)
    }
}
