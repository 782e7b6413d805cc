//! Low Frequency Oscillator for modulation
//!
//! Unlike a free-running oscillator, the phase here is computed from absolute
//! time on every call. Querying the same time twice gives the same value, and
//! queries may arrive in any order.

use serde::{Deserialize, Serialize};
use std::f64::consts::TAU;

/// LFO waveform shapes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LfoShape {
    Sine,
    #[serde(alias = "tri")]
    Triangle,
    Square,
    /// Alternates between +1 and -1 once per cycle
    #[serde(alias = "snh")]
    SampleAndHold,
    /// A new pseudo-random level once per cycle
    Random,
}

/// Low Frequency Oscillator descriptor
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Lfo {
    pub shape: LfoShape,

    /// Rate in Hz
    #[serde(alias = "rateHz")]
    pub rate_hz: f64,

    /// Output multiplier
    pub depth: f64,

    /// Phase offset in cycles
    #[serde(default)]
    pub phase: f64,

    /// Output in [-1, 1] when true, [0, 1] otherwise (before depth)
    #[serde(default = "default_bipolar")]
    pub bipolar: bool,

    /// Seed for the `random` shape
    #[serde(default)]
    pub seed: u64,
}

fn default_bipolar() -> bool { true }

impl Lfo {
    /// Create a bipolar LFO with zero phase offset
    pub fn new(shape: LfoShape, rate_hz: f64, depth: f64) -> Self {
        Self {
            shape,
            rate_hz,
            depth,
            phase: 0.0,
            bipolar: true,
            seed: 0,
        }
    }

    /// Set the phase offset in cycles
    pub fn with_phase(mut self, phase: f64) -> Self {
        self.phase = phase;
        self
    }

    /// Set bipolar or unipolar output
    pub fn with_bipolar(mut self, bipolar: bool) -> Self {
        self.bipolar = bipolar;
        self
    }

    /// Set the seed used by the `random` shape
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    /// Evaluate the oscillator at `t` seconds
    pub fn evaluate(&self, t: f64) -> f64 {
        let phase = self.phase + t * self.rate_hz;
        let frac = phase.rem_euclid(1.0);

        let raw = match self.shape {
            LfoShape::Sine => (phase * TAU).sin(),
            LfoShape::Triangle => {
                if frac < 0.25 {
                    4.0 * frac
                } else if frac < 0.75 {
                    2.0 - 4.0 * frac
                } else {
                    4.0 * frac - 4.0
                }
            }
            LfoShape::Square => {
                if frac < 0.5 {
                    1.0
                } else {
                    -1.0
                }
            }
            LfoShape::SampleAndHold => {
                if (phase.floor() as i64).rem_euclid(2) == 1 {
                    -1.0
                } else {
                    1.0
                }
            }
            LfoShape::Random => random(self.seed, phase.floor() as i64),
        };

        let shaped = if self.bipolar { raw } else { (raw + 1.0) * 0.5 };
        shaped * self.depth
    }
}

/// Hash a cycle index into [-1, 1] with xorshift
fn random(seed: u64, cycle: i64) -> f64 {
    let mut x = (cycle as u64) ^ seed ^ 0x9E37_79B9_7F4A_7C15;
    if x == 0 {
        x = 12345;
    }
    for _ in 0..3 {
        x ^= x << 13;
        x ^= x >> 7;
        x ^= x << 17;
    }
    (x as f64 / u64::MAX as f64) * 2.0 - 1.0
}
