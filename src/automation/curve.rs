//! Keyframe curves
//!
//! A keyframe sequence describes a piecewise function of time. Each segment
//! takes its interpolation mode from the keyframe that starts it.

use serde::{Deserialize, Serialize};

/// Smallest segment length used when normalizing segment position.
const MIN_SEGMENT: f64 = 1e-9;

/// Interpolation mode for the segment following a keyframe
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum Curve {
    /// Straight line to the next keyframe (default)
    #[default]
    Linear,
    /// Geometric blend between the two values
    #[serde(alias = "exp")]
    Exponential,
    /// Hold this keyframe's value until the next one
    Step,
    /// Smooth curve through neighbouring keyframes, see [`SplineMode`]
    Spline,
}

/// How `Curve::Spline` segments are evaluated
///
/// Sessions written before Catmull-Rom support treat spline segments as
/// linear, so `Linear` stays the default.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum SplineMode {
    /// Approximate spline segments with a straight line
    #[default]
    Linear,
    /// Uniform Catmull-Rom through the surrounding keyframes
    CatmullRom,
}

/// A single anchor on a lane's curve
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Keyframe {
    /// Time in seconds
    pub t: f64,

    /// Value at this time
    pub v: f64,

    /// Interpolation used towards the next keyframe
    #[serde(default)]
    pub curve: Curve,
}

impl Keyframe {
    /// Create a linear keyframe
    pub fn new(t: f64, v: f64) -> Self {
        Self {
            t,
            v,
            curve: Curve::Linear,
        }
    }

    /// Set the curve for the following segment (builder pattern)
    pub fn with_curve(mut self, curve: Curve) -> Self {
        self.curve = curve;
        self
    }
}

fn lerp(a: f64, b: f64, u: f64) -> f64 {
    a + (b - a) * u
}

/// Evaluate a keyframe sequence at time `t`
///
/// Returns `None` for an empty sequence. Before the first keyframe and after
/// the last one the curve holds the boundary value.
pub fn interpolate(keys: &[Keyframe], t: f64, spline: SplineMode) -> Option<f64> {
    let first = keys.first()?;
    if t <= first.t {
        return Some(first.v);
    }

    for (i, pair) in keys.windows(2).enumerate() {
        let (a, b) = (pair[0], pair[1]);
        if t <= b.t {
            let u = (t - a.t) / (b.t - a.t).max(MIN_SEGMENT);
            let value = match a.curve {
                Curve::Linear => lerp(a.v, b.v, u),
                Curve::Exponential => exponential(a.v, b.v, u),
                Curve::Step => a.v,
                Curve::Spline => match spline {
                    SplineMode::Linear => lerp(a.v, b.v, u),
                    SplineMode::CatmullRom => catmull_rom_segment(keys, i, u),
                },
            };
            return Some(value);
        }
    }

    keys.last().map(|k| k.v)
}

fn exponential(a: f64, b: f64, u: f64) -> f64 {
    if a == 0.0 {
        return 0.0;
    }
    let ratio = b / a;
    if ratio < 0.0 {
        // Sign change: no real geometric path between the values
        return lerp(a, b, u);
    }
    a * ratio.powf(u)
}

/// Catmull-Rom between `keys[i]` and `keys[i + 1]`, with the outer control
/// points duplicated at the ends of the sequence.
fn catmull_rom_segment(keys: &[Keyframe], i: usize, u: f64) -> f64 {
    let (a, b) = (keys[i].v, keys[i + 1].v);
    if keys.len() < 4 {
        return lerp(a, b, u);
    }

    let p0 = if i == 0 { a } else { keys[i - 1].v };
    let p3 = keys.get(i + 2).map_or(b, |k| k.v);

    let u2 = u * u;
    let u3 = u2 * u;
    0.5 * ((2.0 * a)
        + (-p0 + b) * u
        + (2.0 * p0 - 5.0 * a + 4.0 * b - p3) * u2
        + (-p0 + 3.0 * a - 3.0 * b + p3) * u3)
}
