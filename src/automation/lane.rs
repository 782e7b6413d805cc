//! Lane evaluation
//!
//! A lane sums its keyframe curve, oscillators and step sequencer, then
//! scales, offsets, clamps and quantizes the result.

use super::curve::{interpolate, Keyframe, SplineMode};
use super::lfo::Lfo;
use super::steps::Steps;
use serde::{Deserialize, Serialize};

/// Per-call evaluation settings
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EvalContext {
    /// Tempo in beats per minute
    pub bpm: f64,
    /// Swing passed to the step sequencer
    pub swing: f64,
    /// Evaluation of spline keyframe segments
    pub spline: SplineMode,
}

impl EvalContext {
    /// Context with no swing and linear spline segments
    pub fn new(bpm: f64) -> Self {
        Self {
            bpm,
            swing: 0.0,
            spline: SplineMode::Linear,
        }
    }

    pub fn with_swing(mut self, swing: f64) -> Self {
        self.swing = swing;
        self
    }

    pub fn with_spline(mut self, spline: SplineMode) -> Self {
        self.spline = spline;
        self
    }
}

/// A single automation lane
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Lane {
    /// Lower bound of the output
    pub min: f64,

    /// Upper bound of the output
    pub max: f64,

    /// Keyframe curve, ascending by time
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub keyframes: Option<Vec<Keyframe>>,

    /// Oscillators, summed together
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub lfos: Vec<Lfo>,

    /// Step sequencer
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub steps: Option<Steps>,

    /// Multiplier applied to the summed sources (default: 1.0)
    #[serde(default = "default_scale")]
    pub scale: f64,

    /// Added after scaling (default: 0.0)
    #[serde(default)]
    pub offset: f64,

    /// One-pole smoothing time constant in ms, 0 disables
    #[serde(default, alias = "smoothMs")]
    pub smooth_ms: f64,

    /// Quantization step, 0 disables
    #[serde(default)]
    pub quant: f64,

    /// Disabled lanes produce no value
    #[serde(default = "default_enabled")]
    pub enabled: bool,
}

fn default_scale() -> f64 { 1.0 }
fn default_enabled() -> bool { true }

impl Lane {
    /// Create an empty lane bounded to `[min, max]`
    pub fn new(min: f64, max: f64) -> Self {
        Self {
            min,
            max,
            keyframes: None,
            lfos: Vec::new(),
            steps: None,
            scale: 1.0,
            offset: 0.0,
            smooth_ms: 0.0,
            quant: 0.0,
            enabled: true,
        }
    }

    pub fn with_keyframes(mut self, keyframes: Vec<Keyframe>) -> Self {
        self.keyframes = Some(keyframes);
        self
    }

    pub fn with_lfo(mut self, lfo: Lfo) -> Self {
        self.lfos.push(lfo);
        self
    }

    pub fn with_steps(mut self, steps: Steps) -> Self {
        self.steps = Some(steps);
        self
    }

    pub fn with_scale(mut self, scale: f64, offset: f64) -> Self {
        self.scale = scale;
        self.offset = offset;
        self
    }

    pub fn with_smoothing(mut self, smooth_ms: f64) -> Self {
        self.smooth_ms = smooth_ms;
        self
    }

    pub fn with_quant(mut self, quant: f64) -> Self {
        self.quant = quant;
        self
    }

    pub fn with_enabled(mut self, enabled: bool) -> Self {
        self.enabled = enabled;
        self
    }

    /// Evaluate at `t` seconds with no swing and linear spline segments
    pub fn evaluate(&self, t: f64, bpm: f64) -> Option<f64> {
        self.evaluate_with(t, &EvalContext::new(bpm))
    }

    /// Evaluate at `t` seconds
    ///
    /// Returns `None` for a disabled lane. Smoothing is not applied here; see
    /// [`LaneState`](super::LaneState).
    pub fn evaluate_with(&self, t: f64, ctx: &EvalContext) -> Option<f64> {
        if !self.enabled {
            return None;
        }

        let mut x = 0.0;
        if let Some(value) = self
            .keyframes
            .as_deref()
            .and_then(|keys| interpolate(keys, t, ctx.spline))
        {
            x += value;
        }
        x += self.lfos.iter().map(|lfo| lfo.evaluate(t)).sum::<f64>();
        if let Some(value) = self
            .steps
            .as_ref()
            .and_then(|steps| steps.evaluate(t, ctx.bpm, ctx.swing))
        {
            x += value;
        }

        let x = bound(x * self.scale + self.offset, self.min, self.max);
        Some(quantize(x, self.quant))
    }

    /// Clamp a value into this lane's range
    pub fn clamp(&self, value: f64) -> f64 {
        bound(value, self.min, self.max)
    }
}

/// `max(min, min(max, x))`: pins to `min` when the bounds are inverted and
/// never returns NaN for finite bounds.
pub(crate) fn bound(x: f64, min: f64, max: f64) -> f64 {
    min.max(max.min(x))
}

/// Snap to the nearest multiple of `step`; a non-positive step is a no-op
pub fn quantize(value: f64, step: f64) -> f64 {
    if step > 0.0 {
        (value / step).round() * step
    } else {
        value
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::automation::{Curve, LfoShape};

    #[test]
    fn test_keyframe_lane_end_to_end() {
        let lane = Lane::new(0.0, 1.0).with_keyframes(vec![
            Keyframe::new(0.0, 0.0),
            Keyframe::new(1.0, 1.0).with_curve(Curve::Linear),
        ]);
        assert_eq!(lane.evaluate(0.5, 120.0), Some(0.5));
    }

    #[test]
    fn test_disabled_lane() {
        let lane = Lane::new(0.0, 1.0)
            .with_keyframes(vec![Keyframe::new(0.0, 0.5)])
            .with_enabled(false);
        for t in [0.0, 0.5, 10.0, -3.0] {
            assert_eq!(lane.evaluate(t, 120.0), None);
        }
    }

    #[test]
    fn test_empty_lane_is_zero_clamped() {
        assert_eq!(Lane::new(-1.0, 1.0).evaluate(0.3, 120.0), Some(0.0));
        assert_eq!(Lane::new(2.0, 5.0).evaluate(0.3, 120.0), Some(2.0));
    }

    #[test]
    fn test_sources_are_summed() {
        let lane = Lane::new(-100.0, 100.0)
            .with_keyframes(vec![Keyframe::new(0.0, 10.0)])
            .with_lfo(Lfo::new(LfoShape::Square, 1.0, 1.0))
            .with_lfo(Lfo::new(LfoShape::Square, 1.0, 2.0))
            .with_steps(Steps::new(vec![5.0]));
        assert_eq!(lane.evaluate(0.1, 120.0), Some(18.0));
    }

    #[test]
    fn test_scale_and_offset() {
        let lane = Lane::new(0.0, 1000.0)
            .with_keyframes(vec![Keyframe::new(0.0, 2.0)])
            .with_scale(100.0, 40.0);
        assert_eq!(lane.evaluate(0.0, 120.0), Some(240.0));
    }

    #[test]
    fn test_output_always_within_bounds() {
        let lane = Lane::new(-0.5, 0.5)
            .with_lfo(Lfo::new(LfoShape::Sine, 3.0, 10.0))
            .with_steps(Steps::new(vec![-4.0, 9.0, 0.2]).with_glide(0.7))
            .with_scale(3.0, 1.0);
        for i in 0..2000 {
            let t = i as f64 * 0.0137;
            let value = lane.evaluate(t, 133.0).unwrap();
            assert!((-0.5..=0.5).contains(&value), "t = {}: {}", t, value);
        }
    }

    #[test]
    fn test_quantization() {
        let lane = Lane::new(0.0, 10.0)
            .with_keyframes(vec![Keyframe::new(0.0, 0.0), Keyframe::new(1.0, 10.0)])
            .with_quant(0.5);
        assert_eq!(lane.evaluate(0.37, 120.0), Some(3.5));
        assert_eq!(lane.evaluate(0.32, 120.0), Some(3.0));
    }

    #[test]
    fn test_quantize_idempotent() {
        for value in [0.0, 1.23, -7.77, 440.1, 1e6 + 0.3] {
            for step in [0.1, 0.5, 1.0, 12.0] {
                let once = quantize(value, step);
                assert_eq!(quantize(once, step), once);
            }
        }
        assert_eq!(quantize(1.234, 0.0), 1.234);
        assert_eq!(quantize(1.234, -1.0), 1.234);
    }

    #[test]
    fn test_inverted_bounds_pin_to_min() {
        let lane = Lane::new(5.0, 1.0).with_keyframes(vec![Keyframe::new(0.0, 3.0)]);
        assert_eq!(lane.evaluate(0.0, 120.0), Some(5.0));
    }

    #[test]
    fn test_swing_only_when_requested() {
        let lane = Lane::new(-10.0, 10.0)
            .with_steps(Steps::new(vec![0.0, 4.0, 0.0, 4.0]).with_glide(1.0));

        // Odd step half way through at 60 bpm
        let plain = lane.evaluate(0.375, 60.0).unwrap();
        let swung = lane
            .evaluate_with(0.375, &EvalContext::new(60.0).with_swing(0.5))
            .unwrap();
        assert!((plain - 2.0).abs() < 1e-12);
        assert!((swung - 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_deserialize_defaults() {
        let lane: Lane = serde_yaml::from_str("{min: 0, max: 1}").unwrap();
        assert_eq!(lane.scale, 1.0);
        assert_eq!(lane.offset, 0.0);
        assert_eq!(lane.smooth_ms, 0.0);
        assert_eq!(lane.quant, 0.0);
        assert!(lane.enabled);
        assert!(lane.keyframes.is_none());
        assert!(lane.lfos.is_empty());
    }
}
