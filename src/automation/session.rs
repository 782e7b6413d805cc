//! Session model: tempo, swing, duration and named lanes

use super::curve::SplineMode;
use super::lane::{EvalContext, Lane};
use anyhow::{bail, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// A named collection of lanes with global timing
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Session {
    /// Beats per minute (default: 120)
    #[serde(default = "default_bpm")]
    pub bpm: f64,

    /// Global swing amount (default: 0)
    #[serde(default)]
    pub swing: f64,

    /// Duration in seconds
    #[serde(alias = "lengthSec")]
    pub length_sec: f64,

    /// Pass `swing` to step sequencers (default: false)
    #[serde(default)]
    pub swing_steps: bool,

    /// Evaluation of spline keyframe segments (default: linear)
    #[serde(default)]
    pub spline: SplineMode,

    /// Lanes by name
    #[serde(default)]
    pub lanes: BTreeMap<String, Lane>,

    /// Engine parameters driven by lanes
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub bindings: Vec<Binding>,
}

fn default_bpm() -> f64 { 120.0 }

/// Routes a lane's value to an engine parameter
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Binding {
    /// Engine parameter name
    pub param: String,

    /// Lane name (default: same as `param`)
    #[serde(default)]
    pub lane: Option<String>,

    /// Value used when the lane gives no override
    pub default: f64,

    /// Engine-side lower limit
    #[serde(default)]
    pub min: Option<f64>,

    /// Engine-side upper limit
    #[serde(default)]
    pub max: Option<f64>,
}

impl Binding {
    /// Bind the lane of the same name to `param`
    pub fn new(param: impl Into<String>, default: f64) -> Self {
        Self {
            param: param.into(),
            lane: None,
            default,
            min: None,
            max: None,
        }
    }

    /// Read from a differently named lane
    pub fn from_lane(mut self, lane: impl Into<String>) -> Self {
        self.lane = Some(lane.into());
        self
    }

    /// Limit the forwarded value
    pub fn with_range(mut self, min: f64, max: f64) -> Self {
        self.min = Some(min);
        self.max = Some(max);
        self
    }

    /// Name of the lane this binding reads
    pub fn lane_name(&self) -> &str {
        self.lane.as_deref().unwrap_or(&self.param)
    }

    /// Resolve a lane value into the parameter value
    pub fn resolve(&self, value: Option<f64>) -> f64 {
        let value = value.unwrap_or(self.default);
        let value = match self.max {
            Some(max) => value.min(max),
            None => value,
        };
        match self.min {
            Some(min) => value.max(min),
            None => value,
        }
    }
}

impl Session {
    /// Create an empty session
    pub fn new(bpm: f64, length_sec: f64) -> Self {
        Self {
            bpm,
            swing: 0.0,
            length_sec,
            swing_steps: false,
            spline: SplineMode::Linear,
            lanes: BTreeMap::new(),
            bindings: Vec::new(),
        }
    }

    /// Add or replace a lane (builder pattern)
    pub fn with_lane(mut self, name: impl Into<String>, lane: Lane) -> Self {
        self.lanes.insert(name.into(), lane);
        self
    }

    /// Add a parameter binding (builder pattern)
    pub fn with_binding(mut self, binding: Binding) -> Self {
        self.bindings.push(binding);
        self
    }

    /// Look up a lane by name
    pub fn lane(&self, name: &str) -> Option<&Lane> {
        self.lanes.get(name)
    }

    /// Evaluation settings derived from this session
    pub fn context(&self) -> EvalContext {
        let swing = if self.swing_steps { self.swing } else { 0.0 };
        EvalContext::new(self.bpm)
            .with_swing(swing)
            .with_spline(self.spline)
    }

    /// Evaluate a lane by name, without smoothing
    ///
    /// Returns `None` for a missing or disabled lane.
    pub fn evaluate(&self, name: &str, t: f64) -> Option<f64> {
        self.lane(name)?.evaluate_with(t, &self.context())
    }

    /// Validate session-level settings
    ///
    /// Lane contents and dangling bindings never cause an error here; see
    /// [`Session::warnings`].
    pub fn validate(&self) -> Result<()> {
        if !self.bpm.is_finite() || self.bpm <= 0.0 {
            bail!("BPM must be a positive number, got {}", self.bpm);
        }
        if !self.length_sec.is_finite() || self.length_sec < 0.0 {
            bail!("Session length must be zero or more seconds, got {}", self.length_sec);
        }
        if !self.swing.is_finite() {
            bail!("Swing must be a finite number");
        }
        if self.lanes.keys().any(|name| name.trim().is_empty()) {
            bail!("Lane names must not be empty");
        }
        Ok(())
    }

    /// Describe lane settings that evaluate but are probably mistakes
    pub fn warnings(&self) -> Vec<String> {
        let mut warnings = Vec::new();

        for (name, lane) in &self.lanes {
            if lane.min > lane.max {
                warnings.push(format!(
                    "lane '{}': min {} is above max {}, output is pinned to min",
                    name, lane.min, lane.max
                ));
            }
            if let Some(keys) = &lane.keyframes {
                if keys.is_empty() {
                    warnings.push(format!("lane '{}': keyframe list is empty", name));
                }
                if keys.windows(2).any(|pair| pair[1].t < pair[0].t) {
                    warnings.push(format!("lane '{}': keyframes are not sorted by time", name));
                }
            }
            if let Some(steps) = &lane.steps {
                if steps.n == 0 {
                    warnings.push(format!("lane '{}': step count is zero", name));
                } else if steps.vals.len() != steps.n {
                    warnings.push(format!(
                        "lane '{}': {} step values for {} steps",
                        name,
                        steps.vals.len(),
                        steps.n
                    ));
                }
            }
            if lane.quant < 0.0 {
                warnings.push(format!("lane '{}': negative quantization is ignored", name));
            }
            if lane.smooth_ms < 0.0 {
                warnings.push(format!("lane '{}': negative smoothing is ignored", name));
            }
        }

        for binding in &self.bindings {
            if !self.lanes.contains_key(binding.lane_name()) {
                warnings.push(format!(
                    "binding '{}': unknown lane '{}', default {} is used",
                    binding.param,
                    binding.lane_name(),
                    binding.default
                ));
            }
        }

        warnings
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::automation::{Keyframe, Steps};

    fn session() -> Session {
        Session::new(120.0, 2.0)
            .with_lane(
                "f0",
                Lane::new(40.0, 800.0)
                    .with_keyframes(vec![Keyframe::new(0.0, 100.0), Keyframe::new(2.0, 300.0)]),
            )
            .with_binding(Binding::new("f0", 120.0))
    }

    #[test]
    fn test_evaluate_by_name() {
        let session = session();
        assert_eq!(session.evaluate("f0", 1.0), Some(200.0));
        assert_eq!(session.evaluate("missing", 1.0), None);
    }

    #[test]
    fn test_session_swing_ignored_by_default() {
        let mut session = Session::new(60.0, 1.0).with_lane(
            "gate",
            Lane::new(-10.0, 10.0).with_steps(Steps::new(vec![0.0, 4.0, 0.0, 4.0]).with_glide(1.0)),
        );
        session.swing = 0.5;

        let plain = session.evaluate("gate", 0.375).unwrap();
        assert!((plain - 2.0).abs() < 1e-12);

        session.swing_steps = true;
        let swung = session.evaluate("gate", 0.375).unwrap();
        assert!((swung - 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_validate() {
        assert!(session().validate().is_ok());

        let mut bad = session();
        bad.bpm = 0.0;
        assert!(bad.validate().is_err());

        let mut bad = session();
        bad.length_sec = -1.0;
        assert!(bad.validate().is_err());

        let dangling = session().with_binding(Binding::new("F1", 500.0));
        assert!(dangling.validate().is_ok());

        let ok = session().with_binding(Binding::new("pitch", 100.0).from_lane("f0"));
        assert!(ok.validate().is_ok());
    }

    #[test]
    fn test_warnings() {
        assert!(session().warnings().is_empty());

        let mut steps = Steps::new(vec![1.0, 2.0]);
        steps.n = 3;
        let session = session()
            .with_lane("inverted", Lane::new(1.0, 0.0))
            .with_lane(
                "unsorted",
                Lane::new(0.0, 1.0)
                    .with_keyframes(vec![Keyframe::new(1.0, 0.0), Keyframe::new(0.0, 1.0)]),
            )
            .with_lane("short", Lane::new(0.0, 1.0).with_steps(steps));

        let warnings = session.warnings();
        assert_eq!(warnings.len(), 3);
        assert!(warnings.iter().any(|w| w.contains("inverted")));
        assert!(warnings.iter().any(|w| w.contains("not sorted")));
        assert!(warnings.iter().any(|w| w.contains("2 step values for 3 steps")));
    }

    #[test]
    fn test_dangling_binding_warns() {
        let session = session().with_binding(Binding::new("F2", 1500.0));
        let warnings = session.warnings();
        assert_eq!(warnings.len(), 1);
        assert!(warnings[0].contains("unknown lane 'F2'"));
    }

    #[test]
    fn test_binding_resolve() {
        let binding = Binding::new("tiltDb", -6.0).with_range(-40.0, 30.0);
        assert_eq!(binding.resolve(None), -6.0);
        assert_eq!(binding.resolve(Some(12.0)), 12.0);
        assert_eq!(binding.resolve(Some(90.0)), 30.0);
        assert_eq!(binding.resolve(Some(-90.0)), -40.0);
        assert_eq!(binding.lane_name(), "tiltDb");
    }

    #[test]
    fn test_deserialize_browser_session() {
        let json = r#"{
            "bpm": 96,
            "swing": 0.2,
            "lengthSec": 4,
            "lanes": {
                "F1": {
                    "min": 150, "max": 1200,
                    "keyframes": [{"t": 0, "v": 300, "curve": "exp"}, {"t": 4, "v": 900}],
                    "lfos": [{"shape": "snh", "rateHz": 2, "depth": 20, "bipolar": false}],
                    "smoothMs": 15
                }
            }
        }"#;
        let session: Session = serde_json::from_str(json).unwrap();
        assert_eq!(session.length_sec, 4.0);
        assert!(!session.swing_steps);
        assert_eq!(session.spline, SplineMode::Linear);

        let lane = session.lane("F1").unwrap();
        assert_eq!(lane.smooth_ms, 15.0);
        assert_eq!(lane.lfos.len(), 1);
        assert!(!lane.lfos[0].bipolar);
    }
}
