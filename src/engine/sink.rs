//! Parameter sink trait for synthesis engines

use std::collections::BTreeMap;

/// Receives lane values once per control frame
pub trait ParameterSink {
    /// Set a parameter value for the coming frame
    fn set_parameter(&mut self, name: &str, value: f64);

    /// Render `samples` samples with the current parameters
    fn render_frame(&mut self, samples: usize);
}

/// A sink that records the latest parameter values and frame count
#[derive(Debug, Clone, Default)]
pub struct ParamFrame {
    values: BTreeMap<String, f64>,
    frames: usize,
    samples: usize,
}

impl ParamFrame {
    pub fn new() -> Self {
        Self::default()
    }

    /// Latest value of a parameter
    pub fn get(&self, name: &str) -> Option<f64> {
        self.values.get(name).copied()
    }

    /// All parameters, sorted by name
    pub fn values(&self) -> &BTreeMap<String, f64> {
        &self.values
    }

    /// Frames rendered so far
    pub fn frames(&self) -> usize {
        self.frames
    }

    /// Samples rendered so far
    pub fn samples(&self) -> usize {
        self.samples
    }
}

impl ParameterSink for ParamFrame {
    fn set_parameter(&mut self, name: &str, value: f64) {
        self.values.insert(name.to_string(), value);
    }

    fn render_frame(&mut self, samples: usize) {
        self.frames += 1;
        self.samples += samples;
    }
}
