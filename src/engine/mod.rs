//! Render driver
//!
//! Steps through a session one control frame at a time, keeps the smoothing
//! state of every lane and forwards bound parameters to a synthesis engine.

mod recorder;
mod sink;

pub use recorder::{normalize, ExportError, LaneRecorder};
pub use sink::{ParamFrame, ParameterSink};

use crate::automation::{LaneState, Session};
use std::collections::BTreeMap;

/// Frame timing for a render pass
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RenderOptions {
    /// Control frame length in milliseconds (default: 10)
    pub frame_ms: f64,
    /// Engine sample rate in Hz (default: 48000)
    pub sample_rate: u32,
}

impl Default for RenderOptions {
    fn default() -> Self {
        Self {
            frame_ms: 10.0,
            sample_rate: 48000,
        }
    }
}

/// Lane values for one control frame
#[derive(Debug, Clone, PartialEq)]
pub struct Frame {
    /// Frame number within the pass
    pub index: usize,
    /// Frame start in seconds
    pub time: f64,
    /// Smoothed value per lane, `None` where a lane is disabled
    pub lanes: BTreeMap<String, Option<f64>>,
}

/// Frame-by-frame evaluator for a session
pub struct Renderer {
    session: Session,
    options: RenderOptions,
    states: BTreeMap<String, LaneState>,
    cursor: usize,
}

impl Renderer {
    /// Create a renderer positioned at the start of the session
    pub fn new(session: Session, options: RenderOptions) -> Self {
        let mut renderer = Self {
            session,
            options,
            states: BTreeMap::new(),
            cursor: 0,
        };
        renderer.reset();
        renderer
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    /// Mutable access for editors; call [`Renderer::reset`] before the next pass
    pub fn session_mut(&mut self) -> &mut Session {
        &mut self.session
    }

    pub fn options(&self) -> RenderOptions {
        self.options
    }

    /// Control frames per second
    pub fn frame_rate(&self) -> f64 {
        1000.0 / self.options.frame_ms
    }

    /// Control frames per second as a whole number of Hz
    ///
    /// `None` unless `frame_ms` divides one second exactly, since a rounded
    /// rate would stretch or squeeze the recorded timeline.
    pub fn exact_frame_rate(&self) -> Option<u32> {
        let rate = self.frame_rate();
        let whole = rate.round();
        if whole >= 1.0 && whole <= u32::MAX as f64 && (rate - whole).abs() < 1e-9 {
            Some(whole as u32)
        } else {
            None
        }
    }

    /// Frame length in seconds
    pub fn frame_secs(&self) -> f64 {
        self.options.frame_ms / 1000.0
    }

    /// Engine samples rendered per control frame (at least one)
    pub fn samples_per_frame(&self) -> usize {
        let samples = (self.frame_secs() * self.options.sample_rate as f64).round();
        if samples >= 1.0 { samples as usize } else { 1 }
    }

    /// Number of frames in a full pass
    pub fn frame_count(&self) -> usize {
        let dt = self.frame_secs();
        if !(dt > 0.0) || !self.session.length_sec.is_finite() {
            return 0;
        }
        let mut count = (self.session.length_sec / dt).floor() as usize;
        while (count as f64) * dt < self.session.length_sec {
            count += 1;
        }
        while count > 0 && ((count - 1) as f64) * dt >= self.session.length_sec {
            count -= 1;
        }
        count
    }

    /// Rewind to the first frame and clear all smoothing state
    pub fn reset(&mut self) {
        self.cursor = 0;
        self.states = self
            .session
            .lanes
            .keys()
            .map(|name| (name.clone(), LaneState::new()))
            .collect();
        log::debug!(
            "render pass reset: {} lanes, {} frames of {} ms",
            self.states.len(),
            self.frame_count(),
            self.options.frame_ms
        );
    }

    /// Evaluate the next frame, or `None` at the end of the session
    pub fn next_frame(&mut self) -> Option<Frame> {
        if self.cursor >= self.frame_count() {
            return None;
        }

        let index = self.cursor;
        let time = index as f64 * self.frame_secs();
        let rate = self.frame_rate();
        let ctx = self.session.context();

        let mut lanes = BTreeMap::new();
        for (name, lane) in &self.session.lanes {
            let raw = lane.evaluate_with(time, &ctx);
            let state = self.states.entry(name.clone()).or_default();
            lanes.insert(name.clone(), state.process(lane, raw, rate));
        }

        self.cursor += 1;
        Some(Frame { index, time, lanes })
    }

    /// Iterate over the remaining frames
    pub fn frames(&mut self) -> Frames<'_> {
        Frames { renderer: self }
    }

    /// Run a full pass into `sink`, returning the number of frames rendered
    ///
    /// Every binding is written before each frame is rendered.
    pub fn drive(&mut self, sink: &mut dyn ParameterSink) -> usize {
        self.reset();
        let samples = self.samples_per_frame();
        let bindings = self.session.bindings.clone();

        let mut rendered = 0;
        while let Some(frame) = self.next_frame() {
            for binding in &bindings {
                let value = frame.lanes.get(binding.lane_name()).copied().flatten();
                sink.set_parameter(&binding.param, binding.resolve(value));
            }
            sink.render_frame(samples);
            rendered += 1;
        }

        log::debug!("render pass finished: {} frames", rendered);
        rendered
    }
}

/// Iterator over a renderer's frames
pub struct Frames<'a> {
    renderer: &'a mut Renderer,
}

impl Iterator for Frames<'_> {
    type Item = Frame;

    fn next(&mut self) -> Option<Frame> {
        self.renderer.next_frame()
    }
}
