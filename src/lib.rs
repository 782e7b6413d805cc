//! Lanes - automation lanes for synthesis engine parameters
//!
//! A lane turns time into a control value by combining keyframe curves,
//! low-frequency oscillators and a step sequencer. A render driver steps
//! through a session frame by frame and feeds the values to an engine.

pub mod automation;
pub mod config;
pub mod engine;

pub use automation::{Lane, Session};
pub use engine::Renderer;
