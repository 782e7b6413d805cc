//! Automation lanes
//!
//! Each lane combines a keyframe curve, any number of LFOs and a step
//! sequencer into one bounded value at an arbitrary time.

mod curve;
mod lane;
mod lfo;
mod session;
mod smoothing;
mod steps;

pub use curve::{interpolate, Curve, Keyframe, SplineMode};
pub use lane::{quantize, EvalContext, Lane};
pub use lfo::{Lfo, LfoShape};
pub use session::{Binding, Session};
pub use smoothing::{coefficient, LaneState};
pub use steps::{StepPosition, Steps};
