//! thigh.recording.v1 input schema
//!
//! One document per recording: identifier, worn side, the regularly sampled
//! series and the optional exclusion events.

mod recording;
mod adapter;

pub use recording::*;
pub use adapter::*;
