//! Motion synthesis for Ghostinput
//!
//! Turns "move from the ghost position to a target over a duration" into a
//! timed sequence of sub-pixel points:
//! - [`GhostTracker`]: authoritative sub-pixel cursor state
//! - [`PathGenerator`]: randomized Bézier curves sampled into a [`Path`]
//! - [`TimingModel`]: eased, optionally jittered sample timing

mod bezier;
mod config;
mod error;
mod ghost;
mod path;
mod timing;

pub use bezier::*;
pub use config::*;
pub use error::*;
pub use ghost::*;
pub use path::*;
pub use timing::*;
