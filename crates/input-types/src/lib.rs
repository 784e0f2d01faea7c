//! Shared input vocabulary for Ghostinput
//!
//! Geometry primitives (sub-pixel points, vectors, bounding boxes) and the
//! cross-platform input events every other crate in the workspace speaks.

mod error;
mod geometry;
mod input;

pub use error::*;
pub use geometry::*;
pub use input::*;
