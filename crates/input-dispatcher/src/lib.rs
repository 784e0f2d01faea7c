//! Input Dispatcher - the single serialization point for injected input
//!
//! Every move, click and keystroke becomes a [`Script`] executed by one
//! worker thread per [`Dispatcher`]. [`GhostEngine`] wires the dispatcher to
//! a backend, the ghost tracker and the path generator.

mod dispatcher;
mod engine;
mod error;
mod handle;
mod script;
mod typing;

pub use dispatcher::*;
pub use engine::*;
pub use error::*;
pub use handle::*;
pub use script::*;
pub use typing::*;

pub use input_injector::{BackendCapabilities, BackendError, InputBackend, MockBackend};
pub use input_types::{InputEvent, KeyModifiers, MouseButton, Point, VirtualKeyCode};
pub use motion_synth::{DelayRange, EasingProfile, MotionConfig, MotionError, Path, PathSample};
