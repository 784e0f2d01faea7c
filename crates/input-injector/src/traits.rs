//! Input backend trait abstraction

use input_types::{InputEvent, MouseButton, Point, VirtualKeyCode};

use crate::BackendResult;

/// What the active backend can do, queried once at startup
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BackendCapabilities {
    /// Accepts absolute screen coordinates
    pub absolute_positioning: bool,
    /// Accepts relative deltas
    pub relative_positioning: bool,
    /// Preserves fractional coordinates instead of snapping to pixels
    pub sub_pixel_positioning: bool,
    /// Maximum keys the OS reports as held at once, if limited
    pub max_simultaneous_keys: Option<u8>,
}

impl Default for BackendCapabilities {
    fn default() -> Self {
        Self {
            absolute_positioning: true,
            relative_positioning: false,
            sub_pixel_positioning: false,
            max_simultaneous_keys: None,
        }
    }
}

/// Platform input backend
///
/// Implementations perform exactly one native injection per call and never
/// retry. Callers are expected to serialize access through a single
/// dispatcher.
pub trait InputBackend: Send + Sync {
    /// Check if the process may inject input
    fn has_permission(&self) -> bool;

    /// Move the cursor to an absolute position
    fn move_to(&self, point: Point) -> BackendResult<()>;

    /// Press or release a mouse button at the current position
    fn set_button(&self, button: MouseButton, pressed: bool) -> BackendResult<()>;

    /// Press or release a key
    fn set_key(&self, key: VirtualKeyCode, pressed: bool) -> BackendResult<()>;

    /// Static capability flags
    fn capabilities(&self) -> BackendCapabilities;

    /// Cursor position as reported by the OS
    fn cursor_position(&self) -> BackendResult<Point>;

    /// Route a single event to the matching injection call
    fn dispatch(&self, event: &InputEvent) -> BackendResult<()> {
        match *event {
            InputEvent::MouseMove(point) => self.move_to(point),
            InputEvent::MouseButton { button, pressed } => self.set_button(button, pressed),
            InputEvent::Key { key, pressed } => self.set_key(key, pressed),
        }
    }
}
