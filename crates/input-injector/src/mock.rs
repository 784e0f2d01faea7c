//! In-memory backend for tests and dry runs
//!
//! Records every injected event and mimics the OS by reporting the cursor
//! rounded to whole pixels.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

use input_types::{InputEvent, MouseButton, Point, VirtualKeyCode};
use parking_lot::Mutex;
use tracing::debug;

use crate::{BackendCapabilities, BackendError, BackendResult, InputBackend};

type MoveHook = Arc<dyn Fn(usize, Point) + Send + Sync>;

/// Scripted failure applied to moves from a given index on
#[derive(Debug, Clone)]
struct MoveFailure {
    from_index: usize,
    error: BackendError,
}

pub struct MockBackend {
    os_position: Mutex<(i32, i32)>,
    events: Mutex<Vec<InputEvent>>,
    permission: AtomicBool,
    moves: AtomicUsize,
    move_failure: Mutex<Option<MoveFailure>>,
    move_hook: Mutex<Option<MoveHook>>,
    capabilities: BackendCapabilities,
}

impl MockBackend {
    pub fn new(cursor: Point) -> Self {
        Self {
            os_position: Mutex::new(cursor.rounded()),
            events: Mutex::new(Vec::new()),
            permission: AtomicBool::new(true),
            moves: AtomicUsize::new(0),
            move_failure: Mutex::new(None),
            move_hook: Mutex::new(None),
            capabilities: BackendCapabilities {
                absolute_positioning: true,
                relative_positioning: true,
                sub_pixel_positioning: true,
                max_simultaneous_keys: None,
            },
        }
    }

    pub fn with_capabilities(mut self, capabilities: BackendCapabilities) -> Self {
        self.capabilities = capabilities;
        self
    }

    /// Events injected so far, in order
    pub fn events(&self) -> Vec<InputEvent> {
        self.events.lock().clone()
    }

    /// Injected events other than pointer moves
    pub fn non_move_events(&self) -> Vec<InputEvent> {
        self.events
            .lock()
            .iter()
            .filter(|e| !matches!(e, InputEvent::MouseMove(_)))
            .copied()
            .collect()
    }

    pub fn clear_events(&self) {
        self.events.lock().clear();
    }

    /// Successful plus failed move attempts
    pub fn move_attempts(&self) -> usize {
        self.moves.load(Ordering::SeqCst)
    }

    /// Integer position the fake OS would report
    pub fn os_position(&self) -> (i32, i32) {
        *self.os_position.lock()
    }

    pub fn set_permission(&self, granted: bool) {
        self.permission.store(granted, Ordering::SeqCst);
    }

    /// Fail every move whose zero-based attempt index is `from_index` or later
    pub fn fail_moves_from(&self, from_index: usize, error: BackendError) {
        *self.move_failure.lock() = Some(MoveFailure { from_index, error });
    }

    /// Drop scripted failures and grant permission again
    pub fn restore(&self) {
        self.move_failure.lock().take();
        self.set_permission(true);
    }

    /// Run `hook(index, point)` after each successful move
    pub fn set_move_hook<F>(&self, hook: F)
    where
        F: Fn(usize, Point) + Send + Sync + 'static,
    {
        *self.move_hook.lock() = Some(Arc::new(hook));
    }

    fn check_permission(&self) -> BackendResult<()> {
        if self.has_permission() {
            Ok(())
        } else {
            Err(BackendError::PermissionDenied)
        }
    }
}

impl Default for MockBackend {
    fn default() -> Self {
        Self::new(Point::ORIGIN)
    }
}

impl InputBackend for MockBackend {
    fn has_permission(&self) -> bool {
        self.permission.load(Ordering::SeqCst)
    }

    fn move_to(&self, point: Point) -> BackendResult<()> {
        let index = self.moves.fetch_add(1, Ordering::SeqCst);
        self.check_permission()?;
        if let Some(failure) = self.move_failure.lock().as_ref() {
            if index >= failure.from_index {
                debug!("Mock move {} failing with {}", index, failure.error);
                return Err(failure.error.clone());
            }
        }
        if !point.is_finite() {
            return Err(BackendError::InvalidCoordinates {
                x: point.x,
                y: point.y,
            });
        }

        *self.os_position.lock() = point.rounded();
        self.events.lock().push(InputEvent::MouseMove(point));

        let hook = self.move_hook.lock().clone();
        if let Some(hook) = hook {
            hook(index, point);
        }
        Ok(())
    }

    fn set_button(&self, button: MouseButton, pressed: bool) -> BackendResult<()> {
        self.check_permission()?;
        self.events
            .lock()
            .push(InputEvent::MouseButton { button, pressed });
        Ok(())
    }

    fn set_key(&self, key: VirtualKeyCode, pressed: bool) -> BackendResult<()> {
        self.check_permission()?;
        if key == VirtualKeyCode::Unknown {
            return Err(BackendError::InvalidKeyCode(key));
        }
        self.events.lock().push(InputEvent::Key { key, pressed });
        Ok(())
    }

    fn capabilities(&self) -> BackendCapabilities {
        self.capabilities
    }

    fn cursor_position(&self) -> BackendResult<Point> {
        let (x, y) = *self.os_position.lock();
        Ok(Point::new(f64::from(x), f64::from(y)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_records_events_in_order() {
        let backend = MockBackend::default();
        backend.move_to(Point::new(10.25, 3.75)).unwrap();
        backend.set_button(MouseButton::Left, true).unwrap();
        backend
            .dispatch(&InputEvent::key_down(VirtualKeyCode::A))
            .unwrap();

        assert_eq!(
            backend.events(),
            vec![
                InputEvent::MouseMove(Point::new(10.25, 3.75)),
                InputEvent::button_down(MouseButton::Left),
                InputEvent::key_down(VirtualKeyCode::A),
            ]
        );
        assert_eq!(backend.non_move_events().len(), 2);
    }

    #[test]
    fn test_os_position_is_rounded() {
        let backend = MockBackend::new(Point::new(0.4, 0.6));
        assert_eq!(backend.cursor_position().unwrap(), Point::new(0.0, 1.0));

        backend.move_to(Point::new(99.5, 20.2)).unwrap();
        assert_eq!(backend.os_position(), (100, 20));
    }

    #[test]
    fn test_permission_denied_is_reported() {
        let backend = MockBackend::default();
        backend.set_permission(false);
        assert_eq!(
            backend.move_to(Point::new(1.0, 1.0)),
            Err(BackendError::PermissionDenied)
        );
        assert_eq!(
            backend.set_key(VirtualKeyCode::A, true),
            Err(BackendError::PermissionDenied)
        );
        assert!(backend.events().is_empty());

        backend.restore();
        assert!(backend.move_to(Point::new(1.0, 1.0)).is_ok());
    }

    #[test]
    fn test_scripted_move_failure() {
        let backend = MockBackend::default();
        backend.fail_moves_from(2, BackendError::PermissionDenied);

        assert!(backend.move_to(Point::new(1.0, 0.0)).is_ok());
        assert!(backend.move_to(Point::new(2.0, 0.0)).is_ok());
        assert_eq!(
            backend.move_to(Point::new(3.0, 0.0)),
            Err(BackendError::PermissionDenied)
        );
        assert_eq!(backend.move_attempts(), 3);
        assert_eq!(backend.events().len(), 2);
    }

    #[test]
    fn test_move_hook_sees_index() {
        let backend = MockBackend::default();
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = seen.clone();
        backend.set_move_hook(move |index, point| sink.lock().push((index, point)));

        backend.move_to(Point::new(5.0, 5.0)).unwrap();
        backend.move_to(Point::new(6.0, 5.0)).unwrap();

        assert_eq!(
            *seen.lock(),
            vec![(0, Point::new(5.0, 5.0)), (1, Point::new(6.0, 5.0))]
        );
    }

    #[test]
    fn test_unknown_key_rejected() {
        let backend = MockBackend::default();
        assert_eq!(
            backend.set_key(VirtualKeyCode::Unknown, true),
            Err(BackendError::InvalidKeyCode(VirtualKeyCode::Unknown))
        );
        assert!(backend.events().is_empty());
    }
}
