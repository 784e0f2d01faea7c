//! macOS input injection using CGEvent

use core_graphics::display::CGPoint;
use core_graphics::event::{CGEvent, CGEventTapLocation, CGEventType, CGKeyCode, CGMouseButton};
use core_graphics::event_source::{CGEventSource, CGEventSourceStateID};
use input_types::{MouseButton, Point, VirtualKeyCode};
use parking_lot::Mutex;
use tracing::{debug, info, warn};

use crate::{BackendCapabilities, BackendError, BackendResult, InputBackend};

/// macOS backend posting Core Graphics events at the HID tap
pub struct MacOSBackend {
    last_pos: Mutex<CGPoint>,
    held_button: Mutex<Option<MouseButton>>,
}

impl MacOSBackend {
    pub fn new() -> BackendResult<Self> {
        info!("Initializing macOS input backend");

        let start = Self::query_location()?;
        if !unsafe { AXIsProcessTrusted() } {
            warn!("Process is not trusted for accessibility, injection will be refused");
        }

        Ok(Self {
            last_pos: Mutex::new(start),
            held_button: Mutex::new(None),
        })
    }

    fn event_source() -> BackendResult<CGEventSource> {
        CGEventSource::new(CGEventSourceStateID::HIDSystemState)
            .map_err(|_| BackendError::Platform("Failed to create event source".into()))
    }

    fn query_location() -> BackendResult<CGPoint> {
        let event = CGEvent::new(Self::event_source()?)
            .map_err(|_| BackendError::Platform("Failed to create event".into()))?;
        Ok(event.location())
    }

    fn ensure_permission(&self) -> BackendResult<()> {
        if self.has_permission() {
            Ok(())
        } else {
            Err(BackendError::PermissionDenied)
        }
    }

    fn cg_button(button: MouseButton) -> CGMouseButton {
        match button {
            MouseButton::Left => CGMouseButton::Left,
            MouseButton::Right => CGMouseButton::Right,
            _ => CGMouseButton::Center,
        }
    }

    fn button_event_type(button: MouseButton, pressed: bool) -> CGEventType {
        match (button, pressed) {
            (MouseButton::Left, true) => CGEventType::LeftMouseDown,
            (MouseButton::Left, false) => CGEventType::LeftMouseUp,
            (MouseButton::Right, true) => CGEventType::RightMouseDown,
            (MouseButton::Right, false) => CGEventType::RightMouseUp,
            (_, true) => CGEventType::OtherMouseDown,
            (_, false) => CGEventType::OtherMouseUp,
        }
    }

    /// Moves while a button is held must be drag events or apps ignore them
    fn move_event_type(held: Option<MouseButton>) -> (CGEventType, CGMouseButton) {
        match held {
            None => (CGEventType::MouseMoved, CGMouseButton::Left),
            Some(MouseButton::Left) => (CGEventType::LeftMouseDragged, CGMouseButton::Left),
            Some(MouseButton::Right) => (CGEventType::RightMouseDragged, CGMouseButton::Right),
            Some(other) => (CGEventType::OtherMouseDragged, Self::cg_button(other)),
        }
    }

    fn to_macos_keycode(key: VirtualKeyCode) -> Option<CGKeyCode> {
        let code = match key {
            VirtualKeyCode::A => 0x00,
            VirtualKeyCode::S => 0x01,
            VirtualKeyCode::D => 0x02,
            VirtualKeyCode::F => 0x03,
            VirtualKeyCode::H => 0x04,
            VirtualKeyCode::G => 0x05,
            VirtualKeyCode::Z => 0x06,
            VirtualKeyCode::X => 0x07,
            VirtualKeyCode::C => 0x08,
            VirtualKeyCode::V => 0x09,
            VirtualKeyCode::B => 0x0B,
            VirtualKeyCode::Q => 0x0C,
            VirtualKeyCode::W => 0x0D,
            VirtualKeyCode::E => 0x0E,
            VirtualKeyCode::R => 0x0F,
            VirtualKeyCode::Y => 0x10,
            VirtualKeyCode::T => 0x11,
            VirtualKeyCode::Num1 => 0x12,
            VirtualKeyCode::Num2 => 0x13,
            VirtualKeyCode::Num3 => 0x14,
            VirtualKeyCode::Num4 => 0x15,
            VirtualKeyCode::Num6 => 0x16,
            VirtualKeyCode::Num5 => 0x17,
            VirtualKeyCode::Equal => 0x18,
            VirtualKeyCode::Num9 => 0x19,
            VirtualKeyCode::Num7 => 0x1A,
            VirtualKeyCode::Minus => 0x1B,
            VirtualKeyCode::Num8 => 0x1C,
            VirtualKeyCode::Num0 => 0x1D,
            VirtualKeyCode::RightBracket => 0x1E,
            VirtualKeyCode::O => 0x1F,
            VirtualKeyCode::U => 0x20,
            VirtualKeyCode::LeftBracket => 0x21,
            VirtualKeyCode::I => 0x22,
            VirtualKeyCode::P => 0x23,
            VirtualKeyCode::Enter => 0x24,
            VirtualKeyCode::L => 0x25,
            VirtualKeyCode::J => 0x26,
            VirtualKeyCode::Quote => 0x27,
            VirtualKeyCode::K => 0x28,
            VirtualKeyCode::Semicolon => 0x29,
            VirtualKeyCode::Backslash => 0x2A,
            VirtualKeyCode::Comma => 0x2B,
            VirtualKeyCode::Slash => 0x2C,
            VirtualKeyCode::N => 0x2D,
            VirtualKeyCode::M => 0x2E,
            VirtualKeyCode::Period => 0x2F,
            VirtualKeyCode::Tab => 0x30,
            VirtualKeyCode::Space => 0x31,
            VirtualKeyCode::Grave => 0x32,
            VirtualKeyCode::Backspace => 0x33,
            VirtualKeyCode::Escape => 0x35,
            VirtualKeyCode::Meta => 0x37,
            VirtualKeyCode::Shift => 0x38,
            VirtualKeyCode::CapsLock => 0x39,
            VirtualKeyCode::Alt => 0x3A,
            VirtualKeyCode::Control => 0x3B,
            VirtualKeyCode::NumpadDecimal => 0x41,
            VirtualKeyCode::NumpadMultiply => 0x43,
            VirtualKeyCode::NumpadAdd => 0x45,
            VirtualKeyCode::NumLock => 0x47,
            VirtualKeyCode::NumpadDivide => 0x4B,
            VirtualKeyCode::NumpadEnter => 0x4C,
            VirtualKeyCode::NumpadSubtract => 0x4E,
            VirtualKeyCode::Numpad0 => 0x52,
            VirtualKeyCode::Numpad1 => 0x53,
            VirtualKeyCode::Numpad2 => 0x54,
            VirtualKeyCode::Numpad3 => 0x55,
            VirtualKeyCode::Numpad4 => 0x56,
            VirtualKeyCode::Numpad5 => 0x57,
            VirtualKeyCode::Numpad6 => 0x58,
            VirtualKeyCode::Numpad7 => 0x59,
            VirtualKeyCode::Numpad8 => 0x5B,
            VirtualKeyCode::Numpad9 => 0x5C,
            VirtualKeyCode::F5 => 0x60,
            VirtualKeyCode::F6 => 0x61,
            VirtualKeyCode::F7 => 0x62,
            VirtualKeyCode::F3 => 0x63,
            VirtualKeyCode::F8 => 0x64,
            VirtualKeyCode::F9 => 0x65,
            VirtualKeyCode::F11 => 0x67,
            VirtualKeyCode::PrintScreen => 0x69, // F13
            VirtualKeyCode::ScrollLock => 0x6B,  // F14
            VirtualKeyCode::F10 => 0x6D,
            VirtualKeyCode::F12 => 0x6F,
            VirtualKeyCode::Pause => 0x71, // F15
            VirtualKeyCode::Insert => 0x72, // Help
            VirtualKeyCode::Home => 0x73,
            VirtualKeyCode::PageUp => 0x74,
            VirtualKeyCode::Delete => 0x75,
            VirtualKeyCode::F4 => 0x76,
            VirtualKeyCode::End => 0x77,
            VirtualKeyCode::F2 => 0x78,
            VirtualKeyCode::PageDown => 0x79,
            VirtualKeyCode::F1 => 0x7A,
            VirtualKeyCode::Left => 0x7B,
            VirtualKeyCode::Right => 0x7C,
            VirtualKeyCode::Down => 0x7D,
            VirtualKeyCode::Up => 0x7E,
            VirtualKeyCode::Unknown => return None,
        };
        Some(code)
    }
}

impl InputBackend for MacOSBackend {
    fn has_permission(&self) -> bool {
        unsafe { AXIsProcessTrusted() }
    }

    fn move_to(&self, point: Point) -> BackendResult<()> {
        self.ensure_permission()?;

        let target = CGPoint::new(point.x, point.y);
        let (event_type, button) = Self::move_event_type(*self.held_button.lock());
        let event = CGEvent::new_mouse_event(Self::event_source()?, event_type, target, button)
            .map_err(|_| BackendError::InjectionFailed("Failed to create mouse event".into()))?;

        event.post(CGEventTapLocation::HID);
        *self.last_pos.lock() = target;
        Ok(())
    }

    fn set_button(&self, button: MouseButton, pressed: bool) -> BackendResult<()> {
        self.ensure_permission()?;

        let location = *self.last_pos.lock();
        let event = CGEvent::new_mouse_event(
            Self::event_source()?,
            Self::button_event_type(button, pressed),
            location,
            Self::cg_button(button),
        )
        .map_err(|_| BackendError::InjectionFailed("Failed to create button event".into()))?;

        event.post(CGEventTapLocation::HID);

        let mut held = self.held_button.lock();
        if pressed {
            *held = Some(button);
        } else if *held == Some(button) {
            *held = None;
        }
        debug!("Posted {:?} {}", button, if pressed { "down" } else { "up" });
        Ok(())
    }

    fn set_key(&self, key: VirtualKeyCode, pressed: bool) -> BackendResult<()> {
        self.ensure_permission()?;

        let keycode = Self::to_macos_keycode(key).ok_or(BackendError::InvalidKeyCode(key))?;
        let event = CGEvent::new_keyboard_event(Self::event_source()?, keycode, pressed)
            .map_err(|_| BackendError::InjectionFailed("Failed to create keyboard event".into()))?;

        event.post(CGEventTapLocation::HID);
        Ok(())
    }

    fn capabilities(&self) -> BackendCapabilities {
        BackendCapabilities {
            absolute_positioning: true,
            relative_positioning: false,
            sub_pixel_positioning: true,
            max_simultaneous_keys: None,
        }
    }

    fn cursor_position(&self) -> BackendResult<Point> {
        let location = Self::query_location()?;
        Ok(Point::new(location.x, location.y))
    }
}

#[link(name = "ApplicationServices", kind = "framework")]
unsafe extern "C" {
    fn AXIsProcessTrusted() -> bool;
}
