//! Windows input injection using SendInput

use input_types::{MouseButton, Point, VirtualKeyCode};
use tracing::{debug, info};
use windows::Win32::Foundation::{ERROR_ACCESS_DENIED, POINT};
use windows::Win32::UI::Input::KeyboardAndMouse::{
    INPUT, INPUT_0, INPUT_KEYBOARD, INPUT_MOUSE, KEYBD_EVENT_FLAGS, KEYBDINPUT,
    KEYEVENTF_EXTENDEDKEY, KEYEVENTF_KEYUP, MOUSE_EVENT_FLAGS, MOUSEEVENTF_ABSOLUTE,
    MOUSEEVENTF_LEFTDOWN, MOUSEEVENTF_LEFTUP, MOUSEEVENTF_MIDDLEDOWN, MOUSEEVENTF_MIDDLEUP,
    MOUSEEVENTF_MOVE, MOUSEEVENTF_RIGHTDOWN, MOUSEEVENTF_RIGHTUP, MOUSEEVENTF_VIRTUALDESK,
    MOUSEEVENTF_XDOWN, MOUSEEVENTF_XUP, MOUSEINPUT, SendInput, VIRTUAL_KEY,
};
use windows::Win32::UI::WindowsAndMessaging::{
    GetCursorPos, GetSystemMetrics, SM_CXVIRTUALSCREEN, SM_CYVIRTUALSCREEN, SM_XVIRTUALSCREEN,
    SM_YVIRTUALSCREEN,
};

use crate::{BackendCapabilities, BackendError, BackendResult, InputBackend};

const XBUTTON1: u32 = 0x0001;
const XBUTTON2: u32 = 0x0002;

/// Absolute coordinates are normalized to 0..=65535 across the virtual desktop
const NORMALIZED_MAX: f64 = 65535.0;

/// Virtual desktop rectangle spanning every monitor
#[derive(Debug, Clone, Copy)]
struct VirtualDesktop {
    left: f64,
    top: f64,
    width: f64,
    height: f64,
}

impl VirtualDesktop {
    fn query() -> BackendResult<Self> {
        let (left, top, width, height) = unsafe {
            (
                GetSystemMetrics(SM_XVIRTUALSCREEN),
                GetSystemMetrics(SM_YVIRTUALSCREEN),
                GetSystemMetrics(SM_CXVIRTUALSCREEN),
                GetSystemMetrics(SM_CYVIRTUALSCREEN),
            )
        };
        if width <= 1 || height <= 1 {
            return Err(BackendError::Platform(format!(
                "Invalid virtual desktop size {width}x{height}"
            )));
        }
        Ok(Self {
            left: f64::from(left),
            top: f64::from(top),
            width: f64::from(width),
            height: f64::from(height),
        })
    }

    /// Map a screen point onto the normalized SendInput grid
    fn normalize(&self, point: Point) -> (i32, i32) {
        let nx = (point.x - self.left) * NORMALIZED_MAX / (self.width - 1.0);
        let ny = (point.y - self.top) * NORMALIZED_MAX / (self.height - 1.0);
        (
            nx.round().clamp(0.0, NORMALIZED_MAX) as i32,
            ny.round().clamp(0.0, NORMALIZED_MAX) as i32,
        )
    }
}

/// Windows backend built on `SendInput`
pub struct WindowsBackend {
    desktop: VirtualDesktop,
}

impl WindowsBackend {
    pub fn new() -> BackendResult<Self> {
        info!("Initializing Windows input backend");
        let desktop = VirtualDesktop::query()?;
        debug!("Virtual desktop: {:?}", desktop);
        Ok(Self { desktop })
    }

    fn send(&self, input: INPUT) -> BackendResult<()> {
        let sent = unsafe { SendInput(&[input], std::mem::size_of::<INPUT>() as i32) };
        if sent == 1 {
            return Ok(());
        }

        let err = windows::core::Error::from_win32();
        if err.code() == ERROR_ACCESS_DENIED.to_hresult() {
            Err(BackendError::PermissionDenied)
        } else {
            Err(BackendError::InjectionFailed(err.to_string()))
        }
    }

    fn mouse_input(dx: i32, dy: i32, data: u32, flags: MOUSE_EVENT_FLAGS) -> INPUT {
        INPUT {
            r#type: INPUT_MOUSE,
            Anonymous: INPUT_0 {
                mi: MOUSEINPUT {
                    dx,
                    dy,
                    mouseData: data as _,
                    dwFlags: flags,
                    time: 0,
                    dwExtraInfo: 0,
                },
            },
        }
    }

    fn button_flags(button: MouseButton, pressed: bool) -> (MOUSE_EVENT_FLAGS, u32) {
        match (button, pressed) {
            (MouseButton::Left, true) => (MOUSEEVENTF_LEFTDOWN, 0),
            (MouseButton::Left, false) => (MOUSEEVENTF_LEFTUP, 0),
            (MouseButton::Right, true) => (MOUSEEVENTF_RIGHTDOWN, 0),
            (MouseButton::Right, false) => (MOUSEEVENTF_RIGHTUP, 0),
            (MouseButton::Middle, true) => (MOUSEEVENTF_MIDDLEDOWN, 0),
            (MouseButton::Middle, false) => (MOUSEEVENTF_MIDDLEUP, 0),
            (MouseButton::Back, true) => (MOUSEEVENTF_XDOWN, XBUTTON1),
            (MouseButton::Back, false) => (MOUSEEVENTF_XUP, XBUTTON1),
            (MouseButton::Forward, true) => (MOUSEEVENTF_XDOWN, XBUTTON2),
            (MouseButton::Forward, false) => (MOUSEEVENTF_XUP, XBUTTON2),
        }
    }

    /// Windows virtual-key code plus whether the key needs the extended flag
    fn to_windows_vk(key: VirtualKeyCode) -> Option<(u16, bool)> {
        use VirtualKeyCode as K;

        let letter_base = K::A as u16;
        let code = match key {
            K::A | K::B | K::C | K::D | K::E | K::F | K::G | K::H | K::I | K::J | K::K | K::L
            | K::M | K::N | K::O | K::P | K::Q | K::R | K::S | K::T | K::U | K::V | K::W | K::X
            | K::Y | K::Z => (0x41 + (key as u16 - letter_base), false),
            K::Num0 => (0x30, false),
            K::Num1 | K::Num2 | K::Num3 | K::Num4 | K::Num5 | K::Num6 | K::Num7 | K::Num8
            | K::Num9 => (0x31 + (key as u16 - K::Num1 as u16), false),
            K::F1 | K::F2 | K::F3 | K::F4 | K::F5 | K::F6 | K::F7 | K::F8 | K::F9 | K::F10
            | K::F11 | K::F12 => (0x70 + (key as u16 - K::F1 as u16), false),
            K::Numpad0 => (0x60, false),
            K::Numpad1 | K::Numpad2 | K::Numpad3 | K::Numpad4 | K::Numpad5 | K::Numpad6
            | K::Numpad7 | K::Numpad8 | K::Numpad9 => (0x61 + (key as u16 - K::Numpad1 as u16), false),
            K::Escape => (0x1B, false),
            K::Tab => (0x09, false),
            K::CapsLock => (0x14, false),
            K::Shift => (0x10, false),
            K::Control => (0x11, false),
            K::Alt => (0x12, false),
            K::Meta => (0x5B, true),
            K::Space => (0x20, false),
            K::Enter => (0x0D, false),
            K::Backspace => (0x08, false),
            K::Delete => (0x2E, true),
            K::Insert => (0x2D, true),
            K::Home => (0x24, true),
            K::End => (0x23, true),
            K::PageUp => (0x21, true),
            K::PageDown => (0x22, true),
            K::Left => (0x25, true),
            K::Up => (0x26, true),
            K::Right => (0x27, true),
            K::Down => (0x28, true),
            K::Minus => (0xBD, false),
            K::Equal => (0xBB, false),
            K::LeftBracket => (0xDB, false),
            K::RightBracket => (0xDD, false),
            K::Backslash => (0xDC, false),
            K::Semicolon => (0xBA, false),
            K::Quote => (0xDE, false),
            K::Grave => (0xC0, false),
            K::Comma => (0xBC, false),
            K::Period => (0xBE, false),
            K::Slash => (0xBF, false),
            K::NumpadDivide => (0x6F, true),
            K::NumpadMultiply => (0x6A, false),
            K::NumpadSubtract => (0x6D, false),
            K::NumpadAdd => (0x6B, false),
            K::NumpadEnter => (0x0D, true),
            K::NumpadDecimal => (0x6E, false),
            K::PrintScreen => (0x2C, true),
            K::ScrollLock => (0x91, false),
            K::Pause => (0x13, false),
            K::NumLock => (0x90, true),
            K::Unknown => return None,
        };
        Some(code)
    }
}

impl InputBackend for WindowsBackend {
    fn has_permission(&self) -> bool {
        // UIPI refusals only show up as SendInput failures
        true
    }

    fn move_to(&self, point: Point) -> BackendResult<()> {
        if !point.is_finite() {
            return Err(BackendError::InvalidCoordinates {
                x: point.x,
                y: point.y,
            });
        }
        let (nx, ny) = self.desktop.normalize(point);
        self.send(Self::mouse_input(
            nx,
            ny,
            0,
            MOUSEEVENTF_MOVE | MOUSEEVENTF_ABSOLUTE | MOUSEEVENTF_VIRTUALDESK,
        ))
    }

    fn set_button(&self, button: MouseButton, pressed: bool) -> BackendResult<()> {
        let (flags, data) = Self::button_flags(button, pressed);
        self.send(Self::mouse_input(0, 0, data, flags))
    }

    fn set_key(&self, key: VirtualKeyCode, pressed: bool) -> BackendResult<()> {
        let (vk, extended) = Self::to_windows_vk(key).ok_or(BackendError::InvalidKeyCode(key))?;

        let mut flags = KEYBD_EVENT_FLAGS(0);
        if extended {
            flags |= KEYEVENTF_EXTENDEDKEY;
        }
        if !pressed {
            flags |= KEYEVENTF_KEYUP;
        }

        self.send(INPUT {
            r#type: INPUT_KEYBOARD,
            Anonymous: INPUT_0 {
                ki: KEYBDINPUT {
                    wVk: VIRTUAL_KEY(vk),
                    wScan: 0,
                    dwFlags: flags,
                    time: 0,
                    dwExtraInfo: 0,
                },
            },
        })
    }

    fn capabilities(&self) -> BackendCapabilities {
        BackendCapabilities {
            absolute_positioning: true,
            relative_positioning: true,
            sub_pixel_positioning: false,
            max_simultaneous_keys: None,
        }
    }

    fn cursor_position(&self) -> BackendResult<Point> {
        let mut point = POINT::default();
        unsafe { GetCursorPos(&mut point) }
            .map_err(|e| BackendError::Platform(format!("GetCursorPos failed: {e}")))?;
        Ok(Point::new(f64::from(point.x), f64::from(point.y)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_virtual_key_mapping() {
        assert_eq!(WindowsBackend::to_windows_vk(VirtualKeyCode::A), Some((0x41, false)));
        assert_eq!(WindowsBackend::to_windows_vk(VirtualKeyCode::Z), Some((0x5A, false)));
        assert_eq!(WindowsBackend::to_windows_vk(VirtualKeyCode::Num9), Some((0x39, false)));
        assert_eq!(WindowsBackend::to_windows_vk(VirtualKeyCode::F12), Some((0x7B, false)));
        assert_eq!(WindowsBackend::to_windows_vk(VirtualKeyCode::Numpad9), Some((0x69, false)));
        assert_eq!(WindowsBackend::to_windows_vk(VirtualKeyCode::Left), Some((0x25, true)));
        assert_eq!(WindowsBackend::to_windows_vk(VirtualKeyCode::Unknown), None);
    }

    #[test]
    fn test_normalize_spans_virtual_desktop() {
        let desktop = VirtualDesktop {
            left: -1920.0,
            top: 0.0,
            width: 3840.0,
            height: 1080.0,
        };
        assert_eq!(desktop.normalize(Point::new(-1920.0, 0.0)), (0, 0));
        assert_eq!(desktop.normalize(Point::new(1919.0, 1079.0)), (65535, 65535));
        assert_eq!(desktop.normalize(Point::new(1e9, -1e9)), (65535, 0));
    }
}
