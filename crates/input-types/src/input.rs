//! Input event definitions for keyboard and mouse

use serde::{Deserialize, Serialize};

use crate::Point;

/// Mouse button type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum MouseButton {
    Left,
    Right,
    Middle,
    Back,
    Forward,
}

/// Modifier keys held during a chord
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct KeyModifiers {
    pub shift: bool,
    pub ctrl: bool,
    pub alt: bool,
    pub meta: bool, // Command on macOS, Windows key on Windows
}

impl KeyModifiers {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_shift(mut self) -> Self {
        self.shift = true;
        self
    }

    pub fn with_ctrl(mut self) -> Self {
        self.ctrl = true;
        self
    }

    pub fn with_alt(mut self) -> Self {
        self.alt = true;
        self
    }

    pub fn with_meta(mut self) -> Self {
        self.meta = true;
        self
    }

    pub fn is_empty(&self) -> bool {
        !(self.shift || self.ctrl || self.alt || self.meta)
    }

    /// Modifier keys in press order (ctrl, alt, shift, meta)
    pub fn keys(&self) -> Vec<VirtualKeyCode> {
        [
            (self.ctrl, VirtualKeyCode::Control),
            (self.alt, VirtualKeyCode::Alt),
            (self.shift, VirtualKeyCode::Shift),
            (self.meta, VirtualKeyCode::Meta),
        ]
        .into_iter()
        .filter_map(|(held, key)| held.then_some(key))
        .collect()
    }
}

/// Virtual key code (cross-platform, USB HID usage ids)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[repr(u16)]
pub enum VirtualKeyCode {
    // Alphanumeric
    A = 0x0004,
    B = 0x0005,
    C = 0x0006,
    D = 0x0007,
    E = 0x0008,
    F = 0x0009,
    G = 0x000A,
    H = 0x000B,
    I = 0x000C,
    J = 0x000D,
    K = 0x000E,
    L = 0x000F,
    M = 0x0010,
    N = 0x0011,
    O = 0x0012,
    P = 0x0013,
    Q = 0x0014,
    R = 0x0015,
    S = 0x0016,
    T = 0x0017,
    U = 0x0018,
    V = 0x0019,
    W = 0x001A,
    X = 0x001B,
    Y = 0x001C,
    Z = 0x001D,

    // Numbers
    Num1 = 0x001E,
    Num2 = 0x001F,
    Num3 = 0x0020,
    Num4 = 0x0021,
    Num5 = 0x0022,
    Num6 = 0x0023,
    Num7 = 0x0024,
    Num8 = 0x0025,
    Num9 = 0x0026,
    Num0 = 0x0027,

    // Function keys
    F1 = 0x003A,
    F2 = 0x003B,
    F3 = 0x003C,
    F4 = 0x003D,
    F5 = 0x003E,
    F6 = 0x003F,
    F7 = 0x0040,
    F8 = 0x0041,
    F9 = 0x0042,
    F10 = 0x0043,
    F11 = 0x0044,
    F12 = 0x0045,

    // Control keys
    Escape = 0x0029,
    Tab = 0x002B,
    CapsLock = 0x0039,
    Shift = 0x00E1,
    Control = 0x00E0,
    Alt = 0x00E2,
    Meta = 0x00E3,
    Space = 0x002C,
    Enter = 0x0028,
    Backspace = 0x002A,
    Delete = 0x004C,
    Insert = 0x0049,
    Home = 0x004A,
    End = 0x004D,
    PageUp = 0x004B,
    PageDown = 0x004E,

    // Arrow keys
    Left = 0x0050,
    Right = 0x004F,
    Up = 0x0052,
    Down = 0x0051,

    // Punctuation
    Minus = 0x002D,
    Equal = 0x002E,
    LeftBracket = 0x002F,
    RightBracket = 0x0030,
    Backslash = 0x0031,
    Semicolon = 0x0033,
    Quote = 0x0034,
    Grave = 0x0035,
    Comma = 0x0036,
    Period = 0x0037,
    Slash = 0x0038,

    // Numpad
    NumpadDivide = 0x0054,
    NumpadMultiply = 0x0055,
    NumpadSubtract = 0x0056,
    NumpadAdd = 0x0057,
    NumpadEnter = 0x0058,
    Numpad1 = 0x0059,
    Numpad2 = 0x005A,
    Numpad3 = 0x005B,
    Numpad4 = 0x005C,
    Numpad5 = 0x005D,
    Numpad6 = 0x005E,
    Numpad7 = 0x005F,
    Numpad8 = 0x0060,
    Numpad9 = 0x0061,
    Numpad0 = 0x0062,
    NumpadDecimal = 0x0063,

    // System keys
    PrintScreen = 0x0046,
    ScrollLock = 0x0047,
    Pause = 0x0048,
    NumLock = 0x0053,

    // Unknown/unmapped
    Unknown = 0xFFFF,
}

impl VirtualKeyCode {
    pub fn is_modifier(self) -> bool {
        matches!(
            self,
            VirtualKeyCode::Shift | VirtualKeyCode::Control | VirtualKeyCode::Alt | VirtualKeyCode::Meta
        )
    }
}

/// One character resolved to a physical key on a US layout
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KeyStroke {
    pub key: VirtualKeyCode,
    pub shift: bool,
}

impl KeyStroke {
    const fn plain(key: VirtualKeyCode) -> Self {
        Self { key, shift: false }
    }

    const fn shifted(key: VirtualKeyCode) -> Self {
        Self { key, shift: true }
    }

    /// Resolve a typed character, `None` if no key produces it
    pub fn from_char(c: char) -> Option<Self> {
        use VirtualKeyCode as K;

        if c.is_ascii_alphabetic() {
            let key = Self::letter(c.to_ascii_lowercase())?;
            return Some(Self {
                key,
                shift: c.is_ascii_uppercase(),
            });
        }

        let stroke = match c {
            '1' => Self::plain(K::Num1),
            '2' => Self::plain(K::Num2),
            '3' => Self::plain(K::Num3),
            '4' => Self::plain(K::Num4),
            '5' => Self::plain(K::Num5),
            '6' => Self::plain(K::Num6),
            '7' => Self::plain(K::Num7),
            '8' => Self::plain(K::Num8),
            '9' => Self::plain(K::Num9),
            '0' => Self::plain(K::Num0),
            '!' => Self::shifted(K::Num1),
            '@' => Self::shifted(K::Num2),
            '#' => Self::shifted(K::Num3),
            '$' => Self::shifted(K::Num4),
            '%' => Self::shifted(K::Num5),
            '^' => Self::shifted(K::Num6),
            '&' => Self::shifted(K::Num7),
            '*' => Self::shifted(K::Num8),
            '(' => Self::shifted(K::Num9),
            ')' => Self::shifted(K::Num0),
            ' ' => Self::plain(K::Space),
            '\n' => Self::plain(K::Enter),
            '\t' => Self::plain(K::Tab),
            '-' => Self::plain(K::Minus),
            '_' => Self::shifted(K::Minus),
            '=' => Self::plain(K::Equal),
            '+' => Self::shifted(K::Equal),
            '[' => Self::plain(K::LeftBracket),
            '{' => Self::shifted(K::LeftBracket),
            ']' => Self::plain(K::RightBracket),
            '}' => Self::shifted(K::RightBracket),
            '\\' => Self::plain(K::Backslash),
            '|' => Self::shifted(K::Backslash),
            ';' => Self::plain(K::Semicolon),
            ':' => Self::shifted(K::Semicolon),
            '\'' => Self::plain(K::Quote),
            '"' => Self::shifted(K::Quote),
            '`' => Self::plain(K::Grave),
            '~' => Self::shifted(K::Grave),
            ',' => Self::plain(K::Comma),
            '<' => Self::shifted(K::Comma),
            '.' => Self::plain(K::Period),
            '>' => Self::shifted(K::Period),
            '/' => Self::plain(K::Slash),
            '?' => Self::shifted(K::Slash),
            _ => return None,
        };
        Some(stroke)
    }

    fn letter(c: char) -> Option<VirtualKeyCode> {
        use VirtualKeyCode as K;
        const LETTERS: [VirtualKeyCode; 26] = [
            K::A, K::B, K::C, K::D, K::E, K::F, K::G, K::H, K::I, K::J, K::K, K::L, K::M,
            K::N, K::O, K::P, K::Q, K::R, K::S, K::T, K::U, K::V, K::W, K::X, K::Y, K::Z,
        ];
        let index = (c as u32).checked_sub('a' as u32)? as usize;
        LETTERS.get(index).copied()
    }
}

/// Input event
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum InputEvent {
    /// Absolute pointer move
    MouseMove(Point),
    /// Mouse button press/release
    MouseButton { button: MouseButton, pressed: bool },
    /// Keyboard key press/release
    Key { key: VirtualKeyCode, pressed: bool },
}

impl InputEvent {
    pub fn key_down(key: VirtualKeyCode) -> Self {
        Self::Key { key, pressed: true }
    }

    pub fn key_up(key: VirtualKeyCode) -> Self {
        Self::Key { key, pressed: false }
    }

    pub fn button_down(button: MouseButton) -> Self {
        Self::MouseButton {
            button,
            pressed: true,
        }
    }

    pub fn button_up(button: MouseButton) -> Self {
        Self::MouseButton {
            button,
            pressed: false,
        }
    }
}
