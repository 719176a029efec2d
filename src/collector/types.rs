//! Raw input event types delivered by the platform collectors.
//!
//! These are the values a hook callback hands to the core: the key identity
//! for keyboard transitions, and button/position or wheel-delta information
//! for mouse transitions. The core decides what becomes a logged event.

use std::fmt;

/// Identity of a pressed key as reported by a platform hook.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum KeyInput {
    /// A key that produces a printable character (reference US layout).
    Char(char),
    /// A non-character key with a stable textual name (modifiers,
    /// function keys, navigation keys, ...).
    Named(&'static str),
    /// A key code the platform mapping does not recognize.
    Unknown(u32),
}

/// Mouse button identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MouseButton {
    Left,
    Right,
    Middle,
    /// Extra buttons (side/thumb buttons), by platform index.
    Other(u8),
}

impl fmt::Display for MouseButton {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MouseButton::Left => write!(f, "Left"),
            MouseButton::Right => write!(f, "Right"),
            MouseButton::Middle => write!(f, "Middle"),
            MouseButton::Other(n) => write!(f, "Other({n})"),
        }
    }
}

/// A single raw input event, as delivered by a collector.
///
/// Collectors invoke this contract at most once per physical event, from
/// their own threads, with no ordering guarantee across sources.
#[derive(Debug, Clone, PartialEq)]
pub enum RawInput {
    /// A key press transition. Key releases are never delivered.
    Key(KeyInput),
    /// A mouse button transition at screen position `(x, y)`.
    /// `pressed` is true for the down edge, false for the release.
    Button {
        x: i32,
        y: i32,
        button: MouseButton,
        pressed: bool,
    },
    /// A mouse wheel motion at screen position `(x, y)`. Only the signs of
    /// the deltas are meaningful: `delta_y > 0` means the wheel moved up.
    Wheel {
        x: i32,
        y: i32,
        delta_x: i32,
        delta_y: i32,
    },
}

impl RawInput {
    /// A character-producing key press.
    pub fn key_char(c: char) -> Self {
        RawInput::Key(KeyInput::Char(c))
    }

    /// A named non-character key press.
    pub fn key_named(name: &'static str) -> Self {
        RawInput::Key(KeyInput::Named(name))
    }

    /// A button press edge.
    pub fn button_down(x: i32, y: i32, button: MouseButton) -> Self {
        RawInput::Button {
            x,
            y,
            button,
            pressed: true,
        }
    }

    /// A button release edge.
    pub fn button_up(x: i32, y: i32, button: MouseButton) -> Self {
        RawInput::Button {
            x,
            y,
            button,
            pressed: false,
        }
    }

    /// A vertical wheel motion; positive `delta_y` scrolls up.
    pub fn wheel(x: i32, y: i32, delta_x: i32, delta_y: i32) -> Self {
        RawInput::Wheel {
            x,
            y,
            delta_x,
            delta_y,
        }
    }
}
