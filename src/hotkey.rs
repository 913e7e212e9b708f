//! Hotkey name parsing
//!
//! Maps the `toggle_hotkey` config string to the evdev key code the
//! keyboard reader compares against.

use crate::error::ConfigError;
use evdev::Key;

const LETTERS: [Key; 26] = [
    Key::KEY_A,
    Key::KEY_B,
    Key::KEY_C,
    Key::KEY_D,
    Key::KEY_E,
    Key::KEY_F,
    Key::KEY_G,
    Key::KEY_H,
    Key::KEY_I,
    Key::KEY_J,
    Key::KEY_K,
    Key::KEY_L,
    Key::KEY_M,
    Key::KEY_N,
    Key::KEY_O,
    Key::KEY_P,
    Key::KEY_Q,
    Key::KEY_R,
    Key::KEY_S,
    Key::KEY_T,
    Key::KEY_U,
    Key::KEY_V,
    Key::KEY_W,
    Key::KEY_X,
    Key::KEY_Y,
    Key::KEY_Z,
];

const DIGITS: [Key; 10] = [
    Key::KEY_0,
    Key::KEY_1,
    Key::KEY_2,
    Key::KEY_3,
    Key::KEY_4,
    Key::KEY_5,
    Key::KEY_6,
    Key::KEY_7,
    Key::KEY_8,
    Key::KEY_9,
];

/// Parse a hotkey name such as `"F8"`, `"esc"` or `"k"` (case-insensitive)
pub fn parse_hotkey(name: &str) -> Result<Key, ConfigError> {
    let normalized = name.trim().to_ascii_uppercase();

    let named = match normalized.as_str() {
        "F1" => Some(Key::KEY_F1),
        "F2" => Some(Key::KEY_F2),
        "F3" => Some(Key::KEY_F3),
        "F4" => Some(Key::KEY_F4),
        "F5" => Some(Key::KEY_F5),
        "F6" => Some(Key::KEY_F6),
        "F7" => Some(Key::KEY_F7),
        "F8" => Some(Key::KEY_F8),
        "F9" => Some(Key::KEY_F9),
        "F10" => Some(Key::KEY_F10),
        "F11" => Some(Key::KEY_F11),
        "F12" => Some(Key::KEY_F12),
        "ESC" | "ESCAPE" => Some(Key::KEY_ESC),
        "TAB" => Some(Key::KEY_TAB),
        "SHIFT" => Some(Key::KEY_LEFTSHIFT),
        "CTRL" | "CONTROL" => Some(Key::KEY_LEFTCTRL),
        "ALT" => Some(Key::KEY_LEFTALT),
        "SPACE" => Some(Key::KEY_SPACE),
        _ => None,
    };
    if let Some(key) = named {
        return Ok(key);
    }

    let mut chars = normalized.chars();
    match (chars.next(), chars.next()) {
        (Some(c @ 'A'..='Z'), None) => Ok(LETTERS[(c as u8 - b'A') as usize]),
        (Some(c @ '0'..='9'), None) => Ok(DIGITS[(c as u8 - b'0') as usize]),
        _ => Err(ConfigError::UnknownHotkey(name.to_string())),
    }
}
