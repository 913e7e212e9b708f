//! Emulation on/off state and the hotkey that flips it

use evdev::Key;
use std::sync::atomic::{AtomicBool, Ordering};
use tracing::info;

/// evdev `EV_KEY` value for a fresh press (0 is release, 2 is autorepeat)
pub const KEY_PRESS: i32 = 1;

/// Whether pointer motion currently drives the joystick
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EmulationState {
    Enabled,
    Disabled,
}

impl EmulationState {
    pub fn as_str(&self) -> &'static str {
        match self {
            EmulationState::Enabled => "enabled",
            EmulationState::Disabled => "disabled",
        }
    }
}

/// Tracks the emulation flag; starts enabled
///
/// The flag is read without the axis lock, so a move racing a toggle may be
/// processed under either state.
pub struct ToggleController {
    hotkey: Key,
    enabled: AtomicBool,
}

impl ToggleController {
    pub fn new(hotkey: Key) -> Self {
        Self {
            hotkey,
            enabled: AtomicBool::new(true),
        }
    }

    pub fn hotkey(&self) -> Key {
        self.hotkey
    }

    pub fn state(&self) -> EmulationState {
        if self.enabled.load(Ordering::Acquire) {
            EmulationState::Enabled
        } else {
            EmulationState::Disabled
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.state() == EmulationState::Enabled
    }

    /// React to a key event, returning the new state if it toggled
    pub fn handle_key(&self, key: Key, value: i32) -> Option<EmulationState> {
        if key != self.hotkey || value != KEY_PRESS {
            return None;
        }
        let was_enabled = self.enabled.fetch_xor(true, Ordering::AcqRel);
        let state = if was_enabled {
            EmulationState::Disabled
        } else {
            EmulationState::Enabled
        };
        info!("Joystick emulation {}", state.as_str());
        Some(state)
    }
}
