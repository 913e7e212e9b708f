//! Output dead zone
//!
//! Decides the value actually transmitted for each axis.

use crate::config::MapperConfig;
use crate::joystick::{AxisId, AXIS_CENTER};
use crate::state::AxisState;

/// Hold `value` at center while it is within `dead_zone` of it
pub fn apply_dead_zone(value: i32, dead_zone: u32) -> i32 {
    if (value - AXIS_CENTER).unsigned_abs() < dead_zone {
        AXIS_CENTER
    } else {
        value
    }
}

/// Values to transmit for the current state
pub fn output_values(state: &AxisState, config: &MapperConfig) -> [(AxisId, i32); 2] {
    let x = apply_dead_zone(state.x(), config.dead_zone);
    let y = if config.vertical_movement_enabled {
        apply_dead_zone(state.y(), config.dead_zone)
    } else {
        AXIS_CENTER
    };
    [(AxisId::X, x), (AxisId::Y, y)]
}
