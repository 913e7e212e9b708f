//! Joystickify: mouse-to-joystick mapper
//!
//! Turns relative pointer motion into the X/Y axes of a virtual uinput
//! joystick. A hotkey toggles emulation; while disabled the axes drift back
//! to center.

pub mod config;
pub mod deadzone;
pub mod decay;
pub mod error;
pub mod hotkey;
pub mod input;
pub mod joystick;
pub mod logging;
pub mod mapper;
pub mod state;
pub mod toggle;
pub mod transform;

pub use config::MapperConfig;
pub use error::{ConfigError, InputError, MapperError};
pub use joystick::{
    AxisId, AxisSink, JoystickError, VirtualJoystick, AXIS_CENTER, AXIS_MAX, AXIS_MIN,
};
pub use mapper::Mapper;
pub use state::{AxisState, PointerSample};
pub use toggle::EmulationState;
