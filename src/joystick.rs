//! Virtual joystick device using evdev/uinput
//!
//! Creates a virtual gamepad device that appears as a standard joystick
//! to games and applications. Only the X and Y absolute axes are driven.

use evdev::{
    uinput::{VirtualDevice, VirtualDeviceBuilder},
    AbsInfo, AbsoluteAxisType, AttributeSet, BusType, InputEvent, InputId, Key, UinputAbsSetup,
};
use std::collections::HashMap;
use thiserror::Error;

/// Joystick axis value range
pub const AXIS_MIN: i32 = 1;
pub const AXIS_MAX: i32 = 32767;
pub const AXIS_CENTER: i32 = (AXIS_MIN + AXIS_MAX) / 2;

/// Vendor id reported by the virtual device (pid.codes test range)
const VIRTUAL_VENDOR_ID: u16 = 0x1209;

/// Errors from virtual joystick operations
#[derive(Debug, Error)]
pub enum JoystickError {
    #[error("Failed to create virtual device: {0}")]
    CreateDevice(#[source] std::io::Error),
    #[error("Failed to emit event: {0}")]
    EmitEvent(#[source] std::io::Error),
    /// The decay task hit an emit error; the error itself is returned by `Mapper::stop`
    #[error("Decay stopped on an earlier device error")]
    DecayFailed,
}

/// Joystick axis identifiers
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AxisId {
    X,
    Y,
}

impl AxisId {
    /// All driven axis IDs
    pub const ALL: &'static [AxisId] = &[AxisId::X, AxisId::Y];
}

/// Destination for transmitted axis values
///
/// Implemented by [`VirtualJoystick`]; tests substitute a recorder.
pub trait AxisSink: Send {
    /// Write one axis value in `[AXIS_MIN, AXIS_MAX]`
    fn set_axis(&mut self, axis: AxisId, value: i32) -> Result<(), JoystickError>;

    /// Write several axis values as one update
    fn set_axes(&mut self, values: &[(AxisId, i32)]) -> Result<(), JoystickError> {
        for &(axis, value) in values {
            self.set_axis(axis, value)?;
        }
        Ok(())
    }
}

/// Virtual joystick device
pub struct VirtualJoystick {
    device: VirtualDevice,
    /// Current axis values (for change detection)
    axis_values: HashMap<AxisId, i32>,
}

impl VirtualJoystick {
    /// Create a new virtual joystick device
    ///
    /// # Arguments
    /// * `name` - Device name (shown in `evtest` and game controller settings)
    /// * `device_id` - Device number, reported as the product id
    pub fn new(name: &str, device_id: u32) -> Result<Self, JoystickError> {
        let product = u16::try_from(device_id).unwrap_or(u16::MAX);
        let mut builder = VirtualDeviceBuilder::new()
            .map_err(JoystickError::CreateDevice)?
            .name(name)
            .input_id(InputId::new(
                BusType::BUS_VIRTUAL,
                VIRTUAL_VENDOR_ID,
                product,
                1,
            ));

        // Gamepad buttons so SDL and Steam classify the device as a joystick
        let mut keys = AttributeSet::<Key>::new();
        keys.insert(Key::BTN_SOUTH);
        keys.insert(Key::BTN_EAST);
        keys.insert(Key::BTN_NORTH);
        keys.insert(Key::BTN_WEST);
        builder = builder
            .with_keys(&keys)
            .map_err(JoystickError::CreateDevice)?;

        for &axis_id in AxisId::ALL {
            let code = axis_id_to_code(axis_id);
            let abs_setup = UinputAbsSetup::new(
                code,
                AbsInfo::new(AXIS_CENTER, AXIS_MIN, AXIS_MAX, 0, 0, 1),
            );
            builder = builder
                .with_absolute_axis(&abs_setup)
                .map_err(JoystickError::CreateDevice)?;
        }

        let device = builder.build().map_err(JoystickError::CreateDevice)?;

        let axis_values = AxisId::ALL.iter().map(|&id| (id, AXIS_CENTER)).collect();

        Ok(Self {
            device,
            axis_values,
        })
    }

    /// Get the device path (e.g., /dev/input/eventX)
    pub fn device_path(&mut self) -> Option<std::path::PathBuf> {
        self.device
            .enumerate_dev_nodes_blocking()
            .ok()?
            .next()?
            .ok()
    }

    /// Get last transmitted axis value
    pub fn get_axis(&self, axis: AxisId) -> i32 {
        self.axis_values
            .get(&axis)
            .copied()
            .unwrap_or(AXIS_CENTER)
    }

    /// Record `value` and return the event to emit, or `None` if unchanged
    fn stage(&mut self, axis: AxisId, value: i32) -> Option<InputEvent> {
        let clamped = value.clamp(AXIS_MIN, AXIS_MAX);
        if self.axis_values.get(&axis) == Some(&clamped) {
            return None;
        }
        self.axis_values.insert(axis, clamped);
        let code = axis_id_to_code(axis);
        Some(InputEvent::new_now(
            evdev::EventType::ABSOLUTE,
            code.0,
            clamped,
        ))
    }
}

impl AxisSink for VirtualJoystick {
    /// Only emits an event if the value has changed.
    fn set_axis(&mut self, axis: AxisId, value: i32) -> Result<(), JoystickError> {
        if let Some(event) = self.stage(axis, value) {
            self.device
                .emit(&[event])
                .map_err(JoystickError::EmitEvent)?;
        }
        Ok(())
    }

    /// Emits all changed axes in a single report.
    fn set_axes(&mut self, values: &[(AxisId, i32)]) -> Result<(), JoystickError> {
        let events: Vec<_> = values
            .iter()
            .filter_map(|&(axis, value)| self.stage(axis, value))
            .collect();

        if !events.is_empty() {
            self.device
                .emit(&events)
                .map_err(JoystickError::EmitEvent)?;
        }

        Ok(())
    }
}

/// Convert our AxisId to evdev AbsoluteAxisType
fn axis_id_to_code(axis: AxisId) -> AbsoluteAxisType {
    match axis {
        AxisId::X => AbsoluteAxisType::ABS_X,
        AxisId::Y => AbsoluteAxisType::ABS_Y,
    }
}
