//! Axis accumulator state
//!
//! Plain data; the mapper keeps one instance behind its lock.

use crate::joystick::{AxisId, AXIS_CENTER, AXIS_MAX, AXIS_MIN};
use crate::transform::AxisDelta;

/// Last observed pointer position
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PointerSample {
    pub x: f64,
    pub y: f64,
    /// Seconds, any monotonic-ish origin
    pub t: f64,
}

/// Current X/Y axis values plus the pointer sample they were derived from
#[derive(Debug, Clone, PartialEq)]
pub struct AxisState {
    x: i32,
    y: i32,
    last_sample: Option<PointerSample>,
}

impl AxisState {
    /// Both axes centered, no sample yet
    pub fn new() -> Self {
        Self {
            x: AXIS_CENTER,
            y: AXIS_CENTER,
            last_sample: None,
        }
    }

    pub fn x(&self) -> i32 {
        self.x
    }

    pub fn y(&self) -> i32 {
        self.y
    }

    /// Overwrite an axis, clamped into range
    pub fn set(&mut self, axis: AxisId, value: i32) {
        *self.axis_mut(axis) = value.clamp(AXIS_MIN, AXIS_MAX);
    }

    fn axis_mut(&mut self, axis: AxisId) -> &mut i32 {
        match axis {
            AxisId::X => &mut self.x,
            AxisId::Y => &mut self.y,
        }
    }

    pub fn last_sample(&self) -> Option<&PointerSample> {
        self.last_sample.as_ref()
    }

    /// Replace the sample, returning the previous one
    pub fn replace_sample(&mut self, sample: PointerSample) -> Option<PointerSample> {
        self.last_sample.replace(sample)
    }

    pub fn clear_sample(&mut self) {
        self.last_sample = None;
    }

    /// Accumulate a pointer delta scaled by `sensitivity * 100`
    pub fn apply(&mut self, delta: AxisDelta, sensitivity: f64) {
        // `as` saturates out-of-range floats, so the add below cannot overflow
        let units = (delta.delta * sensitivity * 100.0).round() as i32;
        let value = self.axis_mut(delta.axis);
        *value = value.saturating_add(units).clamp(AXIS_MIN, AXIS_MAX);
    }

    pub fn is_centered(&self) -> bool {
        self.x == AXIS_CENTER && self.y == AXIS_CENTER
    }

    pub fn reset_to_center(&mut self) {
        self.x = AXIS_CENTER;
        self.y = AXIS_CENTER;
    }

    /// Move both axes one step toward center
    ///
    /// The step is `distance / speed`, but never less than one unit, so every
    /// off-center axis gets strictly closer without crossing center.
    pub fn decay_step(&mut self, speed: i32) {
        let speed = speed.max(1);
        for axis in AxisId::ALL {
            let value = self.axis_mut(*axis);
            let delta = AXIS_CENTER - *value;
            let step = match delta / speed {
                0 => delta.signum(),
                step => step,
            };
            *value += step;
        }
    }
}

impl Default for AxisState {
    fn default() -> Self {
        Self::new()
    }
}
