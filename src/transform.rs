//! Pointer motion to axis delta transform
//!
//! Pure computation over two pointer samples: raw delta, optional velocity
//! cap, and the per-event movement dead zone.

use crate::config::MapperConfig;
use crate::joystick::AxisId;
use crate::state::PointerSample;

/// Smallest time step used for velocity, in seconds
pub const MIN_DT: f64 = 1e-6;

/// An axis delta in pointer units, after capping
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AxisDelta {
    pub axis: AxisId,
    pub delta: f64,
}

/// Deltas produced by one move event
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Motion {
    pub x: Option<f64>,
    pub y: Option<f64>,
}

impl Motion {
    /// Iterate the deltas that survived filtering
    pub fn deltas(&self) -> impl Iterator<Item = AxisDelta> {
        [(AxisId::X, self.x), (AxisId::Y, self.y)]
            .into_iter()
            .filter_map(|(axis, delta)| delta.map(|delta| AxisDelta { axis, delta }))
    }

    pub fn is_empty(&self) -> bool {
        self.x.is_none() && self.y.is_none()
    }
}

/// Limit `delta` so that `delta / dt` does not exceed `max_speed`
pub fn cap_speed(delta: f64, dt: f64, max_speed: f64) -> f64 {
    let speed = delta / dt;
    if speed.abs() > max_speed {
        max_speed * dt * speed.signum()
    } else {
        delta
    }
}

/// Compute the motion between `previous` and `current`
///
/// Returns `None` when there is no previous sample to diff against.
pub fn compute_motion(
    previous: Option<&PointerSample>,
    current: &PointerSample,
    config: &MapperConfig,
) -> Option<Motion> {
    let previous = previous?;

    let mut dx = current.x - previous.x;
    let mut dy = current.y - previous.y;
    let dt = (current.t - previous.t).max(MIN_DT);

    if config.max_speed_enabled {
        dx = cap_speed(dx, dt, config.max_speed);
        if config.vertical_movement_enabled {
            dy = cap_speed(dy, dt, config.max_speed);
        }
    }

    let threshold = config.movement_dead_zone;
    Some(Motion {
        x: (dx.abs() >= threshold).then_some(dx),
        y: (config.vertical_movement_enabled && dy.abs() >= threshold).then_some(dy),
    })
}
