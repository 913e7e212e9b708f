//! Mouse-to-joystick orchestration
//!
//! Routes pointer moves through the motion transform into the axis state and
//! out to the device, and hotkey presses through the toggle controller into
//! the reset/decay logic.
//!
//! Axis state and the device sink share one lock, so every published pair
//! of values is exactly the pair the writer just produced.

use crate::config::MapperConfig;
use crate::deadzone::output_values;
use crate::decay::DecayEngine;
use crate::error::MapperError;
use crate::joystick::{AxisSink, JoystickError};
use crate::state::{AxisState, PointerSample};
use crate::toggle::{EmulationState, ToggleController};
use crate::transform::compute_motion;
use evdev::Key;
use parking_lot::Mutex;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::sync::Notify;
use tracing::{debug, trace};

/// Axis state plus the sink it is published to
pub(crate) struct Core<S> {
    pub(crate) axes: AxisState,
    pub(crate) sink: S,
    /// A decay task is running or has been spawned
    pub(crate) decaying: bool,
    /// Device error that ended the last decay task, taken by `stop`
    pub(crate) decay_error: Option<JoystickError>,
}

impl<S: AxisSink> Core<S> {
    /// Send the dead-zoned values for the current state
    pub(crate) fn publish(&mut self, config: &MapperConfig) -> Result<(), JoystickError> {
        let values = output_values(&self.axes, config);
        self.sink.set_axes(&values)
    }
}

/// State shared between event handlers and the decay task
pub(crate) struct Shared<S> {
    pub(crate) config: MapperConfig,
    pub(crate) core: Mutex<Core<S>>,
    pub(crate) toggle: ToggleController,
    /// Signalled when a decay task ends on a device error
    pub(crate) decay_failed: Notify,
    stopping: AtomicBool,
}

impl<S> Shared<S> {
    pub(crate) fn is_stopping(&self) -> bool {
        self.stopping.load(Ordering::Acquire)
    }
}

/// What happened to the axes when emulation was switched off
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResetAction {
    /// A decay task was started
    Decaying,
    /// A decay task from an earlier toggle is still running
    AlreadyDecaying,
    /// Axes were snapped to center
    Instant,
}

/// Maps pointer motion onto a virtual joystick
///
/// Handlers take `&self` and may be invoked concurrently from any task.
/// Toggling emulation off spawns onto the current Tokio runtime.
pub struct Mapper<S> {
    shared: Arc<Shared<S>>,
    decay: DecayEngine,
}

impl<S: AxisSink + 'static> Mapper<S> {
    pub fn new(config: MapperConfig, hotkey: Key, sink: S) -> Self {
        Self {
            shared: Arc::new(Shared {
                config,
                core: Mutex::new(Core {
                    axes: AxisState::new(),
                    sink,
                    decaying: false,
                    decay_error: None,
                }),
                toggle: ToggleController::new(hotkey),
                decay_failed: Notify::new(),
                stopping: AtomicBool::new(false),
            }),
            decay: DecayEngine::new(),
        }
    }

    pub fn hotkey(&self) -> Key {
        self.shared.toggle.hotkey()
    }

    pub fn state(&self) -> EmulationState {
        self.shared.toggle.state()
    }

    pub fn is_enabled(&self) -> bool {
        self.shared.toggle.is_enabled()
    }

    /// Snapshot of the internal axis state
    pub fn axes(&self) -> AxisState {
        self.shared.core.lock().axes.clone()
    }

    /// Run `f` against the sink under the axis lock
    #[cfg(test)]
    pub(crate) fn with_sink<R>(&self, f: impl FnOnce(&S) -> R) -> R {
        f(&self.shared.core.lock().sink)
    }

    pub fn is_decaying(&self) -> bool {
        self.shared.core.lock().decaying
    }

    /// Resolve once a decay task has ended on a device error
    ///
    /// Later disables fail with [`JoystickError::DecayFailed`]; the device
    /// error itself is returned by [`stop`](Self::stop).
    pub async fn decay_failed(&self) {
        self.shared.decay_failed.notified().await
    }

    /// Publish the initial (centered) output
    pub fn start(&self) -> Result<(), JoystickError> {
        self.shared.core.lock().publish(&self.shared.config)
    }

    /// Handle a pointer position at time `t` (seconds)
    ///
    /// Ignored while emulation is disabled. The first event after a toggle
    /// only records the baseline sample.
    pub fn handle_move(&self, x: f64, y: f64, t: f64) -> Result<(), JoystickError> {
        if !self.shared.toggle.is_enabled() || self.shared.is_stopping() {
            return Ok(());
        }

        let config = &self.shared.config;
        let mut core = self.shared.core.lock();
        let sample = PointerSample { x, y, t };
        let previous = core.axes.replace_sample(sample);

        let Some(motion) = compute_motion(previous.as_ref(), &sample, config) else {
            trace!("Baseline pointer sample at ({x}, {y})");
            return Ok(());
        };

        for delta in motion.deltas() {
            core.axes.apply(delta, config.sensitivity);
        }
        trace!(
            "Motion {:?} -> axes ({}, {})",
            motion,
            core.axes.x(),
            core.axes.y()
        );
        core.publish(config)
    }

    /// Handle a key event (`value` as reported by evdev)
    ///
    /// Returns the new emulation state if the event was a hotkey press.
    pub fn handle_key(&self, key: Key, value: i32) -> Result<Option<EmulationState>, JoystickError> {
        if self.shared.is_stopping() {
            return Ok(None);
        }
        let Some(state) = self.shared.toggle.handle_key(key, value) else {
            return Ok(None);
        };

        match state {
            EmulationState::Enabled => {
                self.shared.core.lock().axes.clear_sample();
            }
            EmulationState::Disabled => {
                let action = self.reset_axes()?;
                debug!("Axis reset: {:?}", action);
            }
        }
        Ok(Some(state))
    }

    /// Start returning the axes to center after emulation was disabled
    fn reset_axes(&self) -> Result<ResetAction, JoystickError> {
        let config = &self.shared.config;
        let mut core = self.shared.core.lock();
        core.axes.clear_sample();
        if !config.smooth_reset_enabled {
            core.axes.reset_to_center();
            core.publish(config)?;
            return Ok(ResetAction::Instant);
        }

        if self.decay.start(&mut core, &self.shared)? {
            Ok(ResetAction::Decaying)
        } else {
            Ok(ResetAction::AlreadyDecaying)
        }
    }

    /// Stop handling events and wait for a running decay task
    ///
    /// The decay task finishes its current step and exits. Returns the
    /// device error that ended the task, if any.
    pub async fn stop(&self) -> Result<(), MapperError> {
        self.shared.stopping.store(true, Ordering::Release);
        self.decay.join().await?;
        match self.shared.core.lock().decay_error.take() {
            Some(e) => Err(e.into()),
            None => Ok(()),
        }
    }
}
