//! Smooth return to center while emulation is disabled
//!
//! At most one decay task exists at a time. It has no cancel signal: each
//! iteration re-checks that emulation is still disabled, the mapper is not
//! stopping, and an axis is still off center.
//!
//! The running flag lives in [`Core`] and is only changed under the core
//! lock, by `start` and by the task when it decides to exit. A disable that
//! races with an exiting task therefore either keeps that task going or
//! spawns a new one.

use crate::error::MapperError;
use crate::joystick::{AxisSink, JoystickError};
use crate::mapper::{Core, Shared};
use parking_lot::Mutex;
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use tracing::{debug, error};

/// Owner of the (at most one) decay task
pub struct DecayEngine {
    task: Mutex<Option<JoinHandle<()>>>,
}

impl DecayEngine {
    pub fn new() -> Self {
        Self {
            task: Mutex::new(None),
        }
    }

    /// Spawn a decay task unless one is already running
    ///
    /// Must be called with the core lock held. Returns `Ok(true)` if a new
    /// task was spawned. Fails once a previous task has ended on a device
    /// error; the error stays stored for `Mapper::stop`.
    pub(crate) fn start<S: AxisSink + 'static>(
        &self,
        core: &mut Core<S>,
        shared: &Arc<Shared<S>>,
    ) -> Result<bool, JoystickError> {
        if core.decay_error.is_some() {
            return Err(JoystickError::DecayFailed);
        }
        if core.decaying {
            return Ok(false);
        }
        core.decaying = true;
        *self.task.lock() = Some(tokio::spawn(run(Arc::clone(shared))));
        Ok(true)
    }

    /// Wait for the current task, if any
    pub async fn join(&self) -> Result<(), MapperError> {
        let handle = self.task.lock().take();
        let Some(handle) = handle else {
            return Ok(());
        };
        match handle.await {
            Ok(()) => Ok(()),
            Err(e) if e.is_panic() => Err(MapperError::TaskPanicked("decay")),
            Err(_) => Ok(()),
        }
    }
}

impl Default for DecayEngine {
    fn default() -> Self {
        Self::new()
    }
}

async fn run<S: AxisSink>(shared: Arc<Shared<S>>) {
    let config = &shared.config;
    let interval = Duration::from_millis(config.smooth_reset_interval_ms);
    let mut steps = 0u32;

    loop {
        {
            let mut core = shared.core.lock();
            if shared.toggle.is_enabled() || shared.is_stopping() || core.axes.is_centered() {
                core.decaying = false;
                break;
            }
            core.axes.decay_step(config.smooth_reset_speed);
            if let Err(e) = core.publish(config) {
                error!("Decay stopped: {}", e);
                core.decaying = false;
                core.decay_error = Some(e);
                shared.decay_failed.notify_one();
                return;
            }
        }
        steps += 1;
        tokio::time::sleep(interval).await;
    }

    debug!("Decay finished after {} steps", steps);
}
