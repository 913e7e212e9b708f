//! evdev input sources and the event loop that feeds the mapper
//!
//! The pointer device reports relative motion; [`PointerTracker`] integrates
//! it into a position so the mapper sees absolute samples. Each reader runs
//! as its own Tokio task.

use crate::config::MapperConfig;
use crate::error::{InputError, MapperError};
use crate::joystick::AxisSink;
use crate::mapper::Mapper;
use crate::state::PointerSample;
use evdev::{
    AbsoluteAxisType, Device, EventStream, InputEvent, InputEventKind, Key, RelativeAxisType,
    Synchronization,
};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::UNIX_EPOCH;
use tracing::{error, info, warn};

/// Integrates pointer events into a position, one sample per `SYN_REPORT`
#[derive(Debug, Default)]
pub struct PointerTracker {
    x: f64,
    y: f64,
    dirty: bool,
}

impl PointerTracker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn position(&self) -> (f64, f64) {
        (self.x, self.y)
    }

    /// Feed one event; returns a sample when a report completes with motion
    pub fn observe(&mut self, event: &InputEvent) -> Option<PointerSample> {
        match event.kind() {
            InputEventKind::RelAxis(RelativeAxisType::REL_X) => {
                self.x += f64::from(event.value());
                self.dirty = true;
            }
            InputEventKind::RelAxis(RelativeAxisType::REL_Y) => {
                self.y += f64::from(event.value());
                self.dirty = true;
            }
            InputEventKind::AbsAxis(AbsoluteAxisType::ABS_X) => {
                self.x = f64::from(event.value());
                self.dirty = true;
            }
            InputEventKind::AbsAxis(AbsoluteAxisType::ABS_Y) => {
                self.y = f64::from(event.value());
                self.dirty = true;
            }
            InputEventKind::Synchronization(Synchronization::SYN_REPORT) if self.dirty => {
                self.dirty = false;
                return Some(PointerSample {
                    x: self.x,
                    y: self.y,
                    t: event_seconds(event),
                });
            }
            InputEventKind::Synchronization(Synchronization::SYN_DROPPED) => {
                // Partial report; wait for the next complete one
                self.dirty = false;
            }
            _ => {}
        }
        None
    }
}

/// Kernel timestamp of an event, in seconds since the epoch
fn event_seconds(event: &InputEvent) -> f64 {
    event
        .timestamp()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs_f64())
        .unwrap_or(0.0)
}

fn is_pointer(device: &Device) -> bool {
    device.supported_relative_axes().is_some_and(|axes| {
        axes.contains(RelativeAxisType::REL_X) && axes.contains(RelativeAxisType::REL_Y)
    })
}

fn is_keyboard(device: &Device, hotkey: Key) -> bool {
    device
        .supported_keys()
        .is_some_and(|keys| keys.contains(hotkey) && keys.contains(Key::KEY_A))
}

/// An input device as shown by `--list-devices`
#[derive(Debug, Clone)]
pub struct DeviceSummary {
    pub path: PathBuf,
    pub name: String,
    pub pointer: bool,
    pub keyboard: bool,
}

/// List readable event devices, sorted by path
pub fn list_devices(hotkey: Key) -> Vec<DeviceSummary> {
    let mut devices: Vec<_> = evdev::enumerate()
        .map(|(path, device)| DeviceSummary {
            name: device.name().unwrap_or("Unknown").to_string(),
            pointer: is_pointer(&device),
            keyboard: is_keyboard(&device, hotkey),
            path,
        })
        .collect();
    devices.sort_by(|a, b| a.path.cmp(&b.path));
    devices
}

fn open_path(path: &Path) -> Result<Device, InputError> {
    Device::open(path).map_err(|source| InputError::Open {
        path: path.to_path_buf(),
        source,
    })
}

fn find_device(
    kind: &'static str,
    predicate: impl Fn(&Device) -> bool,
) -> Result<(PathBuf, Device), InputError> {
    let mut candidates: Vec<_> = evdev::enumerate().filter(|(_, d)| predicate(d)).collect();
    candidates.sort_by(|a, b| a.0.cmp(&b.0));
    candidates
        .into_iter()
        .next()
        .ok_or(InputError::NotFound(kind))
}

/// The pointer and keyboard devices the mapper listens to
pub struct InputSources {
    pub pointer: Device,
    pub keyboard: Device,
}

impl InputSources {
    /// Open the configured devices, auto-detecting any left unset
    pub fn open(config: &MapperConfig, hotkey: Key) -> Result<Self, InputError> {
        let pointer = match &config.pointer_device {
            Some(path) => open_path(path)?,
            None => {
                let (path, device) = find_device("pointer", is_pointer)?;
                info!(
                    "Pointer: {} ({})",
                    device.name().unwrap_or("Unknown"),
                    path.display()
                );
                device
            }
        };

        let keyboard = match &config.keyboard_device {
            Some(path) => open_path(path)?,
            None => {
                let (path, device) = find_device("keyboard", |d| is_keyboard(d, hotkey))?;
                info!(
                    "Keyboard: {} ({})",
                    device.name().unwrap_or("Unknown"),
                    path.display()
                );
                device
            }
        };

        if !is_pointer(&pointer) {
            warn!("Pointer device does not report REL_X/REL_Y");
        }

        Ok(Self { pointer, keyboard })
    }
}

async fn pointer_reader<S: AxisSink + 'static>(
    mapper: Arc<Mapper<S>>,
    mut stream: EventStream,
) -> Result<(), MapperError> {
    let mut tracker = PointerTracker::new();
    loop {
        let event = stream.next_event().await.map_err(InputError::Read)?;
        if let Some(sample) = tracker.observe(&event) {
            mapper.handle_move(sample.x, sample.y, sample.t)?;
        }
    }
}

async fn keyboard_reader<S: AxisSink + 'static>(
    mapper: Arc<Mapper<S>>,
    mut stream: EventStream,
) -> Result<(), MapperError> {
    loop {
        let event = stream.next_event().await.map_err(InputError::Read)?;
        if let InputEventKind::Key(key) = event.kind() {
            mapper.handle_key(key, event.value())?;
        }
    }
}

fn reader_outcome(
    result: Result<Result<(), MapperError>, tokio::task::JoinError>,
    name: &'static str,
) -> Result<(), MapperError> {
    match result {
        Ok(Ok(())) => Ok(()),
        Ok(Err(e)) => {
            error!("{} reader failed: {}", name, e);
            Err(e)
        }
        Err(e) if e.is_panic() => Err(MapperError::TaskPanicked(name)),
        Err(_) => Ok(()),
    }
}

/// Run the mapper until Ctrl+C or a fatal error, then shut down cleanly
pub async fn run<S: AxisSink + 'static>(
    mapper: Arc<Mapper<S>>,
    sources: InputSources,
) -> Result<(), MapperError> {
    mapper.start()?;

    let pointer = sources.pointer.into_event_stream().map_err(InputError::Read)?;
    let keyboard = sources.keyboard.into_event_stream().map_err(InputError::Read)?;

    let mut pointer_task = tokio::spawn(pointer_reader(Arc::clone(&mapper), pointer));
    let mut keyboard_task = tokio::spawn(keyboard_reader(Arc::clone(&mapper), keyboard));

    info!(
        "Press {:?} to toggle joystick emulation. Press Ctrl+C to exit.",
        mapper.hotkey()
    );

    let outcome = tokio::select! {
        _ = tokio::signal::ctrl_c() => {
            info!("Exiting...");
            Ok(())
        }
        result = &mut pointer_task => reader_outcome(result, "pointer"),
        result = &mut keyboard_task => reader_outcome(result, "keyboard"),
        // The error itself is returned by `stop` below
        _ = mapper.decay_failed() => Ok(()),
    };

    pointer_task.abort();
    keyboard_task.abort();

    // A decay device error outranks the reader error it caused
    let stopped = mapper.stop().await;
    stopped.and(outcome)
}
