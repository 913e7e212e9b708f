//! Error types for the mapper and its collaborators

use std::path::PathBuf;
use thiserror::Error;

pub use crate::joystick::JoystickError;

/// Problems with the configuration snapshot, detected before the mapper runs
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Config file exists but could not be read
    #[error("Failed to read config {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Config file is not valid TOML for [`MapperConfig`](crate::MapperConfig)
    #[error("Failed to parse config {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    /// Config could not be written back
    #[error("Failed to write config {path}: {message}")]
    Write { path: PathBuf, message: String },

    /// A value is outside its allowed range
    #[error("Invalid value for `{field}`: {reason}")]
    InvalidValue { field: &'static str, reason: String },

    /// Hotkey name has no key code
    #[error("Unsupported hotkey: {0}")]
    UnknownHotkey(String),

    /// Logging level name is not recognised
    #[error("Invalid logging level: {0}")]
    InvalidLogLevel(String),
}

/// Errors from the evdev input sources
#[derive(Debug, Error)]
pub enum InputError {
    #[error("Failed to open input device {path}: {source}")]
    Open {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("No {0} device found")]
    NotFound(&'static str),

    #[error("Failed to read input events: {0}")]
    Read(#[source] std::io::Error),
}

/// Top-level error surfaced by the mapper to its orchestrator
#[derive(Debug, Error)]
pub enum MapperError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Device(#[from] JoystickError),

    #[error(transparent)]
    Input(#[from] InputError),

    /// A background task panicked instead of returning
    #[error("{0} task panicked")]
    TaskPanicked(&'static str),
}
