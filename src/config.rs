//! Configuration for the joystick mapper
//!
//! A flat TOML file where every key is optional. Missing keys fall back to
//! the defaults below; a missing file yields the default config.

use crate::error::ConfigError;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Highest device number accepted for `device_id`
pub const MAX_DEVICE_ID: u32 = 16;

/// Immutable snapshot of mapper tunables
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct MapperConfig {
    /// Virtual device number (1-16)
    pub device_id: u32,
    /// Name for the virtual joystick device
    pub device_name: String,
    /// Axis units per pointer unit, scaled by 100
    pub sensitivity: f64,
    /// Radius around center transmitted as exact center
    pub dead_zone: u32,
    /// Minimum per-event pointer delta that moves an axis
    pub movement_dead_zone: f64,
    /// Cap pointer velocity before accumulating
    pub max_speed_enabled: bool,
    /// Velocity cap in pointer units per second
    pub max_speed: f64,
    /// Drift back to center instead of snapping when disabled
    pub smooth_reset_enabled: bool,
    /// Divisor for each decay step (larger is slower)
    pub smooth_reset_speed: i32,
    /// Sleep between decay steps
    pub smooth_reset_interval_ms: u64,
    /// Drive the Y axis from vertical motion
    pub vertical_movement_enabled: bool,
    /// Key name that toggles emulation (see [`crate::hotkey`])
    pub toggle_hotkey: String,
    pub logging_enabled: bool,
    pub logging_level: String,
    /// Pointer event device; auto-detected when unset
    pub pointer_device: Option<PathBuf>,
    /// Keyboard event device; auto-detected when unset
    pub keyboard_device: Option<PathBuf>,
}

impl Default for MapperConfig {
    fn default() -> Self {
        Self {
            device_id: 1,
            device_name: "Joystickify Virtual Joystick".to_string(),
            sensitivity: 0.5,
            dead_zone: 2000,
            movement_dead_zone: 1.0,
            max_speed_enabled: false,
            max_speed: 1000.0,
            smooth_reset_enabled: true,
            smooth_reset_speed: 500,
            smooth_reset_interval_ms: 10,
            vertical_movement_enabled: true,
            toggle_hotkey: "F8".to_string(),
            logging_enabled: true,
            logging_level: "INFO".to_string(),
            pointer_device: None,
            keyboard_device: None,
        }
    }
}

impl MapperConfig {
    /// Get the default config file path
    pub fn default_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("joystickify")
            .join("config.toml")
    }

    /// Load config from a file, or return default if not found
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        toml::from_str(&content).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Save config to a file
    pub fn save(&self, path: &Path) -> Result<(), ConfigError> {
        let write_err = |message: String| ConfigError::Write {
            path: path.to_path_buf(),
            message,
        };
        // Ensure parent directory exists
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| write_err(e.to_string()))?;
        }
        let content = toml::to_string_pretty(self).map_err(|e| write_err(e.to_string()))?;
        std::fs::write(path, content).map_err(|e| write_err(e.to_string()))
    }

    /// Check every numeric tunable is in range
    pub fn validate(&self) -> Result<(), ConfigError> {
        fn invalid(field: &'static str, reason: impl Into<String>) -> ConfigError {
            ConfigError::InvalidValue {
                field,
                reason: reason.into(),
            }
        }

        if !(1..=MAX_DEVICE_ID).contains(&self.device_id) {
            return Err(invalid(
                "device_id",
                format!("must be between 1 and {MAX_DEVICE_ID}"),
            ));
        }
        if !self.sensitivity.is_finite() || self.sensitivity <= 0.0 {
            return Err(invalid("sensitivity", "must be a positive number"));
        }
        if !self.movement_dead_zone.is_finite() || self.movement_dead_zone < 0.0 {
            return Err(invalid("movement_dead_zone", "must be zero or positive"));
        }
        if !self.max_speed.is_finite() || self.max_speed <= 0.0 {
            return Err(invalid("max_speed", "must be a positive number"));
        }
        if self.smooth_reset_speed < 1 {
            return Err(invalid("smooth_reset_speed", "must be at least 1"));
        }
        if self.smooth_reset_interval_ms == 0 {
            return Err(invalid("smooth_reset_interval_ms", "must be at least 1"));
        }
        Ok(())
    }
}
