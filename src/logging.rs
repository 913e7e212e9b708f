//! Process-wide logging setup
//!
//! The mapper itself only emits `tracing` events; installing a subscriber
//! is left to the binary.

use crate::error::ConfigError;
use tracing::level_filters::LevelFilter;

/// Parse a level name; accepts the common aliases `warning` and `critical`
pub fn parse_level(name: &str) -> Result<LevelFilter, ConfigError> {
    match name.trim().to_ascii_lowercase().as_str() {
        "trace" => Ok(LevelFilter::TRACE),
        "debug" => Ok(LevelFilter::DEBUG),
        "info" => Ok(LevelFilter::INFO),
        "warn" | "warning" => Ok(LevelFilter::WARN),
        "error" | "critical" => Ok(LevelFilter::ERROR),
        _ => Err(ConfigError::InvalidLogLevel(name.to_string())),
    }
}

/// Install the global subscriber
///
/// `RUST_LOG` takes precedence over `level` when set. Does nothing when
/// `enabled` is false, but the level is still validated.
pub fn init(enabled: bool, level: &str) -> Result<(), ConfigError> {
    let level = parse_level(level)?;
    if !enabled {
        return Ok(());
    }

    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::default().add_directive(level.into()));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .init();
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_level() {
        assert_eq!(parse_level("INFO").unwrap(), LevelFilter::INFO);
        assert_eq!(parse_level("Warning").unwrap(), LevelFilter::WARN);
        assert_eq!(parse_level("critical").unwrap(), LevelFilter::ERROR);
        assert_eq!(parse_level("debug").unwrap(), LevelFilter::DEBUG);
    }

    #[test]
    fn test_parse_level_rejects_unknown() {
        assert!(matches!(
            parse_level("verbose"),
            Err(ConfigError::InvalidLogLevel(_))
        ));
        assert!(parse_level("off").is_err());
    }

    #[test]
    fn test_disabled_still_validates() {
        assert!(init(false, "loud").is_err());
        assert!(init(false, "info").is_ok());
    }
}
