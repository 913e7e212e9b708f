//! Joystickify: mouse-to-joystick mapper
//!
//! Main entry point.

use anyhow::{Context, Result};
use clap::Parser;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::info;

use joystickify::config::MapperConfig;
use joystickify::hotkey::parse_hotkey;
use joystickify::input::{self, InputSources};
use joystickify::joystick::VirtualJoystick;
use joystickify::logging;
use joystickify::mapper::Mapper;

#[derive(Parser)]
#[command(name = "joystickify")]
#[command(about = "Drive a virtual joystick from mouse movement")]
struct Cli {
    /// Config file path (default: ~/.config/joystickify/config.toml)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Log level, overriding the config file (error, warn, info, debug, trace)
    #[arg(long)]
    log_level: Option<String>,

    /// Write the effective config to the config path and exit
    #[arg(long)]
    write_config: bool,

    /// List input devices and exit
    #[arg(long)]
    list_devices: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Load config and resolve everything that can fail before logging starts
    let config_path = cli.config.unwrap_or_else(MapperConfig::default_path);
    let config = MapperConfig::load(&config_path)?;
    config.validate()?;
    let hotkey = parse_hotkey(&config.toggle_hotkey)?;

    let level = cli.log_level.as_deref().unwrap_or(&config.logging_level);
    logging::init(config.logging_enabled, level)?;
    info!("Loaded config from {:?}", config_path);

    if cli.write_config {
        config.save(&config_path)?;
        println!("Wrote {}", config_path.display());
        return Ok(());
    }

    if cli.list_devices {
        for device in input::list_devices(hotkey) {
            let mut roles = Vec::new();
            if device.pointer {
                roles.push("pointer");
            }
            if device.keyboard {
                roles.push("keyboard");
            }
            println!(
                "{}  {}  [{}]",
                device.path.display(),
                device.name,
                roles.join(", ")
            );
        }
        return Ok(());
    }

    let sources = InputSources::open(&config, hotkey).context("Failed to open input devices")?;

    let mut joystick = VirtualJoystick::new(&config.device_name, config.device_id)?;
    info!(
        "Created virtual joystick: {} (device {})",
        config.device_name, config.device_id
    );
    if let Some(path) = joystick.device_path() {
        info!("Device path: {}", path.display());
    }

    let mapper = Arc::new(Mapper::new(config, hotkey, joystick));
    input::run(mapper, sources).await?;

    Ok(())
}
