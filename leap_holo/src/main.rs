//! leap_holo: interactive entry point.

use std::path::PathBuf;

use anyhow::Context;
use clap::{Parser, ValueEnum};
use holo_orient::{AnimationSpeed, ControlConfig, Direction};
use leap_holo::app::{run, AppConfig, InputMode};
use tracing::info;

#[derive(Parser, Debug)]
#[command(name = "leap_holo", version, about = "Four-panel hologram viewer")]
struct Cli {
    /// Configuration file (default: the per-user config, if present)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Enable debug logging
    #[arg(short, long)]
    verbose: bool,

    /// Input driving the rotation
    #[arg(long, value_enum, default_value_t = Mode::Pointer)]
    mode: Mode,

    /// Start with the turntable animation running (very-fast, fast, medium, slow)
    #[arg(long)]
    animate: Option<AnimationSpeed>,

    /// Direction of the startup animation
    #[arg(long, value_enum, default_value_t = Turn::Left)]
    direction: Turn,

    /// Print the effective configuration as TOML and exit
    #[arg(long)]
    print_config: bool,
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum Mode {
    Pointer,
    Sensor,
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum Turn {
    Left,
    Right,
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let default_level = if cli.verbose { "leap_holo=debug,holo_orient=debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| default_level.into()),
        )
        .init();

    let control = match &cli.config {
        Some(path) => ControlConfig::load(path)
            .with_context(|| format!("loading config from {}", path.display()))?,
        None => ControlConfig::load_default().context("loading default config")?,
    };

    if cli.print_config {
        print!("{}", control.to_toml()?);
        return Ok(());
    }

    let mode = match cli.mode {
        Mode::Pointer => InputMode::Pointer,
        Mode::Sensor => InputMode::Sensor,
    };
    let direction = match cli.direction {
        Turn::Left => Direction::Left,
        Turn::Right => Direction::Right,
    };

    println!();
    println!("╔══════════════════════════════════════════════════════════════╗");
    println!("║          Leap Holo — Four-Panel Hologram Viewer              ║");
    println!("╚══════════════════════════════════════════════════════════════╝");
    println!();
    match mode {
        InputMode::Pointer => println!("  Mode: pointer  (left-drag to rotate)"),
        InputMode::Sensor => println!("  Mode: LeapMotion hands  (close a hand to rotate)"),
    }
    println!();

    info!(version = env!("CARGO_PKG_VERSION"), ?mode, "leap_holo starting");

    run(AppConfig {
        control,
        mode,
        animation: cli.animate.map(|speed| (speed, direction)),
    })
}
