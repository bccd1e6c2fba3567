//! # Nozzle Control
//!
//! Keeps the odor nozzle aligned with the animal's heading until
//! interrupted. On SIGINT/SIGTERM the tracking process is asked to stop,
//! the nozzle is parked at its home angle and the stage is released.

use clap::Parser;
use nozzle_common::config::{LogLevel, NozzleConfig};
use nozzle_control::{ControlError, ControlLoop};
use nozzle_hal::DriverRegistry;
use nozzle_hal::drivers::simulation;
use std::path::PathBuf;
use std::process;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use tracing::{Level, error, info};
use tracing_subscriber::EnvFilter;

/// Closed-loop odor nozzle controller
#[derive(Parser, Debug)]
#[command(name = "nozzle_control")]
#[command(version)]
#[command(about = "Points the odor nozzle along the tracked heading")]
struct Args {
    /// Path to the TOML configuration. Built-in defaults when omitted.
    #[arg(long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Use the simulated stage instead of hardware.
    #[arg(short, long)]
    simulate: bool,

    /// Actuator driver name (overrides the config file).
    #[arg(short, long, value_name = "NAME")]
    driver: Option<String>,

    /// Enable verbose logging (DEBUG level).
    #[arg(short, long)]
    verbose: bool,

    /// Output logs in JSON format.
    #[arg(long)]
    json: bool,
}

fn main() {
    let args = Args::parse();
    let config = NozzleConfig::load_or_default(args.config.as_deref());
    setup_tracing(&args, config.as_ref().ok().map(|c| c.shared.log_level));

    let result = config
        .map_err(ControlError::from)
        .and_then(|config| run(&args, config));
    if let Err(e) = result {
        error!("FATAL: {e}");
        process::exit(1);
    }

    info!("Nozzle control shutdown complete");
}

fn run(args: &Args, config: NozzleConfig) -> Result<(), ControlError> {
    info!(
        "{} v{} starting",
        config.shared.service_name,
        env!("CARGO_PKG_VERSION")
    );

    let driver = if args.simulate {
        simulation::DRIVER_NAME
    } else {
        args.driver.as_deref().unwrap_or(&config.actuator.driver)
    };
    let registry = DriverRegistry::with_builtin_drivers();
    info!(
        "Actuator driver '{}' (available: {:?})",
        driver,
        registry.list_drivers()
    );
    let actuator = registry.create_driver(driver, &config.actuator)?;

    let running = Arc::new(AtomicBool::new(true));
    let r = running.clone();
    ctrlc::set_handler(move || {
        info!("Received shutdown signal");
        r.store(false, Ordering::SeqCst);
    })
    .map_err(|e| ControlError::Signal(e.to_string()))?;

    let mut control = ControlLoop::new(actuator, config.actuator, config.tracking);
    control.execute(&running)
}

/// Setup tracing subscriber from CLI arguments and the configured level.
fn setup_tracing(args: &Args, configured: Option<LogLevel>) {
    let directive = if args.verbose {
        "debug"
    } else {
        configured.unwrap_or_default().as_directive()
    };

    let filter = EnvFilter::from_default_env()
        .add_directive(directive.parse().unwrap_or_else(|_| Level::INFO.into()));

    if args.json {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .json()
            .init();
    } else {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .compact()
            .init();
    }
}
