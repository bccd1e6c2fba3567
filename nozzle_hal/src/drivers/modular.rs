//! Modular device stage driver.
//!
//! Talks to the stepper controller through its character device (USB CDC
//! or serial) and exchanges JSON lines. A terminal device is switched to
//! raw mode on open: with the default line discipline the tty would echo
//! replies back to the device and rewrite `\n` as `\r\n`.

pub mod client;

pub use client::ModularClient;

use nozzle_common::actuator::{ActuatorError, ActuatorPort};
use nozzle_common::config::ActuatorConfig;
use nix::sys::termios::{SetArg, cfmakeraw, tcgetattr, tcsetattr};
use nix::unistd::isatty;
use std::fs::{File, OpenOptions};
use std::io::{BufRead, BufReader, Write};
use tracing::{debug, info, warn};

/// Registered driver name.
pub const DRIVER_NAME: &str = "modular";

/// Device property holding the velocity limit.
pub const VELOCITY_PROPERTY: &str = "velocityMax";

/// Device property holding the acceleration limit.
pub const ACCELERATION_PROPERTY: &str = "accelerationMax";

/// Stage controller reached through a device file.
pub struct ModularDriver<R: BufRead = BufReader<File>, W: Write = File> {
    client: Option<ModularClient<R, W>>,
    port: String,
}

impl ModularDriver {
    /// Open the device at `config.port`.
    ///
    /// # Errors
    /// `ActuatorError::InitFailed` if the device cannot be opened.
    pub fn open(config: &ActuatorConfig) -> Result<Self, ActuatorError> {
        let port = config.port.display().to_string();
        let file = OpenOptions::new()
            .read(true)
            .write(true)
            .open(&config.port)
            .map_err(|e| ActuatorError::InitFailed(format!("cannot open {port}: {e}")))?;
        make_raw(&file, &port)?;
        let reader = file
            .try_clone()
            .map_err(|e| ActuatorError::InitFailed(format!("cannot clone {port}: {e}")))?;

        info!("Connected to modular device at {}", port);
        Ok(Self::from_client(
            ModularClient::new(BufReader::new(reader), file),
            port,
        ))
    }
}

/// Put a terminal into raw mode. Regular files and pipes are left alone.
fn make_raw(file: &File, port: &str) -> Result<(), ActuatorError> {
    if !isatty(file).unwrap_or(false) {
        return Ok(());
    }
    let raw_error =
        |e: nix::Error| ActuatorError::InitFailed(format!("cannot set raw mode on {port}: {e}"));
    let mut termios = tcgetattr(file).map_err(raw_error)?;
    cfmakeraw(&mut termios);
    tcsetattr(file, SetArg::TCSANOW, &termios).map_err(raw_error)?;
    debug!("{} switched to raw mode", port);
    Ok(())
}

impl<R: BufRead, W: Write> ModularDriver<R, W> {
    /// Drive a device through an already-connected client.
    pub fn from_client(client: ModularClient<R, W>, port: impl Into<String>) -> Self {
        Self {
            client: Some(client),
            port: port.into(),
        }
    }

    fn client(&mut self) -> Result<&mut ModularClient<R, W>, ActuatorError> {
        self.client.as_mut().ok_or(ActuatorError::Closed)
    }
}

impl<R: BufRead + Send, W: Write + Send> ActuatorPort for ModularDriver<R, W> {
    fn name(&self) -> &'static str {
        DRIVER_NAME
    }

    fn configure(
        &mut self,
        velocity_limit: f64,
        acceleration_limit: f64,
    ) -> Result<(), ActuatorError> {
        let client = self.client()?;
        client.set_property(VELOCITY_PROPERTY, velocity_limit)?;
        client.set_property(ACCELERATION_PROPERTY, acceleration_limit)
    }

    fn move_to(&mut self, axis: usize, angle: f64) -> Result<(), ActuatorError> {
        self.client()?.move_to(axis, angle)
    }

    fn move_by(&mut self, axis: usize, delta: f64) -> Result<(), ActuatorError> {
        self.client()?.move_by(axis, delta)
    }

    fn get_position(&mut self, axis: usize) -> Result<f64, ActuatorError> {
        let positions = self.client()?.get_positions()?;
        positions
            .get(axis)
            .copied()
            .ok_or_else(|| ActuatorError::ProtocolError {
                method: "getPositions".to_string(),
                detail: format!("no position for axis {axis} ({} reported)", positions.len()),
            })
    }

    fn close(&mut self) -> Result<(), ActuatorError> {
        let client = self.client.take().ok_or(ActuatorError::Closed)?;
        client.into_parts()?;
        info!("Closed modular device at {}", self.port);
        Ok(())
    }
}

impl<R: BufRead, W: Write> Drop for ModularDriver<R, W> {
    fn drop(&mut self) {
        if self.client.is_some() {
            warn!("Modular device at {} dropped without close()", self.port);
        }
    }
}

/// Factory function to create a modular driver instance.
pub fn create_driver(config: &ActuatorConfig) -> Result<Box<dyn ActuatorPort>, ActuatorError> {
    Ok(Box::new(ModularDriver::open(config)?))
}
