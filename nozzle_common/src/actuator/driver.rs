//! Actuator port trait and error types.
//!
//! This module defines:
//! - `ActuatorPort` trait - Interface for pluggable nozzle stage drivers
//! - `ActuatorError` enum - Error types for actuator operations
//! - `DriverFactory` type alias - Factory function type

use crate::config::ActuatorConfig;
use thiserror::Error;

/// Error types for actuator operations.
#[derive(Debug, Clone, Error)]
pub enum ActuatorError {
    /// Driver initialization failed
    #[error("Initialization failed: {0}")]
    InitFailed(String),

    /// Hardware communication error (I/O, framing, timeout)
    #[error("Actuator communication error: {0}")]
    CommunicationError(String),

    /// The device answered with an error object
    #[error("Device error {code} in '{method}': {message}")]
    DeviceError {
        /// Method that was invoked
        method: String,
        /// Device error code
        code: i64,
        /// Device error message
        message: String,
    },

    /// The device answered with something that is not a valid reply
    #[error("Protocol error in '{method}': {detail}")]
    ProtocolError {
        /// Method that was invoked
        method: String,
        /// What was wrong with the reply
        detail: String,
    },

    /// Driver not found
    #[error("Driver not found: {0}")]
    DriverNotFound(String),

    /// Operation on a connection that was already closed
    #[error("Actuator connection already closed")]
    Closed,
}

/// Factory function type for creating driver instances.
pub type DriverFactory = fn(&ActuatorConfig) -> Result<Box<dyn ActuatorPort>, ActuatorError>;

/// Interface to the rotary stage that carries the odor nozzle.
///
/// Every operation is synchronous: it returns once the device has
/// acknowledged the request. A failure in any operation is treated as a
/// communication fault by the control loop.
///
/// # Lifecycle
///
/// 1. `configure()` - once at startup
/// 2. `move_to()` - park at the home angle
/// 3. `get_position()` / `move_by()` - once per control cycle
/// 4. `move_to()` - park again on shutdown
/// 5. `close()` - exactly once, last
pub trait ActuatorPort: Send {
    /// Returns the driver's unique identifier (e.g., "modular", "simulation").
    fn name(&self) -> &'static str;

    /// Set the motion profile limits.
    fn configure(&mut self, velocity_limit: f64, acceleration_limit: f64)
    -> Result<(), ActuatorError>;

    /// Move `axis` to an absolute angle [deg].
    fn move_to(&mut self, axis: usize, angle: f64) -> Result<(), ActuatorError>;

    /// Move `axis` by a relative angle [deg].
    fn move_by(&mut self, axis: usize, delta: f64) -> Result<(), ActuatorError>;

    /// Read the current angle of `axis` [deg].
    fn get_position(&mut self, axis: usize) -> Result<f64, ActuatorError>;

    /// Release the connection. Further calls return `ActuatorError::Closed`.
    fn close(&mut self) -> Result<(), ActuatorError>;
}
