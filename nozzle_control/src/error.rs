//! Control loop error type.

use crate::state::LoopPhase;
use nozzle_common::actuator::ActuatorError;
use nozzle_common::config::ConfigError;
use nozzle_shared_memory::ShmError;
use thiserror::Error;

/// Fatal faults of the nozzle controller.
///
/// Frame counter jumps are not errors; they are reported per cycle as
/// [`FrameDiscontinuity`](crate::state::FrameDiscontinuity) values.
#[derive(Debug, Error)]
pub enum ControlError {
    /// A tracking segment is missing or does not match the expected layout.
    #[error("tracking channel unavailable: {0}")]
    ChannelUnavailable(#[from] ShmError),

    /// The actuator failed to answer or rejected a command.
    #[error("actuator communication failed: {0}")]
    ActuatorComm(#[from] ActuatorError),

    /// Configuration could not be loaded or is invalid.
    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),

    /// The interrupt handler could not be installed.
    #[error("failed to install signal handler: {0}")]
    Signal(String),

    /// An operation was requested in a phase that does not allow it.
    #[error("operation not allowed in phase {0:?}")]
    InvalidPhase(LoopPhase),
}
