//! Prelude module for common re-exports.
//!
//! ```rust
//! use nozzle_common::prelude::*;
//! ```

pub use crate::actuator::{ActuatorError, ActuatorPort, DriverFactory};
pub use crate::config::{
    ActuatorConfig, ConfigError, ConfigLoader, LogLevel, NozzleConfig, SharedConfig,
    TrackingConfig,
};
pub use crate::consts::{BALL_DIAMETER_MM, CORRIDOR_WIDTH_MM, HOME_ANGLE_DEGREES};
pub use crate::shm::layout::{CloseSignal, TrackingFrame};
