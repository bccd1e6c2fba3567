//! Actuator port.
//!
//! - `driver`: the `ActuatorPort` trait every driver implements, its error
//!   type and the factory signature used by the driver registry.

pub mod driver;

pub use driver::{ActuatorError, ActuatorPort, DriverFactory};
