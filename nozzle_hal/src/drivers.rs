//! Actuator driver implementations.
//!
//! - [`modular`] - Stage controller speaking newline-delimited JSON over a device file
//! - [`simulation`] - In-memory stage for running without hardware
//!
//! # Adding New Drivers
//!
//! 1. Create a new submodule under `drivers/`
//! 2. Implement `ActuatorPort` from `nozzle_common::actuator`
//! 3. Register its factory in `DriverRegistry::with_builtin_drivers()`

pub mod modular;
pub mod simulation;
