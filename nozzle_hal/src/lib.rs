//! # Nozzle HAL Library
//!
//! Actuator drivers for the rotary stage that carries the odor nozzle.
//! Drivers implement the `ActuatorPort` trait defined in
//! `nozzle_common::actuator::driver`.
//!
//! # Module Structure
//!
//! - [`driver_registry`] - Driver factory registration
//! - [`drivers`] - Driver implementations (`modular`, `simulation`)
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────┐   create_driver()   ┌──────────────────────┐
//! │  DriverRegistry  ├────────────────────►│ Box<dyn ActuatorPort>│
//! └──────────────────┘                     └──────────┬───────────┘
//!                                                     │
//!                         ┌───────────────────────────┴──────┐
//!                         ▼                                  ▼
//!                 ┌───────────────┐                 ┌─────────────────┐
//!                 │ ModularDriver │ JSON lines      │ SimulationDriver│
//!                 │ (device file) │◄──────► stage   │ (in memory)     │
//!                 └───────────────┘                 └─────────────────┘
//! ```

#![deny(warnings)]
#![deny(missing_docs)]

pub mod driver_registry;
pub mod drivers;

pub use crate::driver_registry::DriverRegistry;
