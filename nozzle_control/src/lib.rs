//! # Nozzle Control
//!
//! Closed-loop controller that keeps an odor nozzle pointed along the
//! heading of a tethered animal.
//!
//! The tracking process publishes its state into shared memory once per
//! video frame. Each cycle this crate reads that state, converts the
//! heading into a nozzle angle ([`transform`]), classifies the position
//! along the virtual track ([`corridor`]) and issues a relative move to
//! the actuator ([`cycle`]).

pub mod corridor;
pub mod cycle;
pub mod error;
pub mod state;
pub mod transform;

pub use corridor::{CorridorId, corridor_id};
pub use cycle::{ControlLoop, CycleReport, CycleStats};
pub use error::ControlError;
pub use state::{ControlState, FrameDiscontinuity, LoopPhase};
pub use transform::target_angle;
