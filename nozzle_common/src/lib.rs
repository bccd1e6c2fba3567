//! Nozzle Common Library
//!
//! Shared constants, binary memory layouts and configuration loading for
//! the closed-loop odor nozzle workspace.
//!
//! # Module Structure
//!
//! - [`consts`] - Fixed physical constants and default names
//! - [`shm`] - `#[repr(C)]` layouts published by the tracking process
//! - [`actuator`] - Actuator port trait and error type
//! - [`config`] - Configuration loading traits and types
//! - [`prelude`] - Common re-exports for convenience
//!
//! # Usage
//!
//! Add to your `Cargo.toml` with alias for shorter imports:
//! ```toml
//! [dependencies]
//! nozzle = { package = "nozzle_common", path = "../nozzle_common" }
//! ```

pub mod actuator;
pub mod config;
pub mod consts;
pub mod prelude;
pub mod shm;
