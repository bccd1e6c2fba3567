//! Configuration loading traits and types.
//!
//! Everything here is optional: a missing section or field falls back to
//! the rig defaults. Physical constants are not configurable, see
//! [`crate::consts`].
//!
//! # TOML Example
//!
//! ```toml
//! [shared]
//! log_level = "debug"
//! service_name = "nozzle-rig-2"
//!
//! [tracking]
//! state_segment = "FicTracStateSHMEM"
//! signal_segment = "FicTracStateSHMEM_SIGNALS"
//!
//! [actuator]
//! driver = "modular"
//! port = "/dev/ttyACM0"
//! axis = 0
//! velocity_limit = 500.0
//! acceleration_limit = 500.0
//! settle_ms = 2000
//! park_ms = 500
//! ```

use crate::consts::{DEFAULT_SIGNAL_SEGMENT, DEFAULT_STATE_SEGMENT, SERVICE_NAME};
use crate::shm::segment_basename;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;

/// Error type for configuration loading operations.
#[derive(Debug, Clone, Error)]
pub enum ConfigError {
    /// Configuration file not found at specified path.
    #[error("Configuration file not found")]
    FileNotFound,

    /// TOML parsing failed.
    #[error("Failed to parse configuration: {0}")]
    ParseError(String),

    /// Semantic validation failed.
    #[error("Configuration validation failed: {0}")]
    ValidationError(String),
}

/// Log level for application logging.
///
/// Uses lowercase serde values for TOML compatibility.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    /// Most verbose, includes the full tracking state dump.
    Trace,
    /// Debug information useful during development.
    Debug,
    /// Status lines and lifecycle events.
    #[default]
    Info,
    /// Frame discontinuities and recoverable faults.
    Warn,
    /// Fatal faults only.
    Error,
}

impl LogLevel {
    /// Directive string understood by `tracing_subscriber::EnvFilter`.
    pub const fn as_directive(self) -> &'static str {
        match self {
            LogLevel::Trace => "trace",
            LogLevel::Debug => "debug",
            LogLevel::Info => "info",
            LogLevel::Warn => "warn",
            LogLevel::Error => "error",
        }
    }
}

/// Common configuration fields.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SharedConfig {
    /// Logging verbosity level.
    #[serde(default)]
    pub log_level: LogLevel,

    /// Application instance identifier.
    #[serde(default = "default_service_name")]
    pub service_name: String,
}

impl Default for SharedConfig {
    fn default() -> Self {
        Self {
            log_level: LogLevel::default(),
            service_name: default_service_name(),
        }
    }
}

impl SharedConfig {
    /// Validate the configuration.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::ValidationError` if `service_name` is empty.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.service_name.is_empty() {
            return Err(ConfigError::ValidationError(
                "service_name cannot be empty".to_string(),
            ));
        }
        Ok(())
    }
}

/// Names of the shared memory segments agreed with the tracking process.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct TrackingConfig {
    /// Segment holding the published `TrackingFrame`.
    pub state_segment: String,
    /// Segment holding the `CloseSignal` flag.
    pub signal_segment: String,
}

impl Default for TrackingConfig {
    fn default() -> Self {
        Self {
            state_segment: DEFAULT_STATE_SEGMENT.to_string(),
            signal_segment: DEFAULT_SIGNAL_SEGMENT.to_string(),
        }
    }
}

impl TrackingConfig {
    fn validate(&self) -> Result<(), ConfigError> {
        let state = checked_segment("state_segment", &self.state_segment)?;
        let signal = checked_segment("signal_segment", &self.signal_segment)?;
        if state == signal {
            return Err(ConfigError::ValidationError(
                "tracking.state_segment and tracking.signal_segment must differ".to_string(),
            ));
        }
        Ok(())
    }
}

fn checked_segment<'a>(field: &str, name: &'a str) -> Result<&'a str, ConfigError> {
    segment_basename(name).ok_or_else(|| {
        ConfigError::ValidationError(format!(
            "tracking.{field} '{name}' is not a valid segment name"
        ))
    })
}

/// Actuator driver selection and motion profile.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ActuatorConfig {
    /// Registered driver name (`"modular"` or `"simulation"`).
    pub driver: String,
    /// Device path of the stage controller.
    pub port: PathBuf,
    /// Axis index carrying the nozzle.
    pub axis: usize,
    /// Maximum velocity [deg/s].
    pub velocity_limit: f64,
    /// Maximum acceleration [deg/s²].
    pub acceleration_limit: f64,
    /// Pause after the startup homing move [ms].
    pub settle_ms: u64,
    /// Pause after the shutdown parking move [ms].
    pub park_ms: u64,
}

impl Default for ActuatorConfig {
    fn default() -> Self {
        Self {
            driver: "modular".to_string(),
            port: PathBuf::from("/dev/ttyACM0"),
            axis: 0,
            velocity_limit: 500.0,
            acceleration_limit: 500.0,
            settle_ms: 2000,
            park_ms: 500,
        }
    }
}

impl ActuatorConfig {
    /// Pause after the startup homing move.
    pub fn settle_time(&self) -> Duration {
        Duration::from_millis(self.settle_ms)
    }

    /// Pause after the shutdown parking move.
    pub fn park_time(&self) -> Duration {
        Duration::from_millis(self.park_ms)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.driver.is_empty() {
            return Err(ConfigError::ValidationError(
                "actuator.driver cannot be empty".to_string(),
            ));
        }
        for (field, value) in [
            ("velocity_limit", self.velocity_limit),
            ("acceleration_limit", self.acceleration_limit),
        ] {
            if !value.is_finite() || value <= 0.0 {
                return Err(ConfigError::ValidationError(format!(
                    "actuator.{field} must be a positive number, got {value}"
                )));
            }
        }
        Ok(())
    }
}

/// Complete configuration of the nozzle controller.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct NozzleConfig {
    /// Logging and identity.
    pub shared: SharedConfig,
    /// Shared memory segment names.
    pub tracking: TrackingConfig,
    /// Actuator driver and motion profile.
    pub actuator: ActuatorConfig,
}

impl NozzleConfig {
    /// Validate every section.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.shared.validate()?;
        self.tracking.validate()?;
        self.actuator.validate()
    }

    /// Load and validate `path`, or return validated defaults when `None`.
    pub fn load_or_default(path: Option<&Path>) -> Result<Self, ConfigError> {
        let config = match path {
            Some(path) => Self::load(path)?,
            None => Self::default(),
        };
        config.validate()?;
        Ok(config)
    }
}

fn default_service_name() -> String {
    SERVICE_NAME.to_string()
}

/// Trait for loading configuration from TOML files.
///
/// # Contract
///
/// - Returns `ConfigError::FileNotFound` if the file does not exist
/// - Returns `ConfigError::ParseError` if TOML syntax is invalid
pub trait ConfigLoader: Sized + serde::de::DeserializeOwned {
    /// Load configuration from a TOML file.
    fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                ConfigError::FileNotFound
            } else {
                ConfigError::ParseError(e.to_string())
            }
        })?;

        toml::from_str(&content).map_err(|e| ConfigError::ParseError(e.to_string()))
    }
}

// Any serde-deserializable struct can use ConfigLoader.
impl<T: serde::de::DeserializeOwned> ConfigLoader for T {}
