//! Driver registry for actuator drivers.
//!
//! Maps driver names to factory functions. Constructed at startup and used
//! by value, no global state.

use nozzle_common::actuator::{ActuatorError, ActuatorPort, DriverFactory};
use nozzle_common::config::ActuatorConfig;
use std::collections::HashMap;

use crate::drivers::{modular, simulation};

/// Registry of available actuator drivers.
pub struct DriverRegistry {
    factories: HashMap<&'static str, DriverFactory>,
}

impl DriverRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self {
            factories: HashMap::new(),
        }
    }

    /// Registry holding every built-in driver.
    pub fn with_builtin_drivers() -> Self {
        let mut registry = Self::new();
        registry.register(modular::DRIVER_NAME, modular::create_driver);
        registry.register(simulation::DRIVER_NAME, simulation::create_driver);
        registry
    }

    /// Register a driver factory.
    ///
    /// # Panics
    /// Panics if a driver with the same name is already registered.
    pub fn register(&mut self, name: &'static str, factory: DriverFactory) {
        if self.factories.contains_key(name) {
            panic!("Driver '{name}' is already registered");
        }
        self.factories.insert(name, factory);
    }

    /// Get a driver factory by name.
    pub fn get_factory(&self, name: &str) -> Option<DriverFactory> {
        self.factories.get(name).copied()
    }

    /// Create and connect a driver instance by name.
    ///
    /// # Errors
    /// Returns `ActuatorError::DriverNotFound` if no driver with the given name
    /// is registered, or the factory's own error if connecting fails.
    pub fn create_driver(
        &self,
        name: &str,
        config: &ActuatorConfig,
    ) -> Result<Box<dyn ActuatorPort>, ActuatorError> {
        let factory = self
            .get_factory(name)
            .ok_or_else(|| ActuatorError::DriverNotFound(name.to_string()))?;
        factory(config)
    }

    /// List all registered driver names.
    pub fn list_drivers(&self) -> Vec<&'static str> {
        self.factories.keys().copied().collect()
    }
}

impl Default for DriverRegistry {
    fn default() -> Self {
        Self::new()
    }
}
