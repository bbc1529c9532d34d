//! Driver registry for peripheral backends.
//!
//! Maps backend names ("simulation", "rppal") to factories. Built at
//! startup and passed by value; there is no global registry.

use multibutton_common::gpio::driver::{DriverFactory, DriverOptions, IoError, PeripheralManager};
use std::collections::HashMap;

/// Registry of available peripheral backends.
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

    /// Registry with every built-in backend.
    pub fn with_builtin() -> Self {
        let mut registry = Self::new();
        crate::drivers::register_all_drivers(&mut registry);
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

    pub fn get_factory(&self, name: &str) -> Option<DriverFactory> {
        self.factories.get(name).copied()
    }

    /// Create a peripheral manager by name.
    ///
    /// # Errors
    /// `IoError::DriverNotFound` if no driver with that name is registered,
    /// otherwise whatever the factory returns.
    pub fn create_driver(
        &self,
        name: &str,
        options: &DriverOptions,
    ) -> Result<Box<dyn PeripheralManager>, IoError> {
        let factory = self
            .get_factory(name)
            .ok_or_else(|| IoError::DriverNotFound(name.to_string()))?;
        factory(options)
    }

    /// Registered driver names, sorted.
    pub fn list_drivers(&self) -> Vec<&'static str> {
        let mut names: Vec<_> = self.factories.keys().copied().collect();
        names.sort_unstable();
        names
    }
}

impl Default for DriverRegistry {
    fn default() -> Self {
        Self::new()
    }
}
