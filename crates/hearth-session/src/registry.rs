//! Registry mapping driver names to session drivers.

use std::collections::HashMap;
use std::sync::Arc;

use tracing::debug;

use crate::config::SessionConfig;
use crate::connection::SessionConnect;
use crate::driver::SessionDriver;
use crate::error::{Result, SessionError};

/// Named collection of session drivers.
///
/// The host application builds one at startup and registers the drivers it
/// wants; nothing is registered implicitly.
#[derive(Default, Clone)]
pub struct DriverRegistry {
    drivers: HashMap<String, Arc<dyn SessionDriver>>,
}

impl std::fmt::Debug for DriverRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut names = self.names();
        names.sort_unstable();
        f.debug_struct("DriverRegistry")
            .field("drivers", &names)
            .finish()
    }
}

impl DriverRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a driver under `name`, replacing any previous entry.
    pub fn register<D: SessionDriver + 'static>(&mut self, name: impl Into<String>, driver: D) {
        self.register_arc(name, Arc::new(driver));
    }

    /// Register a shared driver under `name`.
    pub fn register_arc(&mut self, name: impl Into<String>, driver: Arc<dyn SessionDriver>) {
        let name = name.into();
        debug!(driver = %name, "Session driver registered");
        self.drivers.insert(name, driver);
    }

    /// Get a driver by name.
    pub fn get(&self, name: &str) -> Option<Arc<dyn SessionDriver>> {
        self.drivers.get(name).cloned()
    }

    /// Check if a driver is registered.
    pub fn contains(&self, name: &str) -> bool {
        self.drivers.contains_key(name)
    }

    /// Registered driver names.
    pub fn names(&self) -> Vec<&str> {
        self.drivers.keys().map(|s| s.as_str()).collect()
    }

    /// Get the number of registered drivers.
    pub fn len(&self) -> usize {
        self.drivers.len()
    }

    /// Check if the registry is empty.
    pub fn is_empty(&self) -> bool {
        self.drivers.is_empty()
    }

    /// Connect store instance `name` through the driver named in `config`.
    pub fn connect(&self, name: &str, config: SessionConfig) -> Result<Box<dyn SessionConnect>> {
        let driver = self
            .get(&config.driver)
            .ok_or_else(|| SessionError::UnknownDriver(config.driver.clone()))?;
        driver.connect(name, config)
    }
}
