//! CLI command handlers.

pub mod clear;
pub mod delete;
pub mod get;
pub mod keys;
pub mod set;

use std::path::PathBuf;

use anyhow::{Context as _, Result};
use hearth_session::{DriverRegistry, SessionConnect};
use tracing::{debug, warn};

/// Shared context for all commands.
#[derive(Debug, Clone)]
pub struct Context {
    /// Output as JSON for scripting.
    pub json_output: bool,
    /// Verbose output enabled.
    pub verbose: bool,
    /// Extra config file.
    pub config: Option<PathBuf>,
    /// Store section name.
    pub store: String,
    /// Store file override.
    pub file: Option<String>,
}

impl Context {
    /// Resolve the configured store, connect it through the registry, and open it.
    pub fn open_store(&self) -> Result<Box<dyn SessionConnect>> {
        let loaded = hearth_config::load_layers(None, None, self.config.as_deref())?;
        for warning in &loaded.warnings {
            warn!("{}", warning);
        }

        let mut config = loaded.config.session_config_or_default(&self.store);
        if let Some(file) = &self.file {
            config.setting.insert("file".to_string(), file.clone().into());
        }
        debug!(store = %self.store, driver = %config.driver, "Connecting session store");

        let mut registry = DriverRegistry::new();
        hearth_session::register_default(&mut registry);

        let mut conn = registry
            .connect(&self.store, config)
            .with_context(|| format!("failed to connect store '{}'", self.store))?;
        conn.open()
            .with_context(|| format!("failed to open store '{}'", self.store))?;
        Ok(conn)
    }
}
