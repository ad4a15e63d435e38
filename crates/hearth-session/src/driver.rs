//! Driver: turns a named store configuration into a [`Connection`].

use std::path::Path;

use tracing::{debug, warn};

use crate::config::{FALLBACK_STORE, SessionConfig};
use crate::connection::{Connection, SessionConnect};
use crate::engine::MEMORY;
use crate::error::Result;

/// Factory for session connections.
pub trait SessionDriver: Send + Sync {
    /// Build an unopened connection for the store instance `name`.
    fn connect(&self, name: &str, config: SessionConfig) -> Result<Box<dyn SessionConnect>>;
}

/// Driver for the embedded key-value engine.
///
/// Holds only the location used when a store's settings name none.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Driver {
    store: String,
}

impl Default for Driver {
    /// A driver whose stores default to the in-memory engine.
    fn default() -> Self {
        Self::new(MEMORY)
    }
}

impl Driver {
    /// Create a driver with a default storage location.
    pub fn new(store: impl Into<String>) -> Self {
        Self {
            store: store.into(),
        }
    }

    /// Default storage location.
    pub fn store(&self) -> &str {
        &self.store
    }

    /// Resolve the storage location for `config` and build a connection.
    ///
    /// Location priority: the `file` setting, the `store` setting, this
    /// driver's default, then [`FALLBACK_STORE`]. The parent directory of a
    /// file location is created when missing; a failure there is only logged,
    /// since `open` reports any real problem.
    pub fn connect(&self, name: &str, config: SessionConfig) -> Result<Connection> {
        let store = self.resolve_store(&config);
        ensure_parent_dir(&store);

        debug!(name = %name, store = %store, "Session connection created");
        Ok(Connection::new(name, config, store))
    }

    fn resolve_store(&self, config: &SessionConfig) -> String {
        config
            .setting_str("file")
            .or_else(|| config.setting_str("store"))
            .or_else(|| Some(self.store.as_str()).filter(|s| !s.is_empty()))
            .unwrap_or(FALLBACK_STORE)
            .to_string()
    }
}

impl SessionDriver for Driver {
    fn connect(&self, name: &str, config: SessionConfig) -> Result<Box<dyn SessionConnect>> {
        Ok(Box::new(Driver::connect(self, name, config)?))
    }
}

fn ensure_parent_dir(store: &str) {
    if store == MEMORY {
        return;
    }
    let Some(parent) = Path::new(store).parent() else {
        return;
    };
    if parent.as_os_str().is_empty() || parent.exists() {
        return;
    }

    let mut builder = std::fs::DirBuilder::new();
    builder.recursive(true);
    #[cfg(unix)]
    {
        use std::os::unix::fs::DirBuilderExt;
        builder.mode(0o700);
    }

    if let Err(e) = builder.create(parent) {
        warn!(path = ?parent, error = %e, "Failed to create session store directory");
    }
}
