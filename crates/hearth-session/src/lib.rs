//! Session storage backed by an embedded key-value engine.
//!
//! This crate provides a session driver for hosting frameworks with:
//! - Named store instances resolved from configuration
//! - One transaction per read, write, delete, or prefix clear
//! - Per-record TTL, expired records are evicted by the engine
//! - An explicit driver registry instead of load-time registration
//!
//! # Example
//!
//! ```rust,ignore
//! use hearth_session::{DriverRegistry, SessionConfig};
//!
//! let mut registry = DriverRegistry::new();
//! hearth_session::register_default(&mut registry);
//!
//! let config = SessionConfig::default().with_setting("file", "store/session.db");
//! let mut conn = registry.connect("web", config)?;
//! conn.open()?;
//! conn.write("sess:42", &value, Duration::ZERO)?;
//! ```

mod config;
mod connection;
mod driver;
pub mod engine;
mod error;
mod registry;

pub use config::{DEFAULT_EXPIRY, DecodeFailurePolicy, FALLBACK_STORE, SessionConfig, Settings};
pub use connection::{Connection, SessionConnect, SessionMap};
pub use driver::{Driver, SessionDriver};
pub use engine::{EngineError, MEMORY};
pub use error::{Result, SessionError};
pub use registry::DriverRegistry;

/// Name the file-backed driver registers under.
pub const DRIVER_NAME: &str = "sqlite";

/// Name the in-memory driver registers under.
pub const MEMORY_DRIVER_NAME: &str = "memory";

/// Register this crate's drivers.
///
/// `sqlite` defaults to [`FALLBACK_STORE`]; `memory` defaults to [`MEMORY`].
pub fn register_default(registry: &mut DriverRegistry) {
    registry.register(DRIVER_NAME, Driver::new(FALLBACK_STORE));
    registry.register(MEMORY_DRIVER_NAME, Driver::default());
}
