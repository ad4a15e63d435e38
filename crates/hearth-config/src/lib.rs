//! Configuration system for Hearth session stores.
//!
//! Provides TOML-based configuration with:
//! - Named store sections (`[store.default]`, `[store.admin]`, etc.)
//! - Per-store driver settings (`[store.<name>.setting]`)
//! - Config file layering (XDG user config + project-local overrides)

pub mod discovery;
pub mod error;
pub mod types;

pub use discovery::{CONFIG_DIR_ENV, LoadedConfig, load_config_file, load_layers, user_config_dir};
pub use error::{ConfigError, Result};
pub use types::{DEFAULT_STORE, HearthConfig, StoreSection};
