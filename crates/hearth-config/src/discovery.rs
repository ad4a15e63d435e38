//! Locating and layering `hearth.toml` files.
//!
//! Layers are merged lowest first; a `[store.<name>]` section in a later
//! layer replaces the same section from an earlier one:
//! 1. `config.toml` in the user config directory
//! 2. `hearth.toml` in the project directory (the working directory by default)
//! 3. a file named on the command line

use std::path::{Path, PathBuf};

use tracing::{debug, warn};

use crate::{ConfigError, HearthConfig, Result};

const PROJECT_FILE: &str = "hearth.toml";
const USER_FILE: &str = "config.toml";

/// Overrides the user config directory (and with it the CLI log directory).
pub const CONFIG_DIR_ENV: &str = "HEARTH_CONFIG_DIR";

/// Merged store configuration plus what went into it.
#[derive(Debug, Clone, Default)]
pub struct LoadedConfig {
    pub config: HearthConfig,
    /// Files that were read and merged, lowest precedence first.
    pub layers: Vec<PathBuf>,
    /// Discovered files that existed but could not be used.
    pub warnings: Vec<String>,
}

/// Build the effective configuration from every layer.
///
/// `user_dir` replaces the environment/platform lookup when given. Broken
/// discovered files are skipped with a warning; a broken `explicit` file is
/// an error, since the caller asked for it by name.
pub fn load_layers(
    project_dir: Option<&Path>,
    user_dir: Option<&Path>,
    explicit: Option<&Path>,
) -> Result<LoadedConfig> {
    let mut loaded = LoadedConfig::default();

    let user_file = user_dir
        .map(Path::to_path_buf)
        .or_else(user_config_dir)
        .map(|dir| dir.join(USER_FILE));
    if let Some(path) = user_file {
        loaded.merge_discovered(&path);
    }

    let project_file = project_dir
        .map(|dir| dir.join(PROJECT_FILE))
        .unwrap_or_else(|| PathBuf::from(PROJECT_FILE));
    loaded.merge_discovered(&project_file);

    if let Some(path) = explicit {
        loaded.config.merge(load_config_file(path)?);
        loaded.layers.push(path.to_path_buf());
    }

    debug!(
        stores = loaded.config.store.len(),
        layers = loaded.layers.len(),
        "Store configuration resolved"
    );
    Ok(loaded)
}

/// Parse one config file.
pub fn load_config_file(path: &Path) -> Result<HearthConfig> {
    let text = std::fs::read_to_string(path).map_err(|source| ConfigError::ReadFile {
        path: path.display().to_string(),
        source,
    })?;
    HearthConfig::from_toml(&text)
}

/// User config directory: `$HEARTH_CONFIG_DIR` when set, else `<config dir>/hearth`.
pub fn user_config_dir() -> Option<PathBuf> {
    match std::env::var_os(CONFIG_DIR_ENV) {
        Some(dir) if !dir.is_empty() => Some(PathBuf::from(dir)),
        _ => dirs::config_dir().map(|dir| dir.join("hearth")),
    }
}

impl LoadedConfig {
    fn merge_discovered(&mut self, path: &Path) {
        if !path.is_file() {
            return;
        }
        match load_config_file(path) {
            Ok(layer) => {
                self.config.merge(layer);
                self.layers.push(path.to_path_buf());
            }
            Err(e) => {
                warn!(path = %path.display(), error = %e, "Ignoring unusable config file");
                self.warnings.push(format!("{}: {e}", path.display()));
            }
        }
    }
}
