//! Configuration types mapping to the TOML schema.
//!
//! ```toml
//! [store.default]
//! driver = "sqlite"
//! expiry_secs = 1800
//! decode_failure = "empty"
//!
//! [store.default.setting]
//! file = "store/session.db"
//! ```

use std::collections::BTreeMap;
use std::time::Duration;

use hearth_session::{DecodeFailurePolicy, SessionConfig, Settings};
use serde::{Deserialize, Serialize};

use crate::{ConfigError, Result};

/// Store name used when none is given.
pub const DEFAULT_STORE: &str = "default";

/// Root configuration structure.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HearthConfig {
    /// Named session stores.
    pub store: BTreeMap<String, StoreSection>,
}

impl HearthConfig {
    /// Create an empty config.
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse from a TOML string.
    pub fn from_toml(toml_str: &str) -> Result<Self> {
        Ok(toml::from_str(toml_str)?)
    }

    /// Merge another config on top of this one (other takes priority).
    ///
    /// Store sections are replaced whole, not field by field.
    pub fn merge(&mut self, other: HearthConfig) {
        for (name, section) in other.store {
            self.store.insert(name, section);
        }
    }

    /// Look up a store section by name.
    pub fn store(&self, name: &str) -> Result<&StoreSection> {
        self.store
            .get(name)
            .ok_or_else(|| ConfigError::StoreNotFound(name.to_string()))
    }

    /// Session config for `name`, or the defaults when the section is absent.
    pub fn session_config_or_default(&self, name: &str) -> SessionConfig {
        self.store
            .get(name)
            .map(StoreSection::to_session_config)
            .unwrap_or_default()
    }
}

/// One `[store.<name>]` section.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StoreSection {
    /// Registered driver name (default: `sqlite`).
    pub driver: Option<String>,

    /// Default expiry in seconds for writes without one; `0` means the built-in default.
    pub expiry_secs: Option<u64>,

    /// Behavior when a stored value cannot be decoded.
    pub decode_failure: Option<DecodeFailurePolicy>,

    /// Driver settings such as `file` or the legacy `store`.
    pub setting: Settings,
}

impl StoreSection {
    /// Convert into the session crate's configuration.
    pub fn to_session_config(&self) -> SessionConfig {
        let mut config = SessionConfig::new();
        if let Some(driver) = self.driver.as_ref().filter(|d| !d.is_empty()) {
            config.driver = driver.clone();
        }
        if let Some(secs) = self.expiry_secs.filter(|s| *s > 0) {
            config.expiry = Duration::from_secs(secs);
        }
        if let Some(policy) = self.decode_failure {
            config.decode_failure = policy;
        }
        config.setting = self.setting.clone();
        config
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use hearth_session::DEFAULT_EXPIRY;

    #[test]
    fn test_parse_full_store_section() {
        let config = HearthConfig::from_toml(
            r#"
[store.default]
driver = "memory"
expiry_secs = 90
decode_failure = "error"

[store.default.setting]
file = "data/sessions.db"
"#,
        )
        .unwrap();

        let session = config.store("default").unwrap().to_session_config();
        assert_eq!(session.driver, "memory");
        assert_eq!(session.expiry, Duration::from_secs(90));
        assert_eq!(session.decode_failure, DecodeFailurePolicy::Error);
        assert_eq!(session.setting_str("file"), Some("data/sessions.db"));
    }

    #[test]
    fn test_zero_expiry_uses_default() {
        let config = HearthConfig::from_toml(
            r#"
[store.web]
expiry_secs = 0
"#,
        )
        .unwrap();

        let session = config.store("web").unwrap().to_session_config();
        assert_eq!(session.expiry, DEFAULT_EXPIRY);
        assert_eq!(session.driver, hearth_session::DRIVER_NAME);
    }

    #[test]
    fn test_legacy_store_setting_is_kept() {
        let config = HearthConfig::from_toml(
            r#"
[store.old.setting]
store = "legacy/session.db"
"#,
        )
        .unwrap();

        let session = config.store("old").unwrap().to_session_config();
        assert_eq!(session.setting_str("store"), Some("legacy/session.db"));
    }

    #[test]
    fn test_missing_store() {
        let config = HearthConfig::new();
        let err = config.store("nope").unwrap_err();
        assert!(matches!(err, ConfigError::StoreNotFound(name) if name == "nope"));
        assert_eq!(
            config.session_config_or_default("nope"),
            SessionConfig::default()
        );
    }

    #[test]
    fn test_merge_replaces_sections() {
        let mut base = HearthConfig::from_toml(
            r#"
[store.default]
expiry_secs = 60

[store.admin]
expiry_secs = 30
"#,
        )
        .unwrap();
        let overlay = HearthConfig::from_toml(
            r#"
[store.default.setting]
file = "override.db"
"#,
        )
        .unwrap();

        base.merge(overlay);

        let default = base.store("default").unwrap();
        assert_eq!(default.expiry_secs, None);
        assert_eq!(default.to_session_config().setting_str("file"), Some("override.db"));
        assert_eq!(base.store("admin").unwrap().expiry_secs, Some(30));
    }
}
