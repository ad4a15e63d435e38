//! Configuration handed to a driver when connecting a named store.

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Default expiry applied when neither the caller nor the config supplies one.
pub const DEFAULT_EXPIRY: Duration = Duration::from_secs(20 * 60);

/// Location used when no setting and no driver default is available.
pub const FALLBACK_STORE: &str = "store/session.db";

/// Free-form driver settings (`file`, `store`, ...).
pub type Settings = serde_json::Map<String, serde_json::Value>;

/// What `read` does when a stored value is not a JSON object.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DecodeFailurePolicy {
    /// Return `Ok(None)`, as if the session held nothing.
    #[default]
    Empty,
    /// Return [`SessionError::Decode`](crate::SessionError::Decode).
    Error,
}

/// Configuration for one named session store.
#[derive(Debug, Clone, PartialEq)]
pub struct SessionConfig {
    /// Registered driver name.
    pub driver: String,

    /// Expiry used by writes that pass a zero duration.
    pub expiry: Duration,

    /// Driver-specific settings.
    pub setting: Settings,

    /// Behavior of `read` on undecodable values.
    pub decode_failure: DecodeFailurePolicy,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            driver: crate::DRIVER_NAME.to_string(),
            expiry: DEFAULT_EXPIRY,
            setting: Settings::new(),
            decode_failure: DecodeFailurePolicy::default(),
        }
    }
}

impl SessionConfig {
    /// Create a configuration with default values.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the default expiry.
    pub fn with_expiry(mut self, expiry: Duration) -> Self {
        self.expiry = expiry;
        self
    }

    /// Set a driver setting.
    pub fn with_setting(
        mut self,
        key: impl Into<String>,
        value: impl Into<serde_json::Value>,
    ) -> Self {
        self.setting.insert(key.into(), value.into());
        self
    }

    /// Set the decode failure policy.
    pub fn with_decode_failure(mut self, policy: DecodeFailurePolicy) -> Self {
        self.decode_failure = policy;
        self
    }

    /// Non-empty string setting, if present.
    pub fn setting_str(&self, key: &str) -> Option<&str> {
        self.setting
            .get(key)
            .and_then(|v| v.as_str())
            .filter(|s| !s.is_empty())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = SessionConfig::new();
        assert_eq!(config.driver, "sqlite");
        assert_eq!(config.expiry, DEFAULT_EXPIRY);
        assert!(config.setting.is_empty());
        assert_eq!(config.decode_failure, DecodeFailurePolicy::Empty);
    }

    #[test]
    fn test_setting_str_ignores_empty_and_non_strings() {
        let config = SessionConfig::new()
            .with_setting("file", "")
            .with_setting("store", 42)
            .with_setting("name", "sessions.db");

        assert_eq!(config.setting_str("file"), None);
        assert_eq!(config.setting_str("store"), None);
        assert_eq!(config.setting_str("name"), Some("sessions.db"));
        assert_eq!(config.setting_str("missing"), None);
    }

    #[test]
    fn test_decode_failure_policy_serde() {
        let policy: DecodeFailurePolicy = serde_json::from_str("\"error\"").unwrap();
        assert_eq!(policy, DecodeFailurePolicy::Error);
        assert_eq!(
            serde_json::to_string(&DecodeFailurePolicy::Empty).unwrap(),
            "\"empty\""
        );
    }
}
