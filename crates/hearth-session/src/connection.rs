//! Session connection: one engine handle plus the store's resolved settings.

use std::time::Duration;

use serde::Serialize;
use serde::de::DeserializeOwned;
use serde::ser::Error as _;
use tracing::{debug, info, warn};

use crate::config::{DecodeFailurePolicy, SessionConfig};
use crate::engine::{Engine, SetOptions};
use crate::error::{Result, SessionError};

/// A session record: string keys mapped to arbitrary JSON values.
pub type SessionMap = serde_json::Map<String, serde_json::Value>;

/// Operations a session store exposes to the hosting framework.
///
/// `open` and `close` need exclusive access; the data operations take
/// `&self` and may be called from any number of threads at once.
pub trait SessionConnect: Send + Sync {
    /// Open the underlying store.
    fn open(&mut self) -> Result<()>;

    /// Release the underlying store. No-op when not open.
    fn close(&mut self) -> Result<()>;

    /// Load the session stored at `key`.
    fn read(&self, key: &str) -> Result<Option<SessionMap>>;

    /// Store `value` at `key` for `expiry` (zero means the configured default).
    fn write(&self, key: &str, value: &SessionMap, expiry: Duration) -> Result<()>;

    /// Remove the session at `key`.
    fn delete(&self, key: &str) -> Result<()>;

    /// Remove every session whose key starts with `prefix`.
    fn clear(&self, prefix: &str) -> Result<()>;

    /// Live keys starting with `prefix`, in ascending order.
    fn keys(&self, prefix: &str) -> Result<Vec<String>>;
}

/// Connection to an embedded session store.
///
/// Created by [`Driver::connect`](crate::Driver::connect) without touching
/// the store; [`open`](Connection::open) does the I/O.
#[derive(Debug)]
pub struct Connection {
    name: String,
    config: SessionConfig,
    store: String,
    db: Option<Engine>,
}

impl Connection {
    pub(crate) fn new(name: impl Into<String>, config: SessionConfig, store: String) -> Self {
        Self {
            name: name.into(),
            config,
            store,
            db: None,
        }
    }

    /// Instance name this connection was created for.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Resolved storage location.
    pub fn store(&self) -> &str {
        &self.store
    }

    /// Configuration snapshot taken at connect time.
    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    /// Whether an engine handle is held.
    pub fn is_open(&self) -> bool {
        self.db.is_some()
    }

    /// Open (or create) the store at the resolved location.
    ///
    /// Opening an already open connection keeps the existing handle.
    pub fn open(&mut self) -> Result<()> {
        if self.store.is_empty() {
            return Err(SessionError::InvalidStore);
        }
        if self.db.is_some() {
            debug!(name = %self.name, "Session store already open");
            return Ok(());
        }

        let db = Engine::open(&self.store)?;
        self.db = Some(db);

        info!(name = %self.name, store = %self.store, "Session store opened");
        Ok(())
    }

    /// Release the engine handle, if any.
    pub fn close(&mut self) -> Result<()> {
        if let Some(db) = self.db.take() {
            db.close()?;
            info!(name = %self.name, "Session store closed");
        }
        Ok(())
    }

    /// Load the session at `key`.
    ///
    /// A missing or expired key is the engine's not-found error. A stored
    /// value that is not a JSON object yields `Ok(None)` unless the store is
    /// configured with [`DecodeFailurePolicy::Error`].
    pub fn read(&self, key: &str) -> Result<Option<SessionMap>> {
        let db = self.db()?;
        let raw = db.view(|tx| tx.get(key))?;

        match serde_json::from_str::<SessionMap>(&raw) {
            Ok(value) => Ok(Some(value)),
            Err(e) => match self.config.decode_failure {
                DecodeFailurePolicy::Empty => {
                    warn!(name = %self.name, key = %key, error = %e, "Undecodable session value, treating as empty");
                    Ok(None)
                }
                DecodeFailurePolicy::Error => Err(SessionError::Decode(e)),
            },
        }
    }

    /// Store `value` at `key`.
    ///
    /// A zero `expiry` falls back to the configured default.
    pub fn write(&self, key: &str, value: &SessionMap, expiry: Duration) -> Result<()> {
        let db = self.db()?;
        let raw = serde_json::to_string(value).map_err(SessionError::Serialization)?;
        let expiry = if expiry.is_zero() {
            self.config.expiry
        } else {
            expiry
        };

        db.update(|tx| tx.set(key, &raw, SetOptions::with_ttl(expiry)))?;
        debug!(name = %self.name, key = %key, ttl_ms = expiry.as_millis() as u64, "Session written");
        Ok(())
    }

    /// Remove the session at `key`; a missing key is the engine's not-found error.
    pub fn delete(&self, key: &str) -> Result<()> {
        let db = self.db()?;
        db.update(|tx| tx.delete(key))?;
        debug!(name = %self.name, key = %key, "Session deleted");
        Ok(())
    }

    /// Remove every session whose key starts with `prefix`.
    ///
    /// Matching keys are collected first and deleted afterwards, all inside
    /// one write transaction.
    pub fn clear(&self, prefix: &str) -> Result<()> {
        let db = self.db()?;
        let removed = db.update(|tx| {
            let mut keys = Vec::new();
            tx.ascend_keys(prefix, |key, _| {
                keys.push(key.to_string());
                true
            })?;

            for key in &keys {
                tx.delete(key)?;
            }
            Ok(keys.len())
        })?;

        debug!(name = %self.name, prefix = %prefix, removed, "Sessions cleared");
        Ok(())
    }

    /// Live keys starting with `prefix`, in ascending order.
    pub fn keys(&self, prefix: &str) -> Result<Vec<String>> {
        let db = self.db()?;
        let keys = db.view(|tx| {
            let mut keys = Vec::new();
            tx.ascend_keys(prefix, |key, _| {
                keys.push(key.to_string());
                true
            })?;
            Ok(keys)
        })?;
        Ok(keys)
    }

    /// Remaining lifetime of the session at `key`; `None` if it never expires.
    pub fn ttl(&self, key: &str) -> Result<Option<Duration>> {
        let db = self.db()?;
        Ok(db.view(|tx| tx.ttl(key))?)
    }

    /// Serialize `value` and store it at `key`.
    ///
    /// Fails with [`SessionError::Serialization`] when `value` cannot be
    /// encoded or does not encode to a JSON object.
    pub fn write_value<T: Serialize>(&self, key: &str, value: &T, expiry: Duration) -> Result<()> {
        let value = serde_json::to_value(value).map_err(SessionError::Serialization)?;
        match value {
            serde_json::Value::Object(map) => self.write(key, &map, expiry),
            other => Err(SessionError::Serialization(serde_json::Error::custom(
                format!("session value must be a JSON object, got {}", json_kind(&other)),
            ))),
        }
    }

    /// Load the session at `key` and deserialize it into `T`.
    pub fn read_value<T: DeserializeOwned>(&self, key: &str) -> Result<Option<T>> {
        match self.read(key)? {
            Some(map) => serde_json::from_value(serde_json::Value::Object(map))
                .map(Some)
                .map_err(SessionError::Decode),
            None => Ok(None),
        }
    }

    fn db(&self) -> Result<&Engine> {
        self.db.as_ref().ok_or(SessionError::InvalidDatabase)
    }
}

impl SessionConnect for Connection {
    fn open(&mut self) -> Result<()> {
        Connection::open(self)
    }

    fn close(&mut self) -> Result<()> {
        Connection::close(self)
    }

    fn read(&self, key: &str) -> Result<Option<SessionMap>> {
        Connection::read(self, key)
    }

    fn write(&self, key: &str, value: &SessionMap, expiry: Duration) -> Result<()> {
        Connection::write(self, key, value, expiry)
    }

    fn delete(&self, key: &str) -> Result<()> {
        Connection::delete(self, key)
    }

    fn clear(&self, prefix: &str) -> Result<()> {
        Connection::clear(self, prefix)
    }

    fn keys(&self, prefix: &str) -> Result<Vec<String>> {
        Connection::keys(self, prefix)
    }
}

fn json_kind(value: &serde_json::Value) -> &'static str {
    match value {
        serde_json::Value::Null => "null",
        serde_json::Value::Bool(_) => "a boolean",
        serde_json::Value::Number(_) => "a number",
        serde_json::Value::String(_) => "a string",
        serde_json::Value::Array(_) => "an array",
        serde_json::Value::Object(_) => "an object",
    }
}
