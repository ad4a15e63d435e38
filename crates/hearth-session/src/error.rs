//! Error types for session storage.

use crate::engine::EngineError;

/// Errors surfaced by drivers and connections.
#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    /// The resolved storage location is empty.
    #[error("Invalid store.")]
    InvalidStore,

    /// The connection has no open database handle.
    #[error("Invalid database.")]
    InvalidDatabase,

    /// The value could not be encoded as a JSON object.
    #[error("Serialization error: {0}")]
    Serialization(#[source] serde_json::Error),

    /// A stored value could not be decoded (only under `DecodeFailurePolicy::Error`).
    #[error("Decode error: {0}")]
    Decode(#[source] serde_json::Error),

    /// No driver is registered under the requested name.
    #[error("Unknown session driver: {0}")]
    UnknownDriver(String),

    /// Error from the embedded engine, passed through unchanged.
    #[error(transparent)]
    Engine(#[from] EngineError),
}

impl SessionError {
    /// Whether this error is the engine's not-found condition.
    pub fn is_not_found(&self) -> bool {
        matches!(self, SessionError::Engine(EngineError::NotFound))
    }
}

/// Result type alias for session operations.
pub type Result<T> = std::result::Result<T, SessionError>;
