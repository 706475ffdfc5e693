//! Error types for EDGECONSENT

use thiserror::Error;

/// Main error type for EDGECONSENT
#[derive(Error, Debug)]
pub enum ConsentError {
    // ============ Store Errors ============
    #[error("Preference store unavailable: {0}")]
    StoreUnavailable(String),

    #[error("Preference store is not writable: {0}")]
    StoreReadOnly(String),

    #[error("Storage error: {0}")]
    StorageError(String),

    // ============ Document Errors ============
    #[error("Invalid consent document: {0}")]
    InvalidDocument(String),

    #[error("Serialization failed: {0}")]
    SerializationError(String),

    #[error("Deserialization failed: {0}")]
    DeserializationError(String),

    // ============ Event Errors ============
    #[error("No handler registered for {event_type}/{event_source}")]
    UnhandledEvent {
        event_type: String,
        event_source: String,
    },

    // ============ Configuration Errors ============
    #[error("Configuration error: {0}")]
    ConfigError(String),

    // ============ General Errors ============
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl From<std::io::Error> for ConsentError {
    fn from(err: std::io::Error) -> Self {
        ConsentError::StorageError(err.to_string())
    }
}

impl From<serde_json::Error> for ConsentError {
    fn from(err: serde_json::Error) -> Self {
        ConsentError::DeserializationError(err.to_string())
    }
}
