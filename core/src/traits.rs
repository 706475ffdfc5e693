//! Core traits defining EDGECONSENT interfaces

use std::sync::Arc;

/// Result type for EDGECONSENT operations
pub type ConsentResult<T> = Result<T, crate::error::ConsentError>;

/// Durable string-keyed store holding serialized consent records.
///
/// Calls are synchronous and local. Implementations report an unreachable
/// backing store with `ConsentError::StoreUnavailable` and a store that can
/// be read but not written with `ConsentError::StoreReadOnly`.
pub trait PreferenceStore: Send + Sync {
    /// Get the value stored under `key`
    fn get(&self, key: &str) -> ConsentResult<Option<String>>;

    /// Store `value` under `key`, replacing any previous value
    fn put(&self, key: &str, value: &str) -> ConsentResult<()>;

    /// Delete `key`
    fn remove(&self, key: &str) -> ConsentResult<()>;

    /// Check if a key exists
    fn contains(&self, key: &str) -> ConsentResult<bool> {
        Ok(self.get(key)?.is_some())
    }
}

/// Shared handle to a preference store
pub type SharedPreferenceStore = Arc<dyn PreferenceStore>;
