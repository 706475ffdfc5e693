//! In-memory preference store for testing and ephemeral hosts

use dashmap::DashMap;
use edgeconsent_core::{ConsentError, ConsentResult, PreferenceStore};
use parking_lot::RwLock;
use std::sync::Arc;

use crate::store::StoreOp;

/// In-memory preference store.
///
/// Availability switches let callers simulate a host that cannot hand out
/// its store, or one whose write path is gone.
pub struct MemoryPreferenceStore {
    data: DashMap<String, String>,
    available: RwLock<bool>,
    writable: RwLock<bool>,
    history: RwLock<Vec<StoreOp>>,
}

impl MemoryPreferenceStore {
    pub fn new() -> Self {
        Self {
            data: DashMap::new(),
            available: RwLock::new(true),
            writable: RwLock::new(true),
            history: RwLock::new(Vec::new()),
        }
    }

    pub fn with_data(data: Vec<(String, String)>) -> Self {
        let store = Self::new();
        for (key, value) in data {
            store.data.insert(key, value);
        }
        store
    }

    /// Make every operation fail with `StoreUnavailable`
    pub fn set_available(&self, available: bool) {
        *self.available.write() = available;
    }

    /// Make writes fail with `StoreReadOnly`; reads still work
    pub fn set_writable(&self, writable: bool) {
        *self.writable.write() = writable;
    }

    /// Writes applied so far, oldest first
    pub fn history(&self) -> Vec<StoreOp> {
        self.history.read().clone()
    }

    pub fn clear_history(&self) {
        self.history.write().clear();
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    fn check_available(&self) -> ConsentResult<()> {
        if *self.available.read() {
            Ok(())
        } else {
            Err(ConsentError::StoreUnavailable("memory store detached".into()))
        }
    }

    fn check_writable(&self) -> ConsentResult<()> {
        self.check_available()?;
        if *self.writable.read() {
            Ok(())
        } else {
            Err(ConsentError::StoreReadOnly("memory store has no editor".into()))
        }
    }
}

impl Default for MemoryPreferenceStore {
    fn default() -> Self {
        Self::new()
    }
}

impl PreferenceStore for MemoryPreferenceStore {
    fn get(&self, key: &str) -> ConsentResult<Option<String>> {
        self.check_available()?;
        Ok(self.data.get(key).map(|v| v.value().clone()))
    }

    fn put(&self, key: &str, value: &str) -> ConsentResult<()> {
        self.check_writable()?;
        self.data.insert(key.to_string(), value.to_string());
        self.history.write().push(StoreOp::Put {
            key: key.to_string(),
            value: value.to_string(),
        });
        Ok(())
    }

    fn remove(&self, key: &str) -> ConsentResult<()> {
        self.check_writable()?;
        self.data.remove(key);
        self.history.write().push(StoreOp::Remove { key: key.to_string() });
        Ok(())
    }
}

/// Thread-safe memory store wrapper
pub type SharedMemoryPreferenceStore = Arc<MemoryPreferenceStore>;

/// Create a shared memory preference store
pub fn create_memory_store() -> SharedMemoryPreferenceStore {
    Arc::new(MemoryPreferenceStore::new())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_memory_store_basic() {
        let store = MemoryPreferenceStore::new();

        store.put("key1", "value1").unwrap();
        assert_eq!(store.get("key1").unwrap(), Some("value1".to_string()));
        assert!(store.contains("key1").unwrap());

        store.remove("key1").unwrap();
        assert_eq!(store.get("key1").unwrap(), None);
        assert!(store.is_empty());

        assert_eq!(
            store.history(),
            vec![
                StoreOp::Put {
                    key: "key1".into(),
                    value: "value1".into()
                },
                StoreOp::Remove { key: "key1".into() },
            ]
        );
    }

    #[test]
    fn test_memory_store_unavailable() {
        let store = MemoryPreferenceStore::with_data(vec![("k".into(), "v".into())]);
        store.set_available(false);

        assert!(matches!(store.get("k"), Err(ConsentError::StoreUnavailable(_))));
        assert!(matches!(store.put("k", "w"), Err(ConsentError::StoreUnavailable(_))));

        store.set_available(true);
        assert_eq!(store.get("k").unwrap(), Some("v".to_string()));
    }

    #[test]
    fn test_memory_store_read_only() {
        let store = MemoryPreferenceStore::with_data(vec![("k".into(), "v".into())]);
        store.set_writable(false);

        assert_eq!(store.get("k").unwrap(), Some("v".to_string()));
        assert!(matches!(store.put("k", "w"), Err(ConsentError::StoreReadOnly(_))));
        assert!(matches!(store.remove("k"), Err(ConsentError::StoreReadOnly(_))));
        assert_eq!(store.len(), 1);
        assert!(store.history().is_empty());
    }
}
