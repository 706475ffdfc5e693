//! Persistent preference store using sled database

use edgeconsent_core::{ConsentError, ConsentResult, PreferenceStore, StoreConfig};
use sled::{Db, Tree};
use std::path::Path;
use std::sync::Arc;
use tracing::debug;

/// Persistent preference store backed by one sled tree per store name
pub struct SledPreferenceStore {
    db: Db,
    tree: Tree,
}

impl SledPreferenceStore {
    pub fn open<P: AsRef<Path>>(path: P, store_name: &str) -> ConsentResult<Self> {
        let db = sled::open(path.as_ref())
            .map_err(|e| ConsentError::StoreUnavailable(e.to_string()))?;
        let tree = db
            .open_tree(store_name)
            .map_err(|e| ConsentError::StoreUnavailable(e.to_string()))?;

        debug!("Opened preference store {} at {}", store_name, path.as_ref().display());

        Ok(Self { db, tree })
    }

    pub fn from_config(config: &StoreConfig) -> ConsentResult<Self> {
        Self::open(&config.data_dir, &config.store_name)
    }

    /// Number of records in the store
    pub fn len(&self) -> usize {
        self.tree.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tree.is_empty()
    }

    fn flush(&self) -> ConsentResult<()> {
        self.db
            .flush()
            .map(|_| ())
            .map_err(|e| ConsentError::StorageError(e.to_string()))
    }
}

impl PreferenceStore for SledPreferenceStore {
    fn get(&self, key: &str) -> ConsentResult<Option<String>> {
        let value = self
            .tree
            .get(key)
            .map_err(|e| ConsentError::StorageError(e.to_string()))?;

        match value {
            Some(bytes) => String::from_utf8(bytes.to_vec())
                .map(Some)
                .map_err(|e| ConsentError::DeserializationError(e.to_string())),
            None => Ok(None),
        }
    }

    fn put(&self, key: &str, value: &str) -> ConsentResult<()> {
        self.tree
            .insert(key, value.as_bytes())
            .map_err(|e| ConsentError::StorageError(e.to_string()))?;
        self.flush()
    }

    fn remove(&self, key: &str) -> ConsentResult<()> {
        self.tree
            .remove(key)
            .map_err(|e| ConsentError::StorageError(e.to_string()))?;
        self.flush()
    }
}

/// Thread-safe persistent store wrapper
pub type SharedSledPreferenceStore = Arc<SledPreferenceStore>;

/// Create a shared persistent preference store
pub fn create_persistent_store<P: AsRef<Path>>(
    path: P,
    store_name: &str,
) -> ConsentResult<SharedSledPreferenceStore> {
    Ok(Arc::new(SledPreferenceStore::open(path, store_name)?))
}

#[cfg(test)]
mod tests {
    use super::*;
    use edgeconsent_core::DATASTORE_NAME;
    use tempfile::TempDir;

    #[test]
    fn test_persistent_store_basic() {
        let tmp = TempDir::new().unwrap();
        let store = SledPreferenceStore::open(tmp.path(), DATASTORE_NAME).unwrap();

        store.put("key1", "value1").unwrap();
        assert_eq!(store.get("key1").unwrap(), Some("value1".to_string()));

        store.remove("key1").unwrap();
        assert_eq!(store.get("key1").unwrap(), None);
        assert!(store.is_empty());
    }

    #[test]
    fn test_persistent_store_reopen() {
        let tmp = TempDir::new().unwrap();

        {
            let store = SledPreferenceStore::open(tmp.path(), DATASTORE_NAME).unwrap();
            store.put("key1", "value1").unwrap();
        }

        {
            let store = SledPreferenceStore::open(tmp.path(), DATASTORE_NAME).unwrap();
            assert_eq!(store.get("key1").unwrap(), Some("value1".to_string()));
            assert_eq!(store.len(), 1);
        }
    }

    #[test]
    fn test_store_names_are_isolated() {
        let tmp = TempDir::new().unwrap();
        let db_path = tmp.path().join("db");

        let store = SledPreferenceStore::open(&db_path, "one").unwrap();
        store.put("key", "value").unwrap();
        drop(store);

        let other = SledPreferenceStore::open(&db_path, "two").unwrap();
        assert_eq!(other.get("key").unwrap(), None);
    }
}
