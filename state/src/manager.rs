//! Consent state manager
//!
//! Owns the current consent document. It is loaded from the preference
//! store on construction and re-persisted after every merge. Storage
//! failures never reach callers: a failed load leaves the consents
//! unknown, a failed write leaves only the in-memory copy updated.
//!
//! The manager does no locking. Callers sharing it across threads must
//! guard reads and `merge_and_persist` with a single lock.

use edgeconsent_core::{
    ConsentDocument, PreferenceStore, SharedPreferenceStore, StoreConfig, CONSENT_PREFERENCES_KEY,
};
use tracing::{debug, warn};

use crate::store::PersistOutcome;

pub struct ConsentStateManager {
    store: SharedPreferenceStore,
    record_key: String,
    /// `None` while no consent has ever been recorded or loadable
    current: Option<ConsentDocument>,
}

impl ConsentStateManager {
    /// Create a manager over `store`, loading the persisted consents
    pub fn new(store: SharedPreferenceStore) -> Self {
        Self::with_record_key(store, CONSENT_PREFERENCES_KEY)
    }

    pub fn from_config(store: SharedPreferenceStore, config: &StoreConfig) -> Self {
        Self::with_record_key(store, config.record_key.clone())
    }

    pub fn with_record_key(store: SharedPreferenceStore, record_key: impl Into<String>) -> Self {
        let record_key = record_key.into();
        let current = load(&*store, &record_key);
        Self {
            store,
            record_key,
            current,
        }
    }

    /// Current consents, `None` when unknown
    pub fn current_consents(&self) -> Option<&ConsentDocument> {
        self.current.as_ref()
    }

    pub fn record_key(&self) -> &str {
        &self.record_key
    }

    /// Merge `incoming` into the current consents and persist the result.
    ///
    /// With no incoming document the current consents are re-persisted
    /// unchanged. An empty incoming document does not change known
    /// consents, but turns unknown consents into an empty document (which
    /// removes the record).
    pub fn merge_and_persist(&mut self, incoming: Option<ConsentDocument>) -> PersistOutcome {
        let merged = match (self.current.take(), incoming) {
            (current, None) => {
                self.current = current;
                return self.persist();
            }
            (current, Some(doc)) if doc.is_empty() => current.unwrap_or_default(),
            (None, Some(doc)) => doc,
            (Some(current), Some(doc)) => current.merge(&doc),
        };

        self.current = Some(merged);
        self.persist()
    }

    /// Forget the current consents and remove the durable record
    pub fn clear(&mut self) -> PersistOutcome {
        self.current = None;
        match self.store.remove(&self.record_key) {
            Ok(()) => PersistOutcome::Removed,
            Err(e) => {
                warn!("Unable to remove consent record {}: {}", self.record_key, e);
                PersistOutcome::Skipped(e.to_string())
            }
        }
    }

    fn persist(&self) -> PersistOutcome {
        let Some(current) = &self.current else {
            debug!("Consents unknown, nothing to persist");
            return PersistOutcome::NothingToPersist;
        };

        if current.is_empty() {
            return match self.store.remove(&self.record_key) {
                Ok(()) => {
                    debug!("Consents empty, removed record {}", self.record_key);
                    PersistOutcome::Removed
                }
                Err(e) => {
                    warn!("Unable to remove consent record {}: {}", self.record_key, e);
                    PersistOutcome::Skipped(e.to_string())
                }
            };
        }

        let json = match current.to_json() {
            Ok(json) => json,
            Err(e) => {
                warn!("Unable to serialize consents: {}", e);
                return PersistOutcome::Skipped(e.to_string());
            }
        };

        match self.store.put(&self.record_key, &json) {
            Ok(()) => {
                debug!("Persisted consents under {}", self.record_key);
                PersistOutcome::Written
            }
            Err(e) => {
                warn!("Unable to persist consents, keeping them in memory only: {}", e);
                PersistOutcome::Skipped(e.to_string())
            }
        }
    }
}

fn load(store: &dyn PreferenceStore, record_key: &str) -> Option<ConsentDocument> {
    let json = match store.get(record_key) {
        Ok(Some(json)) => json,
        Ok(None) => {
            debug!("No consents persisted under {}", record_key);
            return None;
        }
        Err(e) => {
            warn!("Unable to read persisted consents: {}", e);
            return None;
        }
    };

    match ConsentDocument::from_json(&json) {
        Ok(document) => {
            debug!("Loaded persisted consents from {}", record_key);
            Some(document)
        }
        Err(e) => {
            warn!("Persisted consents under {} are corrupt, ignoring them: {}", record_key, e);
            None
        }
    }
}
