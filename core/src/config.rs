//! Configuration types for EDGECONSENT

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::error::ConsentError;
use crate::traits::ConsentResult;

/// Name of the durable store holding consent records
pub const DATASTORE_NAME: &str = "com.adobe.edge.consent";

/// Record key of the serialized consent document
pub const CONSENT_PREFERENCES_KEY: &str = "consent:preferences";

/// Main configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ConsentConfig {
    /// Store configuration
    pub store: StoreConfig,

    /// Logging level
    pub log_level: String,
}

impl Default for ConsentConfig {
    fn default() -> Self {
        Self {
            store: StoreConfig::default(),
            log_level: "info".to_string(),
        }
    }
}

impl ConsentConfig {
    pub fn from_json(json: &str) -> ConsentResult<Self> {
        serde_json::from_str(json).map_err(|e| ConsentError::ConfigError(e.to_string()))
    }

    pub fn to_json(&self) -> ConsentResult<String> {
        serde_json::to_string_pretty(self)
            .map_err(|e| ConsentError::SerializationError(e.to_string()))
    }

    /// Load configuration from a JSON file
    pub fn load<P: AsRef<Path>>(path: P) -> ConsentResult<Self> {
        let content = std::fs::read_to_string(path.as_ref()).map_err(|e| {
            ConsentError::ConfigError(format!("{}: {}", path.as_ref().display(), e))
        })?;
        Self::from_json(&content)
    }
}

/// Durable store configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StoreConfig {
    /// Data directory
    pub data_dir: PathBuf,

    /// Store (sled tree) name
    pub store_name: String,

    /// Key of the consent record inside the store
    pub record_key: String,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from("./data"),
            store_name: DATASTORE_NAME.to_string(),
            record_key: CONSENT_PREFERENCES_KEY.to_string(),
        }
    }
}
