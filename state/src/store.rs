//! Store operation and persistence outcome types

use serde::{Deserialize, Serialize};

/// A write applied to a preference store
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum StoreOp {
    Put { key: String, value: String },
    Remove { key: String },
}

impl StoreOp {
    pub fn key(&self) -> &str {
        match self {
            StoreOp::Put { key, .. } | StoreOp::Remove { key } => key,
        }
    }
}

/// What a persist attempt did with the durable record.
///
/// Informational only: failed writes are absorbed, never returned as errors.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PersistOutcome {
    /// The serialized document was written
    Written,
    /// The document was empty and the record was removed
    Removed,
    /// Current consents are unknown, nothing to write
    NothingToPersist,
    /// The store rejected the write; in-memory state is still updated
    Skipped(String),
}

impl PersistOutcome {
    pub fn is_durable(&self) -> bool {
        matches!(self, PersistOutcome::Written | PersistOutcome::Removed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_store_op_key() {
        let put = StoreOp::Put {
            key: "k1".to_string(),
            value: "v1".to_string(),
        };
        let remove = StoreOp::Remove { key: "k2".to_string() };

        assert_eq!(put.key(), "k1");
        assert_eq!(remove.key(), "k2");
    }

    #[test]
    fn test_outcome_durability() {
        assert!(PersistOutcome::Written.is_durable());
        assert!(PersistOutcome::Removed.is_durable());
        assert!(!PersistOutcome::NothingToPersist.is_durable());
        assert!(!PersistOutcome::Skipped("read only".into()).is_durable());
    }
}
