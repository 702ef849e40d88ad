//! Models - Versioned documents backing the ledger.
//!
//! Every persisted record (wallets, pledges, campaigns, outbox messages) is a
//! [`Model`]: a serde-serializable document stored under `"COLLECTION:id"`
//! with a monotonically increasing version used for optimistic concurrency.
//!
//! ## Example
//!
//! ```ignore
//! use pledge_ledger::{InMemoryModelStore, ModelsExt};
//!
//! let store = InMemoryModelStore::new();
//! store.models::<Wallet>().save(&wallet)?;
//! let loaded = store.models::<Wallet>().get("user-1")?;
//! ```

mod batch;
mod in_memory;
mod model_repository;
mod store;
mod subscription;

use serde::{de::DeserializeOwned, Serialize};

/// Trait for types that can be stored as documents.
pub trait Model: Serialize + DeserializeOwned + Clone + Send + Sync {
    /// The collection name for this model type (e.g., "wallets", "pledges").
    const COLLECTION: &'static str;

    /// Returns the unique identifier for this document.
    fn id(&self) -> &str;
}

/// A versioned wrapper around document data for optimistic concurrency control.
#[derive(Debug, Clone, PartialEq)]
pub struct Versioned<T> {
    pub data: T,
    pub version: u64,
}

/// Storage key of a document: `"COLLECTION:id"`.
pub fn document_key(collection: &str, id: &str) -> String {
    format!("{}:{}", collection, id)
}

/// Encode a document with the store's JSON codec.
pub fn encode_model<M: Model>(model: &M) -> Result<Vec<u8>, ModelError> {
    serde_json::to_vec(model).map_err(|e| ModelError::Serde(e.to_string()))
}

/// Decode a document with the store's JSON codec.
pub fn decode_model<M: Model>(bytes: &[u8]) -> Result<M, ModelError> {
    serde_json::from_slice(bytes).map_err(|e| ModelError::Serde(e.to_string()))
}

/// Error type for model store operations.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ModelError {
    /// Optimistic concurrency conflict.
    #[error("concurrency conflict on {collection}:{id} (expected version {expected}, actual {actual})")]
    ConcurrencyConflict {
        collection: String,
        id: String,
        expected: u64,
        actual: u64,
    },
    /// Serialization/deserialization error.
    #[error("model serialization error: {0}")]
    Serde(String),
    /// Storage-level error.
    #[error("model storage error: {0}")]
    Storage(String),
    /// Model not found.
    #[error("model not found: {collection}:{id}")]
    NotFound { collection: String, id: String },
}

impl ModelError {
    pub fn is_conflict(&self) -> bool {
        matches!(self, ModelError::ConcurrencyConflict { .. })
    }
}

pub use batch::{Precondition, ReadCheck, WriteBatch, WriteOp};
pub use in_memory::InMemoryModelStore;
pub use model_repository::{ModelRepository, ModelsExt};
pub use store::ModelStore;
pub use subscription::{RawChange, Snapshot, Subscription};
