//! ModelStore - Abstract versioned document storage.

use std::sync::mpsc::Receiver;

use super::{Model, ModelError, RawChange, Versioned, WriteBatch};

/// Abstract versioned document storage.
pub trait ModelStore: Send + Sync {
    /// Get a model by ID. Returns None if not found.
    fn get_model<M: Model>(&self, id: &str) -> Result<Option<Versioned<M>>, ModelError>;

    /// Upsert a model (insert or update, no version check).
    fn save_model<M: Model>(&self, model: &M) -> Result<Versioned<M>, ModelError>;

    /// Insert a new model. Fails if it already exists.
    fn insert_model<M: Model>(&self, model: &M) -> Result<Versioned<M>, ModelError>;

    /// Update an existing model with optimistic concurrency control.
    fn update_model<M: Model>(
        &self,
        model: &M,
        expected_version: u64,
    ) -> Result<Versioned<M>, ModelError>;

    /// Delete a model by ID. Returns true if it existed.
    fn delete_model<M: Model>(&self, id: &str) -> Result<bool, ModelError>;

    /// Find models matching a predicate.
    fn find_models<M: Model>(
        &self,
        predicate: &dyn Fn(&M) -> bool,
    ) -> Result<Vec<Versioned<M>>, ModelError>;

    /// Apply every write in the batch atomically, or none of them.
    ///
    /// Fails with `ConcurrencyConflict` if any write precondition or read
    /// check does not hold against the current versions.
    fn commit_batch(&self, batch: WriteBatch) -> Result<(), ModelError>;

    /// Watch a document key. The receiver first gets the current state,
    /// then every committed change.
    fn watch_raw(&self, key: &str) -> Result<Receiver<RawChange>, ModelError>;
}
