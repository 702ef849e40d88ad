//! Typed collection handle over a [`ModelStore`].
//!
//! Writes outside a transaction go through here only for provisioning,
//! seeding and outbox bookkeeping. Ledger state that must move together
//! (balances, pledges, raised totals) is written through
//! [`run_transaction`](crate::transaction::run_transaction) instead.

use std::marker::PhantomData;

use super::{document_key, Model, ModelError, ModelStore, Subscription, Versioned};

/// One collection of a store, viewed as documents of type `M`.
pub struct ModelRepository<'a, S, M> {
    store: &'a S,
    _marker: PhantomData<M>,
}

impl<'a, S: ModelStore, M: Model> ModelRepository<'a, S, M> {
    pub fn new(store: &'a S) -> Self {
        Self {
            store,
            _marker: PhantomData,
        }
    }

    pub fn get(&self, id: &str) -> Result<Option<Versioned<M>>, ModelError> {
        self.store.get_model(id)
    }

    /// Like [`get`](Self::get), without the version.
    pub fn load(&self, id: &str) -> Result<Option<M>, ModelError> {
        Ok(self.get(id)?.map(|v| v.data))
    }

    pub fn exists(&self, id: &str) -> Result<bool, ModelError> {
        Ok(self.get(id)?.is_some())
    }

    /// Write regardless of the stored version.
    pub fn save(&self, model: &M) -> Result<Versioned<M>, ModelError> {
        self.store.save_model(model)
    }

    /// Fails with a concurrency conflict when the id is taken.
    pub fn insert(&self, model: &M) -> Result<Versioned<M>, ModelError> {
        self.store.insert_model(model)
    }

    /// Compare-and-set on `expected_version`.
    pub fn update(&self, model: &M, expected_version: u64) -> Result<Versioned<M>, ModelError> {
        self.store.update_model(model, expected_version)
    }

    /// Returns whether the document existed.
    pub fn delete(&self, id: &str) -> Result<bool, ModelError> {
        self.store.delete_model::<M>(id)
    }

    /// Matching documents with their versions, for callers that update them.
    pub fn find(&self, predicate: &dyn Fn(&M) -> bool) -> Result<Vec<Versioned<M>>, ModelError> {
        self.store.find_models(predicate)
    }

    /// Matching documents ordered by `order`.
    ///
    /// Scan order of the underlying store is unspecified, so reports and
    /// histories go through this rather than [`find`](Self::find).
    pub fn list_by<K: Ord>(
        &self,
        predicate: &dyn Fn(&M) -> bool,
        order: impl Fn(&M) -> K,
    ) -> Result<Vec<M>, ModelError> {
        let mut found: Vec<M> = self.find(predicate)?.into_iter().map(|v| v.data).collect();
        found.sort_by_key(|model| order(model));
        Ok(found)
    }

    /// Current state first, then every committed change to `id`.
    pub fn subscribe(&self, id: &str) -> Result<Subscription<M>, ModelError> {
        let rx = self.store.watch_raw(&document_key(M::COLLECTION, id))?;
        Ok(Subscription::new(rx))
    }
}

/// `store.models::<Pledge>()` on any [`ModelStore`].
pub trait ModelsExt: ModelStore + Sized {
    fn models<M: Model>(&self) -> ModelRepository<'_, Self, M> {
        ModelRepository::new(self)
    }
}

impl<S: ModelStore> ModelsExt for S {}
