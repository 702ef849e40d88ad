//! InMemoryModelStore - HashMap-backed document store for tests and single-process use.

use std::collections::HashMap;
use std::sync::mpsc::{channel, Receiver, Sender};
use std::sync::{Arc, Mutex, RwLock, RwLockReadGuard, RwLockWriteGuard};

use super::{
    decode_model, document_key, encode_model, Model, ModelError, ModelStore, RawChange,
    Versioned, WriteBatch,
};

/// Internal stored representation of a document.
struct StoredModel {
    bytes: Vec<u8>,
    version: u64,
}

type Storage = HashMap<String, StoredModel>;
type Watchers = HashMap<String, Vec<Sender<RawChange>>>;

/// In-memory document store backed by a HashMap.
///
/// Storage key is `"COLLECTION:id"`. Clone-friendly via Arc: clones share the
/// same documents and watchers. Batch commits run under a single write lock,
/// which makes them atomic with respect to every other operation.
#[derive(Clone)]
pub struct InMemoryModelStore {
    storage: Arc<RwLock<Storage>>,
    watchers: Arc<Mutex<Watchers>>,
}

impl Default for InMemoryModelStore {
    fn default() -> Self {
        Self::new()
    }
}

impl InMemoryModelStore {
    /// Create a new empty store.
    pub fn new() -> Self {
        Self {
            storage: Arc::new(RwLock::new(HashMap::new())),
            watchers: Arc::new(Mutex::new(HashMap::new())),
        }
    }

    /// Number of stored documents across all collections.
    pub fn len(&self) -> Result<usize, ModelError> {
        Ok(self.read()?.len())
    }

    pub fn is_empty(&self) -> Result<bool, ModelError> {
        Ok(self.read()?.is_empty())
    }

    fn read(&self) -> Result<RwLockReadGuard<'_, Storage>, ModelError> {
        self.storage
            .read()
            .map_err(|_| ModelError::Storage("lock poisoned".into()))
    }

    fn write(&self) -> Result<RwLockWriteGuard<'_, Storage>, ModelError> {
        self.storage
            .write()
            .map_err(|_| ModelError::Storage("lock poisoned".into()))
    }

    /// Store bytes under `key`, bumping the version. Caller holds the write lock.
    fn put_locked(storage: &mut Storage, key: &str, bytes: Vec<u8>) -> u64 {
        let version = storage.get(key).map(|s| s.version + 1).unwrap_or(1);
        storage.insert(key.to_string(), StoredModel { bytes, version });
        version
    }

    /// Push changes to watchers, dropping closed receivers.
    /// Called while the storage write lock is held so watchers see commit order.
    fn notify(&self, changes: Vec<(String, RawChange)>) -> Result<(), ModelError> {
        if changes.is_empty() {
            return Ok(());
        }
        let mut watchers = self
            .watchers
            .lock()
            .map_err(|_| ModelError::Storage("watcher lock poisoned".into()))?;
        for (key, change) in changes {
            if let Some(senders) = watchers.get_mut(&key) {
                senders.retain(|tx| tx.send(change.clone()).is_ok());
                if senders.is_empty() {
                    watchers.remove(&key);
                }
            }
        }
        Ok(())
    }
}

fn version_of(storage: &Storage, key: &str) -> u64 {
    storage.get(key).map(|s| s.version).unwrap_or(0)
}

impl ModelStore for InMemoryModelStore {
    fn get_model<M: Model>(&self, id: &str) -> Result<Option<Versioned<M>>, ModelError> {
        let key = document_key(M::COLLECTION, id);
        let storage = self.read()?;

        match storage.get(&key) {
            Some(stored) => Ok(Some(Versioned {
                data: decode_model(&stored.bytes)?,
                version: stored.version,
            })),
            None => Ok(None),
        }
    }

    fn save_model<M: Model>(&self, model: &M) -> Result<Versioned<M>, ModelError> {
        let key = document_key(M::COLLECTION, model.id());
        let bytes = encode_model(model)?;

        let mut storage = self.write()?;
        let version = Self::put_locked(&mut storage, &key, bytes.clone());
        self.notify(vec![(
            key,
            RawChange {
                version,
                bytes: Some(bytes),
            },
        )])?;

        Ok(Versioned {
            data: model.clone(),
            version,
        })
    }

    fn insert_model<M: Model>(&self, model: &M) -> Result<Versioned<M>, ModelError> {
        let key = document_key(M::COLLECTION, model.id());
        let bytes = encode_model(model)?;

        let mut storage = self.write()?;
        let actual = version_of(&storage, &key);
        if actual != 0 {
            return Err(ModelError::ConcurrencyConflict {
                collection: M::COLLECTION.to_string(),
                id: model.id().to_string(),
                expected: 0,
                actual,
            });
        }

        let version = Self::put_locked(&mut storage, &key, bytes.clone());
        self.notify(vec![(
            key,
            RawChange {
                version,
                bytes: Some(bytes),
            },
        )])?;

        Ok(Versioned {
            data: model.clone(),
            version,
        })
    }

    fn update_model<M: Model>(
        &self,
        model: &M,
        expected_version: u64,
    ) -> Result<Versioned<M>, ModelError> {
        let key = document_key(M::COLLECTION, model.id());
        let bytes = encode_model(model)?;

        let mut storage = self.write()?;
        let actual = version_of(&storage, &key);
        if actual == 0 {
            return Err(ModelError::NotFound {
                collection: M::COLLECTION.to_string(),
                id: model.id().to_string(),
            });
        }
        if actual != expected_version {
            return Err(ModelError::ConcurrencyConflict {
                collection: M::COLLECTION.to_string(),
                id: model.id().to_string(),
                expected: expected_version,
                actual,
            });
        }

        let version = Self::put_locked(&mut storage, &key, bytes.clone());
        self.notify(vec![(
            key,
            RawChange {
                version,
                bytes: Some(bytes),
            },
        )])?;

        Ok(Versioned {
            data: model.clone(),
            version,
        })
    }

    fn delete_model<M: Model>(&self, id: &str) -> Result<bool, ModelError> {
        let key = document_key(M::COLLECTION, id);
        let mut storage = self.write()?;

        let removed = storage.remove(&key);
        if let Some(stored) = &removed {
            self.notify(vec![(
                key,
                RawChange {
                    version: stored.version + 1,
                    bytes: None,
                },
            )])?;
        }
        Ok(removed.is_some())
    }

    fn find_models<M: Model>(
        &self,
        predicate: &dyn Fn(&M) -> bool,
    ) -> Result<Vec<Versioned<M>>, ModelError> {
        let storage = self.read()?;

        let prefix = format!("{}:", M::COLLECTION);
        let mut results = Vec::new();

        for (key, stored) in storage.iter() {
            if key.starts_with(&prefix) {
                let data: M = decode_model(&stored.bytes)?;
                if predicate(&data) {
                    results.push(Versioned {
                        data,
                        version: stored.version,
                    });
                }
            }
        }

        Ok(results)
    }

    fn commit_batch(&self, batch: WriteBatch) -> Result<(), ModelError> {
        let (writes, checks) = batch.into_parts();
        let mut storage = self.write()?;

        for check in &checks {
            let actual = version_of(&storage, &check.key());
            if actual != check.version {
                return Err(ModelError::ConcurrencyConflict {
                    collection: check.collection.clone(),
                    id: check.id.clone(),
                    expected: check.version,
                    actual,
                });
            }
        }

        for write in &writes {
            let actual = version_of(&storage, &write.key());
            if !write.precondition.holds(actual) {
                return Err(ModelError::ConcurrencyConflict {
                    collection: write.collection.clone(),
                    id: write.id.clone(),
                    expected: write.precondition.expected(),
                    actual,
                });
            }
        }

        let mut changes = Vec::with_capacity(writes.len());
        for write in writes {
            let key = write.key();
            match write.bytes {
                Some(bytes) => {
                    let version = Self::put_locked(&mut storage, &key, bytes.clone());
                    changes.push((
                        key,
                        RawChange {
                            version,
                            bytes: Some(bytes),
                        },
                    ));
                }
                None => {
                    if let Some(stored) = storage.remove(&key) {
                        changes.push((
                            key,
                            RawChange {
                                version: stored.version + 1,
                                bytes: None,
                            },
                        ));
                    }
                }
            }
        }

        self.notify(changes)
    }

    fn watch_raw(&self, key: &str) -> Result<Receiver<RawChange>, ModelError> {
        let storage = self.read()?;
        let (tx, rx) = channel();

        if let Some(stored) = storage.get(key) {
            // The receiver is still in scope, so this send cannot fail.
            let _ = tx.send(RawChange {
                version: stored.version,
                bytes: Some(stored.bytes.clone()),
            });
        }

        let mut watchers = self
            .watchers
            .lock()
            .map_err(|_| ModelError::Storage("watcher lock poisoned".into()))?;
        watchers.entry(key.to_string()).or_default().push(tx);

        Ok(rx)
    }
}
