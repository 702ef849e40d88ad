//! Transactions - Optimistic read-then-write units over a [`ModelStore`].
//!
//! A transaction reads documents first, then stages writes. Nothing reaches
//! the store until [`run_transaction`] commits the staged writes as one
//! [`WriteBatch`], guarded by the versions observed while reading. If another
//! writer got there first the batch is rejected and the whole body is run
//! again against fresh data.
//!
//! ## Example
//!
//! ```ignore
//! let balance = run_transaction(&store, &options, |tx| {
//!     let mut wallet: Wallet = tx.get("user-1")?.ok_or(...)?;
//!     wallet.live_balance -= amount;
//!     tx.set(&wallet)?;
//!     Ok::<_, LedgerError>(wallet.live_balance)
//! })?;
//! ```

use std::collections::{HashMap, HashSet};
use std::thread;
use std::time::Duration;

use tracing::debug;

use crate::model::{document_key, Model, ModelError, ModelStore, Precondition, WriteBatch};

/// Retry policy for [`run_transaction`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransactionOptions {
    pub max_attempts: u32,
    pub base_backoff: Duration,
    pub max_backoff: Duration,
}

impl Default for TransactionOptions {
    fn default() -> Self {
        Self {
            max_attempts: 5,
            base_backoff: Duration::from_millis(1),
            max_backoff: Duration::from_millis(50),
        }
    }
}

impl TransactionOptions {
    pub fn with_max_attempts(mut self, max_attempts: u32) -> Self {
        self.max_attempts = max_attempts;
        self
    }

    pub fn with_backoff(mut self, base: Duration, max: Duration) -> Self {
        self.base_backoff = base;
        self.max_backoff = max;
        self
    }

    /// Delay before retrying after the given (1-based) failed attempt.
    pub fn backoff(&self, attempt: u32) -> Duration {
        let shift = attempt.saturating_sub(1).min(16);
        self.base_backoff
            .saturating_mul(1u32 << shift)
            .min(self.max_backoff)
    }
}

/// Error type for transaction operations.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TransactionError {
    /// A read was attempted after writes were staged.
    #[error("read of {key} after writes were staged")]
    ReadAfterWrite { key: String },
    /// An insert targeted a document this transaction read as present.
    #[error("document {key} already exists")]
    AlreadyExists { key: String },
    /// The same document was staged twice.
    #[error("document {key} written twice in one transaction")]
    DuplicateWrite { key: String },
    /// A concurrent writer changed a document this transaction depends on.
    #[error("transaction conflict: {0}")]
    Conflict(ModelError),
    /// Every attempt conflicted.
    #[error("transaction gave up after {attempts} attempts: {last}")]
    Exhausted { attempts: u32, last: ModelError },
    /// Any other storage failure.
    #[error("transaction storage error: {0}")]
    Store(ModelError),
}

impl From<ModelError> for TransactionError {
    fn from(err: ModelError) -> Self {
        if err.is_conflict() {
            TransactionError::Conflict(err)
        } else {
            TransactionError::Store(err)
        }
    }
}

struct TrackedRead {
    collection: String,
    id: String,
    version: u64,
}

/// A single attempt of an optimistic transaction.
pub struct Transaction<'a, S> {
    store: &'a S,
    reads: HashMap<String, TrackedRead>,
    written: HashSet<String>,
    batch: WriteBatch,
}

impl<'a, S: ModelStore> Transaction<'a, S> {
    pub(crate) fn new(store: &'a S) -> Self {
        Self {
            store,
            reads: HashMap::new(),
            written: HashSet::new(),
            batch: WriteBatch::new(),
        }
    }

    /// Read a document and add it to the conflict set.
    ///
    /// The commit fails if the document changes (or appears, if it was
    /// missing) before this transaction commits.
    pub fn get<M: Model>(&mut self, id: &str) -> Result<Option<M>, TransactionError> {
        let key = self.ensure_reading(M::COLLECTION, id)?;
        let found = self.store.get_model::<M>(id)?;
        let version = found.as_ref().map(|v| v.version).unwrap_or(0);

        self.reads.entry(key).or_insert(TrackedRead {
            collection: M::COLLECTION.to_string(),
            id: id.to_string(),
            version,
        });

        Ok(found.map(|v| v.data))
    }

    /// Read a document without adding it to the conflict set.
    pub fn peek<M: Model>(&mut self, id: &str) -> Result<Option<M>, TransactionError> {
        self.ensure_reading(M::COLLECTION, id)?;
        Ok(self.store.get_model::<M>(id)?.map(|v| v.data))
    }

    /// Stage creation of a document that must not exist yet.
    pub fn insert<M: Model>(&mut self, model: &M) -> Result<(), TransactionError> {
        let key = self.claim_write(M::COLLECTION, model.id())?;
        if self.reads.get(&key).is_some_and(|read| read.version != 0) {
            return Err(TransactionError::AlreadyExists { key });
        }
        self.batch.put(model, Precondition::Absent)?;
        Ok(())
    }

    /// Stage an upsert, guarded by the version seen in `get` (if any).
    pub fn set<M: Model>(&mut self, model: &M) -> Result<(), TransactionError> {
        let key = self.claim_write(M::COLLECTION, model.id())?;
        let precondition = self.precondition_for(&key);
        self.batch.put(model, precondition)?;
        Ok(())
    }

    /// Stage a delete, guarded by the version seen in `get` (if any).
    pub fn delete<M: Model>(&mut self, id: &str) -> Result<(), TransactionError> {
        let key = self.claim_write(M::COLLECTION, id)?;
        let precondition = self.precondition_for(&key);
        self.batch.delete::<M>(id, precondition);
        Ok(())
    }

    /// True while no write has been staged.
    pub fn is_read_only(&self) -> bool {
        self.batch.is_empty()
    }

    pub(crate) fn commit(self) -> Result<(), TransactionError> {
        if self.batch.is_empty() {
            return Ok(());
        }

        let mut batch = self.batch;
        for (key, read) in &self.reads {
            if !self.written.contains(key) {
                batch.check(&read.collection, &read.id, read.version);
            }
        }

        self.store.commit_batch(batch).map_err(TransactionError::from)
    }

    fn ensure_reading(&self, collection: &str, id: &str) -> Result<String, TransactionError> {
        let key = document_key(collection, id);
        if !self.batch.is_empty() {
            return Err(TransactionError::ReadAfterWrite { key });
        }
        Ok(key)
    }

    fn claim_write(&mut self, collection: &str, id: &str) -> Result<String, TransactionError> {
        let key = document_key(collection, id);
        if !self.written.insert(key.clone()) {
            return Err(TransactionError::DuplicateWrite { key });
        }
        Ok(key)
    }

    fn precondition_for(&self, key: &str) -> Precondition {
        self.reads
            .get(key)
            .map(|read| Precondition::observed(read.version))
            .unwrap_or(Precondition::Any)
    }
}

/// Run `body` as an optimistic transaction, retrying on conflicts.
///
/// Errors returned by `body` abort the transaction without writing anything
/// and are returned as-is. Commit conflicts re-run `body` against fresh reads
/// after a backoff, up to `options.max_attempts` times, after which
/// [`TransactionError::Exhausted`] is returned.
pub fn run_transaction<S, T, E, F>(
    store: &S,
    options: &TransactionOptions,
    mut body: F,
) -> Result<T, E>
where
    S: ModelStore,
    F: FnMut(&mut Transaction<'_, S>) -> Result<T, E>,
    E: From<TransactionError>,
{
    let max_attempts = options.max_attempts.max(1);
    let mut attempt = 0;

    loop {
        attempt += 1;
        let mut tx = Transaction::new(store);
        let value = body(&mut tx)?;

        match tx.commit() {
            Ok(()) => return Ok(value),
            Err(TransactionError::Conflict(err)) => {
                if attempt >= max_attempts {
                    return Err(TransactionError::Exhausted {
                        attempts: attempt,
                        last: err,
                    }
                    .into());
                }
                debug!(attempt, error = %err, "transaction conflict, retrying");
                thread::sleep(options.backoff(attempt));
            }
            Err(other) => return Err(other.into()),
        }
    }
}
