//! Live document subscriptions.

use std::marker::PhantomData;
use std::sync::mpsc::{Receiver, RecvTimeoutError, TryRecvError};
use std::time::Duration;

use super::{decode_model, Model, ModelError, Versioned};

/// A committed change to a watched key. `bytes == None` means deleted.
#[derive(Debug, Clone, PartialEq)]
pub struct RawChange {
    pub version: u64,
    pub bytes: Option<Vec<u8>>,
}

/// Decoded state of a watched document.
#[derive(Debug, Clone, PartialEq)]
pub enum Snapshot<M> {
    Present(Versioned<M>),
    Deleted,
}

impl<M> Snapshot<M> {
    pub fn present(self) -> Option<Versioned<M>> {
        match self {
            Snapshot::Present(v) => Some(v),
            Snapshot::Deleted => None,
        }
    }
}

/// Typed subscription to one document.
pub struct Subscription<M> {
    rx: Receiver<RawChange>,
    _marker: PhantomData<M>,
}

impl<M: Model> Subscription<M> {
    pub fn new(rx: Receiver<RawChange>) -> Self {
        Self {
            rx,
            _marker: PhantomData,
        }
    }

    /// Next change if one is already queued.
    pub fn try_next(&self) -> Result<Option<Snapshot<M>>, ModelError> {
        match self.rx.try_recv() {
            Ok(change) => decode_change(change).map(Some),
            Err(TryRecvError::Empty) | Err(TryRecvError::Disconnected) => Ok(None),
        }
    }

    /// Wait up to `timeout` for the next change.
    pub fn next_timeout(&self, timeout: Duration) -> Result<Option<Snapshot<M>>, ModelError> {
        match self.rx.recv_timeout(timeout) {
            Ok(change) => decode_change(change).map(Some),
            Err(RecvTimeoutError::Timeout) | Err(RecvTimeoutError::Disconnected) => Ok(None),
        }
    }

    /// Drain queued changes and return the latest one.
    pub fn latest(&self) -> Result<Option<Snapshot<M>>, ModelError> {
        let mut last = None;
        while let Some(snapshot) = self.try_next()? {
            last = Some(snapshot);
        }
        Ok(last)
    }
}

fn decode_change<M: Model>(change: RawChange) -> Result<Snapshot<M>, ModelError> {
    match change.bytes {
        Some(bytes) => Ok(Snapshot::Present(Versioned {
            data: decode_model(&bytes)?,
            version: change.version,
        })),
        None => Ok(Snapshot::Deleted),
    }
}
