use std::time::Duration;

use tracing::{debug, error, warn};

use super::{OutboxHandler, OutboxMessage, OutboxStoreExt};
use crate::config::OutboxSettings;
use crate::model::ModelError;

/// Result of a drain pass.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct DrainResult {
    pub claimed: usize,
    pub completed: usize,
    pub released: usize,
    pub failed: usize,
}

impl DrainResult {
    fn absorb(&mut self, other: DrainResult) {
        self.claimed += other.claimed;
        self.completed += other.completed;
        self.released += other.released;
        self.failed += other.failed;
    }
}

/// Claims outbox messages from a store and hands them to an [`OutboxHandler`].
pub struct OutboxWorker<H> {
    handler: H,
    worker_id: String,
    batch_size: usize,
    lease: Duration,
    max_attempts: u32,
}

impl<H> OutboxWorker<H> {
    pub fn new(handler: H) -> Self {
        Self::from_settings(handler, &OutboxSettings::default())
    }

    pub fn from_settings(handler: H, settings: &OutboxSettings) -> Self {
        Self {
            handler,
            worker_id: settings.worker_id.clone(),
            batch_size: settings.batch_size,
            lease: settings.lease(),
            max_attempts: settings.max_attempts,
        }
    }

    pub fn with_worker_id(mut self, id: impl Into<String>) -> Self {
        self.worker_id = id.into();
        self
    }

    pub fn with_batch_size(mut self, size: usize) -> Self {
        self.batch_size = size.max(1);
        self
    }

    pub fn with_lease(mut self, lease: Duration) -> Self {
        self.lease = lease;
        self
    }

    /// Attempts after which a failing message is marked failed instead of released.
    pub fn with_max_attempts(mut self, max: u32) -> Self {
        self.max_attempts = max.max(1);
        self
    }

    pub fn worker_id(&self) -> &str {
        &self.worker_id
    }

    pub fn handler(&self) -> &H {
        &self.handler
    }

    pub fn handler_mut(&mut self) -> &mut H {
        &mut self.handler
    }
}

impl<H: OutboxHandler> OutboxWorker<H> {
    /// Claim one batch and deliver it.
    pub fn drain<S: OutboxStoreExt>(&mut self, store: &S) -> Result<DrainResult, ModelError> {
        let messages = store.claim_outbox_messages(&self.worker_id, self.batch_size, self.lease)?;
        let mut result = DrainResult {
            claimed: messages.len(),
            ..Default::default()
        };

        for message in &messages {
            self.deliver(store, message, &mut result)?;
        }

        Ok(result)
    }

    /// Drain batches until nothing is left to claim.
    ///
    /// Released messages are claimed again on the next pass, so this returns
    /// once every message is published or failed, or leased elsewhere.
    pub fn drain_until_idle<S: OutboxStoreExt>(
        &mut self,
        store: &S,
    ) -> Result<DrainResult, ModelError> {
        let mut total = DrainResult::default();
        loop {
            let pass = self.drain(store)?;
            if pass.claimed == 0 {
                return Ok(total);
            }
            total.absorb(pass);
        }
    }

    fn deliver<S: OutboxStoreExt>(
        &mut self,
        store: &S,
        message: &OutboxMessage,
        result: &mut DrainResult,
    ) -> Result<(), ModelError> {
        match self.handler.handle(message) {
            Ok(()) => {
                store.complete_outbox_message(&message.id)?;
                result.completed += 1;
                debug!(message_id = %message.id, "outbox message published");
            }
            Err(err) if message.attempts >= self.max_attempts => {
                let error = err.to_string();
                error!(
                    message_id = %message.id,
                    attempts = message.attempts,
                    error = %error,
                    "outbox message failed permanently"
                );
                store.fail_outbox_message(&message.id, &error)?;
                result.failed += 1;
            }
            Err(err) => {
                let error = err.to_string();
                warn!(
                    message_id = %message.id,
                    attempts = message.attempts,
                    error = %error,
                    "outbox message released for retry"
                );
                store.release_outbox_message(&message.id, &error)?;
                result.released += 1;
            }
        }
        Ok(())
    }
}
