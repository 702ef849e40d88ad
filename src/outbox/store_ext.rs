use std::time::Duration;

use chrono::Utc;
use tracing::debug;

use super::{OutboxMessage, OutboxStatus};
use crate::model::{Model, ModelError, ModelStore, ModelsExt, Versioned};

/// Outbox operations available on every [`ModelStore`].
///
/// State changes are version-guarded updates, so two workers racing for the
/// same message cannot both claim it.
pub trait OutboxStoreExt: ModelStore + Sized {
    /// Return all outbox messages with the given status.
    fn outbox_messages_by_status(
        &self,
        status: OutboxStatus,
    ) -> Result<Vec<OutboxMessage>, ModelError> {
        self.models::<OutboxMessage>().list_by(
            &|message: &OutboxMessage| message.status == status,
            |message| message.created_at,
        )
    }

    fn outbox_message(&self, message_id: &str) -> Result<Option<OutboxMessage>, ModelError> {
        self.models::<OutboxMessage>().load(message_id)
    }

    /// Claim up to `max` claimable messages, oldest first.
    ///
    /// A message another worker claimed in the meantime is skipped.
    fn claim_outbox_messages(
        &self,
        worker_id: &str,
        max: usize,
        lease: Duration,
    ) -> Result<Vec<OutboxMessage>, ModelError> {
        let now = Utc::now();
        let mut candidates = self
            .models::<OutboxMessage>()
            .find(&|message: &OutboxMessage| message.is_claimable(now))?;
        candidates.sort_by(|a, b| {
            a.data
                .created_at
                .cmp(&b.data.created_at)
                .then_with(|| a.data.id.cmp(&b.data.id))
        });

        let mut claimed = Vec::new();
        for Versioned { mut data, version } in candidates {
            if claimed.len() >= max {
                break;
            }
            data.claim(worker_id, lease, now);
            match self.update_model(&data, version) {
                Ok(_) => claimed.push(data),
                Err(err) if err.is_conflict() => {
                    debug!(message_id = %data.id, "outbox message claimed elsewhere, skipping");
                }
                Err(err) => return Err(err),
            }
        }

        Ok(claimed)
    }

    /// Mark an in-flight message as published.
    fn complete_outbox_message(&self, message_id: &str) -> Result<(), ModelError> {
        transition(self, message_id, OutboxMessage::complete)
    }

    /// Return an in-flight message to pending so it is delivered again.
    fn release_outbox_message(&self, message_id: &str, error: &str) -> Result<(), ModelError> {
        transition(self, message_id, |message| message.release(error))
    }

    /// Mark an in-flight message as permanently failed.
    fn fail_outbox_message(&self, message_id: &str, error: &str) -> Result<(), ModelError> {
        transition(self, message_id, |message| message.fail(error))
    }
}

impl<S: ModelStore> OutboxStoreExt for S {}

fn transition<S, F>(store: &S, message_id: &str, apply: F) -> Result<(), ModelError>
where
    S: ModelStore,
    F: FnOnce(&mut OutboxMessage),
{
    let Some(Versioned { mut data, version }) = store.models::<OutboxMessage>().get(message_id)?
    else {
        return Err(ModelError::NotFound {
            collection: OutboxMessage::COLLECTION.to_string(),
            id: message_id.to_string(),
        });
    };

    if !data.is_in_flight() {
        return Ok(());
    }

    apply(&mut data);
    store.update_model(&data, version)?;
    Ok(())
}
