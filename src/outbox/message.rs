use chrono::{DateTime, Duration as ChronoDuration, Utc};
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use std::time::Duration;

use crate::model::Model;

/// Delivery status of an outbox message.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum OutboxStatus {
    #[default]
    Pending,
    InFlight,
    Published,
    Failed,
}

/// A durable notification written in the same batch as the change it announces.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OutboxMessage {
    pub id: String,
    pub event_type: String,
    pub payload: Vec<u8>,
    pub status: OutboxStatus,
    pub created_at: DateTime<Utc>,
    pub attempts: u32,
    pub last_error: Option<String>,
    pub worker_id: Option<String>,
    pub leased_until: Option<DateTime<Utc>>,
    pub published_at: Option<DateTime<Utc>>,
    pub failed_at: Option<DateTime<Utc>>,
}

impl Model for OutboxMessage {
    const COLLECTION: &'static str = "outbox";

    fn id(&self) -> &str {
        &self.id
    }
}

impl OutboxMessage {
    /// Create a pending message with a raw payload.
    pub fn create(id: impl Into<String>, event_type: impl Into<String>, payload: Vec<u8>) -> Self {
        Self {
            id: id.into(),
            event_type: event_type.into(),
            payload,
            status: OutboxStatus::Pending,
            created_at: Utc::now(),
            attempts: 0,
            last_error: None,
            worker_id: None,
            leased_until: None,
            published_at: None,
            failed_at: None,
        }
    }

    /// Create a pending message with a bitcode-encoded payload.
    pub fn encode<T: Serialize>(
        id: impl Into<String>,
        event_type: impl Into<String>,
        payload: &T,
    ) -> Result<Self, bitcode::Error> {
        let bytes = bitcode::serialize(payload)?;
        Ok(Self::create(id, event_type, bytes))
    }

    pub fn decode<T: DeserializeOwned>(&self) -> Result<T, bitcode::Error> {
        bitcode::deserialize(&self.payload)
    }

    pub fn is_pending(&self) -> bool {
        self.status == OutboxStatus::Pending
    }

    pub fn is_in_flight(&self) -> bool {
        self.status == OutboxStatus::InFlight
    }

    pub fn is_published(&self) -> bool {
        self.status == OutboxStatus::Published
    }

    pub fn is_failed(&self) -> bool {
        self.status == OutboxStatus::Failed
    }

    /// Pending, or in flight under a lease that ran out.
    pub fn is_claimable(&self, now: DateTime<Utc>) -> bool {
        match self.status {
            OutboxStatus::Pending => true,
            OutboxStatus::InFlight => self.leased_until.map_or(true, |until| until <= now),
            OutboxStatus::Published | OutboxStatus::Failed => false,
        }
    }

    pub fn claim(&mut self, worker_id: impl Into<String>, lease: Duration, now: DateTime<Utc>) {
        let lease = ChronoDuration::from_std(lease).unwrap_or(ChronoDuration::zero());
        self.status = OutboxStatus::InFlight;
        self.attempts += 1;
        self.worker_id = Some(worker_id.into());
        self.leased_until = Some(now + lease);
    }

    pub fn complete(&mut self) {
        self.status = OutboxStatus::Published;
        self.published_at = Some(Utc::now());
        self.worker_id = None;
        self.leased_until = None;
    }

    pub fn release(&mut self, error: impl Into<String>) {
        self.status = OutboxStatus::Pending;
        self.last_error = non_empty(error.into());
        self.worker_id = None;
        self.leased_until = None;
    }

    pub fn fail(&mut self, error: impl Into<String>) {
        self.status = OutboxStatus::Failed;
        self.failed_at = Some(Utc::now());
        self.last_error = non_empty(error.into());
        self.worker_id = None;
        self.leased_until = None;
    }
}

fn non_empty(error: String) -> Option<String> {
    if error.is_empty() {
        None
    } else {
        Some(error)
    }
}
