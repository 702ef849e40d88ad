use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::model::Model;

/// Event type of the outbox message announcing a new pledge.
pub const PLEDGE_CREATED: &str = "PledgeCreated";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PledgeMode {
    Live,
    Demo,
}

/// An investor's committed contribution to one campaign.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Pledge {
    pub id: String,
    pub campaign_id: String,
    pub investor_id: String,
    #[serde(with = "rust_decimal::serde::str")]
    pub amount: Decimal,
    pub mode: PledgeMode,
    pub created_at: DateTime<Utc>,
    pub applied_to_campaign: bool,
    pub applied_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub refunded_at: Option<DateTime<Utc>>,
}

impl Model for Pledge {
    const COLLECTION: &'static str = "pledges";

    fn id(&self) -> &str {
        &self.id
    }
}

impl Pledge {
    pub fn live(
        id: impl Into<String>,
        campaign_id: impl Into<String>,
        investor_id: impl Into<String>,
        amount: Decimal,
    ) -> Self {
        Self {
            id: id.into(),
            campaign_id: campaign_id.into(),
            investor_id: investor_id.into(),
            amount,
            mode: PledgeMode::Live,
            created_at: Utc::now(),
            applied_to_campaign: false,
            applied_at: None,
            refunded_at: None,
        }
    }

    /// Id of the outbox message announcing this pledge.
    pub fn created_message_id(&self) -> String {
        format!("pledge-created:{}", self.id)
    }

    /// Whether this pledge can ever count toward a campaign's raised total.
    pub fn is_reconcilable(&self) -> bool {
        self.mode == PledgeMode::Live
            && self.amount > Decimal::ZERO
            && !self.campaign_id.is_empty()
    }

    pub fn is_refunded(&self) -> bool {
        self.refunded_at.is_some()
    }

    /// Live, reconcilable, and neither applied nor refunded.
    pub fn is_outstanding(&self) -> bool {
        self.is_reconcilable() && !self.applied_to_campaign && !self.is_refunded()
    }

    pub(crate) fn mark_applied(&mut self, at: DateTime<Utc>) {
        self.applied_to_campaign = true;
        self.applied_at = Some(at);
    }

    pub(crate) fn mark_refunded(&mut self, at: DateTime<Utc>) {
        self.refunded_at = Some(at);
    }
}
