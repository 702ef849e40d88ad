use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::error::{LedgerError, MINIMUM_NOT_MET, RAISED_LIMIT_EXCEEDED};
use crate::model::Model;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CampaignStatus {
    Draft,
    Pending,
    Active,
    Paused,
    Archived,
}

impl CampaignStatus {
    /// Moves allowed through the audited edit path.
    pub fn can_transition_to(self, to: CampaignStatus) -> bool {
        use CampaignStatus::*;
        matches!(
            (self, to),
            (Draft, Pending)
                | (Pending, Active)
                | (Pending, Draft)
                | (Active, Paused)
                | (Active, Archived)
                | (Paused, Active)
                | (Paused, Archived)
        )
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RiskLevel {
    Low,
    Medium,
    High,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Campaign {
    pub id: String,
    pub owner_id: String,
    pub title: String,
    pub category: String,
    pub address: String,
    pub risk_level: RiskLevel,
    #[serde(with = "rust_decimal::serde::str")]
    pub apr: Decimal,
    pub term_months: u32,
    #[serde(with = "rust_decimal::serde::str")]
    pub goal: Decimal,
    #[serde(with = "rust_decimal::serde::str")]
    pub raised: Decimal,
    #[serde(with = "rust_decimal::serde::str")]
    pub min_investment: Decimal,
    pub status: CampaignStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Model for Campaign {
    const COLLECTION: &'static str = "campaigns";

    fn id(&self) -> &str {
        &self.id
    }
}

impl Campaign {
    /// Check `amount` against the campaign's minimum, if it has one.
    pub fn check_minimum(&self, amount: Decimal) -> Result<(), LedgerError> {
        if self.min_investment > Decimal::ZERO && amount < self.min_investment {
            return Err(LedgerError::precondition(MINIMUM_NOT_MET));
        }
        Ok(())
    }

    pub(crate) fn add_raised(
        &mut self,
        amount: Decimal,
        at: DateTime<Utc>,
    ) -> Result<(), LedgerError> {
        self.raised = self
            .raised
            .checked_add(amount)
            .ok_or_else(|| LedgerError::precondition(RAISED_LIMIT_EXCEEDED))?;
        self.updated_at = at;
        Ok(())
    }
}

/// Input for creating a campaign.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewCampaign {
    /// Generated when absent.
    #[serde(default)]
    pub id: Option<String>,
    pub title: String,
    pub category: String,
    pub address: String,
    pub risk_level: RiskLevel,
    #[serde(with = "rust_decimal::serde::str")]
    pub apr: Decimal,
    pub term_months: u32,
    #[serde(with = "rust_decimal::serde::str")]
    pub goal: Decimal,
    #[serde(with = "rust_decimal::serde::str")]
    pub min_investment: Decimal,
}

impl NewCampaign {
    pub(crate) fn validate(&self) -> Result<(), LedgerError> {
        if self.title.trim().is_empty() {
            return Err(LedgerError::invalid("title is required"));
        }
        if self.goal.is_sign_negative()
            || self.min_investment.is_sign_negative()
            || self.apr.is_sign_negative()
        {
            return Err(LedgerError::invalid("monetary fields must not be negative"));
        }
        Ok(())
    }

    pub(crate) fn into_campaign(self, id: String, owner_id: &str) -> Campaign {
        let now = Utc::now();
        Campaign {
            id,
            owner_id: owner_id.to_string(),
            title: self.title,
            category: self.category,
            address: self.address,
            risk_level: self.risk_level,
            apr: self.apr,
            term_months: self.term_months,
            goal: self.goal,
            raised: Decimal::ZERO,
            min_investment: self.min_investment,
            status: CampaignStatus::Draft,
            created_at: now,
            updated_at: now,
        }
    }
}

/// A single field edit. `raised` is not editable.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "field", content = "value", rename_all = "camelCase")]
pub enum CampaignEdit {
    Title(String),
    Category(String),
    Address(String),
    RiskLevel(RiskLevel),
    Apr(#[serde(with = "rust_decimal::serde::str")] Decimal),
    TermMonths(u32),
    Goal(#[serde(with = "rust_decimal::serde::str")] Decimal),
    MinInvestment(#[serde(with = "rust_decimal::serde::str")] Decimal),
}

impl CampaignEdit {
    pub fn field(&self) -> &'static str {
        match self {
            CampaignEdit::Title(_) => "title",
            CampaignEdit::Category(_) => "category",
            CampaignEdit::Address(_) => "address",
            CampaignEdit::RiskLevel(_) => "riskLevel",
            CampaignEdit::Apr(_) => "apr",
            CampaignEdit::TermMonths(_) => "termMonths",
            CampaignEdit::Goal(_) => "goal",
            CampaignEdit::MinInvestment(_) => "minInvestment",
        }
    }

    /// Apply the edit and return the previous and new value, rendered as text.
    pub(crate) fn apply(self, campaign: &mut Campaign) -> Result<(String, String), LedgerError> {
        fn non_negative(value: Decimal) -> Result<Decimal, LedgerError> {
            if value.is_sign_negative() {
                return Err(LedgerError::invalid("value must not be negative"));
            }
            Ok(value)
        }

        let change = match self {
            CampaignEdit::Title(title) => {
                if title.trim().is_empty() {
                    return Err(LedgerError::invalid("title is required"));
                }
                (std::mem::replace(&mut campaign.title, title.clone()), title)
            }
            CampaignEdit::Category(value) => {
                (std::mem::replace(&mut campaign.category, value.clone()), value)
            }
            CampaignEdit::Address(value) => {
                (std::mem::replace(&mut campaign.address, value.clone()), value)
            }
            CampaignEdit::RiskLevel(level) => {
                let old = std::mem::replace(&mut campaign.risk_level, level);
                (format!("{old:?}").to_lowercase(), format!("{level:?}").to_lowercase())
            }
            CampaignEdit::Apr(value) => {
                let old = std::mem::replace(&mut campaign.apr, non_negative(value)?);
                (old.to_string(), value.to_string())
            }
            CampaignEdit::TermMonths(value) => {
                let old = std::mem::replace(&mut campaign.term_months, value);
                (old.to_string(), value.to_string())
            }
            CampaignEdit::Goal(value) => {
                let old = std::mem::replace(&mut campaign.goal, non_negative(value)?);
                (old.to_string(), value.to_string())
            }
            CampaignEdit::MinInvestment(value) => {
                let old = std::mem::replace(&mut campaign.min_investment, non_negative(value)?);
                (old.to_string(), value.to_string())
            }
        };
        campaign.updated_at = Utc::now();
        Ok(change)
    }
}

/// What an audited admin action changed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum HistoryChange {
    Status {
        from: CampaignStatus,
        to: CampaignStatus,
    },
    Field {
        field: String,
        from: String,
        to: String,
    },
    Deleted,
    /// An orphaned pledge was returned to the investor.
    #[serde(rename_all = "camelCase")]
    PledgeRefunded { pledge_id: String, amount: String },
}

/// One row of a campaign's admin history.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CampaignHistoryEntry {
    pub id: String,
    pub campaign_id: String,
    pub actor_id: String,
    pub change: HistoryChange,
    pub justification: String,
    pub at: DateTime<Utc>,
}

impl Model for CampaignHistoryEntry {
    const COLLECTION: &'static str = "campaign_history";

    fn id(&self) -> &str {
        &self.id
    }
}
