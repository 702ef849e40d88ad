use chrono::Utc;
use rust_decimal::Decimal;
use tracing::info;

use super::campaign::{Campaign, CampaignHistoryEntry, HistoryChange};
use super::error::LedgerError;
use super::pledge::{Pledge, PledgeMode};
use super::registry::{require_actor, require_justification};
use super::wallet::{load_or_provision, stage_wallet, Wallet};
use crate::config::LedgerConfig;
use crate::model::{ModelStore, ModelsExt};
use crate::transaction::{run_transaction, TransactionOptions};

/// Comparison of a campaign's recorded `raised` with its applied pledges.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RaisedAudit {
    pub campaign_id: String,
    pub recorded: Decimal,
    pub applied_total: Decimal,
    pub applied: usize,
    pub unapplied: usize,
}

impl RaisedAudit {
    pub fn is_consistent(&self) -> bool {
        self.recorded == self.applied_total
    }
}

/// Operator tooling over the settlement ledger.
#[derive(Clone)]
pub struct LedgerAudit<S> {
    store: S,
    options: TransactionOptions,
    demo_allowance: Decimal,
}

impl<S: ModelStore> LedgerAudit<S> {
    pub fn new(store: S, config: &LedgerConfig) -> Self {
        Self {
            store,
            options: config.transaction_options(),
            demo_allowance: config.wallet.demo_allowance,
        }
    }

    /// Sum the applied live pledges of a campaign and compare with `raised`.
    ///
    /// Only meaningful while no reconciliation for the campaign is in flight.
    pub fn audit_campaign(&self, campaign_id: &str) -> Result<RaisedAudit, LedgerError> {
        let campaign = self
            .store
            .models::<Campaign>()
            .load(campaign_id)?
            .ok_or_else(|| LedgerError::NotFound(format!("campaign {campaign_id}")))?;

        let pledges = self.store.models::<Pledge>().find(&|pledge: &Pledge| {
            pledge.campaign_id == campaign_id && pledge.mode == PledgeMode::Live
        })?;

        let mut audit = RaisedAudit {
            campaign_id: campaign_id.to_string(),
            recorded: campaign.raised,
            applied_total: Decimal::ZERO,
            applied: 0,
            unapplied: 0,
        };
        for pledge in pledges.iter().map(|v| &v.data) {
            if pledge.applied_to_campaign {
                audit.applied_total = audit
                    .applied_total
                    .checked_add(pledge.amount)
                    .ok_or_else(|| LedgerError::Internal("applied total overflowed".into()))?;
                audit.applied += 1;
            } else {
                audit.unapplied += 1;
            }
        }
        Ok(audit)
    }

    /// Outstanding live pledges whose campaign no longer exists.
    pub fn orphaned_pledges(&self) -> Result<Vec<Pledge>, LedgerError> {
        let outstanding = self.store.models::<Pledge>().list_by(
            &|pledge: &Pledge| pledge.is_outstanding(),
            |pledge| (pledge.created_at, pledge.id.clone()),
        )?;

        let mut orphans = Vec::new();
        for pledge in outstanding {
            if !self.store.models::<Campaign>().exists(&pledge.campaign_id)? {
                orphans.push(pledge);
            }
        }
        Ok(orphans)
    }

    /// Return an orphaned pledge's amount to the investor's live balance.
    ///
    /// Runs as one transaction: the pledge is marked refunded, the wallet is
    /// credited and a history entry is recorded against the missing campaign.
    /// Refused for applied or already refunded pledges and for pledges whose
    /// campaign still exists.
    pub fn refund_orphaned_pledge(
        &self,
        operator_id: &str,
        pledge_id: &str,
        justification: &str,
    ) -> Result<Wallet, LedgerError> {
        require_actor(operator_id)?;
        require_justification(justification)?;

        let wallet = run_transaction(&self.store, &self.options, |tx| {
            let mut pledge = tx
                .get::<Pledge>(pledge_id)?
                .ok_or_else(|| LedgerError::NotFound(format!("pledge {pledge_id}")))?;
            if pledge.applied_to_campaign {
                return Err(LedgerError::precondition("pledge was applied to its campaign"));
            }
            if pledge.is_refunded() {
                return Err(LedgerError::precondition("pledge was already refunded"));
            }
            if pledge.mode != PledgeMode::Live {
                return Err(LedgerError::precondition("only live pledges hold funds"));
            }
            if tx.get::<Campaign>(&pledge.campaign_id)?.is_some() {
                return Err(LedgerError::precondition("campaign still exists"));
            }
            let (mut wallet, is_new) =
                load_or_provision(tx, &pledge.investor_id, self.demo_allowance)?;

            let now = Utc::now();
            wallet.credit_live(pledge.amount)?;
            pledge.mark_refunded(now);
            let record = CampaignHistoryEntry {
                id: format!("refund:{}", pledge.id),
                campaign_id: pledge.campaign_id.clone(),
                actor_id: operator_id.to_string(),
                change: HistoryChange::PledgeRefunded {
                    pledge_id: pledge.id.clone(),
                    amount: pledge.amount.to_string(),
                },
                justification: justification.trim().to_string(),
                at: now,
            };

            stage_wallet(tx, &wallet, is_new)?;
            tx.set(&pledge)?;
            tx.insert(&record)?;
            Ok(wallet)
        })?;

        info!(
            pledge_id,
            operator_id,
            investor_id = %wallet.user_id,
            balance = %wallet.live_balance,
            "orphaned pledge refunded"
        );
        Ok(wallet)
    }
}
