//! Folds committed pledges into their campaign's raised total, exactly once.

use chrono::Utc;
use rust_decimal::Decimal;
use tracing::{debug, error, info};

use super::campaign::Campaign;
use super::error::LedgerError;
use super::pledge::{Pledge, PLEDGE_CREATED};
use crate::config::LedgerConfig;
use crate::model::ModelStore;
use crate::outbox::{OutboxHandler, OutboxMessage};
use crate::transaction::{run_transaction, TransactionOptions};

/// What a reconciliation attempt did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReconcileOutcome {
    /// Demo, non-positive, or campaign-less pledge. Nothing read or written.
    Skipped,
    /// A previous delivery already applied this pledge.
    AlreadyApplied,
    /// The pledge was refunded by an operator.
    Refunded,
    /// The pledge document no longer exists.
    PledgeMissing,
    /// The campaign no longer exists. Nothing written.
    Orphaned,
    /// `raised` was incremented; holds the new total.
    Applied { raised: Decimal },
}

/// Applies `PledgeCreated` events to campaign totals.
#[derive(Clone)]
pub struct RaisedTotalReconciler<S> {
    store: S,
    options: TransactionOptions,
}

impl<S: ModelStore> RaisedTotalReconciler<S> {
    pub fn new(store: S, config: &LedgerConfig) -> Self {
        Self {
            store,
            options: config.transaction_options(),
        }
    }

    /// Reconcile one pledge-creation event. Safe to call any number of times.
    pub fn reconcile(&self, event: &Pledge) -> Result<ReconcileOutcome, LedgerError> {
        if !event.is_reconcilable() {
            debug!(pledge_id = %event.id, "pledge not reconcilable, skipping");
            return Ok(ReconcileOutcome::Skipped);
        }

        let outcome = run_transaction(&self.store, &self.options, |tx| {
            let Some(mut pledge) = tx.get::<Pledge>(&event.id)? else {
                return Ok(ReconcileOutcome::PledgeMissing);
            };
            let campaign = tx.get::<Campaign>(&pledge.campaign_id)?;

            if pledge.applied_to_campaign {
                return Ok(ReconcileOutcome::AlreadyApplied);
            }
            if pledge.is_refunded() {
                return Ok(ReconcileOutcome::Refunded);
            }
            let Some(mut campaign) = campaign else {
                return Ok(ReconcileOutcome::Orphaned);
            };

            let now = Utc::now();
            campaign.add_raised(pledge.amount, now)?;
            pledge.mark_applied(now);
            tx.set(&campaign)?;
            tx.set(&pledge)?;
            Ok::<_, LedgerError>(ReconcileOutcome::Applied {
                raised: campaign.raised,
            })
        })?;

        match &outcome {
            ReconcileOutcome::Applied { raised } => info!(
                pledge_id = %event.id,
                campaign_id = %event.campaign_id,
                amount = %event.amount,
                raised = %raised,
                "pledge applied to campaign"
            ),
            ReconcileOutcome::Orphaned => error!(
                pledge_id = %event.id,
                campaign_id = %event.campaign_id,
                investor_id = %event.investor_id,
                amount = %event.amount,
                "campaign missing for pledge, funds held until operator refund"
            ),
            other => debug!(pledge_id = %event.id, outcome = ?other, "redelivered pledge ignored"),
        }

        Ok(outcome)
    }
}

impl<S: ModelStore> OutboxHandler for RaisedTotalReconciler<S> {
    type Error = LedgerError;

    fn handle(&mut self, message: &OutboxMessage) -> Result<(), Self::Error> {
        if message.event_type != PLEDGE_CREATED {
            debug!(message_id = %message.id, event_type = %message.event_type, "not a pledge event");
            return Ok(());
        }
        let pledge: Pledge = message.decode()?;
        self.reconcile(&pledge).map(|_| ())
    }
}
