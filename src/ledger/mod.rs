//! Ledger - The pledge settlement pipeline.
//!
//! Money moves in two transactions:
//!
//! 1. [`PledgeSubmissionHandler`] validates a pledge, debits the investor's
//!    live balance, and writes the pledge (unapplied) together with a
//!    `PledgeCreated` outbox message.
//! 2. [`RaisedTotalReconciler`] receives that message from the outbox worker
//!    and, in a second transaction, adds the amount to the campaign's
//!    `raised` total and flips the pledge's `appliedToCampaign` flag.
//!
//! The flag is re-read inside the second transaction, so redelivering the
//! same event any number of times applies the pledge once.
//!
//! ## Example
//!
//! ```ignore
//! use pledge_ledger::{InMemoryModelStore, Ledger, LedgerConfig};
//!
//! let ledger = Ledger::new(InMemoryModelStore::new(), LedgerConfig::default());
//! ledger.wallets().credit_live("investor-1", dec!(500))?;
//! let pledge_id = ledger
//!     .submissions()
//!     .submit_pledge(Some("investor-1"), "investor-1", "campaign-1", dec!(300))?;
//! ledger.outbox_worker().drain_until_idle(ledger.store())?;
//! ```

mod audit;
mod campaign;
mod error;
mod pledge;
mod reconciler;
mod registry;
mod submit;
mod wallet;

use crate::config::LedgerConfig;
use crate::model::ModelStore;
use crate::outbox::OutboxWorker;

pub use audit::{LedgerAudit, RaisedAudit};
pub use campaign::{
    Campaign, CampaignEdit, CampaignHistoryEntry, CampaignStatus, HistoryChange, NewCampaign,
    RiskLevel,
};
pub use error::{
    ErrorCode, LedgerError, BALANCE_LIMIT_EXCEEDED, INSUFFICIENT_BALANCE, MINIMUM_NOT_MET,
    RAISED_LIMIT_EXCEEDED,
};
pub use pledge::{Pledge, PledgeMode, PLEDGE_CREATED};
pub use reconciler::{RaisedTotalReconciler, ReconcileOutcome};
pub use registry::CampaignRegistry;
pub use submit::{parse_amount, PledgeSubmissionHandler, MAX_PLEDGE_AMOUNT};
pub use wallet::{Wallet, WalletStore};

/// One store, one configuration, every ledger component.
#[derive(Clone)]
pub struct Ledger<S> {
    store: S,
    config: LedgerConfig,
}

impl<S: ModelStore + Clone> Ledger<S> {
    pub fn new(store: S, config: LedgerConfig) -> Self {
        Self { store, config }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn config(&self) -> &LedgerConfig {
        &self.config
    }

    pub fn wallets(&self) -> WalletStore<S> {
        WalletStore::new(self.store.clone(), &self.config)
    }

    pub fn submissions(&self) -> PledgeSubmissionHandler<S> {
        PledgeSubmissionHandler::new(self.store.clone(), &self.config)
    }

    pub fn reconciler(&self) -> RaisedTotalReconciler<S> {
        RaisedTotalReconciler::new(self.store.clone(), &self.config)
    }

    pub fn campaigns(&self) -> CampaignRegistry<S> {
        CampaignRegistry::new(self.store.clone(), &self.config)
    }

    pub fn audit(&self) -> LedgerAudit<S> {
        LedgerAudit::new(self.store.clone(), &self.config)
    }

    /// An outbox worker that feeds the reconciler, configured from `outbox` settings.
    pub fn outbox_worker(&self) -> OutboxWorker<RaisedTotalReconciler<S>> {
        OutboxWorker::from_settings(self.reconciler(), &self.config.outbox)
    }
}
