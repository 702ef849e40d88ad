//! Pledge settlement ledger for a crowdfunding marketplace.
//!
//! Moves money from an investor's wallet into a campaign's raised total with
//! three guarantees:
//!
//! - a pledge is never recorded without sufficient funds;
//! - a campaign's `raised` is incremented exactly once per pledge, however
//!   often the completion event is delivered;
//! - wallet balances and campaign totals never diverge.
//!
//! Submission debits the wallet and records the pledge together with an
//! outbox message in one optimistic transaction. An outbox worker then hands
//! the message to the reconciler, which applies the pledge to its campaign in
//! a second transaction guarded by the pledge's `appliedToCampaign` flag.
//!
//! ```ignore
//! use pledge_ledger::{InMemoryModelStore, Ledger, LedgerConfig};
//! use rust_decimal_macros::dec;
//!
//! let ledger = Ledger::new(InMemoryModelStore::new(), LedgerConfig::default());
//! ledger.wallets().credit_live("investor-1", dec!(500))?;
//!
//! let pledge_id = ledger
//!     .submissions()
//!     .submit_pledge(Some("investor-1"), "investor-1", "campaign-1", dec!(300))?;
//!
//! ledger.outbox_worker().drain_until_idle(ledger.store())?;
//! assert!(ledger.audit().audit_campaign("campaign-1")?.is_consistent());
//! ```

pub mod config;
pub mod ledger;
pub mod microsvc;
pub mod model;
pub mod outbox;
pub mod transaction;

pub use config::{ConfigError, LedgerConfig};
pub use ledger::{
    Campaign, CampaignEdit, CampaignHistoryEntry, CampaignRegistry, CampaignStatus, ErrorCode,
    HistoryChange, Ledger, LedgerAudit, LedgerError, NewCampaign, Pledge, PledgeMode,
    PledgeSubmissionHandler, RaisedAudit, RaisedTotalReconciler, ReconcileOutcome, RiskLevel,
    Wallet, WalletStore, BALANCE_LIMIT_EXCEEDED, INSUFFICIENT_BALANCE, MAX_PLEDGE_AMOUNT,
    MINIMUM_NOT_MET, PLEDGE_CREATED, RAISED_LIMIT_EXCEEDED,
};
pub use model::{
    InMemoryModelStore, Model, ModelError, ModelRepository, ModelStore, ModelsExt, Precondition,
    Snapshot, Subscription, Versioned, WriteBatch,
};
pub use outbox::{
    DrainResult, OutboxHandler, OutboxMessage, OutboxStatus, OutboxStoreExt, OutboxWorker,
    OutboxWorkerThread, WorkerStats,
};
pub use transaction::{run_transaction, Transaction, TransactionError, TransactionOptions};
