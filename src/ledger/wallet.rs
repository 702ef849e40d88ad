use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tracing::info;

use super::error::{LedgerError, BALANCE_LIMIT_EXCEEDED, INSUFFICIENT_BALANCE};
use crate::config::LedgerConfig;
use crate::model::{Model, ModelStore, ModelsExt, Subscription};
use crate::transaction::{run_transaction, Transaction, TransactionOptions};

/// Per-user balances. Only the ledger writes these.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Wallet {
    pub user_id: String,
    #[serde(with = "rust_decimal::serde::str")]
    pub live_balance: Decimal,
    #[serde(with = "rust_decimal::serde::str")]
    pub demo_balance: Decimal,
    pub updated_at: DateTime<Utc>,
}

impl Model for Wallet {
    const COLLECTION: &'static str = "wallets";

    fn id(&self) -> &str {
        &self.user_id
    }
}

impl Wallet {
    /// A fresh wallet: no live funds, the configured demo allowance.
    pub fn provisioned(user_id: impl Into<String>, demo_allowance: Decimal) -> Self {
        Self {
            user_id: user_id.into(),
            live_balance: Decimal::ZERO,
            demo_balance: demo_allowance,
            updated_at: Utc::now(),
        }
    }

    pub fn can_cover(&self, amount: Decimal) -> bool {
        self.live_balance >= amount
    }

    pub(crate) fn debit_live(&mut self, amount: Decimal) -> Result<(), LedgerError> {
        if !self.can_cover(amount) {
            return Err(LedgerError::precondition(INSUFFICIENT_BALANCE));
        }
        self.live_balance -= amount;
        self.updated_at = Utc::now();
        Ok(())
    }

    pub(crate) fn credit_live(&mut self, amount: Decimal) -> Result<(), LedgerError> {
        self.live_balance = self
            .live_balance
            .checked_add(amount)
            .ok_or_else(|| LedgerError::precondition(BALANCE_LIMIT_EXCEEDED))?;
        self.updated_at = Utc::now();
        Ok(())
    }
}

/// Read the wallet inside a transaction, or a freshly provisioned one if absent.
///
/// The second value is true when the wallet did not exist yet and must be
/// staged with `insert`.
pub(crate) fn load_or_provision<S: ModelStore>(
    tx: &mut Transaction<'_, S>,
    user_id: &str,
    demo_allowance: Decimal,
) -> Result<(Wallet, bool), LedgerError> {
    match tx.get::<Wallet>(user_id)? {
        Some(wallet) => Ok((wallet, false)),
        None => Ok((Wallet::provisioned(user_id, demo_allowance), true)),
    }
}

/// Stage a wallet write produced by [`load_or_provision`].
pub(crate) fn stage_wallet<S: ModelStore>(
    tx: &mut Transaction<'_, S>,
    wallet: &Wallet,
    is_new: bool,
) -> Result<(), LedgerError> {
    if is_new {
        tx.insert(wallet)?;
    } else {
        tx.set(wallet)?;
    }
    Ok(())
}

/// Wallet access for callers outside the settlement pipeline.
#[derive(Clone)]
pub struct WalletStore<S> {
    store: S,
    options: TransactionOptions,
    demo_allowance: Decimal,
}

impl<S: ModelStore> WalletStore<S> {
    pub fn new(store: S, config: &LedgerConfig) -> Self {
        Self {
            store,
            options: config.transaction_options(),
            demo_allowance: config.wallet.demo_allowance,
        }
    }

    pub fn get(&self, user_id: &str) -> Result<Option<Wallet>, LedgerError> {
        Ok(self.store.models::<Wallet>().load(user_id)?)
    }

    /// Create the wallet with defaults unless it already exists.
    pub fn provision(&self, user_id: &str) -> Result<Wallet, LedgerError> {
        if user_id.trim().is_empty() {
            return Err(LedgerError::invalid("user id is required"));
        }

        run_transaction(&self.store, &self.options, |tx| {
            let (wallet, is_new) = load_or_provision(tx, user_id, self.demo_allowance)?;
            if is_new {
                tx.insert(&wallet)?;
                info!(user_id, "wallet provisioned");
            }
            Ok::<_, LedgerError>(wallet)
        })
    }

    /// Add real funds to a wallet, provisioning it first if needed.
    pub fn credit_live(&self, user_id: &str, amount: Decimal) -> Result<Wallet, LedgerError> {
        if amount <= Decimal::ZERO {
            return Err(LedgerError::invalid("amount must be greater than zero"));
        }

        let wallet = run_transaction(&self.store, &self.options, |tx| {
            let (mut wallet, is_new) = load_or_provision(tx, user_id, self.demo_allowance)?;
            wallet.credit_live(amount)?;
            stage_wallet(tx, &wallet, is_new)?;
            Ok::<_, LedgerError>(wallet)
        })?;

        info!(user_id, %amount, balance = %wallet.live_balance, "wallet credited");
        Ok(wallet)
    }

    /// Live view of a wallet: the current state first, then every committed change.
    pub fn subscribe(&self, user_id: &str) -> Result<Subscription<Wallet>, LedgerError> {
        Ok(self.store.models::<Wallet>().subscribe(user_id)?)
    }
}
