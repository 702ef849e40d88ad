//! Ledger configuration.
//!
//! Every field has a default, so an empty JSON object (or no file at all) is
//! a valid configuration:
//!
//! ```json
//! {
//!   "transaction": { "maxAttempts": 5, "baseBackoffMs": 1, "maxBackoffMs": 50 },
//!   "wallet": { "demoAllowance": "10000" },
//!   "outbox": { "workerId": "ledger-worker", "batchSize": 10, "leaseSecs": 60,
//!               "maxAttempts": 5, "pollIntervalMs": 50 }
//! }
//! ```

use std::path::Path;
use std::time::Duration;

use rust_decimal::Decimal;
use serde::Deserialize;

use crate::transaction::TransactionOptions;

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read config file: {0}")]
    Io(#[from] std::io::Error),
    #[error("failed to parse config: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("invalid config: {0}")]
    Invalid(String),
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct TransactionSettings {
    pub max_attempts: u32,
    pub base_backoff_ms: u64,
    pub max_backoff_ms: u64,
}

impl Default for TransactionSettings {
    fn default() -> Self {
        Self {
            max_attempts: 5,
            base_backoff_ms: 1,
            max_backoff_ms: 50,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct WalletSettings {
    /// Sandbox funds granted when a wallet is first created.
    #[serde(with = "rust_decimal::serde::str")]
    pub demo_allowance: Decimal,
}

impl Default for WalletSettings {
    fn default() -> Self {
        Self {
            demo_allowance: Decimal::from(10_000),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct OutboxSettings {
    pub worker_id: String,
    pub batch_size: usize,
    pub lease_secs: u64,
    pub max_attempts: u32,
    pub poll_interval_ms: u64,
}

impl Default for OutboxSettings {
    fn default() -> Self {
        Self {
            worker_id: "ledger-worker".to_string(),
            batch_size: 10,
            lease_secs: 60,
            max_attempts: 5,
            poll_interval_ms: 50,
        }
    }
}

impl OutboxSettings {
    pub fn lease(&self) -> Duration {
        Duration::from_secs(self.lease_secs)
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }
}

/// Top-level ledger configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct LedgerConfig {
    pub transaction: TransactionSettings,
    pub wallet: WalletSettings,
    pub outbox: OutboxSettings,
}

impl LedgerConfig {
    pub fn from_json_str(raw: &str) -> Result<Self, ConfigError> {
        let config: LedgerConfig = serde_json::from_str(raw)?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let raw = std::fs::read_to_string(path)?;
        Self::from_json_str(&raw)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.transaction.max_attempts == 0 {
            return Err(ConfigError::Invalid(
                "transaction.maxAttempts must be at least 1".into(),
            ));
        }
        if self.wallet.demo_allowance.is_sign_negative() {
            return Err(ConfigError::Invalid(
                "wallet.demoAllowance must not be negative".into(),
            ));
        }
        if self.outbox.batch_size == 0 || self.outbox.max_attempts == 0 {
            return Err(ConfigError::Invalid(
                "outbox.batchSize and outbox.maxAttempts must be at least 1".into(),
            ));
        }
        Ok(())
    }

    pub fn transaction_options(&self) -> TransactionOptions {
        TransactionOptions::default()
            .with_max_attempts(self.transaction.max_attempts)
            .with_backoff(
                Duration::from_millis(self.transaction.base_backoff_ms),
                Duration::from_millis(self.transaction.max_backoff_ms),
            )
    }

    /// Set the maximum number of attempts per transaction.
    pub fn with_max_attempts(mut self, max_attempts: u32) -> Self {
        self.transaction.max_attempts = max_attempts;
        self
    }

    /// Set the retry backoff (base and cap, in milliseconds).
    pub fn with_backoff_ms(mut self, base: u64, max: u64) -> Self {
        self.transaction.base_backoff_ms = base;
        self.transaction.max_backoff_ms = max;
        self
    }

    /// Set the demo allowance granted to new wallets.
    pub fn with_demo_allowance(mut self, allowance: Decimal) -> Self {
        self.wallet.demo_allowance = allowance;
        self
    }

    /// Set the outbox delivery attempt limit.
    pub fn with_outbox_max_attempts(mut self, max_attempts: u32) -> Self {
        self.outbox.max_attempts = max_attempts;
        self
    }
}
