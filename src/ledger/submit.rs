use rust_decimal::prelude::FromPrimitive;
use rust_decimal::Decimal;
use tracing::{debug, info};
use uuid::Uuid;

use super::campaign::Campaign;
use super::error::LedgerError;
use super::pledge::{Pledge, PLEDGE_CREATED};
use super::wallet::{load_or_provision, stage_wallet};
use crate::config::LedgerConfig;
use crate::model::ModelStore;
use crate::outbox::OutboxMessage;
use crate::transaction::{run_transaction, TransactionOptions};

/// Largest amount a single pledge may carry (10^15).
pub const MAX_PLEDGE_AMOUNT: Decimal = Decimal::from_parts(0xA4C6_8000, 0x0003_8D7E, 0, false, 0);

/// Convert a client-supplied JSON number into a pledge amount.
pub fn parse_amount(raw: f64) -> Result<Decimal, LedgerError> {
    if !raw.is_finite() || raw <= 0.0 {
        return Err(LedgerError::invalid("amount must be a finite number greater than zero"));
    }
    let amount = Decimal::from_f64(raw)
        .map(|amount| amount.normalize())
        .filter(|amount| *amount > Decimal::ZERO)
        .ok_or_else(|| LedgerError::invalid("amount is not representable"))?;
    check_amount(amount)?;
    Ok(amount)
}

fn check_amount(amount: Decimal) -> Result<(), LedgerError> {
    if amount <= Decimal::ZERO {
        return Err(LedgerError::invalid("amount must be greater than zero"));
    }
    if amount > MAX_PLEDGE_AMOUNT {
        return Err(LedgerError::invalid(format!(
            "amount must not exceed {MAX_PLEDGE_AMOUNT}"
        )));
    }
    Ok(())
}

/// Ensure the authenticated caller is the investor named in the request.
pub(crate) fn authorize(caller: Option<&str>, investor_id: &str) -> Result<(), LedgerError> {
    match caller {
        Some(caller) if !caller.is_empty() && caller == investor_id => Ok(()),
        Some(_) => Err(LedgerError::Unauthenticated(
            "caller may only pledge from their own wallet".into(),
        )),
        None => Err(LedgerError::Unauthenticated("sign in to pledge".into())),
    }
}

/// Validates pledges and commits debit, pledge and outbox event in one transaction.
#[derive(Clone)]
pub struct PledgeSubmissionHandler<S> {
    store: S,
    options: TransactionOptions,
    demo_allowance: Decimal,
}

impl<S: ModelStore> PledgeSubmissionHandler<S> {
    pub fn new(store: S, config: &LedgerConfig) -> Self {
        Self {
            store,
            options: config.transaction_options(),
            demo_allowance: config.wallet.demo_allowance,
        }
    }

    /// Submit a live pledge and return its id.
    ///
    /// The wallet is debited synchronously. The campaign's raised total is
    /// updated later, when the `PledgeCreated` outbox message is delivered.
    pub fn submit_pledge(
        &self,
        caller: Option<&str>,
        investor_id: &str,
        campaign_id: &str,
        amount: Decimal,
    ) -> Result<String, LedgerError> {
        authorize(caller, investor_id)?;
        check_amount(amount)?;

        let pledge_id = Uuid::new_v4().to_string();

        let result = run_transaction(&self.store, &self.options, |tx| {
            // Peeked: raised-total updates on a busy campaign must not force resubmission.
            let campaign = tx
                .peek::<Campaign>(campaign_id)?
                .ok_or_else(|| LedgerError::NotFound(format!("campaign {campaign_id}")))?;
            campaign.check_minimum(amount)?;

            let (mut wallet, is_new) = load_or_provision(tx, investor_id, self.demo_allowance)?;
            wallet.debit_live(amount)?;

            let pledge = Pledge::live(pledge_id.as_str(), campaign_id, investor_id, amount);
            let message =
                OutboxMessage::encode(pledge.created_message_id(), PLEDGE_CREATED, &pledge)?;

            stage_wallet(tx, &wallet, is_new)?;
            tx.insert(&pledge)?;
            tx.insert(&message)?;
            Ok::<_, LedgerError>(wallet.live_balance)
        });

        match result {
            Ok(balance) => {
                info!(
                    pledge_id = %pledge_id,
                    investor_id,
                    campaign_id,
                    %amount,
                    %balance,
                    "pledge committed"
                );
                Ok(pledge_id)
            }
            Err(err) => {
                debug!(investor_id, campaign_id, %amount, error = %err, "pledge rejected");
                Err(err)
            }
        }
    }
}
