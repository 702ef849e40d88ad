//! Handler: wallet.get
//!
//! Returns the caller's wallet. A caller without one sees the wallet they
//! would be provisioned with; nothing is written.

use serde_json::Value;

use crate::ledger::Wallet;
use crate::microsvc::{Context, HandlerError};
use crate::model::ModelStore;

pub const COMMAND: &str = "wallet.get";

pub fn guard<S>(_ctx: &Context<S>) -> bool {
    true
}

pub fn handle<S: ModelStore + Clone>(ctx: &Context<S>) -> Result<Value, HandlerError> {
    let caller = ctx.user_id()?;
    let ledger = ctx.ledger();
    let wallet = match ledger.wallets().get(caller)? {
        Some(wallet) => wallet,
        None => Wallet::provisioned(caller, ledger.config().wallet.demo_allowance),
    };
    Ok(serde_json::to_value(wallet)?)
}
