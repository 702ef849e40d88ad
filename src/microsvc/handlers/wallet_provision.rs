//! Handler: wallet.provision

use serde_json::Value;

use crate::microsvc::{Context, HandlerError};
use crate::model::ModelStore;

pub const COMMAND: &str = "wallet.provision";

pub fn guard<S>(_ctx: &Context<S>) -> bool {
    true
}

pub fn handle<S: ModelStore + Clone>(ctx: &Context<S>) -> Result<Value, HandlerError> {
    let caller = ctx.user_id()?;
    let wallet = ctx.ledger().wallets().provision(caller)?;
    Ok(serde_json::to_value(wallet)?)
}
