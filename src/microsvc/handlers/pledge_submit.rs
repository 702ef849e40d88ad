//! Handler: pledge.submit
//!
//! Input `{ "campaignId": "...", "amount": 300 }`, output `{ "pledgeId": "..." }`.
//! The caller pledges from their own wallet. An `investorId` may be given but
//! must name the caller.

use serde::Deserialize;
use serde_json::{json, Value};

use crate::ledger::{parse_amount, LedgerError};
use crate::microsvc::{Context, HandlerError};
use crate::model::ModelStore;

pub const COMMAND: &str = "pledge.submit";

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Input {
    pub campaign_id: String,
    pub amount: f64,
    #[serde(default)]
    pub investor_id: Option<String>,
}

pub fn guard<S>(ctx: &Context<S>) -> bool {
    ctx.has_fields(&["campaignId", "amount"])
}

pub fn handle<S: ModelStore + Clone>(ctx: &Context<S>) -> Result<Value, HandlerError> {
    let caller = ctx.user_id()?;
    let input = ctx.input::<Input>()?;

    let investor_id = input.investor_id.as_deref().unwrap_or(caller);
    if investor_id != caller {
        return Err(LedgerError::Unauthenticated(
            "caller may only pledge from their own wallet".into(),
        )
        .into());
    }

    let amount = parse_amount(input.amount)?;
    let pledge_id = ctx.ledger().submissions().submit_pledge(
        Some(caller),
        investor_id,
        &input.campaign_id,
        amount,
    )?;

    Ok(json!({ "pledgeId": pledge_id }))
}
