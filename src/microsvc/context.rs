//! Context passed to command handlers.

use serde::de::DeserializeOwned;
use serde_json::Value;

use super::error::HandlerError;
use super::session::Session;
use crate::ledger::{Ledger, LedgerError};

/// Everything a handler needs: the decoded request and the ledger.
///
/// ```ignore
/// pub fn handle<S: ModelStore + Clone>(ctx: &Context<S>) -> Result<Value, HandlerError> {
///     let caller = ctx.user_id()?;
///     let wallet = ctx.ledger().wallets().provision(caller)?;
///     Ok(serde_json::to_value(wallet)?)
/// }
/// ```
pub struct Context<'a, S> {
    command_name: String,
    input: Value,
    session: Session,
    ledger: &'a Ledger<S>,
}

impl<'a, S> Context<'a, S> {
    pub(crate) fn new(
        command_name: String,
        input: Value,
        session: Session,
        ledger: &'a Ledger<S>,
    ) -> Self {
        Self {
            command_name,
            input,
            session,
            ledger,
        }
    }

    /// Deserialize the input payload into a typed struct.
    pub fn input<T: DeserializeOwned>(&self) -> Result<T, HandlerError> {
        serde_json::from_value(self.input.clone())
            .map_err(|e| HandlerError::DecodeFailed(e.to_string()))
    }

    pub fn raw_input(&self) -> &Value {
        &self.input
    }

    pub fn command_name(&self) -> &str {
        &self.command_name
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    /// The authenticated caller, or `unauthenticated`.
    pub fn user_id(&self) -> Result<&str, HandlerError> {
        self.session.user_id().ok_or_else(|| {
            LedgerError::Unauthenticated(format!("{} requires a signed-in user", self.command_name))
                .into()
        })
    }

    pub fn ledger(&self) -> &Ledger<S> {
        self.ledger
    }

    pub fn has_field(&self, field: &str) -> bool {
        self.input.get(field).is_some()
    }

    pub fn has_fields(&self, fields: &[&str]) -> bool {
        fields.iter().all(|f| self.has_field(f))
    }
}
