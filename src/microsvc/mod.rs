//! microsvc - The ledger's callable surface.
//!
//! Commands are registered on a [`Service`] by name. Each handler receives a
//! [`Context`] holding the decoded input, the caller's [`Session`] and the
//! [`Ledger`](crate::ledger::Ledger).
//!
//! ```ignore
//! use std::sync::Arc;
//! use pledge_ledger::{microsvc, InMemoryModelStore, Ledger, LedgerConfig};
//!
//! let ledger = Ledger::new(InMemoryModelStore::new(), LedgerConfig::default());
//! let service = Arc::new(microsvc::ledger_service(ledger));
//!
//! let reply = service.dispatch(
//!     "pledge.submit",
//!     json!({ "campaignId": "c1", "amount": 300 }),
//!     microsvc::Session::for_user("investor-1"),
//! )?;
//!
//! // HTTP transport (requires "http" feature)
//! // microsvc::serve(service, "0.0.0.0:3000").await?;
//! ```
//!
//! ## Handler Convention
//!
//! ```ignore
//! pub const COMMAND: &str = "wallet.provision";
//!
//! pub fn guard<S>(ctx: &Context<S>) -> bool { true }
//!
//! pub fn handle<S: ModelStore + Clone>(ctx: &Context<S>) -> Result<Value, HandlerError> {
//!     let wallet = ctx.ledger().wallets().provision(ctx.user_id()?)?;
//!     Ok(serde_json::to_value(wallet)?)
//! }
//! ```

mod context;
mod error;
pub mod handlers;
mod service;
mod session;

pub use context::Context;
pub use error::HandlerError;
pub use service::{CommandRequest, CommandResponse, Service};
pub use session::{Session, ROLE, USER_ID};

#[cfg(feature = "http")]
mod http;
#[cfg(feature = "http")]
pub use http::{router, serve};

use crate::ledger::Ledger;
use crate::model::ModelStore;

/// Register handler modules with a service using the convention pattern.
///
/// Each handler module must export `COMMAND`, `guard(ctx) -> bool` and
/// `handle(ctx) -> Result<Value, HandlerError>`.
///
/// ```ignore
/// let service = pledge_ledger::register_handlers!(
///     microsvc::Service::new(ledger),
///     handlers::wallet_get,
///     handlers::wallet_provision,
/// );
/// ```
#[macro_export]
macro_rules! register_handlers {
    ($service:expr, $( $($seg:ident)::+ ),+ $(,)?) => {
        $service
        $(
            .command_guarded(
                $($seg)::+::COMMAND,
                $($seg)::+::guard,
                $($seg)::+::handle,
            )
        )+
    };
}

/// A service exposing every ledger command.
pub fn ledger_service<S>(ledger: Ledger<S>) -> Service<S>
where
    S: ModelStore + Clone + 'static,
{
    crate::register_handlers!(
        Service::new(ledger),
        handlers::pledge_submit,
        handlers::wallet_get,
        handlers::wallet_provision,
    )
}
