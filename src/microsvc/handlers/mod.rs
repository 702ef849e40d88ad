//! The ledger's callable commands.
//!
//! Each module follows the handler convention: `COMMAND`, `guard`, `handle`.

pub mod pledge_submit;
pub mod wallet_get;
pub mod wallet_provision;
