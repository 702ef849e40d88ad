//! Errors returned from command dispatch.

use serde_json::{json, Value};

use crate::ledger::{ErrorCode, LedgerError};

#[derive(Debug, thiserror::Error)]
pub enum HandlerError {
    /// No handler registered for this command name.
    #[error("unknown command: {0}")]
    UnknownCommand(String),
    /// Payload could not be decoded into the command's input type.
    #[error("decode failed: {0}")]
    DecodeFailed(String),
    /// The command's guard rejected the input.
    #[error("guard rejected command: {0}")]
    GuardRejected(String),
    #[error(transparent)]
    Ledger(#[from] LedgerError),
}

impl From<serde_json::Error> for HandlerError {
    fn from(err: serde_json::Error) -> Self {
        HandlerError::DecodeFailed(err.to_string())
    }
}

impl HandlerError {
    pub fn code(&self) -> ErrorCode {
        match self {
            HandlerError::UnknownCommand(_) => ErrorCode::NotFound,
            HandlerError::DecodeFailed(_) | HandlerError::GuardRejected(_) => {
                ErrorCode::InvalidArgument
            }
            HandlerError::Ledger(err) => err.code(),
        }
    }

    /// HTTP-style status for this error.
    pub fn status_code(&self) -> u16 {
        self.code().http_status()
    }

    /// `{ "error": { "code": ..., "message": ... } }`
    pub fn to_body(&self) -> Value {
        let message = match self {
            HandlerError::Ledger(err) => err.message().to_string(),
            other => other.to_string(),
        };
        json!({ "error": { "code": self.code(), "message": message } })
    }
}
