//! Error types surfaced to ledger callers.

use std::fmt;

use serde::Serialize;

use crate::model::ModelError;
use crate::transaction::TransactionError;

pub const MINIMUM_NOT_MET: &str = "minimum investment not met";
pub const INSUFFICIENT_BALANCE: &str = "insufficient balance";
pub const BALANCE_LIMIT_EXCEEDED: &str = "balance limit exceeded";
pub const RAISED_LIMIT_EXCEEDED: &str = "raised total limit exceeded";

/// Stable, client-visible error code.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum ErrorCode {
    Unauthenticated,
    InvalidArgument,
    NotFound,
    FailedPrecondition,
    Unavailable,
    Internal,
}

impl ErrorCode {
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorCode::Unauthenticated => "unauthenticated",
            ErrorCode::InvalidArgument => "invalid-argument",
            ErrorCode::NotFound => "not-found",
            ErrorCode::FailedPrecondition => "failed-precondition",
            ErrorCode::Unavailable => "unavailable",
            ErrorCode::Internal => "internal",
        }
    }

    /// Map this code to an HTTP status.
    pub fn http_status(&self) -> u16 {
        match self {
            ErrorCode::Unauthenticated => 401,
            ErrorCode::InvalidArgument => 400,
            ErrorCode::NotFound => 404,
            ErrorCode::FailedPrecondition => 400,
            ErrorCode::Unavailable => 503,
            ErrorCode::Internal => 500,
        }
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error returned by ledger operations.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum LedgerError {
    #[error("unauthenticated: {0}")]
    Unauthenticated(String),
    #[error("invalid argument: {0}")]
    InvalidArgument(String),
    #[error("not found: {0}")]
    NotFound(String),
    #[error("failed precondition: {0}")]
    FailedPrecondition(String),
    #[error("unavailable: {0}")]
    Unavailable(String),
    #[error("internal error: {0}")]
    Internal(String),
}

impl LedgerError {
    pub fn code(&self) -> ErrorCode {
        match self {
            LedgerError::Unauthenticated(_) => ErrorCode::Unauthenticated,
            LedgerError::InvalidArgument(_) => ErrorCode::InvalidArgument,
            LedgerError::NotFound(_) => ErrorCode::NotFound,
            LedgerError::FailedPrecondition(_) => ErrorCode::FailedPrecondition,
            LedgerError::Unavailable(_) => ErrorCode::Unavailable,
            LedgerError::Internal(_) => ErrorCode::Internal,
        }
    }

    pub fn message(&self) -> &str {
        match self {
            LedgerError::Unauthenticated(msg)
            | LedgerError::InvalidArgument(msg)
            | LedgerError::NotFound(msg)
            | LedgerError::FailedPrecondition(msg)
            | LedgerError::Unavailable(msg)
            | LedgerError::Internal(msg) => msg,
        }
    }

    pub(crate) fn invalid(msg: impl Into<String>) -> Self {
        LedgerError::InvalidArgument(msg.into())
    }

    pub(crate) fn precondition(msg: impl Into<String>) -> Self {
        LedgerError::FailedPrecondition(msg.into())
    }
}

impl From<TransactionError> for LedgerError {
    fn from(err: TransactionError) -> Self {
        match err {
            TransactionError::Exhausted { attempts, .. } => LedgerError::Unavailable(format!(
                "too much contention, gave up after {attempts} attempts"
            )),
            TransactionError::Conflict(e) => LedgerError::Unavailable(e.to_string()),
            other => LedgerError::Internal(other.to_string()),
        }
    }
}

impl From<ModelError> for LedgerError {
    fn from(err: ModelError) -> Self {
        if err.is_conflict() {
            LedgerError::Unavailable(err.to_string())
        } else {
            LedgerError::Internal(err.to_string())
        }
    }
}

impl From<bitcode::Error> for LedgerError {
    fn from(err: bitcode::Error) -> Self {
        LedgerError::Internal(format!("event encoding failed: {err}"))
    }
}
