//! Ledger integration tests.

mod admin;
mod concurrency;
mod properties;
