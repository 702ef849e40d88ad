//! microsvc integration tests.

mod support;
mod commands;
mod convention;

#[cfg(feature = "http")]
mod http;
