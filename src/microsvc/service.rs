//! Service - command handler registry and dispatch.
//!
//! `Service<S>` owns a [`Ledger`] and a set of named command handlers. Each
//! handler receives a [`Context`] and returns `Result<Value, HandlerError>`.
//!
//! ```ignore
//! let service = microsvc::Service::new(ledger)
//!     .command("ping", |_ctx| Ok(json!({ "pong": true })));
//!
//! let result = service.dispatch("ping", json!({}), Session::new());
//! ```

use std::collections::HashMap;

use serde_json::Value;
use tracing::{debug, warn};

use super::context::Context;
use super::error::HandlerError;
use super::session::Session;
use crate::ledger::{ErrorCode, Ledger};

type Guard<S> = Box<dyn Fn(&Context<S>) -> bool + Send + Sync>;
type Handle<S> = Box<dyn Fn(&Context<S>) -> Result<Value, HandlerError> + Send + Sync>;

struct CommandHandler<S> {
    guard: Option<Guard<S>>,
    handle: Handle<S>,
}

/// Routes named commands to handler functions.
pub struct Service<S> {
    ledger: Ledger<S>,
    handlers: HashMap<String, CommandHandler<S>>,
}

impl<S: Send + Sync + 'static> Service<S> {
    pub fn new(ledger: Ledger<S>) -> Self {
        Self {
            ledger,
            handlers: HashMap::new(),
        }
    }

    /// Register a command handler.
    pub fn command<F>(mut self, name: &str, handler: F) -> Self
    where
        F: Fn(&Context<S>) -> Result<Value, HandlerError> + Send + Sync + 'static,
    {
        self.handlers.insert(
            name.to_string(),
            CommandHandler {
                guard: None,
                handle: Box::new(handler),
            },
        );
        self
    }

    /// Register a command handler behind a guard.
    ///
    /// When the guard returns `false` the handler is not called and dispatch
    /// fails with [`HandlerError::GuardRejected`].
    pub fn command_guarded<G, F>(mut self, name: &str, guard: G, handler: F) -> Self
    where
        G: Fn(&Context<S>) -> bool + Send + Sync + 'static,
        F: Fn(&Context<S>) -> Result<Value, HandlerError> + Send + Sync + 'static,
    {
        self.handlers.insert(
            name.to_string(),
            CommandHandler {
                guard: Some(Box::new(guard)),
                handle: Box::new(handler),
            },
        );
        self
    }

    pub fn dispatch(
        &self,
        command: &str,
        input: Value,
        session: Session,
    ) -> Result<Value, HandlerError> {
        let handler = self
            .handlers
            .get(command)
            .ok_or_else(|| HandlerError::UnknownCommand(command.to_string()))?;

        let ctx = Context::new(command.to_string(), input, session, &self.ledger);

        if let Some(guard) = &handler.guard {
            if !guard(&ctx) {
                return Err(HandlerError::GuardRejected(command.to_string()));
            }
        }

        let result = (handler.handle)(&ctx);
        if let Err(err) = &result {
            match err.code() {
                ErrorCode::Internal | ErrorCode::Unavailable => {
                    warn!(command, error = %err, "command failed")
                }
                _ => debug!(command, error = %err, "command rejected"),
            }
        }
        result
    }

    /// Dispatch a [`CommandRequest`], turning errors into a status and body.
    pub fn dispatch_request(&self, request: &CommandRequest) -> CommandResponse {
        let session = Session::from_map(request.session_variables.clone());
        match self.dispatch(&request.command, request.input.clone(), session) {
            Ok(value) => CommandResponse {
                status: 200,
                body: value,
            },
            Err(e) => CommandResponse {
                status: e.status_code(),
                body: e.to_body(),
            },
        }
    }

    /// Registered command names, sorted.
    pub fn commands(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.handlers.keys().map(|s| s.as_str()).collect();
        names.sort_unstable();
        names
    }

    pub fn ledger(&self) -> &Ledger<S> {
        &self.ledger
    }
}

/// An inbound command request.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct CommandRequest {
    pub command: String,
    pub input: Value,
    #[serde(default)]
    pub session_variables: HashMap<String, String>,
}

/// Response from dispatching a command.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct CommandResponse {
    pub status: u16,
    pub body: Value,
}
