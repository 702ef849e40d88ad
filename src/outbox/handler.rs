use std::fmt;

use super::OutboxMessage;

/// Consumer of delivered outbox messages.
///
/// Delivery is at-least-once: a handler may see the same message again after
/// a crash or an expired lease, so it must be idempotent. Returning an error
/// releases the message for another attempt.
pub trait OutboxHandler {
    type Error: fmt::Display;

    fn handle(&mut self, message: &OutboxMessage) -> Result<(), Self::Error>;
}
