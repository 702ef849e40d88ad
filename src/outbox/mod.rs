//! Outbox - Durable side effects committed alongside the data they describe.
//!
//! A command that needs follow-up work writes an [`OutboxMessage`] into the
//! same [`WriteBatch`](crate::model::WriteBatch) as its state change. A worker
//! later claims pending messages under a lease and hands them to an
//! [`OutboxHandler`]:
//!
//! 1. **Commit phase** - the message is staged with `Transaction::insert` and
//!    becomes visible exactly when the change it announces does.
//! 2. **Delivery phase** - [`OutboxWorker`] claims, delivers, then completes,
//!    releases, or fails each message.
//!
//! Delivery is at-least-once. A worker that dies mid-delivery leaves the
//! message in flight until its lease runs out, after which it is claimed again.
//!
//! ## Example
//!
//! ```ignore
//! let mut worker = OutboxWorker::from_settings(reconciler, &config.outbox);
//! let result = worker.drain_until_idle(&store)?;
//! assert_eq!(result.failed, 0);
//! ```

mod handler;
mod message;
mod store_ext;
mod thread;
mod worker;

pub use handler::OutboxHandler;
pub use message::{OutboxMessage, OutboxStatus};
pub use store_ext::OutboxStoreExt;
pub use thread::{OutboxWorkerThread, WorkerStats};
pub use worker::{DrainResult, OutboxWorker};
