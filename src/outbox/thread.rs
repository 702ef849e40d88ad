//! Background thread that keeps draining the outbox.

use std::sync::mpsc::{channel, Sender, TryRecvError};
use std::thread::{self, JoinHandle};
use std::time::Duration;

use tracing::{info, warn};

use super::{OutboxHandler, OutboxWorker};
use crate::model::ModelStore;

/// Counters accumulated by an [`OutboxWorkerThread`].
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct WorkerStats {
    pub messages_completed: usize,
    pub messages_released: usize,
    pub messages_failed: usize,
    pub polls: usize,
}

/// A worker running on its own thread until stopped.
///
/// ```ignore
/// let thread = OutboxWorkerThread::spawn(
///     store.clone(),
///     OutboxWorker::new(RaisedTotalReconciler::new(store.clone(), &config)),
///     Duration::from_millis(50),
/// );
/// // ... submit pledges ...
/// let stats = thread.stop();
/// ```
pub struct OutboxWorkerThread {
    stop_tx: Sender<()>,
    handle: Option<JoinHandle<WorkerStats>>,
}

impl OutboxWorkerThread {
    pub fn spawn<S, H>(store: S, mut worker: OutboxWorker<H>, poll_interval: Duration) -> Self
    where
        S: ModelStore + 'static,
        H: OutboxHandler + Send + 'static,
    {
        let (stop_tx, stop_rx) = channel();

        let handle = thread::spawn(move || {
            let mut stats = WorkerStats::default();
            info!(worker_id = worker.worker_id(), "outbox worker started");

            loop {
                match stop_rx.try_recv() {
                    Ok(()) | Err(TryRecvError::Disconnected) => break,
                    Err(TryRecvError::Empty) => {}
                }

                stats.polls += 1;
                match worker.drain(&store) {
                    Ok(result) => {
                        stats.messages_completed += result.completed;
                        stats.messages_released += result.released;
                        stats.messages_failed += result.failed;
                        if result.claimed > 0 {
                            continue;
                        }
                    }
                    Err(err) => warn!(error = %err, "outbox drain failed"),
                }

                thread::sleep(poll_interval);
            }

            info!(worker_id = worker.worker_id(), polls = stats.polls, "outbox worker stopped");
            stats
        });

        Self {
            stop_tx,
            handle: Some(handle),
        }
    }

    /// Signal the worker to stop, wait for it, and return its counters.
    pub fn stop(mut self) -> WorkerStats {
        let _ = self.stop_tx.send(());
        self.handle
            .take()
            .map(|handle| handle.join().unwrap_or_default())
            .unwrap_or_default()
    }
}

impl Drop for OutboxWorkerThread {
    fn drop(&mut self) {
        let _ = self.stop_tx.send(());
    }
}
