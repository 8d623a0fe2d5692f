//! Request dispatcher
//!
//! Runs remote requests as tokio tasks and reports each result as a
//! [`Completion`] on a channel. The owner of the [`TodoState`] feeds those
//! completions back through [`TodoState::apply`], so it can keep accepting
//! intents while requests are in flight.
//!
//! ## Usage
//!
//! ```ignore
//! let (dispatcher, mut completions) = Dispatcher::new(Arc::new(store));
//! dispatcher.load(state.begin_load());
//!
//! while let Some(done) = completions.recv().await {
//!     state.apply(done)?;
//! }
//! ```
//!
//! [`TodoState`]: crate::state::TodoState
//! [`TodoState::apply`]: crate::state::TodoState::apply

use std::sync::Arc;

use futures_util::future::join_all;
use tokio::sync::mpsc;
use tracing::{debug, warn};

use crate::error::RemoteError;
use crate::models::{LocalToken, OwnerId, ServerId, Task};
use crate::remote::RemoteStore;
use crate::state::{AddTicket, BatchId, ClearBatch};

/// Result of a dispatched request
#[derive(Debug)]
pub enum Completion {
    /// Initial list finished
    Loaded(Result<Vec<Task>, RemoteError>),
    /// Create for an optimistic entry finished
    Created {
        token: LocalToken,
        result: Result<Task, RemoteError>,
    },
    /// Single delete finished
    Deleted {
        id: ServerId,
        result: Result<(), RemoteError>,
    },
    /// One delete of a clear batch finished
    ClearItem {
        batch: BatchId,
        id: ServerId,
        result: Result<(), RemoteError>,
    },
    /// Every delete of a clear batch settled, or aggregation failed
    ClearFinished {
        batch: BatchId,
        result: Result<(), String>,
    },
}

/// Spawns remote requests and reports their results
#[derive(Clone)]
pub struct Dispatcher {
    remote: Arc<dyn RemoteStore>,
    tx: mpsc::UnboundedSender<Completion>,
}

impl Dispatcher {
    /// Create a dispatcher and the receiver its completions arrive on
    pub fn new(remote: Arc<dyn RemoteStore>) -> (Self, mpsc::UnboundedReceiver<Completion>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self { remote, tx }, rx)
    }

    /// List the owner's tasks
    pub fn load(&self, owner: OwnerId) {
        let remote = Arc::clone(&self.remote);
        let tx = self.tx.clone();
        tokio::spawn(async move {
            let result = remote.list(owner).await;
            send(&tx, Completion::Loaded(result));
        });
    }

    /// Send the create request of an add ticket
    pub fn create(&self, ticket: AddTicket) {
        let remote = Arc::clone(&self.remote);
        let tx = self.tx.clone();
        tokio::spawn(async move {
            let result = remote.create(ticket.task).await;
            send(
                &tx,
                Completion::Created {
                    token: ticket.token,
                    result,
                },
            );
        });
    }

    /// Delete one task
    pub fn delete(&self, id: ServerId) {
        let remote = Arc::clone(&self.remote);
        let tx = self.tx.clone();
        tokio::spawn(async move {
            let result = remote.delete(id).await;
            send(&tx, Completion::Deleted { id, result });
        });
    }

    /// Delete every member of a clear batch concurrently
    ///
    /// Each member reports on its own as soon as it settles. A supervisor
    /// joins them and reports [`Completion::ClearFinished`] last; a member
    /// task that dies without reporting turns into an aggregation failure.
    pub fn clear(&self, batch: ClearBatch) {
        let ClearBatch { id: batch_id, targets } = batch;
        debug!("Dispatching clear batch #{} ({} deletes)", batch_id, targets.len());

        let handles: Vec<_> = targets
            .into_iter()
            .map(|id| {
                let remote = Arc::clone(&self.remote);
                let tx = self.tx.clone();
                tokio::spawn(async move {
                    let result = remote.delete(id).await;
                    send(
                        &tx,
                        Completion::ClearItem {
                            batch: batch_id,
                            id,
                            result,
                        },
                    );
                })
            })
            .collect();

        let tx = self.tx.clone();
        tokio::spawn(async move {
            let failed: Vec<String> = join_all(handles)
                .await
                .into_iter()
                .filter_map(|joined| joined.err().map(|e| e.to_string()))
                .collect();

            let result = if failed.is_empty() {
                Ok(())
            } else {
                warn!("Clear batch #{}: {} delete tasks failed", batch_id, failed.len());
                Err(failed.join("; "))
            };
            send(
                &tx,
                Completion::ClearFinished {
                    batch: batch_id,
                    result,
                },
            );
        });
    }
}

fn send(tx: &mpsc::UnboundedSender<Completion>, completion: Completion) {
    // Receiver gone means the view shut down; nothing left to update
    if tx.send(completion).is_err() {
        debug!("Completion dropped: receiver closed");
    }
}
