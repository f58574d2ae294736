//! Background snapshot writer.
//!
//! Mutations hand their snapshot to the writer and move on. The writer keeps
//! at most one pending snapshot: a newer one replaces an unwritten older one,
//! and only one save runs at a time, so writes never race and the last
//! mutation always wins.

use crate::core::{persistence::SnapshotGateway, store::Snapshot};
use tokio::{sync::watch, task::JoinHandle};
use tracing::{debug, error, info};

/// Serialized, latest-wins persistence queue.
#[derive(Debug)]
pub struct SnapshotWriter {
    sender: watch::Sender<Option<Snapshot>>,
    task: JoinHandle<usize>,
}

impl SnapshotWriter {
    /// Spawns the writer task on the current tokio runtime.
    #[must_use]
    pub fn spawn(gateway: SnapshotGateway) -> Self {
        let (sender, receiver) = watch::channel(None);
        let task = tokio::spawn(run(gateway, receiver));
        Self { sender, task }
    }

    /// Queues `snapshot` for saving, replacing any snapshot not yet written.
    pub fn enqueue(&self, snapshot: Snapshot) {
        self.sender.send_replace(Some(snapshot));
    }

    /// Writes the last pending snapshot, stops the task, and returns how many saves ran.
    pub async fn shutdown(self) -> usize {
        drop(self.sender);
        match self.task.await {
            Ok(saves) => saves,
            Err(e) => {
                error!("Snapshot writer task failed: {}", e);
                0
            }
        }
    }
}

async fn run(gateway: SnapshotGateway, mut receiver: watch::Receiver<Option<Snapshot>>) -> usize {
    let mut saves = 0;
    // `changed` still reports a value sent just before the sender was dropped
    while receiver.changed().await.is_ok() {
        let pending = receiver.borrow_and_update().clone();
        let Some(snapshot) = pending else {
            continue;
        };
        match gateway.save(&snapshot).await {
            Ok(()) => {
                saves += 1;
                debug!(saves, "Snapshot written");
            }
            Err(e) => error!("Failed to save snapshot: {}", e),
        }
    }
    info!(saves, "Snapshot writer stopped");
    saves
}
