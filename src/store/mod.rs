//! Path/value tree store with snapshot subscriptions.
//!
//! Values live at slash separated paths (`rooms/{id}/questions/{key}`).
//! Every write is announced on a broadcast channel carrying the written path;
//! a [`Subscription`] re-reads its own path whenever an overlapping path is
//! written and hands the fresh snapshot to its owner.

mod memory;
mod push_id;
mod sqlite;
pub mod tree;

use std::sync::Arc;

use async_trait::async_trait;
use serde_json::Value;
use tokio::{
    sync::{broadcast, mpsc},
    task::JoinHandle,
};
use tracing::{debug, warn};

pub use memory::MemoryStore;
pub use push_id::PushIdGenerator;
pub use sqlite::SqliteStore;

use crate::error::StoreError;

/// A full point-in-time value of a path. `Null` when nothing is stored there.
pub type Snapshot = Value;

pub(crate) const CHANGE_CAPACITY: usize = 64;
const SNAPSHOT_BUFFER: usize = 8;

#[async_trait]
pub trait RemoteStore: Send + Sync + 'static {
    async fn get(&self, path: &str) -> Result<Snapshot, StoreError>;

    /// Replaces the value at `path`. Writing `Null` deletes it.
    async fn set(&self, path: &str, value: Value) -> Result<(), StoreError>;

    /// Appends `value` as a new child of `path` under a generated key and
    /// returns that key.
    async fn push(&self, path: &str, value: Value) -> Result<String, StoreError>;

    /// Paths written from now on.
    fn changes(&self) -> broadcast::Receiver<String>;
}

/// Live listener on one path. Dropping it cancels the listener.
pub struct Subscription {
    path: String,
    rx: mpsc::Receiver<Result<Snapshot, StoreError>>,
    task: JoinHandle<()>,
}

impl Subscription {
    /// Starts listening on `path`. The first snapshot is the current value;
    /// later ones follow every write that can change it.
    pub fn open(store: Arc<dyn RemoteStore>, path: &str) -> Result<Self, StoreError> {
        let watched = tree::parse_path(path)?;
        let path = tree::join(&watched);

        // subscribe before the first read so no write slips between the two
        let mut changes = store.changes();
        let (tx, rx) = mpsc::channel(SNAPSHOT_BUFFER);

        let listen_path = path.clone();
        let task = tokio::spawn(async move {
            let mut stale = true;
            loop {
                if stale {
                    stale = false;
                    let snapshot = store.get(&listen_path).await;
                    if tx.send(snapshot).await.is_err() {
                        break;
                    }
                }

                match changes.recv().await {
                    Ok(written) => {
                        stale = tree::parse_path(&written)
                            .map(|written| tree::overlaps(&watched, &written))
                            .unwrap_or(false);
                    }
                    Err(broadcast::error::RecvError::Lagged(skipped)) => {
                        warn!("subscription on {listen_path} lagged by {skipped} writes, re-reading");
                        stale = true;
                    }
                    Err(broadcast::error::RecvError::Closed) => {
                        let _ = tx.send(Err(StoreError::Closed)).await;
                        break;
                    }
                }
            }
        });

        debug!("subscribed to {path}");
        Ok(Self { path, rx, task })
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    /// False once the listener has stopped; no further snapshots will come.
    pub fn is_live(&self) -> bool {
        !self.task.is_finished()
    }

    /// Next snapshot, or `None` once the listener has stopped.
    pub async fn next(&mut self) -> Option<Result<Snapshot, StoreError>> {
        self.rx.recv().await
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        self.task.abort();
        debug!("released subscription to {}", self.path);
    }
}
