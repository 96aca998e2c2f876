use std::sync::Mutex;

use async_trait::async_trait;
use serde_json::Value;
use tokio::sync::broadcast;
use tracing::debug;

use super::{tree, PushIdGenerator, RemoteStore, Snapshot, CHANGE_CAPACITY};
use crate::error::StoreError;

/// Whole tree held in one JSON value. Used by tests and by the server when no
/// database is configured.
pub struct MemoryStore {
    root: Mutex<Value>,
    push_ids: Mutex<PushIdGenerator>,
    tx: broadcast::Sender<String>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::with_root(Value::Null)
    }

    pub fn with_root(root: Value) -> Self {
        Self {
            root: Mutex::new(root),
            push_ids: Mutex::new(PushIdGenerator::new()),
            tx: broadcast::channel(CHANGE_CAPACITY).0,
        }
    }

    fn write(&self, segments: &[String], value: Value) {
        {
            let mut root = self.root.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
            tree::set_at(&mut root, segments, value);
        }
        let path = tree::join(segments);
        debug!("memory store wrote {path}");
        // no receivers is fine, nobody is listening yet
        let _ = self.tx.send(path);
    }
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl RemoteStore for MemoryStore {
    async fn get(&self, path: &str) -> Result<Snapshot, StoreError> {
        let segments = tree::parse_path(path)?;
        let root = self.root.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
        Ok(tree::get_at(&root, &segments))
    }

    async fn set(&self, path: &str, value: Value) -> Result<(), StoreError> {
        let segments = tree::parse_path(path)?;
        self.write(&segments, value);
        Ok(())
    }

    async fn push(&self, path: &str, value: Value) -> Result<String, StoreError> {
        let mut segments = tree::parse_path(path)?;
        let key = self
            .push_ids
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .generate();
        segments.push(key.clone());
        self.write(&segments, value);
        Ok(key)
    }

    fn changes(&self) -> broadcast::Receiver<String> {
        self.tx.subscribe()
    }
}
