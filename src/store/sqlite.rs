use std::{str::FromStr, sync::Mutex, time::Duration};

use async_trait::async_trait;
use serde_json::Value;
use sqlx::{
    sqlite::{SqliteConnectOptions, SqlitePoolOptions},
    Sqlite, SqlitePool, Transaction,
};
use tokio::sync::{broadcast, Mutex as WriteLock};
use tracing::{debug, info};

use super::{tree, PushIdGenerator, RemoteStore, Snapshot, CHANGE_CAPACITY};
use crate::error::StoreError;

// Each row holds the JSON value of one subtree. No row path is ever a
// descendant of another row path: a write under an existing row is merged
// into that row, and a write above existing rows replaces them.
const SCHEMA: &str = "CREATE TABLE IF NOT EXISTS nodes (path TEXT PRIMARY KEY NOT NULL, value TEXT NOT NULL)";

pub struct SqliteStore {
    db_pool: SqlitePool,
    push_ids: Mutex<PushIdGenerator>,
    // read-modify-write of a covering row must not interleave
    write_lock: WriteLock<()>,
    tx: broadcast::Sender<String>,
}

impl SqliteStore {
    pub async fn connect(database_url: &str) -> Result<Self, StoreError> {
        let options = SqliteConnectOptions::from_str(database_url)?.create_if_missing(true);
        let db_pool = pool_options(database_url).connect_with(options).await?;
        sqlx::query(SCHEMA).execute(&db_pool).await?;

        info!("sqlite store ready at {database_url}");
        Ok(Self {
            db_pool,
            push_ids: Mutex::new(PushIdGenerator::new()),
            write_lock: WriteLock::new(()),
            tx: broadcast::channel(CHANGE_CAPACITY).0,
        })
    }

    async fn write(&self, segments: &[String], value: Value) -> Result<(), StoreError> {
        let path = tree::join(segments);
        let _guard = self.write_lock.lock().await;
        let mut tx = self.db_pool.begin().await?;

        if let Some((row_path, rel)) = find_covering_row(&mut tx, segments).await? {
            let (raw,): (String,) = sqlx::query_as("SELECT value FROM nodes WHERE path=?")
                .bind(&row_path)
                .fetch_one(&mut *tx)
                .await?;
            let mut row_value: Value = serde_json::from_str(&raw)?;
            tree::set_at(&mut row_value, &rel, value);
            store_row(&mut tx, &row_path, &row_value).await?;
        } else {
            let (lower, upper) = descendant_range(&path);
            sqlx::query("DELETE FROM nodes WHERE path=? OR (path>=? AND path<?)")
                .bind(&path)
                .bind(&lower)
                .bind(&upper)
                .execute(&mut *tx)
                .await?;
            store_row(&mut tx, &path, &value).await?;
        }

        tx.commit().await?;
        debug!("sqlite store wrote {path}");
        let _ = self.tx.send(path);
        Ok(())
    }
}

fn pool_options(database_url: &str) -> SqlitePoolOptions {
    if database_url.contains(":memory:") {
        // the database lives and dies with its one connection, which must never be reaped
        SqlitePoolOptions::new()
            .max_connections(1)
            .min_connections(1)
            .idle_timeout(None::<Duration>)
            .max_lifetime(None::<Duration>)
    } else {
        SqlitePoolOptions::new().max_connections(16)
    }
}

/// The row at `segments` or at one of its ancestors, with the remaining
/// path relative to that row.
async fn find_covering_row(
    tx: &mut Transaction<'_, Sqlite>,
    segments: &[String],
) -> Result<Option<(String, Vec<String>)>, StoreError> {
    for depth in 0..=segments.len() {
        let candidate = tree::join(&segments[..depth]);
        let found: Option<(i64,)> = sqlx::query_as("SELECT 1 FROM nodes WHERE path=?")
            .bind(&candidate)
            .fetch_optional(&mut **tx)
            .await?;
        if found.is_some() {
            return Ok(Some((candidate, segments[depth..].to_vec())));
        }
    }
    Ok(None)
}

async fn store_row(
    tx: &mut Transaction<'_, Sqlite>,
    path: &str,
    value: &Value,
) -> Result<(), StoreError> {
    if value.is_null() {
        sqlx::query("DELETE FROM nodes WHERE path=?")
            .bind(path)
            .execute(&mut **tx)
            .await?;
    } else {
        sqlx::query("INSERT INTO nodes (path,value) VALUES (?,?) ON CONFLICT(path) DO UPDATE SET value=excluded.value")
            .bind(path)
            .bind(serde_json::to_string(value)?)
            .execute(&mut **tx)
            .await?;
    }
    Ok(())
}

/// Rows strictly below `path` sort in `[path/, path0)` since '0' follows '/'.
/// The root path covers everything.
fn descendant_range(path: &str) -> (String, String) {
    if path.is_empty() {
        (String::new(), "\u{10FFFF}".to_owned())
    } else {
        (format!("{path}/"), format!("{path}0"))
    }
}

#[async_trait]
impl RemoteStore for SqliteStore {
    async fn get(&self, path: &str) -> Result<Snapshot, StoreError> {
        let segments = tree::parse_path(path)?;
        let path = tree::join(&segments);
        let mut tx = self.db_pool.begin().await?;

        if let Some((row_path, rel)) = find_covering_row(&mut tx, &segments).await? {
            let (raw,): (String,) = sqlx::query_as("SELECT value FROM nodes WHERE path=?")
                .bind(&row_path)
                .fetch_one(&mut *tx)
                .await?;
            let row_value: Value = serde_json::from_str(&raw)?;
            return Ok(tree::get_at(&row_value, &rel));
        }

        let (lower, upper) = descendant_range(&path);
        let rows: Vec<(String, String)> =
            sqlx::query_as("SELECT path,value FROM nodes WHERE path>=? AND path<? ORDER BY path")
                .bind(&lower)
                .bind(&upper)
                .fetch_all(&mut *tx)
                .await?;
        tx.commit().await?;

        let mut snapshot = Value::Null;
        for (row_path, raw) in rows {
            let rel = tree::parse_path(&row_path)?.split_off(segments.len());
            tree::set_at(&mut snapshot, &rel, serde_json::from_str(&raw)?);
        }
        Ok(snapshot)
    }

    async fn set(&self, path: &str, value: Value) -> Result<(), StoreError> {
        let segments = tree::parse_path(path)?;
        self.write(&segments, value).await
    }

    async fn push(&self, path: &str, value: Value) -> Result<String, StoreError> {
        let mut segments = tree::parse_path(path)?;
        let key = self
            .push_ids
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .generate();
        segments.push(key.clone());
        self.write(&segments, value).await?;
        Ok(key)
    }

    fn changes(&self) -> broadcast::Receiver<String> {
        self.tx.subscribe()
    }
}
