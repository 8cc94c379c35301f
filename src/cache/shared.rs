/*!
 * Tier 2 shared cache backends.
 *
 * Entries are whole Catalog Snapshots stored under namespaced string keys
 * with a time-to-live. Backends report failures; the tier manager decides
 * how to degrade.
 */

use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use chrono::Utc;
use log::debug;
use parking_lot::RwLock;
use rusqlite::{params, OptionalExtension};

use crate::database::DatabaseConnection;
use crate::store::Snapshot;

/// Cross-operation snapshot cache
pub trait SharedCache: Send + Sync {
    /// Backend name for logs
    fn name(&self) -> &'static str;

    /// Fetch a live entry
    fn get(&self, key: &str) -> Result<Option<Snapshot>>;

    /// Store an entry for `ttl`
    fn put(&self, key: &str, snapshot: &Snapshot, ttl: Duration) -> Result<()>;

    /// Drop an entry; missing keys are not an error
    fn forget(&self, key: &str) -> Result<()>;
}

/// Shared tier living in process memory
///
/// Shared by every operation holding a clone.
#[derive(Clone, Default)]
pub struct ProcessSharedCache {
    entries: Arc<RwLock<HashMap<String, (Instant, Arc<Snapshot>)>>>,
}

impl ProcessSharedCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored entries, expired ones included
    pub fn len(&self) -> usize {
        self.entries.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.read().is_empty()
    }
}

impl SharedCache for ProcessSharedCache {
    fn name(&self) -> &'static str {
        "process"
    }

    fn get(&self, key: &str) -> Result<Option<Snapshot>> {
        {
            let entries = self.entries.read();
            match entries.get(key) {
                None => return Ok(None),
                Some((expires_at, snapshot)) if *expires_at > Instant::now() => {
                    return Ok(Some(snapshot.as_ref().clone()));
                }
                Some(_) => {}
            }
        }

        // Expired
        self.entries.write().remove(key);
        Ok(None)
    }

    fn put(&self, key: &str, snapshot: &Snapshot, ttl: Duration) -> Result<()> {
        let expires_at = Instant::now() + ttl;
        self.entries
            .write()
            .insert(key.to_string(), (expires_at, Arc::new(snapshot.clone())));
        Ok(())
    }

    fn forget(&self, key: &str) -> Result<()> {
        self.entries.write().remove(key);
        Ok(())
    }
}

/// Shared tier stored in the `shared_cache` table
///
/// Visible to every process opening the same database file.
#[derive(Clone, Debug)]
pub struct DatabaseSharedCache {
    db: DatabaseConnection,
}

impl DatabaseSharedCache {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    /// Delete every expired row; returns how many were removed
    pub fn purge_expired(&self) -> Result<usize> {
        let now = Utc::now().timestamp_millis();
        self.db.execute(|conn| {
            let removed = conn.execute("DELETE FROM shared_cache WHERE expires_at_ms <= ?1", [now])?;
            Ok(removed)
        })
    }
}

impl SharedCache for DatabaseSharedCache {
    fn name(&self) -> &'static str {
        "database"
    }

    fn get(&self, key: &str) -> Result<Option<Snapshot>> {
        let now = Utc::now().timestamp_millis();

        let row: Option<(String, i64)> = self.db.execute(|conn| {
            Ok(conn
                .query_row(
                    "SELECT payload, expires_at_ms FROM shared_cache WHERE cache_key = ?1",
                    [key],
                    |row| Ok((row.get(0)?, row.get(1)?)),
                )
                .optional()?)
        })?;

        let Some((payload, expires_at_ms)) = row else {
            return Ok(None);
        };

        if expires_at_ms <= now {
            debug!("Shared cache entry '{}' expired", key);
            self.forget(key)?;
            return Ok(None);
        }

        let snapshot = serde_json::from_str(&payload)
            .with_context(|| format!("Corrupt shared cache payload for '{}'", key))?;
        Ok(Some(snapshot))
    }

    fn put(&self, key: &str, snapshot: &Snapshot, ttl: Duration) -> Result<()> {
        let payload = serde_json::to_string(snapshot).context("Failed to encode snapshot")?;
        let ttl_ms = i64::try_from(ttl.as_millis()).unwrap_or(i64::MAX);
        let expires_at_ms = Utc::now().timestamp_millis().saturating_add(ttl_ms);

        self.db.execute(|conn| {
            conn.execute(
                r#"
                INSERT INTO shared_cache (cache_key, payload, expires_at_ms) VALUES (?1, ?2, ?3)
                ON CONFLICT(cache_key) DO UPDATE SET
                    payload = excluded.payload,
                    expires_at_ms = excluded.expires_at_ms
                "#,
                params![key, payload, expires_at_ms],
            )?;
            Ok(())
        })
    }

    fn forget(&self, key: &str) -> Result<()> {
        self.db.execute(|conn| {
            conn.execute("DELETE FROM shared_cache WHERE cache_key = ?1", [key])?;
            Ok(())
        })
    }
}
