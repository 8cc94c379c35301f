/*!
 * Tests for the cache tiers and shared backends
 */

use std::sync::Arc;
use std::thread;
use std::time::Duration;

use anyhow::{Result, anyhow};
use lexicat::cache::{CacheTiers, DatabaseSharedCache, ProcessSharedCache, SharedCache};
use lexicat::database::DatabaseConnection;
use lexicat::store::Snapshot;

use crate::common;

/// Backend whose every call fails
struct BrokenCache;

impl SharedCache for BrokenCache {
    fn name(&self) -> &'static str {
        "broken"
    }

    fn get(&self, _key: &str) -> Result<Option<Snapshot>> {
        Err(anyhow!("backend unavailable"))
    }

    fn put(&self, _key: &str, _snapshot: &Snapshot, _ttl: Duration) -> Result<()> {
        Err(anyhow!("backend unavailable"))
    }

    fn forget(&self, _key: &str) -> Result<()> {
        Err(anyhow!("backend unavailable"))
    }
}

#[test]
fn test_processCache_afterTtl_shouldExpire() {
    let cache = ProcessSharedCache::new();
    cache
        .put("k", &common::snapshot(&[("Hello", "Hi")]), Duration::from_millis(20))
        .unwrap();
    assert!(cache.get("k").unwrap().is_some());

    thread::sleep(Duration::from_millis(40));

    assert!(cache.get("k").unwrap().is_none());
    assert!(cache.is_empty());
}

#[test]
fn test_databaseCache_shouldBeVisibleThroughAnotherConnection() {
    let dir = common::create_temp_dir();
    let path = dir.path().join("catalog.db");
    let writer = DatabaseSharedCache::new(DatabaseConnection::new(&path).unwrap());
    let reader = DatabaseSharedCache::new(DatabaseConnection::new(&path).unwrap());

    writer
        .put("lexicat:list:app:uz", &common::snapshot(&[("Hello", "Salom")]), Duration::from_secs(60))
        .unwrap();

    assert_eq!(
        reader.get("lexicat:list:app:uz").unwrap(),
        Some(common::snapshot(&[("Hello", "Salom")]))
    );

    reader.forget("lexicat:list:app:uz").unwrap();
    assert!(writer.get("lexicat:list:app:uz").unwrap().is_none());
}

#[test]
fn test_databaseCache_purgeExpired_shouldRemoveOnlyStaleRows() {
    let cache = DatabaseSharedCache::new(DatabaseConnection::new_in_memory().unwrap());
    cache.put("stale", &Snapshot::new(), Duration::ZERO).unwrap();
    cache.put("live", &Snapshot::new(), Duration::from_secs(60)).unwrap();

    assert_eq!(cache.purge_expired().unwrap(), 1);
    assert!(cache.get("live").unwrap().is_some());
}

#[test]
fn test_remember_withBrokenSharedTier_shouldStillLoad() {
    let mut tiers = CacheTiers::new(Some(Arc::new(BrokenCache)), "lexicat", Duration::from_secs(60));

    let snapshot = tiers.remember("app", "en", || common::snapshot(&[("Hello", "Hello")]));
    tiers.invalidate_scope("app", &common::strings(&["en"]));

    assert_eq!(snapshot.get("Hello").map(String::as_str), Some("Hello"));
    assert!(tiers.is_empty());
}

#[test]
fn test_stats_shouldCountHitsAndMisses() {
    let mut tiers = CacheTiers::local();

    tiers.remember("app", "en", Snapshot::new);
    tiers.remember("app", "en", Snapshot::new);
    tiers.remember("app", "uz", Snapshot::new);
    tiers.remember("app", "uz", Snapshot::new);

    let (hits, misses, rate) = tiers.stats();
    assert_eq!((hits, misses), (2, 2));
    assert!((rate - 0.5).abs() < f64::EPSILON);
}
