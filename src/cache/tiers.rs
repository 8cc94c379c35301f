/*!
 * Cache tier manager.
 *
 * Tier 1 is an unbounded memo owned by one logical operation. Tier 2 is an
 * optional shared cache with a time-to-live, populated only by the
 * load-through read path and by export pre-warming.
 */

use std::collections::HashMap;
use std::convert::Infallible;
use std::sync::Arc;
use std::time::Duration;

use log::{debug, warn};

use super::shared::SharedCache;
use crate::language_utils;
use crate::store::Snapshot;

/// Two-tier snapshot cache for one operation
pub struct CacheTiers {
    /// Tier 1 snapshots keyed `scope|locale`
    snapshots: HashMap<String, Arc<Snapshot>>,
    /// Tier 1 point entries keyed `scope|locale|key`
    points: HashMap<String, String>,
    shared: Option<Arc<dyn SharedCache>>,
    prefix: String,
    ttl: Duration,
    hits: usize,
    misses: usize,
}

impl CacheTiers {
    pub fn new(shared: Option<Arc<dyn SharedCache>>, prefix: &str, ttl: Duration) -> Self {
        Self {
            snapshots: HashMap::new(),
            points: HashMap::new(),
            shared,
            prefix: prefix.to_string(),
            ttl,
            hits: 0,
            misses: 0,
        }
    }

    /// Tier 1 only
    pub fn local() -> Self {
        Self::new(None, "", Duration::ZERO)
    }

    /// Tier 2 key for a pair: `{prefix}:list:{scope}:{locale}`
    pub fn shared_key(&self, scope: &str, locale: &str) -> String {
        format!(
            "{}:list:{}:{}",
            self.prefix,
            language_utils::normalize_scope(scope),
            language_utils::normalize_locale(locale)
        )
    }

    fn pair_key(scope: &str, locale: &str) -> String {
        format!(
            "{}|{}",
            language_utils::normalize_scope(scope),
            language_utils::normalize_locale(locale)
        )
    }

    fn point_key(scope: &str, locale: &str, key: &str) -> String {
        format!("{}|{}", Self::pair_key(scope, locale), key)
    }

    /// Get the snapshot for a pair, computing and remembering it on a miss
    ///
    /// Lookup order is tier 1, tier 2, then `load`. A computed value is
    /// stored in both tiers; concurrent cold readers may each compute, and
    /// the last one written to tier 2 wins.
    pub fn remember<F>(&mut self, scope: &str, locale: &str, load: F) -> Arc<Snapshot>
    where
        F: FnOnce() -> Snapshot,
    {
        match self.try_remember(scope, locale, || Ok::<_, Infallible>(load())) {
            Ok(snapshot) => snapshot,
            Err(never) => match never {},
        }
    }

    /// `remember` with a fallible loader
    ///
    /// A failed load is returned as is and stored in neither tier, so the
    /// next lookup tries again.
    pub fn try_remember<F, E>(&mut self, scope: &str, locale: &str, load: F) -> Result<Arc<Snapshot>, E>
    where
        F: FnOnce() -> Result<Snapshot, E>,
    {
        let pair = Self::pair_key(scope, locale);
        if let Some(snapshot) = self.snapshots.get(&pair) {
            self.hits += 1;
            return Ok(Arc::clone(snapshot));
        }

        if let Some(snapshot) = self.shared_get(scope, locale) {
            self.hits += 1;
            let snapshot = Arc::new(snapshot);
            self.snapshots.insert(pair, Arc::clone(&snapshot));
            return Ok(snapshot);
        }

        self.misses += 1;
        debug!("Cache miss for {}, loading", pair);

        let snapshot = load()?;
        self.shared_put(scope, locale, &snapshot);

        let snapshot = Arc::new(snapshot);
        self.snapshots.insert(pair, Arc::clone(&snapshot));
        Ok(snapshot)
    }

    /// Tier 1 point lookup
    pub fn point(&self, scope: &str, locale: &str, key: &str) -> Option<&str> {
        self.points
            .get(&Self::point_key(scope, locale, key))
            .map(String::as_str)
    }

    /// Remember one resolved value for the rest of the operation
    pub fn set_point(&mut self, scope: &str, locale: &str, key: &str, value: &str) {
        self.points
            .insert(Self::point_key(scope, locale, key), value.to_string());
    }

    /// Store a freshly computed snapshot in both tiers
    ///
    /// Point entries of the pair are dropped so they cannot shadow it.
    pub fn prewarm(&mut self, scope: &str, locale: &str, snapshot: Snapshot) {
        let pair = Self::pair_key(scope, locale);
        let point_prefix = format!("{}|", pair);
        self.points.retain(|k, _| !k.starts_with(&point_prefix));

        self.shared_put(scope, locale, &snapshot);
        self.snapshots.insert(pair, Arc::new(snapshot));
    }

    /// Drop tier 1 and tier 2 entries for one pair
    ///
    /// Other locales of the scope are untouched.
    pub fn invalidate_locale(&mut self, scope: &str, locale: &str) {
        let pair = Self::pair_key(scope, locale);
        let point_prefix = format!("{}|", pair);

        self.snapshots.remove(&pair);
        self.points.retain(|k, _| !k.starts_with(&point_prefix));
        self.shared_forget(scope, locale);

        debug!("Invalidated cache for {}", pair);
    }

    /// Drop every tier 1 entry of a scope and tier 2 entries for `locales`
    pub fn invalidate_scope(&mut self, scope: &str, locales: &[String]) {
        let scope_prefix = format!("{}|", language_utils::normalize_scope(scope));

        self.snapshots.retain(|k, _| !k.starts_with(&scope_prefix));
        self.points.retain(|k, _| !k.starts_with(&scope_prefix));

        for locale in locales {
            self.shared_forget(scope, locale);
        }

        debug!("Invalidated cache for scope '{}' ({} locales)", scope, locales.len());
    }

    /// Get cache statistics: (hits, misses, hit rate)
    pub fn stats(&self) -> (usize, usize, f64) {
        let total = self.hits + self.misses;
        let hit_rate = if total > 0 {
            self.hits as f64 / total as f64
        } else {
            0.0
        };

        (self.hits, self.misses, hit_rate)
    }

    /// Number of tier 1 snapshots held
    pub fn len(&self) -> usize {
        self.snapshots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.snapshots.is_empty()
    }

    pub fn has_shared_tier(&self) -> bool {
        self.shared.is_some()
    }

    fn shared_get(&self, scope: &str, locale: &str) -> Option<Snapshot> {
        let shared = self.shared.as_ref()?;
        let key = self.shared_key(scope, locale);

        match shared.get(&key) {
            Ok(found) => found,
            Err(e) => {
                warn!("Shared cache ({}) read of '{}' failed: {:#}", shared.name(), key, e);
                None
            }
        }
    }

    fn shared_put(&self, scope: &str, locale: &str, snapshot: &Snapshot) {
        let Some(shared) = self.shared.as_ref() else {
            return;
        };
        let key = self.shared_key(scope, locale);

        if let Err(e) = shared.put(&key, snapshot, self.ttl) {
            warn!("Shared cache ({}) write of '{}' failed: {:#}", shared.name(), key, e);
        }
    }

    fn shared_forget(&self, scope: &str, locale: &str) {
        let Some(shared) = self.shared.as_ref() else {
            return;
        };
        let key = self.shared_key(scope, locale);

        if let Err(e) = shared.forget(&key) {
            warn!("Shared cache ({}) invalidation of '{}' failed: {:#}", shared.name(), key, e);
        }
    }
}

impl std::fmt::Debug for CacheTiers {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CacheTiers")
            .field("snapshots", &self.snapshots.len())
            .field("points", &self.points.len())
            .field("shared", &self.shared.as_ref().map(|s| s.name()))
            .finish()
    }
}
