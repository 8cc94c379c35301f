/*!
 * Catalog caching.
 *
 * - `tiers`: per-operation tier 1 memo composed with an optional tier 2
 * - `shared`: tier 2 backends (process memory, SQLite table)
 */

use std::sync::Arc;

use log::debug;

use crate::app_config::{CacheConfig, CacheDriver};
use crate::database::DatabaseConnection;

pub mod shared;
pub mod tiers;

pub use shared::{DatabaseSharedCache, ProcessSharedCache, SharedCache};
pub use tiers::CacheTiers;

/// Build the tier 2 backend the configuration asks for, if any
pub fn build_shared_cache(config: &CacheConfig, db: &DatabaseConnection) -> Option<Arc<dyn SharedCache>> {
    if !config.uses_shared_tier() {
        debug!("Shared cache tier disabled");
        return None;
    }

    let shared: Arc<dyn SharedCache> = match config.driver {
        CacheDriver::InMemory => return None,
        CacheDriver::Process => Arc::new(ProcessSharedCache::new()),
        CacheDriver::Database => Arc::new(DatabaseSharedCache::new(db.clone())),
    };

    debug!(
        "Shared cache tier: {} (ttl {}s, prefix '{}')",
        shared.name(),
        config.ttl_secs,
        config.prefix
    );
    Some(shared)
}
