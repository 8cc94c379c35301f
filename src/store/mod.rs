/*!
 * File store drivers.
 *
 * A driver persists one Catalog Snapshot per (scope, locale) pair. Drivers
 * differ only in encoding and directory convention; the read/write/upsert
 * contract is the same for all of them:
 * - `read` never fails, degrading to an empty snapshot
 * - `write` and `upsert` fail closed for locales outside the allowed set
 * - writes replace the file atomically, so readers never see partial content
 */

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use log::{debug, warn};

use crate::app_config::{StoreDriverKind, TranslationsConfig};
use crate::errors::StoreError;
use crate::registry::LanguageRegistry;

pub mod format;
pub mod per_scope;

pub use format::StoreFormat;
pub use per_scope::PerScopeFileStore;

/// Materialized key -> value mapping for one (scope, locale) pair
///
/// Ordered so that every encoding writes keys in a stable order.
pub type Snapshot = BTreeMap<String, String>;

/// Result of a single-entry upsert
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpsertOutcome {
    /// The stored value already matched; storage was not touched
    Unchanged,
    /// The file was rewritten
    Written,
}

/// Persistence of catalog snapshots to files
pub trait StoreDriver: Send + Sync {
    /// Driver name for logs and reports
    fn name(&self) -> &'static str;

    /// File location for a pair, after sanitizing both inputs
    fn path(&self, scope: &str, locale: &str) -> Result<PathBuf, StoreError>;

    /// Read the snapshot; `Ok(None)` when no file exists yet
    fn try_read(&self, scope: &str, locale: &str) -> Result<Option<Snapshot>, StoreError>;

    /// Replace the snapshot atomically
    fn try_write(&self, scope: &str, locale: &str, snapshot: &Snapshot) -> Result<(), StoreError>;

    /// Set one entry with a read-modify-write
    fn try_upsert(
        &self,
        scope: &str,
        locale: &str,
        key: &str,
        value: &str,
    ) -> Result<UpsertOutcome, StoreError>;

    /// Read the snapshot, degrading every failure to an empty mapping
    fn read(&self, scope: &str, locale: &str) -> Snapshot {
        match self.try_read(scope, locale) {
            Ok(snapshot) => snapshot.unwrap_or_default(),
            Err(StoreError::LocaleNotAllowed(locale)) => {
                debug!("Skipping read for locale '{}' outside the allowed set", locale);
                Snapshot::new()
            }
            Err(e) => {
                warn!("Reading {}/{} from {} store failed: {}", scope, locale, self.name(), e);
                Snapshot::new()
            }
        }
    }

    /// Write the snapshot, reporting success as a boolean
    fn write(&self, scope: &str, locale: &str, snapshot: &Snapshot) -> bool {
        match self.try_write(scope, locale, snapshot) {
            Ok(()) => true,
            Err(e) => {
                warn!("Writing {}/{} to {} store failed: {}", scope, locale, self.name(), e);
                false
            }
        }
    }

    /// Upsert one entry, reporting success as a boolean
    fn upsert(&self, scope: &str, locale: &str, key: &str, value: &str) -> bool {
        match self.try_upsert(scope, locale, key, value) {
            Ok(_) => true,
            Err(e) => {
                warn!("Upserting '{}' into {}/{} failed: {}", key, scope, locale, e);
                false
            }
        }
    }
}

/// Build the driver selected by configuration
///
/// `kind` and `base_dir` override the configured driver and directory.
pub fn build_driver(
    config: &TranslationsConfig,
    project_root: &Path,
    registry: LanguageRegistry,
    kind: Option<StoreDriverKind>,
    base_dir: Option<PathBuf>,
) -> Arc<dyn StoreDriver> {
    let mut effective = config.clone();
    if let Some(kind) = kind {
        effective.driver = kind;
    }
    if base_dir.is_some() {
        effective.path = base_dir;
    }

    let format = match effective.driver {
        StoreDriverKind::Json => StoreFormat::Json,
        StoreDriverKind::CodeArray => StoreFormat::CodeArray {
            extension: effective.code_array_file_ext.trim_start_matches('.').to_string(),
        },
    };

    let base = effective.base_dir(project_root);
    debug!("Using {} file store at {:?}", format.name(), base);

    Arc::new(PerScopeFileStore::new(base, format, registry))
}
