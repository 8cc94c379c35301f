/*!
 * Catalog composition root.
 *
 * `Catalog` wires the record store, the file store driver, the language
 * registry and the shared cache tier together once, from configuration.
 * Every logical operation (a request, a batch run) then works through a
 * `CatalogContext`, which owns that operation's tier 1 cache.
 */

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result};
use log::info;

use crate::app_config::{Config, ResolutionPolicy, StoreDriverKind};
use crate::cache::{self, CacheTiers, SharedCache};
use crate::database::{DatabaseConnection, RecordStore, Repository};
use crate::language_utils;
use crate::registry::LanguageRegistry;
use crate::store::{self, StoreDriver};

/// Overrides applied on top of configuration when opening a catalog
#[derive(Debug, Clone, Default)]
pub struct OpenOptions {
    /// Use this file store driver instead of the configured one
    pub driver: Option<StoreDriverKind>,
    /// Use this base directory instead of the configured one
    pub store_path: Option<PathBuf>,
    /// Use this database file instead of the configured one
    pub database_path: Option<PathBuf>,
}

/// Long-lived catalog components
pub struct Catalog {
    config: Config,
    records: Arc<dyn RecordStore>,
    store: Arc<dyn StoreDriver>,
    registry: LanguageRegistry,
    shared: Option<Arc<dyn SharedCache>>,
}

impl Catalog {
    /// Assemble a catalog from already built components
    pub fn new(
        config: Config,
        records: Arc<dyn RecordStore>,
        store: Arc<dyn StoreDriver>,
        registry: LanguageRegistry,
    ) -> Self {
        Self {
            config,
            records,
            store,
            registry,
            shared: None,
        }
    }

    /// Attach a tier 2 cache
    pub fn with_shared_cache(mut self, shared: Option<Arc<dyn SharedCache>>) -> Self {
        self.shared = shared;
        self
    }

    /// Open the SQLite record store and build every component from `config`
    pub fn open(config: Config, project_root: &Path, options: OpenOptions) -> Result<Self> {
        let db = Self::connect(&config, project_root, &options)?;
        Ok(Self::with_connection(config, project_root, db, options))
    }

    /// Open the database the configuration and overrides point at
    ///
    /// Relative paths are taken relative to `project_root`; with no path
    /// configured the user data directory is used.
    pub fn connect(config: &Config, project_root: &Path, options: &OpenOptions) -> Result<DatabaseConnection> {
        let db_path = options
            .database_path
            .clone()
            .or_else(|| config.database_path.clone())
            .map(|p| if p.is_absolute() { p } else { project_root.join(p) });

        match db_path {
            Some(path) => DatabaseConnection::new(&path),
            None => DatabaseConnection::new_default(),
        }
        .context("Failed to open record store")
    }

    /// Build every component on top of an open database connection
    pub fn with_connection(
        config: Config,
        project_root: &Path,
        db: DatabaseConnection,
        options: OpenOptions,
    ) -> Self {
        let shared = cache::build_shared_cache(&config.cache, &db);
        let records: Arc<dyn RecordStore> = Arc::new(Repository::new(db));
        let registry = LanguageRegistry::from_config(&config, Arc::clone(&records));
        let store = store::build_driver(
            &config.translations,
            project_root,
            registry.clone(),
            options.driver,
            options.store_path,
        );

        info!(
            "Catalog ready: {} store, {:?} resolution, shared cache {}",
            store.name(),
            config.translations.resolution,
            shared.as_ref().map(|s| s.name()).unwrap_or("off")
        );

        Self::new(config, records, store, registry).with_shared_cache(shared)
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn records(&self) -> &dyn RecordStore {
        self.records.as_ref()
    }

    pub fn store(&self) -> &dyn StoreDriver {
        self.store.as_ref()
    }

    pub fn registry(&self) -> &LanguageRegistry {
        &self.registry
    }

    pub fn policy(&self) -> ResolutionPolicy {
        self.config.translations.resolution
    }

    /// Whether record-store edits must be written through to files
    pub fn writes_files(&self) -> bool {
        self.config.translations.writes_files()
    }

    /// Start a logical operation with a fresh tier 1 cache
    pub fn context(&self) -> CatalogContext<'_> {
        let cache = CacheTiers::new(
            self.shared.clone(),
            &self.config.cache.prefix,
            self.config.cache.ttl(),
        );
        CatalogContext { catalog: self, cache }
    }

    /// Sanitized scope, or the default scope when blank
    pub fn scope_or_default(&self, scope: &str) -> String {
        let scope = language_utils::normalize_scope(scope);
        if scope.is_empty() {
            language_utils::normalize_scope(&self.config.default_scope)
        } else {
            scope
        }
    }
}

impl std::fmt::Debug for Catalog {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Catalog")
            .field("store", &self.store.name())
            .field("policy", &self.policy())
            .field("registry", &self.registry)
            .finish()
    }
}

/// One logical operation against the catalog
///
/// Resolution and reconciliation methods are implemented in their own
/// modules on this type. Dropping the context discards its tier 1 cache.
#[derive(Debug)]
pub struct CatalogContext<'a> {
    pub(crate) catalog: &'a Catalog,
    pub(crate) cache: CacheTiers,
}

impl<'a> CatalogContext<'a> {
    pub fn catalog(&self) -> &'a Catalog {
        self.catalog
    }

    pub fn cache(&self) -> &CacheTiers {
        &self.cache
    }
}
