use anyhow::{anyhow, Context, Result};
use serde::{Deserialize, Serialize};
use std::default::Default;
use std::fs::File;
use std::io::BufReader;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::errors::ConfigError;
use crate::language_utils;

/// Application configuration module
/// This module handles the catalog configuration including loading,
/// validating and saving configuration settings.
/// Represents the catalog configuration
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Config {
    /// Scope used when a caller does not name one
    #[serde(default = "default_scope")]
    pub default_scope: String,

    /// Scopes processed by `--all` batch runs
    #[serde(default = "default_available_scopes")]
    pub available_scopes: Vec<String>,

    /// Where the active locale set comes from
    #[serde(default)]
    pub use_locales_from: LocalesSource,

    /// Locales used when `use_locales_from` is `config`
    #[serde(default = "default_config_locales")]
    pub config_locales: Vec<LocaleEntry>,

    /// SQLite record store location; `None` uses the user data directory
    #[serde(default)]
    pub database_path: Option<PathBuf>,

    /// File store settings
    #[serde(default)]
    pub translations: TranslationsConfig,

    /// Cache tier settings
    #[serde(default)]
    pub cache: CacheConfig,

    /// Key discovery defaults
    #[serde(default)]
    pub scan: ScanConfig,

    /// Log level
    #[serde(default)]
    pub log_level: LogLevel,
}

/// Source of the active locale set
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum LocalesSource {
    // @source: Static `config_locales` list
    #[default]
    Config,
    // @source: `app_languages` table, active rows only
    Database,
}

/// One configured locale
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub struct LocaleEntry {
    /// Locale code ("en", "uz")
    pub code: String,

    /// Display name; falls back to the ISO name when omitted
    #[serde(default)]
    pub name: Option<String>,
}

impl LocaleEntry {
    pub fn new(code: &str, name: Option<&str>) -> Self {
        Self {
            code: code.to_string(),
            name: name.map(str::to_string),
        }
    }
}

/// On-disk encoding of the per-scope catalog files
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum StoreDriverKind {
    // @driver: {base}/{locale}/{scope}.json
    #[default]
    Json,
    // @driver: {base}/{locale}/{scope}.php returning a keyed array
    CodeArray,
}

impl std::fmt::Display for StoreDriverKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Json => write!(f, "json"),
            Self::CodeArray => write!(f, "code_array"),
        }
    }
}

impl std::str::FromStr for StoreDriverKind {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "json" | "json-per-scope" => Ok(Self::Json),
            "code_array" | "php" | "php-array-per-scope" => Ok(Self::CodeArray),
            _ => Err(anyhow!("Invalid store driver: {}", s)),
        }
    }
}

/// Which representation answers a lookup first
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum ResolutionPolicy {
    /// Snapshot comes from the file store; record store is the fallback
    #[default]
    FileFirst,
    /// Snapshot is projected from the record store; files are export targets
    DatabaseFirst,
}

/// File store settings
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct TranslationsConfig {
    /// Write record-store edits through to files in database-first mode
    #[serde(default)]
    pub enabled: bool,

    /// File encoding
    #[serde(default)]
    pub driver: StoreDriverKind,

    /// Base directory; `None` uses the driver default under `lang/`
    #[serde(default)]
    pub path: Option<PathBuf>,

    /// Extension for code-array files
    #[serde(default = "default_code_array_ext")]
    pub code_array_file_ext: String,

    /// Lookup policy
    #[serde(default)]
    pub resolution: ResolutionPolicy,

    /// Truncate keys and translations before the first imported scope
    #[serde(default)]
    pub truncate_on_import: bool,

    /// Import every scope when the record store is empty at seed time
    #[serde(default = "default_true")]
    pub restore_on_seed: bool,
}

impl Default for TranslationsConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            driver: StoreDriverKind::default(),
            path: None,
            code_array_file_ext: default_code_array_ext(),
            resolution: ResolutionPolicy::default(),
            truncate_on_import: false,
            restore_on_seed: true,
        }
    }
}

impl TranslationsConfig {
    /// Resolve the base directory for the configured driver
    ///
    /// Relative paths are taken relative to `project_root`.
    pub fn base_dir(&self, project_root: &Path) -> PathBuf {
        match &self.path {
            Some(path) if path.is_absolute() => path.clone(),
            Some(path) => project_root.join(path),
            None => match self.driver {
                StoreDriverKind::Json => project_root.join("lang"),
                StoreDriverKind::CodeArray => project_root.join("lang").join("vendor").join("lexicat"),
            },
        }
    }

    /// Whether record-store edits must also land in the file store
    pub fn writes_files(&self) -> bool {
        self.enabled || self.resolution == ResolutionPolicy::FileFirst
    }
}

/// Shared cache backend
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum CacheDriver {
    /// Tier 1 only; nothing shared between operations
    #[default]
    InMemory,
    /// Tier 2 shared by every operation in this process
    Process,
    /// Tier 2 stored in the SQLite database, shared across processes
    Database,
}

/// Cache tier settings
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct CacheConfig {
    /// Master switch for the shared tier
    #[serde(default = "default_true")]
    pub enabled: bool,

    /// Shared tier backend
    #[serde(default)]
    pub driver: CacheDriver,

    /// Shared tier time-to-live in seconds
    #[serde(default = "default_cache_ttl_secs")]
    pub ttl_secs: u64,

    /// Namespace prefix for shared keys
    #[serde(default = "default_cache_prefix")]
    pub prefix: String,

    /// Store freshly exported snapshots instead of only invalidating
    #[serde(default = "default_true")]
    pub prewarm_on_export: bool,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            driver: CacheDriver::default(),
            ttl_secs: default_cache_ttl_secs(),
            prefix: default_cache_prefix(),
            prewarm_on_export: true,
        }
    }
}

impl CacheConfig {
    /// Whether a shared tier should be composed at all
    pub fn uses_shared_tier(&self) -> bool {
        self.enabled && self.driver != CacheDriver::InMemory
    }

    pub fn ttl(&self) -> Duration {
        Duration::from_secs(self.ttl_secs)
    }
}

/// How the scanner registers discovered keys
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum ScanMode {
    /// Resolve each new key per active locale, seeding files immediately
    #[default]
    AutoCreate,
    /// Insert all new keys into the record store, then export the scope once
    InsertThenExport,
}

/// Key discovery defaults
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct ScanConfig {
    /// Roots to walk, relative to the project root
    #[serde(default = "default_scan_paths")]
    pub paths: Vec<String>,

    /// File extensions, compound ones allowed ("blade.php")
    #[serde(default = "default_scan_extensions")]
    pub extensions: Vec<String>,

    /// Directory names or relative paths to skip
    #[serde(default = "default_scan_exclude")]
    pub exclude: Vec<String>,

    /// Registration mode
    #[serde(default)]
    pub mode: ScanMode,
}

impl Default for ScanConfig {
    fn default() -> Self {
        Self {
            paths: default_scan_paths(),
            extensions: default_scan_extensions(),
            exclude: default_scan_exclude(),
            mode: ScanMode::default(),
        }
    }
}

/// Log verbosity level
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Error,
    Warn,
    #[default]
    Info,
    Debug,
    Trace,
}

impl LogLevel {
    pub fn to_level_filter(&self) -> log::LevelFilter {
        match self {
            LogLevel::Error => log::LevelFilter::Error,
            LogLevel::Warn => log::LevelFilter::Warn,
            LogLevel::Info => log::LevelFilter::Info,
            LogLevel::Debug => log::LevelFilter::Debug,
            LogLevel::Trace => log::LevelFilter::Trace,
        }
    }
}

fn default_scope() -> String {
    "app".to_string()
}

fn default_available_scopes() -> Vec<String> {
    vec!["app".to_string(), "admin".to_string()]
}

fn default_config_locales() -> Vec<LocaleEntry> {
    vec![LocaleEntry::new("en", Some("English"))]
}

fn default_code_array_ext() -> String {
    "php".to_string()
}

fn default_cache_ttl_secs() -> u64 {
    300
}

fn default_cache_prefix() -> String {
    "lexicat".to_string()
}

fn default_scan_paths() -> Vec<String> {
    vec!["app".to_string(), "resources".to_string()]
}

fn default_scan_extensions() -> Vec<String> {
    ["php", "blade.php", "vue", "js", "ts"]
        .iter()
        .map(|s| s.to_string())
        .collect()
}

fn default_scan_exclude() -> Vec<String> {
    ["vendor", "node_modules", "storage"]
        .iter()
        .map(|s| s.to_string())
        .collect()
}

fn default_true() -> bool {
    true
}

impl Config {
    /// Load a configuration file, or `None` when it does not exist
    pub fn load(path: &Path) -> Result<Option<Self>> {
        if !path.exists() {
            return Ok(None);
        }

        let file = File::open(path)
            .with_context(|| format!("Failed to open config file: {:?}", path))?;
        let reader = BufReader::new(file);
        let config: Config = serde_json::from_reader(reader)
            .with_context(|| format!("Failed to parse config file: {:?}", path))?;

        Ok(Some(config))
    }

    /// Write the configuration as pretty JSON
    pub fn save(&self, path: &Path) -> Result<()> {
        let json = serde_json::to_string_pretty(self)
            .context("Failed to serialize config to JSON")?;
        std::fs::write(path, json)
            .with_context(|| format!("Failed to write config file: {:?}", path))?;
        Ok(())
    }

    /// Validate the configuration for consistency and required values
    pub fn validate(&self) -> std::result::Result<(), ConfigError> {
        if language_utils::normalize_scope(&self.default_scope).is_empty() {
            return Err(ConfigError::MissingDefaultScope);
        }

        if self.use_locales_from == LocalesSource::Config && self.config_locales.is_empty() {
            return Err(ConfigError::NoLocales);
        }

        if let Some(bad) = self
            .config_locales
            .iter()
            .find(|l| !language_utils::is_normalized_locale(&l.code))
        {
            return Err(ConfigError::InvalidLocale(bad.code.clone()));
        }

        if self.cache.uses_shared_tier() && self.cache.ttl_secs == 0 {
            return Err(ConfigError::InvalidTtl);
        }

        Ok(())
    }

    /// Scopes for an `--all` run, falling back to the default scope
    pub fn all_scopes(&self) -> Vec<String> {
        if self.available_scopes.is_empty() {
            vec![self.default_scope.clone()]
        } else {
            self.available_scopes.clone()
        }
    }
}

/// Default implementation for Config
impl Default for Config {
    fn default() -> Self {
        Config {
            default_scope: default_scope(),
            available_scopes: default_available_scopes(),
            use_locales_from: LocalesSource::default(),
            config_locales: default_config_locales(),
            database_path: None,
            translations: TranslationsConfig::default(),
            cache: CacheConfig::default(),
            scan: ScanConfig::default(),
            log_level: LogLevel::default(),
        }
    }
}
