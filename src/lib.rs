/*!
 * # lexicat - multi-locale text catalog
 *
 * A Rust library for keeping user-facing strings, keyed by their source
 * text and grouped into scopes, in sync across locales.
 *
 * ## Features
 *
 * - Per-scope catalog files per locale, as JSON or as code arrays
 * - SQLite record store holding keys, translations and languages
 * - File-first resolution with record-store fallback and auto-creation
 * - Two cache tiers: per operation, and shared with a time-to-live
 * - Export and import between the record store and the files
 * - Key discovery in source trees
 *
 * ## Architecture
 *
 * The library is organized in these main modules:
 * - `app_config`: Configuration management
 * - `registry`: Active locale set, from config or the record store
 * - `database`: Record store (SQLite)
 * - `store`: File store drivers
 * - `cache`: Tier 1 and tier 2 caches
 * - `catalog`: Composition root and per-operation context
 * - `resolution`: Key lookup and edits
 * - `reconcile`: Export and import
 * - `scanner`: Key discovery
 * - `batch`: Multi-scope runs (scan, export, import, sync)
 * - `language_utils`: Locale and scope sanitizing, ISO names
 * - `errors`: Custom error types
 */

#![allow(clippy::uninlined_format_args)]
#![allow(clippy::redundant_closure_for_method_calls)]

pub mod app_config;
pub mod batch;
pub mod cache;
pub mod catalog;
pub mod database;
pub mod errors;
pub mod language_utils;
pub mod reconcile;
pub mod registry;
pub mod resolution;
pub mod scanner;
pub mod store;

// Re-export main types for easier usage
pub use app_config::Config;
pub use batch::{BatchReport, SyncReport};
pub use catalog::{Catalog, CatalogContext, OpenOptions};
pub use database::{RecordStore, Repository};
pub use errors::{ConfigError, StoreError};
pub use reconcile::{ImportPhase, ScopeReport};
pub use registry::{LanguageRegistry, LocaleOverride};
pub use scanner::{KeyScanner, ScanOptions, ScanReport};
pub use store::{Snapshot, StoreDriver};
