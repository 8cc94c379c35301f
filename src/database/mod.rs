/*!
 * Record store for canonical catalog data.
 *
 * This module defines the `RecordStore` boundary used by the rest of the
 * catalog and provides a SQLite-backed implementation of it for:
 * - Translation keys, unique per (scope, text)
 * - Per-locale translations, unique per (key, locale)
 * - The database-backed language registry
 * - The cross-process shared cache table
 */

use std::collections::HashMap;

use anyhow::Result;

pub mod schema;
pub mod connection;
pub mod repository;
pub mod models;

// Re-export main types
pub use connection::DatabaseConnection;
pub use models::{Language, Translation, TranslationKey};
pub use repository::Repository;

/// Canonical persistence for keys, translations and languages
///
/// Implementations must enforce the `(scope, text)` and `(key_id, lang_code)`
/// uniqueness constraints themselves; callers rely on `ensure_key` and
/// `upsert_translation` being safe under concurrent identical calls.
pub trait RecordStore: Send + Sync {
    /// Insert the key if absent and return the stored row
    fn ensure_key(&self, scope: &str, text: &str) -> Result<TranslationKey>;

    /// Bulk `ensure_key`; returns text -> id for every requested text
    fn ensure_keys(&self, scope: &str, texts: &[String]) -> Result<HashMap<String, i64>>;

    /// Look up a key by exact (scope, text)
    fn find_key(&self, scope: &str, text: &str) -> Result<Option<TranslationKey>>;

    /// All keys of a scope, ordered by id
    fn keys_in_scope(&self, scope: &str) -> Result<Vec<TranslationKey>>;

    /// Delete a key and its translations; false when it did not exist
    fn delete_key(&self, key_id: i64) -> Result<bool>;

    /// Insert or replace the translation for (key, locale)
    fn upsert_translation(&self, key_id: i64, lang_code: &str, text: &str) -> Result<()>;

    /// Bulk `upsert_translation` in one unit of work; returns rows written
    fn upsert_translations(&self, rows: &[Translation]) -> Result<usize>;

    /// Translation text for (scope, key text, locale), if a row exists
    fn find_translation(&self, scope: &str, text: &str, lang_code: &str) -> Result<Option<String>>;

    /// Translations whose key id is in `key_ids` and locale is in `lang_codes`
    fn translations_for(&self, key_ids: &[i64], lang_codes: &[String]) -> Result<Vec<Translation>>;

    /// Number of keys across all scopes
    fn count_keys(&self) -> Result<i64>;

    /// Remove every key and translation
    fn truncate(&self) -> Result<()>;

    /// Active registry languages, in insertion order
    fn active_languages(&self) -> Result<Vec<Language>>;

    /// Every registry language, active or not
    fn all_languages(&self) -> Result<Vec<Language>>;

    /// Insert or update a registry language by code
    fn upsert_language(&self, language: &Language) -> Result<()>;

    /// Flip the active flag; false when the code is unknown
    fn set_language_active(&self, code: &str, active: bool) -> Result<bool>;
}
