/*!
 * Single-key resolution and edits.
 *
 * `resolve` is the hot path. Under the file-first policy it reads the
 * catalog file, falls back to the record store, and finally registers the
 * key itself. Under the database-first policy the snapshot is projected
 * from the record store and files are only written by export.
 *
 * A lookup miss is the only read with side effects: it may create a key
 * row and backfill a file. Use `resolve_read_only` where that is not
 * acceptable.
 */

use std::collections::HashMap;
use std::sync::Arc;

use anyhow::{Context, Result};
use log::{debug, warn};

use crate::app_config::ResolutionPolicy;
use crate::catalog::CatalogContext;
use crate::database::{RecordStore, TranslationKey};
use crate::language_utils;
use crate::store::Snapshot;

/// Keys overlaid with a locale's non-empty translations
pub(crate) fn project_scope(records: &dyn RecordStore, scope: &str, locale: &str) -> Result<Snapshot> {
    let mut projected = project_scope_locales(records, scope, &[locale.to_string()])?;
    Ok(projected.remove(locale).unwrap_or_default())
}

/// `project_scope` for several locales with one key query
pub(crate) fn project_scope_locales(
    records: &dyn RecordStore,
    scope: &str,
    locales: &[String],
) -> Result<HashMap<String, Snapshot>> {
    let keys = records
        .keys_in_scope(scope)
        .with_context(|| format!("Failed to load keys of scope '{}'", scope))?;

    let base: Snapshot = keys.iter().map(|k| (k.text.clone(), k.text.clone())).collect();
    let mut projected: HashMap<String, Snapshot> =
        locales.iter().map(|l| (l.clone(), base.clone())).collect();

    if keys.is_empty() {
        return Ok(projected);
    }

    let id_to_text: HashMap<i64, &str> = keys.iter().map(|k| (k.id, k.text.as_str())).collect();
    let ids: Vec<i64> = keys.iter().map(|k| k.id).collect();

    for translation in records.translations_for(&ids, locales)? {
        if translation.text.is_empty() {
            continue;
        }
        let (Some(text), Some(snapshot)) = (
            id_to_text.get(&translation.key_id),
            projected.get_mut(&translation.lang_code),
        ) else {
            continue;
        };
        snapshot.insert(text.to_string(), translation.text);
    }

    Ok(projected)
}

impl CatalogContext<'_> {
    /// Resolve a key for a scope and locale
    ///
    /// Never fails: the worst case is the key itself. An unseen key is
    /// registered in the record store and, under the file-first policy,
    /// written to the locale's file as its own value.
    pub fn resolve(&mut self, key: &str, scope: &str, locale: &str) -> String {
        let scope = self.catalog.scope_or_default(scope);
        let locale = language_utils::normalize_locale(locale);

        if key.is_empty() || locale.is_empty() {
            return key.to_string();
        }

        if let Some(value) = self.cache.point(&scope, &locale, key) {
            return value.to_string();
        }

        let Some(snapshot) = self.try_snapshot(&scope, &locale) else {
            // The file state is unknown, so nothing is backfilled or memoized
            return self.resolve_from_records(key, &scope, &locale);
        };
        if let Some(value) = snapshot.get(key) {
            let value = value.clone();
            self.cache.set_point(&scope, &locale, key, &value);
            return value;
        }

        let value = match self.catalog.policy() {
            ResolutionPolicy::FileFirst => self.resolve_miss_file_first(key, &scope, &locale),
            ResolutionPolicy::DatabaseFirst => self.resolve_miss_database_first(key, &scope, &locale),
        };

        self.cache.set_point(&scope, &locale, key, &value);
        value
    }

    /// Resolve without creating keys or writing files
    ///
    /// Consults the snapshot and the record store only.
    pub fn resolve_read_only(&mut self, key: &str, scope: &str, locale: &str) -> String {
        let scope = self.catalog.scope_or_default(scope);
        let locale = language_utils::normalize_locale(locale);

        if key.is_empty() || locale.is_empty() {
            return key.to_string();
        }

        if let Some(value) = self.cache.point(&scope, &locale, key) {
            return value.to_string();
        }

        if let Some(value) = self.snapshot(&scope, &locale).get(key) {
            return value.clone();
        }

        self.resolve_from_records(key, &scope, &locale)
    }

    /// Record translation, or the key itself; no side effects
    fn resolve_from_records(&self, key: &str, scope: &str, locale: &str) -> String {
        match self.catalog.records().find_translation(scope, key, locale) {
            Ok(Some(value)) if !value.is_empty() => value,
            Ok(_) => key.to_string(),
            Err(e) => {
                warn!("Record lookup of '{}' in {}/{} failed: {:#}", key, scope, locale, e);
                key.to_string()
            }
        }
    }

    /// Full Catalog Snapshot for a pair, through the cache tiers
    pub fn translated_list(&mut self, scope: &str, locale: &str) -> Arc<Snapshot> {
        let scope = self.catalog.scope_or_default(scope);
        let locale = language_utils::normalize_locale(locale);
        self.snapshot(&scope, &locale)
    }

    /// Register a key, writing the scope's files when files are the write target
    pub fn save(&mut self, key: &str, scope: &str) -> Result<TranslationKey> {
        let scope = self.catalog.scope_or_default(scope);
        let saved = self
            .catalog
            .records()
            .ensure_key(&scope, key)
            .with_context(|| format!("Failed to save key '{}' in scope '{}'", key, scope))?;

        if self.catalog.writes_files() && !self.export(&scope, None) {
            warn!("Key '{}' saved but scope '{}' was not fully exported", key, scope);
        }

        self.invalidate_scope(&scope);
        Ok(saved)
    }

    /// Store a translation and update the locale's file entry
    ///
    /// Only the (scope, locale) pair is invalidated. Returns whether the
    /// file write-through succeeded.
    pub fn translate(&mut self, key: &str, scope: &str, locale: &str, value: &str) -> Result<bool> {
        let scope = self.catalog.scope_or_default(scope);
        let locale = language_utils::normalize_locale(locale);
        let records = self.catalog.records();

        let saved = records
            .ensure_key(&scope, key)
            .with_context(|| format!("Failed to save key '{}' in scope '{}'", key, scope))?;
        records
            .upsert_translation(saved.id, &locale, value)
            .with_context(|| format!("Failed to translate '{}' into '{}'", key, locale))?;

        let file_ok = if self.catalog.writes_files() {
            let file_value = if value.is_empty() { key } else { value };
            self.catalog.store().upsert(&scope, &locale, key, file_value)
        } else {
            true
        };

        self.cache.invalidate_locale(&scope, &locale);
        debug!("Translated '{}' in {}/{}", key, scope, locale);
        Ok(file_ok)
    }

    /// Delete a key and its translations
    ///
    /// Returns false when the key did not exist.
    pub fn delete(&mut self, scope: &str, key: &str) -> Result<bool> {
        let scope = self.catalog.scope_or_default(scope);
        let records = self.catalog.records();

        let Some(existing) = records.find_key(&scope, key)? else {
            return Ok(false);
        };

        let deleted = records
            .delete_key(existing.id)
            .with_context(|| format!("Failed to delete key '{}' from scope '{}'", key, scope))?;

        if deleted && self.catalog.writes_files() && !self.export(&scope, None) {
            warn!("Key '{}' deleted but scope '{}' was not fully re-exported", key, scope);
        }

        self.invalidate_scope(&scope);
        Ok(deleted)
    }

    /// Scope-wide invalidation over the active locale set
    pub fn invalidate_scope(&mut self, scope: &str) {
        let locales = self.catalog.registry().active_codes();
        self.cache.invalidate_scope(scope, &locales);
    }

    fn snapshot(&mut self, scope: &str, locale: &str) -> Arc<Snapshot> {
        self.try_snapshot(scope, locale).unwrap_or_default()
    }

    /// Snapshot through the cache tiers; `None` when the source could not be read
    ///
    /// Failed loads are logged and never cached.
    fn try_snapshot(&mut self, scope: &str, locale: &str) -> Option<Arc<Snapshot>> {
        let catalog = self.catalog;
        let loaded = match catalog.policy() {
            ResolutionPolicy::FileFirst => self.cache.try_remember(scope, locale, || {
                catalog
                    .store()
                    .try_read(scope, locale)
                    .map(Option::unwrap_or_default)
                    .map_err(anyhow::Error::from)
            }),
            ResolutionPolicy::DatabaseFirst => self
                .cache
                .try_remember(scope, locale, || project_scope(catalog.records(), scope, locale)),
        };

        match loaded {
            Ok(snapshot) => Some(snapshot),
            Err(e) => {
                warn!("Loading {}/{} failed, serving without cache: {:#}", scope, locale, e);
                None
            }
        }
    }

    fn resolve_miss_file_first(&mut self, key: &str, scope: &str, locale: &str) -> String {
        let records = self.catalog.records();
        let store = self.catalog.store();

        match records.find_translation(scope, key, locale) {
            Ok(Some(value)) if !value.is_empty() => {
                store.upsert(scope, locale, key, &value);
                self.cache.invalidate_locale(scope, locale);
                return value;
            }
            Ok(_) => {}
            Err(e) => warn!("Translation lookup of '{}' in {}/{} failed: {:#}", key, scope, locale, e),
        }

        if let Err(e) = records.ensure_key(scope, key) {
            warn!("Auto-registering '{}' in scope '{}' failed: {:#}", key, scope, e);
        }

        store.upsert(scope, locale, key, key);
        self.cache.invalidate_locale(scope, locale);
        debug!("Auto-registered '{}' in {}/{}", key, scope, locale);
        key.to_string()
    }

    fn resolve_miss_database_first(&mut self, key: &str, scope: &str, locale: &str) -> String {
        if let Err(e) = self.catalog.records().ensure_key(scope, key) {
            warn!("Auto-registering '{}' in scope '{}' failed: {:#}", key, scope, e);
            return key.to_string();
        }

        self.invalidate_scope(scope);
        if self.catalog.config().translations.enabled {
            self.export(scope, None);
        }

        self.snapshot(scope, locale)
            .get(key)
            .cloned()
            .unwrap_or_else(|| key.to_string())
    }
}
