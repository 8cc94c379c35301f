/*!
 * Reconciliation between the record store and the file store.
 *
 * Export derives every locale file of a scope from the record store.
 * Import reads every locale file of a scope back into the record store.
 * Both track an outcome per locale and keep going after a failed locale,
 * so a report shows every failure rather than the first one.
 */

use std::collections::{BTreeMap, BTreeSet};

use log::{debug, info, warn};

use crate::catalog::CatalogContext;
use crate::database::Translation;
use crate::language_utils;
use crate::resolution::project_scope_locales;
use crate::store::Snapshot;

/// Position of one scope within a multi-scope import
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ImportPhase {
    /// Truncate keys and translations before importing
    pub truncate: bool,
    /// Only the first scope of a batch may truncate
    pub is_first_unit: bool,
}

impl ImportPhase {
    pub fn first(truncate: bool) -> Self {
        Self {
            truncate,
            is_first_unit: true,
        }
    }

    /// Phase for the scope after this one
    pub fn next(self) -> Self {
        Self {
            is_first_unit: false,
            ..self
        }
    }

    fn should_truncate(&self) -> bool {
        self.truncate && self.is_first_unit
    }
}

/// Outcome of exporting or importing one scope
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ScopeReport {
    pub scope: String,
    /// Keys written (export) or keys seen across files (import)
    pub keys: usize,
    /// Success per locale
    pub locales: BTreeMap<String, bool>,
    /// Locales skipped because no file exists (import only)
    pub missing: Vec<String>,
    /// Failure that affected the whole scope
    pub error: Option<String>,
}

impl ScopeReport {
    fn new(scope: &str) -> Self {
        Self {
            scope: scope.to_string(),
            ..Self::default()
        }
    }

    /// Logical AND over every locale, false on a scope-level error
    pub fn success(&self) -> bool {
        self.error.is_none() && self.locales.values().all(|ok| *ok)
    }

    /// Locales whose unit failed
    pub fn failed_locales(&self) -> Vec<&str> {
        self.locales
            .iter()
            .filter(|(_, ok)| !**ok)
            .map(|(locale, _)| locale.as_str())
            .collect()
    }
}

impl CatalogContext<'_> {
    /// Export a scope and report whether every locale was written
    pub fn export(&mut self, scope: &str, locales: Option<&[String]>) -> bool {
        self.export_report(scope, locales).success()
    }

    /// Export a scope from the record store into the file store
    ///
    /// Every key of the scope lands in every target locale, valued by its
    /// non-empty translation or by itself. Keys are never deleted here.
    pub fn export_report(&mut self, scope: &str, locales: Option<&[String]>) -> ScopeReport {
        let scope = self.catalog.scope_or_default(scope);
        let locales = self.target_locales(locales);
        let mut report = ScopeReport::new(&scope);

        if locales.is_empty() {
            debug!("No locales to export for scope '{}'", scope);
            return report;
        }

        let projected = match project_scope_locales(self.catalog.records(), &scope, &locales) {
            Ok(projected) => projected,
            Err(e) => {
                warn!("Export of scope '{}' failed: {:#}", scope, e);
                report.error = Some(format!("{:#}", e));
                return report;
            }
        };

        let prewarm = self.catalog.config().cache.prewarm_on_export;
        let store = self.catalog.store();

        for locale in &locales {
            let snapshot = projected.get(locale).cloned().unwrap_or_default();
            report.keys = report.keys.max(snapshot.len());

            let ok = store.write(&scope, locale, &snapshot);
            if ok && prewarm {
                self.cache.prewarm(&scope, locale, snapshot);
            } else {
                self.cache.invalidate_locale(&scope, locale);
            }

            report.locales.insert(locale.clone(), ok);
        }

        info!(
            "Exported scope '{}' ({} keys) to {} locales{}",
            scope,
            report.keys,
            report.locales.len(),
            if report.success() { "" } else { " with failures" }
        );
        report
    }

    /// Import a scope and report whether every locale was read and stored
    pub fn import(&mut self, scope: &str, locales: Option<&[String]>, phase: ImportPhase) -> bool {
        self.import_report(scope, locales, phase).success()
    }

    /// Import a scope from the file store into the record store
    ///
    /// Keys are the union over every locale file; each locale then gets a
    /// translation row per key present in its own file. A missing file is
    /// a no-op for that locale.
    pub fn import_report(
        &mut self,
        scope: &str,
        locales: Option<&[String]>,
        phase: ImportPhase,
    ) -> ScopeReport {
        let scope = self.catalog.scope_or_default(scope);
        let locales = self.target_locales(locales);
        let records = self.catalog.records();
        let store = self.catalog.store();
        let mut report = ScopeReport::new(&scope);

        if phase.should_truncate() {
            info!("Truncating keys and translations before import");
            if let Err(e) = records.truncate() {
                warn!("Truncate before importing '{}' failed: {:#}", scope, e);
                report.error = Some(format!("truncate failed: {:#}", e));
            }
        }

        let mut files: Vec<(String, Snapshot)> = Vec::with_capacity(locales.len());
        for locale in &locales {
            match store.try_read(&scope, locale) {
                Ok(Some(snapshot)) => files.push((locale.clone(), snapshot)),
                Ok(None) => {
                    debug!("No {} file for {}/{}", store.name(), scope, locale);
                    report.missing.push(locale.clone());
                }
                Err(e) => {
                    warn!("Import of {}/{} skipped: {}", scope, locale, e);
                    report.locales.insert(locale.clone(), false);
                }
            }
        }

        let candidates: BTreeSet<&String> = files.iter().flat_map(|(_, s)| s.keys()).collect();
        report.keys = candidates.len();

        if !candidates.is_empty() {
            let texts: Vec<String> = candidates.into_iter().cloned().collect();

            match records.ensure_keys(&scope, &texts) {
                Ok(ids) => {
                    for (locale, snapshot) in &files {
                        let rows: Vec<Translation> = snapshot
                            .iter()
                            .filter_map(|(key, value)| {
                                let value = if value.is_empty() { key } else { value };
                                ids.get(key).map(|id| Translation::new(*id, locale, value))
                            })
                            .collect();

                        let ok = match records.upsert_translations(&rows) {
                            Ok(_) => true,
                            Err(e) => {
                                warn!("Storing translations for {}/{} failed: {:#}", scope, locale, e);
                                false
                            }
                        };
                        report.locales.insert(locale.clone(), ok);
                    }
                }
                Err(e) => {
                    warn!("Registering keys of scope '{}' failed: {:#}", scope, e);
                    for (locale, _) in &files {
                        report.locales.insert(locale.clone(), false);
                    }
                }
            }
        } else {
            for (locale, _) in &files {
                report.locales.insert(locale.clone(), true);
            }
        }

        let mut invalidate: Vec<String> = self.catalog.registry().active_codes();
        for locale in locales {
            if !invalidate.contains(&locale) {
                invalidate.push(locale);
            }
        }
        self.cache.invalidate_scope(&scope, &invalidate);

        info!(
            "Imported scope '{}' ({} keys, {} locales, {} missing){}",
            scope,
            report.keys,
            report.locales.len(),
            report.missing.len(),
            if report.success() { "" } else { " with failures" }
        );
        report
    }

    /// Import `scopes` when the record store holds no keys yet
    ///
    /// Returns `None` when nothing was attempted: restoring is disabled,
    /// keys already exist, or the record store cannot be counted.
    pub fn restore_if_empty(&mut self, scopes: &[String]) -> Option<Vec<ScopeReport>> {
        let config = self.catalog.config();
        if !config.translations.restore_on_seed {
            return None;
        }

        match self.catalog.records().count_keys() {
            Ok(0) => {}
            Ok(count) => {
                debug!("Record store holds {} keys, not restoring", count);
                return None;
            }
            Err(e) => {
                warn!("Cannot count keys before restore: {:#}", e);
                return None;
            }
        }

        let mut phase = ImportPhase::first(config.translations.truncate_on_import);
        let mut reports = Vec::with_capacity(scopes.len());
        for scope in scopes {
            reports.push(self.import_report(scope, None, phase));
            phase = phase.next();
        }

        Some(reports)
    }

    /// Explicit locales (sanitized, deduplicated) or the active set
    fn target_locales(&self, locales: Option<&[String]>) -> Vec<String> {
        match locales {
            Some(explicit) if !explicit.is_empty() => {
                let mut out: Vec<String> = Vec::with_capacity(explicit.len());
                for code in explicit {
                    let code = language_utils::normalize_locale(code);
                    if !code.is_empty() && !out.contains(&code) {
                        out.push(code);
                    }
                }
                out
            }
            _ => self.catalog.registry().active_codes(),
        }
    }
}
