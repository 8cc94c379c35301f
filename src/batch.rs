/*!
 * Batch operations over many scopes.
 *
 * Each function runs as one logical operation with its own context. When
 * explicit locales are given, they replace the active locale set for the
 * duration of the run.
 */

use std::collections::BTreeMap;

use anyhow::Result;
use log::{info, warn};

use crate::catalog::Catalog;
use crate::language_utils;
use crate::reconcile::{ImportPhase, ScopeReport};
use crate::scanner::{ScanOptions, ScanReport};

/// Per-scope outcomes of an export or import run
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BatchReport {
    pub scopes: BTreeMap<String, ScopeReport>,
}

impl BatchReport {
    /// Logical AND over every scope
    pub fn success(&self) -> bool {
        self.scopes.values().all(ScopeReport::success)
    }

    /// Success flag per scope
    pub fn outcomes(&self) -> BTreeMap<String, bool> {
        self.scopes
            .iter()
            .map(|(scope, report)| (scope.clone(), report.success()))
            .collect()
    }

    pub fn failed_scopes(&self) -> Vec<&str> {
        self.scopes
            .iter()
            .filter(|(_, report)| !report.success())
            .map(|(scope, _)| scope.as_str())
            .collect()
    }
}

/// Result of a scan followed by an export
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SyncReport {
    pub scan: ScanReport,
    /// `None` when the export phase was skipped (dry run)
    pub export: Option<BatchReport>,
}

impl SyncReport {
    pub fn success(&self) -> bool {
        self.export.as_ref().map_or(true, BatchReport::success)
    }
}

/// Scopes to process: the given ones, or every configured scope
pub fn resolve_scopes(catalog: &Catalog, scopes: &[String], all: bool) -> Vec<String> {
    let requested: Vec<String> = if all || scopes.is_empty() {
        catalog.config().all_scopes()
    } else {
        scopes.to_vec()
    };

    let mut out: Vec<String> = Vec::with_capacity(requested.len());
    for scope in requested {
        let scope = language_utils::normalize_scope(&scope);
        if !scope.is_empty() && !out.contains(&scope) {
            out.push(scope);
        }
    }
    out
}

/// Discover keys and register the new ones
pub fn scan(catalog: &Catalog, options: &ScanOptions) -> Result<ScanReport> {
    catalog.context().scan(options)
}

/// Export every scope; a failed scope does not stop the others
pub fn export(catalog: &Catalog, scopes: &[String], locales: Option<&[String]>) -> BatchReport {
    let locales = locales.filter(|l| !l.is_empty());
    let _override = locales.map(|l| catalog.registry().override_locales(l));

    let mut ctx = catalog.context();
    let mut report = BatchReport::default();

    for scope in scopes {
        let scope_report = ctx.export_report(scope, locales);
        report.scopes.insert(scope_report.scope.clone(), scope_report);
    }

    report
}

/// Import every scope, truncating at most once before the first one
pub fn import(
    catalog: &Catalog,
    scopes: &[String],
    locales: Option<&[String]>,
    truncate: bool,
) -> BatchReport {
    let locales = locales.filter(|l| !l.is_empty());
    let _override = locales.map(|l| catalog.registry().override_locales(l));

    let truncate = truncate || catalog.config().translations.truncate_on_import;
    let mut phase = ImportPhase::first(truncate);
    let mut ctx = catalog.context();
    let mut report = BatchReport::default();

    for scope in scopes {
        let scope_report = ctx.import_report(scope, locales, phase);
        report.scopes.insert(scope_report.scope.clone(), scope_report);
        phase = phase.next();
    }

    report
}

/// Scan, then export `scopes`
///
/// Only a failed scan aborts the export; finding no keys does not. A dry
/// run skips the export.
pub fn sync(
    catalog: &Catalog,
    options: &ScanOptions,
    scopes: &[String],
    locales: Option<&[String]>,
) -> Result<SyncReport> {
    let scan_report = scan(catalog, options)?;

    if options.dry {
        info!("Dry run: export skipped");
        return Ok(SyncReport {
            scan: scan_report,
            export: None,
        });
    }

    let export_report = export(catalog, scopes, locales);
    if !export_report.success() {
        warn!("Export failed for scopes: {:?}", export_report.failed_scopes());
    }

    Ok(SyncReport {
        scan: scan_report,
        export: Some(export_report),
    })
}

/// Rebuild the record store from files when it holds no keys
pub fn restore(catalog: &Catalog) -> Option<BatchReport> {
    let scopes = catalog.config().all_scopes();
    let reports = catalog.context().restore_if_empty(&scopes)?;

    Some(BatchReport {
        scopes: reports.into_iter().map(|r| (r.scope.clone(), r)).collect(),
    })
}
