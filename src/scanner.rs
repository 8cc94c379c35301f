/*!
 * Key discovery.
 *
 * Walks source roots, pulls the first string-literal argument out of the
 * recognised translation calls, and registers keys that the target scope
 * does not know yet.
 */

use std::collections::BTreeSet;
use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use indicatif::{ProgressBar, ProgressStyle};
use log::{debug, info, warn};
use once_cell::sync::Lazy;
use regex::Regex;
use walkdir::{DirEntry, WalkDir};

use crate::app_config::{ScanConfig, ScanMode};
use crate::catalog::CatalogContext;

/// Recognised call shapes, each capturing its first quoted argument
static KEY_PATTERNS: Lazy<Vec<Regex>> = Lazy::new(|| {
    [
        r#"__\(\s*['"]([^'"]+)['"]\s*(?:,|\))"#,
        r#"@lang\(\s*['"]([^'"]+)['"]\s*(?:,|\))"#,
        r#"\btrans\(\s*['"]([^'"]+)['"]\s*(?:,|\))"#,
        r#"\btrans_choice\(\s*['"]([^'"]+)['"]\s*,"#,
        r#"___\(\s*['"]([^'"]+)['"]\s*(?:,|\))"#,
    ]
    .iter()
    .map(|pattern| Regex::new(pattern).expect("Invalid key pattern regex"))
    .collect()
});

/// Settings for one scan run
#[derive(Debug, Clone)]
pub struct ScanOptions {
    /// Directories to walk; missing ones are skipped
    pub roots: Vec<PathBuf>,
    /// Extensions without the leading dot, compound ones allowed
    pub extensions: Vec<String>,
    /// Directory names, or paths relative to a root, to prune
    pub exclude: Vec<String>,
    /// Scope the keys are registered under
    pub scope: String,
    /// Extract and report only
    pub dry: bool,
    pub mode: ScanMode,
    /// Show a progress bar on stderr
    pub progress: bool,
}

impl ScanOptions {
    /// Options from configuration, roots resolved against `project_root`
    pub fn from_config(config: &ScanConfig, project_root: &Path, scope: &str) -> Self {
        Self {
            roots: config.paths.iter().map(|p| project_root.join(p)).collect(),
            extensions: config.extensions.clone(),
            exclude: config.exclude.clone(),
            scope: scope.to_string(),
            dry: false,
            mode: config.mode,
            progress: false,
        }
    }
}

/// Counts reported by a scan
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ScanReport {
    pub files_scanned: usize,
    pub keys_found: usize,
    /// New keys registered
    pub inserted: usize,
    /// Keys the scope already had
    pub skipped: usize,
    /// Files that could not be read
    pub unreadable: usize,
    /// Export outcome in insert-then-export mode
    pub exported: Option<bool>,
}

/// Result of walking and extracting, before any registration
#[derive(Debug, Clone, Default)]
pub struct Discovery {
    pub files_scanned: usize,
    pub unreadable: usize,
    pub keys: BTreeSet<String>,
}

/// File walker and key extractor
#[derive(Debug, Clone)]
pub struct KeyScanner {
    extensions: Vec<String>,
    exclude: Vec<String>,
}

impl KeyScanner {
    pub fn new(extensions: &[String], exclude: &[String]) -> Self {
        Self {
            extensions: extensions
                .iter()
                .map(|e| e.trim().trim_start_matches('.').to_lowercase())
                .filter(|e| !e.is_empty())
                .collect(),
            exclude: exclude
                .iter()
                .map(|e| e.trim().trim_matches('/').to_string())
                .filter(|e| !e.is_empty())
                .collect(),
        }
    }

    /// Whether a file name carries one of the configured extensions
    pub fn matches_extension(&self, file_name: &str) -> bool {
        let name = file_name.to_lowercase();
        self.extensions
            .iter()
            .any(|ext| name.ends_with(&format!(".{}", ext)))
    }

    fn is_excluded(&self, entry: &DirEntry, root: &Path) -> bool {
        if entry.depth() == 0 || !entry.file_type().is_dir() {
            return false;
        }

        let name = entry.file_name().to_string_lossy();
        let relative = entry
            .path()
            .strip_prefix(root)
            .map(|p| p.to_string_lossy().replace('\\', "/"))
            .unwrap_or_default();

        self.exclude.iter().any(|ex| *ex == name || *ex == relative)
    }

    /// Every matching file under `roots`, sorted, with excluded directories pruned
    pub fn collect_files(&self, roots: &[PathBuf]) -> Vec<PathBuf> {
        let mut files = Vec::new();

        for root in roots {
            if !root.is_dir() {
                debug!("Scan root {:?} does not exist, skipping", root);
                continue;
            }

            let walker = WalkDir::new(root)
                .follow_links(true)
                .into_iter()
                .filter_entry(|entry| !self.is_excluded(entry, root));

            for entry in walker {
                match entry {
                    Ok(entry) if entry.file_type().is_file() => {
                        if self.matches_extension(&entry.file_name().to_string_lossy()) {
                            files.push(entry.into_path());
                        }
                    }
                    Ok(_) => {}
                    Err(e) => warn!("Skipping unreadable path during scan: {}", e),
                }
            }
        }

        files.sort();
        files.dedup();
        files
    }

    /// Literal keys referenced in `content`
    pub fn extract_keys(content: &str) -> BTreeSet<String> {
        let mut keys = BTreeSet::new();

        for pattern in KEY_PATTERNS.iter() {
            for captures in pattern.captures_iter(content) {
                if let Some(key) = captures.get(1) {
                    let key = key.as_str().trim();
                    if !key.is_empty() {
                        keys.insert(key.to_string());
                    }
                }
            }
        }

        keys
    }

    /// Walk the roots and extract every unique key
    pub fn discover(&self, roots: &[PathBuf], show_progress: bool) -> Discovery {
        let files = self.collect_files(roots);
        let mut discovery = Discovery {
            files_scanned: files.len(),
            ..Discovery::default()
        };

        let progress = if show_progress {
            let bar = ProgressBar::new(files.len() as u64);
            let style = ProgressStyle::default_bar()
                .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} files ({percent}%) {msg}")
                .or_else(|_| ProgressStyle::default_bar().template("{spinner} [{elapsed_precise}] [{bar:40}] {pos}/{len} ({percent}%) {msg}"))
                .unwrap_or_else(|_| ProgressStyle::default_bar());
            bar.set_style(style.progress_chars("█▓▒░"));
            bar.set_message("Scanning");
            Some(bar)
        } else {
            None
        };

        for file in &files {
            match fs::read_to_string(file) {
                Ok(content) => discovery.keys.extend(Self::extract_keys(&content)),
                Err(e) => {
                    debug!("Cannot read {:?}: {}", file, e);
                    discovery.unreadable += 1;
                }
            }

            if let Some(bar) = &progress {
                bar.inc(1);
            }
        }

        if let Some(bar) = progress {
            bar.finish_with_message("Scan complete");
        }

        discovery
    }
}

impl CatalogContext<'_> {
    /// Scan source roots and register unseen keys under the target scope
    ///
    /// Fails only when the record store cannot be queried; unreadable
    /// files are counted and skipped.
    pub fn scan(&mut self, options: &ScanOptions) -> Result<ScanReport> {
        let scope = self.catalog.scope_or_default(&options.scope);
        let scanner = KeyScanner::new(&options.extensions, &options.exclude);
        let discovery = scanner.discover(&options.roots, options.progress);

        let mut report = ScanReport {
            files_scanned: discovery.files_scanned,
            keys_found: discovery.keys.len(),
            unreadable: discovery.unreadable,
            ..ScanReport::default()
        };

        info!(
            "Scanned {} files, found {} keys ({} unreadable)",
            report.files_scanned, report.keys_found, report.unreadable
        );

        if options.dry {
            info!("Dry run: nothing registered");
            return Ok(report);
        }
        if discovery.keys.is_empty() {
            return Ok(report);
        }

        let catalog = self.catalog;
        let records = catalog.records();
        let mut fresh: Vec<String> = Vec::new();
        for key in discovery.keys {
            let existing = records
                .find_key(&scope, &key)
                .with_context(|| format!("Failed to look up key '{}' in scope '{}'", key, scope))?;
            if existing.is_some() {
                report.skipped += 1;
            } else {
                fresh.push(key);
            }
        }

        if fresh.is_empty() {
            info!("No new keys for scope '{}'", scope);
            return Ok(report);
        }

        match options.mode {
            ScanMode::AutoCreate => {
                let locales = catalog.registry().active_codes();
                for key in &fresh {
                    records
                        .ensure_key(&scope, key)
                        .with_context(|| format!("Failed to register key '{}'", key))?;
                    for locale in &locales {
                        self.resolve(key, &scope, locale);
                    }
                }
            }
            ScanMode::InsertThenExport => {
                records
                    .ensure_keys(&scope, &fresh)
                    .with_context(|| format!("Failed to register keys in scope '{}'", scope))?;
                self.invalidate_scope(&scope);
                report.exported = Some(self.export(&scope, None));
            }
        }

        report.inserted = fresh.len();
        info!(
            "Scope '{}': inserted {}, skipped {}",
            scope, report.inserted, report.skipped
        );
        Ok(report)
    }
}
