/*!
 * One file per (scope, locale): `{base}/{locale}/{scope}.{ext}`.
 */

use std::collections::HashMap;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use log::debug;
use parking_lot::Mutex;
use tempfile::NamedTempFile;

use super::{Snapshot, StoreDriver, StoreFormat, UpsertOutcome};
use crate::errors::StoreError;
use crate::language_utils;
use crate::registry::LanguageRegistry;

/// File store writing one catalog file per scope and locale
pub struct PerScopeFileStore {
    base_dir: PathBuf,
    format: StoreFormat,
    registry: LanguageRegistry,
    /// Serializes read-modify-write cycles per target file within the process
    file_locks: Mutex<HashMap<PathBuf, Arc<Mutex<()>>>>,
}

impl PerScopeFileStore {
    pub fn new(base_dir: impl Into<PathBuf>, format: StoreFormat, registry: LanguageRegistry) -> Self {
        Self {
            base_dir: base_dir.into(),
            format,
            registry,
            file_locks: Mutex::new(HashMap::new()),
        }
    }

    pub fn base_dir(&self) -> &Path {
        &self.base_dir
    }

    pub fn format(&self) -> &StoreFormat {
        &self.format
    }

    fn check_locale(&self, locale: &str) -> Result<(), StoreError> {
        if self.registry.is_allowed(locale) {
            Ok(())
        } else {
            Err(StoreError::LocaleNotAllowed(language_utils::normalize_locale(locale)))
        }
    }

    fn lock_for(&self, path: &Path) -> Arc<Mutex<()>> {
        let mut locks = self.file_locks.lock();
        Arc::clone(locks.entry(path.to_path_buf()).or_default())
    }

    fn read_path(&self, path: &Path) -> Result<Option<Snapshot>, StoreError> {
        let body = match fs::read_to_string(path) {
            Ok(body) => body,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(StoreError::io(path, e)),
        };

        self.format
            .decode(&body)
            .map(Some)
            .map_err(|reason| StoreError::Malformed {
                path: path.to_path_buf(),
                reason,
            })
    }

    /// Write to a sibling temp file, then rename over the target
    fn write_path(&self, path: &Path, snapshot: &Snapshot) -> Result<(), StoreError> {
        let body = self.format.encode(snapshot).map_err(StoreError::Encode)?;

        let dir = path.parent().unwrap_or(self.base_dir.as_path());
        fs::create_dir_all(dir).map_err(|e| StoreError::io(dir, e))?;

        let mut temp = NamedTempFile::new_in(dir).map_err(|e| StoreError::io(dir, e))?;
        temp.write_all(body.as_bytes())
            .and_then(|_| temp.as_file().sync_all())
            .map_err(|e| StoreError::io(temp.path(), e))?;

        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            fs::set_permissions(temp.path(), fs::Permissions::from_mode(0o644))
                .map_err(|e| StoreError::io(temp.path(), e))?;
        }

        temp.persist(path).map_err(|e| StoreError::io(path, e.error))?;

        debug!("Wrote {} entries to {:?}", snapshot.len(), path);
        Ok(())
    }
}

impl StoreDriver for PerScopeFileStore {
    fn name(&self) -> &'static str {
        self.format.name()
    }

    fn path(&self, scope: &str, locale: &str) -> Result<PathBuf, StoreError> {
        let clean_scope = language_utils::normalize_scope(scope);
        let clean_locale = language_utils::normalize_locale(locale);

        if clean_scope.is_empty() || clean_locale.is_empty() {
            return Err(StoreError::InvalidPath {
                scope: scope.to_string(),
                locale: locale.to_string(),
            });
        }

        Ok(self
            .base_dir
            .join(clean_locale)
            .join(format!("{}.{}", clean_scope, self.format.extension())))
    }

    fn try_read(&self, scope: &str, locale: &str) -> Result<Option<Snapshot>, StoreError> {
        self.check_locale(locale)?;
        let path = self.path(scope, locale)?;
        self.read_path(&path)
    }

    fn try_write(&self, scope: &str, locale: &str, snapshot: &Snapshot) -> Result<(), StoreError> {
        self.check_locale(locale)?;
        let path = self.path(scope, locale)?;

        let lock = self.lock_for(&path);
        let _guard = lock.lock();
        self.write_path(&path, snapshot)
    }

    fn try_upsert(
        &self,
        scope: &str,
        locale: &str,
        key: &str,
        value: &str,
    ) -> Result<UpsertOutcome, StoreError> {
        self.check_locale(locale)?;
        let path = self.path(scope, locale)?;

        let lock = self.lock_for(&path);
        let _guard = lock.lock();

        let mut snapshot = self.read_path(&path)?.unwrap_or_default();
        if snapshot.get(key).map(String::as_str) == Some(value) {
            return Ok(UpsertOutcome::Unchanged);
        }

        snapshot.insert(key.to_string(), value.to_string());
        self.write_path(&path, &snapshot)?;
        Ok(UpsertOutcome::Written)
    }
}
