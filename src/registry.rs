/*!
 * Language registry.
 *
 * Resolves the active locale set from either the configured list or the
 * `app_languages` table, and supports a transient per-run override that is
 * scoped to the thread that took it.
 */

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::thread::{self, ThreadId};

use log::{debug, warn};
use parking_lot::RwLock;

use crate::app_config::{Config, LocalesSource};
use crate::database::{Language, RecordStore};
use crate::language_utils;

/// Backing source of the active locale set
#[derive(Clone)]
pub enum LanguageSource {
    /// Static list taken from configuration
    Config(Vec<Language>),
    /// Active rows of the record store's language table
    Database(Arc<dyn RecordStore>),
}

impl std::fmt::Debug for LanguageSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Config(languages) => f.debug_tuple("Config").field(languages).finish(),
            Self::Database(_) => f.write_str("Database"),
        }
    }
}

#[derive(Debug)]
struct OverrideEntry {
    id: u64,
    thread: ThreadId,
    codes: Vec<String>,
}

#[derive(Debug)]
struct RegistryState {
    source: LanguageSource,
    overrides: RwLock<Vec<OverrideEntry>>,
    next_override: AtomicU64,
}

/// Active language lookup shared by every catalog component
#[derive(Clone, Debug)]
pub struct LanguageRegistry {
    state: Arc<RegistryState>,
}

impl LanguageRegistry {
    pub fn new(source: LanguageSource) -> Self {
        Self {
            state: Arc::new(RegistryState {
                source,
                overrides: RwLock::new(Vec::new()),
                next_override: AtomicU64::new(1),
            }),
        }
    }

    /// Build a registry from a list of locale codes, names from ISO 639
    pub fn from_codes<S: AsRef<str>>(codes: &[S]) -> Self {
        let languages = codes
            .iter()
            .map(|code| {
                let code = language_utils::normalize_locale(code.as_ref());
                let name = fallback_name(&code);
                Language::new(&code, &name)
            })
            .collect();

        Self::new(LanguageSource::Config(languages))
    }

    /// Build the registry the configuration asks for
    pub fn from_config(config: &Config, records: Arc<dyn RecordStore>) -> Self {
        match config.use_locales_from {
            LocalesSource::Config => {
                let languages = config
                    .config_locales
                    .iter()
                    .map(|entry| {
                        let code = language_utils::normalize_locale(&entry.code);
                        let name = entry
                            .name
                            .clone()
                            .filter(|n| !n.trim().is_empty())
                            .unwrap_or_else(|| fallback_name(&code));
                        Language::new(&code, &name)
                    })
                    .collect();
                Self::new(LanguageSource::Config(languages))
            }
            LocalesSource::Database => Self::new(LanguageSource::Database(records)),
        }
    }

    /// Active languages in registry order
    ///
    /// While the calling thread holds an override the result is exactly
    /// the override list, named from the registry where the code is known.
    /// Other threads keep seeing the configured set.
    pub fn active_languages(&self) -> Vec<Language> {
        let configured = self.configured_languages();

        let current = thread::current().id();
        let overrides = self.state.overrides.read();
        let Some(entry) = overrides.iter().rev().find(|e| e.thread == current) else {
            return configured;
        };

        entry
            .codes
            .iter()
            .map(|code| {
                configured
                    .iter()
                    .find(|l| &l.code == code)
                    .cloned()
                    .unwrap_or_else(|| Language::new(code, &fallback_name(code)))
            })
            .collect()
    }

    /// Active locale codes in registry order
    pub fn active_codes(&self) -> Vec<String> {
        self.active_languages().into_iter().map(|l| l.code).collect()
    }

    /// Whether a write for `locale` may proceed
    pub fn is_allowed(&self, locale: &str) -> bool {
        let locale = language_utils::normalize_locale(locale);
        !locale.is_empty() && self.active_codes().iter().any(|c| *c == locale)
    }

    /// Restrict the calling thread's active set to `codes` until the guard is dropped
    pub fn override_locales<S: AsRef<str>>(&self, codes: &[S]) -> LocaleOverride {
        let mut sanitized: Vec<String> = Vec::with_capacity(codes.len());
        for code in codes {
            let code = language_utils::normalize_locale(code.as_ref());
            if !code.is_empty() && !sanitized.contains(&code) {
                sanitized.push(code);
            }
        }

        debug!("Overriding active locales with {:?}", sanitized);

        let id = self.state.next_override.fetch_add(1, Ordering::Relaxed);
        self.state.overrides.write().push(OverrideEntry {
            id,
            thread: thread::current().id(),
            codes: sanitized,
        });

        LocaleOverride {
            state: Arc::clone(&self.state),
            id,
        }
    }

    fn configured_languages(&self) -> Vec<Language> {
        match &self.state.source {
            LanguageSource::Config(languages) => {
                languages.iter().filter(|l| l.active).cloned().collect()
            }
            LanguageSource::Database(records) => match records.active_languages() {
                Ok(languages) => languages
                    .into_iter()
                    .map(|mut l| {
                        l.code = language_utils::normalize_locale(&l.code);
                        l
                    })
                    .collect(),
                Err(e) => {
                    warn!("Failed to load active languages: {:#}", e);
                    Vec::new()
                }
            },
        }
    }
}

fn fallback_name(code: &str) -> String {
    language_utils::display_name(code).unwrap_or_else(|| code.to_string())
}

/// Guard returned by [`LanguageRegistry::override_locales`]
///
/// Dropping it restores whichever locale set was active before it.
#[must_use = "the override ends as soon as the guard is dropped"]
pub struct LocaleOverride {
    state: Arc<RegistryState>,
    id: u64,
}

impl Drop for LocaleOverride {
    fn drop(&mut self) {
        self.state.overrides.write().retain(|e| e.id != self.id);
    }
}
