/*!
 * Database entity models.
 *
 * These structures map directly to database tables and provide
 * type-safe access to persisted catalog data.
 */

use serde::{Deserialize, Serialize};

/// Language registry entry (`app_languages`)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Language {
    /// Locale code
    pub code: String,
    /// Display name
    pub name: String,
    /// Whether the language takes part in export/import/resolution
    #[serde(default = "default_active")]
    pub active: bool,
}

fn default_active() -> bool {
    true
}

impl Language {
    /// Create an active language entry
    pub fn new(code: &str, name: &str) -> Self {
        Self {
            code: code.to_string(),
            name: name.to_string(),
            active: true,
        }
    }

    /// Builder-style toggle for the active flag
    pub fn with_active(mut self, active: bool) -> Self {
        self.active = active;
        self
    }
}

/// Canonical key row (`app_texts`)
///
/// `(scope, text)` is unique. `text` doubles as the default value for
/// every locale without a translation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TranslationKey {
    /// Database ID
    pub id: i64,
    /// Partition the key lives in
    pub scope: String,
    /// Source-language text
    pub text: String,
}

/// Per-locale value row (`app_text_translations`)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Translation {
    /// Owning key
    pub key_id: i64,
    /// Locale code
    pub lang_code: String,
    /// Translated text; empty means "fall back to the key"
    pub text: String,
}

impl Translation {
    pub fn new(key_id: i64, lang_code: &str, text: &str) -> Self {
        Self {
            key_id,
            lang_code: lang_code.to_string(),
            text: text.to_string(),
        }
    }
}
