/*!
 * Repository layer for database operations.
 *
 * This module implements `RecordStore` on top of SQLite, abstracting away
 * the SQL details and providing type-safe access.
 */

use std::collections::HashMap;

use anyhow::{Context, Result};
use log::debug;
use rusqlite::{params, params_from_iter, Connection, OptionalExtension};

use super::connection::DatabaseConnection;
use super::models::{Language, Translation, TranslationKey};
use super::RecordStore;

/// Upper bound on key ids bound into one `IN (...)` list
const ID_CHUNK: usize = 500;

/// Repository for database operations
#[derive(Clone, Debug)]
pub struct Repository {
    /// Database connection
    db: DatabaseConnection,
}

impl Repository {
    /// Create a new repository with the given database connection
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    /// Create a repository with the default database location
    pub fn new_default() -> Result<Self> {
        let db = DatabaseConnection::new_default()?;
        Ok(Self::new(db))
    }

    /// Create a repository with an in-memory database (for testing)
    pub fn new_in_memory() -> Result<Self> {
        let db = DatabaseConnection::new_in_memory()?;
        Ok(Self::new(db))
    }

    /// Get the underlying connection
    pub fn connection(&self) -> &DatabaseConnection {
        &self.db
    }

    // =========================================================================
    // Key helpers (synchronous, usable inside transactions)
    // =========================================================================

    fn ensure_key_sync(conn: &Connection, scope: &str, text: &str) -> Result<TranslationKey> {
        // The unique index decides the race; the loser's insert is a no-op
        let inserted = conn.execute(
            "INSERT INTO app_texts (scope, text) VALUES (?1, ?2) ON CONFLICT(scope, text) DO NOTHING",
            params![scope, text],
        )?;

        if inserted > 0 {
            debug!("Registered key '{}' in scope '{}'", text, scope);
        }

        Self::find_key_sync(conn, scope, text)?
            .with_context(|| format!("Key '{}' vanished from scope '{}' after insert", text, scope))
    }

    fn find_key_sync(conn: &Connection, scope: &str, text: &str) -> Result<Option<TranslationKey>> {
        let key = conn
            .query_row(
                "SELECT id, scope, text FROM app_texts WHERE scope = ?1 AND text = ?2",
                params![scope, text],
                parse_key_row,
            )
            .optional()?;

        Ok(key)
    }
}

fn parse_key_row(row: &rusqlite::Row) -> rusqlite::Result<TranslationKey> {
    Ok(TranslationKey {
        id: row.get(0)?,
        scope: row.get(1)?,
        text: row.get(2)?,
    })
}

fn parse_language_row(row: &rusqlite::Row) -> rusqlite::Result<Language> {
    Ok(Language {
        code: row.get(0)?,
        name: row.get(1)?,
        active: row.get(2)?,
    })
}

fn placeholders(count: usize) -> String {
    vec!["?"; count].join(", ")
}

impl RecordStore for Repository {
    // =========================================================================
    // Key Operations
    // =========================================================================

    fn ensure_key(&self, scope: &str, text: &str) -> Result<TranslationKey> {
        self.db.execute(|conn| Self::ensure_key_sync(conn, scope, text))
    }

    fn ensure_keys(&self, scope: &str, texts: &[String]) -> Result<HashMap<String, i64>> {
        self.db.transaction(|tx| {
            let mut ids = HashMap::with_capacity(texts.len());
            for text in texts {
                let key = Self::ensure_key_sync(tx, scope, text)?;
                ids.insert(key.text, key.id);
            }
            Ok(ids)
        })
    }

    fn find_key(&self, scope: &str, text: &str) -> Result<Option<TranslationKey>> {
        self.db.execute(|conn| Self::find_key_sync(conn, scope, text))
    }

    fn keys_in_scope(&self, scope: &str) -> Result<Vec<TranslationKey>> {
        self.db.execute(|conn| {
            let mut stmt =
                conn.prepare("SELECT id, scope, text FROM app_texts WHERE scope = ?1 ORDER BY id")?;
            let keys = stmt
                .query_map([scope], parse_key_row)?
                .collect::<rusqlite::Result<Vec<_>>>()?;
            Ok(keys)
        })
    }

    fn delete_key(&self, key_id: i64) -> Result<bool> {
        self.db.execute(|conn| {
            let deleted = conn.execute("DELETE FROM app_texts WHERE id = ?1", [key_id])?;
            Ok(deleted > 0)
        })
    }

    // =========================================================================
    // Translation Operations
    // =========================================================================

    fn upsert_translation(&self, key_id: i64, lang_code: &str, text: &str) -> Result<()> {
        self.db.execute(|conn| {
            conn.execute(
                r#"
                INSERT INTO app_text_translations (app_text_id, lang_code, text)
                VALUES (?1, ?2, ?3)
                ON CONFLICT(app_text_id, lang_code) DO UPDATE SET text = excluded.text
                "#,
                params![key_id, lang_code, text],
            )?;
            Ok(())
        })
    }

    fn upsert_translations(&self, rows: &[Translation]) -> Result<usize> {
        if rows.is_empty() {
            return Ok(0);
        }

        self.db.transaction(|tx| {
            let mut stmt = tx.prepare(
                r#"
                INSERT INTO app_text_translations (app_text_id, lang_code, text)
                VALUES (?1, ?2, ?3)
                ON CONFLICT(app_text_id, lang_code) DO UPDATE SET text = excluded.text
                "#,
            )?;

            for row in rows {
                stmt.execute(params![row.key_id, row.lang_code, row.text])?;
            }

            debug!("Upserted {} translations", rows.len());
            Ok(rows.len())
        })
    }

    fn find_translation(&self, scope: &str, text: &str, lang_code: &str) -> Result<Option<String>> {
        self.db.execute(|conn| {
            let value = conn
                .query_row(
                    r#"
                    SELECT t.text
                    FROM app_text_translations t
                    JOIN app_texts k ON k.id = t.app_text_id
                    WHERE k.scope = ?1 AND k.text = ?2 AND t.lang_code = ?3
                    "#,
                    params![scope, text, lang_code],
                    |row| row.get(0),
                )
                .optional()?;
            Ok(value)
        })
    }

    fn translations_for(&self, key_ids: &[i64], lang_codes: &[String]) -> Result<Vec<Translation>> {
        if key_ids.is_empty() || lang_codes.is_empty() {
            return Ok(Vec::new());
        }

        self.db.execute(|conn| {
            let mut result = Vec::new();

            for chunk in key_ids.chunks(ID_CHUNK) {
                let sql = format!(
                    "SELECT app_text_id, lang_code, text FROM app_text_translations \
                     WHERE app_text_id IN ({}) AND lang_code IN ({})",
                    placeholders(chunk.len()),
                    placeholders(lang_codes.len())
                );

                let bound: Vec<rusqlite::types::Value> = chunk
                    .iter()
                    .map(|id| rusqlite::types::Value::Integer(*id))
                    .chain(lang_codes.iter().map(|c| rusqlite::types::Value::Text(c.clone())))
                    .collect();

                let mut stmt = conn.prepare(&sql)?;
                let rows = stmt.query_map(params_from_iter(bound), |row| {
                    Ok(Translation {
                        key_id: row.get(0)?,
                        lang_code: row.get(1)?,
                        text: row.get(2)?,
                    })
                })?;

                for row in rows {
                    result.push(row?);
                }
            }

            Ok(result)
        })
    }

    fn count_keys(&self) -> Result<i64> {
        self.db.execute(|conn| {
            Ok(conn.query_row("SELECT COUNT(*) FROM app_texts", [], |row| row.get(0))?)
        })
    }

    fn truncate(&self) -> Result<()> {
        self.db.transaction(|tx| {
            tx.execute_batch(
                r#"
                DELETE FROM app_text_translations;
                DELETE FROM app_texts;
                DELETE FROM sqlite_sequence WHERE name = 'app_texts';
                "#,
            )?;
            debug!("Truncated keys and translations");
            Ok(())
        })
    }

    // =========================================================================
    // Language Registry
    // =========================================================================

    fn active_languages(&self) -> Result<Vec<Language>> {
        self.db.execute(|conn| {
            let mut stmt = conn.prepare(
                "SELECT code, name, is_active FROM app_languages WHERE is_active = 1 ORDER BY id",
            )?;
            let languages = stmt
                .query_map([], parse_language_row)?
                .collect::<rusqlite::Result<Vec<_>>>()?;
            Ok(languages)
        })
    }

    fn all_languages(&self) -> Result<Vec<Language>> {
        self.db.execute(|conn| {
            let mut stmt = conn.prepare("SELECT code, name, is_active FROM app_languages ORDER BY id")?;
            let languages = stmt
                .query_map([], parse_language_row)?
                .collect::<rusqlite::Result<Vec<_>>>()?;
            Ok(languages)
        })
    }

    fn upsert_language(&self, language: &Language) -> Result<()> {
        self.db.execute(|conn| {
            conn.execute(
                r#"
                INSERT INTO app_languages (code, name, is_active) VALUES (?1, ?2, ?3)
                ON CONFLICT(code) DO UPDATE SET name = excluded.name, is_active = excluded.is_active
                "#,
                params![language.code, language.name, language.active],
            )?;
            Ok(())
        })
    }

    fn set_language_active(&self, code: &str, active: bool) -> Result<bool> {
        self.db.execute(|conn| {
            let updated = conn.execute(
                "UPDATE app_languages SET is_active = ?1 WHERE code = ?2",
                params![active, code],
            )?;
            Ok(updated > 0)
        })
    }
}
