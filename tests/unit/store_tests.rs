/*!
 * Tests for the per-scope file store drivers
 */

use std::fs;

use lexicat::errors::StoreError;
use lexicat::registry::LanguageRegistry;
use lexicat::store::{PerScopeFileStore, StoreDriver, StoreFormat, UpsertOutcome};

use crate::common;

fn json_store(dir: &tempfile::TempDir) -> PerScopeFileStore {
    PerScopeFileStore::new(
        dir.path().join("lang"),
        StoreFormat::Json,
        LanguageRegistry::from_codes(&["en", "uz"]),
    )
}

fn code_array_store(dir: &tempfile::TempDir) -> PerScopeFileStore {
    PerScopeFileStore::new(
        dir.path().join("lang"),
        StoreFormat::CodeArray {
            extension: "php".to_string(),
        },
        LanguageRegistry::from_codes(&["en", "uz"]),
    )
}

#[test]
fn test_writeThenRead_withJson_shouldReturnSameMapping() {
    let dir = common::create_temp_dir();
    let store = json_store(&dir);
    let mapping = common::snapshot(&[("Hello", "Salom"), ("Bye", "Xayr"), ("Ünïcode", "✓")]);

    assert!(store.write("app", "uz", &mapping));

    assert_eq!(store.read("app", "uz"), mapping);
}

#[test]
fn test_writeThenRead_withCodeArray_shouldSurviveQuotesAndBackslashes() {
    let dir = common::create_temp_dir();
    let store = code_array_store(&dir);
    let mapping = common::snapshot(&[("It's", "Don't"), ("C:\\path", "a\\'b"), ("Hello", "")]);

    assert!(store.write("admin", "en", &mapping));

    assert_eq!(store.read("admin", "en"), mapping);
    assert!(dir.path().join("lang/en/admin.php").exists());
}

#[test]
fn test_codeArray_shouldWriteReturnArrayFile() {
    let dir = common::create_temp_dir();
    let store = code_array_store(&dir);

    store.write("app", "en", &common::snapshot(&[("Hello", "Hello")]));

    let body = fs::read_to_string(dir.path().join("lang/en/app.php")).unwrap();
    assert_eq!(body, "<?php\n\nreturn [\n  'Hello' => 'Hello',\n];\n");
}

#[test]
fn test_read_withMissingFile_shouldReturnEmpty() {
    let dir = common::create_temp_dir();
    let store = json_store(&dir);

    assert!(store.read("app", "en").is_empty());
    assert!(store.try_read("app", "en").unwrap().is_none());
}

#[test]
fn test_upsert_twice_shouldMutateOnce() {
    let dir = common::create_temp_dir();
    let store = json_store(&dir);

    let first = store.try_upsert("app", "en", "Hello", "Hi").unwrap();
    let path = store.path("app", "en").unwrap();
    let written_at = fs::metadata(&path).unwrap().modified().unwrap();

    let second = store.try_upsert("app", "en", "Hello", "Hi").unwrap();

    assert_eq!(first, UpsertOutcome::Written);
    assert_eq!(second, UpsertOutcome::Unchanged);
    assert_eq!(fs::metadata(&path).unwrap().modified().unwrap(), written_at);
}

#[test]
fn test_upsert_shouldKeepOtherEntries() {
    let dir = common::create_temp_dir();
    let store = json_store(&dir);
    store.write("app", "uz", &common::snapshot(&[("Bye", "Xayr")]));

    assert!(store.upsert("app", "uz", "Hello", "Salom"));

    assert_eq!(
        store.read("app", "uz"),
        common::snapshot(&[("Bye", "Xayr"), ("Hello", "Salom")])
    );
}

#[test]
fn test_write_withInactiveLocale_shouldFailWithoutCreatingFile() {
    let dir = common::create_temp_dir();
    let store = json_store(&dir);

    assert!(!store.write("app", "xx", &common::snapshot(&[("Hello", "Hello")])));
    assert!(!store.upsert("app", "xx", "Hello", "Hello"));

    assert!(!dir.path().join("lang/xx").exists());
    assert!(matches!(
        store.try_read("app", "xx"),
        Err(StoreError::LocaleNotAllowed(locale)) if locale == "xx"
    ));
}

#[test]
fn test_write_duringOverride_shouldAllowOverrideLocalesOnly() {
    let dir = common::create_temp_dir();
    let registry = LanguageRegistry::from_codes(&["en"]);
    let store = PerScopeFileStore::new(dir.path().join("lang"), StoreFormat::Json, registry.clone());
    let mapping = common::snapshot(&[("Hello", "Bonjour")]);

    {
        let _guard = registry.override_locales(&["fr"]);
        assert!(store.write("app", "fr", &mapping));
        assert!(!store.write("app", "en", &mapping));
    }

    assert!(!store.write("app", "fr", &mapping));
    assert!(store.write("app", "en", &mapping));
}

#[test]
fn test_read_withMalformedFile_shouldDegradeToEmpty() {
    let dir = common::create_temp_dir();
    let store = json_store(&dir);
    common::create_test_file(dir.path(), "lang/en/app.json", "[1, 2").unwrap();

    assert!(store.read("app", "en").is_empty());
    assert!(matches!(store.try_read("app", "en"), Err(StoreError::Malformed { .. })));
}

#[test]
fn test_path_withTraversal_shouldStayUnderBaseDir() {
    let dir = common::create_temp_dir();
    let store = json_store(&dir);

    let path = store.path("../../secret", "../en").unwrap();

    assert!(path.starts_with(dir.path().join("lang")));
    assert!(matches!(store.path("..", "en"), Err(StoreError::InvalidPath { .. })));
}
