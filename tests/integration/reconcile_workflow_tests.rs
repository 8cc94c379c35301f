/*!
 * End-to-end tests for export and import between records and files
 */

use std::fs;

use lexicat::app_config::StoreDriverKind;
use lexicat::catalog::{Catalog, OpenOptions};
use lexicat::database::DatabaseConnection;
use lexicat::reconcile::ImportPhase;
use lexicat::store::StoreDriver;

use crate::common;

#[test]
fn test_exportThenImport_shouldReconstructRows() {
    let test = common::create_catalog(&["en", "uz"]);
    let catalog = &test.catalog;
    let locales = common::strings(&["uz", "en"]);
    let hello = catalog.records().ensure_key("app", "Hello").unwrap();
    catalog.records().upsert_translation(hello.id, "uz", "Salom").unwrap();

    assert!(catalog.context().export("app", Some(&locales)));

    let uz: serde_json::Value = serde_json::from_str(&fs::read_to_string(test.lang_file("uz", "app")).unwrap()).unwrap();
    let en: serde_json::Value = serde_json::from_str(&fs::read_to_string(test.lang_file("en", "app")).unwrap()).unwrap();
    assert_eq!(uz, serde_json::json!({"Hello": "Salom"}));
    assert_eq!(en, serde_json::json!({"Hello": "Hello"}));

    catalog.records().truncate().unwrap();
    assert_eq!(catalog.records().count_keys().unwrap(), 0);

    assert!(catalog.context().import("app", Some(&locales), ImportPhase::default()));

    assert_eq!(catalog.records().count_keys().unwrap(), 1);
    let records = catalog.records();
    assert_eq!(records.find_translation("app", "Hello", "uz").unwrap().as_deref(), Some("Salom"));
    assert_eq!(records.find_translation("app", "Hello", "en").unwrap().as_deref(), Some("Hello"));
}

#[test]
fn test_exportThenImport_withCodeArrayDriver_shouldBeSymmetric() {
    let dir = common::create_temp_dir();
    let db = DatabaseConnection::new_in_memory().unwrap();
    let options = OpenOptions {
        driver: Some(StoreDriverKind::CodeArray),
        ..OpenOptions::default()
    };
    let catalog = Catalog::with_connection(common::config_with_locales(&["en", "uz"]), dir.path(), db, options);
    let key = catalog.records().ensure_key("admin", "It's done").unwrap();
    catalog.records().upsert_translation(key.id, "uz", "Tayyor").unwrap();

    assert!(catalog.context().export("admin", None));
    assert!(dir.path().join("lang/vendor/lexicat/uz/admin.php").exists());

    catalog.records().truncate().unwrap();
    assert!(catalog.context().import("admin", None, ImportPhase::default()));

    assert_eq!(
        catalog.records().find_translation("admin", "It's done", "uz").unwrap().as_deref(),
        Some("Tayyor")
    );
}

#[test]
fn test_export_shouldPrewarmTheOperationCache() {
    let test = common::create_catalog(&["en"]);
    let catalog = &test.catalog;
    catalog.records().ensure_key("app", "Hello").unwrap();
    let mut ctx = catalog.context();

    assert!(ctx.export("app", None));
    fs::remove_file(test.lang_file("en", "app")).unwrap();

    assert_eq!(ctx.translated_list("app", "en").len(), 1);
}

#[test]
fn test_export_withPrewarmDisabled_shouldReadFilesAgain() {
    let mut config = common::config_with_locales(&["en"]);
    config.cache.prewarm_on_export = false;
    let test = common::create_catalog_with(config);
    let catalog = &test.catalog;
    catalog.records().ensure_key("app", "Hello").unwrap();
    let mut ctx = catalog.context();

    assert!(ctx.export("app", None));
    fs::remove_file(test.lang_file("en", "app")).unwrap();

    assert!(ctx.translated_list("app", "en").is_empty());
}

#[test]
fn test_export_shouldNeverDropKeysFromRecords() {
    let test = common::create_catalog(&["en"]);
    let catalog = &test.catalog;
    catalog.records().ensure_key("app", "Hello").unwrap();
    common::create_test_file(test.root(), "lang/en/app.json", r#"{"Stale": "Old"}"#).unwrap();

    assert!(catalog.context().export("app", None));

    assert_eq!(catalog.store().read("app", "en"), common::snapshot(&[("Hello", "Hello")]));
    assert_eq!(catalog.records().count_keys().unwrap(), 1);
}

#[test]
fn test_import_shouldUnionKeysAcrossLocales() {
    let test = common::create_catalog(&["en", "uz"]);
    let catalog = &test.catalog;
    catalog.store().write("app", "en", &common::snapshot(&[("Hello", "Hello")]));
    catalog.store().write("app", "uz", &common::snapshot(&[("Bye", "Xayr")]));

    let report = catalog.context().import_report("app", None, ImportPhase::default());

    assert!(report.success());
    assert_eq!(report.keys, 2);
    let records = catalog.records();
    assert_eq!(records.count_keys().unwrap(), 2);
    assert_eq!(records.find_translation("app", "Bye", "uz").unwrap().as_deref(), Some("Xayr"));
    assert!(records.find_translation("app", "Bye", "en").unwrap().is_none());
}

#[test]
fn test_import_shouldRefreshCachedSnapshots() {
    let mut config = common::config_with_locales(&["en"]);
    config.translations.resolution = lexicat::app_config::ResolutionPolicy::DatabaseFirst;
    let test = common::create_catalog_with(config);
    let catalog = &test.catalog;
    let mut ctx = catalog.context();
    assert!(ctx.translated_list("app", "en").is_empty());

    catalog.store().write("app", "en", &common::snapshot(&[("Hello", "Hi")]));
    assert!(ctx.import("app", None, ImportPhase::default()));

    assert_eq!(ctx.resolve_read_only("Hello", "app", "en"), "Hi");
}
