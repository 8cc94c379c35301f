/*!
 * End-to-end tests for key resolution, edits and cache invalidation
 */

use std::fs;
use std::thread;

use lexicat::app_config::{CacheDriver, ResolutionPolicy};
use lexicat::store::StoreDriver;

use crate::common;

#[test]
fn test_resolve_withUnknownKey_shouldReturnKeyThenServeFromCache() {
    let test = common::create_catalog(&["en"]);
    let catalog = &test.catalog;
    let mut ctx = catalog.context();

    assert_eq!(ctx.resolve("Hello", "app", "en"), "Hello");
    assert!(catalog.records().find_key("app", "Hello").unwrap().is_some());
    assert_eq!(
        catalog.store().read("app", "en"),
        common::snapshot(&[("Hello", "Hello")])
    );

    // The file changes behind the operation's back; the operation keeps its answer
    common::create_test_file(test.root(), "lang/en/app.json", r#"{"Hello": "Changed"}"#).unwrap();
    assert_eq!(ctx.resolve("Hello", "app", "en"), "Hello");

    // A new operation reads the file again
    assert_eq!(catalog.context().resolve("Hello", "app", "en"), "Changed");
}

#[test]
fn test_resolve_withRecordTranslationOnly_shouldBackfillFile() {
    let test = common::create_catalog(&["en", "uz"]);
    let catalog = &test.catalog;
    let key = catalog.records().ensure_key("app", "Hello").unwrap();
    catalog.records().upsert_translation(key.id, "uz", "Salom").unwrap();

    assert_eq!(catalog.context().resolve("Hello", "app", "uz"), "Salom");

    assert_eq!(
        catalog.store().read("app", "uz").get("Hello").map(String::as_str),
        Some("Salom")
    );
}

#[test]
fn test_translate_shouldInvalidateOnlyItsLocale() {
    let test = common::create_catalog(&["en", "fr"]);
    let catalog = &test.catalog;
    let mut ctx = catalog.context();
    assert_eq!(ctx.resolve("Hello", "app", "en"), "Hello");
    assert_eq!(ctx.resolve("Hello", "app", "fr"), "Hello");

    assert!(ctx.translate("Hello", "app", "en", "Salom").unwrap());

    assert_eq!(ctx.resolve("Hello", "app", "en"), "Salom");
    assert_eq!(ctx.resolve("Hello", "app", "fr"), "Hello");
    assert_eq!(
        catalog.store().read("app", "fr").get("Hello").map(String::as_str),
        Some("Hello")
    );
}

#[test]
fn test_translate_withSharedTier_shouldBeSeenByLaterOperations() {
    let mut config = common::config_with_locales(&["en"]);
    config.cache.driver = CacheDriver::Process;
    let test = common::create_catalog_with(config);
    let catalog = &test.catalog;

    catalog.context().resolve("Hello", "app", "en");
    assert_eq!(catalog.context().translated_list("app", "en").len(), 1);

    // Tier 2 answers while the entry lives, even if the file changed
    common::create_test_file(test.root(), "lang/en/app.json", r#"{"Hello": "Edited"}"#).unwrap();
    assert_eq!(catalog.context().resolve("Hello", "app", "en"), "Hello");

    catalog.context().translate("Hello", "app", "en", "Hi").unwrap();
    assert_eq!(catalog.context().resolve("Hello", "app", "en"), "Hi");
}

#[test]
fn test_resolveReadOnly_shouldNotCreateAnything() {
    let test = common::create_catalog(&["en"]);
    let catalog = &test.catalog;

    assert_eq!(catalog.context().resolve_read_only("Ghost", "app", "en"), "Ghost");

    assert!(catalog.records().find_key("app", "Ghost").unwrap().is_none());
    assert!(!test.lang_file("en", "app").exists());
}

#[test]
fn test_resolve_withInactiveLocale_shouldReturnKeyWithoutWritingFile() {
    let test = common::create_catalog(&["en"]);

    assert_eq!(test.catalog.context().resolve("Hello", "app", "xx"), "Hello");

    assert!(!test.root().join("lang/xx").exists());
}

#[test]
fn test_saveAndDelete_shouldRewriteScopeFiles() {
    let test = common::create_catalog(&["en", "uz"]);
    let catalog = &test.catalog;
    let mut ctx = catalog.context();

    ctx.save("Hello", "app").unwrap();
    ctx.save("Bye", "app").unwrap();
    assert_eq!(catalog.store().read("app", "uz").len(), 2);

    assert!(ctx.delete("app", "Hello").unwrap());
    assert!(!ctx.delete("app", "Hello").unwrap());

    assert_eq!(catalog.store().read("app", "uz"), common::snapshot(&[("Bye", "Bye")]));
    assert_eq!(ctx.resolve_read_only("Hello", "app", "en"), "Hello");
    assert!(catalog.records().find_key("app", "Hello").unwrap().is_none());
}

#[test]
fn test_databaseFirst_shouldResolveFromRecordsWithoutFiles() {
    let mut config = common::config_with_locales(&["en", "uz"]);
    config.translations.resolution = ResolutionPolicy::DatabaseFirst;
    let test = common::create_catalog_with(config);
    let catalog = &test.catalog;

    assert_eq!(catalog.context().resolve("Hello", "app", "uz"), "Hello");
    assert!(catalog.context().translate("Hello", "app", "uz", "Salom").unwrap());

    assert_eq!(catalog.context().resolve("Hello", "app", "uz"), "Salom");
    assert!(!test.root().join("lang").exists());
}

#[test]
fn test_databaseFirst_withWriteThrough_shouldExportOnMiss() {
    let mut config = common::config_with_locales(&["en"]);
    config.translations.resolution = ResolutionPolicy::DatabaseFirst;
    config.translations.enabled = true;
    let test = common::create_catalog_with(config);

    assert_eq!(test.catalog.context().resolve("Hello", "app", "en"), "Hello");

    let body = fs::read_to_string(test.lang_file("en", "app")).unwrap();
    assert!(body.contains("\"Hello\": \"Hello\""));
}

#[test]
fn test_resolve_concurrentMisses_shouldCreateOneKey() {
    let test = common::create_catalog(&["en"]);
    let catalog = &test.catalog;

    thread::scope(|s| {
        for _ in 0..8 {
            s.spawn(|| {
                assert_eq!(catalog.context().resolve("Hello", "app", "en"), "Hello");
            });
        }
    });

    assert_eq!(catalog.records().count_keys().unwrap(), 1);
    assert_eq!(
        catalog.store().read("app", "en"),
        common::snapshot(&[("Hello", "Hello")])
    );
}

#[test]
fn test_resolve_afterLocaleOverride_shouldKeepFileTranslation() {
    let mut config = common::config_with_locales(&["en", "uz"]);
    config.cache.driver = CacheDriver::Process;
    let test = common::create_catalog_with(config);
    let catalog = &test.catalog;
    common::create_test_file(test.root(), "lang/en/app.json", r#"{"Hello": "Hi there"}"#).unwrap();

    {
        let _guard = catalog.registry().override_locales(&["uz"]);
        assert!(catalog.context().translated_list("app", "en").is_empty());

        // Other threads keep the configured locale set during the run
        let seen = thread::scope(|s| s.spawn(|| catalog.context().resolve("Hello", "app", "en")).join().unwrap());
        assert_eq!(seen, "Hi there");
    }

    assert_eq!(catalog.context().resolve("Hello", "app", "en"), "Hi there");
    assert_eq!(
        catalog.store().read("app", "en").get("Hello").map(String::as_str),
        Some("Hi there")
    );
}

#[test]
fn test_resolve_withMalformedFile_shouldNotCacheOrOverwrite() {
    let mut config = common::config_with_locales(&["en"]);
    config.cache.driver = CacheDriver::Process;
    let test = common::create_catalog_with(config);
    let catalog = &test.catalog;
    let path = common::create_test_file(test.root(), "lang/en/app.json", "{ broken").unwrap();

    assert_eq!(catalog.context().resolve("Hello", "app", "en"), "Hello");
    assert_eq!(fs::read_to_string(&path).unwrap(), "{ broken");

    common::create_test_file(test.root(), "lang/en/app.json", r#"{"Hello": "Hi"}"#).unwrap();
    assert_eq!(catalog.context().resolve("Hello", "app", "en"), "Hi");
}

#[test]
fn test_resolve_afterExportInSameOperation_shouldSeeExportedValue() {
    let test = common::create_catalog(&["en", "uz"]);
    let catalog = &test.catalog;
    let mut ctx = catalog.context();

    assert_eq!(ctx.resolve("Hello", "app", "uz"), "Hello");

    let key = catalog.records().find_key("app", "Hello").unwrap().unwrap();
    catalog.records().upsert_translation(key.id, "uz", "Salom").unwrap();
    assert!(ctx.export("app", None));

    assert_eq!(ctx.translated_list("app", "uz").get("Hello").map(String::as_str), Some("Salom"));
    assert_eq!(ctx.resolve("Hello", "app", "uz"), "Salom");
}
