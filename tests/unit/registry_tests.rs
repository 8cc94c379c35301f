/*!
 * Tests for the language registry
 */

use lexicat::app_config::LocalesSource;
use lexicat::database::Language;
use lexicat::registry::LanguageRegistry;
use lexicat::store::StoreDriver;

use crate::common;

#[test]
fn test_databaseSourcedCatalog_shouldGateWritesByActiveFlag() {
    let mut config = common::config_with_locales(&[]);
    config.use_locales_from = LocalesSource::Database;
    let test = common::create_catalog_with(config);
    let catalog = &test.catalog;
    let mapping = common::snapshot(&[("Hello", "Salom")]);

    assert!(catalog.registry().active_codes().is_empty());
    assert!(!catalog.store().write("app", "uz", &mapping));

    catalog.records().upsert_language(&Language::new("uz", "Uzbek")).unwrap();
    assert!(catalog.store().write("app", "uz", &mapping));

    catalog.records().set_language_active("uz", false).unwrap();
    assert!(!catalog.store().upsert("app", "uz", "Bye", "Xayr"));
    assert_eq!(catalog.registry().active_codes(), Vec::<String>::new());
}

#[test]
fn test_configSourcedCatalog_shouldKeepConfiguredNames() {
    let mut config = common::config_with_locales(&["en"]);
    config.config_locales[0].name = Some("Inglizcha".to_string());
    let test = common::create_catalog_with(config);

    assert_eq!(
        test.catalog.registry().active_languages(),
        vec![Language::new("en", "Inglizcha")]
    );
}

#[test]
fn test_overrideLocales_shouldDeduplicateAndSanitize() {
    let registry = LanguageRegistry::from_codes(&["en"]);

    let _guard = registry.override_locales(&["UZ", "uz", "../fr", ""]);

    assert_eq!(registry.active_codes(), common::strings(&["uz", "fr"]));
}

#[test]
fn test_override_shouldBeSharedByClones() {
    let registry = LanguageRegistry::from_codes(&["en"]);
    let clone = registry.clone();

    let guard = registry.override_locales(&["uz"]);
    assert!(clone.is_allowed("uz"));

    drop(guard);
    assert!(!clone.is_allowed("uz"));
}
