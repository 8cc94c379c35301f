/*!
 * Tests for configuration loading and validation
 */

use lexicat::app_config::{CacheDriver, Config, LocalesSource, ScanMode, StoreDriverKind};
use lexicat::errors::ConfigError;

use crate::common;

#[test]
fn test_load_withMissingFile_shouldReturnNone() {
    let dir = common::create_temp_dir();

    let loaded = Config::load(&dir.path().join("lexicat.json")).unwrap();

    assert!(loaded.is_none());
}

#[test]
fn test_saveThenLoad_shouldPreserveSettings() {
    let dir = common::create_temp_dir();
    let path = dir.path().join("lexicat.json");

    let mut config = Config::default();
    config.use_locales_from = LocalesSource::Database;
    config.translations.driver = StoreDriverKind::CodeArray;
    config.cache.driver = CacheDriver::Database;
    config.scan.mode = ScanMode::InsertThenExport;
    config.save(&path).unwrap();

    let loaded = Config::load(&path).unwrap().unwrap();

    assert_eq!(loaded.use_locales_from, LocalesSource::Database);
    assert_eq!(loaded.translations.driver, StoreDriverKind::CodeArray);
    assert_eq!(loaded.cache.driver, CacheDriver::Database);
    assert_eq!(loaded.scan.mode, ScanMode::InsertThenExport);
}

#[test]
fn test_load_withMalformedFile_shouldFail() {
    let dir = common::create_temp_dir();
    let path = common::create_test_file(dir.path(), "lexicat.json", "{ not json").unwrap();

    let err = Config::load(&path).unwrap_err();

    assert!(err.to_string().contains("Failed to parse config file"));
}

#[test]
fn test_validate_withBlankDefaultScope_shouldFail() {
    let mut config = Config::default();
    config.default_scope = " ../ ".to_string();

    assert_eq!(config.validate(), Err(ConfigError::MissingDefaultScope));
}

#[test]
fn test_allScopes_withNoAvailableScopes_shouldUseDefaultScope() {
    let mut config = Config::default();
    config.available_scopes.clear();
    config.default_scope = "site".to_string();

    assert_eq!(config.all_scopes(), common::strings(&["site"]));
}
