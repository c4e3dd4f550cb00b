/*!
 * Tests for application configuration functionality
 */

use peds_catalog::app_config::{CacheBackendKind, Config, LogLevel};

use crate::common;

/// Test default configuration values
#[test]
fn test_default_config_withNoParameters_shouldHaveCorrectDefaults() {
    let config = Config::default();

    assert_eq!(config.database_path, None);
    assert_eq!(config.cache.backend, CacheBackendKind::Sqlite);
    assert_eq!(config.cache.catalog_key, "catalog_json_v1");
    assert_eq!(config.cache.message_prefix_ttl_secs, 86_400);
    assert!(!config.transliteration.enabled);
    assert_eq!(config.transliteration.endpoint, "http://localhost:4321");
    assert_eq!(config.transliteration.timeout_secs, 10);
    assert_eq!(config.log_level, LogLevel::Info);
    assert!(config.validate().is_ok());
}

/// Test configuration validation
#[test]
fn test_config_validation_withVariousConfigs_shouldValidateCorrectly() {
    let mut config = Config::default();

    config.cache.catalog_key = "  ".to_string();
    assert!(config.validate().is_err());
    config.cache.catalog_key = "catalog_json_v1".to_string();

    config.transliteration.timeout_secs = 0;
    assert!(config.validate().is_err());
    config.transliteration.timeout_secs = 5;

    // A bad endpoint only matters once transliteration is enabled
    config.transliteration.endpoint = "ftp://xlit.example.org".to_string();
    assert!(config.validate().is_ok());
    config.transliteration.enabled = true;
    assert!(config.validate().is_err());

    config.transliteration.endpoint = "https://xlit.example.org".to_string();
    assert!(config.validate().is_ok());
}

#[test]
fn test_loadOrCreate_withMissingFile_shouldWriteDefaults() -> anyhow::Result<()> {
    let temp_dir = common::create_temp_dir()?;
    let path = temp_dir.path().join("conf.json");

    let config = Config::load_or_create(&path)?;

    assert!(path.exists());
    assert_eq!(config, Config::default());
    assert_eq!(Config::load_or_create(&path)?, config);
    Ok(())
}

#[test]
fn test_loadOrCreate_withPartialFile_shouldFillDefaults() -> anyhow::Result<()> {
    let temp_dir = common::create_temp_dir()?;
    let path = temp_dir.path().join("conf.json");
    std::fs::write(
        &path,
        r#"{"cache": {"backend": "memory"}, "log_level": "debug", "database_path": "/tmp/c.db"}"#,
    )?;

    let config = Config::load_or_create(&path)?;

    assert_eq!(config.cache.backend, CacheBackendKind::Memory);
    assert_eq!(config.cache.catalog_key, "catalog_json_v1");
    assert_eq!(config.log_level, LogLevel::Debug);
    assert_eq!(config.database_path()?, std::path::PathBuf::from("/tmp/c.db"));
    Ok(())
}

#[test]
fn test_loadOrCreate_withInvalidJson_shouldFail() -> anyhow::Result<()> {
    let temp_dir = common::create_temp_dir()?;
    let path = temp_dir.path().join("conf.json");
    std::fs::write(&path, "{ not json")?;

    assert!(Config::load_or_create(&path).is_err());
    Ok(())
}

#[test]
fn test_cacheBackendKind_fromStr_shouldParseKnownNames() {
    assert_eq!("Memory".parse::<CacheBackendKind>().unwrap(), CacheBackendKind::Memory);
    assert_eq!("sqlite".parse::<CacheBackendKind>().unwrap(), CacheBackendKind::Sqlite);
    assert!("redis".parse::<CacheBackendKind>().is_err());
}

#[test]
fn test_logLevel_toLevelFilter_shouldMatch() {
    assert_eq!(LogLevel::Warn.to_level_filter(), log::LevelFilter::Warn);
    assert_eq!(LogLevel::Trace.to_level_filter(), log::LevelFilter::Trace);
}
