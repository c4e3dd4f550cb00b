use anyhow::{Context, Result, anyhow};
use serde::{Deserialize, Serialize};
use std::default::Default;
use std::fs::File;
use std::io::BufReader;
use std::path::{Path, PathBuf};

// Application configuration: loading, validation and defaults

/// Represents the application configuration
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct Config {
    /// Catalog database file; the platform data directory is used when absent
    #[serde(default)]
    pub database_path: Option<String>,

    /// Cache config
    #[serde(default)]
    pub cache: CacheConfig,

    /// Transliteration config
    #[serde(default)]
    pub transliteration: TransliterationConfig,

    /// Log level
    #[serde(default)]
    pub log_level: LogLevel,
}

/// Cache backend type
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Default)]
#[serde(rename_all = "lowercase")]
pub enum CacheBackendKind {
    // @backend: process-local map
    Memory,
    // @backend: table in the catalog database, shared across processes
    #[default]
    Sqlite,
}

impl std::fmt::Display for CacheBackendKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Memory => write!(f, "memory"),
            Self::Sqlite => write!(f, "sqlite"),
        }
    }
}

impl std::str::FromStr for CacheBackendKind {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "memory" => Ok(Self::Memory),
            "sqlite" => Ok(Self::Sqlite),
            _ => Err(anyhow!("Invalid cache backend: {}", s)),
        }
    }
}

/// Cache configuration
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct CacheConfig {
    /// Which backend stores cached values
    #[serde(default)]
    pub backend: CacheBackendKind,

    /// Fixed key of the sharing catalog snapshot
    #[serde(default = "default_catalog_key")]
    pub catalog_key: String,

    /// Lifetime of cached per-doctor message prefixes
    #[serde(default = "default_message_prefix_ttl_secs")]
    pub message_prefix_ttl_secs: u64,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            backend: CacheBackendKind::default(),
            catalog_key: default_catalog_key(),
            message_prefix_ttl_secs: default_message_prefix_ttl_secs(),
        }
    }
}

/// Transliteration service configuration
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct TransliterationConfig {
    /// Whether to try the service at all
    #[serde(default)]
    pub enabled: bool,

    /// Service base URL
    #[serde(default = "default_transliteration_endpoint")]
    pub endpoint: String,

    /// Request timeout in seconds
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

impl Default for TransliterationConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            endpoint: default_transliteration_endpoint(),
            timeout_secs: default_timeout_secs(),
        }
    }
}

/// Log level
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Error,
    Warn,
    #[default]
    Info,
    Debug,
    Trace,
}

impl LogLevel {
    /// Matching filter for the `log` facade
    pub fn to_level_filter(self) -> log::LevelFilter {
        match self {
            LogLevel::Error => log::LevelFilter::Error,
            LogLevel::Warn => log::LevelFilter::Warn,
            LogLevel::Info => log::LevelFilter::Info,
            LogLevel::Debug => log::LevelFilter::Debug,
            LogLevel::Trace => log::LevelFilter::Trace,
        }
    }
}

fn default_catalog_key() -> String {
    "catalog_json_v1".to_string()
}

fn default_message_prefix_ttl_secs() -> u64 {
    24 * 3600
}

fn default_transliteration_endpoint() -> String {
    "http://localhost:4321".to_string()
}

fn default_timeout_secs() -> u64 {
    10
}

impl Config {
    /// Load the configuration file, creating it with defaults if it does not exist
    pub fn load_or_create(path: &Path) -> Result<Self> {
        if path.exists() {
            let file = File::open(path)
                .with_context(|| format!("Failed to open config file: {}", path.display()))?;
            let reader = BufReader::new(file);
            let config: Config = serde_json::from_reader(reader)
                .with_context(|| format!("Failed to parse config file: {}", path.display()))?;
            return Ok(config);
        }

        log::warn!(
            "Config file not found at '{}', creating default config.",
            path.display()
        );
        let config = Config::default();
        let config_json = serde_json::to_string_pretty(&config)
            .context("Failed to serialize default config to JSON")?;
        std::fs::write(path, config_json).with_context(|| {
            format!("Failed to write default config to file: {}", path.display())
        })?;

        Ok(config)
    }

    /// Validate the configuration for consistency and required values
    pub fn validate(&self) -> Result<()> {
        if self.cache.catalog_key.trim().is_empty() {
            return Err(anyhow!("Cache catalog_key must not be empty"));
        }

        if self.transliteration.timeout_secs == 0 {
            return Err(anyhow!("Transliteration timeout_secs must be greater than zero"));
        }

        if self.transliteration.enabled {
            let endpoint = url::Url::parse(&self.transliteration.endpoint).with_context(|| {
                format!(
                    "Invalid transliteration endpoint: {}",
                    self.transliteration.endpoint
                )
            })?;
            if !matches!(endpoint.scheme(), "http" | "https") {
                return Err(anyhow!(
                    "Transliteration endpoint must use http or https: {}",
                    self.transliteration.endpoint
                ));
            }
        }

        Ok(())
    }

    /// Resolved database path
    pub fn database_path(&self) -> Result<PathBuf> {
        match &self.database_path {
            Some(path) if !path.trim().is_empty() => Ok(PathBuf::from(path)),
            _ => crate::database::DatabaseConnection::default_database_path(),
        }
    }
}

/// Default implementation for Config
impl Default for Config {
    fn default() -> Self {
        Config {
            database_path: None,
            cache: CacheConfig::default(),
            transliteration: TransliterationConfig::default(),
            log_level: LogLevel::default(),
        }
    }
}
