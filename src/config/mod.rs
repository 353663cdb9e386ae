//! Configuration management.
//!
//! Settings are read from a TOML file and overridden by `READING_SHELF_*`
//! environment variables (`READING_SHELF_CATALOG__PAGE_SIZE=20`). Every
//! section falls back to its defaults when absent.
//!
//! # Configuration File Format
//!
//! ```toml
//! [catalog]
//! base_url = "https://www.googleapis.com/books/v1"
//! api_key = "your-api-key"
//! page_size = 10
//! request_timeout_secs = 10
//! fetch_all_limit = 200
//! fetch_all_concurrency = 4
//!
//! [persistence]
//! backend = "file"
//! path = "~/.config/reading-shelf/collections.json"
//! base_url = "http://localhost:3000"
//!
//! [retry]
//! max_attempts = 3
//! initial_delay_ms = 250
//! max_delay_ms = 5000
//!
//! [logging]
//! level = "info"
//! format = "json"
//! ```

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::models::MAX_PAGE_SIZE;
use crate::utils::RetryConfig;

/// File name looked up in the working directory
pub const LOCAL_CONFIG_FILE: &str = "reading-shelf.toml";

/// Application configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// Catalog service settings
    #[serde(default)]
    pub catalog: CatalogConfig,

    /// Collection storage settings
    #[serde(default)]
    pub persistence: PersistenceConfig,

    /// Retry policy for corrective deletes
    #[serde(default)]
    pub retry: RetryPolicyConfig,

    /// Logging settings
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Catalog service configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CatalogConfig {
    #[serde(default = "default_catalog_url")]
    pub base_url: String,

    /// Google Books API key (optional, raises quota)
    #[serde(default = "default_api_key", skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,

    /// Results per page, clamped to 1..=40 when used
    #[serde(default = "default_page_size")]
    pub page_size: usize,

    #[serde(default = "default_request_timeout")]
    pub request_timeout_secs: u64,

    /// Maximum items gathered by `search --all`
    #[serde(default = "default_fetch_all_limit")]
    pub fetch_all_limit: usize,

    #[serde(default = "default_fetch_all_concurrency")]
    pub fetch_all_concurrency: usize,
}

impl Default for CatalogConfig {
    fn default() -> Self {
        Self {
            base_url: default_catalog_url(),
            api_key: default_api_key(),
            page_size: default_page_size(),
            request_timeout_secs: default_request_timeout(),
            fetch_all_limit: default_fetch_all_limit(),
            fetch_all_concurrency: default_fetch_all_concurrency(),
        }
    }
}

impl CatalogConfig {
    /// Page size within the catalog's accepted range
    pub fn effective_page_size(&self) -> usize {
        self.page_size.clamp(1, MAX_PAGE_SIZE)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs.max(1))
    }
}

fn default_catalog_url() -> String {
    "https://www.googleapis.com/books/v1".to_string()
}

fn default_api_key() -> Option<String> {
    std::env::var("GOOGLE_BOOKS_API_KEY")
        .ok()
        .filter(|key| !key.is_empty())
}

fn default_page_size() -> usize {
    10
}

fn default_request_timeout() -> u64 {
    10
}

fn default_fetch_all_limit() -> usize {
    200
}

fn default_fetch_all_concurrency() -> usize {
    4
}

/// Which collection backend to use
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BackendKind {
    #[default]
    File,
    Http,
}

/// Collection storage configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PersistenceConfig {
    #[serde(default)]
    pub backend: BackendKind,

    /// JSON document used by the file backend
    #[serde(default = "default_collections_path")]
    pub path: PathBuf,

    /// Persistence API root used by the http backend
    #[serde(default)]
    pub base_url: Option<String>,
}

impl Default for PersistenceConfig {
    fn default() -> Self {
        Self {
            backend: BackendKind::default(),
            path: default_collections_path(),
            base_url: None,
        }
    }
}

fn default_collections_path() -> PathBuf {
    dirs::config_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("reading-shelf")
        .join("collections.json")
}

/// Retry policy configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RetryPolicyConfig {
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,

    #[serde(default = "default_initial_delay")]
    pub initial_delay_ms: u64,

    #[serde(default = "default_max_delay")]
    pub max_delay_ms: u64,
}

impl Default for RetryPolicyConfig {
    fn default() -> Self {
        Self {
            max_attempts: default_max_attempts(),
            initial_delay_ms: default_initial_delay(),
            max_delay_ms: default_max_delay(),
        }
    }
}

impl From<&RetryPolicyConfig> for RetryConfig {
    fn from(policy: &RetryPolicyConfig) -> Self {
        RetryConfig::default()
            .max_attempts(policy.max_attempts.max(1))
            .initial_delay(Duration::from_millis(policy.initial_delay_ms))
            .max_delay(Duration::from_millis(policy.max_delay_ms))
    }
}

fn default_max_attempts() -> u32 {
    3
}

fn default_initial_delay() -> u64 {
    250
}

fn default_max_delay() -> u64 {
    5000
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    #[serde(default = "default_log_level")]
    pub level: String,

    /// `json` for structured output, plain text otherwise
    #[serde(default)]
    pub format: Option<String>,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: None,
        }
    }
}

impl LoggingConfig {
    pub fn is_json(&self) -> bool {
        self.format
            .as_deref()
            .is_some_and(|f| f.eq_ignore_ascii_case("json"))
    }
}

fn default_log_level() -> String {
    "info".to_string()
}

/// Configuration file errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigFileError {
    #[error("IO error: {0}")]
    Io(String),

    #[error("Serialize error: {0}")]
    Serialize(String),
}

impl Config {
    /// Save configuration to a TOML file, creating parent directories
    pub fn save(&self, path: &Path) -> Result<(), ConfigFileError> {
        let content =
            toml::to_string_pretty(self).map_err(|e| ConfigFileError::Serialize(e.to_string()))?;

        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent).map_err(|e| ConfigFileError::Io(e.to_string()))?;
        }

        std::fs::write(path, content).map_err(|e| ConfigFileError::Io(e.to_string()))
    }

    /// Retry policy in the form the collection store takes
    pub fn retry_config(&self) -> RetryConfig {
        RetryConfig::from(&self.retry)
    }
}

/// Load configuration from a file, with environment overrides
pub fn load_config(path: &Path) -> Result<Config, config::ConfigError> {
    let settings = config::Config::builder()
        .add_source(config::File::from(path))
        .add_source(config::Environment::with_prefix("READING_SHELF").separator("__"))
        .build()?;

    settings.try_deserialize()
}

/// Load configuration from environment variables and defaults only
pub fn get_config() -> Result<Config, config::ConfigError> {
    let settings = config::Config::builder()
        .add_source(config::Environment::with_prefix("READING_SHELF").separator("__"))
        .build()?;

    settings.try_deserialize()
}

/// Default location of the user configuration file
pub fn user_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|dir| dir.join("reading-shelf").join("config.toml"))
}

/// Find the configuration file: working directory first, then the user config dir
pub fn find_config_file() -> Option<PathBuf> {
    let local = PathBuf::from(LOCAL_CONFIG_FILE);
    if local.is_file() {
        return Some(local);
    }

    user_config_path().filter(|path| path.is_file())
}
