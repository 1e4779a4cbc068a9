//! Configuration management
//!
//! This module handles loading and parsing configuration for the moderation
//! queue client. Configuration can be loaded from:
//! - modqueue.yml file
//! - Environment variables (override file settings)
//!
//! Missing optional values are filled with sensible defaults.

pub mod preferences;

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

/// Main configuration structure
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct Config {
    /// REST API configuration
    #[serde(default)]
    pub api: ApiConfig,
    /// Polling intervals
    #[serde(default)]
    pub polling: PollingConfig,
    /// Query cache configuration
    #[serde(default)]
    pub cache: CacheConfig,
    /// User preference storage
    #[serde(default)]
    pub preferences: PreferencesConfig,
}

/// REST API configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ApiConfig {
    /// Base URL every endpoint path is appended to
    #[serde(default = "default_base_url")]
    pub base_url: String,
    /// Optional per-request timeout. Requests never time out when unset.
    #[serde(default)]
    pub timeout_seconds: Option<u64>,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            timeout_seconds: None,
        }
    }
}

fn default_base_url() -> String {
    "http://localhost:3001/api/v1".to_string()
}

/// Polling configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PollingConfig {
    /// Interval of the new-items check on the list view
    #[serde(default = "default_new_items_interval_ms")]
    pub new_items_interval_ms: u64,
    /// Interval of the detail view refresh
    #[serde(default = "default_detail_interval_ms")]
    pub detail_interval_ms: u64,
}

impl Default for PollingConfig {
    fn default() -> Self {
        Self {
            new_items_interval_ms: default_new_items_interval_ms(),
            detail_interval_ms: default_detail_interval_ms(),
        }
    }
}

fn default_new_items_interval_ms() -> u64 {
    5000
}

fn default_detail_interval_ms() -> u64 {
    3000
}

impl PollingConfig {
    pub fn new_items_interval(&self) -> Duration {
        Duration::from_millis(self.new_items_interval_ms)
    }

    pub fn detail_interval(&self) -> Duration {
        Duration::from_millis(self.detail_interval_ms)
    }
}

/// Cache configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CacheConfig {
    /// Cache TTL in seconds
    #[serde(default = "default_ttl")]
    pub ttl_seconds: u64,
    /// Maximum number of cached queries per cache
    #[serde(default = "default_max_capacity")]
    pub max_capacity: u64,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            ttl_seconds: default_ttl(),
            max_capacity: default_max_capacity(),
        }
    }
}

fn default_ttl() -> u64 {
    300
}

fn default_max_capacity() -> u64 {
    256
}

/// Preference storage configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PreferencesConfig {
    /// Path of the preference file
    #[serde(default = "default_preferences_path")]
    pub path: PathBuf,
}

impl Default for PreferencesConfig {
    fn default() -> Self {
        Self {
            path: default_preferences_path(),
        }
    }
}

fn default_preferences_path() -> PathBuf {
    PathBuf::from("data/preferences.yml")
}

/// Error type for configuration parsing
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read config file '{path}': {source}")]
    FileRead {
        path: String,
        source: std::io::Error,
    },
    #[error("Failed to parse config file '{path}': {message}")]
    ParseError {
        path: String,
        message: String,
    },
    #[error("Invalid configuration: {0}")]
    ValidationError(String),
}

impl Config {
    /// Load configuration from file
    ///
    /// If the file doesn't exist, returns default configuration.
    /// If the file exists but is invalid YAML, returns an error with details.
    pub fn load(path: &std::path::Path) -> anyhow::Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }

        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::FileRead {
            path: path.display().to_string(),
            source: e,
        })?;

        if content.trim().is_empty() {
            return Ok(Self::default());
        }

        let config: Config = serde_yaml::from_str(&content).map_err(|e| {
            ConfigError::ParseError {
                path: path.display().to_string(),
                message: format_yaml_error(&e),
            }
        })?;

        Ok(config)
    }

    /// Load configuration from file with environment variable overrides
    ///
    /// Environment variables follow the pattern:
    /// - MODQUEUE_API_BASE_URL
    /// - MODQUEUE_API_TIMEOUT_SECONDS
    /// - MODQUEUE_POLLING_NEW_ITEMS_INTERVAL_MS
    /// - MODQUEUE_POLLING_DETAIL_INTERVAL_MS
    /// - MODQUEUE_CACHE_TTL_SECONDS
    /// - MODQUEUE_CACHE_MAX_CAPACITY
    /// - MODQUEUE_PREFERENCES_PATH
    pub fn load_with_env(path: &std::path::Path) -> anyhow::Result<Self> {
        let mut config = Self::load(path)?;
        config.apply_env_overrides();
        Ok(config)
    }

    /// Apply environment variable overrides to the configuration
    fn apply_env_overrides(&mut self) {
        if let Ok(base_url) = std::env::var("MODQUEUE_API_BASE_URL") {
            self.api.base_url = base_url;
        }
        if let Ok(timeout) = std::env::var("MODQUEUE_API_TIMEOUT_SECONDS") {
            if let Ok(timeout) = timeout.parse::<u64>() {
                self.api.timeout_seconds = Some(timeout);
            }
        }

        if let Ok(interval) = std::env::var("MODQUEUE_POLLING_NEW_ITEMS_INTERVAL_MS") {
            if let Ok(interval) = interval.parse::<u64>() {
                self.polling.new_items_interval_ms = interval;
            }
        }
        if let Ok(interval) = std::env::var("MODQUEUE_POLLING_DETAIL_INTERVAL_MS") {
            if let Ok(interval) = interval.parse::<u64>() {
                self.polling.detail_interval_ms = interval;
            }
        }

        if let Ok(ttl) = std::env::var("MODQUEUE_CACHE_TTL_SECONDS") {
            if let Ok(ttl) = ttl.parse::<u64>() {
                self.cache.ttl_seconds = ttl;
            }
        }
        if let Ok(capacity) = std::env::var("MODQUEUE_CACHE_MAX_CAPACITY") {
            if let Ok(capacity) = capacity.parse::<u64>() {
                self.cache.max_capacity = capacity;
            }
        }

        if let Ok(path) = std::env::var("MODQUEUE_PREFERENCES_PATH") {
            self.preferences.path = PathBuf::from(path);
        }
    }

    /// Check values serde cannot reject on its own
    pub fn validate(&self) -> Result<(), ConfigError> {
        let base_url = self.api.base_url.trim();
        if base_url.is_empty() {
            return Err(ConfigError::ValidationError(
                "api.base_url must not be empty".to_string(),
            ));
        }
        if !base_url.starts_with("http://") && !base_url.starts_with("https://") {
            return Err(ConfigError::ValidationError(format!(
                "api.base_url must be an http(s) URL, got '{}'",
                base_url
            )));
        }
        if self.polling.new_items_interval_ms == 0 || self.polling.detail_interval_ms == 0 {
            return Err(ConfigError::ValidationError(
                "polling intervals must be greater than zero".to_string(),
            ));
        }
        if self.cache.max_capacity == 0 {
            return Err(ConfigError::ValidationError(
                "cache.max_capacity must be greater than zero".to_string(),
            ));
        }
        Ok(())
    }
}

/// Format YAML parsing error with location and context
fn format_yaml_error(e: &serde_yaml::Error) -> String {
    if let Some(location) = e.location() {
        format!(
            "at line {}, column {}: {}",
            location.line(),
            location.column(),
            e
        )
    } else {
        e.to_string()
    }
}

// Shared by `tests` and `property_tests`, both of which touch the process environment.
#[cfg(test)]
static CONFIG_ENV_MUTEX: std::sync::Mutex<()> = std::sync::Mutex::new(());

#[cfg(test)]
const ENV_KEYS: &[&str] = &[
    "MODQUEUE_API_BASE_URL",
    "MODQUEUE_API_TIMEOUT_SECONDS",
    "MODQUEUE_POLLING_NEW_ITEMS_INTERVAL_MS",
    "MODQUEUE_POLLING_DETAIL_INTERVAL_MS",
    "MODQUEUE_CACHE_TTL_SECONDS",
    "MODQUEUE_CACHE_MAX_CAPACITY",
    "MODQUEUE_PREFERENCES_PATH",
];

#[cfg(test)]
fn clear_env() {
    for key in ENV_KEYS {
        std::env::remove_var(key);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn lock_env() -> std::sync::MutexGuard<'static, ()> {
        super::CONFIG_ENV_MUTEX.lock().unwrap_or_else(|e| e.into_inner())
    }

    #[test]
    fn test_load_missing_file_returns_defaults() {
        let path = std::path::Path::new("nonexistent_modqueue.yml");
        let config = Config::load(path).unwrap();

        assert_eq!(config.api.base_url, "http://localhost:3001/api/v1");
        assert_eq!(config.api.timeout_seconds, None);
        assert_eq!(config.polling.new_items_interval(), Duration::from_secs(5));
        assert_eq!(config.polling.detail_interval(), Duration::from_secs(3));
        assert_eq!(config.cache.ttl_seconds, 300);
        assert_eq!(config.cache.max_capacity, 256);
        assert_eq!(config.preferences.path, PathBuf::from("data/preferences.yml"));
    }

    #[test]
    fn test_load_empty_file_returns_defaults() {
        let mut file = NamedTempFile::new().unwrap();
        write!(file, "   \n").unwrap();

        let config = Config::load(file.path()).unwrap();

        assert_eq!(config, Config::default());
    }

    #[test]
    fn test_load_partial_config_fills_defaults() {
        let mut file = NamedTempFile::new().unwrap();
        write!(file, "polling:\n  detail_interval_ms: 1500\n").unwrap();

        let config = Config::load(file.path()).unwrap();

        assert_eq!(config.polling.detail_interval_ms, 1500);
        assert_eq!(config.polling.new_items_interval_ms, 5000);
        assert_eq!(config.api.base_url, "http://localhost:3001/api/v1");
    }

    #[test]
    fn test_load_full_config() {
        let mut file = NamedTempFile::new().unwrap();
        write!(
            file,
            r#"
api:
  base_url: "https://moderation.example.com/api/v1"
  timeout_seconds: 20
polling:
  new_items_interval_ms: 10000
  detail_interval_ms: 2000
cache:
  ttl_seconds: 60
  max_capacity: 32
preferences:
  path: "/tmp/prefs.yml"
"#
        )
        .unwrap();

        let config = Config::load(file.path()).unwrap();

        assert_eq!(config.api.base_url, "https://moderation.example.com/api/v1");
        assert_eq!(config.api.timeout_seconds, Some(20));
        assert_eq!(config.polling.new_items_interval_ms, 10000);
        assert_eq!(config.polling.detail_interval_ms, 2000);
        assert_eq!(config.cache.ttl_seconds, 60);
        assert_eq!(config.cache.max_capacity, 32);
        assert_eq!(config.preferences.path, PathBuf::from("/tmp/prefs.yml"));
    }

    #[test]
    fn test_load_invalid_yaml_returns_error() {
        let mut file = NamedTempFile::new().unwrap();
        write!(file, "cache:\n  ttl_seconds: not_a_number\n").unwrap();

        let err = Config::load(file.path()).unwrap_err();

        let err_msg = err.to_string();
        assert!(err_msg.contains("parse"));
        assert!(err_msg.contains("line"));
    }

    #[test]
    fn test_load_malformed_yaml_returns_error() {
        let mut file = NamedTempFile::new().unwrap();
        write!(file, "api:\n  base_url: [invalid yaml").unwrap();

        assert!(Config::load(file.path()).is_err());
    }

    #[test]
    fn test_env_override_api_config() {
        let _guard = lock_env();
        clear_env();

        let mut file = NamedTempFile::new().unwrap();
        write!(file, "api:\n  base_url: \"http://a.example/api\"\n").unwrap();

        std::env::set_var("MODQUEUE_API_BASE_URL", "http://b.example/api");
        std::env::set_var("MODQUEUE_API_TIMEOUT_SECONDS", "15");

        let config = Config::load_with_env(file.path()).unwrap();

        assert_eq!(config.api.base_url, "http://b.example/api");
        assert_eq!(config.api.timeout_seconds, Some(15));

        clear_env();
    }

    #[test]
    fn test_env_override_polling_and_cache() {
        let _guard = lock_env();
        clear_env();

        let file = NamedTempFile::new().unwrap();

        std::env::set_var("MODQUEUE_POLLING_NEW_ITEMS_INTERVAL_MS", "1000");
        std::env::set_var("MODQUEUE_POLLING_DETAIL_INTERVAL_MS", "500");
        std::env::set_var("MODQUEUE_CACHE_TTL_SECONDS", "30");
        std::env::set_var("MODQUEUE_CACHE_MAX_CAPACITY", "8");
        std::env::set_var("MODQUEUE_PREFERENCES_PATH", "prefs/theme.yml");

        let config = Config::load_with_env(file.path()).unwrap();

        assert_eq!(config.polling.new_items_interval_ms, 1000);
        assert_eq!(config.polling.detail_interval_ms, 500);
        assert_eq!(config.cache.ttl_seconds, 30);
        assert_eq!(config.cache.max_capacity, 8);
        assert_eq!(config.preferences.path, PathBuf::from("prefs/theme.yml"));

        clear_env();
    }

    #[test]
    fn test_env_invalid_values_ignored() {
        let _guard = lock_env();
        clear_env();

        let file = NamedTempFile::new().unwrap();

        std::env::set_var("MODQUEUE_CACHE_TTL_SECONDS", "soon");
        std::env::set_var("MODQUEUE_POLLING_DETAIL_INTERVAL_MS", "-3");

        let config = Config::load_with_env(file.path()).unwrap();

        assert_eq!(config.cache.ttl_seconds, 300);
        assert_eq!(config.polling.detail_interval_ms, 3000);

        clear_env();
    }

    #[test]
    fn test_validate_rejects_bad_values() {
        assert!(Config::default().validate().is_ok());

        let mut config = Config::default();
        config.api.base_url = "ftp://example.com".to_string();
        assert!(matches!(
            config.validate(),
            Err(ConfigError::ValidationError(_))
        ));

        let mut config = Config::default();
        config.polling.new_items_interval_ms = 0;
        assert!(config.validate().is_err());

        let mut config = Config::default();
        config.cache.max_capacity = 0;
        assert!(config.validate().is_err());
    }
}
