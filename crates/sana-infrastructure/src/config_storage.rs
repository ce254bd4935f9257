//! Client configuration storage.
//!
//! Loads `config.toml` from the sana config directory. A missing file yields
//! defaults; the `SANA_API_BASE` environment variable overrides the configured
//! base URL either way.

use crate::paths::SanaPaths;
use sana_core::error::{Result, SanaError};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::PathBuf;

const DEFAULT_API_BASE: &str = "http://127.0.0.1:8000";
const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// Environment variable overriding the configured API base URL.
pub const API_BASE_ENV: &str = "SANA_API_BASE";

/// Client configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClientConfig {
    /// Base URL of the backend, without a trailing slash.
    #[serde(default = "default_api_base")]
    pub api_base_url: String,
    /// Per-request timeout in seconds.
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

fn default_api_base() -> String {
    DEFAULT_API_BASE.to_string()
}

fn default_timeout_secs() -> u64 {
    DEFAULT_TIMEOUT_SECS
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            api_base_url: default_api_base(),
            timeout_secs: default_timeout_secs(),
        }
    }
}

impl ClientConfig {
    /// Loads configuration from the default path, applying the env override.
    pub fn load() -> Result<Self> {
        let path = SanaPaths::config_file().map_err(|e| SanaError::config(e.to_string()))?;
        let mut config = Self::load_from(path)?;
        if let Ok(base) = std::env::var(API_BASE_ENV) {
            if !base.trim().is_empty() {
                config.api_base_url = base;
            }
        }
        Ok(config)
    }

    /// Loads configuration from a specific path (for testing).
    ///
    /// A missing or empty file yields the defaults.
    pub fn load_from(path: PathBuf) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }

        let content = fs::read_to_string(&path)?;
        if content.trim().is_empty() {
            return Ok(Self::default());
        }

        let config: ClientConfig = toml::from_str(&content)?;
        Ok(config)
    }

    /// The base URL with any trailing slash trimmed, ready for path joining.
    pub fn base_url(&self) -> &str {
        self.api_base_url.trim_end_matches('/')
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_missing_file_yields_defaults() {
        let temp_dir = TempDir::new().unwrap();
        let config = ClientConfig::load_from(temp_dir.path().join("config.toml")).unwrap();
        assert_eq!(config, ClientConfig::default());
        assert_eq!(config.base_url(), "http://127.0.0.1:8000");
    }

    #[test]
    fn test_partial_file_fills_defaults() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("config.toml");
        fs::write(&path, "api_base_url = \"https://sana.example.com/\"\n").unwrap();

        let config = ClientConfig::load_from(path).unwrap();
        assert_eq!(config.api_base_url, "https://sana.example.com/");
        assert_eq!(config.base_url(), "https://sana.example.com");
        assert_eq!(config.timeout_secs, 30);
    }

    #[test]
    fn test_invalid_toml_is_error() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("config.toml");
        fs::write(&path, "api_base_url = [broken").unwrap();

        let result = ClientConfig::load_from(path);
        assert!(matches!(result, Err(SanaError::Serialization { .. })));
    }
}
