//! Application configuration management.
//!
//! This module handles loading and saving the application configuration:
//! the application root URL the guard redirects to, the banking API base URL,
//! and an optional override for where the session store lives.
//!
//! Configuration is stored at `~/.config/bankgate/config.json`. The
//! `BANKGATE_DOMAIN_URL` and `BANKGATE_API_URL` environment variables take
//! precedence over the file.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::auth::GuardTargets;

/// Application name used for config/cache directory paths
const APP_NAME: &str = "bankgate";

/// Config file name
const CONFIG_FILE: &str = "config.json";

/// Session store file name in cache directory
const STORE_FILE: &str = "session.json";

const DEFAULT_DOMAIN_URL: &str = "http://localhost:8081";
const DEFAULT_API_URL: &str = "http://localhost:8080";

pub const DOMAIN_URL_ENV: &str = "BANKGATE_DOMAIN_URL";
pub const API_URL_ENV: &str = "BANKGATE_API_URL";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub domain_url: String,
    pub api_url: String,
    pub store_path: Option<PathBuf>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            domain_url: DEFAULT_DOMAIN_URL.to_string(),
            api_url: DEFAULT_API_URL.to_string(),
            store_path: None,
        }
    }
}

impl Config {
    /// Load from the default location, then apply environment overrides.
    pub fn load() -> Result<Self> {
        let mut config = Self::load_from(&Self::config_path()?)?;
        config.apply_env_overrides(|key| std::env::var(key).ok());
        Ok(config)
    }

    pub fn load_from(path: &Path) -> Result<Self> {
        if path.exists() {
            let contents = std::fs::read_to_string(path)
                .with_context(|| format!("Failed to read config file {}", path.display()))?;
            serde_json::from_str(&contents)
                .with_context(|| format!("Failed to parse config file {}", path.display()))
        } else {
            Ok(Self::default())
        }
    }

    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let contents = serde_json::to_string_pretty(self)?;
        std::fs::write(path, contents)?;
        Ok(())
    }

    /// Overlay non-empty values returned by `lookup` for the known variables.
    pub fn apply_env_overrides<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(url) = lookup(DOMAIN_URL_ENV).filter(|v| !v.is_empty()) {
            self.domain_url = url;
        }
        if let Some(url) = lookup(API_URL_ENV).filter(|v| !v.is_empty()) {
            self.api_url = url;
        }
    }

    pub fn config_path() -> Result<PathBuf> {
        let config_dir = dirs::config_dir()
            .ok_or_else(|| anyhow::anyhow!("Could not find config directory"))?;
        Ok(config_dir.join(APP_NAME).join(CONFIG_FILE))
    }

    pub fn store_path(&self) -> Result<PathBuf> {
        if let Some(ref path) = self.store_path {
            return Ok(path.clone());
        }
        let cache_dir = dirs::cache_dir()
            .ok_or_else(|| anyhow::anyhow!("Could not find cache directory"))?;
        Ok(cache_dir.join(APP_NAME).join(STORE_FILE))
    }

    pub fn targets(&self) -> GuardTargets {
        GuardTargets::from_domain(&self.domain_url)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_config_file_uses_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let config = Config::load_from(&dir.path().join("config.json")).unwrap();
        assert_eq!(config, Config::default());
        assert_eq!(config.domain_url, "http://localhost:8081");
    }

    #[test]
    fn test_config_round_trips_through_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("bankgate").join("config.json");

        let config = Config {
            domain_url: "https://bank.example".to_string(),
            api_url: "https://api.bank.example".to_string(),
            store_path: Some(dir.path().join("store.json")),
        };
        config.save_to(&path).unwrap();

        assert_eq!(Config::load_from(&path).unwrap(), config);
    }

    #[test]
    fn test_partial_config_fills_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        std::fs::write(&path, r#"{"domain_url":"https://bank.example"}"#).unwrap();

        let config = Config::load_from(&path).unwrap();
        assert_eq!(config.domain_url, "https://bank.example");
        assert_eq!(config.api_url, "http://localhost:8080");
        assert_eq!(config.store_path, None);
    }

    #[test]
    fn test_env_overrides() {
        let mut config = Config::default();
        config.apply_env_overrides(|key| match key {
            DOMAIN_URL_ENV => Some("https://override.example".to_string()),
            API_URL_ENV => Some(String::new()),
            _ => None,
        });
        assert_eq!(config.domain_url, "https://override.example");
        // Empty values are ignored
        assert_eq!(config.api_url, "http://localhost:8080");
    }

    #[test]
    fn test_store_path_override_and_targets() {
        let config = Config {
            store_path: Some(PathBuf::from("/tmp/bankgate-test/session.json")),
            ..Config::default()
        };
        assert_eq!(
            config.store_path().unwrap(),
            PathBuf::from("/tmp/bankgate-test/session.json")
        );
        assert_eq!(
            config.targets().otp_entry,
            "http://localhost:8081/authentication/OTP.html"
        );
    }
}
