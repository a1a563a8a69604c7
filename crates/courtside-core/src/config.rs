//! Client configuration management.
//!
//! This module handles loading and saving the client configuration: the
//! backend base URL, cache TTL, retry policy, timeouts and the optional admin
//! token used for mutating calls.
//!
//! Configuration is stored at `~/.config/courtside/config.json`. Environment
//! variables override whatever the file says.

use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

/// Application name used for config directory paths
const APP_NAME: &str = "courtside";

/// Config file name
const CONFIG_FILE: &str = "config.json";

/// Production backend for the club site.
pub const DEFAULT_BASE_URL: &str = "https://backendbadminton.pythonanywhere.com/api";

/// Listings change a few times a week; 15 minutes keeps pages snappy.
const DEFAULT_CACHE_TTL_SECS: u64 = 15 * 60;

const DEFAULT_MAX_RETRIES: u32 = 2;

const DEFAULT_RETRY_BACKOFF_MS: u64 = 1000;

const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 30;

const DEFAULT_SLOW_REQUEST_WARN_MS: u64 = 1000;

pub const ENV_API_URL: &str = "COURTSIDE_API_URL";
pub const ENV_API_TOKEN: &str = "COURTSIDE_API_TOKEN";
pub const ENV_CACHE_TTL_SECS: &str = "COURTSIDE_CACHE_TTL_SECS";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub base_url: String,
    pub cache_ttl_secs: u64,
    /// Retries after the first attempt for reads.
    pub max_retries: u32,
    pub retry_backoff_ms: u64,
    pub request_timeout_secs: u64,
    pub slow_request_warn_ms: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub auth_token: Option<String>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            cache_ttl_secs: DEFAULT_CACHE_TTL_SECS,
            max_retries: DEFAULT_MAX_RETRIES,
            retry_backoff_ms: DEFAULT_RETRY_BACKOFF_MS,
            request_timeout_secs: DEFAULT_REQUEST_TIMEOUT_SECS,
            slow_request_warn_ms: DEFAULT_SLOW_REQUEST_WARN_MS,
            auth_token: None,
        }
    }
}

impl Config {
    /// Load from the user config file (if any), then apply environment overrides.
    pub fn load() -> Result<Self> {
        let mut config = Self::load_from(&Self::config_path()?)?;
        config.apply_overrides(|name| std::env::var(name).ok())?;
        Ok(config)
    }

    pub fn load_from(path: &Path) -> Result<Self> {
        if path.exists() {
            let contents = std::fs::read_to_string(path)
                .with_context(|| format!("Failed to read config file: {}", path.display()))?;
            serde_json::from_str(&contents)
                .with_context(|| format!("Failed to parse config file: {}", path.display()))
        } else {
            Ok(Self::default())
        }
    }

    pub fn save(&self) -> Result<()> {
        self.save_to(&Self::config_path()?)
    }

    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let contents = serde_json::to_string_pretty(self)?;
        std::fs::write(path, contents)?;
        Ok(())
    }

    pub fn config_path() -> Result<PathBuf> {
        let config_dir = dirs::config_dir()
            .ok_or_else(|| anyhow::anyhow!("Could not find config directory"))?;
        Ok(config_dir.join(APP_NAME).join(CONFIG_FILE))
    }

    /// Apply overrides from a variable lookup (normally the process environment).
    pub fn apply_overrides<F>(&mut self, lookup: F) -> Result<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(url) = lookup(ENV_API_URL).filter(|v| !v.trim().is_empty()) {
            self.base_url = url.trim().to_string();
        }
        if let Some(token) = lookup(ENV_API_TOKEN).filter(|v| !v.trim().is_empty()) {
            self.auth_token = Some(token.trim().to_string());
        }
        if let Some(ttl) = lookup(ENV_CACHE_TTL_SECS) {
            self.cache_ttl_secs = ttl
                .trim()
                .parse()
                .with_context(|| format!("{} must be a whole number of seconds", ENV_CACHE_TTL_SECS))?;
        }
        Ok(())
    }

    pub fn cache_ttl(&self) -> Duration {
        Duration::from_secs(self.cache_ttl_secs)
    }

    pub fn retry_backoff(&self) -> Duration {
        Duration::from_millis(self.retry_backoff_ms)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    pub fn slow_request_threshold(&self) -> Duration {
        Duration::from_millis(self.slow_request_warn_ms)
    }
}
