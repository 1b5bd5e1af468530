//! Application configuration management.
//!
//! This module handles loading the application configuration:
//! the endpoint base URL, cache freshness window, page sizes and request
//! timeout.
//!
//! Configuration is stored at `~/.config/wardcache/config.json`. Environment
//! variables override file values.

use std::path::PathBuf;
use std::time::Duration;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::api::{DEFAULT_BASE_URL, DEFAULT_REQUEST_TIMEOUT_SECS};
use crate::cache::{StoreConfig, DEFAULT_FRESHNESS_MINUTES, INITIAL_PAGE_SIZE, PAGE_SIZE};

/// Application name used for config directory paths
const APP_NAME: &str = "wardcache";

/// Config file name
const CONFIG_FILE: &str = "config.json";

/// Overrides `base_url`
pub const ENV_BASE_URL: &str = "WARDCACHE_BASE_URL";

/// Overrides `freshness_minutes`
pub const ENV_FRESHNESS_MINUTES: &str = "WARDCACHE_FRESHNESS_MINUTES";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub base_url: String,
    pub freshness_minutes: u64,
    pub initial_page_size: usize,
    pub page_size: usize,
    pub request_timeout_secs: u64,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            freshness_minutes: DEFAULT_FRESHNESS_MINUTES,
            initial_page_size: INITIAL_PAGE_SIZE,
            page_size: PAGE_SIZE,
            request_timeout_secs: DEFAULT_REQUEST_TIMEOUT_SECS,
        }
    }
}

impl Config {
    /// Load the config file (defaults if absent), then apply environment overrides.
    pub fn load() -> Result<Self> {
        let path = Self::config_path()?;
        let mut config = if path.exists() {
            let contents = std::fs::read_to_string(&path)
                .with_context(|| format!("Failed to read config file: {}", path.display()))?;
            Self::from_json(&contents)?
        } else {
            Self::default()
        };
        config.apply_overrides(|key| std::env::var(key).ok());
        Ok(config)
    }

    pub fn from_json(contents: &str) -> Result<Self> {
        serde_json::from_str(contents).context("Failed to parse config file")
    }

    pub fn config_path() -> Result<PathBuf> {
        let config_dir = dirs::config_dir()
            .ok_or_else(|| anyhow::anyhow!("Could not find config directory"))?;
        Ok(config_dir.join(APP_NAME).join(CONFIG_FILE))
    }

    /// Apply overrides from `lookup`, ignoring values that do not parse.
    pub fn apply_overrides<F: Fn(&str) -> Option<String>>(&mut self, lookup: F) {
        if let Some(url) = lookup(ENV_BASE_URL).filter(|u| !u.trim().is_empty()) {
            self.base_url = url;
        }
        if let Some(raw) = lookup(ENV_FRESHNESS_MINUTES) {
            match raw.trim().parse() {
                Ok(minutes) => self.freshness_minutes = minutes,
                Err(e) => {
                    warn!(value = %raw, error = %e, "Ignoring invalid {}", ENV_FRESHNESS_MINUTES)
                }
            }
        }
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    pub fn store_config(&self) -> StoreConfig {
        StoreConfig {
            freshness_window: Duration::from_secs(self.freshness_minutes.saturating_mul(60)),
            initial_page_size: self.initial_page_size,
            page_size: self.page_size.max(1),
        }
    }
}
