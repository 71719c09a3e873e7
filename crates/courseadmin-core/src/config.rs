//! Application configuration management.
//!
//! This module handles loading the console configuration: the
//! API location and token, cache freshness and notification timing.
//!
//! Configuration is stored at `~/.config/courseadmin/config.json`.
//! `COURSEADMIN_API_URL` and `COURSEADMIN_TOKEN` override the file.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use chrono::Duration;
use serde::{Deserialize, Serialize};

/// Application name used for config/log directory paths
pub const APP_NAME: &str = "courseadmin";

/// Config file name
const CONFIG_FILE: &str = "config.json";

const ENV_API_URL: &str = "COURSEADMIN_API_URL";
const ENV_TOKEN: &str = "COURSEADMIN_TOKEN";

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub api_base_url: String,
    pub api_token: Option<String>,
    pub stale_minutes: i64,
    pub notification_seconds: i64,
    pub page_size: u32,
    pub default_section_id: Option<String>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            api_base_url: "http://localhost:8080/api/admin".to_string(),
            api_token: None,
            stale_minutes: 5,
            notification_seconds: 4,
            page_size: crate::models::DEFAULT_PAGE_SIZE,
            default_section_id: None,
        }
    }
}

impl Config {
    /// Load the config file (defaults when absent) and apply environment
    /// overrides.
    pub fn load() -> Result<Self> {
        let path = Self::config_path()?;
        let mut config = if path.exists() {
            Self::load_from(&path)?
        } else {
            Self::default()
        };
        config.apply_overrides(|name| std::env::var(name).ok());
        Ok(config)
    }

    fn load_from(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file {}", path.display()))?;
        serde_json::from_str(&contents)
            .with_context(|| format!("Failed to parse config file {}", path.display()))
    }

    fn apply_overrides(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        if let Some(url) = lookup(ENV_API_URL).filter(|v| !v.is_empty()) {
            self.api_base_url = url;
        }
        if let Some(token) = lookup(ENV_TOKEN).filter(|v| !v.is_empty()) {
            self.api_token = Some(token);
        }
    }

    fn config_path() -> Result<PathBuf> {
        let config_dir = dirs::config_dir()
            .ok_or_else(|| anyhow::anyhow!("Could not find config directory"))?;
        Ok(config_dir.join(APP_NAME).join(CONFIG_FILE))
    }

    /// Directory for the log file.
    pub fn log_dir(&self) -> Result<PathBuf> {
        let cache_dir = dirs::cache_dir()
            .ok_or_else(|| anyhow::anyhow!("Could not find cache directory"))?;
        Ok(cache_dir.join(APP_NAME))
    }

    pub fn stale_after(&self) -> Duration {
        Duration::minutes(self.stale_minutes.max(0))
    }

    pub fn notification_ttl(&self) -> Duration {
        Duration::seconds(self.notification_seconds.max(1))
    }
}
