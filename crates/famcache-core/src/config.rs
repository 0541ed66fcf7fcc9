//! Application configuration management.
//!
//! This module handles loading and saving the application configuration,
//! which includes the API root, an optional bearer token and the cache's
//! TTL class durations.
//!
//! Configuration is stored at `~/.config/famcache/config.json`.

use std::path::PathBuf;

use anyhow::{Context, Result};
use chrono::Duration;
use serde::{Deserialize, Serialize};

use crate::api::DEFAULT_API_BASE_URL;
use crate::cache::{FreshnessPolicy, SoftRefresh, TtlClass};

/// Application name used for config directory paths
const APP_NAME: &str = "famcache";

/// Config file name
const CONFIG_FILE: &str = "config.json";

/// Environment override for `api_base_url`
pub const ENV_API_URL: &str = "FAMCACHE_API_URL";

/// Environment override for `token`
pub const ENV_TOKEN: &str = "FAMCACHE_TOKEN";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Config {
    #[serde(default = "default_api_base_url")]
    pub api_base_url: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub token: Option<String>,
    #[serde(default)]
    pub cache: CacheConfig,
}

fn default_api_base_url() -> String {
    DEFAULT_API_BASE_URL.to_string()
}

impl Default for Config {
    fn default() -> Self {
        Self {
            api_base_url: default_api_base_url(),
            token: None,
            cache: CacheConfig::default(),
        }
    }
}

/// TTL class durations in seconds, plus the soft-refresh rule.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CacheConfig {
    #[serde(default = "default_short_secs")]
    pub short_secs: u64,
    #[serde(default = "default_medium_secs")]
    pub medium_secs: u64,
    #[serde(default = "default_long_secs")]
    pub long_secs: u64,
    #[serde(default)]
    pub soft_refresh: SoftRefreshSetting,
}

fn default_short_secs() -> u64 {
    TtlClass::Short.default_duration().num_seconds() as u64
}

fn default_medium_secs() -> u64 {
    TtlClass::Medium.default_duration().num_seconds() as u64
}

fn default_long_secs() -> u64 {
    TtlClass::Long.default_duration().num_seconds() as u64
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            short_secs: default_short_secs(),
            medium_secs: default_medium_secs(),
            long_secs: default_long_secs(),
            soft_refresh: SoftRefreshSetting::default(),
        }
    }
}

/// When a fresh read should also start a background refresh.
///
/// ```json
/// {"mode": "fixed", "secs": 120}
/// {"mode": "proportional", "fraction": 0.4}
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "mode", rename_all = "lowercase")]
pub enum SoftRefreshSetting {
    Fixed { secs: u64 },
    Proportional { fraction: f64 },
}

impl Default for SoftRefreshSetting {
    fn default() -> Self {
        SoftRefreshSetting::Fixed {
            secs: default_short_secs(),
        }
    }
}

impl CacheConfig {
    pub fn to_policy(&self) -> Result<FreshnessPolicy> {
        let soft = match self.soft_refresh {
            SoftRefreshSetting::Fixed { secs } => SoftRefresh::Fixed(seconds(secs)?),
            SoftRefreshSetting::Proportional { fraction } => {
                if !(0.0..=1.0).contains(&fraction) {
                    anyhow::bail!("soft_refresh fraction must be between 0 and 1, got {}", fraction);
                }
                SoftRefresh::Proportional(fraction)
            }
        };

        Ok(FreshnessPolicy::new()
            .with_class_duration(TtlClass::Short, seconds(self.short_secs)?)
            .with_class_duration(TtlClass::Medium, seconds(self.medium_secs)?)
            .with_class_duration(TtlClass::Long, seconds(self.long_secs)?)
            .with_soft_refresh(soft))
    }
}

fn seconds(secs: u64) -> Result<Duration> {
    let secs = i64::try_from(secs).context("Duration out of range")?;
    Duration::try_seconds(secs).context("Duration out of range")
}

impl Config {
    pub fn load() -> Result<Self> {
        let path = Self::config_path()?;
        if path.exists() {
            let contents = std::fs::read_to_string(&path)
                .with_context(|| format!("Failed to read {}", path.display()))?;
            Self::from_json(&contents)
        } else {
            Ok(Self::default())
        }
    }

    pub fn from_json(contents: &str) -> Result<Self> {
        serde_json::from_str(contents).context("Invalid config file")
    }

    pub fn save(&self) -> Result<()> {
        let path = Self::config_path()?;
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

    /// Apply `FAMCACHE_API_URL` and `FAMCACHE_TOKEN` from the process environment.
    pub fn apply_env(&mut self) {
        self.apply_overrides(|name| std::env::var(name).ok());
    }

    fn apply_overrides(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        if let Some(url) = lookup(ENV_API_URL).filter(|v| !v.trim().is_empty()) {
            self.api_base_url = url;
        }
        if let Some(token) = lookup(ENV_TOKEN).filter(|v| !v.trim().is_empty()) {
            self.token = Some(token);
        }
    }
}
