// SPDX-FileCopyrightText: 2025 Joost van der Laan <joost@fashionunited.com>
//
// SPDX-License-Identifier: AGPL-3.0-only

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

pub const DEFAULT_EXCHANGE_RATE_API_URL: &str = "https://api.exchangerate-api.com/v4/latest";
pub const DEFAULT_RECIPE_API_URL: &str = "http://localhost:5000";

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub exchange_rate_api_url: String,
    pub rate_cache_ttl_secs: u64,
    /// Keep the fallback table in the cache for a full TTL after a failed fetch.
    pub cache_fallback_rates: bool,
    pub recipe_api_url: String,
    pub request_timeout_secs: u64,
    pub default_currency: String,
    pub preferences_path: PathBuf,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            exchange_rate_api_url: DEFAULT_EXCHANGE_RATE_API_URL.to_string(),
            rate_cache_ttl_secs: 3600,
            cache_fallback_rates: false,
            recipe_api_url: DEFAULT_RECIPE_API_URL.to_string(),
            request_timeout_secs: 10,
            default_currency: "INR".to_string(),
            preferences_path: PathBuf::from("preferences.toml"),
        }
    }
}

impl Config {
    pub fn rate_cache_ttl(&self) -> Duration {
        Duration::from_secs(self.rate_cache_ttl_secs)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    /// Apply `RECIPE_API_URL`, `EXCHANGE_RATE_API_URL` and `RECIPE_FX_PREFERENCES`.
    pub fn apply_env_overrides(&mut self) {
        if let Ok(url) = env::var("RECIPE_API_URL") {
            self.recipe_api_url = url;
        }
        if let Ok(url) = env::var("EXCHANGE_RATE_API_URL") {
            self.exchange_rate_api_url = url;
        }
        if let Ok(path) = env::var("RECIPE_FX_PREFERENCES") {
            self.preferences_path = PathBuf::from(path);
        }
    }
}

fn get_config_path() -> PathBuf {
    let mut path = PathBuf::from(env!("CARGO_MANIFEST_DIR"));
    path.push("config.toml");
    path
}

pub fn load_config_from(path: &Path) -> Result<Config> {
    let config_str = fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file {}", path.display()))?;
    let config: Config = toml::from_str(&config_str).context("Failed to parse config file")?;
    Ok(config)
}

/// Load `config.toml`, falling back to defaults when the file does not exist.
pub fn load_config() -> Result<Config> {
    let config_path = get_config_path();
    let mut config = if config_path.exists() {
        load_config_from(&config_path)?
    } else {
        tracing::debug!("No config file at {}, using defaults", config_path.display());
        Config::default()
    };
    config.apply_env_overrides();
    Ok(config)
}

pub fn save_config_to(config: &Config, path: &Path) -> Result<()> {
    let config_str = toml::to_string_pretty(config)?;
    fs::write(path, config_str)?;
    Ok(())
}
