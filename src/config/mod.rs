// SPDX-License-Identifier: MPL-2.0
//! Retry policy configuration, including loading and saving user settings
//! to a `retry.toml` file.
//!
//! # Examples
//!
//! ```no_run
//! use retry_lens::config::{self, RetryConfig};
//!
//! // Load existing configuration
//! let mut config = config::load().unwrap_or_default();
//!
//! // Modify a setting
//! config.max_retries = 5;
//!
//! // Save the modified configuration
//! config::save(&config).expect("Failed to save config");
//! ```

use crate::domain::MaxRetries;
use crate::error::Result;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

mod defaults;

pub use defaults::{
    DEFAULT_CONNECTIVITY_ENABLED, DEFAULT_MAX_RETRIES, DEFAULT_RETRY_DELAY_MS,
    MAX_MAX_RETRIES, MAX_RETRY_DELAY_MS, MIN_MAX_RETRIES, MIN_RETRY_DELAY_MS,
};

const CONFIG_FILE: &str = "retry.toml";
const APP_NAME: &str = "RetryLens";

/// Configuration surface of the retry policy.
///
/// Raw values are stored as plain integers so the file stays hand-editable;
/// the typed accessors ([`RetryConfig::max_retries`],
/// [`RetryConfig::retry_delay`]) clamp out-of-range values instead of
/// rejecting the file.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RetryConfig {
    /// Maximum number of automatic retries per bound resource.
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,

    /// Fixed delay between a failure and its retry attempt, in milliseconds.
    /// Despite the historical docs, there is no exponential backoff: every
    /// attempt waits the same delay.
    #[serde(default = "default_retry_delay_ms")]
    pub retry_delay_ms: u64,

    /// Whether the offline state pre-empts load attempts.
    #[serde(default = "default_connectivity_enabled")]
    pub connectivity_enabled: bool,
}

fn default_max_retries() -> u32 {
    DEFAULT_MAX_RETRIES
}

fn default_retry_delay_ms() -> u64 {
    DEFAULT_RETRY_DELAY_MS
}

fn default_connectivity_enabled() -> bool {
    DEFAULT_CONNECTIVITY_ENABLED
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_retries: DEFAULT_MAX_RETRIES,
            retry_delay_ms: DEFAULT_RETRY_DELAY_MS,
            connectivity_enabled: DEFAULT_CONNECTIVITY_ENABLED,
        }
    }
}

impl RetryConfig {
    /// The retry budget, clamped to the valid range.
    #[must_use]
    pub fn max_retries(&self) -> MaxRetries {
        MaxRetries::new(self.max_retries)
    }

    /// The per-attempt retry delay, clamped to the valid range.
    #[must_use]
    pub fn retry_delay(&self) -> Duration {
        Duration::from_millis(
            self.retry_delay_ms
                .clamp(MIN_RETRY_DELAY_MS, MAX_RETRY_DELAY_MS),
        )
    }
}

fn get_default_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|mut path| {
        path.push(APP_NAME);
        path.push(CONFIG_FILE);
        path
    })
}

/// Loads the configuration from the platform config directory, falling back
/// to defaults when no file exists.
pub fn load() -> Result<RetryConfig> {
    if let Some(path) = get_default_config_path() {
        if path.exists() {
            return load_from_path(&path);
        }
    }
    Ok(RetryConfig::default())
}

/// Saves the configuration to the platform config directory.
pub fn save(config: &RetryConfig) -> Result<()> {
    if let Some(path) = get_default_config_path() {
        return save_to_path(config, &path);
    }
    Ok(())
}

/// Loads the configuration from a specific path.
pub fn load_from_path(path: &Path) -> Result<RetryConfig> {
    let content = fs::read_to_string(path)?;
    let config = toml::from_str(&content)?;
    Ok(config)
}

/// Saves the configuration to a specific path, creating parent directories
/// as needed.
pub fn save_to_path(config: &RetryConfig, path: &Path) -> Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    let content = toml::to_string_pretty(config)?;
    fs::write(path, content)?;
    Ok(())
}
