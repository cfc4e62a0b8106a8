//! Application Configuration
//!
//! Loads the Baidu OCR credentials from the user config directory. The
//! config file is read-only for this program; it is never created or
//! rewritten here.

use std::fs;
use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::error::{Error, Result};

fn default_timeout_secs() -> u64 {
    10
}

/// Application configuration
#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    /// Baidu application id. Required present, unused by the request flow.
    pub app_id: String,
    pub api_key: String,
    pub sec_key: String,
    /// Per-request HTTP timeout in seconds.
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

impl AppConfig {
    /// Get the config file path: `<config dir>/clipocr/config.toml`
    pub fn config_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("clipocr")
            .join("config.toml")
    }

    /// Load configuration from the default location.
    pub fn load_default() -> Result<Self> {
        Self::load(&Self::config_path())
    }

    /// Load configuration from an explicit path.
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Err(Error::ConfigNotFound(path.to_path_buf()));
        }
        let content = fs::read_to_string(path)?;
        let config: AppConfig = toml::from_str(&content)?;
        Ok(config)
    }
}
