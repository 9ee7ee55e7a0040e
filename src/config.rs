//! Application configuration management.
//!
//! Holds the REST API version used for query endpoints. Stored at
//! `~/.config/sfreader/config.json`; the `SFREADER_API_VERSION`
//! environment variable overrides the file.

use std::path::PathBuf;

use anyhow::Result;
use serde::{Deserialize, Serialize};

use crate::api::DEFAULT_API_VERSION;

/// Application name used for the config directory path
const APP_NAME: &str = "sfreader";

/// Config file name
const CONFIG_FILE: &str = "config.json";

/// Environment override for the API version
const API_VERSION_ENV: &str = "SFREADER_API_VERSION";

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub api_version: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            api_version: DEFAULT_API_VERSION.to_string(),
        }
    }
}

impl Config {
    pub fn load() -> Result<Self> {
        let path = Self::config_path()?;
        if path.exists() {
            let contents = std::fs::read_to_string(&path)?;
            Ok(serde_json::from_str(&contents)?)
        } else {
            Ok(Self::default())
        }
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

    /// Effective API version, with the environment override applied.
    pub fn api_version(&self) -> String {
        std::env::var(API_VERSION_ENV).unwrap_or_else(|_| self.api_version.clone())
    }

    fn config_path() -> Result<PathBuf> {
        let config_dir = dirs::config_dir()
            .ok_or_else(|| anyhow::anyhow!("Could not find config directory"))?;
        Ok(config_dir.join(APP_NAME).join(CONFIG_FILE))
    }
}
