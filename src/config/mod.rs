//! Configuration management for the Bookstall client

pub mod schema;

pub use schema::Config;

use crate::error::{CartError, CartResult};
use std::path::PathBuf;
use tokio::fs;
use tracing::debug;

/// Configuration manager
pub struct ConfigManager {
    config_path: PathBuf,
}

impl ConfigManager {
    /// Create a config manager with default path
    pub fn new() -> Self {
        Self {
            config_path: Self::default_config_path(),
        }
    }

    /// Create a config manager with a custom path
    pub fn with_path(path: PathBuf) -> Self {
        Self { config_path: path }
    }

    /// Get the default config file path
    pub fn default_config_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("bookstall")
            .join("config.toml")
    }

    /// Load configuration, falling back to defaults when no file exists
    pub async fn load(&self) -> CartResult<Config> {
        if !self.config_path.exists() {
            debug!("No config file, using defaults");
            return Ok(Config::default());
        }

        let content = fs::read_to_string(&self.config_path).await.map_err(|e| {
            CartError::io(
                format!("reading config file {}", self.config_path.display()),
                e,
            )
        })?;

        let config: Config = toml::from_str(&content)?;
        Ok(config)
    }

    /// Save configuration to disk
    pub async fn save(&self, config: &Config) -> CartResult<()> {
        if let Some(parent) = self.config_path.parent() {
            fs::create_dir_all(parent)
                .await
                .map_err(|e| CartError::io("creating config directory", e))?;
        }

        let content = toml::to_string_pretty(config)?;
        fs::write(&self.config_path, content).await.map_err(|e| {
            CartError::io(
                format!("writing config file {}", self.config_path.display()),
                e,
            )
        })?;

        Ok(())
    }
}

impl Default for ConfigManager {
    fn default() -> Self {
        Self::new()
    }
}
