//! Application configuration.

use comicforge_core::generation::{DEFAULT_ENDPOINT, DEFAULT_MODEL, RunwareConfig};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Environment variable that overrides the configured API key.
pub const API_KEY_ENV: &str = "RUNWARE_API_KEY";

/// Configuration errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("Invalid configuration: {0}")]
    Parse(String),
}

/// Settings loaded from `config.toml`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Blob store directory (defaults to `<local data dir>/comicforge/store`).
    pub data_dir: Option<PathBuf>,
    /// Runware API key.
    pub api_key: Option<String>,
    pub runware_endpoint: String,
    pub model: String,
    pub width: u32,
    pub height: u32,
    pub cfg_scale: Option<f32>,
    /// Where exports are written.
    pub export_dir: PathBuf,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            data_dir: None,
            api_key: None,
            runware_endpoint: DEFAULT_ENDPOINT.to_string(),
            model: DEFAULT_MODEL.to_string(),
            width: 1024,
            height: 1024,
            cfg_scale: None,
            export_dir: PathBuf::from("."),
        }
    }
}

impl AppConfig {
    /// Default config file location (`<config dir>/comicforge/config.toml`).
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join("comicforge").join("config.toml"))
    }

    /// Load configuration.
    ///
    /// An explicit `path` must exist. Without one, the default location is
    /// tried and a missing file yields defaults. `RUNWARE_API_KEY` is
    /// applied last.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let mut config = match path {
            Some(path) => Self::from_file(path)?,
            None => match Self::default_path() {
                Some(path) if path.exists() => Self::from_file(&path)?,
                _ => {
                    log::debug!("No config file found, using defaults");
                    Self::default()
                }
            },
        };
        config.apply_env_api_key(std::env::var(API_KEY_ENV).ok());
        Ok(config)
    }

    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let raw = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        log::debug!("Loading config from {}", path.display());
        Self::from_toml_str(&raw)
    }

    pub fn from_toml_str(raw: &str) -> Result<Self, ConfigError> {
        toml::from_str(raw).map_err(|e| ConfigError::Parse(e.to_string()))
    }

    /// Replace the API key with a non-blank environment value.
    pub fn apply_env_api_key(&mut self, value: Option<String>) {
        if let Some(key) = value.filter(|k| !k.trim().is_empty()) {
            self.api_key = Some(key);
        }
    }

    /// Connection settings for the image generation service.
    pub fn runware(&self) -> RunwareConfig {
        RunwareConfig {
            endpoint: self.runware_endpoint.clone(),
            api_key: self.api_key.clone().unwrap_or_default(),
            model: self.model.clone(),
            width: self.width,
            height: self.height,
            cfg_scale: self.cfg_scale,
            ..RunwareConfig::default()
        }
    }
}
