//! Service configuration.
//!
//! Most tuning knobs of the transcription pipeline (language, beam width,
//! thread count, VAD window) are compiled-in constants owned by the modules
//! that use them. The config file only covers what an operator genuinely
//! needs to vary per deployment: bind address, model tier, model directory
//! and whether to expose Swagger UI.

use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::info;

use crate::engine::WhisperModel;

/// Environment variable overriding the configured model tier.
pub const MODEL_ENV_VAR: &str = "WHISPER_MODEL";

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to find data directory")]
    NoDataDir,

    #[error("Failed to read config file: {0}")]
    ReadError(#[from] std::io::Error),

    #[error("Failed to parse config: {0}")]
    ParseError(#[from] toml::de::Error),

    #[error("Unknown model tier '{0}' (expected tiny, base, small, medium or large-v3)")]
    UnknownModel(String),
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Config {
    /// Address the HTTP server binds to
    #[serde(default = "default_bind")]
    pub bind: String,

    /// Whisper model tier (tiny, base, small, medium, large-v3)
    #[serde(default = "default_model")]
    pub model: String,

    /// Directory holding GGML model files; defaults to the platform data dir
    #[serde(default)]
    pub model_dir: Option<PathBuf>,

    /// Serve Swagger UI at /swagger-ui
    #[serde(default)]
    pub swagger_ui: bool,
}

fn default_bind() -> String {
    "127.0.0.1:8090".to_string()
}

fn default_model() -> String {
    "small".to_string()
}

impl Default for Config {
    fn default() -> Self {
        Self {
            bind: default_bind(),
            model: default_model(),
            model_dir: None,
            swagger_ui: false,
        }
    }
}

impl Config {
    /// Load configuration from an optional TOML file, then apply the
    /// `WHISPER_MODEL` environment override.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let mut config = match path {
            Some(path) => {
                let content = fs::read_to_string(path)?;
                info!("Loaded config from {}", path.display());
                toml::from_str(&content)?
            }
            None => Self::default(),
        };

        if let Ok(model) = std::env::var(MODEL_ENV_VAR) {
            if !model.is_empty() {
                info!("Model tier overridden by {}: {}", MODEL_ENV_VAR, model);
                config.model = model;
            }
        }

        Ok(config)
    }

    /// Platform data directory for sttd (models live under `<data>/models`).
    pub fn data_dir() -> Result<PathBuf, ConfigError> {
        ProjectDirs::from("dev", "sttd", "sttd")
            .map(|dirs| dirs.data_dir().to_path_buf())
            .ok_or(ConfigError::NoDataDir)
    }

    /// Directory holding GGML model files.
    pub fn models_dir(&self) -> Result<PathBuf, ConfigError> {
        match &self.model_dir {
            Some(dir) => Ok(dir.clone()),
            None => Ok(Self::data_dir()?.join("models")),
        }
    }

    /// Resolve the configured model tier.
    pub fn model_tier(&self) -> Result<WhisperModel, ConfigError> {
        WhisperModel::from_str(&self.model)
            .ok_or_else(|| ConfigError::UnknownModel(self.model.clone()))
    }

    /// Full path of the configured GGML model file.
    pub fn model_path(&self) -> Result<PathBuf, ConfigError> {
        Ok(self.models_dir()?.join(self.model_tier()?.filename()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = Config::default();
        assert_eq!(config.bind, "127.0.0.1:8090");
        assert_eq!(config.model, "small");
        assert!(config.model_dir.is_none());
        assert!(!config.swagger_ui);
    }

    #[test]
    fn test_parse_partial_toml() {
        let config: Config = toml::from_str("model = \"tiny\"").unwrap();
        assert_eq!(config.model, "tiny");
        assert_eq!(config.bind, "127.0.0.1:8090");
    }

    #[test]
    fn test_parse_full_toml() {
        let config: Config = toml::from_str(
            r#"
            bind = "0.0.0.0:9000"
            model = "medium"
            model_dir = "/srv/models"
            swagger_ui = true
            "#,
        )
        .unwrap();
        assert_eq!(config.bind, "0.0.0.0:9000");
        assert_eq!(config.model, "medium");
        assert_eq!(config.model_dir, Some(PathBuf::from("/srv/models")));
        assert!(config.swagger_ui);
        assert_eq!(
            config.model_path().unwrap(),
            PathBuf::from("/srv/models/ggml-medium.bin")
        );
    }

    #[test]
    fn test_env_override() {
        // Sole test touching WHISPER_MODEL; unit tests share a process, so
        // keep every mutation of the variable inside this one function.
        std::env::set_var(MODEL_ENV_VAR, "tiny");
        let config = Config::load(None).unwrap();
        assert_eq!(config.model, "tiny");

        // Empty value is ignored, defaults stay
        std::env::set_var(MODEL_ENV_VAR, "");
        let config = Config::load(None).unwrap();
        assert_eq!(config.model, "small");

        std::env::remove_var(MODEL_ENV_VAR);
        let config = Config::load(None).unwrap();
        assert_eq!(config.model, "small");
    }

    #[test]
    fn test_unknown_model_tier() {
        let config = Config {
            model: "gigantic".to_string(),
            ..Default::default()
        };
        assert!(matches!(
            config.model_tier(),
            Err(ConfigError::UnknownModel(_))
        ));
    }
}
