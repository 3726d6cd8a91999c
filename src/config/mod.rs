//! Environment-backed configuration.
//!
//! Every setting has a default. Override with `SENTIMENT_*` environment variables.

pub mod error;


pub use error::ConfigError;

use std::env;
use std::path::PathBuf;

use crate::classifier::DEFAULT_MAX_CHARS;
use crate::model::ModelConfig;

/// Runtime configuration loaded from environment variables.
///
/// Use [`Config::from_env`] to read `SENTIMENT_*` overrides on top of defaults.
#[derive(Debug, Clone)]
pub struct Config {
    /// Model directory (`config.json`, `model.safetensors`, `tokenizer.json`).
    /// `None` runs the model in stub mode.
    pub model_path: Option<PathBuf>,

    /// Characters of each document sent to the model. Default: `512`.
    pub max_chars: usize,

    /// Predictions in flight for concurrent classification. Default: `1`.
    pub workers: usize,

    /// Skip GPU probing even when a GPU feature is compiled in.
    pub force_cpu: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            model_path: None,
            max_chars: DEFAULT_MAX_CHARS,
            workers: 1,
            force_cpu: false,
        }
    }
}

impl Config {
    const ENV_MODEL_PATH: &'static str = "SENTIMENT_MODEL_PATH";
    const ENV_MAX_CHARS: &'static str = "SENTIMENT_MAX_CHARS";
    const ENV_WORKERS: &'static str = "SENTIMENT_WORKERS";
    const ENV_FORCE_CPU: &'static str = "SENTIMENT_FORCE_CPU";

    /// Loads configuration from environment variables (falling back to defaults).
    pub fn from_env() -> Result<Self, ConfigError> {
        let defaults = Self::default();

        Ok(Self {
            model_path: Self::parse_optional_path_from_env(Self::ENV_MODEL_PATH),
            max_chars: Self::parse_count_from_env(Self::ENV_MAX_CHARS, defaults.max_chars)?,
            workers: Self::parse_count_from_env(Self::ENV_WORKERS, defaults.workers)?,
            force_cpu: Self::parse_flag_from_env(Self::ENV_FORCE_CPU),
        })
    }

    /// Checks counts and the model directory (does not load anything).
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.max_chars == 0 {
            return Err(ConfigError::ZeroValue {
                name: Self::ENV_MAX_CHARS,
            });
        }

        if self.workers == 0 {
            return Err(ConfigError::ZeroValue {
                name: Self::ENV_WORKERS,
            });
        }

        if let Some(ref path) = self.model_path {
            if !path.exists() {
                return Err(ConfigError::PathNotFound { path: path.clone() });
            }
            if !path.is_dir() {
                return Err(ConfigError::NotADirectory { path: path.clone() });
            }
        }

        Ok(())
    }

    /// Model settings derived from this configuration.
    pub fn model_config(&self) -> ModelConfig {
        ModelConfig {
            model_path: self.model_path.clone(),
            force_cpu: self.force_cpu,
            ..Default::default()
        }
    }

    fn parse_count_from_env(name: &'static str, default: usize) -> Result<usize, ConfigError> {
        match env::var(name) {
            Ok(value) => {
                let count: usize =
                    value
                        .trim()
                        .parse()
                        .map_err(|e| ConfigError::InvalidNumber {
                            name,
                            value: value.clone(),
                            source: e,
                        })?;

                if count == 0 {
                    return Err(ConfigError::ZeroValue { name });
                }

                Ok(count)
            }
            Err(_) => Ok(default),
        }
    }

    fn parse_optional_path_from_env(var_name: &str) -> Option<PathBuf> {
        env::var(var_name)
            .ok()
            .map(|v| v.trim().to_string())
            .filter(|v| !v.is_empty())
            .map(PathBuf::from)
    }

    fn parse_flag_from_env(var_name: &str) -> bool {
        env::var(var_name)
            .map(|v| matches!(v.trim().to_ascii_lowercase().as_str(), "1" | "true" | "yes"))
            .unwrap_or(false)
    }
}
