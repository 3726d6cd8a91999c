use std::path::PathBuf;
use thiserror::Error;

/// Errors raised while loading a [`SentimentModel`](super::SentimentModel).
#[derive(Debug, Error)]
pub enum ModelError {
    #[error("sentiment model not found at path: {path}")]
    ModelNotFound { path: PathBuf },

    #[error("failed to load sentiment model: {reason}")]
    ModelLoadFailed { reason: String },

    #[error("{device} device unavailable: {reason}")]
    DeviceUnavailable { device: String, reason: String },

    #[error("invalid model configuration: {reason}")]
    InvalidConfig { reason: String },
}

impl From<candle_core::Error> for ModelError {
    fn from(err: candle_core::Error) -> Self {
        ModelError::ModelLoadFailed {
            reason: err.to_string(),
        }
    }
}

impl From<std::io::Error> for ModelError {
    fn from(err: std::io::Error) -> Self {
        ModelError::ModelLoadFailed {
            reason: err.to_string(),
        }
    }
}
