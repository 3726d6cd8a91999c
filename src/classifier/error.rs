use thiserror::Error;

/// Failure reported by a classification backend for one text.
#[derive(Debug, Error)]
pub enum BackendError {
    #[error("sentiment inference failed: {reason}")]
    Inference { reason: String },

    #[error("tokenization failed: {reason}")]
    Tokenization { reason: String },

    #[error("backend returned no predictions")]
    EmptyPrediction,

    #[error("backend returned unknown label '{label}'")]
    UnknownLabel { label: String },

    #[error("backend returned score {score} outside [0, 1]")]
    ScoreOutOfRange { score: f32 },

    #[error("sentiment backend not available: {reason}")]
    Unavailable { reason: String },
}

impl From<candle_core::Error> for BackendError {
    fn from(err: candle_core::Error) -> Self {
        BackendError::Inference {
            reason: err.to_string(),
        }
    }
}

/// Errors returned by [`SentimentClassifier`](super::SentimentClassifier).
#[derive(Debug, Error)]
pub enum ClassifyError {
    #[error("invalid argument: {reason}")]
    InvalidArgument { reason: String },

    #[error("classification failed for document {index}: {source}")]
    ClassificationFailure {
        index: usize,
        #[source]
        source: BackendError,
    },
}

impl ClassifyError {
    pub(crate) fn invalid(reason: impl Into<String>) -> Self {
        ClassifyError::InvalidArgument {
            reason: reason.into(),
        }
    }

    /// Index of the document that failed, if any.
    pub fn failed_index(&self) -> Option<usize> {
        match self {
            ClassifyError::ClassificationFailure { index, .. } => Some(*index),
            ClassifyError::InvalidArgument { .. } => None,
        }
    }
}
