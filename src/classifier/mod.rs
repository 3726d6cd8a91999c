//! Document-level sentiment classification.
//!
//! [`SentimentClassifier`] owns a [`SentimentBackend`] and turns a list of
//! documents into one [`ClassificationResult`] per document, in input order.
//! Each document is truncated to [`DEFAULT_MAX_CHARS`] characters before it
//! reaches the backend; the returned `text` is always the full original.
//!
//! A call either returns every result or fails as a whole.

pub mod backend;
pub mod error;
#[cfg(any(test, feature = "mock"))]
pub mod mock;
pub mod pool;
pub mod types;


pub use backend::{FnBackend, SentimentBackend};
pub use error::{BackendError, ClassifyError};
#[cfg(any(test, feature = "mock"))]
pub use mock::MockBackend;
pub use types::{ClassificationResult, Label, Prediction, UnknownLabel};

use serde_json::Value;
use tracing::{debug, trace, warn};

use crate::config::Config;

/// Characters of each document passed to the backend.
pub const DEFAULT_MAX_CHARS: usize = 512;

/// Returns the prefix of `text` holding at most `max_chars` characters.
///
/// Counts Unicode scalar values, so the cut never lands inside a multi-byte
/// character.
pub fn truncate_chars(text: &str, max_chars: usize) -> &str {
    match text.char_indices().nth(max_chars) {
        Some((byte_idx, _)) => &text[..byte_idx],
        None => text,
    }
}

/// Classifies documents with an injected backend.
pub struct SentimentClassifier<B> {
    backend: B,
    max_chars: usize,
}

impl<B: std::fmt::Debug> std::fmt::Debug for SentimentClassifier<B> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SentimentClassifier")
            .field("backend", &self.backend)
            .field("max_chars", &self.max_chars)
            .finish()
    }
}

impl<B: SentimentBackend> SentimentClassifier<B> {
    pub fn new(backend: B) -> Self {
        Self {
            backend,
            max_chars: DEFAULT_MAX_CHARS,
        }
    }

    /// Builds a classifier using the truncation length from `config`.
    pub fn from_config(backend: B, config: &Config) -> Self {
        Self::new(backend).with_max_chars(config.max_chars)
    }

    pub fn with_max_chars(mut self, max_chars: usize) -> Self {
        assert!(max_chars > 0, "max_chars must be greater than 0");
        self.max_chars = max_chars;
        self
    }

    pub fn max_chars(&self) -> usize {
        self.max_chars
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    pub fn into_backend(self) -> B {
        self.backend
    }

    /// Classifies every document, preserving order.
    ///
    /// Fails with [`ClassifyError::InvalidArgument`] for an empty slice and
    /// with [`ClassifyError::ClassificationFailure`] as soon as the backend
    /// fails on any document.
    pub fn classify<S: AsRef<str>>(
        &self,
        documents: &[S],
    ) -> Result<Vec<ClassificationResult>, ClassifyError> {
        if documents.is_empty() {
            return Err(ClassifyError::invalid(
                "must provide a non-empty list of documents",
            ));
        }

        debug!(
            documents = documents.len(),
            max_chars = self.max_chars,
            "Classifying documents"
        );

        let results = documents
            .iter()
            .enumerate()
            .map(|(index, document)| self.classify_document(index, document.as_ref()))
            .collect::<Result<Vec<_>, _>>()?;

        debug!(results = results.len(), "Classification complete");

        Ok(results)
    }

    /// Classifies dynamically typed input.
    ///
    /// `value` must be a non-empty JSON array of strings; `null`, any other
    /// JSON type, or a non-string element is an invalid argument.
    pub fn classify_json(&self, value: &Value) -> Result<Vec<ClassificationResult>, ClassifyError> {
        let documents = documents_from_json(value)?;
        self.classify(&documents)
    }

    /// Classifies a single document.
    pub fn classify_one(&self, document: &str) -> Result<ClassificationResult, ClassifyError> {
        self.classify_document(0, document)
    }

    pub(crate) fn classify_document(
        &self,
        index: usize,
        document: &str,
    ) -> Result<ClassificationResult, ClassifyError> {
        let truncated = truncate_chars(document, self.max_chars);

        trace!(
            index,
            chars = document.chars().count(),
            truncated_chars = truncated.chars().count(),
            "Predicting document"
        );

        let (label, score) = self
            .backend
            .predict(truncated)
            .and_then(first_candidate)
            .map_err(|source| {
                warn!(index, error = %source, "Sentiment backend failed");
                ClassifyError::ClassificationFailure { index, source }
            })?;

        Ok(ClassificationResult {
            text: document.to_string(),
            label,
            score,
        })
    }
}

/// Picks the first candidate and checks its label and score.
fn first_candidate(candidates: Vec<Prediction>) -> Result<(Label, f32), BackendError> {
    let first = candidates
        .into_iter()
        .next()
        .ok_or(BackendError::EmptyPrediction)?;

    let label = first
        .label
        .parse::<Label>()
        .map_err(|UnknownLabel(label)| BackendError::UnknownLabel { label })?;

    if !(0.0..=1.0).contains(&first.score) {
        return Err(BackendError::ScoreOutOfRange { score: first.score });
    }

    Ok((label, first.score))
}

pub(crate) fn documents_from_json(value: &Value) -> Result<Vec<&str>, ClassifyError> {
    let items = match value {
        Value::Null => return Err(ClassifyError::invalid("documents are missing")),
        Value::Array(items) => items,
        other => {
            return Err(ClassifyError::invalid(format!(
                "documents must be a list of strings, got {}",
                json_type_name(other)
            )));
        }
    };

    if items.is_empty() {
        return Err(ClassifyError::invalid(
            "must provide a non-empty list of documents",
        ));
    }

    items
        .iter()
        .enumerate()
        .map(|(index, item)| {
            item.as_str().ok_or_else(|| {
                ClassifyError::invalid(format!(
                    "document {} must be a string, got {}",
                    index,
                    json_type_name(item)
                ))
            })
        })
        .collect()
}

fn json_type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
