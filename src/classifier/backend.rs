use std::sync::Arc;

use super::error::BackendError;
use super::types::Prediction;

/// The capability that turns text into sentiment candidates.
///
/// Implementations receive text already truncated by the classifier and
/// return candidates best-first; only the first one is used.
pub trait SentimentBackend {
    fn predict(&self, text: &str) -> Result<Vec<Prediction>, BackendError>;
}

impl<B: SentimentBackend + ?Sized> SentimentBackend for &B {
    fn predict(&self, text: &str) -> Result<Vec<Prediction>, BackendError> {
        (**self).predict(text)
    }
}

impl<B: SentimentBackend + ?Sized> SentimentBackend for Box<B> {
    fn predict(&self, text: &str) -> Result<Vec<Prediction>, BackendError> {
        (**self).predict(text)
    }
}

impl<B: SentimentBackend + ?Sized> SentimentBackend for Arc<B> {
    fn predict(&self, text: &str) -> Result<Vec<Prediction>, BackendError> {
        (**self).predict(text)
    }
}

/// Any `Fn(&str) -> Result<Vec<Prediction>, BackendError>` is a backend.
pub struct FnBackend<F>(pub F);

impl<F> SentimentBackend for FnBackend<F>
where
    F: Fn(&str) -> Result<Vec<Prediction>, BackendError>,
{
    fn predict(&self, text: &str) -> Result<Vec<Prediction>, BackendError> {
        (self.0)(text)
    }
}
