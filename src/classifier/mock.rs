use parking_lot::Mutex;

use super::{BackendError, Prediction, SentimentBackend};

/// Marker that makes the mock answer NEGATIVE unless overridden.
pub const DEFAULT_NEGATIVE_MARKER: &str = "hate";

/// Deterministic backend for tests.
///
/// Labels text containing the negative marker (case-insensitive) as
/// NEGATIVE, everything else as POSITIVE, and records every text it
/// receives.
#[derive(Debug)]
pub struct MockBackend {
    negative_marker: String,
    fail_on_call: Option<usize>,
    fail_on_text: Option<String>,
    scripted: Option<Vec<Prediction>>,
    calls: Mutex<Vec<String>>,
}

impl Default for MockBackend {
    fn default() -> Self {
        Self {
            negative_marker: DEFAULT_NEGATIVE_MARKER.to_string(),
            fail_on_call: None,
            fail_on_text: None,
            scripted: None,
            calls: Mutex::new(Vec::new()),
        }
    }
}

impl MockBackend {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_negative_marker(mut self, marker: impl Into<String>) -> Self {
        self.negative_marker = marker.into().to_lowercase();
        self
    }

    /// Fails the call with zero-based number `call`.
    pub fn failing_on(mut self, call: usize) -> Self {
        self.fail_on_call = Some(call);
        self
    }

    /// Fails every call whose text equals `text`, whatever the call order.
    pub fn failing_on_text(mut self, text: impl Into<String>) -> Self {
        self.fail_on_text = Some(text.into());
        self
    }

    /// Returns `candidates` verbatim for every call.
    pub fn scripted(mut self, candidates: Vec<Prediction>) -> Self {
        self.scripted = Some(candidates);
        self
    }

    /// Texts received so far, in call order.
    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().clone()
    }

    pub fn call_count(&self) -> usize {
        self.calls.lock().len()
    }
}

impl SentimentBackend for MockBackend {
    fn predict(&self, text: &str) -> Result<Vec<Prediction>, BackendError> {
        let call = {
            let mut calls = self.calls.lock();
            calls.push(text.to_string());
            calls.len() - 1
        };

        if self.fail_on_call == Some(call) {
            return Err(BackendError::Inference {
                reason: format!("mock failure on call {call}"),
            });
        }

        if self.fail_on_text.as_deref() == Some(text) {
            return Err(BackendError::Inference {
                reason: format!("mock failure on {text:?}"),
            });
        }

        if let Some(ref candidates) = self.scripted {
            return Ok(candidates.clone());
        }

        let negative = text.to_lowercase().contains(&self.negative_marker);
        let score = 0.5 + (text.chars().count() % 50) as f32 / 100.0;

        Ok(if negative {
            vec![
                Prediction::new("NEGATIVE", score),
                Prediction::new("POSITIVE", 1.0 - score),
            ]
        } else {
            vec![
                Prediction::new("POSITIVE", score),
                Prediction::new("NEGATIVE", 1.0 - score),
            ]
        })
    }
}
