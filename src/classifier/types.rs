//! Result records and labels.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Sentiment outcome for a document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Label {
    Positive,
    Negative,
}

impl Label {
    pub fn as_str(&self) -> &'static str {
        match self {
            Label::Positive => "POSITIVE",
            Label::Negative => "NEGATIVE",
        }
    }
}

impl fmt::Display for Label {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Returned when a backend label is neither positive nor negative.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnknownLabel(pub String);

impl FromStr for Label {
    type Err = UnknownLabel;

    /// Accepts `POSITIVE`/`NEGATIVE` in any case, and the generic
    /// `LABEL_1`/`LABEL_0` names of checkpoints without `id2label`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        if trimmed.eq_ignore_ascii_case("positive") || trimmed.eq_ignore_ascii_case("label_1") {
            Ok(Label::Positive)
        } else if trimmed.eq_ignore_ascii_case("negative")
            || trimmed.eq_ignore_ascii_case("label_0")
        {
            Ok(Label::Negative)
        } else {
            Err(UnknownLabel(s.to_string()))
        }
    }
}

/// One candidate returned by a [`SentimentBackend`](super::SentimentBackend).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Prediction {
    /// Label name as reported by the model.
    pub label: String,
    /// Confidence for `label`.
    pub score: f32,
}

impl Prediction {
    pub fn new(label: impl Into<String>, score: f32) -> Self {
        Self {
            label: label.into(),
            score,
        }
    }
}

/// Sentiment of a single document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClassificationResult {
    /// The original, untruncated document.
    pub text: String,
    pub label: Label,
    /// Confidence in `[0, 1]`.
    pub score: f32,
}
