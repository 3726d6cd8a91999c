//! Sentiment classification for lists of text documents.
//!
//! # Public API Surface
//!
//! ## Classification
//! - [`SentimentClassifier`] - validates input, truncates documents and
//!   reshapes backend output into [`ClassificationResult`]s
//! - [`SentimentBackend`], [`Prediction`] - the injected capability
//! - [`Label`] - `POSITIVE` / `NEGATIVE`
//!
//! ## Model
//! - [`SentimentModel`], [`ModelConfig`] - BERT-family classifier (or stub)
//!
//! ## Configuration
//! - [`Config`], [`ConfigError`] - `SENTIMENT_*` environment settings
//!
//! ## Test/Mock Support
//! [`MockBackend`] is available behind `#[cfg(any(test, feature = "mock"))]`.
//!
//! # Example
//!
//! ```no_run
//! use sentiment::{SentimentClassifier, SentimentModel};
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let classifier = SentimentClassifier::new(SentimentModel::stub()?);
//! for result in classifier.classify(&["I love this!", "I hate this."])? {
//!     println!("{} {} {:.3}", result.label, result.score, result.text);
//! }
//! # Ok(())
//! # }
//! ```

pub mod classifier;
pub mod config;
pub mod model;

#[cfg(any(test, feature = "mock"))]
pub use classifier::MockBackend;
pub use classifier::{
    BackendError, ClassificationResult, ClassifyError, DEFAULT_MAX_CHARS, FnBackend, Label,
    Prediction, SentimentBackend, SentimentClassifier, truncate_chars,
};
pub use config::{Config, ConfigError};
pub use model::{MAX_SEQ_LEN, ModelConfig, ModelError, SentimentModel};
