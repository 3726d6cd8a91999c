//! The pretrained sentiment model.
//!
//! - [`bert`] wraps a BERT, DistilBERT or RoBERTa encoder with a
//!   classification head, picked from `model_type` in `config.json`.
//! - [`device`] picks CPU / Metal / CUDA.
//! - [`stub`] scores text from a small lexicon when no model is configured.

/// BERT-family sequence classifiers.
pub mod bert;
pub mod config;
/// Device selection (CPU / Metal / CUDA).
pub mod device;
mod error;
pub mod stub;
/// Tokenizer/model loading helpers.
pub mod utils;


pub use config::{MAX_SEQ_LEN, ModelConfig};
pub use error::ModelError;

use candle_core::Tensor;
use tokenizers::Tokenizer;
use tracing::{debug, info};

use crate::classifier::{BackendError, Label, Prediction, SentimentBackend};
use bert::BertClassifier;
use device::select_device;
use utils::{check_model_dir, load_tokenizer};

/// Sentiment backend backed by a local BERT-family checkpoint.
///
/// Without a model path it runs in stub mode and scores text with
/// [`stub::positive_probability`].
pub struct SentimentModel {
    device: candle_core::Device,
    config: ModelConfig,
    model: Option<BertClassifier>,
    tokenizer: Option<Tokenizer>,
}

impl std::fmt::Debug for SentimentModel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SentimentModel")
            .field("device", &format!("{:?}", self.device))
            .field("config", &self.config)
            .field("model_loaded", &self.is_model_loaded())
            .finish()
    }
}

impl SentimentModel {
    pub fn load(config: ModelConfig) -> Result<Self, ModelError> {
        if let Err(reason) = config.validate() {
            return Err(ModelError::InvalidConfig { reason });
        }

        let device = select_device(config.force_cpu)?;
        debug!(?device, "Selected compute device for sentiment model");

        let Some(model_path) = config.model_path.clone() else {
            info!("No sentiment model path configured, operating in stub mode");
            return Ok(Self {
                device,
                config,
                model: None,
                tokenizer: None,
            });
        };

        check_model_dir(&model_path)?;

        info!(model_path = %model_path.display(), "Loading sentiment model");

        let model = BertClassifier::load(&model_path, &device).map_err(|e| {
            ModelError::ModelLoadFailed {
                reason: format!("Failed to load BERT model: {}", e),
            }
        })?;
        let tokenizer = load_tokenizer(&model_path, config.max_seq_len)?;

        info!(
            architecture = ?model.architecture(),
            labels = ?model.labels(),
            "Sentiment model loaded successfully"
        );

        Ok(Self {
            device,
            config,
            model: Some(model),
            tokenizer: Some(tokenizer),
        })
    }

    pub fn stub() -> Result<Self, ModelError> {
        Self::load(ModelConfig::stub())
    }

    pub fn is_model_loaded(&self) -> bool {
        self.model.is_some()
    }

    pub fn config(&self) -> &ModelConfig {
        &self.config
    }

    pub fn device(&self) -> &candle_core::Device {
        &self.device
    }

    /// Label names by class id; the stub reports NEGATIVE, POSITIVE.
    pub fn id2label(&self) -> Vec<String> {
        match &self.model {
            Some(model) => model.labels().to_vec(),
            None => vec![
                Label::Negative.as_str().to_string(),
                Label::Positive.as_str().to_string(),
            ],
        }
    }

    fn infer(
        &self,
        model: &BertClassifier,
        tokenizer: &Tokenizer,
        text: &str,
    ) -> Result<Vec<Prediction>, BackendError> {
        let encoding = tokenizer
            .encode(text, true)
            .map_err(|e| BackendError::Tokenization {
                reason: e.to_string(),
            })?;

        let input_ids = Tensor::new(encoding.get_ids(), &self.device)?.unsqueeze(0)?;
        let type_ids = Tensor::new(encoding.get_type_ids(), &self.device)?.unsqueeze(0)?;
        let attention_mask =
            Tensor::new(encoding.get_attention_mask(), &self.device)?.unsqueeze(0)?;

        let probabilities = model.probabilities(&input_ids, &type_ids, Some(&attention_mask))?;

        Ok(rank(
            model
                .labels()
                .iter()
                .zip(probabilities)
                .map(|(label, score)| Prediction::new(label.clone(), score.clamp(0.0, 1.0)))
                .collect(),
        ))
    }

    fn infer_stub(&self, text: &str) -> Vec<Prediction> {
        let positive = stub::positive_probability(text);
        rank(vec![
            Prediction::new(Label::Negative.as_str(), 1.0 - positive),
            Prediction::new(Label::Positive.as_str(), positive),
        ])
    }
}

/// Sorts candidates best-first. Ties keep class-id order.
fn rank(mut predictions: Vec<Prediction>) -> Vec<Prediction> {
    predictions.sort_by(|a, b| b.score.total_cmp(&a.score));
    predictions
}

impl SentimentBackend for SentimentModel {
    fn predict(&self, text: &str) -> Result<Vec<Prediction>, BackendError> {
        debug!(
            text_len = text.len(),
            model_loaded = self.is_model_loaded(),
            "Predicting sentiment"
        );

        let predictions = match (&self.model, &self.tokenizer) {
            (Some(model), Some(tokenizer)) => self.infer(model, tokenizer, text)?,
            _ => self.infer_stub(text),
        };

        debug!(
            label = predictions.first().map(|p| p.label.as_str()),
            score = predictions.first().map(|p| p.score),
            "Predicted sentiment"
        );

        Ok(predictions)
    }
}
