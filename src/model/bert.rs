use candle::{D, DType, Device, IndexOp, Result, Tensor};
use candle_core as candle;
use candle_nn::{Linear, Module, VarBuilder};
use candle_transformers::models::bert::{self, BertModel};
use candle_transformers::models::distilbert::{self, DistilBertModel};
use candle_transformers::models::xlm_roberta::{self, XLMRobertaForSequenceClassification};
use serde::Deserialize;
use serde::de::DeserializeOwned;
use std::collections::HashMap;
use std::path::Path;
use std::sync::Arc;

use super::utils::{CONFIG_FILE, WEIGHTS_FILE};

/// Binary sentiment checkpoints ship two labels when `id2label` is absent.
const DEFAULT_NUM_LABELS: usize = 2;

/// The `config.json` fields read before the architecture is known.
#[derive(Debug, Default, Deserialize)]
struct HeaderConfig {
    #[serde(default)]
    model_type: Option<String>,
    #[serde(default)]
    id2label: HashMap<String, String>,
}

/// Encoder families, keyed by `model_type` in `config.json`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Architecture {
    Bert,
    DistilBert,
    Roberta,
}

impl Architecture {
    /// Anything unrecognised (or missing) is read as plain BERT.
    pub fn from_model_type(model_type: Option<&str>) -> Self {
        match model_type {
            Some("distilbert") => Self::DistilBert,
            Some("roberta" | "xlm-roberta") => Self::Roberta,
            _ => Self::Bert,
        }
    }
}

enum SequenceClassificationImpl {
    /// Optional pooler (dense + tanh on CLS), then `classifier`.
    Bert {
        model: BertModel,
        pooler: Option<Linear>,
        classifier: Linear,
    },
    /// `pre_classifier` + ReLU on CLS, then `classifier`.
    DistilBert {
        model: DistilBertModel,
        pre_classifier: Linear,
        classifier: Linear,
    },
    /// Position ids start after `pad_token_id`, as in HF RoBERTa.
    Roberta(XLMRobertaForSequenceClassification),
}

impl SequenceClassificationImpl {
    fn load(
        vb: VarBuilder,
        architecture: Architecture,
        config_content: &str,
        num_labels: usize,
    ) -> Result<Self> {
        match architecture {
            Architecture::Bert => {
                let config: bert::Config = parse_config(config_content)?;
                let hidden = config.hidden_size;
                let encoder_vb = if vb.contains_tensor("bert.embeddings.word_embeddings.weight") {
                    vb.pp("bert")
                } else {
                    vb.clone()
                };

                let model = BertModel::load(encoder_vb.clone(), &config)?;
                let pooler = if encoder_vb.contains_tensor("pooler.dense.weight") {
                    Some(candle_nn::linear(hidden, hidden, encoder_vb.pp("pooler.dense"))?)
                } else {
                    None
                };
                let classifier = candle_nn::linear(hidden, num_labels, vb.pp("classifier"))?;

                Ok(Self::Bert {
                    model,
                    pooler,
                    classifier,
                })
            }
            Architecture::DistilBert => {
                let config: distilbert::Config = parse_config(config_content)?;
                let dim = config.dim;
                let encoder_vb =
                    if vb.contains_tensor("distilbert.embeddings.word_embeddings.weight") {
                        vb.pp("distilbert")
                    } else {
                        vb.clone()
                    };

                Ok(Self::DistilBert {
                    model: DistilBertModel::load(encoder_vb, &config)?,
                    pre_classifier: candle_nn::linear(dim, dim, vb.pp("pre_classifier"))?,
                    classifier: candle_nn::linear(dim, num_labels, vb.pp("classifier"))?,
                })
            }
            Architecture::Roberta => {
                let config: xlm_roberta::Config = parse_config(config_content)?;
                Ok(Self::Roberta(XLMRobertaForSequenceClassification::new(
                    num_labels, &config, vb,
                )?))
            }
        }
    }

    fn forward(
        &self,
        input_ids: &Tensor,
        token_type_ids: &Tensor,
        attention_mask: Option<&Tensor>,
    ) -> Result<Tensor> {
        match self {
            Self::Bert {
                model,
                pooler,
                classifier,
            } => {
                let output = model.forward(input_ids, token_type_ids, attention_mask)?;
                let cls_token = output.i((.., 0, ..))?;
                match pooler {
                    Some(pooler) => classifier.forward(&pooler.forward(&cls_token)?.tanh()?),
                    None => classifier.forward(&cls_token),
                }
            }
            Self::DistilBert {
                model,
                pre_classifier,
                classifier,
            } => {
                let (batch, seq_len) = input_ids.dims2()?;
                // DistilBertModel masks positions where the mask is non-zero.
                let padding = match attention_mask {
                    Some(mask) => mask.eq(0u32)?,
                    None => Tensor::zeros((batch, seq_len), DType::U8, input_ids.device())?,
                };
                let padding = padding.reshape((batch, 1, 1, seq_len))?;

                let output = model.forward(input_ids, &padding)?;
                let cls_token = output.i((.., 0, ..))?;
                classifier.forward(&pre_classifier.forward(&cls_token)?.relu()?)
            }
            Self::Roberta(model) => {
                let attention_mask = match attention_mask {
                    Some(mask) => mask.clone(),
                    None => input_ids.ones_like()?,
                };
                model.forward(input_ids, &attention_mask, token_type_ids)
            }
        }
    }
}

/// A BERT-family encoder (BERT, DistilBERT or RoBERTa) with a sequence
/// classification head.
///
/// Cloning shares the loaded weights.
#[derive(Clone)]
pub struct BertClassifier {
    inner: Arc<SequenceClassificationImpl>,
    architecture: Architecture,
    labels: Arc<[String]>,
}

impl BertClassifier {
    /// Loads `config.json` and `model.safetensors` from `model_dir`.
    pub fn load<P: AsRef<Path>>(model_dir: P, device: &Device) -> Result<Self> {
        let model_dir = model_dir.as_ref();
        let config_content = std::fs::read_to_string(model_dir.join(CONFIG_FILE))?;

        let header: HeaderConfig = parse_config(&config_content)?;
        let architecture = Architecture::from_model_type(header.model_type.as_deref());
        let labels = labels_from_config(&header.id2label)?;

        let weights_path = model_dir.join(WEIGHTS_FILE);
        // SAFETY: the weights file is not modified while the model is alive.
        let vb =
            unsafe { VarBuilder::from_mmaped_safetensors(&[weights_path], DType::F32, device)? };

        let model =
            SequenceClassificationImpl::load(vb, architecture, &config_content, labels.len())?;

        Ok(Self {
            inner: Arc::new(model),
            architecture,
            labels: labels.into(),
        })
    }

    pub fn architecture(&self) -> Architecture {
        self.architecture
    }

    /// Label names indexed by class id.
    pub fn labels(&self) -> &[String] {
        &self.labels
    }

    /// Raw logits, shape `[batch, num_labels]`.
    pub fn forward(
        &self,
        input_ids: &Tensor,
        token_type_ids: &Tensor,
        attention_mask: Option<&Tensor>,
    ) -> Result<Tensor> {
        self.inner.forward(input_ids, token_type_ids, attention_mask)
    }

    /// Class probabilities for a single sequence, in class-id order.
    pub fn probabilities(
        &self,
        input_ids: &Tensor,
        token_type_ids: &Tensor,
        attention_mask: Option<&Tensor>,
    ) -> Result<Vec<f32>> {
        let logits = self.forward(input_ids, token_type_ids, attention_mask)?;
        candle_nn::ops::softmax(&logits, D::Minus1)?
            .i(0)?
            .to_dtype(DType::F32)?
            .to_vec1::<f32>()
    }
}

fn parse_config<T: DeserializeOwned>(content: &str) -> Result<T> {
    serde_json::from_str(content)
        .map_err(|e| candle::Error::Msg(format!("Failed to parse config: {}", e)))
}

/// Orders `id2label` by class id, falling back to `LABEL_{i}` names.
fn labels_from_config(id2label: &HashMap<String, String>) -> Result<Vec<String>> {
    if id2label.is_empty() {
        return Ok((0..DEFAULT_NUM_LABELS).map(|i| format!("LABEL_{i}")).collect());
    }

    let mut indexed = id2label
        .iter()
        .map(|(id, label)| {
            id.parse::<usize>()
                .map(|id| (id, label.clone()))
                .map_err(|_| candle::Error::Msg(format!("Non-numeric id2label key: {id}")))
        })
        .collect::<Result<Vec<_>>>()?;
    indexed.sort_by_key(|(id, _)| *id);

    if indexed.iter().enumerate().any(|(pos, (id, _))| pos != *id) {
        return Err(candle::Error::Msg(
            "id2label keys must be contiguous from 0".to_string(),
        ));
    }

    Ok(indexed.into_iter().map(|(_, label)| label).collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use candle_nn::VarMap;

    const TINY_BERT_CONFIG: &str = r#"{
        "model_type": "bert",
        "vocab_size": 16,
        "hidden_size": 8,
        "num_hidden_layers": 1,
        "num_attention_heads": 2,
        "intermediate_size": 16,
        "hidden_act": "gelu",
        "hidden_dropout_prob": 0.1,
        "max_position_embeddings": 32,
        "type_vocab_size": 2,
        "initializer_range": 0.02,
        "layer_norm_eps": 1e-12,
        "pad_token_id": 0,
        "classifier_dropout": null,
        "id2label": {"0": "NEGATIVE", "1": "POSITIVE"}
    }"#;

    const TINY_DISTILBERT_CONFIG: &str = r#"{
        "model_type": "distilbert",
        "vocab_size": 16,
        "dim": 8,
        "n_layers": 1,
        "n_heads": 2,
        "hidden_dim": 16,
        "activation": "gelu",
        "dropout": 0.1,
        "max_position_embeddings": 32,
        "initializer_range": 0.02,
        "pad_token_id": 0,
        "id2label": {"0": "NEGATIVE", "1": "POSITIVE"}
    }"#;

    const TINY_ROBERTA_CONFIG: &str = r#"{
        "model_type": "roberta",
        "vocab_size": 16,
        "hidden_size": 8,
        "num_hidden_layers": 1,
        "num_attention_heads": 2,
        "intermediate_size": 16,
        "hidden_act": "gelu",
        "hidden_dropout_prob": 0.1,
        "attention_probs_dropout_prob": 0.1,
        "max_position_embeddings": 32,
        "type_vocab_size": 1,
        "initializer_range": 0.02,
        "layer_norm_eps": 1e-5,
        "pad_token_id": 1,
        "position_embedding_type": "absolute",
        "id2label": {"0": "NEGATIVE", "1": "POSITIVE"}
    }"#;

    /// `config.json` of distilbert-base-uncased-finetuned-sst-2-english.
    const SST2_DISTILBERT_CONFIG: &str = r#"{
        "activation": "gelu",
        "architectures": ["DistilBertForSequenceClassification"],
        "attention_dropout": 0.1,
        "dim": 768,
        "dropout": 0.1,
        "finetuning_task": "sst-2",
        "hidden_dim": 3072,
        "id2label": {"0": "NEGATIVE", "1": "POSITIVE"},
        "initializer_range": 0.02,
        "label2id": {"NEGATIVE": 0, "POSITIVE": 1},
        "max_position_embeddings": 512,
        "model_type": "distilbert",
        "n_heads": 12,
        "n_layers": 6,
        "output_past": true,
        "pad_token_id": 0,
        "qa_dropout": 0.1,
        "seq_classif_dropout": 0.2,
        "sinusoidal_pos_embds": false,
        "tie_weights_": true,
        "vocab_size": 30522
    }"#;

    /// Writes a random-weight checkpoint laid out with HF tensor names.
    fn write_checkpoint(
        dir: &Path,
        config: &str,
        build: impl FnOnce(VarBuilder) -> Result<()>,
    ) {
        let varmap = VarMap::new();
        let vb = VarBuilder::from_varmap(&varmap, DType::F32, &Device::Cpu);
        build(vb).unwrap();
        varmap.save(dir.join(WEIGHTS_FILE)).unwrap();
        std::fs::write(dir.join(CONFIG_FILE), config).unwrap();
    }

    fn tiny_bert(dir: &Path) {
        write_checkpoint(dir, TINY_BERT_CONFIG, |vb| {
            let config: bert::Config = parse_config(TINY_BERT_CONFIG)?;
            BertModel::load(vb.pp("bert"), &config)?;
            candle_nn::linear(8, 8, vb.pp("bert.pooler.dense"))?;
            candle_nn::linear(8, 2, vb.pp("classifier"))?;
            Ok(())
        });
    }

    fn tiny_distilbert(dir: &Path) {
        write_checkpoint(dir, TINY_DISTILBERT_CONFIG, |vb| {
            let config: distilbert::Config = parse_config(TINY_DISTILBERT_CONFIG)?;
            DistilBertModel::load(vb.pp("distilbert"), &config)?;
            candle_nn::linear(8, 8, vb.pp("pre_classifier"))?;
            candle_nn::linear(8, 2, vb.pp("classifier"))?;
            Ok(())
        });
    }

    fn tiny_roberta(dir: &Path) {
        write_checkpoint(dir, TINY_ROBERTA_CONFIG, |vb| {
            let config: xlm_roberta::Config = parse_config(TINY_ROBERTA_CONFIG)?;
            XLMRobertaForSequenceClassification::new(2, &config, vb)?;
            Ok(())
        });
    }

    fn probabilities_for(model: &BertClassifier, ids: &[u32], mask: &[u32]) -> Vec<f32> {
        let input_ids = Tensor::new(ids, &Device::Cpu).unwrap().unsqueeze(0).unwrap();
        let type_ids = input_ids.zeros_like().unwrap();
        let attention_mask = Tensor::new(mask, &Device::Cpu)
            .unwrap()
            .unsqueeze(0)
            .unwrap();
        model
            .probabilities(&input_ids, &type_ids, Some(&attention_mask))
            .unwrap()
    }

    /// Loads the checkpoint, runs a forward pass and checks that a trailing
    /// padded token does not change the result.
    fn assert_forward_pass(dir: &Path, architecture: Architecture, pad_id: u32) {
        let model = BertClassifier::load(dir, &Device::Cpu).unwrap();

        assert_eq!(model.architecture(), architecture);
        assert_eq!(model.labels(), ["NEGATIVE", "POSITIVE"]);

        let probabilities = probabilities_for(&model, &[0, 5, 7, 2], &[1, 1, 1, 1]);
        assert_eq!(probabilities.len(), 2);
        assert!(probabilities.iter().all(|p| (0.0..=1.0).contains(p)));
        assert!((probabilities.iter().sum::<f32>() - 1.0).abs() < 1e-5);

        let padded = probabilities_for(&model, &[0, 5, 7, 2, pad_id], &[1, 1, 1, 1, 0]);
        for (a, b) in probabilities.iter().zip(&padded) {
            assert!((a - b).abs() < 1e-4, "padding changed output: {a} vs {b}");
        }
    }

    #[test]
    fn test_architecture_from_model_type() {
        assert_eq!(
            Architecture::from_model_type(Some("distilbert")),
            Architecture::DistilBert
        );
        assert_eq!(
            Architecture::from_model_type(Some("roberta")),
            Architecture::Roberta
        );
        assert_eq!(
            Architecture::from_model_type(Some("bert")),
            Architecture::Bert
        );
        assert_eq!(Architecture::from_model_type(None), Architecture::Bert);
    }

    #[test]
    fn test_distilbert_sst2_config_parses() {
        let header: HeaderConfig = parse_config(SST2_DISTILBERT_CONFIG).unwrap();

        assert_eq!(
            Architecture::from_model_type(header.model_type.as_deref()),
            Architecture::DistilBert
        );
        assert_eq!(
            labels_from_config(&header.id2label).unwrap(),
            vec!["NEGATIVE", "POSITIVE"]
        );

        let config: distilbert::Config = parse_config(SST2_DISTILBERT_CONFIG).unwrap();
        assert_eq!(config.dim, 768);
        // No `hidden_size`, so the BERT config cannot describe it.
        assert!(parse_config::<bert::Config>(SST2_DISTILBERT_CONFIG).is_err());
    }

    #[test]
    fn test_bert_forward_pass() {
        let dir = tempfile::tempdir().unwrap();
        tiny_bert(dir.path());

        assert_forward_pass(dir.path(), Architecture::Bert, 0);
    }

    #[test]
    fn test_distilbert_forward_pass() {
        let dir = tempfile::tempdir().unwrap();
        tiny_distilbert(dir.path());

        assert_forward_pass(dir.path(), Architecture::DistilBert, 0);
    }

    #[test]
    fn test_roberta_forward_pass() {
        let dir = tempfile::tempdir().unwrap();
        tiny_roberta(dir.path());

        assert_forward_pass(dir.path(), Architecture::Roberta, 1);
    }

    #[test]
    fn test_distilbert_weights_missing_head_fail() {
        let dir = tempfile::tempdir().unwrap();
        write_checkpoint(dir.path(), TINY_DISTILBERT_CONFIG, |vb| {
            let config: distilbert::Config = parse_config(TINY_DISTILBERT_CONFIG)?;
            DistilBertModel::load(vb.pp("distilbert"), &config)?;
            candle_nn::linear(8, 2, vb.pp("classifier"))?;
            Ok(())
        });

        assert!(BertClassifier::load(dir.path(), &Device::Cpu).is_err());
    }

    #[test]
    fn test_labels_default_when_missing() {
        let labels = labels_from_config(&HashMap::new()).unwrap();
        assert_eq!(labels, vec!["LABEL_0", "LABEL_1"]);
    }

    #[test]
    fn test_labels_sorted_by_id() {
        let map = HashMap::from([
            ("1".to_string(), "POSITIVE".to_string()),
            ("0".to_string(), "NEGATIVE".to_string()),
        ]);
        let labels = labels_from_config(&map).unwrap();
        assert_eq!(labels, vec!["NEGATIVE", "POSITIVE"]);
    }

    #[test]
    fn test_labels_reject_gaps() {
        let map = HashMap::from([
            ("0".to_string(), "NEGATIVE".to_string()),
            ("2".to_string(), "POSITIVE".to_string()),
        ]);
        assert!(labels_from_config(&map).is_err());
    }

    #[test]
    fn test_labels_reject_non_numeric() {
        let map = HashMap::from([("zero".to_string(), "NEGATIVE".to_string())]);
        assert!(labels_from_config(&map).is_err());
    }
}
