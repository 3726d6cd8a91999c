use std::path::PathBuf;

/// Token limit of BERT-family position embeddings.
pub const MAX_SEQ_LEN: usize = 512;

#[derive(Debug, Clone)]
pub struct ModelConfig {
    /// Directory with `config.json`, `model.safetensors` and `tokenizer.json`.
    /// `None` runs the model in stub mode.
    pub model_path: Option<PathBuf>,

    pub max_seq_len: usize,

    pub force_cpu: bool,
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self {
            model_path: None,
            max_seq_len: MAX_SEQ_LEN,
            force_cpu: false,
        }
    }
}

impl ModelConfig {
    pub fn new<P: Into<PathBuf>>(model_path: P) -> Self {
        Self {
            model_path: Some(model_path.into()),
            ..Default::default()
        }
    }

    pub fn stub() -> Self {
        Self::default()
    }

    pub fn with_max_seq_len(mut self, max_seq_len: usize) -> Self {
        assert!(max_seq_len > 0, "max_seq_len must be greater than 0");
        self.max_seq_len = max_seq_len;
        self
    }

    pub fn with_force_cpu(mut self, force_cpu: bool) -> Self {
        self.force_cpu = force_cpu;
        self
    }

    pub fn is_stub(&self) -> bool {
        self.model_path.is_none()
    }

    pub fn validate(&self) -> Result<(), String> {
        if self.max_seq_len == 0 || self.max_seq_len > MAX_SEQ_LEN {
            return Err(format!(
                "max_seq_len must be between 1 and {}, got {}",
                MAX_SEQ_LEN, self.max_seq_len
            ));
        }

        if let Some(ref path) = self.model_path
            && path.as_os_str().is_empty()
        {
            return Err("model_path cannot be empty when provided".to_string());
        }

        Ok(())
    }
}
