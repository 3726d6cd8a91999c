use std::path::{Path, PathBuf};
use tokenizers::{Tokenizer, TruncationParams};

use super::error::ModelError;

/// File names a model directory must contain.
pub const CONFIG_FILE: &str = "config.json";
pub const WEIGHTS_FILE: &str = "model.safetensors";
pub const TOKENIZER_FILE: &str = "tokenizer.json";

/// Resolves `tokenizer.json` for a model directory or an explicit tokenizer path.
pub fn tokenizer_path(model_path: &Path) -> PathBuf {
    if model_path
        .file_name()
        .is_some_and(|name| name == std::ffi::OsStr::new(TOKENIZER_FILE))
    {
        model_path.to_path_buf()
    } else {
        model_path.join(TOKENIZER_FILE)
    }
}

/// Loads the tokenizer for `model_path` with truncation at `max_len` tokens.
///
/// Inputs longer than the encoder's position embeddings would fail inside
/// the forward pass, so truncation is always on.
pub fn load_tokenizer(model_path: &Path, max_len: usize) -> Result<Tokenizer, ModelError> {
    let path = tokenizer_path(model_path);

    let mut tokenizer = Tokenizer::from_file(&path).map_err(|e| ModelError::ModelLoadFailed {
        reason: format!("failed to read tokenizer {}: {}", path.display(), e),
    })?;

    let truncation = TruncationParams {
        max_length: max_len,
        ..Default::default()
    };

    tokenizer
        .with_truncation(Some(truncation))
        .map_err(|e| ModelError::ModelLoadFailed {
            reason: format!("failed to configure truncation: {}", e),
        })?;

    Ok(tokenizer)
}

/// Checks that `model_dir` holds config, weights and tokenizer.
pub fn check_model_dir(model_dir: &Path) -> Result<(), ModelError> {
    if !model_dir.exists() {
        return Err(ModelError::ModelNotFound {
            path: model_dir.to_path_buf(),
        });
    }

    if !model_dir.is_dir() {
        return Err(ModelError::InvalidConfig {
            reason: format!("model path is not a directory: {}", model_dir.display()),
        });
    }

    for file in [CONFIG_FILE, WEIGHTS_FILE, TOKENIZER_FILE] {
        if !model_dir.join(file).exists() {
            return Err(ModelError::ModelLoadFailed {
                reason: format!("missing {} in {}", file, model_dir.display()),
            });
        }
    }

    Ok(())
}
