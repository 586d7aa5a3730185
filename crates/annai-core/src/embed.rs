//! DistilBERT sentence embeddings via candle.
//!
//! Loads a sentence-transformers DistilBERT checkpoint (`config.json`,
//! `tokenizer.json`, `model.safetensors`) from a local directory and
//! produces mean-pooled, L2-normalized vectors. Inference runs on CPU and
//! is deterministic: the same text and checkpoint always yield the same
//! vector, which the index relies on for reproducible retrieval.

use std::path::PathBuf;

use candle_core::{DType, Device, Tensor};
use candle_nn::VarBuilder;
use candle_transformers::models::distilbert::{Config as BertConfig, DistilBertModel};
use tokenizers::Tokenizer as HfTokenizer;

use crate::error::{CoreError, Result};

/// Token budget per encoded text; longer inputs are truncated.
const MAX_TOKENS: usize = 512;

/// Which checkpoint to load and how to identify it.
#[derive(Debug, Clone)]
pub struct EmbedConfig {
    /// Directory holding `config.json`, `tokenizer.json`,
    /// `model.safetensors`.
    pub model_dir: PathBuf,
    /// Stable model identifier persisted into the index metadata and
    /// checked at query time.
    pub model_id: String,
}

impl Default for EmbedConfig {
    fn default() -> Self {
        Self {
            model_dir: PathBuf::from("models/embedding"),
            model_id: "sentence-transformers/multi-qa-distilbert-cos-v1".to_string(),
        }
    }
}

/// Sentence embedder over a local DistilBERT checkpoint.
pub struct TextEmbedder {
    tokenizer: HfTokenizer,
    model: DistilBertModel,
    device: Device,
    model_id: String,
}

impl std::fmt::Debug for TextEmbedder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TextEmbedder")
            .field("device", &self.device)
            .field("model_id", &self.model_id)
            .finish_non_exhaustive()
    }
}

impl TextEmbedder {
    /// Loads the checkpoint from `config.model_dir`.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::ModelLoad`] when any of the three checkpoint
    /// files is missing or unparseable.
    pub fn load(config: &EmbedConfig) -> Result<Self> {
        let device = Device::Cpu;

        let tokenizer_path = config.model_dir.join("tokenizer.json");
        if !tokenizer_path.exists() {
            return Err(CoreError::ModelLoad(format!(
                "tokenizer not found at {}",
                tokenizer_path.display()
            )));
        }
        let tokenizer = HfTokenizer::from_file(&tokenizer_path)
            .map_err(|e| CoreError::ModelLoad(e.to_string()))?;

        let config_path = config.model_dir.join("config.json");
        let config_str = std::fs::read_to_string(&config_path).map_err(|e| {
            CoreError::ModelLoad(format!("failed to read {}: {e}", config_path.display()))
        })?;
        let bert_config: BertConfig = serde_json::from_str(&config_str)
            .map_err(|e| CoreError::ModelLoad(format!("failed to parse model config: {e}")))?;

        let weights_path = config.model_dir.join("model.safetensors");
        if !weights_path.exists() {
            return Err(CoreError::ModelLoad(format!(
                "weights not found at {}",
                weights_path.display()
            )));
        }
        let vb = unsafe {
            VarBuilder::from_mmaped_safetensors(&[weights_path], DType::F32, &device)
        }
        .map_err(|e| CoreError::ModelLoad(e.to_string()))?;
        let model = DistilBertModel::load(vb, &bert_config)
            .map_err(|e| CoreError::ModelLoad(e.to_string()))?;

        tracing::debug!(model = %config.model_id, "embedding model loaded");

        Ok(Self {
            tokenizer,
            model,
            device,
            model_id: config.model_id.clone(),
        })
    }

    /// Stable identifier of the loaded model.
    #[must_use]
    pub fn model_id(&self) -> &str {
        &self.model_id
    }

    /// Embeds one text: tokenize, forward, mean-pool over tokens,
    /// L2-normalize.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::Embedding`] on empty input or inference
    /// failure.
    pub fn embed(&self, text: &str) -> Result<Vec<f32>> {
        if text.trim().is_empty() {
            return Err(CoreError::Embedding("cannot embed empty text".into()));
        }

        let encoding = self
            .tokenizer
            .encode(text, true)
            .map_err(|e| CoreError::Embedding(format!("tokenize error: {e}")))?;
        let mut ids = encoding.get_ids().to_vec();
        ids.truncate(MAX_TOKENS);
        if ids.is_empty() {
            return Err(CoreError::Embedding("tokenizer produced no tokens".into()));
        }

        let input_ids = Tensor::new(ids.as_slice(), &self.device)
            .map_err(|e| CoreError::Embedding(e.to_string()))?
            .unsqueeze(0)
            .map_err(|e| CoreError::Embedding(e.to_string()))?;
        let attention_mask =
            Tensor::ones_like(&input_ids).map_err(|e| CoreError::Embedding(e.to_string()))?;

        // [1, seq_len, hidden]
        let hidden = self
            .model
            .forward(&input_ids, &attention_mask)
            .map_err(|e| CoreError::Embedding(e.to_string()))?;
        let (_batch, seq_len, _hidden) =
            hidden.dims3().map_err(|e| CoreError::Embedding(e.to_string()))?;
        let summed = hidden.sum(1).map_err(|e| CoreError::Embedding(e.to_string()))?;
        let pooled = (summed / seq_len as f64).map_err(|e| CoreError::Embedding(e.to_string()))?;

        let vector: Vec<f32> = pooled
            .squeeze(0)
            .map_err(|e| CoreError::Embedding(e.to_string()))?
            .to_vec1()
            .map_err(|e| CoreError::Embedding(e.to_string()))?;
        Ok(l2_normalize(vector))
    }
}

impl annai_vecdb::Embedder for TextEmbedder {
    fn model_id(&self) -> &str {
        &self.model_id
    }

    fn embed(&self, text: &str) -> annai_vecdb::Result<Vec<f32>> {
        TextEmbedder::embed(self, text)
            .map_err(|e| annai_vecdb::VecdbError::Embedding(e.to_string()))
    }
}

fn l2_normalize(mut vector: Vec<f32>) -> Vec<f32> {
    let norm = vector.iter().map(|x| x * x).sum::<f32>().sqrt();
    if norm > 0.0 {
        for value in &mut vector {
            *value /= norm;
        }
    }
    vector
}
