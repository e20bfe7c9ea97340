//! ONNX-based sentence embedding model.

use std::path::Path;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use ort::session::builder::GraphOptimizationLevel;
use ort::session::Session;
use ort::value::Tensor;
use tokenizers::Tokenizer;
use tracing::{debug, info};

use hyfuse_core::{Embedder, EmbeddingConfig, HyfuseError, Result};

use crate::pooling::{l2_normalize, mean_pool};

/// Sentence-transformer embedder backed by ONNX Runtime.
///
/// Inference runs on the blocking thread pool; the session is shared behind
/// a mutex because a run needs exclusive access.
pub struct OnnxEmbedder {
    inner: Arc<OnnxModel>,
}

struct OnnxModel {
    session: Mutex<Session>,
    tokenizer: Tokenizer,
    dimension: usize,
    max_tokens: usize,
}

impl OnnxEmbedder {
    /// Load a model and tokenizer with default settings.
    pub fn new(model_path: impl AsRef<Path>, tokenizer_path: impl AsRef<Path>) -> Result<Self> {
        Self::with_config(
            model_path,
            tokenizer_path,
            &EmbeddingConfig::default(),
        )
    }

    /// Load a model and tokenizer using the embedding configuration.
    pub fn with_config(
        model_path: impl AsRef<Path>,
        tokenizer_path: impl AsRef<Path>,
        config: &EmbeddingConfig,
    ) -> Result<Self> {
        let model_path = model_path.as_ref();
        let tokenizer_path = tokenizer_path.as_ref();

        info!("Loading ONNX model from {:?}", model_path);

        let session = Session::builder()
            .map_err(|e| HyfuseError::embedding(format!("Failed to create session builder: {}", e)))?
            .with_optimization_level(GraphOptimizationLevel::Level3)
            .map_err(|e| HyfuseError::embedding(format!("Failed to set optimization level: {}", e)))?
            .with_intra_threads(config.num_threads)
            .map_err(|e| HyfuseError::embedding(format!("Failed to set thread count: {}", e)))?
            .commit_from_file(model_path)
            .map_err(|e| HyfuseError::embedding(format!("Failed to load model: {}", e)))?;

        info!("Loading tokenizer from {:?}", tokenizer_path);

        let tokenizer = Tokenizer::from_file(tokenizer_path)
            .map_err(|e| HyfuseError::embedding(format!("Failed to load tokenizer: {}", e)))?;

        info!(
            "Embedder initialized: dim={}, max_tokens={}",
            config.dimension, config.max_tokens
        );

        Ok(Self {
            inner: Arc::new(OnnxModel {
                session: Mutex::new(session),
                tokenizer,
                dimension: config.dimension,
                max_tokens: config.max_tokens,
            }),
        })
    }

    async fn run(&self, texts: Vec<String>) -> Result<Vec<Vec<f32>>> {
        let model = Arc::clone(&self.inner);
        tokio::task::spawn_blocking(move || model.embed_batch(&texts))
            .await
            .map_err(|e| HyfuseError::internal(format!("Embedding task failed: {}", e)))?
    }
}

impl OnnxModel {
    fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        if texts.is_empty() {
            return Ok(Vec::new());
        }

        let inputs: Vec<&str> = texts.iter().map(String::as_str).collect();
        let encodings = self
            .tokenizer
            .encode_batch(inputs, true)
            .map_err(|e| HyfuseError::embedding(format!("Tokenization failed: {}", e)))?;

        let seq_len = encodings
            .iter()
            .map(|e| e.get_ids().len())
            .max()
            .unwrap_or(0)
            .min(self.max_tokens)
            .max(1);
        let batch_size = encodings.len();

        debug!("Embedding batch: size={}, seq_len={}", batch_size, seq_len);

        let mut input_ids = vec![0i64; batch_size * seq_len];
        let mut masks = vec![vec![0i64; seq_len]; batch_size];

        for (i, encoding) in encodings.iter().enumerate() {
            let ids = encoding.get_ids();
            let attention = encoding.get_attention_mask();
            for j in 0..ids.len().min(seq_len) {
                input_ids[i * seq_len + j] = ids[j] as i64;
                masks[i][j] = attention[j] as i64;
            }
        }

        let attention_mask: Vec<i64> = masks.iter().flatten().copied().collect();
        let token_type_ids = vec![0i64; batch_size * seq_len];

        let shape = vec![batch_size, seq_len];
        let input_ids = Tensor::from_array((shape.clone(), input_ids))
            .map_err(|e| HyfuseError::embedding(format!("Failed to create input tensor: {}", e)))?;
        let attention_mask = Tensor::from_array((shape.clone(), attention_mask))
            .map_err(|e| HyfuseError::embedding(format!("Failed to create mask tensor: {}", e)))?;
        let token_type_ids = Tensor::from_array((shape, token_type_ids))
            .map_err(|e| HyfuseError::embedding(format!("Failed to create type tensor: {}", e)))?;

        let mut session = self
            .session
            .lock()
            .map_err(|e| HyfuseError::embedding(format!("Failed to lock session: {}", e)))?;

        let outputs = session
            .run(ort::inputs![
                "input_ids" => input_ids,
                "attention_mask" => attention_mask,
                "token_type_ids" => token_type_ids
            ])
            .map_err(|e| HyfuseError::embedding(format!("Inference failed: {}", e)))?;

        // last_hidden_state for sentence-transformer exports
        let (_, output) = outputs
            .iter()
            .next()
            .ok_or_else(|| HyfuseError::embedding("No output tensor found"))?;

        let view = output
            .try_extract_array::<f32>()
            .map_err(|e| HyfuseError::embedding(format!("Failed to extract tensor: {}", e)))?;

        let embeddings = match view.ndim() {
            3 => mean_pool(&view, &masks),
            2 => {
                let hidden_dim = view.shape()[1];
                (0..batch_size)
                    .map(|i| l2_normalize((0..hidden_dim).map(|j| view[[i, j]]).collect()))
                    .collect()
            }
            _ => {
                return Err(HyfuseError::embedding(format!(
                    "Unexpected output shape: {:?}",
                    view.shape()
                )));
            }
        };

        if let Some(first) = embeddings.first() {
            if first.len() != self.dimension {
                return Err(HyfuseError::DimensionMismatch {
                    expected: self.dimension,
                    actual: first.len(),
                });
            }
        }

        Ok(embeddings)
    }
}

#[async_trait]
impl Embedder for OnnxEmbedder {
    async fn encode(&self, text: &str) -> Result<Vec<f32>> {
        self.run(vec![text.to_string()])
            .await?
            .into_iter()
            .next()
            .ok_or_else(|| HyfuseError::embedding("No embedding returned"))
    }

    async fn encode_many(&self, texts: &[&str]) -> Result<Vec<Vec<f32>>> {
        self.run(texts.iter().map(|t| t.to_string()).collect()).await
    }

    fn dimension(&self) -> usize {
        self.inner.dimension
    }
}
