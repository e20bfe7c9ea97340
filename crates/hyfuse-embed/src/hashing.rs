//! Deterministic feature-hashing embedder.
//!
//! Each token is hashed with blake3 into a signed bucket; the bucket counts
//! are L2 normalized. Texts sharing vocabulary land close together, which is
//! enough for tests and for running without a model on disk.

use async_trait::async_trait;

use hyfuse_core::{Embedder, Result};
use hyfuse_lexical::tokenize;

use crate::pooling::l2_normalize;

/// Feature-hashing embedder with a fixed dimension.
#[derive(Debug, Clone)]
pub struct HashEmbedder {
    dimension: usize,
}

impl HashEmbedder {
    /// Create a hashing embedder with the default dimension (384).
    pub fn new() -> Self {
        Self { dimension: 384 }
    }

    /// Create a hashing embedder with a custom dimension.
    pub fn with_dimension(dimension: usize) -> Self {
        Self {
            dimension: dimension.max(1),
        }
    }

    fn embed(&self, text: &str) -> Vec<f32> {
        let mut embedding = vec![0.0f32; self.dimension];
        for token in tokenize(text) {
            let hash = blake3::hash(token.as_bytes());
            let bytes = hash.as_bytes();
            let mut head = [0u8; 8];
            head.copy_from_slice(&bytes[..8]);
            let bucket = (u64::from_le_bytes(head) % self.dimension as u64) as usize;
            let sign = if bytes[8] & 1 == 0 { 1.0 } else { -1.0 };
            embedding[bucket] += sign;
        }
        l2_normalize(embedding)
    }
}

impl Default for HashEmbedder {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Embedder for HashEmbedder {
    async fn encode(&self, text: &str) -> Result<Vec<f32>> {
        Ok(self.embed(text))
    }

    async fn encode_many(&self, texts: &[&str]) -> Result<Vec<Vec<f32>>> {
        Ok(texts.iter().map(|t| self.embed(t)).collect())
    }

    fn dimension(&self) -> usize {
        self.dimension
    }
}
