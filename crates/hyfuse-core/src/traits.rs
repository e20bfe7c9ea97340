//! Core traits defining the external collaborators of the fusion engine.

use async_trait::async_trait;

use crate::error::Result;
use crate::types::{DocId, Metadata, ScoredPoint, VectorPoint};

/// Embedding model trait.
///
/// Implementations must be deterministic for a given model version so that
/// query vectors and document vectors live in the same space.
#[async_trait]
pub trait Embedder: Send + Sync {
    /// Embed a single text.
    async fn encode(&self, text: &str) -> Result<Vec<f32>>;

    /// Embed a batch of texts, one vector per input in the same order.
    async fn encode_many(&self, texts: &[&str]) -> Result<Vec<Vec<f32>>>;

    /// Get the embedding dimension.
    fn dimension(&self) -> usize;
}

/// Vector storage and nearest-neighbour search.
#[async_trait]
pub trait VectorIndex: Send + Sync {
    /// Insert or replace points by id.
    async fn upsert(&self, points: Vec<VectorPoint>) -> Result<()>;

    /// Return up to `limit` points ordered by descending similarity.
    async fn query(&self, vector: &[f32], limit: usize) -> Result<Vec<ScoredPoint>>;

    /// Point lookup of payloads. Unknown ids are omitted from the result.
    async fn retrieve(&self, ids: &[DocId]) -> Result<Vec<(DocId, Metadata)>>;
}
