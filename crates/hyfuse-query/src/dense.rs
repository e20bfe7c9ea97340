//! Dense retrieval over an external embedder and vector index.

use std::collections::HashMap;
use std::sync::Arc;

use tracing::debug;

use hyfuse_core::{DocId, Embedder, HyfuseError, Metadata, Result, ScoredPoint, VectorIndex};

/// Typed boundary around the embedder and vector index.
///
/// Performs no scoring itself. Every backend failure comes back as
/// [`HyfuseError::RetrievalUnavailable`] so the caller can degrade.
pub struct DenseRetriever<E: ?Sized, V: ?Sized> {
    embedder: Arc<E>,
    index: Arc<V>,
}

impl<E, V> DenseRetriever<E, V>
where
    E: Embedder + ?Sized,
    V: VectorIndex + ?Sized,
{
    /// Create a retriever over the given backends.
    pub fn new(embedder: Arc<E>, index: Arc<V>) -> Self {
        Self { embedder, index }
    }

    /// Up to `limit` documents ordered by descending similarity to the query.
    pub async fn retrieve(&self, query: &str, limit: usize) -> Result<Vec<ScoredPoint>> {
        let vector = self.embedder.encode(query).await.map_err(|e| {
            HyfuseError::retrieval_unavailable(format!("query embedding failed: {}", e))
        })?;

        let mut points = self
            .index
            .query(&vector, limit)
            .await
            .map_err(|e| HyfuseError::retrieval_unavailable(format!("vector query failed: {}", e)))?;

        if points.len() > limit {
            points.truncate(limit);
        } else if points.len() < limit {
            debug!("Vector index returned {} of {} requested", points.len(), limit);
        }

        Ok(points)
    }

    /// Look up payloads for the given ids in one call.
    pub async fn lookup(&self, ids: &[DocId]) -> Result<HashMap<DocId, Metadata>> {
        if ids.is_empty() {
            return Ok(HashMap::new());
        }
        let found = self
            .index
            .retrieve(ids)
            .await
            .map_err(|e| HyfuseError::retrieval_unavailable(format!("payload lookup failed: {}", e)))?;
        Ok(found.into_iter().collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use hyfuse_core::VectorPoint;
    use serde_json::json;

    struct UnitEmbedder;

    #[async_trait]
    impl Embedder for UnitEmbedder {
        async fn encode(&self, _text: &str) -> Result<Vec<f32>> {
            Ok(vec![1.0])
        }

        async fn encode_many(&self, texts: &[&str]) -> Result<Vec<Vec<f32>>> {
            Ok(vec![vec![1.0]; texts.len()])
        }

        fn dimension(&self) -> usize {
            1
        }
    }

    struct FailingEmbedder;

    #[async_trait]
    impl Embedder for FailingEmbedder {
        async fn encode(&self, _text: &str) -> Result<Vec<f32>> {
            Err(HyfuseError::embedding("session closed"))
        }

        async fn encode_many(&self, _texts: &[&str]) -> Result<Vec<Vec<f32>>> {
            Err(HyfuseError::embedding("session closed"))
        }

        fn dimension(&self) -> usize {
            1
        }
    }

    /// Returns ten points no matter what limit is asked for.
    struct OverfullIndex;

    #[async_trait]
    impl VectorIndex for OverfullIndex {
        async fn upsert(&self, _points: Vec<VectorPoint>) -> Result<()> {
            Ok(())
        }

        async fn query(&self, _vector: &[f32], _limit: usize) -> Result<Vec<ScoredPoint>> {
            Ok((0..10i64)
                .map(|i| {
                    let mut payload = Metadata::new();
                    payload.insert("slot".to_string(), json!(i));
                    ScoredPoint {
                        id: DocId::Int(i),
                        score: 1.0 - i as f32 * 0.05,
                        payload: Some(payload),
                    }
                })
                .collect())
        }

        async fn retrieve(&self, _ids: &[DocId]) -> Result<Vec<(DocId, Metadata)>> {
            Ok(Vec::new())
        }
    }

    struct OfflineIndex;

    #[async_trait]
    impl VectorIndex for OfflineIndex {
        async fn upsert(&self, _points: Vec<VectorPoint>) -> Result<()> {
            Err(HyfuseError::internal("timed out"))
        }

        async fn query(&self, _vector: &[f32], _limit: usize) -> Result<Vec<ScoredPoint>> {
            Err(HyfuseError::internal("timed out"))
        }

        async fn retrieve(&self, _ids: &[DocId]) -> Result<Vec<(DocId, Metadata)>> {
            Err(HyfuseError::internal("timed out"))
        }
    }

    #[tokio::test]
    async fn test_retrieve_truncates_oversized_response() {
        let retriever = DenseRetriever::new(Arc::new(UnitEmbedder), Arc::new(OverfullIndex));

        let points = retriever.retrieve("brake", 3).await.unwrap();

        assert_eq!(points.len(), 3);
        let ids: Vec<DocId> = points.iter().map(|p| p.id.clone()).collect();
        assert_eq!(ids, vec![DocId::Int(0), DocId::Int(1), DocId::Int(2)]);
        for (i, point) in points.iter().enumerate() {
            assert_eq!(point.payload.as_ref().unwrap()["slot"], json!(i));
        }
    }

    #[tokio::test]
    async fn test_embedder_failure_is_unavailable() {
        let retriever = DenseRetriever::new(Arc::new(FailingEmbedder), Arc::new(OverfullIndex));

        let err = retriever.retrieve("brake", 3).await.unwrap_err();
        assert!(matches!(err, HyfuseError::RetrievalUnavailable { .. }));
        assert!(err.to_string().contains("session closed"));
    }

    #[tokio::test]
    async fn test_index_failure_is_unavailable() {
        let retriever = DenseRetriever::new(Arc::new(UnitEmbedder), Arc::new(OfflineIndex));

        let err = retriever.retrieve("brake", 3).await.unwrap_err();
        assert!(matches!(err, HyfuseError::RetrievalUnavailable { .. }));

        let err = retriever.lookup(&[DocId::Int(1)]).await.unwrap_err();
        assert!(matches!(err, HyfuseError::RetrievalUnavailable { .. }));
    }

    #[tokio::test]
    async fn test_lookup_skips_empty_request() {
        let retriever = DenseRetriever::new(Arc::new(UnitEmbedder), Arc::new(OfflineIndex));
        assert!(retriever.lookup(&[]).await.unwrap().is_empty());
    }
}
