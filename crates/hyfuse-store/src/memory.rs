//! Exact in-memory vector index.

use std::collections::HashMap;
use std::sync::RwLock;

use async_trait::async_trait;
use tracing::debug;

use hyfuse_core::{
    DocId, HyfuseError, Metadata, Result, ScoredPoint, VectorIndex, VectorPoint,
};

use crate::distance::cosine_similarity;

#[derive(Debug, Default)]
struct Points {
    entries: Vec<VectorPoint>,
    positions: HashMap<DocId, usize>,
}

/// Brute-force cosine-similarity index.
///
/// Scans every stored vector per query. Ties are ordered by ascending id so
/// repeated queries return identical lists.
#[derive(Debug)]
pub struct MemoryVectorIndex {
    dimension: usize,
    points: RwLock<Points>,
}

impl MemoryVectorIndex {
    /// Create an empty index for vectors of the given dimension.
    pub fn new(dimension: usize) -> Self {
        Self {
            dimension,
            points: RwLock::new(Points::default()),
        }
    }

    /// Vector dimension accepted by the index.
    pub fn dimension(&self) -> usize {
        self.dimension
    }

    /// Number of stored points.
    pub fn len(&self) -> usize {
        let guard = self.points.read().unwrap_or_else(|e| e.into_inner());
        guard.entries.len()
    }

    /// Whether the index holds no points.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn check_dimension(&self, vector: &[f32]) -> Result<()> {
        if vector.len() != self.dimension {
            return Err(HyfuseError::DimensionMismatch {
                expected: self.dimension,
                actual: vector.len(),
            });
        }
        Ok(())
    }

    fn lock_error<E: std::fmt::Display>(e: E) -> HyfuseError {
        HyfuseError::internal(format!("Vector index lock poisoned: {}", e))
    }
}

#[async_trait]
impl VectorIndex for MemoryVectorIndex {
    async fn upsert(&self, points: Vec<VectorPoint>) -> Result<()> {
        for point in &points {
            self.check_dimension(&point.vector)?;
        }

        let mut guard = self.points.write().map_err(Self::lock_error)?;
        let stored = &mut *guard;
        let count = points.len();
        for point in points {
            match stored.positions.get(&point.id).copied() {
                Some(position) => stored.entries[position] = point,
                None => {
                    stored.positions.insert(point.id.clone(), stored.entries.len());
                    stored.entries.push(point);
                }
            }
        }

        debug!("Upserted {} points, index size {}", count, stored.entries.len());
        Ok(())
    }

    async fn query(&self, vector: &[f32], limit: usize) -> Result<Vec<ScoredPoint>> {
        self.check_dimension(vector)?;

        let guard = self.points.read().map_err(Self::lock_error)?;
        let mut scored: Vec<(f32, &VectorPoint)> = guard
            .entries
            .iter()
            .map(|p| (cosine_similarity(vector, &p.vector), p))
            .collect();

        scored.sort_by(|a, b| b.0.total_cmp(&a.0).then_with(|| a.1.id.cmp(&b.1.id)));
        scored.truncate(limit);

        Ok(scored
            .into_iter()
            .map(|(score, p)| ScoredPoint {
                id: p.id.clone(),
                score,
                payload: Some(p.payload.clone()),
            })
            .collect())
    }

    async fn retrieve(&self, ids: &[DocId]) -> Result<Vec<(DocId, Metadata)>> {
        let guard = self.points.read().map_err(Self::lock_error)?;
        Ok(ids
            .iter()
            .filter_map(|id| {
                guard
                    .positions
                    .get(id)
                    .map(|&position| (id.clone(), guard.entries[position].payload.clone()))
            })
            .collect())
    }
}
