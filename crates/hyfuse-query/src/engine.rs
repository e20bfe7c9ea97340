//! Query engine for hybrid search.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Instant;

use tracing::{debug, info, warn};

use hyfuse_core::{
    DocId, Embedder, HyfuseError, Metadata, Result, SearchConfig, SearchHit, SearchResults,
    VectorIndex,
};
use hyfuse_lexical::{LexicalRanker, LexicalSnapshot};

use crate::dense::DenseRetriever;
use crate::fusion::{fuse, FusedCandidate};

/// Parameters for a single search.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SearchOptions {
    /// Maximum number of results to return.
    pub top_k: usize,

    /// Weight of the lexical side (1.0 = lexical only, 0.0 = dense only).
    pub alpha: f64,

    /// Lexical candidate pool size.
    pub lexical_candidates: usize,

    /// Dense candidate pool size.
    pub dense_candidates: usize,
}

impl Default for SearchOptions {
    fn default() -> Self {
        Self {
            top_k: 5,
            alpha: 0.5,
            lexical_candidates: 20,
            dense_candidates: 20,
        }
    }
}

impl From<&SearchConfig> for SearchOptions {
    fn from(config: &SearchConfig) -> Self {
        Self {
            top_k: config.default_top_k,
            alpha: config.alpha,
            lexical_candidates: config.lexical_candidates,
            dense_candidates: config.dense_candidates,
        }
    }
}

impl SearchOptions {
    /// Set the number of results to return.
    pub fn with_top_k(mut self, top_k: usize) -> Self {
        self.top_k = top_k;
        self
    }

    /// Set the lexical weight.
    pub fn with_alpha(mut self, alpha: f64) -> Self {
        self.alpha = alpha;
        self
    }

    /// Set both candidate pool sizes.
    pub fn with_candidates(mut self, lexical: usize, dense: usize) -> Self {
        self.lexical_candidates = lexical;
        self.dense_candidates = dense;
        self
    }

    /// Reject out-of-contract values. Nothing is clamped.
    pub fn validate(&self) -> Result<()> {
        if self.top_k == 0 {
            return Err(HyfuseError::invalid_parameter("top_k", "must be greater than 0"));
        }
        if !(0.0..=1.0).contains(&self.alpha) {
            return Err(HyfuseError::invalid_parameter(
                "alpha",
                format!("must be within [0, 1], got {}", self.alpha),
            ));
        }
        if self.lexical_candidates == 0 {
            return Err(HyfuseError::invalid_parameter(
                "lexical_candidates",
                "must be greater than 0",
            ));
        }
        if self.dense_candidates == 0 {
            return Err(HyfuseError::invalid_parameter(
                "dense_candidates",
                "must be greater than 0",
            ));
        }
        Ok(())
    }
}

/// Hybrid search query engine.
///
/// Scores the whole corpus lexically and fetches dense neighbours
/// concurrently, then fuses the two candidate pools with min-max normalized
/// weighted scores.
pub struct HybridSearchEngine<E: ?Sized, V: ?Sized> {
    /// Lexical snapshot holder.
    lexical: Arc<LexicalRanker>,

    /// Dense retrieval boundary.
    dense: DenseRetriever<E, V>,
}

impl<E, V> HybridSearchEngine<E, V>
where
    E: Embedder + ?Sized,
    V: VectorIndex + ?Sized,
{
    /// Create a new query engine.
    pub fn new(lexical: Arc<LexicalRanker>, embedder: Arc<E>, index: Arc<V>) -> Self {
        Self {
            lexical,
            dense: DenseRetriever::new(embedder, index),
        }
    }

    /// The lexical ranker, e.g. to trigger a rebuild.
    pub fn lexical(&self) -> &Arc<LexicalRanker> {
        &self.lexical
    }

    /// Perform a hybrid search.
    ///
    /// Fails only on invalid options or if the lexical scan itself dies. A
    /// dense backend failure degrades the query to lexical-only and is
    /// reported in [`SearchResults::dense_unavailable`].
    pub async fn search(&self, query: &str, options: SearchOptions) -> Result<SearchResults> {
        options.validate()?;
        let start = Instant::now();

        info!("Searching for: {:?}", query);

        let snapshot = self.lexical.snapshot();
        let lexical_scan = {
            let snapshot = Arc::clone(&snapshot);
            let query = query.to_string();
            let limit = options.lexical_candidates;
            tokio::task::spawn_blocking(move || snapshot.top_candidates(&query, limit))
        };

        let (lexical, dense) = tokio::join!(
            lexical_scan,
            self.dense.retrieve(query, options.dense_candidates)
        );

        let lexical = lexical
            .map_err(|e| HyfuseError::internal(format!("Lexical scan failed: {}", e)))?;

        let (dense, alpha, dense_unavailable) = match dense {
            Ok(points) => (points, options.alpha, None),
            Err(e) => {
                warn!(
                    code = e.error_code(),
                    "Falling back to lexical-only ranking: {}", e
                );
                (Vec::new(), 1.0, Some(e.to_string()))
            }
        };

        debug!(
            "Lexical search returned {} candidates, dense search returned {} candidates",
            lexical.len(),
            dense.len()
        );

        let mut fused = fuse(&lexical, dense, alpha);
        debug!("Fused to {} candidates", fused.len());
        fused.truncate(options.top_k);

        let results = self
            .resolve_metadata(fused, &snapshot, dense_unavailable.is_none())
            .await;

        let latency_ms = start.elapsed().as_millis() as u64;

        info!(
            "Search completed in {}ms, returned {} results",
            latency_ms,
            results.len()
        );

        Ok(SearchResults {
            query: query.to_string(),
            total_results: results.len(),
            latency_ms,
            dense_unavailable,
            results,
        })
    }

    /// Attach metadata to each fused candidate.
    ///
    /// Dense payloads are used as-is; the remaining ids go to the vector index
    /// in a single lookup, then to the corpus. Anything still missing gets an
    /// empty mapping.
    async fn resolve_metadata(
        &self,
        fused: Vec<FusedCandidate>,
        snapshot: &LexicalSnapshot,
        index_reachable: bool,
    ) -> Vec<SearchHit> {
        let missing: Vec<DocId> = fused
            .iter()
            .filter(|c| c.payload.is_none())
            .map(|c| c.id.clone())
            .collect();

        let mut looked_up: HashMap<DocId, Metadata> = if index_reachable && !missing.is_empty() {
            match self.dense.lookup(&missing).await {
                Ok(found) => found,
                Err(e) => {
                    warn!("Payload lookup failed, using corpus metadata: {}", e);
                    HashMap::new()
                }
            }
        } else {
            HashMap::new()
        };

        fused
            .into_iter()
            .enumerate()
            .map(|(i, candidate)| {
                let metadata = candidate
                    .payload
                    .or_else(|| looked_up.remove(&candidate.id))
                    .or_else(|| {
                        snapshot
                            .corpus()
                            .document(&candidate.id)
                            .map(|doc| doc.metadata.clone())
                    })
                    .unwrap_or_else(|| {
                        let unresolved = HyfuseError::MetadataUnresolved {
                            id: candidate.id.to_string(),
                        };
                        debug!(code = unresolved.error_code(), "{}", unresolved);
                        Metadata::new()
                    });

                SearchHit {
                    rank: i + 1,
                    id: candidate.id,
                    score: candidate.combined,
                    lexical_score: candidate.lexical,
                    dense_score: candidate.dense,
                    metadata,
                }
            })
            .collect()
    }
}
