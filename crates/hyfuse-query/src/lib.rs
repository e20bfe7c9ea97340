//! hyfuse-query - Hybrid search and score fusion
//!
//! This crate combines a BM25 ranking over the whole corpus with a dense
//! nearest-neighbour ranking into one ordered result list.
//!
//! # Features
//!
//! - Concurrent lexical scan and dense retrieval
//! - Per-side min-max normalization over retrieved candidates
//! - Single `alpha` mixing weight
//! - Deterministic tie-break on ascending document id
//! - Lexical-only fallback when the dense backend is unavailable
//!
//! # Example
//!
//! ```rust,ignore
//! use hyfuse_query::{HybridSearchEngine, SearchOptions};
//! use std::sync::Arc;
//!
//! let engine = HybridSearchEngine::new(Arc::new(ranker), Arc::new(embedder), Arc::new(index));
//! let results = engine.search("tesla low beam too bright", SearchOptions::default()).await?;
//! ```

mod dense;
mod engine;
mod fusion;
mod indexer;

pub use dense::DenseRetriever;
pub use engine::{HybridSearchEngine, SearchOptions};
pub use fusion::{fuse, union_candidates, FusedCandidate, MinMax, ScoredCandidate};
pub use indexer::index_corpus;

// Re-export for convenience
pub use hyfuse_core::{SearchHit, SearchResults};
