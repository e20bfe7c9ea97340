//! hyfuse-store - Vector index implementations
//!
//! This crate provides an exact cosine-similarity [`VectorIndex`] kept in
//! memory. It answers the same `upsert` / `query` / `retrieve` contract a
//! remote vector database would.

mod distance;
mod memory;

pub use distance::cosine_similarity;
pub use memory::MemoryVectorIndex;

// Re-export the VectorIndex trait for convenience
pub use hyfuse_core::VectorIndex;
