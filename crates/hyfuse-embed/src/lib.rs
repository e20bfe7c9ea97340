//! hyfuse-embed - Text embedding models
//!
//! This crate provides the [`Embedder`] implementations used to produce the
//! query and document vectors behind dense retrieval.
//!
//! # Features
//!
//! - ONNX Runtime sentence-transformer inference (all-MiniLM-L6-v2 layout)
//! - Mean pooling with attention mask and L2 normalization
//! - Deterministic feature-hashing embedder for tests and model-free runs

mod hashing;
mod onnx;
mod pooling;

pub use hashing::HashEmbedder;
pub use onnx::OnnxEmbedder;
pub use pooling::l2_normalize;

// Re-export the Embedder trait for convenience
pub use hyfuse_core::Embedder;
