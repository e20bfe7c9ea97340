//! hyfuse-core - Core types and traits for hybrid retrieval
//!
//! This crate provides the document model, the error taxonomy, the
//! configuration layer and the traits describing the two external
//! collaborators of the fusion engine: an [`Embedder`] and a [`VectorIndex`].

pub mod config;
pub mod error;
pub mod traits;
pub mod types;

pub use config::*;
pub use error::{HyfuseError, Result};
pub use traits::*;
pub use types::*;
