//! hyfuse-lexical - Sparse lexical ranking
//!
//! This crate scores every document of a corpus against a free-text query
//! with BM25 Okapi, and loads corpora from line-delimited JSON.
//!
//! # Features
//!
//! - One tokenizer shared by index build and query time
//! - BM25 Okapi with negative-IDF flooring
//! - Read-only snapshots with atomic rebuild
//! - Skip-and-log JSONL corpus loading

mod bm25;
mod loader;
mod ranker;
mod tokenizer;

pub use bm25::{top_n, Bm25Index, Bm25Params};
pub use loader::{load_jsonl, load_jsonl_path, LoadReport};
pub use ranker::{LexicalRanker, LexicalSnapshot};
pub use tokenizer::tokenize;
