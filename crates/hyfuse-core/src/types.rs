//! Core domain types for hyfuse.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::error::{HyfuseError, Result};

/// Arbitrary metadata attached to a document (the vector index "payload").
pub type Metadata = serde_json::Map<String, serde_json::Value>;

/// Document identifier, either an integer or a string.
///
/// Ordering places every integer id before every string id; this is the
/// secondary sort key used to break score ties.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(untagged)]
pub enum DocId {
    Int(i64),
    Str(String),
}

impl DocId {
    /// Parse an identifier from a JSON value.
    ///
    /// Integral numbers and numeric strings become [`DocId::Int`], any other
    /// non-empty string becomes [`DocId::Str`]. Everything else is rejected.
    pub fn from_json(value: &serde_json::Value) -> Option<Self> {
        match value {
            serde_json::Value::Number(n) => n.as_i64().map(Self::Int),
            serde_json::Value::String(s) => Self::parse(s),
            _ => None,
        }
    }

    /// Parse an identifier from text, preferring the integer form.
    pub fn parse(s: &str) -> Option<Self> {
        let trimmed = s.trim();
        if trimmed.is_empty() {
            return None;
        }
        Some(match trimmed.parse::<i64>() {
            Ok(n) => Self::Int(n),
            Err(_) => Self::Str(trimmed.to_string()),
        })
    }
}

impl std::fmt::Display for DocId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Int(n) => write!(f, "{}", n),
            Self::Str(s) => write!(f, "{}", s),
        }
    }
}

impl From<i64> for DocId {
    fn from(value: i64) -> Self {
        Self::Int(value)
    }
}

impl From<&str> for DocId {
    fn from(value: &str) -> Self {
        Self::Str(value.to_string())
    }
}

impl From<String> for DocId {
    fn from(value: String) -> Self {
        Self::Str(value)
    }
}

/// A document in the corpus.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Document {
    /// Unique identifier.
    pub id: DocId,

    /// Text body used for lexical scoring and embedding.
    pub text: String,

    /// Opaque metadata.
    #[serde(default)]
    pub metadata: Metadata,
}

impl Document {
    /// Create a document without metadata.
    pub fn new(id: impl Into<DocId>, text: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            text: text.into(),
            metadata: Metadata::new(),
        }
    }

    /// Attach metadata to the document.
    pub fn with_metadata(mut self, metadata: Metadata) -> Self {
        self.metadata = metadata;
        self
    }
}

/// An ordered, read-only collection of documents with O(1) id lookup.
#[derive(Debug, Clone, Default)]
pub struct Corpus {
    documents: Vec<Document>,
    positions: HashMap<DocId, usize>,
}

impl Corpus {
    /// Create an empty corpus.
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a corpus from documents, keeping the first occurrence of each id.
    ///
    /// Fails with [`HyfuseError::EmptyCorpus`] when no document remains.
    pub fn from_documents(documents: impl IntoIterator<Item = Document>) -> Result<Self> {
        let mut corpus = Self::new();
        for doc in documents {
            corpus.push(doc);
        }
        if corpus.is_empty() {
            return Err(HyfuseError::EmptyCorpus);
        }
        Ok(corpus)
    }

    /// Append a document, returning its position.
    ///
    /// Returns `None` and leaves the corpus unchanged if the id is already present.
    pub fn push(&mut self, doc: Document) -> Option<usize> {
        if self.positions.contains_key(&doc.id) {
            return None;
        }
        let position = self.documents.len();
        self.positions.insert(doc.id.clone(), position);
        self.documents.push(doc);
        Some(position)
    }

    /// Number of documents.
    pub fn len(&self) -> usize {
        self.documents.len()
    }

    /// Whether the corpus holds no documents.
    pub fn is_empty(&self) -> bool {
        self.documents.is_empty()
    }

    /// Document at a position.
    pub fn get(&self, position: usize) -> Option<&Document> {
        self.documents.get(position)
    }

    /// Position of a document id.
    pub fn position(&self, id: &DocId) -> Option<usize> {
        self.positions.get(id).copied()
    }

    /// Document by id.
    pub fn document(&self, id: &DocId) -> Option<&Document> {
        self.position(id).and_then(|p| self.documents.get(p))
    }

    /// Iterate documents in corpus order.
    pub fn iter(&self) -> std::slice::Iter<'_, Document> {
        self.documents.iter()
    }

    /// All documents in corpus order.
    pub fn documents(&self) -> &[Document] {
        &self.documents
    }
}

/// A vector to be stored in a [`crate::VectorIndex`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VectorPoint {
    pub id: DocId,
    pub vector: Vec<f32>,
    pub payload: Metadata,
}

/// A scored hit returned by a [`crate::VectorIndex`] query.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScoredPoint {
    /// Document id.
    pub id: DocId,

    /// Similarity score (higher is more similar).
    pub score: f32,

    /// Stored payload, if the backend returned one.
    pub payload: Option<Metadata>,
}

/// A fused search result.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchHit {
    /// Result rank (1-indexed).
    pub rank: usize,

    /// Document id.
    pub id: DocId,

    /// Combined score in [0, 1].
    pub score: f64,

    /// Normalized lexical contribution, if the lexical ranker surfaced the document.
    pub lexical_score: Option<f64>,

    /// Normalized dense contribution, if the dense ranker surfaced the document.
    pub dense_score: Option<f64>,

    /// Resolved metadata (empty when unresolved).
    pub metadata: Metadata,
}

/// Search results container.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchResults {
    /// The original query.
    pub query: String,

    /// Total results returned.
    pub total_results: usize,

    /// Search latency in milliseconds.
    pub latency_ms: u64,

    /// Reason the dense ranker was skipped, when the query degraded to lexical-only.
    pub dense_unavailable: Option<String>,

    /// Individual results.
    pub results: Vec<SearchHit>,
}
