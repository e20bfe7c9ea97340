//! Error types for hyfuse.

use thiserror::Error;

/// Result type alias using HyfuseError.
pub type Result<T> = std::result::Result<T, HyfuseError>;

/// Errors that can occur while loading, indexing or searching.
#[derive(Error, Debug)]
pub enum HyfuseError {
    /// A corpus record was malformed and has been skipped.
    #[error("Malformed corpus record at line {line}: {reason}")]
    CorpusLoad { line: usize, reason: String },

    /// No valid records remained after loading the corpus.
    #[error("Corpus contains no valid records")]
    EmptyCorpus,

    /// The dense retrieval backend could not answer the query.
    #[error("Dense retrieval unavailable: {reason}")]
    RetrievalUnavailable { reason: String },

    /// No payload could be found for a candidate.
    #[error("Metadata unresolved for document {id}")]
    MetadataUnresolved { id: String },

    /// A query parameter violated its contract.
    #[error("Invalid query parameter `{name}`: {reason}")]
    InvalidQueryParameter { name: &'static str, reason: String },

    /// A vector did not have the dimension the index expects.
    #[error("Vector dimension mismatch: expected {expected}, got {actual}")]
    DimensionMismatch { expected: usize, actual: usize },

    /// Embedding model error.
    #[error("Embedding error: {message}")]
    Embedding { message: String },

    /// IO error.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization error.
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Configuration error.
    #[error("Configuration error: {message}")]
    Config { message: String },

    /// Internal error (unexpected).
    #[error("Internal error: {message}")]
    Internal { message: String },
}

impl HyfuseError {
    /// Create a corpus load error for the given 1-based line.
    pub fn corpus_load(line: usize, reason: impl Into<String>) -> Self {
        Self::CorpusLoad {
            line,
            reason: reason.into(),
        }
    }

    /// Create a retrieval unavailable error.
    pub fn retrieval_unavailable(reason: impl Into<String>) -> Self {
        Self::RetrievalUnavailable {
            reason: reason.into(),
        }
    }

    /// Create an invalid query parameter error.
    pub fn invalid_parameter(name: &'static str, reason: impl Into<String>) -> Self {
        Self::InvalidQueryParameter {
            name,
            reason: reason.into(),
        }
    }

    /// Create an embedding error.
    pub fn embedding(message: impl Into<String>) -> Self {
        Self::Embedding {
            message: message.into(),
        }
    }

    /// Create an internal error.
    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal {
            message: message.into(),
        }
    }

    /// Whether the error only degrades a query instead of failing it.
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            Self::CorpusLoad { .. } | Self::RetrievalUnavailable { .. } | Self::MetadataUnresolved { .. }
        )
    }

    /// Get a stable error code for logs and machine-readable output.
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::CorpusLoad { .. } => "CORPUS_LOAD_ERROR",
            Self::EmptyCorpus => "EMPTY_CORPUS",
            Self::RetrievalUnavailable { .. } => "RETRIEVAL_UNAVAILABLE",
            Self::MetadataUnresolved { .. } => "METADATA_UNRESOLVED",
            Self::InvalidQueryParameter { .. } => "INVALID_QUERY_PARAMETER",
            Self::DimensionMismatch { .. } => "DIMENSION_MISMATCH",
            Self::Embedding { .. } => "EMBEDDING_ERROR",
            Self::Io(_) => "IO_ERROR",
            Self::Serialization(_) => "SERIALIZATION_ERROR",
            Self::Config { .. } => "CONFIG_ERROR",
            Self::Internal { .. } => "INTERNAL_ERROR",
        }
    }
}
