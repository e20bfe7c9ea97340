//! Configuration types for hyfuse.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Main configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct HyfuseConfig {
    /// Query-time defaults.
    #[serde(default)]
    pub search: SearchConfig,

    /// BM25 parameters.
    #[serde(default)]
    pub lexical: LexicalConfig,

    /// Embedding model configuration.
    #[serde(default)]
    pub embedding: EmbeddingConfig,

    /// Vector index population settings.
    #[serde(default)]
    pub index: IndexConfig,
}

/// Search configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchConfig {
    /// Default number of results.
    #[serde(default = "default_top_k")]
    pub default_top_k: usize,

    /// Mixing weight (1 = lexical only, 0 = dense only).
    #[serde(default = "default_alpha")]
    pub alpha: f64,

    /// Lexical candidate pool size.
    #[serde(default = "default_candidates")]
    pub lexical_candidates: usize,

    /// Dense candidate pool size.
    #[serde(default = "default_candidates")]
    pub dense_candidates: usize,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            default_top_k: 5,
            alpha: 0.5,
            lexical_candidates: 20,
            dense_candidates: 20,
        }
    }
}

/// BM25 configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LexicalConfig {
    /// Term-frequency saturation.
    #[serde(default = "default_k1")]
    pub k1: f64,

    /// Length normalization.
    #[serde(default = "default_b")]
    pub b: f64,

    /// Floor for negative IDF, as a fraction of the average IDF.
    #[serde(default = "default_epsilon")]
    pub epsilon: f64,
}

impl Default for LexicalConfig {
    fn default() -> Self {
        Self {
            k1: 1.5,
            b: 0.75,
            epsilon: 0.25,
        }
    }
}

/// Embedding configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EmbeddingConfig {
    /// Directory holding `model.onnx` and `tokenizer.json`.
    /// Falls back to the hashing embedder when unset.
    #[serde(default)]
    pub model_path: Option<PathBuf>,

    /// Embedding dimension.
    #[serde(default = "default_dimension")]
    pub dimension: usize,

    /// Batch size for corpus embedding.
    #[serde(default = "default_batch_size")]
    pub batch_size: usize,

    /// Number of threads for CPU inference.
    #[serde(default = "default_num_threads")]
    pub num_threads: usize,

    /// Maximum tokens per input.
    #[serde(default = "default_max_tokens")]
    pub max_tokens: usize,
}

impl Default for EmbeddingConfig {
    fn default() -> Self {
        Self {
            model_path: None,
            dimension: 384,
            batch_size: 256,
            num_threads: 4,
            max_tokens: 256,
        }
    }
}

impl EmbeddingConfig {
    /// Path to the ONNX model file, if a model directory is configured.
    pub fn model_file(&self) -> Option<PathBuf> {
        self.model_path.as_ref().map(|p| p.join("model.onnx"))
    }

    /// Path to the tokenizer file, if a model directory is configured.
    pub fn tokenizer_file(&self) -> Option<PathBuf> {
        self.model_path.as_ref().map(|p| p.join("tokenizer.json"))
    }
}

/// Vector index configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IndexConfig {
    /// Collection name used in log output.
    #[serde(default = "default_collection")]
    pub collection: String,

    /// Value stored under the `source` payload key.
    #[serde(default = "default_source")]
    pub source: String,
}

impl Default for IndexConfig {
    fn default() -> Self {
        Self {
            collection: default_collection(),
            source: default_source(),
        }
    }
}

// Default value functions

fn default_top_k() -> usize {
    5
}

fn default_alpha() -> f64 {
    0.5
}

fn default_candidates() -> usize {
    20
}

fn default_k1() -> f64 {
    1.5
}

fn default_b() -> f64 {
    0.75
}

fn default_epsilon() -> f64 {
    0.25
}

fn default_dimension() -> usize {
    384
}

fn default_batch_size() -> usize {
    256
}

fn default_num_threads() -> usize {
    4
}

fn default_max_tokens() -> usize {
    256
}

fn default_collection() -> String {
    "nhtsa_complaints".to_string()
}

fn default_source() -> String {
    "nhtsa_complaints".to_string()
}

impl HyfuseConfig {
    /// Load configuration from file.
    pub fn load(path: &Path) -> crate::error::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: Self = toml::from_str(&content).map_err(|e| {
            crate::error::HyfuseError::Config {
                message: format!("Failed to parse config: {}", e),
            }
        })?;
        Ok(config)
    }

    /// Load configuration from default paths.
    pub fn load_default() -> crate::error::Result<Self> {
        if let Some(config_dir) = dirs::config_dir() {
            let user_config = config_dir.join("hyfuse").join("config.toml");
            if user_config.exists() {
                return Self::load(&user_config);
            }
        }

        let local_config = PathBuf::from("hyfuse.toml");
        if local_config.exists() {
            return Self::load(&local_config);
        }

        Ok(Self::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_default_config() {
        let config = HyfuseConfig::default();
        assert_eq!(config.search.default_top_k, 5);
        assert_eq!(config.search.lexical_candidates, 20);
        assert_eq!(config.search.dense_candidates, 20);
        assert!((config.search.alpha - 0.5).abs() < f64::EPSILON);
        assert!((config.lexical.k1 - 1.5).abs() < f64::EPSILON);
        assert!(config.embedding.model_path.is_none());
        assert_eq!(config.embedding.dimension, 384);
        assert_eq!(config.embedding.max_tokens, 256);
    }

    #[test]
    fn test_partial_toml_keeps_defaults() {
        let config: HyfuseConfig = toml::from_str(
            r#"
            [search]
            alpha = 0.8

            [embedding]
            model_path = "/models/minilm"
            "#,
        )
        .unwrap();

        assert!((config.search.alpha - 0.8).abs() < f64::EPSILON);
        assert_eq!(config.search.default_top_k, 5);
        assert_eq!(config.embedding.batch_size, 256);
        assert_eq!(
            config.embedding.model_file(),
            Some(PathBuf::from("/models/minilm/model.onnx"))
        );
    }

    #[test]
    fn test_load_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "[lexical]\nk1 = 1.2\nb = 0.5").unwrap();

        let config = HyfuseConfig::load(file.path()).unwrap();
        assert!((config.lexical.k1 - 1.2).abs() < f64::EPSILON);
        assert!((config.lexical.b - 0.5).abs() < f64::EPSILON);
        assert!((config.lexical.epsilon - 0.25).abs() < f64::EPSILON);
    }

    #[test]
    fn test_load_invalid_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "[search\nalpha = ").unwrap();

        let err = HyfuseConfig::load(file.path()).unwrap_err();
        assert_eq!(err.error_code(), "CONFIG_ERROR");
    }
}
