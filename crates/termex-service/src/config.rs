use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use termex_core::{TermexError, TermexResult};
use tracing::debug;

/// Top-level configuration, usually read from `termex.toml`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TermexConfig {
    /// Directory the index is persisted into.
    #[serde(default = "default_data_dir")]
    pub data_dir: PathBuf,
    /// Embedding settings.
    #[serde(default)]
    pub embedding: EmbeddingConfig,
    /// Search defaults and limits.
    #[serde(default)]
    pub search: SearchConfig,
    /// Extraction settings.
    #[serde(default)]
    pub extraction: ExtractionConfig,
}

/// `[embedding]` section.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EmbeddingConfig {
    /// Vector dimension of the local embedder.
    #[serde(default = "default_dimension")]
    pub dimension: usize,
}

/// `[search]` section.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchConfig {
    /// Result count when the caller gives none.
    #[serde(default = "default_limit")]
    pub default_limit: usize,
    /// Largest accepted result count.
    #[serde(default = "default_max_limit")]
    pub max_limit: usize,
    /// Dense weight when the caller gives none.
    #[serde(default = "default_alpha")]
    pub default_alpha: f32,
}

/// `[extraction]` section.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExtractionConfig {
    /// Candidates below this confidence are dropped from single-text results.
    #[serde(default = "default_min_confidence")]
    pub min_confidence: f32,
    /// File extension of batch documents.
    #[serde(default = "default_document_extension")]
    pub document_extension: String,
    /// Run the dictionary stage before pattern matching.
    #[serde(default = "default_use_dictionary")]
    pub use_dictionary: bool,
}

impl Default for TermexConfig {
    fn default() -> Self {
        Self {
            data_dir: default_data_dir(),
            embedding: EmbeddingConfig::default(),
            search: SearchConfig::default(),
            extraction: ExtractionConfig::default(),
        }
    }
}

impl Default for EmbeddingConfig {
    fn default() -> Self {
        Self {
            dimension: default_dimension(),
        }
    }
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            default_limit: default_limit(),
            max_limit: default_max_limit(),
            default_alpha: default_alpha(),
        }
    }
}

impl Default for ExtractionConfig {
    fn default() -> Self {
        Self {
            min_confidence: default_min_confidence(),
            document_extension: default_document_extension(),
            use_dictionary: default_use_dictionary(),
        }
    }
}

fn default_data_dir() -> PathBuf {
    PathBuf::from("./data/term_db")
}
fn default_dimension() -> usize {
    256
}
fn default_limit() -> usize {
    10
}
fn default_max_limit() -> usize {
    100
}
fn default_alpha() -> f32 {
    0.5
}
fn default_min_confidence() -> f32 {
    0.5
}
fn default_document_extension() -> String {
    "txt".to_string()
}
fn default_use_dictionary() -> bool {
    true
}

impl TermexConfig {
    /// Read and validate a TOML config file. A missing file yields the
    /// defaults.
    pub async fn load(path: &Path) -> TermexResult<Self> {
        if !path.exists() {
            debug!(path = %path.display(), "Config file not found, using defaults");
            return Ok(Self::default());
        }
        let text = tokio::fs::read_to_string(path).await.map_err(|e| {
            TermexError::Config(format!("failed to read '{}': {e}", path.display()))
        })?;
        Self::from_toml_str(&text)
    }

    /// Parse and validate TOML text.
    pub fn from_toml_str(text: &str) -> TermexResult<Self> {
        let config: Self =
            toml::from_str(text).map_err(|e| TermexError::Config(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Reject values no component can work with.
    pub fn validate(&self) -> TermexResult<()> {
        if self.embedding.dimension == 0 {
            return Err(TermexError::Config(
                "embedding.dimension must be at least 1".to_string(),
            ));
        }
        if self.search.max_limit == 0 {
            return Err(TermexError::Config(
                "search.max_limit must be at least 1".to_string(),
            ));
        }
        if self.search.default_limit == 0 || self.search.default_limit > self.search.max_limit {
            return Err(TermexError::Config(format!(
                "search.default_limit must be within 1..={}",
                self.search.max_limit
            )));
        }
        if !(0.0..=1.0).contains(&self.search.default_alpha) {
            return Err(TermexError::Config(
                "search.default_alpha must be within [0, 1]".to_string(),
            ));
        }
        if !(0.0..=1.0).contains(&self.extraction.min_confidence) {
            return Err(TermexError::Config(
                "extraction.min_confidence must be within [0, 1]".to_string(),
            ));
        }
        Ok(())
    }
}
