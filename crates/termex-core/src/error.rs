use thiserror::Error;

/// A convenience `Result` alias using [`TermexError`].
pub type TermexResult<T> = Result<T, TermexError>;

/// Top-level error type shared by every termex crate.
///
/// Searching an index that holds no records is not an error; it yields an
/// empty result list.
#[derive(Error, Debug)]
pub enum TermexError {
    /// Empty or malformed caller input (query, text, limit, alpha).
    #[error("Input error: {0}")]
    Input(String),

    /// An external collaborator failed: segmenter, embedder or document reader.
    #[error("Dependency error: {0}")]
    Dependency(String),

    /// Reading or writing the persisted index failed.
    #[error("Persistence error: {0}")]
    Persistence(String),

    /// Invalid configuration value.
    #[error("Config error: {0}")]
    Config(String),

    /// A JSON serialization or deserialization error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// A standard I/O error.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl TermexError {
    /// True when the caller supplied bad input.
    pub fn is_input(&self) -> bool {
        matches!(self, Self::Input(_))
    }

    /// True when an external dependency failed.
    pub fn is_dependency(&self) -> bool {
        matches!(self, Self::Dependency(_))
    }
}
