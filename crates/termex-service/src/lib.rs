//! Extraction and search facade for termex.
//!
//! [`TermService`] exposes the operations an outer routing layer needs:
//! single-text extraction, multi-document extraction with an optional
//! background rebuild, search in three modes, listing and statistics.
//!
//! # Main types
//!
//! - [`TermService`]: The facade.
//! - [`TermexConfig`]: TOML configuration.
//! - [`DocumentSource`]: Trait turning a document handle into text.
//! - [`SearchMode`]: Dense, sparse or hybrid ranking.

/// TOML configuration with defaults.
pub mod config;
/// Document handles and text extraction.
pub mod documents;
/// The service facade.
pub mod service;

pub use config::{EmbeddingConfig, ExtractionConfig, SearchConfig, TermexConfig};
pub use documents::{documents_in, DocumentSource, PlainTextSource};
pub use service::{BatchReport, ExtractedTerm, SearchMode, TermService};
