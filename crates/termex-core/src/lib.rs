//! Core types and error definitions for termex.
//!
//! Shared by the extraction pipeline, the index engine and the service
//! facade.
//!
//! # Main types
//!
//! - [`TermexError`]: Unified error enum for all termex crates.
//! - [`TermexResult`]: Convenience alias for `Result<T, TermexError>`.
//! - [`TermCandidate`]: A surface form produced by one extraction signal.
//! - [`ScoredCandidate`]: A candidate with its cross-document frequency.
//! - [`TermEntry`]: A term ready to be indexed.
//! - [`TermRecord`]: A stored, indexed term.

/// Error enum and result alias.
pub mod error;
/// Term candidate, entry and record types.
pub mod term;

pub use error::{TermexError, TermexResult};
pub use term::{
    dedup_preserving_order, ExtractionKind, ScoredCandidate, TermCandidate, TermEntry,
    TermRecord, DEFAULT_ENTRY_CONFIDENCE,
};
