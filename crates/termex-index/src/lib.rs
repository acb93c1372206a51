//! Dense, sparse and hybrid retrieval over a term collection.
//!
//! The engine embeds every term, indexes term, aliases and category with a
//! multi-field BM25 index, and blends both rankings with a tunable weight.
//! The published collection is an immutable snapshot that rebuilds replace
//! atomically, and that can be saved to and loaded from a directory.
//!
//! # Main types
//!
//! - [`TermIndex`]: The hybrid retrieval engine.
//! - [`IndexSnapshot`]: One built collection with both indexes.
//! - [`EmbeddingProvider`]: Trait for computing term embeddings.
//! - [`LocalEmbedding`]: Hashed bag-of-features embedder.
//! - [`DenseIndex`]: Exact nearest-neighbour vector index.
//! - [`Bm25Index`]: Multi-field BM25 index.

/// Text analyzer shared by both indexes.
pub mod analyze;
/// Multi-field BM25 index.
pub mod bm25;
/// Exact vector index.
pub mod dense;
/// Embedding provider trait and local implementation.
pub mod embedding;
/// Snapshot engine with hybrid search.
pub mod hybrid;
/// On-disk layout of a saved collection.
pub mod persist;

pub use analyze::analyze;
pub use bm25::{Bm25Index, Field};
pub use dense::DenseIndex;
pub use embedding::{EmbeddingProvider, LocalEmbedding};
pub use hybrid::{IndexInfo, IndexSnapshot, TermIndex};
pub use persist::{current_generation_dir, read_metadata, IndexMetadata};
