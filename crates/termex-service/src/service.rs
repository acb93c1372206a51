use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::sync::Arc;

use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use termex_core::{TermCandidate, TermRecord, TermexError, TermexResult};
use termex_extract::{
    aggregate, entry_for, entry_for_candidate, ExtractionPipeline, ScriptSegmenter, Segmenter,
    TermDictionary,
};
use termex_index::{EmbeddingProvider, IndexInfo, LocalEmbedding, TermIndex};
use tokio::task::JoinHandle;
use tracing::{info, warn};

use crate::config::TermexConfig;
use crate::documents::{self, DocumentSource, PlainTextSource};

/// Which ranking a search uses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SearchMode {
    /// Embedding similarity only.
    Dense,
    /// BM25 over term, aliases and category only.
    Sparse,
    /// Weighted blend of both.
    #[default]
    Hybrid,
}

impl FromStr for SearchMode {
    type Err = TermexError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "dense" | "vector" => Ok(Self::Dense),
            "sparse" | "text" => Ok(Self::Sparse),
            "hybrid" => Ok(Self::Hybrid),
            other => Err(TermexError::Input(format!("unknown search mode '{other}'"))),
        }
    }
}

impl fmt::Display for SearchMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Dense => "dense",
            Self::Sparse => "sparse",
            Self::Hybrid => "hybrid",
        };
        f.write_str(name)
    }
}

/// A term extracted from a single text, before indexing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExtractedTerm {
    /// Surface form.
    pub term: String,
    /// Category from the keyword table.
    pub category: String,
    /// Generated aliases.
    pub aliases: Vec<String>,
    /// Extraction confidence.
    pub confidence: f32,
    /// Always one for a single text.
    pub frequency: u32,
}

impl ExtractedTerm {
    fn from_candidate(candidate: &TermCandidate) -> Self {
        let entry = entry_for_candidate(candidate);
        Self {
            term: entry.term,
            category: entry.category,
            aliases: entry.aliases,
            confidence: entry.confidence,
            frequency: 1,
        }
    }
}

/// Outcome of a multi-document extraction.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BatchReport {
    /// Documents handed in, including unreadable ones.
    pub document_count: usize,
    /// Candidates summed over documents, so a term found in three
    /// documents counts three times. This is the sum of all frequencies,
    /// not the post-aggregation term count that
    /// [`unique_candidates`](Self::unique_candidates) reports.
    pub total_candidates: usize,
    /// Distinct surface forms.
    pub unique_candidates: usize,
    /// Whether a background rebuild was started.
    pub rebuild_started: bool,
}

/// Facade over extraction and the term index.
///
/// This is the surface an outer routing layer calls. It validates request
/// parameters against the configuration and never waits on background
/// rebuilds unless asked to through [`wait_for_rebuild`](Self::wait_for_rebuild).
pub struct TermService {
    config: TermexConfig,
    pipeline: ExtractionPipeline,
    dictionary: Arc<TermDictionary>,
    index: Arc<TermIndex>,
    documents: Arc<dyn DocumentSource>,
    pending_rebuild: Mutex<Option<JoinHandle<()>>>,
}

impl TermService {
    /// Wire the default components: the script segmenter, the local
    /// embedder and plain-text documents.
    pub fn new(config: TermexConfig) -> TermexResult<Self> {
        let embedder: Arc<dyn EmbeddingProvider> =
            Arc::new(LocalEmbedding::new(config.embedding.dimension));
        let segmenter: Arc<dyn Segmenter> = Arc::new(ScriptSegmenter::new());
        Self::with_components(
            config,
            segmenter,
            embedder,
            Arc::new(TermDictionary::new()),
            Arc::new(PlainTextSource),
        )
    }

    /// Wire caller-supplied components.
    pub fn with_components(
        config: TermexConfig,
        segmenter: Arc<dyn Segmenter>,
        embedder: Arc<dyn EmbeddingProvider>,
        dictionary: Arc<TermDictionary>,
        documents: Arc<dyn DocumentSource>,
    ) -> TermexResult<Self> {
        config.validate()?;
        let mut pipeline = ExtractionPipeline::new(segmenter)?;
        if config.extraction.use_dictionary {
            pipeline = pipeline.with_dictionary(Arc::clone(&dictionary));
        }
        let index = Arc::new(TermIndex::new(embedder, config.data_dir.clone()));
        Ok(Self {
            config,
            pipeline,
            dictionary,
            index,
            documents,
            pending_rebuild: Mutex::new(None),
        })
    }

    /// Active configuration.
    pub fn config(&self) -> &TermexConfig {
        &self.config
    }

    /// The custom term dictionary.
    pub fn dictionary(&self) -> &Arc<TermDictionary> {
        &self.dictionary
    }

    /// The underlying index engine.
    pub fn index(&self) -> &Arc<TermIndex> {
        &self.index
    }

    /// Extract terms from one text, dropping those below `min_confidence`.
    pub fn extract(&self, text: &str, min_confidence: f32) -> TermexResult<Vec<ExtractedTerm>> {
        if text.trim().is_empty() {
            return Err(TermexError::Input("text must not be empty".to_string()));
        }
        if !(0.0..=1.0).contains(&min_confidence) {
            return Err(TermexError::Input(format!(
                "min_confidence must be within [0, 1], got {min_confidence}"
            )));
        }

        Ok(self
            .pipeline
            .extract(text)
            .iter()
            .filter(|c| c.confidence >= min_confidence)
            .map(ExtractedTerm::from_candidate)
            .collect())
    }

    /// Extract terms from several documents and count them across documents.
    ///
    /// An unreadable document is logged and counted but contributes no
    /// candidates. With `rebuild` set and at least one candidate found, the
    /// index is rebuilt from the results on a background task and this
    /// call returns without waiting for it.
    pub async fn extract_batch(
        &self,
        handles: &[PathBuf],
        rebuild: bool,
    ) -> TermexResult<BatchReport> {
        let mut per_document = Vec::with_capacity(handles.len());
        for path in handles {
            match self.documents.read_text(path).await {
                Ok(text) => per_document.push(self.pipeline.extract(&text)),
                Err(e) => {
                    warn!(path = %path.display(), error = %e, "Skipping unreadable document");
                    per_document.push(Vec::new());
                }
            }
        }

        let total_candidates = per_document.iter().map(Vec::len).sum();
        let scored = aggregate(per_document);

        let rebuild_started = rebuild && !scored.is_empty();
        if rebuild_started {
            let entries = scored.iter().map(entry_for).collect();
            let handle = self.index.spawn_rebuild(entries);
            *self.pending_rebuild.lock() = Some(handle);
        }

        let report = BatchReport {
            document_count: handles.len(),
            total_candidates,
            unique_candidates: scored.len(),
            rebuild_started,
        };
        info!(
            documents = report.document_count,
            candidates = report.total_candidates,
            unique = report.unique_candidates,
            rebuild = report.rebuild_started,
            "Batch extraction finished"
        );
        Ok(report)
    }

    /// Search the index.
    ///
    /// `limit` and `alpha` fall back to the configured defaults. `alpha` is
    /// only used in [`SearchMode::Hybrid`].
    pub async fn search(
        &self,
        query: &str,
        mode: SearchMode,
        limit: Option<usize>,
        alpha: Option<f32>,
    ) -> TermexResult<Vec<TermRecord>> {
        let limit = limit.unwrap_or(self.config.search.default_limit);
        if limit == 0 || limit > self.config.search.max_limit {
            return Err(TermexError::Input(format!(
                "limit must be within 1..={}, got {limit}",
                self.config.search.max_limit
            )));
        }

        match mode {
            SearchMode::Dense => self.index.search_dense(query, limit).await,
            SearchMode::Sparse => self.index.search_sparse(query, limit),
            SearchMode::Hybrid => {
                let alpha = alpha.unwrap_or(self.config.search.default_alpha);
                self.index.search(query, limit, alpha).await
            }
        }
    }

    /// Records in id order, optionally restricted to one category, then
    /// paginated.
    pub fn list_all(&self, category: Option<&str>, offset: usize, limit: usize) -> Vec<TermRecord> {
        self.index
            .snapshot()
            .records()
            .iter()
            .filter(|r| category.map_or(true, |c| r.category == c))
            .skip(offset)
            .take(limit)
            .cloned()
            .collect()
    }

    /// Collection statistics.
    pub fn info(&self) -> IndexInfo {
        self.index.info()
    }

    /// Load the persisted collection from the data directory.
    pub async fn load(&self) -> TermexResult<usize> {
        self.index.load().await
    }

    /// Index the dictionary entries directly and persist the result.
    pub async fn build_from_dictionary(&self) -> TermexResult<usize> {
        self.index.rebuild(self.dictionary.to_term_entries()).await
    }

    /// Documents in `dir` with the configured extension.
    pub async fn documents_in(&self, dir: &Path) -> TermexResult<Vec<PathBuf>> {
        documents::documents_in(dir, &self.config.extraction.document_extension).await
    }

    /// Wait for the most recently started background rebuild, if any.
    pub async fn wait_for_rebuild(&self) -> TermexResult<()> {
        let handle = self.pending_rebuild.lock().take();
        if let Some(handle) = handle {
            handle
                .await
                .map_err(|e| TermexError::Dependency(format!("rebuild task failed: {e}")))?;
        }
        Ok(())
    }
}
