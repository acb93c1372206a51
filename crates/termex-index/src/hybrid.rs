use std::collections::{BTreeMap, HashMap, HashSet};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use chrono::{DateTime, Utc};
use parking_lot::RwLock;
use serde::Serialize;
use termex_core::{dedup_preserving_order, TermEntry, TermRecord, TermexError, TermexResult};
use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};

use crate::bm25::Bm25Index;
use crate::dense::DenseIndex;
use crate::embedding::EmbeddingProvider;
use crate::persist;

/// An immutable, fully built term collection together with both indexes.
///
/// Readers hold an `Arc` to one snapshot for the duration of a query, so a
/// concurrent rebuild can never mix two collections into one answer.
#[derive(Debug, Clone)]
pub struct IndexSnapshot {
    records: Vec<TermRecord>,
    dense: DenseIndex,
    sparse: Bm25Index,
    built_at: Option<DateTime<Utc>>,
}

impl IndexSnapshot {
    /// A snapshot with no records.
    pub fn empty(dimension: usize) -> Self {
        Self::from_parts(Vec::new(), DenseIndex::new(dimension), Bm25Index::new(), None)
    }

    /// Build both indexes from records that already carry embeddings.
    pub fn assemble(
        dimension: usize,
        records: Vec<TermRecord>,
        built_at: Option<DateTime<Utc>>,
    ) -> TermexResult<Self> {
        let dense = DenseIndex::from_records(dimension, &records)?;
        let sparse = Bm25Index::from_records(&records);
        Ok(Self::from_parts(records, dense, sparse, built_at))
    }

    pub(crate) fn from_parts(
        records: Vec<TermRecord>,
        dense: DenseIndex,
        sparse: Bm25Index,
        built_at: Option<DateTime<Utc>>,
    ) -> Self {
        let records = records
            .into_iter()
            .map(|r| TermRecord { score: None, ..r })
            .collect();
        Self {
            records,
            dense,
            sparse,
            built_at,
        }
    }

    /// Records in id order.
    pub fn records(&self) -> &[TermRecord] {
        &self.records
    }

    /// Record with the given id.
    pub fn get(&self, id: u32) -> Option<&TermRecord> {
        self.records.get(id as usize)
    }

    /// Number of records.
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// True when the snapshot holds no records.
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// When the snapshot was built, if it was built at all.
    pub fn built_at(&self) -> Option<DateTime<Utc>> {
        self.built_at
    }

    /// The dense index.
    pub fn dense(&self) -> &DenseIndex {
        &self.dense
    }

    /// The sparse index.
    pub fn sparse(&self) -> &Bm25Index {
        &self.sparse
    }

    fn resolve(&self, hits: Vec<(u32, f32)>) -> Vec<TermRecord> {
        hits.into_iter()
            .filter_map(|(id, score)| self.get(id).map(|r| r.scored(score)))
            .collect()
    }
}

/// Collection statistics.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct IndexInfo {
    /// Number of records in the published collection.
    pub total_records: usize,
    /// Record count per category.
    pub counts_by_category: BTreeMap<String, usize>,
    /// When the published collection was built.
    pub last_build: Option<DateTime<Utc>>,
}

/// Hybrid retrieval engine over a term collection.
///
/// Owns the published [`IndexSnapshot`]. Builds are serialized by an async
/// mutex and construct the next snapshot off to the side before swapping
/// it in; searches only clone the current `Arc` and never wait on a build.
///
/// Hybrid scores are a linear blend of the two rankings:
/// ```text
/// score = alpha * dense_similarity + (1 - alpha) * bm25_score
/// ```
/// with 0 substituted for a side on which the record was not retrieved.
pub struct TermIndex {
    embedder: Arc<dyn EmbeddingProvider>,
    dir: PathBuf,
    current: RwLock<Arc<IndexSnapshot>>,
    build_lock: Mutex<()>,
}

impl TermIndex {
    /// Create an empty engine persisting into `dir`.
    pub fn new(embedder: Arc<dyn EmbeddingProvider>, dir: impl Into<PathBuf>) -> Self {
        let dimension = embedder.dimension();
        Self {
            embedder,
            dir: dir.into(),
            current: RwLock::new(Arc::new(IndexSnapshot::empty(dimension))),
            build_lock: Mutex::new(()),
        }
    }

    /// Embedding dimension of this engine.
    pub fn dimension(&self) -> usize {
        self.embedder.dimension()
    }

    /// Persistence directory.
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// The currently published snapshot.
    pub fn snapshot(&self) -> Arc<IndexSnapshot> {
        self.current.read().clone()
    }

    /// Replace the collection and both indexes with ones built from
    /// `entries`. Returns the new record count.
    ///
    /// Empty terms are skipped and later duplicates of a term are dropped.
    /// On error the previous collection stays published.
    pub async fn build(&self, entries: Vec<TermEntry>) -> TermexResult<usize> {
        let _guard = self.build_lock.lock().await;
        let snapshot = self.assemble(entries).await?;
        Ok(self.publish(snapshot))
    }

    /// [`build`](Self::build), then [`save`](Self::save) the result.
    pub async fn rebuild(&self, entries: Vec<TermEntry>) -> TermexResult<usize> {
        let _guard = self.build_lock.lock().await;
        let snapshot = Arc::new(self.assemble(entries).await?);
        persist::write_snapshot(&self.dir, &snapshot).await?;
        let count = snapshot.len();
        *self.current.write() = snapshot;
        info!(records = count, dir = %self.dir.display(), "Term index rebuilt and saved");
        Ok(count)
    }

    /// Run [`rebuild`](Self::rebuild) on a background task.
    ///
    /// The outcome is only logged. Callers observe it through
    /// [`info`](Self::info) or the persisted metadata.
    pub fn spawn_rebuild(self: &Arc<Self>, entries: Vec<TermEntry>) -> JoinHandle<()> {
        let index = Arc::clone(self);
        tokio::spawn(async move {
            match index.rebuild(entries).await {
                Ok(count) => info!(records = count, "Background rebuild finished"),
                Err(e) => error!(error = %e, "Background rebuild failed"),
            }
        })
    }

    /// Dense-only search.
    pub async fn search_dense(&self, query: &str, k: usize) -> TermexResult<Vec<TermRecord>> {
        validate_query(query, k)?;
        let snapshot = self.snapshot();
        if snapshot.is_empty() {
            return Ok(Vec::new());
        }
        let hits = self.dense_hits(&snapshot, query, k).await?;
        Ok(snapshot.resolve(hits))
    }

    /// Sparse-only search.
    pub fn search_sparse(&self, query: &str, k: usize) -> TermexResult<Vec<TermRecord>> {
        validate_query(query, k)?;
        let snapshot = self.snapshot();
        let hits = snapshot.sparse.search(query, k);
        Ok(snapshot.resolve(hits))
    }

    /// Hybrid search blending dense and sparse scores with weight `alpha`.
    ///
    /// Each side is asked for `2k` hits before merging. A side with zero
    /// weight is not queried, so `alpha = 1.0` equals
    /// [`search_dense`](Self::search_dense) and `alpha = 0.0` equals
    /// [`search_sparse`](Self::search_sparse).
    pub async fn search(
        &self,
        query: &str,
        k: usize,
        alpha: f32,
    ) -> TermexResult<Vec<TermRecord>> {
        validate_query(query, k)?;
        if !(0.0..=1.0).contains(&alpha) {
            return Err(TermexError::Input(format!(
                "alpha must be within [0, 1], got {alpha}"
            )));
        }

        let snapshot = self.snapshot();
        if snapshot.is_empty() {
            return Ok(Vec::new());
        }

        let fetch_k = k.saturating_mul(2);
        let dense_hits = if alpha > 0.0 {
            self.dense_hits(&snapshot, query, fetch_k).await?
        } else {
            Vec::new()
        };
        let sparse_hits = if alpha < 1.0 {
            snapshot.sparse.search(query, fetch_k)
        } else {
            Vec::new()
        };

        let mut combined: HashMap<u32, f32> = HashMap::new();
        for (id, score) in dense_hits {
            *combined.entry(id).or_insert(0.0) += alpha * score;
        }
        for (id, score) in sparse_hits {
            *combined.entry(id).or_insert(0.0) += (1.0 - alpha) * score;
        }

        let mut ranked: Vec<(u32, f32)> = combined.into_iter().collect();
        ranked.sort_by(|a, b| b.1.total_cmp(&a.1).then(a.0.cmp(&b.0)));
        ranked.truncate(k);

        debug!(query, k, alpha, hits = ranked.len(), "Hybrid search");
        Ok(snapshot.resolve(ranked))
    }

    /// All records of the published collection, in id order.
    pub fn records(&self) -> Vec<TermRecord> {
        self.snapshot().records.clone()
    }

    /// Record with the given id.
    pub fn get(&self, id: u32) -> Option<TermRecord> {
        self.snapshot().get(id).cloned()
    }

    /// Number of published records.
    pub fn len(&self) -> usize {
        self.snapshot().len()
    }

    /// True when no records are published.
    pub fn is_empty(&self) -> bool {
        self.snapshot().is_empty()
    }

    /// Statistics for the published collection.
    pub fn info(&self) -> IndexInfo {
        let snapshot = self.snapshot();
        let mut counts_by_category = BTreeMap::new();
        for record in &snapshot.records {
            *counts_by_category
                .entry(record.category.clone())
                .or_insert(0) += 1;
        }
        IndexInfo {
            total_records: snapshot.len(),
            counts_by_category,
            last_build: snapshot.built_at,
        }
    }

    /// Persist the published collection and both indexes.
    ///
    /// Serialized with builds and loads, so what lands on disk is the
    /// collection published when the save started.
    pub async fn save(&self) -> TermexResult<()> {
        let _guard = self.build_lock.lock().await;
        let snapshot = self.snapshot();
        persist::write_snapshot(&self.dir, &snapshot).await?;
        info!(records = snapshot.len(), dir = %self.dir.display(), "Term index saved");
        Ok(())
    }

    /// Replace the published collection with the persisted one.
    ///
    /// A directory without saved files yields an empty collection. A
    /// persisted collection that fails validation leaves the current one
    /// in place. Returns the loaded record count.
    pub async fn load(&self) -> TermexResult<usize> {
        let _guard = self.build_lock.lock().await;
        let snapshot = persist::read_snapshot(&self.dir, self.dimension())
            .await?
            .unwrap_or_else(|| IndexSnapshot::empty(self.dimension()));
        let count = snapshot.len();
        *self.current.write() = Arc::new(snapshot);
        info!(records = count, dir = %self.dir.display(), "Term index loaded");
        Ok(count)
    }

    async fn assemble(&self, entries: Vec<TermEntry>) -> TermexResult<IndexSnapshot> {
        let entries = prepare_entries(entries);
        info!(entries = entries.len(), "Building term index");

        let texts: Vec<&str> = entries.iter().map(|e| e.term.as_str()).collect();
        let embeddings = self
            .embedder
            .embed_batch(&texts)
            .await
            .map_err(as_dependency)?;
        if embeddings.len() != entries.len() {
            return Err(TermexError::Dependency(format!(
                "embedder returned {} vectors for {} terms",
                embeddings.len(),
                entries.len()
            )));
        }

        let mut records = Vec::with_capacity(entries.len());
        for (position, (entry, embedding)) in entries.into_iter().zip(embeddings).enumerate() {
            let id = u32::try_from(position)
                .map_err(|_| TermexError::Input("too many terms for one index".to_string()))?;
            records.push(TermRecord {
                id,
                term: entry.term,
                category: entry.category,
                aliases: entry.aliases,
                confidence: entry.confidence,
                frequency: entry.frequency,
                embedding,
                score: None,
            });
        }

        IndexSnapshot::assemble(self.dimension(), records, Some(Utc::now()))
    }

    fn publish(&self, snapshot: IndexSnapshot) -> usize {
        let count = snapshot.len();
        *self.current.write() = Arc::new(snapshot);
        info!(records = count, "Term index built");
        count
    }

    async fn dense_hits(
        &self,
        snapshot: &IndexSnapshot,
        query: &str,
        k: usize,
    ) -> TermexResult<Vec<(u32, f32)>> {
        let vector = self.embedder.embed(query).await.map_err(as_dependency)?;
        snapshot.dense.search(&vector, k)
    }
}

/// Drop empty and repeated terms and bring confidence, frequency and
/// aliases into their valid ranges.
fn prepare_entries(entries: Vec<TermEntry>) -> Vec<TermEntry> {
    let mut seen = HashSet::new();
    let mut prepared = Vec::with_capacity(entries.len());
    for mut entry in entries {
        entry.term = entry.term.trim().to_string();
        if entry.term.is_empty() {
            warn!("Skipping entry with an empty term");
            continue;
        }
        if !seen.insert(entry.term.clone()) {
            debug!(term = %entry.term, "Skipping duplicate term");
            continue;
        }
        entry.confidence = if entry.confidence.is_nan() {
            0.0
        } else {
            entry.confidence.clamp(0.0, 1.0)
        };
        entry.frequency = entry.frequency.max(1);
        entry.aliases = dedup_preserving_order(entry.aliases);
        prepared.push(entry);
    }
    prepared
}

fn validate_query(query: &str, k: usize) -> TermexResult<()> {
    if query.trim().is_empty() {
        return Err(TermexError::Input("query must not be empty".to_string()));
    }
    if k == 0 {
        return Err(TermexError::Input("limit must be at least 1".to_string()));
    }
    Ok(())
}

fn as_dependency(e: TermexError) -> TermexError {
    match e {
        TermexError::Dependency(_) => e,
        other => TermexError::Dependency(format!("embedding failed: {other}")),
    }
}
