use serde::{Deserialize, Serialize};
use termex_core::{TermRecord, TermexError, TermexResult};

/// One persisted vector, one JSON object per line.
#[derive(Debug, Serialize, Deserialize)]
struct DenseRow {
    id: u32,
    vector: Vec<f32>,
}

/// Exact nearest-neighbour index over fixed-dimension vectors.
///
/// Search is brute force over squared Euclidean distance. Scores are
/// reported as `1 / (1 + distance)`, so identical vectors score 1.0 and the
/// score falls toward 0 as vectors move apart.
#[derive(Debug, Clone, PartialEq)]
pub struct DenseIndex {
    dimension: usize,
    ids: Vec<u32>,
    vectors: Vec<Vec<f32>>,
}

impl DenseIndex {
    /// Create an empty index for vectors of `dimension` components.
    pub fn new(dimension: usize) -> Self {
        Self {
            dimension,
            ids: Vec::new(),
            vectors: Vec::new(),
        }
    }

    /// Index the embedding of every record.
    pub fn from_records(dimension: usize, records: &[TermRecord]) -> TermexResult<Self> {
        let mut index = Self::new(dimension);
        for record in records {
            index.add(record.id, record.embedding.clone())?;
        }
        Ok(index)
    }

    /// Append a vector under `id`.
    pub fn add(&mut self, id: u32, vector: Vec<f32>) -> TermexResult<()> {
        if vector.len() != self.dimension {
            return Err(TermexError::Dependency(format!(
                "vector for id {id} has {} components, expected {}",
                vector.len(),
                self.dimension
            )));
        }
        self.ids.push(id);
        self.vectors.push(vector);
        Ok(())
    }

    /// Return up to `top_k` `(id, similarity)` pairs, most similar first.
    ///
    /// Equal similarities are ordered by ascending id.
    pub fn search(&self, query: &[f32], top_k: usize) -> TermexResult<Vec<(u32, f32)>> {
        if query.len() != self.dimension {
            return Err(TermexError::Dependency(format!(
                "query vector has {} components, expected {}",
                query.len(),
                self.dimension
            )));
        }

        let mut scored: Vec<(u32, f32)> = self
            .ids
            .iter()
            .zip(&self.vectors)
            .map(|(&id, v)| (id, 1.0 / (1.0 + squared_l2(query, v))))
            .collect();
        scored.sort_by(|a, b| b.1.total_cmp(&a.1).then(a.0.cmp(&b.0)));
        scored.truncate(top_k);
        Ok(scored)
    }

    /// Vector dimension.
    pub fn dimension(&self) -> usize {
        self.dimension
    }

    /// Number of indexed vectors.
    pub fn len(&self) -> usize {
        self.ids.len()
    }

    /// True when nothing is indexed.
    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }

    /// Ids in insertion order.
    pub fn ids(&self) -> &[u32] {
        &self.ids
    }

    /// Serialize as JSONL.
    pub fn to_jsonl(&self) -> TermexResult<String> {
        let mut data = String::new();
        for (&id, vector) in self.ids.iter().zip(&self.vectors) {
            let row = DenseRow {
                id,
                vector: vector.clone(),
            };
            data.push_str(&serde_json::to_string(&row)?);
            data.push('\n');
        }
        Ok(data)
    }

    /// Parse JSONL written by [`DenseIndex::to_jsonl`].
    pub fn from_jsonl(dimension: usize, data: &str) -> TermexResult<Self> {
        let mut index = Self::new(dimension);
        for (n, line) in data.lines().enumerate() {
            if line.trim().is_empty() {
                continue;
            }
            let row: DenseRow = serde_json::from_str(line).map_err(|e| {
                TermexError::Persistence(format!("invalid dense row at line {}: {e}", n + 1))
            })?;
            index
                .add(row.id, row.vector)
                .map_err(|e| TermexError::Persistence(e.to_string()))?;
        }
        Ok(index)
    }
}

fn squared_l2(a: &[f32], b: &[f32]) -> f32 {
    a.iter().zip(b).map(|(x, y)| (x - y) * (x - y)).sum()
}
