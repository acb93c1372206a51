use crate::analyze::analyze;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap, HashSet};
use termex_core::TermRecord;

/// BM25 parameters.
const K1: f32 = 1.2;
const B: f32 = 0.75;

/// The record fields covered by the sparse index.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Field {
    /// The canonical surface form.
    Term,
    /// All aliases, joined.
    Aliases,
    /// The category label.
    Category,
}

impl Field {
    /// Every indexed field, in scoring order.
    pub const ALL: [Field; 3] = [Field::Term, Field::Aliases, Field::Category];

    fn text(self, record: &TermRecord) -> String {
        match self {
            Field::Term => record.term.clone(),
            Field::Aliases => record.aliases.join(" "),
            Field::Category => record.category.clone(),
        }
    }
}

/// Inverted index and length statistics for one field.
///
/// Term frequencies and lengths are stored as integers so that a persisted
/// index scores exactly like the one it was written from.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
struct FieldIndex {
    /// term -> (record id -> term frequency)
    postings: HashMap<String, BTreeMap<u32, u32>>,
    /// record id -> field length in analyzed terms
    lengths: BTreeMap<u32, u32>,
    total_length: u64,
}

impl FieldIndex {
    fn add(&mut self, id: u32, text: &str) {
        let tokens = analyze(text);
        let mut tf: HashMap<String, u32> = HashMap::new();
        for token in &tokens {
            *tf.entry(token.clone()).or_insert(0) += 1;
        }
        for (token, count) in tf {
            self.postings.entry(token).or_default().insert(id, count);
        }
        let len = u32::try_from(tokens.len()).unwrap_or(u32::MAX);
        self.lengths.insert(id, len);
        self.total_length += u64::from(len);
    }

    fn score_into(&self, tokens: &[String], doc_count: usize, scores: &mut HashMap<u32, f32>) {
        let n = doc_count as f32;
        let avgdl = if self.total_length > 0 {
            self.total_length as f32 / n
        } else {
            1.0
        };

        for token in tokens {
            let Some(postings) = self.postings.get(token) else {
                continue;
            };
            let df = postings.len() as f32;
            // Robertson IDF, never negative
            let idf = ((n - df + 0.5) / (df + 0.5) + 1.0).ln();

            for (&id, &tf) in postings {
                let tf = tf as f32;
                let dl = self.lengths.get(&id).copied().unwrap_or(0) as f32;
                let numerator = tf * (K1 + 1.0);
                let denominator = tf + K1 * (1.0 - B + B * dl / avgdl);
                *scores.entry(id).or_insert(0.0) += idf * numerator / denominator;
            }
        }
    }
}

/// Multi-field BM25 index over term records.
///
/// A query is analyzed once and OR-matched against the term, alias and
/// category fields; a record's score is the sum of its field scores.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Bm25Index {
    term: FieldIndex,
    aliases: FieldIndex,
    category: FieldIndex,
    doc_count: usize,
}

impl Bm25Index {
    /// Create an empty index.
    pub fn new() -> Self {
        Self::default()
    }

    /// Index every record.
    pub fn from_records(records: &[TermRecord]) -> Self {
        let mut index = Self::new();
        for record in records {
            index.add_record(record);
        }
        index
    }

    /// Add one record. Ids are expected to be unique.
    pub fn add_record(&mut self, record: &TermRecord) {
        for field in Field::ALL {
            self.field_mut(field).add(record.id, &field.text(record));
        }
        self.doc_count += 1;
    }

    /// Return up to `top_k` `(id, score)` pairs, best first.
    ///
    /// Records matching no query term are not returned. Equal scores are
    /// ordered by ascending id.
    pub fn search(&self, query: &str, top_k: usize) -> Vec<(u32, f32)> {
        if self.doc_count == 0 || top_k == 0 {
            return Vec::new();
        }

        let mut seen = HashSet::new();
        let tokens: Vec<String> = analyze(query)
            .into_iter()
            .filter(|t| seen.insert(t.clone()))
            .collect();
        if tokens.is_empty() {
            return Vec::new();
        }

        let mut scores: HashMap<u32, f32> = HashMap::new();
        for field in Field::ALL {
            self.field(field)
                .score_into(&tokens, self.doc_count, &mut scores);
        }

        let mut results: Vec<(u32, f32)> = scores.into_iter().collect();
        results.sort_by(|a, b| b.1.total_cmp(&a.1).then(a.0.cmp(&b.0)));
        results.truncate(top_k);
        results
    }

    /// Number of indexed records.
    pub fn document_count(&self) -> usize {
        self.doc_count
    }

    fn field(&self, field: Field) -> &FieldIndex {
        match field {
            Field::Term => &self.term,
            Field::Aliases => &self.aliases,
            Field::Category => &self.category,
        }
    }

    fn field_mut(&mut self, field: Field) -> &mut FieldIndex {
        match field {
            Field::Term => &mut self.term,
            Field::Aliases => &mut self.aliases,
            Field::Category => &mut self.category,
        }
    }
}
