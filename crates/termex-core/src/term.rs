use serde::{Deserialize, Serialize};

/// Confidence given to entries that arrive without one.
pub const DEFAULT_ENTRY_CONFIDENCE: f32 = 0.8;

/// Which extraction signal produced a candidate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExtractionKind {
    /// Match of a known dictionary term or alias.
    Dictionary,
    /// Regex rule match over the raw text.
    Pattern,
    /// Noun phrase assembled from segmenter tokens.
    Morphological,
}

/// An unconfirmed term surface form produced by one extraction signal.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TermCandidate {
    /// The surface form exactly as it appeared in the text.
    pub surface: String,
    /// The signal that produced it.
    pub kind: ExtractionKind,
    /// Fixed confidence of the producing rule, in [0, 1].
    pub confidence: f32,
    /// Label of the rule or dictionary entry that fired, if any.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category_hint: Option<String>,
}

impl TermCandidate {
    /// Creates a candidate without a category hint.
    pub fn new(surface: impl Into<String>, kind: ExtractionKind, confidence: f32) -> Self {
        Self {
            surface: surface.into(),
            kind,
            confidence,
            category_hint: None,
        }
    }

    /// Attaches the label of the rule that produced this candidate.
    pub fn with_hint(mut self, hint: impl Into<String>) -> Self {
        self.category_hint = Some(hint.into());
        self
    }
}

/// A candidate together with its cross-document frequency.
///
/// `candidate.confidence` already includes any frequency boost.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoredCandidate {
    /// First occurrence of the surface form.
    pub candidate: TermCandidate,
    /// Number of documents that emitted it.
    pub frequency: u32,
}

/// Input to an index build: one term with its metadata, before an id and
/// embedding are assigned.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TermEntry {
    /// Canonical surface form.
    pub term: String,
    /// Category label.
    pub category: String,
    /// Alternative spellings and abbreviations.
    #[serde(default)]
    pub aliases: Vec<String>,
    /// Confidence in [0, 1].
    #[serde(default = "default_confidence")]
    pub confidence: f32,
    /// Occurrence count, at least one.
    #[serde(default = "default_frequency")]
    pub frequency: u32,
}

fn default_confidence() -> f32 {
    DEFAULT_ENTRY_CONFIDENCE
}

fn default_frequency() -> u32 {
    1
}

impl TermEntry {
    /// Creates an entry with default confidence and a frequency of one.
    pub fn new(
        term: impl Into<String>,
        category: impl Into<String>,
        aliases: Vec<String>,
    ) -> Self {
        Self {
            term: term.into(),
            category: category.into(),
            aliases,
            confidence: DEFAULT_ENTRY_CONFIDENCE,
            frequency: 1,
        }
    }

    /// Replace the confidence.
    pub fn with_confidence(mut self, confidence: f32) -> Self {
        self.confidence = confidence;
        self
    }

    /// Replace the frequency.
    pub fn with_frequency(mut self, frequency: u32) -> Self {
        self.frequency = frequency;
        self
    }
}

/// A stored, indexed vocabulary entry.
///
/// `id` is the position of the record in the collection it was built into.
/// `score` is only set on copies returned from a search and is never
/// written to disk.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TermRecord {
    /// Position in the collection, contiguous from 0.
    pub id: u32,
    /// Canonical surface form.
    pub term: String,
    /// Category label.
    pub category: String,
    /// Deduplicated aliases.
    pub aliases: Vec<String>,
    /// Confidence in [0, 1].
    pub confidence: f32,
    /// Occurrence count, at least one.
    pub frequency: u32,
    /// Embedding of `term`.
    pub embedding: Vec<f32>,
    /// Query-time score.
    #[serde(skip)]
    pub score: Option<f32>,
}

impl TermRecord {
    /// Returns a copy of this record carrying a query-time score.
    pub fn scored(&self, score: f32) -> Self {
        Self {
            score: Some(score),
            ..self.clone()
        }
    }
}

/// Removes repeated aliases, keeping the first occurrence of each.
pub fn dedup_preserving_order(items: Vec<String>) -> Vec<String> {
    let mut out: Vec<String> = Vec::with_capacity(items.len());
    for item in items {
        if !item.is_empty() && !out.contains(&item) {
            out.push(item);
        }
    }
    out
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    fn record() -> TermRecord {
        TermRecord {
            id: 3,
            term: "基礎工事".to_string(),
            category: "施工".to_string(),
            aliases: vec!["基礎".to_string()],
            confidence: 0.9,
            frequency: 2,
            embedding: vec![0.5, 0.5],
            score: None,
        }
    }

    #[test]
    fn test_score_is_not_serialized() {
        let hit = record().scored(0.42);
        assert_eq!(hit.score, Some(0.42));

        let json = serde_json::to_string(&hit).unwrap();
        assert!(!json.contains("score"));

        let back: TermRecord = serde_json::from_str(&json).unwrap();
        assert_eq!(back.score, None);
        assert_eq!(back.term, "基礎工事");
    }

    #[test]
    fn test_entry_defaults_on_deserialize() {
        let entry: TermEntry =
            serde_json::from_str(r#"{"term":"RC","category":"構造"}"#).unwrap();
        assert_eq!(entry.confidence, DEFAULT_ENTRY_CONFIDENCE);
        assert_eq!(entry.frequency, 1);
        assert!(entry.aliases.is_empty());
    }

    #[test]
    fn test_dedup_preserving_order() {
        let out = dedup_preserving_order(vec![
            "RC".into(),
            "鉄コン".into(),
            "RC".into(),
            String::new(),
        ]);
        assert_eq!(out, vec!["RC".to_string(), "鉄コン".to_string()]);
    }

    #[test]
    fn test_candidate_kind_serializes_lowercase() {
        let c = TermCandidate::new("RC", ExtractionKind::Pattern, 0.8).with_hint("略語");
        let json = serde_json::to_value(&c).unwrap();
        assert_eq!(json["kind"], "pattern");
        assert_eq!(json["category_hint"], "略語");
    }
}
