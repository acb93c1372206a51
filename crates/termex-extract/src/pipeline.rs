use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use termex_core::{ExtractionKind, ScoredCandidate, TermCandidate, TermexResult};
use tracing::{debug, warn};

use crate::dictionary::{TermDictionary, ALIAS_HIT_CONFIDENCE, TERM_HIT_CONFIDENCE};
use crate::pattern::PatternMatcher;
use crate::phrase::PhraseBuilder;
use crate::segment::{ScriptSegmenter, Segmenter};

/// Cross-document frequency above which confidence is boosted.
pub const FREQUENCY_BOOST_THRESHOLD: u32 = 3;
/// Amount added once to the confidence of frequent terms.
pub const FREQUENCY_BOOST: f32 = 0.1;

/// Surface forms already emitted during one extraction call.
///
/// Shared by every stage so the first stage to emit a string owns it.
#[derive(Debug, Default)]
pub struct SeenTerms(HashSet<String>);

impl SeenTerms {
    /// An empty set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Record `surface`. Returns `true` if it was not seen before.
    pub fn insert(&mut self, surface: &str) -> bool {
        if self.0.contains(surface) {
            return false;
        }
        self.0.insert(surface.to_string())
    }

    /// True if `surface` was already emitted.
    pub fn contains(&self, surface: &str) -> bool {
        self.0.contains(surface)
    }

    /// Number of distinct surface forms.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// True when nothing was emitted yet.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/// One extractor in the pipeline.
///
/// A stage that fails must return before inserting anything into `seen`.
pub trait ExtractionStage: Send + Sync {
    /// Short name used in logs.
    fn name(&self) -> &'static str;

    /// Emit candidates from `text` not already in `seen`.
    fn run(&self, text: &str, seen: &mut SeenTerms) -> TermexResult<Vec<TermCandidate>>;
}

/// Verbatim hits of dictionary terms and their aliases.
pub struct DictionaryStage {
    dictionary: Arc<TermDictionary>,
}

impl DictionaryStage {
    /// Stage matching the entries of `dictionary`.
    pub fn new(dictionary: Arc<TermDictionary>) -> Self {
        Self { dictionary }
    }
}

impl ExtractionStage for DictionaryStage {
    fn name(&self) -> &'static str {
        "dictionary"
    }

    fn run(&self, text: &str, seen: &mut SeenTerms) -> TermexResult<Vec<TermCandidate>> {
        let mut out = Vec::new();
        for entry in self.dictionary.entries() {
            if text.contains(entry.term.as_str()) && seen.insert(&entry.term) {
                out.push(
                    TermCandidate::new(&entry.term, ExtractionKind::Dictionary, TERM_HIT_CONFIDENCE)
                        .with_hint(&entry.category),
                );
            }
            for alias in &entry.aliases {
                if text.contains(alias.as_str()) && seen.insert(alias) {
                    out.push(
                        TermCandidate::new(alias, ExtractionKind::Dictionary, ALIAS_HIT_CONFIDENCE)
                            .with_hint(&entry.category),
                    );
                }
            }
        }
        Ok(out)
    }
}

/// Regex rule matches.
pub struct PatternStage {
    matcher: PatternMatcher,
}

impl PatternStage {
    /// Stage running `matcher`.
    pub fn new(matcher: PatternMatcher) -> Self {
        Self { matcher }
    }
}

impl ExtractionStage for PatternStage {
    fn name(&self) -> &'static str {
        "pattern"
    }

    fn run(&self, text: &str, seen: &mut SeenTerms) -> TermexResult<Vec<TermCandidate>> {
        Ok(self.matcher.detect_into(text, seen))
    }
}

/// Noun phrases assembled from segmenter output.
pub struct PhraseStage {
    segmenter: Arc<dyn Segmenter>,
    builder: PhraseBuilder,
}

impl PhraseStage {
    /// Stage segmenting text and assembling noun phrases.
    pub fn new(segmenter: Arc<dyn Segmenter>, builder: PhraseBuilder) -> Self {
        Self { segmenter, builder }
    }
}

impl ExtractionStage for PhraseStage {
    fn name(&self) -> &'static str {
        "morphological"
    }

    fn run(&self, text: &str, seen: &mut SeenTerms) -> TermexResult<Vec<TermCandidate>> {
        let tokens = self.segmenter.segment(text)?;
        Ok(self.builder.build_into(&tokens, seen))
    }
}

/// Ordered list of extraction stages sharing one dedup set per document.
pub struct ExtractionPipeline {
    stages: Vec<Box<dyn ExtractionStage>>,
}

impl ExtractionPipeline {
    /// Pattern stage followed by the morphological stage.
    pub fn new(segmenter: Arc<dyn Segmenter>) -> TermexResult<Self> {
        Ok(Self::from_stages(vec![
            Box::new(PatternStage::new(PatternMatcher::new()?)),
            Box::new(PhraseStage::new(segmenter, PhraseBuilder::new()?)),
        ]))
    }

    /// [`ExtractionPipeline::new`] with the built-in [`ScriptSegmenter`].
    pub fn with_script_segmenter() -> TermexResult<Self> {
        Self::new(Arc::new(ScriptSegmenter::new()))
    }

    /// A pipeline running exactly `stages`, in order.
    pub fn from_stages(stages: Vec<Box<dyn ExtractionStage>>) -> Self {
        Self { stages }
    }

    /// Put a dictionary stage in front of the existing stages.
    pub fn with_dictionary(mut self, dictionary: Arc<TermDictionary>) -> Self {
        self.stages.insert(0, Box::new(DictionaryStage::new(dictionary)));
        self
    }

    /// Stage names in run order.
    pub fn stage_names(&self) -> Vec<&'static str> {
        self.stages.iter().map(|s| s.name()).collect()
    }

    /// Extract deduplicated candidates from one document.
    ///
    /// A failing stage is logged and contributes nothing; the remaining
    /// stages still run.
    pub fn extract(&self, text: &str) -> Vec<TermCandidate> {
        let mut seen = SeenTerms::new();
        let mut out = Vec::new();
        for stage in &self.stages {
            match stage.run(text, &mut seen) {
                Ok(found) => out.extend(found),
                Err(e) => warn!(stage = stage.name(), error = %e, "Extraction stage failed"),
            }
        }
        debug!(candidates = out.len(), chars = text.chars().count(), "Extracted candidates");
        out
    }

    /// Extract from many documents and aggregate cross-document frequency.
    pub fn extract_batch<I, S>(&self, documents: I) -> Vec<ScoredCandidate>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let per_document = documents
            .into_iter()
            .map(|doc| self.extract(doc.as_ref()))
            .collect();
        aggregate(per_document)
    }
}

/// Fold per-document candidate lists into frequency-scored candidates.
///
/// Each document contributes at most one occurrence per surface form. The
/// first occurrence supplies the raw confidence. Terms seen in more than
/// [`FREQUENCY_BOOST_THRESHOLD`] documents get [`FREQUENCY_BOOST`] added
/// once, capped at 1.0. Results are ordered by frequency, then confidence,
/// both descending.
pub fn aggregate(per_document: Vec<Vec<TermCandidate>>) -> Vec<ScoredCandidate> {
    let mut first_seen: Vec<TermCandidate> = Vec::new();
    let mut frequency: HashMap<String, u32> = HashMap::new();

    for document in per_document {
        let mut in_document: HashSet<String> = HashSet::new();
        for candidate in document {
            if !in_document.insert(candidate.surface.clone()) {
                continue;
            }
            match frequency.get_mut(&candidate.surface) {
                Some(count) => *count += 1,
                None => {
                    frequency.insert(candidate.surface.clone(), 1);
                    first_seen.push(candidate);
                }
            }
        }
    }

    let mut scored: Vec<ScoredCandidate> = first_seen
        .into_iter()
        .map(|mut candidate| {
            let freq = frequency.get(&candidate.surface).copied().unwrap_or(1);
            if freq > FREQUENCY_BOOST_THRESHOLD {
                candidate.confidence = (candidate.confidence + FREQUENCY_BOOST).min(1.0);
            }
            ScoredCandidate {
                candidate,
                frequency: freq,
            }
        })
        .collect();

    scored.sort_by(|a, b| {
        b.frequency
            .cmp(&a.frequency)
            .then_with(|| b.candidate.confidence.total_cmp(&a.candidate.confidence))
    });
    scored
}
