//! Term-candidate extraction for construction-industry vocabulary.
//!
//! Turns raw text into deduplicated, confidence-scored term candidates by
//! running an ordered list of extraction stages over each document.
//!
//! # Main types
//!
//! - [`ExtractionPipeline`]: Ordered stages with a shared seen-set; single and batch extraction.
//! - [`PatternMatcher`]: Regex rule table bound to category labels and confidences.
//! - [`PhraseBuilder`]: Assembles contiguous nouns from a [`Segmenter`] token stream.
//! - [`TermHeuristic`]: Keyword / katakana / number-with-unit filter for phrases.
//! - [`TermDictionary`]: Explicit store of built-in and custom terms.
//! - [`categorize`] and [`generate_aliases`]: Static category and alias tables.

/// Category and alias assignment.
pub mod classify;
/// Built-in and custom term dictionary.
pub mod dictionary;
/// Construction-term heuristic for assembled phrases.
pub mod heuristic;
/// Regex pattern matcher.
pub mod pattern;
/// Morphological noun-phrase builder.
pub mod phrase;
/// Extraction stages and pipeline orchestration.
pub mod pipeline;
/// Segmenter contract and script-run segmenter.
pub mod segment;

pub use classify::{
    categorize, entry_for, entry_for_candidate, generate_aliases, DEFAULT_CATEGORY,
};
pub use dictionary::{DictionaryEntry, DictionaryStats, Removal, TermDictionary};
pub use heuristic::TermHeuristic;
pub use pattern::{PatternMatcher, PatternRule, PATTERN_RULES};
pub use phrase::PhraseBuilder;
pub use pipeline::{
    aggregate, ExtractionPipeline, ExtractionStage, SeenTerms, FREQUENCY_BOOST,
    FREQUENCY_BOOST_THRESHOLD,
};
pub use segment::{PartOfSpeech, ScriptSegmenter, Segmenter, Token};
