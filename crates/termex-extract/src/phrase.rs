use termex_core::{ExtractionKind, TermCandidate, TermexResult};

use crate::heuristic::TermHeuristic;
use crate::pipeline::SeenTerms;
use crate::segment::{PartOfSpeech, Token};

/// Confidence assigned to every morphological candidate.
pub const PHRASE_CONFIDENCE: f32 = 0.8;

/// Noun runs shorter than this are not phrases.
const MIN_PHRASE_TOKENS: usize = 2;

/// Assembles contiguous noun tokens into candidate phrases.
pub struct PhraseBuilder {
    heuristic: TermHeuristic,
}

impl PhraseBuilder {
    /// Create a builder with the default heuristic.
    pub fn new() -> TermexResult<Self> {
        Ok(Self {
            heuristic: TermHeuristic::new()?,
        })
    }

    /// Build phrases from a token stream with a fresh dedup set.
    pub fn build_phrases(&self, tokens: &[Token]) -> Vec<TermCandidate> {
        let mut seen = SeenTerms::new();
        self.build_into(tokens, &mut seen)
    }

    /// Build phrases, skipping any surface form already in `seen`.
    ///
    /// The pending noun run is flushed on every non-noun token and once
    /// more at end of stream.
    pub fn build_into(&self, tokens: &[Token], seen: &mut SeenTerms) -> Vec<TermCandidate> {
        let mut out = Vec::new();
        let mut run: Vec<&str> = Vec::new();

        for token in tokens {
            if token.pos == PartOfSpeech::Noun {
                run.push(&token.surface);
            } else {
                self.flush(&mut run, seen, &mut out);
            }
        }
        self.flush(&mut run, seen, &mut out);

        out
    }

    fn flush(&self, run: &mut Vec<&str>, seen: &mut SeenTerms, out: &mut Vec<TermCandidate>) {
        if run.len() >= MIN_PHRASE_TOKENS {
            let phrase = run.concat();
            if !seen.contains(&phrase) && self.heuristic.is_likely_term(&phrase) {
                seen.insert(&phrase);
                out.push(TermCandidate::new(
                    phrase,
                    ExtractionKind::Morphological,
                    PHRASE_CONFIDENCE,
                ));
            }
        }
        run.clear();
    }
}
