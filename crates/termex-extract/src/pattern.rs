use regex::Regex;
use termex_core::{ExtractionKind, TermCandidate, TermexError, TermexResult};

use crate::pipeline::SeenTerms;

/// Matches shorter than this many characters are ignored.
const MIN_MATCH_CHARS: usize = 2;

/// One regex rule bound to a category label and a fixed confidence.
#[derive(Debug, Clone, Copy)]
pub struct PatternRule {
    /// Regex source.
    pub pattern: &'static str,
    /// Label carried as the candidate's category hint.
    pub category: &'static str,
    /// Confidence of every match.
    pub confidence: f32,
}

/// Built-in rules, in evaluation order.
///
/// When two rules match the same string, the earlier rule's label wins.
pub const PATTERN_RULES: &[PatternRule] = &[
    PatternRule {
        pattern: r"[ァ-ヴー]{3,}",
        category: "カタカナ",
        confidence: 0.7,
    },
    PatternRule {
        pattern: r"[一-龯]{2,}[工事施構造材料設備管理]",
        category: "建築専門",
        confidence: 0.9,
    },
    PatternRule {
        pattern: r"[A-Z]{2,}",
        category: "略語",
        confidence: 0.8,
    },
    PatternRule {
        pattern: r"\d+[級種号型㎜cm階]",
        category: "規格",
        confidence: 0.8,
    },
    PatternRule {
        pattern: r"[一-龯]{2,}[性度率量値]",
        category: "性能",
        confidence: 0.6,
    },
];

struct CompiledRule {
    regex: Regex,
    category: &'static str,
    confidence: f32,
}

/// Regex-driven candidate detector over raw text.
pub struct PatternMatcher {
    rules: Vec<CompiledRule>,
}

impl PatternMatcher {
    /// Compile the built-in [`PATTERN_RULES`].
    pub fn new() -> TermexResult<Self> {
        Self::with_rules(PATTERN_RULES)
    }

    /// Compile a custom ordered rule table.
    pub fn with_rules(rules: &[PatternRule]) -> TermexResult<Self> {
        let rules = rules
            .iter()
            .map(|rule| {
                let regex = Regex::new(rule.pattern).map_err(|e| {
                    TermexError::Config(format!("Invalid pattern '{}': {e}", rule.pattern))
                })?;
                Ok(CompiledRule {
                    regex,
                    category: rule.category,
                    confidence: rule.confidence,
                })
            })
            .collect::<TermexResult<Vec<_>>>()?;
        Ok(Self { rules })
    }

    /// Detect candidates in `text` with a fresh dedup set.
    pub fn detect(&self, text: &str) -> Vec<TermCandidate> {
        let mut seen = SeenTerms::new();
        self.detect_into(text, &mut seen)
    }

    /// Detect candidates, skipping any surface form already in `seen`.
    pub fn detect_into(&self, text: &str, seen: &mut SeenTerms) -> Vec<TermCandidate> {
        let mut out = Vec::new();
        for rule in &self.rules {
            for m in rule.regex.find_iter(text) {
                let surface = m.as_str();
                if surface.chars().count() < MIN_MATCH_CHARS {
                    continue;
                }
                if seen.insert(surface) {
                    out.push(
                        TermCandidate::new(surface, ExtractionKind::Pattern, rule.confidence)
                            .with_hint(rule.category),
                    );
                }
            }
        }
        out
    }

    /// Number of compiled rules.
    pub fn rule_count(&self) -> usize {
        self.rules.len()
    }
}
