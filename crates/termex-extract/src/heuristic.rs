use regex::Regex;
use termex_core::{TermexError, TermexResult};

/// Substrings that mark a phrase as construction vocabulary.
pub const DOMAIN_KEYWORDS: &[&str] = &[
    "工事", "施工", "構造", "材料", "設備", "管理", "基礎", "躯体",
    "仕上げ", "配管", "配線", "防水", "断熱", "耐震", "免震", "制震",
    "鉄筋", "コンクリート", "鋼材", "木材", "石材", "タイル", "ガラス",
    "建築", "土木", "設計", "監理", "検査", "試験", "品質", "安全",
];

/// Katakana share above which a phrase counts as a loanword term.
const KATAKANA_RATIO: f64 = 0.7;

const NUMBER_WITH_UNIT: &str = r"\d+(?:mm|cm|m|kg|t|N|Pa|MPa|級|種|号)";

fn is_katakana(c: char) -> bool {
    ('ァ'..='ヴ').contains(&c)
}

/// Decides whether an assembled phrase is likely a construction term.
pub struct TermHeuristic {
    unit: Regex,
}

impl TermHeuristic {
    /// Compile the unit pattern.
    pub fn new() -> TermexResult<Self> {
        let unit = Regex::new(NUMBER_WITH_UNIT)
            .map_err(|e| TermexError::Config(format!("Invalid unit pattern: {e}")))?;
        Ok(Self { unit })
    }

    /// True if the phrase contains a domain keyword, is mostly katakana, or
    /// contains a number followed by a unit or classifier.
    pub fn is_likely_term(&self, phrase: &str) -> bool {
        if DOMAIN_KEYWORDS.iter().any(|k| phrase.contains(k)) {
            return true;
        }

        let total = phrase.chars().count();
        if total > 0 {
            let kana = phrase.chars().filter(|&c| is_katakana(c)).count();
            if kana as f64 / total as f64 > KATAKANA_RATIO {
                return true;
            }
        }

        self.unit.is_match(phrase)
    }
}
