//! Token stream contract of the morphological segmenter, and a script-run
//! segmenter used when no external analyzer is plugged in.

use serde::{Deserialize, Serialize};
use termex_core::TermexResult;

/// Coarse part-of-speech of a segmenter token.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PartOfSpeech {
    /// 名詞
    Noun,
    /// 動詞
    Verb,
    /// 形容詞
    Adjective,
    /// 助詞
    Particle,
    /// 助動詞
    Auxiliary,
    /// Punctuation and other symbols.
    Symbol,
    /// 空白
    Whitespace,
    /// Any tag not listed above.
    Other,
}

impl PartOfSpeech {
    /// Map a segmenter tag (UniDic-style Japanese or plain English) to a
    /// coarse part of speech.
    pub fn from_tag(tag: &str) -> Self {
        match tag.trim() {
            "名詞" | "代名詞" | "noun" | "Noun" => Self::Noun,
            "動詞" | "verb" | "Verb" => Self::Verb,
            "形容詞" | "形状詞" | "adjective" | "Adjective" => Self::Adjective,
            "助詞" | "particle" | "Particle" => Self::Particle,
            "助動詞" | "auxiliary" | "Auxiliary" => Self::Auxiliary,
            "補助記号" | "記号" | "symbol" | "Symbol" => Self::Symbol,
            "空白" | "whitespace" | "Whitespace" => Self::Whitespace,
            _ => Self::Other,
        }
    }
}

/// One segmenter token: a surface form with its part of speech.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Token {
    /// Text of the token.
    pub surface: String,
    /// Coarse part of speech.
    pub pos: PartOfSpeech,
}

impl Token {
    /// Token with an explicit part of speech.
    pub fn new(surface: impl Into<String>, pos: PartOfSpeech) -> Self {
        Self {
            surface: surface.into(),
            pos,
        }
    }

    /// Noun token.
    pub fn noun(surface: impl Into<String>) -> Self {
        Self::new(surface, PartOfSpeech::Noun)
    }
}

/// External morphological segmenter.
pub trait Segmenter: Send + Sync {
    /// Split text into an ordered token stream.
    fn segment(&self, text: &str) -> TermexResult<Vec<Token>>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Script {
    Kanji,
    Katakana,
    Hiragana,
    Latin,
    Digit,
    Space,
    Symbol,
}

impl Script {
    fn of(c: char) -> Self {
        match c {
            '々' | '〆' | '\u{3400}'..='\u{4DBF}' | '\u{4E00}'..='\u{9FFF}' => Self::Kanji,
            '\u{30A1}'..='\u{30FA}' | 'ー' => Self::Katakana,
            '\u{3041}'..='\u{3096}' => Self::Hiragana,
            'a'..='z' | 'A'..='Z' | 'ａ'..='ｚ' | 'Ａ'..='Ｚ' => Self::Latin,
            '0'..='9' | '０'..='９' => Self::Digit,
            c if c.is_whitespace() => Self::Space,
            _ => Self::Symbol,
        }
    }

    fn pos(self) -> PartOfSpeech {
        match self {
            Self::Kanji | Self::Katakana | Self::Latin | Self::Digit => PartOfSpeech::Noun,
            Self::Hiragana => PartOfSpeech::Particle,
            Self::Space => PartOfSpeech::Whitespace,
            Self::Symbol => PartOfSpeech::Symbol,
        }
    }
}

/// Splits text into maximal single-script runs.
///
/// Kanji, katakana, Latin and digit runs are tagged as nouns; hiragana runs
/// as particles. This approximates a noun chunker well enough for compound
/// detection but does not split kanji compounds the way a dictionary-backed
/// analyzer would.
#[derive(Debug, Default, Clone, Copy)]
pub struct ScriptSegmenter;

impl ScriptSegmenter {
    /// The segmenter has no state.
    pub fn new() -> Self {
        Self
    }
}

impl Segmenter for ScriptSegmenter {
    fn segment(&self, text: &str) -> TermexResult<Vec<Token>> {
        let mut tokens = Vec::new();
        let mut current = String::new();
        let mut current_script: Option<Script> = None;

        for c in text.chars() {
            let script = Script::of(c);
            if current_script != Some(script) {
                if let Some(prev) = current_script {
                    tokens.push(Token::new(std::mem::take(&mut current), prev.pos()));
                }
                current_script = Some(script);
            }
            current.push(c);
        }
        if let Some(prev) = current_script {
            tokens.push(Token::new(current, prev.pos()));
        }

        Ok(tokens)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    #[test]
    fn test_from_tag() {
        assert_eq!(PartOfSpeech::from_tag("名詞"), PartOfSpeech::Noun);
        assert_eq!(PartOfSpeech::from_tag("助詞"), PartOfSpeech::Particle);
        assert_eq!(PartOfSpeech::from_tag("補助記号"), PartOfSpeech::Symbol);
        assert_eq!(PartOfSpeech::from_tag("感動詞"), PartOfSpeech::Other);
    }

    #[test]
    fn test_script_runs() {
        let tokens = ScriptSegmenter::new()
            .segment("鉄筋コンクリート造の基礎")
            .unwrap();
        let surfaces: Vec<&str> = tokens.iter().map(|t| t.surface.as_str()).collect();
        assert_eq!(surfaces, vec!["鉄筋", "コンクリート", "造", "の", "基礎"]);
        assert_eq!(tokens[0].pos, PartOfSpeech::Noun);
        assert_eq!(tokens[3].pos, PartOfSpeech::Particle);
    }

    #[test]
    fn test_digits_and_units_split() {
        let tokens = ScriptSegmenter::new().segment("厚さ150mm。").unwrap();
        let surfaces: Vec<&str> = tokens.iter().map(|t| t.surface.as_str()).collect();
        assert_eq!(surfaces, vec!["厚", "さ", "150", "mm", "。"]);
        assert_eq!(tokens[4].pos, PartOfSpeech::Symbol);
    }

    #[test]
    fn test_empty_text() {
        assert!(ScriptSegmenter::new().segment("").unwrap().is_empty());
    }
}
