use termex_core::{dedup_preserving_order, ScoredCandidate, TermCandidate, TermEntry};

/// Category used when no keyword matches.
pub const DEFAULT_CATEGORY: &str = "一般";

/// Particle stripped to build a spelling variant.
pub const LINKING_PARTICLE: char = 'の';

/// Ordered category table. The first category with a keyword contained in
/// the term wins, even if a later one fits better.
pub const CATEGORY_RULES: &[(&str, &[&str])] = &[
    ("構造", &["鉄筋", "コンクリート", "鉄骨", "基礎", "柱", "梁", "耐震"]),
    ("設備", &["空調", "給排水", "電気", "配管", "配線", "消防"]),
    ("仕上げ", &["塗装", "タイル", "クロス", "床", "天井", "壁"]),
    ("材料", &["セメント", "鋼材", "木材", "石材", "ガラス"]),
    ("施工", &["工事", "施工", "工程", "現場", "作業"]),
    ("管理", &["品質", "安全", "工程", "検査", "試験"]),
];

/// Exact-term abbreviation table.
pub const ABBREVIATIONS: &[(&str, &[&str])] = &[
    ("鉄筋コンクリート", &["RC", "鉄コン"]),
    ("プレストレストコンクリート", &["PC"]),
    ("鉄骨鉄筋コンクリート", &["SRC"]),
    ("空調設備", &["空調", "エアコン", "AC"]),
    ("給排水設備", &["給排水"]),
];

/// Category of `term` by first matching keyword in table order.
pub fn categorize(term: &str) -> &'static str {
    CATEGORY_RULES
        .iter()
        .find(|(_, keywords)| keywords.iter().any(|k| term.contains(k)))
        .map_or(DEFAULT_CATEGORY, |(category, _)| *category)
}

/// Known abbreviations of `term`, plus a variant without the linking
/// particle when the term contains one.
pub fn generate_aliases(term: &str) -> Vec<String> {
    let mut aliases: Vec<String> = ABBREVIATIONS
        .iter()
        .find(|(full, _)| *full == term)
        .map(|(_, abbrevs)| abbrevs.iter().map(|a| (*a).to_string()).collect())
        .unwrap_or_default();

    if term.contains(LINKING_PARTICLE) {
        aliases.push(term.replace(LINKING_PARTICLE, ""));
    }

    dedup_preserving_order(aliases)
}

/// Index entry for a single-document candidate.
pub fn entry_for_candidate(candidate: &TermCandidate) -> TermEntry {
    TermEntry::new(
        candidate.surface.clone(),
        categorize(&candidate.surface),
        generate_aliases(&candidate.surface),
    )
    .with_confidence(candidate.confidence)
}

/// Index entry for a batch candidate, carrying its frequency.
pub fn entry_for(scored: &ScoredCandidate) -> TermEntry {
    entry_for_candidate(&scored.candidate).with_frequency(scored.frequency)
}
