use std::collections::BTreeMap;

use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use termex_core::{dedup_preserving_order, TermEntry};

/// Confidence of a verbatim dictionary term hit.
pub const TERM_HIT_CONFIDENCE: f32 = 0.95;
/// Confidence of a verbatim alias hit.
pub const ALIAS_HIT_CONFIDENCE: f32 = 0.85;

const BUILT_IN_TERMS: &[(&str, &str, &[&str])] = &[
    ("鉄筋コンクリート", "構造", &["RC", "鉄コン"]),
    ("プレストレストコンクリート", "構造", &["PC"]),
    ("鉄骨鉄筋コンクリート", "構造", &["SRC"]),
    ("基礎工事", "施工", &["基礎"]),
    ("躯体工事", "施工", &["躯体"]),
    ("仕上工事", "施工", &["仕上げ"]),
    ("空調設備", "設備", &["空調", "エアコン"]),
    ("給排水設備", "設備", &["給排水"]),
    ("電気設備", "設備", &["電気"]),
    ("品質管理", "管理", &["品質"]),
    ("安全管理", "管理", &["安全"]),
    ("施工管理", "管理", &["施工"]),
    ("耐震構造", "構造", &["耐震"]),
    ("免震構造", "構造", &["免震"]),
    ("制震構造", "構造", &["制震"]),
];

/// A known term with its category and aliases.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DictionaryEntry {
    /// Canonical surface form.
    pub term: String,
    /// Category label.
    pub category: String,
    /// Alternative spellings and abbreviations.
    pub aliases: Vec<String>,
    /// Shipped with the dictionary; cannot be removed.
    pub built_in: bool,
}

/// Outcome of [`TermDictionary::remove`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Removal {
    /// The custom term was removed.
    Removed,
    /// Built-in terms are permanent.
    BuiltIn,
    /// No such term.
    Missing,
}

/// Counts reported by [`TermDictionary::stats`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DictionaryStats {
    /// All entries.
    pub total: usize,
    /// Built-in entries.
    pub built_in: usize,
    /// User-added entries.
    pub custom: usize,
    /// Entry count per category.
    pub by_category: BTreeMap<String, usize>,
}

/// Known construction terms: the built-in set plus user additions, in
/// insertion order.
///
/// Shared behind an `Arc`; all methods take `&self`.
pub struct TermDictionary {
    entries: RwLock<Vec<DictionaryEntry>>,
}

impl TermDictionary {
    /// A dictionary holding only the built-in terms.
    pub fn new() -> Self {
        let entries = BUILT_IN_TERMS
            .iter()
            .map(|(term, category, aliases)| DictionaryEntry {
                term: (*term).to_string(),
                category: (*category).to_string(),
                aliases: aliases.iter().map(|a| (*a).to_string()).collect(),
                built_in: true,
            })
            .collect();
        Self {
            entries: RwLock::new(entries),
        }
    }

    /// A dictionary with no entries at all.
    pub fn empty() -> Self {
        Self {
            entries: RwLock::new(Vec::new()),
        }
    }

    /// Add a custom term. Returns `false` if the term is empty or already
    /// known.
    pub fn add(&self, term: &str, category: &str, aliases: Vec<String>) -> bool {
        let term = term.trim();
        if term.is_empty() {
            return false;
        }
        let mut entries = self.entries.write();
        if entries.iter().any(|e| e.term == term) {
            return false;
        }
        entries.push(DictionaryEntry {
            term: term.to_string(),
            category: category.trim().to_string(),
            aliases: dedup_preserving_order(aliases),
            built_in: false,
        });
        true
    }

    /// Remove a custom term. Built-in terms are kept.
    pub fn remove(&self, term: &str) -> Removal {
        let mut entries = self.entries.write();
        match entries.iter().position(|e| e.term == term) {
            Some(i) if entries[i].built_in => Removal::BuiltIn,
            Some(i) => {
                entries.remove(i);
                Removal::Removed
            }
            None => Removal::Missing,
        }
    }

    /// Entry for `term`, if known.
    pub fn get(&self, term: &str) -> Option<DictionaryEntry> {
        self.entries.read().iter().find(|e| e.term == term).cloned()
    }

    /// Snapshot of all entries in insertion order.
    pub fn entries(&self) -> Vec<DictionaryEntry> {
        self.entries.read().clone()
    }

    /// Number of entries.
    pub fn len(&self) -> usize {
        self.entries.read().len()
    }

    /// True when there are no entries.
    pub fn is_empty(&self) -> bool {
        self.entries.read().is_empty()
    }

    /// Entry counts.
    pub fn stats(&self) -> DictionaryStats {
        let entries = self.entries.read();
        let built_in = entries.iter().filter(|e| e.built_in).count();
        let mut by_category = BTreeMap::new();
        for entry in entries.iter() {
            *by_category.entry(entry.category.clone()).or_insert(0) += 1;
        }
        DictionaryStats {
            total: entries.len(),
            built_in,
            custom: entries.len() - built_in,
            by_category,
        }
    }

    /// All entries as index build input.
    pub fn to_term_entries(&self) -> Vec<TermEntry> {
        self.entries
            .read()
            .iter()
            .map(|e| {
                TermEntry::new(e.term.clone(), e.category.clone(), e.aliases.clone())
                    .with_confidence(TERM_HIT_CONFIDENCE)
            })
            .collect()
    }
}

impl Default for TermDictionary {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    #[test]
    fn test_built_ins_loaded() {
        let dict = TermDictionary::new();
        assert_eq!(dict.len(), 15);
        let rc = dict.get("鉄筋コンクリート").unwrap();
        assert_eq!(rc.aliases, vec!["RC", "鉄コン"]);
        assert!(rc.built_in);
    }

    #[test]
    fn test_add_and_reject_duplicates() {
        let dict = TermDictionary::new();
        assert!(dict.add("杭工事", "施工", vec!["杭".into(), "杭".into()]));
        assert!(!dict.add("杭工事", "施工", vec![]));
        assert!(!dict.add("基礎工事", "施工", vec![]));
        assert!(!dict.add("  ", "施工", vec![]));
        assert_eq!(dict.get("杭工事").map(|e| e.aliases), Some(vec!["杭".to_string()]));
    }

    #[test]
    fn test_remove_outcomes() {
        let dict = TermDictionary::new();
        dict.add("杭工事", "施工", vec![]);
        assert_eq!(dict.remove("杭工事"), Removal::Removed);
        assert_eq!(dict.remove("杭工事"), Removal::Missing);
        assert_eq!(dict.remove("基礎工事"), Removal::BuiltIn);
        assert!(dict.get("基礎工事").is_some());
    }

    #[test]
    fn test_stats() {
        let dict = TermDictionary::new();
        dict.add("杭工事", "施工", vec![]);
        let stats = dict.stats();
        assert_eq!(stats.total, 16);
        assert_eq!(stats.built_in, 15);
        assert_eq!(stats.custom, 1);
        assert_eq!(stats.by_category.get("施工"), Some(&4));
        assert_eq!(stats.by_category.get("構造"), Some(&6));
    }

    #[test]
    fn test_to_term_entries() {
        let dict = TermDictionary::empty();
        dict.add("RC", "構造", vec!["鉄筋コンクリート".into()]);
        let entries = dict.to_term_entries();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].confidence, TERM_HIT_CONFIDENCE);
        assert_eq!(entries[0].aliases, vec!["鉄筋コンクリート"]);
    }
}
