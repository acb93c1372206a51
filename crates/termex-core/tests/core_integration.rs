#![allow(clippy::unwrap_used, clippy::expect_used)]

use termex_core::*;

// ---------------------------------------------------------------------------
// 1. Record serialization drops the transient score
// ---------------------------------------------------------------------------

#[test]
fn record_roundtrip_without_score() {
    let record = TermRecord {
        id: 0,
        term: "鉄筋コンクリート".to_string(),
        category: "構造".to_string(),
        aliases: vec!["RC".to_string(), "鉄コン".to_string()],
        confidence: 0.95,
        frequency: 4,
        embedding: vec![0.1, 0.2, 0.3],
        score: None,
    };

    let hit = record.scored(0.7);
    let json = serde_json::to_string(&hit).unwrap();
    let back: TermRecord = serde_json::from_str(&json).unwrap();

    assert_eq!(back, record);
    assert_eq!(hit.score, Some(0.7));
}

// ---------------------------------------------------------------------------
// 2. Entry builder
// ---------------------------------------------------------------------------

#[test]
fn entry_builder_sets_fields() {
    let entry = TermEntry::new("RC", "構造", vec!["鉄筋コンクリート".to_string()])
        .with_confidence(0.9)
        .with_frequency(5);

    assert_eq!(entry.term, "RC");
    assert_eq!(entry.category, "構造");
    assert_eq!(entry.aliases, vec!["鉄筋コンクリート".to_string()]);
    assert_eq!(entry.confidence, 0.9);
    assert_eq!(entry.frequency, 5);
}

// ---------------------------------------------------------------------------
// 3. Error kinds are distinguishable
// ---------------------------------------------------------------------------

#[test]
fn error_kinds_are_distinguishable() {
    let input = TermexError::Input("query must not be empty".to_string());
    let dep = TermexError::Dependency("embedder offline".to_string());

    assert!(input.is_input() && !input.is_dependency());
    assert!(dep.is_dependency() && !dep.is_input());
    assert!(input.to_string().contains("query must not be empty"));
}

#[test]
fn json_error_converts() {
    let err: TermexError = serde_json::from_str::<TermEntry>("{not json")
        .unwrap_err()
        .into();
    assert!(matches!(err, TermexError::Json(_)));
}
