#![allow(clippy::unwrap_used, clippy::expect_used)]

//! Integration tests for the termex-extract crate.
//!
//! Covers the full pipeline over realistic construction documents, batch
//! frequency aggregation, dictionary-backed extraction and classification
//! of extracted candidates.

use std::collections::HashSet;
use std::sync::Arc;

use termex_core::ExtractionKind;
use termex_extract::{
    categorize, entry_for, generate_aliases, ExtractionPipeline, PatternMatcher, PhraseBuilder,
    ScriptSegmenter, Segmenter, TermDictionary, Token, DEFAULT_CATEGORY,
};

const SAMPLE: &str = "本工事は鉄筋コンクリート造の建築物の基礎工事を含みます。\
使用する材料は、セメント、鋼材、防水材料等です。\
施工管理においては、品質管理と安全管理を重視します。\
空調設備および給排水設備の設置も行います。";

// ---------------------------------------------------------------------------
// 1. Single-document extraction
// ---------------------------------------------------------------------------

#[test]
fn extracts_construction_terms_from_sample() {
    let pipeline = ExtractionPipeline::with_script_segmenter().unwrap();
    let found = pipeline.extract(SAMPLE);
    let surfaces: HashSet<&str> = found.iter().map(|c| c.surface.as_str()).collect();

    for expected in ["基礎工事", "施工管理", "品質管理", "安全管理", "空調設備", "給排水設備", "セメント"] {
        assert!(surfaces.contains(expected), "missing {expected}: {surfaces:?}");
    }
    assert_eq!(surfaces.len(), found.len(), "surface forms must be unique");
    assert!(found.iter().all(|c| (0.0..=1.0).contains(&c.confidence)));
}

#[test]
fn document_ending_in_noun_phrase_keeps_it() {
    let builder = PhraseBuilder::new().unwrap();
    let tokens = ScriptSegmenter::new().segment("仕様は鉄筋コンクリート").unwrap();
    let found = builder.build_phrases(&tokens);
    assert_eq!(found.len(), 1);
    assert_eq!(found[0].surface, "鉄筋コンクリート");
}

#[test]
fn pattern_matcher_never_repeats_surface_forms() {
    let matcher = PatternMatcher::new().unwrap();
    let text = SAMPLE.repeat(5);
    let found = matcher.detect(&text);
    let unique: HashSet<&str> = found.iter().map(|c| c.surface.as_str()).collect();
    assert_eq!(unique.len(), found.len());
}

// ---------------------------------------------------------------------------
// 2. Batch aggregation
// ---------------------------------------------------------------------------

#[test]
fn batch_counts_cross_document_frequency() {
    let pipeline = ExtractionPipeline::with_script_segmenter().unwrap();
    let docs = vec![
        "RC造の建物。RC造。".to_string(),
        "RCとSRCの比較".to_string(),
        "RC造、基礎工事".to_string(),
        "RCの柱".to_string(),
        "SRC造".to_string(),
    ];
    let scored = pipeline.extract_batch(&docs);

    let rc = scored.iter().find(|s| s.candidate.surface == "RC").unwrap();
    assert_eq!(rc.frequency, 4);
    assert_eq!(rc.candidate.confidence, (0.8f32 + 0.1).min(1.0));

    let src = scored.iter().find(|s| s.candidate.surface == "SRC").unwrap();
    assert_eq!(src.frequency, 2);
    assert_eq!(src.candidate.confidence, 0.8);

    assert_eq!(scored[0].candidate.surface, "RC");
    for pair in scored.windows(2) {
        assert!(pair[0].frequency >= pair[1].frequency);
    }
}

#[test]
fn batch_with_empty_documents() {
    let pipeline = ExtractionPipeline::with_script_segmenter().unwrap();
    let scored = pipeline.extract_batch(["", "", "RC"]);
    assert_eq!(scored.len(), 1);
    assert_eq!(scored[0].frequency, 1);
}

// ---------------------------------------------------------------------------
// 3. Dictionary-backed extraction
// ---------------------------------------------------------------------------

#[test]
fn custom_dictionary_terms_are_found() {
    let dict = Arc::new(TermDictionary::new());
    assert!(dict.add("杭打ち", "施工", vec!["パイル".to_string()]));

    let pipeline = ExtractionPipeline::with_script_segmenter()
        .unwrap()
        .with_dictionary(Arc::clone(&dict));

    let found = pipeline.extract("杭打ちとパイル工法");
    let kui = found.iter().find(|c| c.surface == "杭打ち").unwrap();
    assert_eq!(kui.kind, ExtractionKind::Dictionary);
    assert_eq!(kui.category_hint.as_deref(), Some("施工"));
    assert!(found.iter().any(|c| c.surface == "パイル"));

    // Dictionary changes are visible to the pipeline without rebuilding it.
    dict.add("工法", "施工", vec![]);
    let found = pipeline.extract("杭打ちとパイル工法");
    assert!(found.iter().any(|c| c.surface == "工法" && c.kind == ExtractionKind::Dictionary));
}

// ---------------------------------------------------------------------------
// 4. Classification of extracted candidates
// ---------------------------------------------------------------------------

#[test]
fn entries_carry_category_and_aliases() {
    let pipeline = ExtractionPipeline::with_script_segmenter().unwrap();
    let scored = pipeline.extract_batch(["空調設備の更新", "空調設備"]);
    let entry = scored
        .iter()
        .find(|s| s.candidate.surface == "空調設備")
        .map(entry_for)
        .unwrap();

    assert_eq!(entry.category, "設備");
    assert_eq!(entry.aliases, generate_aliases("空調設備"));
    assert_eq!(entry.frequency, 2);
}

#[test]
fn unknown_terms_fall_back_to_default_category() {
    assert_eq!(categorize("スケジュール"), DEFAULT_CATEGORY);
}

#[test]
fn externally_segmented_tokens_are_supported() {
    let builder = PhraseBuilder::new().unwrap();
    let tokens = vec![
        Token::new("免震", termex_extract::PartOfSpeech::from_tag("名詞")),
        Token::new("装置", termex_extract::PartOfSpeech::from_tag("名詞")),
        Token::new("を", termex_extract::PartOfSpeech::from_tag("助詞")),
    ];
    let found = builder.build_phrases(&tokens);
    assert_eq!(found.len(), 1);
    assert_eq!(found[0].surface, "免震装置");
}
