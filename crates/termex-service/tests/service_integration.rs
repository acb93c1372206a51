#![allow(clippy::unwrap_used, clippy::expect_used)]

//! Integration tests for the termex-service crate.
//!
//! Covers batch extraction over a document directory, background rebuilds,
//! search modes, listing, reload from disk and failing collaborators.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use async_trait::async_trait;
use tempfile::TempDir;

use termex_core::{TermexError, TermexResult};
use termex_extract::{ScriptSegmenter, TermDictionary};
use termex_index::LocalEmbedding;
use termex_service::{DocumentSource, SearchMode, TermService, TermexConfig};

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn config(tmp: &TempDir) -> TermexConfig {
    let mut config = TermexConfig::default();
    config.data_dir = tmp.path().join("term_db");
    config.embedding.dimension = 128;
    config
}

async fn write_docs(dir: &Path, docs: &[(&str, &str)]) -> Vec<PathBuf> {
    let mut paths = Vec::new();
    for (name, text) in docs {
        let path = dir.join(name);
        tokio::fs::write(&path, text).await.unwrap();
        paths.push(path);
    }
    paths
}

/// Fails on any path whose file name starts with "bad".
struct FlakySource;

#[async_trait]
impl DocumentSource for FlakySource {
    async fn read_text(&self, path: &Path) -> TermexResult<String> {
        let name = path.file_name().unwrap().to_string_lossy().into_owned();
        if name.starts_with("bad") {
            return Err(TermexError::Dependency(format!("cannot parse {name}")));
        }
        Ok("RC造の基礎工事".to_string())
    }
}

// ---------------------------------------------------------------------------
// 1. Batch extraction
// ---------------------------------------------------------------------------

#[tokio::test]
async fn batch_report_counts() {
    let tmp = TempDir::new().unwrap();
    let mut cfg = config(&tmp);
    cfg.extraction.use_dictionary = false;
    let svc = TermService::new(cfg).unwrap();

    let paths = write_docs(
        tmp.path(),
        &[("a.txt", "RCの柱"), ("b.txt", "RCとSRC"), ("c.txt", "SRC")],
    )
    .await;
    let report = svc.extract_batch(&paths, false).await.unwrap();

    assert_eq!(report.document_count, 3);
    // a: RC, b: RC + SRC, c: SRC
    assert_eq!(report.total_candidates, 4);
    assert_eq!(report.unique_candidates, 2);
    assert!(!report.rebuild_started);
    assert!(svc.info().total_records == 0);
}

#[tokio::test]
async fn unreadable_documents_do_not_abort_batch() {
    let tmp = TempDir::new().unwrap();
    let mut cfg = config(&tmp);
    cfg.extraction.use_dictionary = false;
    let svc = TermService::with_components(
        cfg,
        Arc::new(ScriptSegmenter::new()),
        Arc::new(LocalEmbedding::new(128)),
        Arc::new(TermDictionary::new()),
        Arc::new(FlakySource),
    )
    .unwrap();

    let paths = vec![
        PathBuf::from("good1.txt"),
        PathBuf::from("bad.txt"),
        PathBuf::from("good2.txt"),
    ];
    let report = svc.extract_batch(&paths, false).await.unwrap();
    assert_eq!(report.document_count, 3);
    let single = svc.extract_batch(&paths[..1], false).await.unwrap();
    assert_eq!(report.total_candidates, single.total_candidates * 2);
    assert_eq!(report.unique_candidates, single.unique_candidates);
}

#[tokio::test]
async fn batch_rebuild_makes_terms_searchable() {
    let tmp = TempDir::new().unwrap();
    let svc = TermService::new(config(&tmp)).unwrap();
    let docs_dir = tmp.path().join("docs");
    tokio::fs::create_dir(&docs_dir).await.unwrap();
    write_docs(
        &docs_dir,
        &[
            ("01.txt", "空調設備の点検と給排水設備の更新。"),
            ("02.txt", "鉄筋コンクリート造の基礎工事を行う。"),
            ("03.pdf", "ignored"),
        ],
    )
    .await;

    let paths = svc.documents_in(&docs_dir).await.unwrap();
    assert_eq!(paths.len(), 2);

    let report = svc.extract_batch(&paths, true).await.unwrap();
    assert!(report.rebuild_started);
    svc.wait_for_rebuild().await.unwrap();

    let info = svc.info();
    assert_eq!(info.total_records, report.unique_candidates);
    assert!(info.last_build.is_some());

    let results = svc
        .search("空調設備", SearchMode::Hybrid, Some(3), None)
        .await
        .unwrap();
    assert_eq!(results[0].term, "空調設備");
    assert_eq!(results[0].aliases, vec!["空調", "エアコン", "AC"]);
}

#[tokio::test]
async fn empty_batch_starts_no_rebuild() {
    let tmp = TempDir::new().unwrap();
    let svc = TermService::new(config(&tmp)).unwrap();
    let paths = write_docs(tmp.path(), &[("empty.txt", "。。。")]).await;
    let report = svc.extract_batch(&paths, true).await.unwrap();
    assert_eq!(report.unique_candidates, 0);
    assert!(!report.rebuild_started);
}

// ---------------------------------------------------------------------------
// 2. Search
// ---------------------------------------------------------------------------

#[tokio::test]
async fn search_modes_on_dictionary() {
    let tmp = TempDir::new().unwrap();
    let svc = TermService::new(config(&tmp)).unwrap();
    assert_eq!(svc.build_from_dictionary().await.unwrap(), 15);

    let sparse = svc
        .search("エアコン", SearchMode::Sparse, Some(5), None)
        .await
        .unwrap();
    assert_eq!(sparse[0].term, "空調設備");

    let dense = svc
        .search("耐震構造", SearchMode::Dense, Some(5), None)
        .await
        .unwrap();
    assert_eq!(dense[0].term, "耐震構造");

    let hybrid = svc
        .search("SRC", SearchMode::Hybrid, Some(5), Some(0.0))
        .await
        .unwrap();
    assert_eq!(hybrid[0].term, "鉄骨鉄筋コンクリート");
}

#[tokio::test]
async fn search_before_build_is_empty() {
    let tmp = TempDir::new().unwrap();
    let svc = TermService::new(config(&tmp)).unwrap();
    let results = svc
        .search("RC", SearchMode::Hybrid, None, None)
        .await
        .unwrap();
    assert!(results.is_empty());
}

#[tokio::test]
async fn bad_alpha_is_input_error() {
    let tmp = TempDir::new().unwrap();
    let svc = TermService::new(config(&tmp)).unwrap();
    svc.build_from_dictionary().await.unwrap();
    let err = svc
        .search("RC", SearchMode::Hybrid, None, Some(-0.5))
        .await
        .unwrap_err();
    assert!(err.is_input());
}

// ---------------------------------------------------------------------------
// 3. Persistence and dictionary
// ---------------------------------------------------------------------------

#[tokio::test]
async fn fresh_service_loads_saved_collection() {
    let tmp = TempDir::new().unwrap();
    let first = TermService::new(config(&tmp)).unwrap();
    first.build_from_dictionary().await.unwrap();

    let second = TermService::new(config(&tmp)).unwrap();
    assert_eq!(second.load().await.unwrap(), 15);
    assert_eq!(second.info(), first.info());
    assert_eq!(
        second.list_all(Some("設備"), 0, 10),
        first.list_all(Some("設備"), 0, 10)
    );
}

#[tokio::test]
async fn custom_terms_reach_the_index() {
    let tmp = TempDir::new().unwrap();
    let svc = TermService::new(config(&tmp)).unwrap();
    assert!(svc
        .dictionary()
        .add("杭打ち", "施工", vec!["パイル".to_string()]));

    let extracted = svc.extract("杭打ちの段取り", 0.9).unwrap();
    assert_eq!(extracted[0].term, "杭打ち");

    svc.build_from_dictionary().await.unwrap();
    let results = svc
        .search("パイル", SearchMode::Sparse, Some(1), None)
        .await
        .unwrap();
    assert_eq!(results[0].term, "杭打ち");
}
