use async_trait::async_trait;
use std::path::{Path, PathBuf};
use termex_core::{TermexError, TermexResult};

/// Turns a document handle into plain text.
///
/// Failures are reported as [`TermexError::Dependency`]; batch extraction
/// logs them and treats the document as empty.
#[async_trait]
pub trait DocumentSource: Send + Sync {
    /// Read the text content of the document at `path`.
    async fn read_text(&self, path: &Path) -> TermexResult<String>;
}

/// Reads UTF-8 text files.
#[derive(Debug, Clone, Copy, Default)]
pub struct PlainTextSource;

#[async_trait]
impl DocumentSource for PlainTextSource {
    async fn read_text(&self, path: &Path) -> TermexResult<String> {
        tokio::fs::read_to_string(path).await.map_err(|e| {
            TermexError::Dependency(format!("failed to read '{}': {e}", path.display()))
        })
    }
}

/// Files directly inside `dir` whose extension matches `extension`
/// (case-insensitive), sorted by path.
pub async fn documents_in(dir: &Path, extension: &str) -> TermexResult<Vec<PathBuf>> {
    let mut entries = tokio::fs::read_dir(dir).await.map_err(|e| {
        TermexError::Input(format!("cannot list '{}': {e}", dir.display()))
    })?;

    let mut paths = Vec::new();
    while let Some(entry) = entries.next_entry().await? {
        let path = entry.path();
        let matches = path
            .extension()
            .and_then(|ext| ext.to_str())
            .is_some_and(|ext| ext.eq_ignore_ascii_case(extension));
        if matches && entry.file_type().await?.is_file() {
            paths.push(path);
        }
    }
    paths.sort();
    Ok(paths)
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_plain_text_source() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("spec.txt");
        tokio::fs::write(&path, "基礎工事").await.unwrap();
        assert_eq!(PlainTextSource.read_text(&path).await.unwrap(), "基礎工事");
    }

    #[tokio::test]
    async fn test_missing_file_is_dependency_error() {
        let tmp = tempfile::tempdir().unwrap();
        let err = PlainTextSource
            .read_text(&tmp.path().join("absent.txt"))
            .await
            .unwrap_err();
        assert!(err.is_dependency());
    }

    #[tokio::test]
    async fn test_documents_in_filters_and_sorts() {
        let tmp = tempfile::tempdir().unwrap();
        for name in ["b.txt", "a.TXT", "c.pdf", "notes"] {
            tokio::fs::write(tmp.path().join(name), "x").await.unwrap();
        }
        tokio::fs::create_dir(tmp.path().join("dir.txt")).await.unwrap();

        let found = documents_in(tmp.path(), "txt").await.unwrap();
        let names: Vec<String> = found
            .iter()
            .map(|p| p.file_name().unwrap().to_string_lossy().into_owned())
            .collect();
        assert_eq!(names, vec!["a.TXT", "b.txt"]);
    }

    #[tokio::test]
    async fn test_documents_in_missing_dir() {
        let tmp = tempfile::tempdir().unwrap();
        let err = documents_in(&tmp.path().join("nope"), "txt")
            .await
            .unwrap_err();
        assert!(err.is_input());
    }
}
