use crate::bm25::Bm25Index;
use crate::dense::DenseIndex;
use crate::hybrid::IndexSnapshot;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use termex_core::{TermRecord, TermexError, TermexResult};
use tracing::{debug, warn};

/// Pointer file naming the live generation directory.
pub const CURRENT_FILE: &str = "CURRENT";
/// Record collection, pretty JSON array.
pub const RECORDS_FILE: &str = "records.json";
/// Dense vectors, one `{id, vector}` object per line.
pub const DENSE_FILE: &str = "dense.jsonl";
/// Serialized BM25 index.
pub const SPARSE_FILE: &str = "sparse.json";
/// Collection metadata.
pub const METADATA_FILE: &str = "metadata.json";

const GENERATION_PREFIX: &str = "gen-";

/// Summary stored next to a persisted collection.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IndexMetadata {
    /// Number of records.
    pub num_terms: usize,
    /// Embedding dimension the dense vectors were built with.
    pub vector_dim: usize,
    /// When the collection was built.
    #[serde(default)]
    pub built_at: Option<DateTime<Utc>>,
}

/// Write every file of `snapshot` under `dir`, creating it if needed.
///
/// The files go into a fresh generation directory. Only once all four are
/// complete is `CURRENT` swapped, by rename, to name that generation, so a
/// reader sees either the previous collection or the new one and never a
/// mix. A failed write leaves `CURRENT` untouched. Generations older than
/// the one just replaced are removed afterwards.
pub async fn write_snapshot(dir: &Path, snapshot: &IndexSnapshot) -> TermexResult<()> {
    tokio::fs::create_dir_all(dir)
        .await
        .map_err(|e| persistence("create index directory", dir, e))?;

    // An unreadable pointer is replaced rather than blocking the save.
    let previous = current_generation(dir).await.unwrap_or_else(|e| {
        warn!(dir = %dir.display(), error = %e, "Ignoring unreadable index pointer");
        None
    });
    let (generation, gen_dir) = create_generation(dir).await?;

    let written = match write_generation(&gen_dir, snapshot).await {
        Ok(()) => swap_current(dir, &generation).await,
        Err(e) => Err(e),
    };
    if let Err(e) = written {
        if let Err(cleanup) = tokio::fs::remove_dir_all(&gen_dir).await {
            warn!(dir = %gen_dir.display(), error = %cleanup, "Failed to remove incomplete generation");
        }
        return Err(e);
    }

    prune_generations(dir, &generation, previous.as_deref()).await;

    debug!(dir = %dir.display(), generation = %generation, records = snapshot.len(), "Index files written");
    Ok(())
}

/// Directory holding the live generation under `dir`, if one was saved.
pub async fn current_generation_dir(dir: &Path) -> TermexResult<Option<PathBuf>> {
    Ok(current_generation(dir).await?.map(|generation| dir.join(generation)))
}

/// Read the metadata of a persisted collection, if one exists.
pub async fn read_metadata(dir: &Path) -> TermexResult<Option<IndexMetadata>> {
    let Some(gen_dir) = current_generation_dir(dir).await? else {
        return Ok(None);
    };
    read_generation_metadata(&gen_dir).await.map(Some)
}

/// Read a persisted collection from `dir`.
///
/// Returns `Ok(None)` when nothing has been saved there. Any inconsistency
/// between the files, or a vector dimension other than `dimension`, is a
/// [`TermexError::Persistence`].
pub async fn read_snapshot(dir: &Path, dimension: usize) -> TermexResult<Option<IndexSnapshot>> {
    let Some(gen_dir) = current_generation_dir(dir).await? else {
        return Ok(None);
    };
    let metadata = read_generation_metadata(&gen_dir).await?;

    if metadata.vector_dim != dimension {
        return Err(TermexError::Persistence(format!(
            "persisted vector dimension {} does not match embedder dimension {dimension}",
            metadata.vector_dim
        )));
    }

    let records: Vec<TermRecord> =
        serde_json::from_slice(&read_file(&gen_dir, RECORDS_FILE).await?)
            .map_err(|e| TermexError::Persistence(format!("invalid {RECORDS_FILE}: {e}")))?;
    let dense_data = String::from_utf8(read_file(&gen_dir, DENSE_FILE).await?)
        .map_err(|e| TermexError::Persistence(format!("invalid {DENSE_FILE}: {e}")))?;
    let dense = DenseIndex::from_jsonl(dimension, &dense_data)?;
    let sparse: Bm25Index = serde_json::from_slice(&read_file(&gen_dir, SPARSE_FILE).await?)
        .map_err(|e| TermexError::Persistence(format!("invalid {SPARSE_FILE}: {e}")))?;

    check_counts(&metadata, &records, &dense, &sparse)?;

    Ok(Some(IndexSnapshot::from_parts(
        records,
        dense,
        sparse,
        metadata.built_at,
    )))
}

async fn write_generation(gen_dir: &Path, snapshot: &IndexSnapshot) -> TermexResult<()> {
    let records = serde_json::to_vec_pretty(snapshot.records())?;
    write_file(gen_dir, RECORDS_FILE, &records).await?;

    let dense = snapshot.dense().to_jsonl()?;
    write_file(gen_dir, DENSE_FILE, dense.as_bytes()).await?;

    let sparse = serde_json::to_vec(snapshot.sparse())?;
    write_file(gen_dir, SPARSE_FILE, &sparse).await?;

    let metadata = IndexMetadata {
        num_terms: snapshot.len(),
        vector_dim: snapshot.dense().dimension(),
        built_at: snapshot.built_at(),
    };
    write_file(gen_dir, METADATA_FILE, &serde_json::to_vec_pretty(&metadata)?).await
}

/// Point `CURRENT` at `generation` with a single rename.
async fn swap_current(dir: &Path, generation: &str) -> TermexResult<()> {
    let tmp = dir.join(format!("{CURRENT_FILE}.{generation}.tmp"));
    tokio::fs::write(&tmp, generation.as_bytes())
        .await
        .map_err(|e| persistence("write", &tmp, e))?;
    let path = dir.join(CURRENT_FILE);
    tokio::fs::rename(&tmp, &path)
        .await
        .map_err(|e| persistence("replace", &path, e))
}

async fn read_generation_metadata(gen_dir: &Path) -> TermexResult<IndexMetadata> {
    serde_json::from_slice(&read_file(gen_dir, METADATA_FILE).await?)
        .map_err(|e| TermexError::Persistence(format!("invalid {METADATA_FILE}: {e}")))
}

async fn current_generation(dir: &Path) -> TermexResult<Option<String>> {
    let path = dir.join(CURRENT_FILE);
    let data = match tokio::fs::read_to_string(&path).await {
        Ok(data) => data,
        Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
        Err(e) => return Err(persistence("read", &path, e)),
    };
    let generation = data.trim();
    if !is_generation_name(generation) {
        return Err(TermexError::Persistence(format!(
            "{CURRENT_FILE} names an invalid generation {generation:?}"
        )));
    }
    Ok(Some(generation.to_string()))
}

/// Create an empty, uniquely named generation directory.
async fn create_generation(dir: &Path) -> TermexResult<(String, PathBuf)> {
    let stamp = Utc::now()
        .timestamp_nanos_opt()
        .unwrap_or_else(|| Utc::now().timestamp_micros());
    let mut attempt = 0u32;
    loop {
        let generation = format!("{GENERATION_PREFIX}{stamp:020}-{attempt}");
        let gen_dir = dir.join(&generation);
        match tokio::fs::create_dir(&gen_dir).await {
            Ok(()) => return Ok((generation, gen_dir)),
            Err(e) if e.kind() == ErrorKind::AlreadyExists => attempt += 1,
            Err(e) => return Err(persistence("create generation", &gen_dir, e)),
        }
    }
}

/// Remove generations other than `current` and `previous`. Best effort.
async fn prune_generations(dir: &Path, current: &str, previous: Option<&str>) {
    let mut entries = match tokio::fs::read_dir(dir).await {
        Ok(entries) => entries,
        Err(e) => {
            warn!(dir = %dir.display(), error = %e, "Failed to list index generations");
            return;
        }
    };
    while let Ok(Some(entry)) = entries.next_entry().await {
        let name = entry.file_name().to_string_lossy().into_owned();
        if !is_generation_name(&name) || name == current || Some(name.as_str()) == previous {
            continue;
        }
        if let Err(e) = tokio::fs::remove_dir_all(entry.path()).await {
            warn!(generation = %name, error = %e, "Failed to remove stale generation");
        }
    }
}

fn is_generation_name(name: &str) -> bool {
    name.strip_prefix(GENERATION_PREFIX).is_some_and(|rest| {
        !rest.is_empty() && rest.chars().all(|c| c.is_ascii_digit() || c == '-')
    })
}

fn check_counts(
    metadata: &IndexMetadata,
    records: &[TermRecord],
    dense: &DenseIndex,
    sparse: &Bm25Index,
) -> TermexResult<()> {
    let expected = metadata.num_terms;
    let counts = [
        (RECORDS_FILE, records.len()),
        (DENSE_FILE, dense.len()),
        (SPARSE_FILE, sparse.document_count()),
    ];
    for (file, count) in counts {
        if count != expected {
            return Err(TermexError::Persistence(format!(
                "{file} holds {count} entries, metadata says {expected}"
            )));
        }
    }

    for (position, record) in records.iter().enumerate() {
        if record.id as usize != position {
            return Err(TermexError::Persistence(format!(
                "record at position {position} has id {}",
                record.id
            )));
        }
        if record.embedding.len() != metadata.vector_dim {
            return Err(TermexError::Persistence(format!(
                "record {} has a {}-component embedding",
                record.id,
                record.embedding.len()
            )));
        }
    }

    if dense.ids().iter().zip(records).any(|(&id, r)| id != r.id) {
        return Err(TermexError::Persistence(format!(
            "{DENSE_FILE} ids do not follow {RECORDS_FILE}"
        )));
    }
    Ok(())
}

async fn write_file(dir: &Path, name: &str, data: &[u8]) -> TermexResult<()> {
    let path = dir.join(name);
    let tmp = dir.join(format!("{name}.tmp"));
    tokio::fs::write(&tmp, data)
        .await
        .map_err(|e| persistence("write", &tmp, e))?;
    tokio::fs::rename(&tmp, &path)
        .await
        .map_err(|e| persistence("replace", &path, e))
}

async fn read_file(dir: &Path, name: &str) -> TermexResult<Vec<u8>> {
    let path = dir.join(name);
    tokio::fs::read(&path)
        .await
        .map_err(|e| persistence("read", &path, e))
}

fn persistence(action: &str, path: &Path, e: std::io::Error) -> TermexError {
    TermexError::Persistence(format!("failed to {action} {}: {e}", path.display()))
}
