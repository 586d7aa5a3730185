//! Index construction and loading.
//!
//! The on-disk format is a single SQLite file: a `meta` key/value table
//! (schema version, embedding model id, dimensionality) and a `chunks`
//! table holding one row per indexed chunk with its vector as a
//! little-endian f32 blob. A rebuild writes `<path>.tmp` and renames it
//! over the live file, so the swap is atomic from a reader's perspective;
//! an already-open [`Index`] keeps serving its loaded snapshot.

use std::fmt::Display;
use std::fs;
use std::path::{Path, PathBuf};

use rusqlite::{Connection, OpenFlags, OptionalExtension, params};
use serde::{Deserialize, Serialize};

use crate::embedder::Embedder;
use crate::error::{Result, VecdbError};

/// On-disk schema version. Bump when the layout changes; `open` refuses
/// anything it does not understand.
const SCHEMA_VERSION: u32 = 1;

const SCHEMA_SQL: &str = "
CREATE TABLE meta (
    key   TEXT PRIMARY KEY,
    value TEXT NOT NULL
);
CREATE TABLE chunks (
    id          INTEGER PRIMARY KEY,
    source_name TEXT NOT NULL,
    chunk_index INTEGER NOT NULL,
    text        TEXT NOT NULL,
    embedding   BLOB NOT NULL
);
";

/// One chunk of text headed into the index.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChunkRecord {
    /// Name of the source item (anime title), kept as provenance metadata.
    pub source_name: String,
    /// Position of the chunk within its source record.
    pub chunk_index: usize,
    /// The chunk text that gets embedded and later retrieved.
    pub text: String,
}

/// A fully loaded index row.
#[derive(Debug, Clone)]
pub struct IndexEntry {
    /// Insertion id; doubles as the tie-breaker for equal distances.
    pub id: i64,
    /// Source item name.
    pub source_name: String,
    /// Chunk position within the source record.
    pub chunk_index: usize,
    /// Chunk text.
    pub text: String,
    /// Embedding vector, same dimensionality as the index schema.
    pub embedding: Vec<f32>,
}

/// What a build produced.
#[derive(Debug, Clone, Serialize)]
pub struct IndexSummary {
    /// Number of chunks written.
    pub entries: usize,
    /// Vector dimensionality declared in the index metadata.
    pub dimension: usize,
    /// Embedding model id stored alongside the vectors.
    pub model_id: String,
}

/// Embeds every chunk and writes a fresh index at `path`, replacing any
/// prior index there.
///
/// The new index is written to a sibling `.tmp` file first and renamed
/// into place once complete, so a crashed or failed build never leaves a
/// partial index at the live location.
///
/// # Errors
///
/// [`VecdbError::Embedding`] when the embedder fails, [`VecdbError::Dimension`]
/// when vectors disagree on dimensionality, [`VecdbError::Write`] when the
/// location cannot be written, [`VecdbError::EmptyBuild`] for zero chunks.
pub fn build_index(
    chunks: &[ChunkRecord],
    embedder: &dyn Embedder,
    path: &Path,
) -> Result<IndexSummary> {
    if chunks.is_empty() {
        return Err(VecdbError::EmptyBuild);
    }

    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent).map_err(|e| write_err(path, e))?;
        }
    }

    let tmp = tmp_path(path);
    // Stale leftover from an interrupted build.
    let _ = fs::remove_file(&tmp);

    let mut conn = Connection::open(&tmp).map_err(|e| write_err(&tmp, e))?;
    conn.execute_batch(SCHEMA_SQL).map_err(|e| write_err(&tmp, e))?;

    let mut dimension: Option<usize> = None;
    {
        let tx = conn.transaction().map_err(|e| write_err(&tmp, e))?;
        for (i, chunk) in chunks.iter().enumerate() {
            let vector = embedder.embed(&chunk.text)?;
            match dimension {
                None => dimension = Some(vector.len()),
                Some(expected) if expected != vector.len() => {
                    return Err(VecdbError::Dimension {
                        expected,
                        actual: vector.len(),
                    });
                }
                Some(_) => {}
            }
            tx.execute(
                "INSERT INTO chunks (id, source_name, chunk_index, text, embedding)
                 VALUES (?1, ?2, ?3, ?4, ?5)",
                params![
                    i as i64,
                    chunk.source_name,
                    chunk.chunk_index as i64,
                    chunk.text,
                    vector_to_bytes(&vector),
                ],
            )
            .map_err(|e| write_err(&tmp, e))?;
        }

        let dimension = dimension.unwrap_or(0);
        for (key, value) in [
            ("schema_version", SCHEMA_VERSION.to_string()),
            ("embedding_model", embedder.model_id().to_string()),
            ("dimension", dimension.to_string()),
        ] {
            tx.execute(
                "INSERT INTO meta (key, value) VALUES (?1, ?2)",
                params![key, value],
            )
            .map_err(|e| write_err(&tmp, e))?;
        }
        tx.commit().map_err(|e| write_err(&tmp, e))?;
    }
    drop(conn);

    fs::rename(&tmp, path).map_err(|e| write_err(path, e))?;

    let summary = IndexSummary {
        entries: chunks.len(),
        dimension: dimension.unwrap_or(0),
        model_id: embedder.model_id().to_string(),
    };
    tracing::info!(
        entries = summary.entries,
        dimension = summary.dimension,
        model = %summary.model_id,
        path = %path.display(),
        "vector index built"
    );
    Ok(summary)
}

/// A read-only, fully in-memory view of a persisted index.
///
/// `open` loads every entry up front; searches afterwards touch no I/O and
/// take `&self`, so a single `Index` can serve overlapping calls without
/// locking. Mutation only happens through [`build_index`].
#[derive(Debug)]
pub struct Index {
    path: PathBuf,
    model_id: String,
    dimension: usize,
    pub(crate) entries: Vec<IndexEntry>,
}

impl Index {
    /// Opens the index at `path` and loads it into memory.
    ///
    /// # Errors
    ///
    /// [`VecdbError::NotFound`] when nothing exists at `path` (the caller's
    /// remedy is to run the build), [`VecdbError::Corrupt`] when the file
    /// is present but unreadable as an index.
    pub fn open(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Err(VecdbError::NotFound {
                path: path.to_path_buf(),
            });
        }

        let conn = Connection::open_with_flags(path, OpenFlags::SQLITE_OPEN_READ_ONLY)?;

        let version: u32 = read_meta(&conn, "schema_version")?
            .parse()
            .map_err(|_| VecdbError::Corrupt("schema_version is not a number".into()))?;
        if version != SCHEMA_VERSION {
            return Err(VecdbError::Corrupt(format!(
                "unsupported schema version {version} (expected {SCHEMA_VERSION})"
            )));
        }
        let model_id = read_meta(&conn, "embedding_model")?;
        let dimension: usize = read_meta(&conn, "dimension")?
            .parse()
            .map_err(|_| VecdbError::Corrupt("dimension is not a number".into()))?;

        let mut stmt = conn.prepare(
            "SELECT id, source_name, chunk_index, text, embedding FROM chunks ORDER BY id",
        )?;
        let rows = stmt.query_map([], |row| {
            Ok((
                row.get::<_, i64>(0)?,
                row.get::<_, String>(1)?,
                row.get::<_, i64>(2)?,
                row.get::<_, String>(3)?,
                row.get::<_, Vec<u8>>(4)?,
            ))
        })?;

        let mut entries = Vec::new();
        for row in rows {
            let (id, source_name, chunk_index, text, blob) = row?;
            let embedding = bytes_to_vector(&blob)?;
            if embedding.len() != dimension {
                return Err(VecdbError::Corrupt(format!(
                    "entry {id} has dimension {} but the index declares {dimension}",
                    embedding.len()
                )));
            }
            entries.push(IndexEntry {
                id,
                source_name,
                chunk_index: chunk_index as usize,
                text,
                embedding,
            });
        }

        tracing::debug!(
            entries = entries.len(),
            dimension,
            model = %model_id,
            "opened vector index"
        );

        Ok(Self {
            path: path.to_path_buf(),
            model_id,
            dimension,
            entries,
        })
    }

    /// Location this index was opened from.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Embedding model id stored at build time.
    #[must_use]
    pub fn model_id(&self) -> &str {
        &self.model_id
    }

    /// Vector dimensionality declared by the index metadata.
    #[must_use]
    pub fn dimension(&self) -> usize {
        self.dimension
    }

    /// Number of indexed chunks.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns `true` when the index holds no chunks.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

fn tmp_path(path: &Path) -> PathBuf {
    let mut name = path.as_os_str().to_os_string();
    name.push(".tmp");
    PathBuf::from(name)
}

fn write_err(path: &Path, err: impl Display) -> VecdbError {
    VecdbError::Write {
        path: path.to_path_buf(),
        message: err.to_string(),
    }
}

fn read_meta(conn: &Connection, key: &str) -> Result<String> {
    conn.query_row("SELECT value FROM meta WHERE key = ?1", params![key], |row| {
        row.get::<_, String>(0)
    })
    .optional()?
    .ok_or_else(|| VecdbError::Corrupt(format!("missing meta key {key:?}")))
}

fn vector_to_bytes(vector: &[f32]) -> Vec<u8> {
    let mut bytes = Vec::with_capacity(vector.len() * 4);
    for value in vector {
        bytes.extend_from_slice(&value.to_le_bytes());
    }
    bytes
}

fn bytes_to_vector(bytes: &[u8]) -> Result<Vec<f32>> {
    if bytes.len() % 4 != 0 {
        return Err(VecdbError::Corrupt(format!(
            "embedding blob length {} is not a multiple of 4",
            bytes.len()
        )));
    }
    Ok(bytes
        .chunks_exact(4)
        .map(|b| f32::from_le_bytes([b[0], b[1], b[2], b[3]]))
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testutil::{KeywordEmbedder, chunk};

    #[test]
    fn vector_bytes_roundtrip() {
        let vector = vec![0.25_f32, -1.5, 3.0, 0.0];
        let back = bytes_to_vector(&vector_to_bytes(&vector)).unwrap();
        assert_eq!(vector, back);
    }

    #[test]
    fn truncated_blob_is_corrupt() {
        let err = bytes_to_vector(&[0u8, 1, 2]).unwrap_err();
        assert!(matches!(err, VecdbError::Corrupt(_)));
    }

    #[test]
    fn open_missing_index_is_not_found() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("missing.db");
        let err = Index::open(&path).unwrap_err();
        assert!(matches!(err, VecdbError::NotFound { .. }));
    }

    #[test]
    fn build_then_open_preserves_entries_and_meta() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("index.db");
        let chunks = vec![
            chunk("Naruto", 0, "A young ninja dreams of recognition. Genres: Action"),
            chunk("K-On!", 0, "Girls join the light music club at school. Genres: Comedy"),
        ];
        let embedder = KeywordEmbedder::new("test-model-v1");

        let summary = build_index(&chunks, &embedder, &path).unwrap();
        assert_eq!(summary.entries, 2);
        assert_eq!(summary.model_id, "test-model-v1");

        let index = Index::open(&path).unwrap();
        assert_eq!(index.len(), 2);
        assert_eq!(index.model_id(), "test-model-v1");
        assert_eq!(index.dimension(), summary.dimension);
        assert_eq!(index.entries[0].source_name, "Naruto");
        assert_eq!(index.entries[1].source_name, "K-On!");
    }

    #[test]
    fn rebuild_replaces_prior_index() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("index.db");
        let embedder = KeywordEmbedder::new("test-model-v1");

        build_index(&[chunk("Naruto", 0, "ninja action")], &embedder, &path).unwrap();
        build_index(
            &[
                chunk("K-On!", 0, "school music comedy"),
                chunk("Death Note", 0, "thriller detective"),
            ],
            &embedder,
            &path,
        )
        .unwrap();

        let index = Index::open(&path).unwrap();
        assert_eq!(index.len(), 2);
        assert_eq!(index.entries[0].source_name, "K-On!");
    }

    #[test]
    fn empty_build_is_refused() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("index.db");
        let embedder = KeywordEmbedder::new("test-model-v1");
        let err = build_index(&[], &embedder, &path).unwrap_err();
        assert!(matches!(err, VecdbError::EmptyBuild));
        assert!(!path.exists());
    }

    #[test]
    fn failed_build_never_creates_live_index() {
        struct FailingEmbedder;
        impl Embedder for FailingEmbedder {
            fn model_id(&self) -> &str {
                "failing"
            }
            fn embed(&self, _text: &str) -> Result<Vec<f32>> {
                Err(VecdbError::Embedding("backend down".into()))
            }
        }

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("index.db");
        let err = build_index(&[chunk("Naruto", 0, "ninja")], &FailingEmbedder, &path).unwrap_err();
        assert!(matches!(err, VecdbError::Embedding(_)));
        // The live path was never created by the failed run.
        assert!(!path.exists());
    }
}
