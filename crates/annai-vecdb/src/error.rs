use std::path::PathBuf;

use thiserror::Error;

/// Errors that can occur while building, opening, or searching the index.
#[derive(Debug, Error)]
pub enum VecdbError {
    /// No index exists at the given location. The remedy is to run the
    /// build step, and the message says so.
    #[error("vector index not found at {path:?}: run the index build first")]
    NotFound {
        /// The location that was probed.
        path: PathBuf,
    },

    /// The index could not be written at the given location.
    #[error("failed to write vector index at {path:?}: {message}")]
    Write {
        /// The location being written.
        path: PathBuf,
        /// Underlying storage/filesystem failure.
        message: String,
    },

    /// The embedding backend failed while vectorizing a chunk or query.
    #[error("embedding failed: {0}")]
    Embedding(String),

    /// A vector did not match the index's declared dimensionality.
    #[error("embedding dimension mismatch: index expects {expected}, got {actual}")]
    Dimension {
        /// Dimensionality declared by the index schema.
        expected: usize,
        /// Dimensionality of the offending vector.
        actual: usize,
    },

    /// The index was built with a different embedding model than the one
    /// now querying it. Querying across models is a silent-relevance bug,
    /// so it is refused outright.
    #[error(
        "index was built with embedding model {indexed:?} but the query uses {query:?}: rebuild the index"
    )]
    ModelMismatch {
        /// Model id stored in the index metadata.
        indexed: String,
        /// Model id of the querying embedder.
        query: String,
    },

    /// There were no chunks to index.
    #[error("refusing to build an empty index: the dataset produced no usable chunks")]
    EmptyBuild,

    /// `k` must be positive.
    #[error("invalid retrieval count: k must be positive")]
    InvalidK,

    /// The index file exists but its contents are not usable.
    #[error("index file is corrupt: {0}")]
    Corrupt(String),

    /// SQLite-level failure while reading the index.
    #[error("index storage error: {0}")]
    Storage(#[from] rusqlite::Error),
}

/// Result type alias for vecdb operations.
pub type Result<T> = std::result::Result<T, VecdbError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn not_found_names_the_remedy() {
        let err = VecdbError::NotFound {
            path: PathBuf::from("/tmp/missing.db"),
        };
        assert!(err.to_string().contains("run the index build"));
    }

    #[test]
    fn model_mismatch_names_both_models() {
        let err = VecdbError::ModelMismatch {
            indexed: "model-a".into(),
            query: "model-b".into(),
        };
        let msg = err.to_string();
        assert!(msg.contains("model-a"));
        assert!(msg.contains("model-b"));
    }

    #[test]
    fn error_is_send_sync() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<VecdbError>();
    }
}
