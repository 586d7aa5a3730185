use thiserror::Error;

/// Errors that can occur in the Annai core pipeline stages.
#[derive(Debug, Error)]
pub enum CoreError {
    /// A required column is absent from the dataset header. This is a
    /// structural failure of the whole input, unlike individual rows with
    /// missing values, which are dropped.
    #[error("dataset is missing required column {column:?}")]
    Schema {
        /// Canonical name of the missing column.
        column: String,
    },

    /// The dataset could not be read or parsed.
    #[error("dataset read error: {0}")]
    Dataset(#[from] csv::Error),

    /// Filesystem error while handling dataset artifacts.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// Invalid chunking configuration.
    #[error("invalid chunk config: {0}")]
    ChunkConfig(String),

    /// A regex pattern failed to compile (should not happen with static
    /// patterns).
    #[error("regex compilation error: {0}")]
    Regex(#[from] regex::Error),

    /// The embedding model files could not be loaded.
    #[error("failed to load embedding model: {0}")]
    ModelLoad(String),

    /// Embedding inference failed.
    #[error("embedding error: {0}")]
    Embedding(String),
}

/// Result type alias for core operations.
pub type Result<T> = std::result::Result<T, CoreError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn schema_error_names_the_column() {
        let err = CoreError::Schema {
            column: "sypnopsis".into(),
        };
        assert!(err.to_string().contains("sypnopsis"));
    }

    #[test]
    fn error_is_send_sync() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<CoreError>();
    }
}
