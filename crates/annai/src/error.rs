use thiserror::Error;

/// Failures surfaced by [`crate::Recommender`], tagged with the pipeline
/// stage that failed so callers can render a useful message.
#[derive(Debug, Error)]
pub enum RecommendError {
    /// The query was empty or whitespace-only. Rejected before any I/O.
    #[error("query is empty or whitespace-only")]
    EmptyQuery,

    /// The embedding model failed to load or run.
    #[error("embedding stage failed: {0}")]
    Embedding(#[from] annai_core::CoreError),

    /// Vector-index retrieval failed.
    #[error("retrieval stage failed: {0}")]
    Retrieval(#[from] annai_vecdb::VecdbError),

    /// The text-generation call failed.
    #[error("generation stage failed: {0}")]
    Generation(#[from] annai_llm::LlmError),
}

/// Result type alias for recommendation operations.
pub type Result<T> = std::result::Result<T, RecommendError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn errors_name_their_stage() {
        let retrieval: RecommendError = annai_vecdb::VecdbError::InvalidK.into();
        assert!(retrieval.to_string().contains("retrieval stage"));

        let generation: RecommendError = annai_llm::LlmError::MissingApiKey.into();
        assert!(generation.to_string().contains("generation stage"));
    }

    #[test]
    fn index_not_found_keeps_its_remedy_through_the_wrap() {
        let err: RecommendError = annai_vecdb::VecdbError::NotFound {
            path: "/tmp/index.db".into(),
        }
        .into();
        assert!(err.to_string().contains("run the index build"));
    }
}
