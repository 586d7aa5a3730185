//! The recommendation orchestrator: retrieval plus grounded generation.

use annai_core::embed::TextEmbedder;
use annai_core::prompt;
use annai_llm::ChatClient;
use annai_vecdb::Index;

use crate::config::Config;
use crate::error::{RecommendError, Result};

/// Holds the opened index, the embedder, and the generation client across
/// calls.
///
/// Construction is the expensive part (model load + full index load);
/// calls are cheap. All held state is immutable and `Send + Sync`, so one
/// instance can be shared by reference across overlapping `recommend`
/// calls without locking. Lifetime is the caller's: build it once at
/// startup, drop it to release everything. A failed call leaves the
/// handles untouched and reusable.
pub struct Recommender {
    index: Index,
    embedder: TextEmbedder,
    client: ChatClient,
    top_k: usize,
}

impl Recommender {
    /// Opens the serving pipeline: loads the embedding model, opens the
    /// vector index, and builds the generation client.
    ///
    /// # Errors
    ///
    /// Missing index surfaces as a retrieval-stage error telling the user
    /// to run the build; a missing API credential fails here, fast, before
    /// any generation call is ever attempted.
    pub fn open(config: &Config) -> Result<Self> {
        let embedder = TextEmbedder::load(&config.embed)?;
        let index = Index::open(&config.index_path)?;
        if index.model_id() != embedder.model_id() {
            return Err(RecommendError::Retrieval(
                annai_vecdb::VecdbError::ModelMismatch {
                    indexed: index.model_id().to_string(),
                    query: embedder.model_id().to_string(),
                },
            ));
        }
        let client = ChatClient::new(config.chat_config())?;

        tracing::info!(
            entries = index.len(),
            model = %config.model,
            "recommender ready"
        );

        Ok(Self {
            index,
            embedder,
            client,
            top_k: config.top_k.max(1),
        })
    }

    /// Retrieval breadth used for grounding context.
    #[must_use]
    pub fn top_k(&self) -> usize {
        self.top_k
    }

    /// Produces one grounded recommendation for `query`.
    ///
    /// # Errors
    ///
    /// [`RecommendError::EmptyQuery`] for blank input (checked before any
    /// I/O); otherwise the first failing stage's error, tagged as
    /// retrieval or generation.
    pub fn recommend(&self, query: &str) -> Result<String> {
        validate_query(query)?;

        let retrieved = self.index.search(&self.embedder, query, self.top_k)?;
        if retrieved.is_empty() {
            tracing::warn!("no chunks retrieved; generation will see an empty context");
        }
        let context: Vec<String> = retrieved.into_iter().map(|chunk| chunk.text).collect();

        let user = prompt::user_prompt(query, &context);
        let answer = self.client.complete(prompt::SYSTEM_PREAMBLE, &user)?;
        Ok(answer)
    }
}

/// Rejects empty and whitespace-only queries.
fn validate_query(query: &str) -> Result<()> {
    if query.trim().is_empty() {
        return Err(RecommendError::EmptyQuery);
    }
    Ok(())
}
