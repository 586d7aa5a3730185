//! # Annai
//!
//! Grounded anime recommendations: retrieval-augmented generation over a
//! locally built vector index of anime records.
//!
//! The pipeline has an offline half (normalize the dataset, chunk it,
//! embed the chunks, persist the vector index, see `annai build` in
//! `tools/annai-cli`) and an online half: open the index once, then serve
//! [`Recommender::recommend`] calls. Each call embeds the query, retrieves
//! the nearest chunks, and asks the hosted generation model for exactly
//! three recommendations grounded in that context.
//!
//! ## Quick Start
//!
//! ```no_run
//! use annai::{Config, Recommender};
//!
//! let config = Config::load();
//! let recommender = Recommender::open(&config)?;
//! let answer = recommender.recommend("light-hearted anime with school settings")?;
//! println!("{answer}");
//! # Ok::<(), annai::RecommendError>(())
//! ```
pub mod config;
pub mod error;
pub mod recommender;

// Re-export primary API
pub use config::Config;
pub use error::{RecommendError, Result};
pub use recommender::Recommender;

// Pipeline building blocks from the member crates
pub use annai_core::{
    Chunk, ChunkConfig, Chunker, CombinedRecord, CoreError, EmbedConfig, TextEmbedder,
    load_dataset, normalize, write_combined,
};
pub use annai_llm::{ChatClient, ChatConfig, LlmError};
pub use annai_vecdb::{
    ChunkRecord, Embedder, Index, IndexSummary, RetrievedChunk, VecdbError, build_index,
};
