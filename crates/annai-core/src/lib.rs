//! # Annai Core
//!
//! Pipeline stages for the Annai recommendation engine: dataset
//! normalization, bounded chunking, DistilBERT sentence embeddings, and
//! prompt assembly. The stages are plain functions and small structs;
//! composition into an index build or a serving pipeline happens in the
//! `annai` facade crate and the CLI.
//!
//! ## Quick Start
//!
//! ```rust
//! use annai_core::chunker::{ChunkConfig, Chunker};
//! use annai_core::dataset::CombinedRecord;
//!
//! let chunker = Chunker::new(ChunkConfig::default()).unwrap();
//! let record = CombinedRecord {
//!     name: "K-On!".into(),
//!     combined_info: "K-On!. Overview: Four girls join the light music club. Genres: Comedy".into(),
//! };
//! let chunks = chunker.split(&record);
//!
//! assert_eq!(chunks.len(), 1);
//! assert_eq!(chunks[0].source_name, "K-On!");
//! ```
pub mod chunker;
pub mod dataset;
pub mod embed;
pub mod error;
pub mod prompt;

// Re-export primary API
pub use chunker::{Chunk, ChunkConfig, Chunker};
pub use dataset::{CombinedRecord, load_dataset, normalize, write_combined};
pub use embed::{EmbedConfig, TextEmbedder};
pub use error::{CoreError, Result};
