//! Bounded-size text chunking with sentence-boundary preference.

use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::dataset::CombinedRecord;
use crate::error::{CoreError, Result};

/// Chunking parameters. All values are in characters, not bytes, so
/// multi-byte titles and synopses never get cut mid-codepoint.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChunkConfig {
    /// Maximum characters per chunk.
    pub max_chars: usize,
    /// Fixed overlap window between consecutive chunks.
    pub overlap_chars: usize,
}

impl Default for ChunkConfig {
    fn default() -> Self {
        Self {
            max_chars: 500,
            overlap_chars: 50,
        }
    }
}

/// A bounded-length span of a combined record; the unit of retrieval.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Chunk {
    /// Chunk text, at most `max_chars` characters.
    pub text: String,
    /// Source anime name, for provenance.
    pub source_name: String,
    /// Position of this chunk within its source record.
    pub chunk_index: usize,
}

/// Splits combined records into retrieval chunks.
///
/// Windows advance with a fixed stride of `max_chars - overlap_chars`;
/// each window is trimmed back to the last sentence boundary found in its
/// final fifth, so splits land between sentences rather than inside words.
/// Trimming only shortens a window's tail; the next window still starts
/// at the fixed stride, so no text is skipped.
#[derive(Debug)]
pub struct Chunker {
    config: ChunkConfig,
    re_boundary: Regex,
}

impl Chunker {
    /// Validates the configuration and compiles the boundary pattern.
    ///
    /// # Errors
    ///
    /// [`CoreError::ChunkConfig`] when `max_chars` is zero or the overlap
    /// is not strictly smaller than `max_chars`.
    pub fn new(config: ChunkConfig) -> Result<Self> {
        if config.max_chars == 0 {
            return Err(CoreError::ChunkConfig("max_chars must be positive".into()));
        }
        if config.overlap_chars >= config.max_chars {
            return Err(CoreError::ChunkConfig(
                "overlap_chars must be smaller than max_chars".into(),
            ));
        }
        Ok(Self {
            config,
            re_boundary: Regex::new(r#"[.!?]['")\]]?\s"#)?,
        })
    }

    /// Chunking parameters in effect.
    #[must_use]
    pub fn config(&self) -> &ChunkConfig {
        &self.config
    }

    /// Splits one combined record into chunks.
    pub fn split(&self, record: &CombinedRecord) -> Vec<Chunk> {
        self.split_text(&record.combined_info, &record.name)
    }

    /// Splits arbitrary text, attributing every chunk to `source_name`.
    pub fn split_text(&self, text: &str, source_name: &str) -> Vec<Chunk> {
        let chars: Vec<char> = text.chars().collect();
        let total = chars.len();
        let mut chunks = Vec::new();
        if total == 0 {
            return chunks;
        }

        let step = (self.config.max_chars - self.config.overlap_chars).max(1);
        let mut start = 0;
        let mut chunk_index = 0;
        while start < total {
            let end = (start + self.config.max_chars).min(total);
            let window: String = chars[start..end].iter().collect();
            let cut = if end < total {
                self.sentence_cut(window)
            } else {
                window
            };
            let trimmed = cut.trim();
            if !trimmed.is_empty() {
                chunks.push(Chunk {
                    text: trimmed.to_string(),
                    source_name: source_name.to_string(),
                    chunk_index,
                });
                chunk_index += 1;
            }
            start += step;
        }
        chunks
    }

    /// Cuts the window at the last sentence boundary in its final fifth,
    /// or returns it whole when no boundary lands there.
    fn sentence_cut(&self, window: String) -> String {
        let search_from = window.len() * 4 / 5;
        let mut cut = None;
        for found in self.re_boundary.find_iter(&window) {
            if found.end() > search_from {
                cut = Some(found.end());
            }
        }
        match cut {
            Some(pos) => window[..pos].to_string(),
            None => window,
        }
    }
}
