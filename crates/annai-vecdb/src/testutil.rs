//! Deterministic embedder used by the crate's tests.

use crate::embedder::Embedder;
use crate::error::Result;
use crate::index::ChunkRecord;

/// Fixed keyword vocabulary; one vector component per word.
const VOCAB: [&str; 8] = [
    "action", "ninja", "school", "music", "light", "thriller", "detective", "comedy",
];

/// Counts vocabulary occurrences and L2-normalizes the counts. Identical
/// text always produces identical vectors, which is all the index cares
/// about.
pub struct KeywordEmbedder {
    id: String,
}

impl KeywordEmbedder {
    pub fn new(id: &str) -> Self {
        Self { id: id.to_string() }
    }
}

impl Embedder for KeywordEmbedder {
    fn model_id(&self) -> &str {
        &self.id
    }

    fn embed(&self, text: &str) -> Result<Vec<f32>> {
        let lower = text.to_lowercase();
        let mut vector: Vec<f32> = VOCAB
            .iter()
            .map(|word| lower.matches(word).count() as f32)
            .collect();
        let norm = vector.iter().map(|x| x * x).sum::<f32>().sqrt();
        if norm > 0.0 {
            for value in &mut vector {
                *value /= norm;
            }
        }
        Ok(vector)
    }
}

pub fn chunk(source_name: &str, chunk_index: usize, text: &str) -> ChunkRecord {
    ChunkRecord {
        source_name: source_name.to_string(),
        chunk_index,
        text: text.to_string(),
    }
}
