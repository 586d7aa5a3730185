//! Nearest-neighbor retrieval over an opened index.

use std::cmp::Ordering;

use serde::Serialize;

use crate::embedder::Embedder;
use crate::error::{Result, VecdbError};
use crate::index::{Index, IndexEntry};

/// One retrieved chunk, ordered by ascending distance from the query.
#[derive(Debug, Clone, Serialize)]
pub struct RetrievedChunk {
    /// The chunk text, used as grounding context downstream.
    pub text: String,
    /// Source item name (provenance).
    pub source_name: String,
    /// Cosine distance from the query embedding, in `[0.0, 2.0]`.
    pub distance: f32,
}

impl Index {
    /// Embeds `query` with the given embedder and returns the top-`k`
    /// chunks by ascending cosine distance.
    ///
    /// The embedder must be the same model the index was built with;
    /// anything else is refused with [`VecdbError::ModelMismatch`] rather
    /// than returning silently wrong neighbors.
    pub fn search(
        &self,
        embedder: &dyn Embedder,
        query: &str,
        k: usize,
    ) -> Result<Vec<RetrievedChunk>> {
        if embedder.model_id() != self.model_id() {
            return Err(VecdbError::ModelMismatch {
                indexed: self.model_id().to_string(),
                query: embedder.model_id().to_string(),
            });
        }
        let vector = embedder.embed(query)?;
        self.search_vector(&vector, k)
    }

    /// Vector-level search primitive. Returns at most `k` results; an
    /// index with fewer than `k` entries returns all of them. Ties on
    /// distance are broken by insertion order.
    pub fn search_vector(&self, query: &[f32], k: usize) -> Result<Vec<RetrievedChunk>> {
        if k == 0 {
            return Err(VecdbError::InvalidK);
        }
        if query.len() != self.dimension() {
            return Err(VecdbError::Dimension {
                expected: self.dimension(),
                actual: query.len(),
            });
        }

        let mut scored: Vec<(f32, &IndexEntry)> = self
            .entries
            .iter()
            .map(|entry| (cosine_distance(query, &entry.embedding), entry))
            .collect();
        scored.sort_by(|a, b| {
            a.0.partial_cmp(&b.0)
                .unwrap_or(Ordering::Equal)
                .then(a.1.id.cmp(&b.1.id))
        });
        scored.truncate(k);

        Ok(scored
            .into_iter()
            .map(|(distance, entry)| RetrievedChunk {
                text: entry.text.clone(),
                source_name: entry.source_name.clone(),
                distance,
            })
            .collect())
    }
}

/// Cosine distance `1 - cos(a, b)`. Zero-norm vectors compare as maximally
/// distant instead of poisoning the ordering with NaN.
fn cosine_distance(a: &[f32], b: &[f32]) -> f32 {
    let dot: f32 = a.iter().zip(b.iter()).map(|(x, y)| x * y).sum();
    let norm_a: f32 = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let norm_b: f32 = b.iter().map(|x| x * x).sum::<f32>().sqrt();
    if norm_a == 0.0 || norm_b == 0.0 {
        return 1.0;
    }
    1.0 - (dot / (norm_a * norm_b)).clamp(-1.0, 1.0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::index::build_index;
    use crate::testutil::{KeywordEmbedder, chunk};

    fn scenario_index(dir: &tempfile::TempDir) -> (Index, KeywordEmbedder) {
        let path = dir.path().join("index.db");
        let chunks = vec![
            chunk(
                "Naruto",
                0,
                "Naruto. Overview: A young ninja seeks recognition and dreams of leading his \
                 village. Genres: Action, Adventure",
            ),
            chunk(
                "K-On!",
                0,
                "K-On!. Overview: Four high school girls join the light music club and spend \
                 their days at school practicing and drinking tea. Genres: Slice of Life, \
                 Music, Comedy",
            ),
            chunk(
                "Death Note",
                0,
                "Death Note. Overview: A brilliant student finds a lethal notebook and is \
                 hunted by an equally brilliant detective. Genres: Psychological, Thriller",
            ),
        ];
        let embedder = KeywordEmbedder::new("test-model-v1");
        build_index(&chunks, &embedder, &path).unwrap();
        (Index::open(&path).unwrap(), embedder)
    }

    #[test]
    fn cosine_distance_basics() {
        assert!(cosine_distance(&[1.0, 0.0], &[1.0, 0.0]).abs() < 1e-6);
        assert!((cosine_distance(&[1.0, 0.0], &[0.0, 1.0]) - 1.0).abs() < 1e-6);
        assert_eq!(cosine_distance(&[0.0, 0.0], &[1.0, 0.0]), 1.0);
    }

    #[test]
    fn school_query_retrieves_kon_first() {
        let dir = tempfile::tempdir().unwrap();
        let (index, embedder) = scenario_index(&dir);

        let results = index
            .search(&embedder, "light-hearted anime with school settings", 3)
            .unwrap();
        assert_eq!(results.len(), 3);
        assert_eq!(results[0].source_name, "K-On!");
        // Ordering is non-decreasing in distance.
        assert!(results[0].distance <= results[1].distance);
        assert!(results[1].distance <= results[2].distance);
    }

    #[test]
    fn search_returns_at_most_k() {
        let dir = tempfile::tempdir().unwrap();
        let (index, embedder) = scenario_index(&dir);

        let results = index.search(&embedder, "ninja action", 2).unwrap();
        assert_eq!(results.len(), 2);
        assert_eq!(results[0].source_name, "Naruto");
    }

    #[test]
    fn k_larger_than_index_returns_all() {
        let dir = tempfile::tempdir().unwrap();
        let (index, embedder) = scenario_index(&dir);

        let results = index.search(&embedder, "detective thriller", 10).unwrap();
        assert_eq!(results.len(), index.len());
        assert_eq!(results[0].source_name, "Death Note");
    }

    #[test]
    fn zero_k_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let (index, embedder) = scenario_index(&dir);

        let err = index.search(&embedder, "anything", 0).unwrap_err();
        assert!(matches!(err, VecdbError::InvalidK));
    }

    #[test]
    fn mismatched_model_is_refused() {
        let dir = tempfile::tempdir().unwrap();
        let (index, _) = scenario_index(&dir);

        let other = KeywordEmbedder::new("some-other-model");
        let err = index.search(&other, "school", 3).unwrap_err();
        assert!(matches!(err, VecdbError::ModelMismatch { .. }));
    }

    #[test]
    fn mismatched_query_dimension_is_refused() {
        let dir = tempfile::tempdir().unwrap();
        let (index, _) = scenario_index(&dir);

        let err = index.search_vector(&[1.0, 0.0], 3).unwrap_err();
        assert!(matches!(err, VecdbError::Dimension { .. }));
    }

    #[test]
    fn equal_distances_tie_break_by_insertion_order() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("index.db");
        let embedder = KeywordEmbedder::new("test-model-v1");
        // Identical text twice: identical vectors, identical distances.
        let chunks = vec![
            chunk("First", 0, "school music"),
            chunk("Second", 0, "school music"),
        ];
        build_index(&chunks, &embedder, &path).unwrap();
        let index = Index::open(&path).unwrap();

        let results = index.search(&embedder, "school music", 2).unwrap();
        assert_eq!(results[0].source_name, "First");
        assert_eq!(results[1].source_name, "Second");
    }

    #[test]
    fn rebuild_with_same_dataset_is_equivalent() {
        let dir = tempfile::tempdir().unwrap();
        let (first, embedder) = scenario_index(&dir);
        let first_results = first
            .search(&embedder, "light-hearted anime with school settings", 3)
            .unwrap();

        // Rebuild at the same location with the same chunks.
        let (second, _) = scenario_index(&dir);
        let second_results = second
            .search(&embedder, "light-hearted anime with school settings", 3)
            .unwrap();

        let names = |rs: &[RetrievedChunk]| {
            rs.iter().map(|r| r.source_name.clone()).collect::<Vec<_>>()
        };
        assert_eq!(names(&first_results), names(&second_results));
    }
}
