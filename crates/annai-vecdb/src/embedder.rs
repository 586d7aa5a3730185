//! Embedding seam between the index and whatever model produces vectors.

use crate::error::Result;

/// Produces fixed-dimensionality embedding vectors for text.
///
/// The index stores the implementor's [`model_id`](Embedder::model_id) as
/// metadata at build time and refuses queries from a different model, so
/// build-time and query-time vectors always come from the same place.
/// Implementations must be deterministic: identical text and model version
/// yield the same vector.
pub trait Embedder: Send + Sync {
    /// Stable identifier (name/version) of the underlying model.
    fn model_id(&self) -> &str;

    /// Embeds one text into a vector.
    fn embed(&self, text: &str) -> Result<Vec<f32>>;
}
