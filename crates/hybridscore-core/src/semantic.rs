//! Semantic similarity between reference and candidate answers.

use crate::embedding::{cosine_similarity, Embedder};
use crate::error::ModelError;

/// Cosine similarity of the two embeddings rescaled from [-1, 1] to [0, 1].
///
/// Empty texts are passed through; with the hashing backend they embed to
/// the zero vector and score 0.5.
pub fn similarity(embedder: &dyn Embedder, a: &str, b: &str) -> Result<f64, ModelError> {
    let emb_a = embedder.embed(a)?;
    let emb_b = embedder.embed(b)?;
    if emb_a.len() != emb_b.len() {
        return Err(ModelError::DimensionMismatch {
            expected: emb_a.len(),
            actual: emb_b.len(),
        });
    }
    let cos = cosine_similarity(&emb_a, &emb_b);
    Ok(((cos + 1.0) / 2.0).clamp(0.0, 1.0))
}
