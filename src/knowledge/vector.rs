//! Vector helpers: dimension canonicalisation and Euclidean ranking

use crate::types::{KnowledgeChunk, ScoredChunk};

/// Fit a backend vector to dimension `dim` (truncate or zero-pad)
pub fn canonicalize(mut vector: Vec<f32>, dim: usize) -> Vec<f32> {
    vector.resize(dim, 0.0);
    vector
}

/// Euclidean (L2) distance. Vectors of unequal length yield `None`.
pub fn euclidean_distance(a: &[f32], b: &[f32]) -> Option<f32> {
    if a.len() != b.len() {
        return None;
    }
    let sum: f32 = a.iter().zip(b).map(|(x, y)| (x - y) * (x - y)).sum();
    Some(sum.sqrt())
}

/// The `limit` chunks closest to `query`, nearest first.
///
/// Chunks without an embedding, or whose embedding length differs from the
/// query, are skipped. Equal distances keep store order.
pub fn rank_nearest<'a, I>(chunks: I, query: &[f32], limit: usize) -> Vec<ScoredChunk>
where
    I: IntoIterator<Item = &'a KnowledgeChunk>,
{
    if limit == 0 {
        return Vec::new();
    }

    let mut scored: Vec<(&KnowledgeChunk, f32)> = chunks
        .into_iter()
        .filter_map(|chunk| {
            let embedding = chunk.embedding.as_deref()?;
            euclidean_distance(embedding, query).map(|d| (chunk, d))
        })
        .collect();

    scored.sort_by(|a, b| a.1.total_cmp(&b.1));
    scored.truncate(limit);

    scored
        .into_iter()
        .map(|(chunk, distance)| ScoredChunk {
            chunk: chunk.clone(),
            distance,
        })
        .collect()
}
