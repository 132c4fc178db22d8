//! Retriever - nearest-neighbour search over the active knowledge generation

use std::sync::Arc;
use tracing::{debug, warn};

use super::vector::canonicalize;
use crate::llm::EmbeddingBackend;
use crate::storage::RecordStore;
use crate::types::ScoredChunk;

#[derive(Clone)]
pub struct Retriever {
    store: Arc<dyn RecordStore>,
    embedder: Option<Arc<dyn EmbeddingBackend>>,
    dim: usize,
}

impl Retriever {
    pub fn new(
        store: Arc<dyn RecordStore>,
        embedder: Option<Arc<dyn EmbeddingBackend>>,
        dim: usize,
    ) -> Self {
        Self { store, embedder, dim }
    }

    /// The `k` chunks closest to `query` by Euclidean distance, nearest first.
    ///
    /// Never fails. No backend, `k == 0`, an embedding error or a store error
    /// all yield an empty list.
    pub async fn retrieve_similar(&self, query: &str, k: usize) -> Vec<ScoredChunk> {
        let Some(embedder) = &self.embedder else {
            debug!("No embedding backend configured, retrieval skipped");
            return Vec::new();
        };
        if k == 0 {
            return Vec::new();
        }

        let vector = match embedder.embed(&[query.to_string()]).await {
            Ok(vectors) => match vectors.into_iter().next() {
                Some(v) => canonicalize(v, self.dim),
                None => {
                    warn!(backend = embedder.backend_name(), "Embedding reply was empty");
                    return Vec::new();
                }
            },
            Err(e) => {
                warn!(backend = embedder.backend_name(), error = %e, "Query embedding failed");
                return Vec::new();
            }
        };

        match self.store.nearest_chunks(&vector, k) {
            Ok(hits) => {
                debug!(query, k, hits = hits.len(), "Retrieved similar chunks");
                hits
            }
            Err(e) => {
                warn!(error = %e, "Nearest-neighbour query failed");
                Vec::new()
            }
        }
    }
}
