//! Knowledge Base Builder - full-replace rebuild of the knowledge store
//!
//! A rebuild extracts one statement per entity, embeds every statement in a
//! single batch request when an embedding backend is present, and hands the
//! finished generation to the store in one `replace_knowledge` call.
//!
//! If the embedding call fails (transport, HTTP status, or a reply with the
//! wrong number of vectors) nothing is written and the previous generation
//! stays active.

use chrono::{DateTime, Utc};
use std::sync::Arc;
use tracing::{debug, info, warn};
use uuid::Uuid;

use super::facts::{extract_facts, FactStatement, PortRecords};
use super::vector::canonicalize;
use crate::llm::{BackendError, EmbeddingBackend};
use crate::storage::{RecordStore, StorageError};
use crate::types::KnowledgeChunk;

pub struct KnowledgeBaseBuilder {
    store: Arc<dyn RecordStore>,
    embedder: Option<Arc<dyn EmbeddingBackend>>,
    dim: usize,
}

impl KnowledgeBaseBuilder {
    pub fn new(
        store: Arc<dyn RecordStore>,
        embedder: Option<Arc<dyn EmbeddingBackend>>,
        dim: usize,
    ) -> Self {
        Self { store, embedder, dim }
    }

    /// Rebuild as of now. See [`Self::rebuild_at`].
    pub async fn rebuild(&self) -> Result<usize, StorageError> {
        self.rebuild_at(Utc::now()).await
    }

    /// Replace the knowledge store with a fresh generation.
    ///
    /// Returns the number of chunks in the active generation after the call:
    /// the new generation on success, the retained one if embedding failed.
    /// Only storage failures are returned as errors.
    pub async fn rebuild_at(&self, now: DateTime<Utc>) -> Result<usize, StorageError> {
        let records = PortRecords::load(self.store.as_ref())?;
        let facts = extract_facts(now, &records);
        debug!(facts = facts.len(), "Facts extracted");

        let embeddings: Vec<Option<Vec<f32>>> = match &self.embedder {
            Some(embedder) => match self.embed_all(embedder.as_ref(), &facts).await {
                Ok(vectors) => vectors.into_iter().map(Some).collect(),
                Err(e) => {
                    let active = self.store.knowledge_chunks()?.len();
                    warn!(
                        backend = embedder.backend_name(),
                        error = %e,
                        active,
                        "Embedding failed, keeping previous knowledge generation"
                    );
                    return Ok(active);
                }
            },
            None => {
                debug!("No embedding backend configured, storing chunks without embeddings");
                vec![None; facts.len()]
            }
        };

        let chunks: Vec<KnowledgeChunk> = facts
            .into_iter()
            .zip(embeddings)
            .map(|(fact, embedding)| KnowledgeChunk {
                id: Uuid::new_v4(),
                kind: fact.kind,
                source_key: fact.source_key,
                title: fact.title,
                content: fact.content,
                embedding,
                updated_at: now,
            })
            .collect();

        let count = chunks.len();
        let embedded = chunks.iter().filter(|c| c.embedding.is_some()).count();
        self.store.replace_knowledge(chunks)?;

        info!(
            chunks = count,
            embedded,
            store = self.store.backend_name(),
            "Knowledge base rebuilt"
        );
        Ok(count)
    }

    async fn embed_all(
        &self,
        embedder: &dyn EmbeddingBackend,
        facts: &[FactStatement],
    ) -> Result<Vec<Vec<f32>>, BackendError> {
        let inputs: Vec<String> = facts.iter().map(|f| f.content.clone()).collect();
        let vectors = embedder.embed(&inputs).await?;
        if vectors.len() != inputs.len() {
            return Err(BackendError::Malformed(format!(
                "expected {} embeddings, got {}",
                inputs.len(),
                vectors.len()
            )));
        }
        Ok(vectors
            .into_iter()
            .map(|v| canonicalize(v, self.dim))
            .collect())
    }
}
