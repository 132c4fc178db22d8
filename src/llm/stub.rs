//! In-process backends for offline runs and tests
//!
//! `HashingEmbedder` is deterministic: identical text always maps to the same
//! vector, and texts sharing words land closer than texts that don't.

use async_trait::async_trait;
use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};
use std::sync::Mutex;

use super::{BackendError, ChatBackend, ChatMessage, EmbeddingBackend};

/// Chat backend that replays a fixed outcome and records every prompt
#[derive(Debug)]
pub struct ScriptedChat {
    outcome: Result<String, String>,
    prompts: Mutex<Vec<Vec<ChatMessage>>>,
}

impl ScriptedChat {
    pub fn replying(text: impl Into<String>) -> Self {
        Self {
            outcome: Ok(text.into()),
            prompts: Mutex::new(Vec::new()),
        }
    }

    pub fn failing(message: impl Into<String>) -> Self {
        Self {
            outcome: Err(message.into()),
            prompts: Mutex::new(Vec::new()),
        }
    }

    /// Conversations received so far, oldest first
    pub fn prompts(&self) -> Vec<Vec<ChatMessage>> {
        self.prompts.lock().map(|p| p.clone()).unwrap_or_default()
    }
}

#[async_trait]
impl ChatBackend for ScriptedChat {
    async fn chat_complete(&self, messages: &[ChatMessage]) -> Result<String, BackendError> {
        if let Ok(mut prompts) = self.prompts.lock() {
            prompts.push(messages.to_vec());
        }
        self.outcome.clone().map_err(BackendError::Transport)
    }

    fn backend_name(&self) -> &'static str {
        "scripted"
    }
}

/// Feature-hashed bag-of-words embedder, L2-normalised
#[derive(Debug, Clone, Copy)]
pub struct HashingEmbedder {
    dim: usize,
}

impl HashingEmbedder {
    pub fn new(dim: usize) -> Self {
        Self { dim: dim.max(1) }
    }

    pub fn embed_text(&self, text: &str) -> Vec<f32> {
        let mut vector = vec![0.0_f32; self.dim];
        for token in text
            .split(|c: char| !c.is_alphanumeric())
            .filter(|t| !t.is_empty())
        {
            let mut hasher = DefaultHasher::new();
            token.to_lowercase().hash(&mut hasher);
            let bucket = (hasher.finish() % self.dim as u64) as usize;
            vector[bucket] += 1.0;
        }

        let norm = vector.iter().map(|v| v * v).sum::<f32>().sqrt();
        if norm > 0.0 {
            for v in &mut vector {
                *v /= norm;
            }
        }
        vector
    }
}

#[async_trait]
impl EmbeddingBackend for HashingEmbedder {
    async fn embed(&self, inputs: &[String]) -> Result<Vec<Vec<f32>>, BackendError> {
        Ok(inputs.iter().map(|text| self.embed_text(text)).collect())
    }

    fn backend_name(&self) -> &'static str {
        "hashing"
    }
}

/// Embedding backend whose every call fails
#[derive(Debug, Clone, Default)]
pub struct FailingEmbedder;

#[async_trait]
impl EmbeddingBackend for FailingEmbedder {
    async fn embed(&self, _inputs: &[String]) -> Result<Vec<Vec<f32>>, BackendError> {
        Err(BackendError::Status {
            status: 503,
            body: "embedding service unavailable".to_string(),
        })
    }

    fn backend_name(&self) -> &'static str {
        "failing"
    }
}
