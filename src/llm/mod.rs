//! Generative Text & Embedding Backends
//!
//! Capability interfaces for the two external model services the pipeline
//! consumes, so plan generation and the knowledge base can run against either
//! the real REST deployment or a deterministic in-process stub.
//!
//! ## Implementations
//!
//! - **AzureOpenAiClient**: chat completions + embeddings over HTTPS (`reqwest`)
//! - **ScriptedChat**: replays a fixed reply or failure, records prompts
//! - **HashingEmbedder**: feature-hashed bag-of-words vectors, no network
//!
//! A backend that is not configured is represented by `None` at the call
//! site; components degrade instead of failing.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

mod azure_openai;
pub mod stub;

pub use azure_openai::AzureOpenAiClient;
pub use stub::{FailingEmbedder, HashingEmbedder, ScriptedChat};

/// Chat message role
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    System,
    User,
    Assistant,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: Role,
    pub content: String,
}

impl ChatMessage {
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: Role::System,
            content: content.into(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: content.into(),
        }
    }
}

/// Backend call errors. All of them are terminal for the call (no retry).
#[derive(Debug, thiserror::Error)]
pub enum BackendError {
    #[error("backend not configured")]
    NotConfigured,
    #[error("transport error: {0}")]
    Transport(String),
    #[error("backend returned status {status}: {body}")]
    Status { status: u16, body: String },
    #[error("malformed backend response: {0}")]
    Malformed(String),
}

impl From<reqwest::Error> for BackendError {
    fn from(err: reqwest::Error) -> Self {
        BackendError::Transport(err.to_string())
    }
}

/// Generative text capability
#[async_trait]
pub trait ChatBackend: Send + Sync {
    /// Send the conversation and return the assistant's reply text
    async fn chat_complete(&self, messages: &[ChatMessage]) -> Result<String, BackendError>;

    /// Backend name for logging
    fn backend_name(&self) -> &'static str;
}

/// Embedding capability
#[async_trait]
pub trait EmbeddingBackend: Send + Sync {
    /// Embed every input; one vector per input, in order. Vector length is
    /// backend-defined and may differ from the stored dimension.
    async fn embed(&self, inputs: &[String]) -> Result<Vec<Vec<f32>>, BackendError>;

    /// Backend name for logging
    fn backend_name(&self) -> &'static str;
}
