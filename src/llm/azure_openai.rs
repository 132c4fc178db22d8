//! Azure OpenAI REST client - chat completions and embeddings

use async_trait::async_trait;
use serde::Deserialize;
use std::time::Duration;

use super::{BackendError, ChatBackend, ChatMessage, EmbeddingBackend};
use crate::config::LlmConfig;

/// HTTP client for an Azure OpenAI deployment pair (chat + embeddings)
#[derive(Clone)]
pub struct AzureOpenAiClient {
    http: reqwest::Client,
    endpoint: String,
    api_key: String,
    api_version: String,
    chat_deployment: String,
    embeddings_deployment: String,
    temperature: f64,
    max_tokens: u32,
}

impl AzureOpenAiClient {
    /// Build a client from config, or `None` when endpoint/key are missing
    pub fn from_config(config: &LlmConfig) -> Result<Option<Self>, BackendError> {
        if !config.is_configured() {
            return Ok(None);
        }

        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;

        Ok(Some(Self {
            http,
            endpoint: config.endpoint.trim().trim_end_matches('/').to_string(),
            api_key: config.api_key.trim().to_string(),
            api_version: config.api_version.clone(),
            chat_deployment: config.chat_deployment.clone(),
            embeddings_deployment: config.embeddings_deployment.clone(),
            temperature: config.temperature,
            max_tokens: config.max_tokens,
        }))
    }

    fn chat_url(&self) -> String {
        format!(
            "{}/openai/deployments/{}/chat/completions?api-version={}",
            self.endpoint, self.chat_deployment, self.api_version
        )
    }

    fn embeddings_url(&self) -> String {
        format!(
            "{}/openai/deployments/{}/embeddings?api-version={}",
            self.endpoint, self.embeddings_deployment, self.api_version
        )
    }

    async fn post_json(&self, url: String, body: serde_json::Value) -> Result<String, BackendError> {
        let resp = self
            .http
            .post(url)
            .header("api-key", &self.api_key)
            .json(&body)
            .send()
            .await?;

        let status = resp.status();
        let text = resp.text().await?;
        if !status.is_success() {
            return Err(BackendError::Status {
                status: status.as_u16(),
                body: truncate(&text, 256),
            });
        }
        Ok(text)
    }
}

#[async_trait]
impl ChatBackend for AzureOpenAiClient {
    async fn chat_complete(&self, messages: &[ChatMessage]) -> Result<String, BackendError> {
        let body = serde_json::json!({
            "messages": messages,
            "temperature": self.temperature,
            "max_tokens": self.max_tokens,
        });
        let text = self.post_json(self.chat_url(), body).await?;
        parse_chat_reply(&text)
    }

    fn backend_name(&self) -> &'static str {
        "AzureOpenAI"
    }
}

#[async_trait]
impl EmbeddingBackend for AzureOpenAiClient {
    async fn embed(&self, inputs: &[String]) -> Result<Vec<Vec<f32>>, BackendError> {
        if inputs.is_empty() {
            return Ok(Vec::new());
        }
        let body = serde_json::json!({ "input": inputs });
        let text = self.post_json(self.embeddings_url(), body).await?;
        parse_embeddings(&text)
    }

    fn backend_name(&self) -> &'static str {
        "AzureOpenAI"
    }
}

// ============================================================================
// Response Parsing
// ============================================================================

#[derive(Deserialize)]
struct ChatResponse {
    #[serde(default)]
    choices: Vec<ChatChoice>,
}

#[derive(Deserialize)]
struct ChatChoice {
    message: ChatChoiceMessage,
}

#[derive(Deserialize)]
struct ChatChoiceMessage {
    #[serde(default)]
    content: Option<String>,
}

#[derive(Deserialize)]
struct EmbeddingResponse {
    #[serde(default)]
    data: Vec<EmbeddingItem>,
}

#[derive(Deserialize)]
struct EmbeddingItem {
    embedding: Vec<f32>,
    #[serde(default)]
    index: Option<usize>,
}

/// Extract `choices[0].message.content`
fn parse_chat_reply(body: &str) -> Result<String, BackendError> {
    let resp: ChatResponse =
        serde_json::from_str(body).map_err(|e| BackendError::Malformed(e.to_string()))?;
    resp.choices
        .into_iter()
        .next()
        .and_then(|c| c.message.content)
        .filter(|c| !c.trim().is_empty())
        .ok_or_else(|| BackendError::Malformed("no assistant content in reply".to_string()))
}

/// Extract `data[].embedding`, ordered by `index` when the service provides it
fn parse_embeddings(body: &str) -> Result<Vec<Vec<f32>>, BackendError> {
    let mut resp: EmbeddingResponse =
        serde_json::from_str(body).map_err(|e| BackendError::Malformed(e.to_string()))?;
    if resp.data.iter().all(|d| d.index.is_some()) {
        resp.data.sort_by_key(|d| d.index);
    }
    Ok(resp.data.into_iter().map(|d| d.embedding).collect())
}

fn truncate(text: &str, max_chars: usize) -> String {
    text.chars().take(max_chars).collect()
}
