//! Plan Generator - action plan for a surge, generative with template fallback
//!
//! One chat request per plan, no retry. Any failure on that path (backend not
//! configured, transport or HTTP error, unusable reply) falls through to
//! [`fallback_payload`], so `generate_plan` always returns a well-formed plan.

use chrono::{DateTime, Utc};
use std::sync::Arc;
use tracing::{debug, info, warn};
use uuid::Uuid;

use super::parsing::{parse_plan_reply, PlanParseError};
use super::templates::{fallback_payload, LLM_SOURCE, TEMPLATE_SOURCE};
use crate::knowledge::{GroundingFacts, PortRecords, Retriever};
use crate::llm::{BackendError, ChatBackend, ChatMessage};
use crate::storage::RecordStore;
use crate::types::{ActionPlan, ActionPlanStatus, PlanPayload, Surge};

const SYSTEM_PROMPT: &str = "You are a container terminal operations planner. \
Respond with exactly one JSON object and no other text. \
Use exactly these keys: id, title, severity, estimatedTime, impact, description, steps, \
resourcesRequired, beforeData, afterData. \
steps and resourcesRequired are arrays of strings, steps in execution order. \
beforeData and afterData are objects describing the yard state before and after the plan.";

#[derive(Debug, thiserror::Error)]
enum GenerationError {
    #[error(transparent)]
    Backend(#[from] BackendError),
    #[error(transparent)]
    Parse(#[from] PlanParseError),
}

pub struct PlanGenerator {
    store: Arc<dyn RecordStore>,
    chat: Option<Arc<dyn ChatBackend>>,
    retriever: Option<Retriever>,
    context_chunks: usize,
}

impl PlanGenerator {
    pub fn new(store: Arc<dyn RecordStore>, chat: Option<Arc<dyn ChatBackend>>) -> Self {
        Self {
            store,
            chat,
            retriever: None,
            context_chunks: 0,
        }
    }

    /// Add the `context_chunks` nearest knowledge chunks to each prompt
    #[must_use]
    pub fn with_retriever(mut self, retriever: Retriever, context_chunks: usize) -> Self {
        self.retriever = Some(retriever);
        self.context_chunks = context_chunks;
        self
    }

    /// Generate, persist and return the plan for `surge`. Never fails.
    ///
    /// A storage error while persisting is logged; the plan is still returned.
    pub async fn generate_plan(&self, surge: &Surge) -> ActionPlan {
        let now = Utc::now();

        let (payload, source) = match &self.chat {
            None => {
                debug!(surge_id = %surge.id, "No chat backend configured, using template plan");
                (fallback_payload(surge.id), TEMPLATE_SOURCE)
            }
            Some(chat) => match self.request_plan(chat.as_ref(), surge, now).await {
                Ok(payload) => (payload, LLM_SOURCE),
                Err(e) => {
                    warn!(
                        surge_id = %surge.id,
                        backend = chat.backend_name(),
                        error = %e,
                        "Plan generation failed, using template plan"
                    );
                    (fallback_payload(surge.id), TEMPLATE_SOURCE)
                }
            },
        };

        let plan = ActionPlan {
            id: Uuid::new_v4(),
            surge_id: surge.id,
            generated_at: now,
            status: ActionPlanStatus::Ready,
            payload: encode(&payload),
            source: source.to_string(),
        };

        if let Err(e) = self.store.save_action_plan(&plan) {
            warn!(plan_id = %plan.id, surge_id = %surge.id, error = %e, "Failed to persist action plan");
        }

        info!(
            plan_id = %plan.id,
            surge_id = %surge.id,
            source,
            title = %payload.title,
            "Action plan generated"
        );
        plan
    }

    async fn request_plan(
        &self,
        chat: &dyn ChatBackend,
        surge: &Surge,
        now: DateTime<Utc>,
    ) -> Result<PlanPayload, GenerationError> {
        let prompt = self.build_prompt(surge, now).await;
        let messages = [ChatMessage::system(SYSTEM_PROMPT), ChatMessage::user(prompt)];
        let reply = chat.chat_complete(&messages).await?;
        Ok(parse_plan_reply(&reply, surge.id)?)
    }

    async fn build_prompt(&self, surge: &Surge, now: DateTime<Utc>) -> String {
        let mut prompt = format!(
            "Surge reason: {}\nSurge window: {} to {}\nMetrics: {}\n",
            surge.reason,
            surge.window_start.to_rfc3339(),
            surge.window_end.to_rfc3339(),
            surge.metrics.to_json()
        );

        match PortRecords::load(self.store.as_ref()) {
            Ok(records) => {
                prompt.push_str("\nCurrent port state:\n");
                prompt.push_str(&GroundingFacts::build(now, &records));
            }
            Err(e) => warn!(error = %e, "Grounding facts unavailable"),
        }

        if let Some(retriever) = &self.retriever {
            let hits = retriever.retrieve_similar(&surge.reason, self.context_chunks).await;
            if !hits.is_empty() {
                prompt.push_str("\nRelevant knowledge:\n");
                for hit in hits {
                    prompt.push_str(&format!("- {}: {}\n", hit.chunk.title, hit.chunk.content));
                }
            }
        }

        prompt
    }
}

fn encode(payload: &PlanPayload) -> String {
    serde_json::to_string(payload).unwrap_or_else(|e| {
        warn!(error = %e, "Plan payload encoding failed, storing empty object");
        "{}".to_string()
    })
}
