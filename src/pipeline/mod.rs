//! Surge Pipeline - detection-and-response orchestrator
//!
//! ## Data Flow
//!
//! ```text
//! vessels + yard blocks ──► MetricsWindow ──► SurgeRuleEvaluator
//!                                                    │ surge
//!                                                    ▼
//!                              Surge ──► AlertSynthesizer ──► Alert + Event
//!                                │
//!                                └──► PlanGenerator ──► ActionPlan
//! ```
//!
//! Everything produced by one evaluation is keyed to a single surge id.
//! Knowledge rebuild and retrieval run independently of detection and feed
//! the plan prompt.
//!
//! Overlapping evaluations are not deduplicated: two calls in quick
//! succession may each record a surge.

use chrono::{DateTime, Duration, Utc};
use std::sync::Arc;
use tracing::{debug, info};
use uuid::Uuid;

use crate::config::defaults::ARRIVALS_WINDOW_HOURS;
use crate::config::SurgeOpsConfig;
use crate::detection::{AlertSynthesizer, Evaluation, MetricsWindow, SurgeRuleEvaluator};
use crate::knowledge::{KnowledgeBaseBuilder, Retriever};
use crate::llm::{AzureOpenAiClient, BackendError, ChatBackend, EmbeddingBackend};
use crate::planning::PlanGenerator;
use crate::storage::{RecordStore, StorageError};
use crate::types::{ActionPlan, ScoredChunk, Surge, SurgeStatus};

mod operations;

pub use operations::{OperationError, VesselUpdate};

pub struct SurgePipeline {
    store: Arc<dyn RecordStore>,
    evaluator: SurgeRuleEvaluator,
    synthesizer: AlertSynthesizer,
    planner: PlanGenerator,
    builder: KnowledgeBaseBuilder,
    retriever: Retriever,
    chat: Option<Arc<dyn ChatBackend>>,
}

impl SurgePipeline {
    /// Wire the pipeline over explicit backends. `None` means not configured.
    pub fn new(
        store: Arc<dyn RecordStore>,
        config: &SurgeOpsConfig,
        chat: Option<Arc<dyn ChatBackend>>,
        embedder: Option<Arc<dyn EmbeddingBackend>>,
    ) -> Self {
        let dim = config.knowledge.embedding_dim;
        let retriever = Retriever::new(store.clone(), embedder.clone(), dim);
        let planner = PlanGenerator::new(store.clone(), chat.clone())
            .with_retriever(retriever.clone(), config.knowledge.plan_context_chunks);

        Self {
            evaluator: SurgeRuleEvaluator::new(config.surge),
            synthesizer: AlertSynthesizer::new(config.surge.suggestion_target_util),
            planner,
            builder: KnowledgeBaseBuilder::new(store.clone(), embedder, dim),
            retriever,
            chat,
            store,
        }
    }

    /// Wire the pipeline with the Azure OpenAI client from `config.llm`, if
    /// it is configured.
    pub fn from_config(store: Arc<dyn RecordStore>, config: &SurgeOpsConfig) -> Result<Self, BackendError> {
        let client = AzureOpenAiClient::from_config(&config.llm)?.map(Arc::new);
        match &client {
            Some(_) => info!(endpoint = %config.llm.endpoint, "Azure OpenAI backend configured"),
            None => info!("No generative backend configured, template plans and empty retrieval"),
        }

        let chat = client.clone().map(|c| c as Arc<dyn ChatBackend>);
        let embedder = client.map(|c| c as Arc<dyn EmbeddingBackend>);
        Ok(Self::new(store, config, chat, embedder))
    }

    pub fn store(&self) -> &Arc<dyn RecordStore> {
        &self.store
    }

    /// Evaluate the rules at `now`. On a surge, persist the surge, its alert
    /// and event together, then generate its action plan.
    ///
    /// Backend unavailability never fails this call; storage errors do. If
    /// the surge record fails nothing is stored and no plan is generated.
    pub async fn evaluate_surge(&self, now: DateTime<Utc>) -> Result<Option<Surge>, StorageError> {
        let vessels = self.store.list_vessels()?;
        let blocks = self.store.list_yard_blocks()?;
        let snapshot = MetricsWindow::new(now).compute(&vessels, &blocks);

        let Evaluation::Surge { trigger, snapshot } = self.evaluator.evaluate(&snapshot) else {
            debug!(?snapshot, "No surge");
            return Ok(None);
        };

        let surge = Surge {
            id: Uuid::new_v4(),
            detected_at: now,
            window_start: now,
            window_end: now + Duration::hours(ARRIVALS_WINDOW_HOURS),
            reason: trigger.reason().to_string(),
            status: SurgeStatus::Open,
            metrics: snapshot,
        };
        let notice = self.synthesizer.synthesize(&surge, &blocks);
        self.store.record_surge(&surge, &notice.alert, &notice.event)?;

        info!(
            surge_id = %surge.id,
            reason = %surge.reason,
            alert_id = %notice.alert.id,
            arrivals_next_6h = snapshot.arrivals_next_6h,
            avg_yard_util = snapshot.avg_yard_util,
            "Surge detected"
        );

        self.planner.generate_plan(&surge).await;
        Ok(Some(surge))
    }

    /// Replace the knowledge store; returns the active chunk count
    pub async fn rebuild_knowledge_base(&self) -> Result<usize, StorageError> {
        self.builder.rebuild().await
    }

    /// Nearest knowledge chunks for a free-text query. Never fails.
    pub async fn retrieve_similar(&self, query: &str, k: usize) -> Vec<ScoredChunk> {
        self.retriever.retrieve_similar(query, k).await
    }

    /// Generate and persist a plan for `surge`. Never fails.
    pub async fn generate_plan(&self, surge: &Surge) -> ActionPlan {
        self.planner.generate_plan(surge).await
    }
}
