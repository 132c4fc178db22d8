//! SurgeOps: port surge detection and response
//!
//! Watches vessel arrivals and yard utilisation, detects abnormal load
//! ("surges"), raises actionable alerts and produces remediation plans
//! grounded in the current state of the terminal.
//!
//! ## Architecture
//!
//! - **Detection**: metrics window, priority-ordered surge rules, alert synthesis
//! - **Knowledge**: fact extraction, embeddings, nearest-neighbour retrieval
//! - **Planning**: generative action plans with a deterministic template fallback
//! - **Pipeline**: orchestrates one evaluation end to end and persists the results
//! - **Storage**: `RecordStore` over sled or in-memory collections

pub mod config;
pub mod types;
pub mod detection;
pub mod llm;
pub mod knowledge;
pub mod planning;
pub mod storage;
pub mod pipeline;

// Re-export configuration
pub use config::{ConfigError, SurgeOpsConfig, SurgeThresholds};

// Re-export commonly used types
pub use types::{
    ActionPlan, ActionPlanStatus, Alert, AlertSeverity, Berth, ChunkKind, ContainerMove, Event,
    KnowledgeChunk, KpiSnapshot, MetricsSnapshot, MoveSuggestion, PlanPayload, ScoredChunk, Surge,
    SurgeStatus, Vessel, VesselStatus, WeatherObservation, YardBlock,
};

// Re-export pipeline components
pub use detection::{AlertSynthesizer, Evaluation, MetricsWindow, SurgeRuleEvaluator};
pub use knowledge::{KnowledgeBaseBuilder, Retriever};
pub use planning::PlanGenerator;
pub use pipeline::{OperationError, SurgePipeline, VesselUpdate};

// Re-export storage and backends
pub use storage::{InMemoryStore, RecordStore, SledStore, StorageError};
pub use llm::{AzureOpenAiClient, BackendError, ChatBackend, EmbeddingBackend};
