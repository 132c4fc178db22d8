//! RecordStore trait - pluggable record storage
//!
//! Plain record CRUD for the port entities plus the knowledge store the
//! retrieval layer reads from:
//! - `InMemoryStore`: `RwLock` collections, knowledge generation behind `ArcSwap`
//! - `SledStore`: one sled tree per entity, JSON values
//!
//! The knowledge store is replaced as a whole. Readers see either the
//! previous generation or the new one, never a mix.

use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::knowledge::vector::rank_nearest;
use crate::types::{
    ActionPlan, Alert, Berth, ContainerMove, Event, KnowledgeChunk, ScoredChunk, Surge,
    UtilizationSample, Vessel, WeatherObservation, YardBlock,
};

mod memory;
mod sled_store;

pub use memory::InMemoryStore;
pub use sled_store::SledStore;

/// Storage errors
#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    #[error("database error: {0}")]
    Database(String),
    #[error("serialization error: {0}")]
    Serialization(String),
}

impl From<sled::Error> for StorageError {
    fn from(err: sled::Error) -> Self {
        StorageError::Database(err.to_string())
    }
}

impl From<serde_json::Error> for StorageError {
    fn from(err: serde_json::Error) -> Self {
        StorageError::Serialization(err.to_string())
    }
}

/// Record storage backend.
///
/// Saves are upserts: by `id` for vessels, alerts, surges and plans, by `code`
/// for yard blocks and berths. Yard blocks are listed in code order; events,
/// weather, moves and utilisation samples in chronological order.
pub trait RecordStore: Send + Sync {
    fn list_vessels(&self) -> Result<Vec<Vessel>, StorageError>;
    fn save_vessel(&self, vessel: &Vessel) -> Result<(), StorageError>;

    fn get_vessel(&self, id: Uuid) -> Result<Option<Vessel>, StorageError> {
        Ok(self.list_vessels()?.into_iter().find(|v| v.id == id))
    }

    fn find_vessel_by_imo(&self, imo: &str) -> Result<Option<Vessel>, StorageError> {
        Ok(self
            .list_vessels()?
            .into_iter()
            .find(|v| v.imo.as_deref() == Some(imo)))
    }

    fn find_vessel_by_name(&self, name: &str) -> Result<Option<Vessel>, StorageError> {
        Ok(self.list_vessels()?.into_iter().find(|v| v.name == name))
    }

    /// Vessels whose ETA falls in `[start, end)`
    fn vessels_with_eta_in(
        &self,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Result<Vec<Vessel>, StorageError> {
        Ok(self
            .list_vessels()?
            .into_iter()
            .filter(|v| v.eta_in(start, end))
            .collect())
    }

    fn list_yard_blocks(&self) -> Result<Vec<YardBlock>, StorageError>;
    fn get_yard_block(&self, code: &str) -> Result<Option<YardBlock>, StorageError>;
    fn save_yard_block(&self, block: &YardBlock) -> Result<(), StorageError>;

    fn list_berths(&self) -> Result<Vec<Berth>, StorageError>;
    fn save_berth(&self, berth: &Berth) -> Result<(), StorageError>;

    fn list_alerts(&self) -> Result<Vec<Alert>, StorageError>;
    fn get_alert(&self, id: Uuid) -> Result<Option<Alert>, StorageError>;
    fn save_alert(&self, alert: &Alert) -> Result<(), StorageError>;

    fn list_events(&self) -> Result<Vec<Event>, StorageError>;
    fn save_event(&self, event: &Event) -> Result<(), StorageError>;

    fn list_surges(&self) -> Result<Vec<Surge>, StorageError>;
    fn get_surge(&self, id: Uuid) -> Result<Option<Surge>, StorageError>;
    fn save_surge(&self, surge: &Surge) -> Result<(), StorageError>;

    /// Persist a detected surge with its alert and event as one unit:
    /// either all three are stored or none is
    fn record_surge(&self, surge: &Surge, alert: &Alert, event: &Event) -> Result<(), StorageError>;

    fn save_action_plan(&self, plan: &ActionPlan) -> Result<(), StorageError>;
    /// Most recently generated plan for a surge
    fn latest_plan_for_surge(&self, surge_id: Uuid) -> Result<Option<ActionPlan>, StorageError>;

    fn list_weather(&self) -> Result<Vec<WeatherObservation>, StorageError>;
    fn save_weather(&self, observation: &WeatherObservation) -> Result<(), StorageError>;

    /// Observation with the latest `observed_at`
    fn latest_weather(&self) -> Result<Option<WeatherObservation>, StorageError> {
        Ok(self
            .list_weather()?
            .into_iter()
            .max_by_key(|w| w.observed_at))
    }

    fn list_container_moves(&self) -> Result<Vec<ContainerMove>, StorageError>;
    fn save_container_move(&self, mv: &ContainerMove) -> Result<(), StorageError>;

    /// Utilisation samples in chronological order
    fn list_utilization_samples(&self) -> Result<Vec<UtilizationSample>, StorageError>;
    fn save_utilization_sample(&self, sample: &UtilizationSample) -> Result<(), StorageError>;

    /// Atomically replace every knowledge chunk with `chunks`
    fn replace_knowledge(&self, chunks: Vec<KnowledgeChunk>) -> Result<(), StorageError>;

    /// Chunks of the active generation
    fn knowledge_chunks(&self) -> Result<Vec<KnowledgeChunk>, StorageError>;

    /// Nearest embedded chunks by Euclidean distance, nearest first
    fn nearest_chunks(&self, vector: &[f32], limit: usize) -> Result<Vec<ScoredChunk>, StorageError> {
        let chunks = self.knowledge_chunks()?;
        Ok(rank_nearest(&chunks, vector, limit))
    }

    /// Backend name for logging
    fn backend_name(&self) -> &'static str;
}
