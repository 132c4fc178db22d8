//! Sled-backed record store
//!
//! One tree per entity, JSON values. Time-ordered trees use a big-endian,
//! sign-flipped microsecond timestamp as key prefix so iteration order is
//! chronological.
//!
//! Knowledge chunks are keyed `generation (u64 BE) ++ chunk id`. A rebuild
//! writes a complete new generation in one batch, then flips the active
//! generation pointer in the `meta` tree. Rebuilds are serialized by a
//! writer lock. The generation before the active one is kept; anything older
//! is swept. Readers re-check the pointer after scanning and rescan if it
//! moved, so a read only ever returns one whole generation.
//!
//! A surge, its alert and its event are written in one multi-tree
//! transaction.

use chrono::{DateTime, Utc};
use serde::de::DeserializeOwned;
use serde::Serialize;
use sled::transaction::{TransactionError, TransactionResult, Transactional};
use std::path::Path;
use std::sync::{Arc, Mutex};
use tracing::{debug, trace};
use uuid::Uuid;

use super::{RecordStore, StorageError};
use crate::types::{
    ActionPlan, Alert, Berth, ContainerMove, Event, KnowledgeChunk, Surge, UtilizationSample,
    Vessel, WeatherObservation, YardBlock,
};

const ACTIVE_GENERATION_KEY: &[u8] = b"knowledge.active_generation";

#[derive(Clone)]
pub struct SledStore {
    db: Arc<sled::Db>,
    vessels: sled::Tree,
    yard_blocks: sled::Tree,
    berths: sled::Tree,
    alerts: sled::Tree,
    events: sled::Tree,
    surges: sled::Tree,
    plans: sled::Tree,
    weather: sled::Tree,
    moves: sled::Tree,
    utilization: sled::Tree,
    knowledge: sled::Tree,
    meta: sled::Tree,
    /// Held for the whole of a knowledge rebuild
    knowledge_writer: Arc<Mutex<()>>,
}

impl SledStore {
    /// Open or create the store at `path`
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self, StorageError> {
        let db = sled::open(path)?;
        Ok(Self {
            vessels: db.open_tree("vessels")?,
            yard_blocks: db.open_tree("yard_blocks")?,
            berths: db.open_tree("berths")?,
            alerts: db.open_tree("alerts")?,
            events: db.open_tree("events")?,
            surges: db.open_tree("surges")?,
            plans: db.open_tree("action_plans")?,
            weather: db.open_tree("weather")?,
            moves: db.open_tree("container_moves")?,
            utilization: db.open_tree("utilization_history")?,
            knowledge: db.open_tree("knowledge")?,
            meta: db.open_tree("meta")?,
            knowledge_writer: Arc::new(Mutex::new(())),
            db: Arc::new(db),
        })
    }

    /// Flush dirty pages to disk
    pub fn flush(&self) -> Result<(), StorageError> {
        self.db.flush()?;
        Ok(())
    }

    fn active_generation(&self) -> Result<Option<u64>, StorageError> {
        let Some(raw) = self.meta.get(ACTIVE_GENERATION_KEY)? else {
            return Ok(None);
        };
        let bytes: [u8; 8] = raw.as_ref().try_into().map_err(|_| {
            StorageError::Serialization("active generation pointer is not 8 bytes".to_string())
        })?;
        Ok(Some(u64::from_be_bytes(bytes)))
    }
}

/// Chronologically sortable key for a timestamp
fn time_key(ts: DateTime<Utc>) -> [u8; 8] {
    #[allow(clippy::cast_sign_loss)]
    let shifted = (ts.timestamp_micros() as u64) ^ (1 << 63);
    shifted.to_be_bytes()
}

fn compound_key(parts: &[&[u8]]) -> Vec<u8> {
    parts.concat()
}

fn put<T: Serialize>(tree: &sled::Tree, key: impl AsRef<[u8]>, value: &T) -> Result<(), StorageError> {
    tree.insert(key.as_ref(), serde_json::to_vec(value)?)?;
    Ok(())
}

fn get<T: DeserializeOwned>(tree: &sled::Tree, key: impl AsRef<[u8]>) -> Result<Option<T>, StorageError> {
    tree.get(key.as_ref())?
        .map(|raw| serde_json::from_slice(&raw).map_err(StorageError::from))
        .transpose()
}

fn decode_all<T: DeserializeOwned>(iter: sled::Iter) -> Result<Vec<T>, StorageError> {
    iter.map(|item| {
        let (_key, value) = item?;
        Ok(serde_json::from_slice(&value)?)
    })
    .collect()
}

impl RecordStore for SledStore {
    fn list_vessels(&self) -> Result<Vec<Vessel>, StorageError> {
        decode_all(self.vessels.iter())
    }

    fn save_vessel(&self, vessel: &Vessel) -> Result<(), StorageError> {
        put(&self.vessels, vessel.id.as_bytes(), vessel)
    }

    fn list_yard_blocks(&self) -> Result<Vec<YardBlock>, StorageError> {
        decode_all(self.yard_blocks.iter())
    }

    fn get_yard_block(&self, code: &str) -> Result<Option<YardBlock>, StorageError> {
        get(&self.yard_blocks, code.as_bytes())
    }

    fn save_yard_block(&self, block: &YardBlock) -> Result<(), StorageError> {
        put(&self.yard_blocks, block.code.as_bytes(), block)
    }

    fn list_berths(&self) -> Result<Vec<Berth>, StorageError> {
        decode_all(self.berths.iter())
    }

    fn save_berth(&self, berth: &Berth) -> Result<(), StorageError> {
        put(&self.berths, berth.code.as_bytes(), berth)
    }

    fn list_alerts(&self) -> Result<Vec<Alert>, StorageError> {
        decode_all(self.alerts.iter())
    }

    fn get_alert(&self, id: Uuid) -> Result<Option<Alert>, StorageError> {
        get(&self.alerts, id.as_bytes())
    }

    fn save_alert(&self, alert: &Alert) -> Result<(), StorageError> {
        put(&self.alerts, alert.id.as_bytes(), alert)
    }

    fn list_events(&self) -> Result<Vec<Event>, StorageError> {
        decode_all(self.events.iter())
    }

    fn save_event(&self, event: &Event) -> Result<(), StorageError> {
        let key = compound_key(&[&time_key(event.created_at), event.id.as_bytes()]);
        put(&self.events, key, event)
    }

    fn list_surges(&self) -> Result<Vec<Surge>, StorageError> {
        decode_all(self.surges.iter())
    }

    fn get_surge(&self, id: Uuid) -> Result<Option<Surge>, StorageError> {
        get(&self.surges, id.as_bytes())
    }

    fn save_surge(&self, surge: &Surge) -> Result<(), StorageError> {
        put(&self.surges, surge.id.as_bytes(), surge)
    }

    fn record_surge(&self, surge: &Surge, alert: &Alert, event: &Event) -> Result<(), StorageError> {
        let surge_value = serde_json::to_vec(surge)?;
        let alert_value = serde_json::to_vec(alert)?;
        let event_key = compound_key(&[&time_key(event.created_at), event.id.as_bytes()]);
        let event_value = serde_json::to_vec(event)?;

        let trees = (&self.surges, &self.alerts, &self.events);
        let result: TransactionResult<()> = trees.transaction(|(surges, alerts, events)| {
            surges.insert(&surge.id.as_bytes()[..], surge_value.as_slice())?;
            alerts.insert(&alert.id.as_bytes()[..], alert_value.as_slice())?;
            events.insert(event_key.as_slice(), event_value.as_slice())?;
            Ok(())
        });

        match result {
            Ok(()) => Ok(()),
            Err(TransactionError::Storage(err)) => Err(err.into()),
            Err(TransactionError::Abort(())) => {
                Err(StorageError::Database("surge transaction aborted".to_string()))
            }
        }
    }

    fn save_action_plan(&self, plan: &ActionPlan) -> Result<(), StorageError> {
        let key = compound_key(&[
            plan.surge_id.as_bytes(),
            &time_key(plan.generated_at),
            plan.id.as_bytes(),
        ]);
        put(&self.plans, key, plan)
    }

    fn latest_plan_for_surge(&self, surge_id: Uuid) -> Result<Option<ActionPlan>, StorageError> {
        match self.plans.scan_prefix(surge_id.as_bytes()).next_back() {
            Some(item) => {
                let (_key, value) = item?;
                Ok(Some(serde_json::from_slice(&value)?))
            }
            None => Ok(None),
        }
    }

    fn list_weather(&self) -> Result<Vec<WeatherObservation>, StorageError> {
        decode_all(self.weather.iter())
    }

    fn save_weather(&self, observation: &WeatherObservation) -> Result<(), StorageError> {
        let key = compound_key(&[&time_key(observation.observed_at), observation.id.as_bytes()]);
        put(&self.weather, key, observation)
    }

    fn latest_weather(&self) -> Result<Option<WeatherObservation>, StorageError> {
        match self.weather.iter().next_back() {
            Some(item) => {
                let (_key, value) = item?;
                Ok(Some(serde_json::from_slice(&value)?))
            }
            None => Ok(None),
        }
    }

    fn list_container_moves(&self) -> Result<Vec<ContainerMove>, StorageError> {
        decode_all(self.moves.iter())
    }

    fn save_container_move(&self, mv: &ContainerMove) -> Result<(), StorageError> {
        let key = compound_key(&[&time_key(mv.ts), mv.id.as_bytes()]);
        put(&self.moves, key, mv)
    }

    fn list_utilization_samples(&self) -> Result<Vec<UtilizationSample>, StorageError> {
        decode_all(self.utilization.iter())
    }

    fn save_utilization_sample(&self, sample: &UtilizationSample) -> Result<(), StorageError> {
        let key = compound_key(&[&time_key(sample.time), sample.id.as_bytes()]);
        put(&self.utilization, key, sample)
    }

    fn replace_knowledge(&self, chunks: Vec<KnowledgeChunk>) -> Result<(), StorageError> {
        let _writer = self
            .knowledge_writer
            .lock()
            .map_err(|e| StorageError::Database(e.to_string()))?;

        let active = self.active_generation()?;
        let next = active.map_or(1, |g| g + 1);
        let prefix = next.to_be_bytes();

        let mut batch = sled::Batch::default();
        // Leftovers from an attempt that never flipped the pointer
        for item in self.knowledge.range(prefix..) {
            let (key, _) = item?;
            batch.remove(key);
        }
        for chunk in &chunks {
            batch.insert(
                compound_key(&[&prefix, chunk.id.as_bytes()]),
                serde_json::to_vec(chunk)?,
            );
        }
        self.knowledge.apply_batch(batch)?;
        self.meta.insert(ACTIVE_GENERATION_KEY, prefix.to_vec())?;

        // Keep `next - 1` for in-flight readers, sweep the rest
        let keep_from = (next - 1).to_be_bytes();
        let mut sweep = sled::Batch::default();
        let mut swept = 0usize;
        for item in self.knowledge.range(..keep_from) {
            let (key, _) = item?;
            sweep.remove(key);
            swept += 1;
        }
        self.knowledge.apply_batch(sweep)?;

        debug!(generation = next, chunks = chunks.len(), swept, "Knowledge generation activated");
        Ok(())
    }

    fn knowledge_chunks(&self) -> Result<Vec<KnowledgeChunk>, StorageError> {
        let mut generation = self.active_generation()?;
        loop {
            let Some(current) = generation else {
                return Ok(Vec::new());
            };
            let chunks = decode_all(self.knowledge.scan_prefix(current.to_be_bytes()))?;

            // The pointer only moves forward, and a generation is only
            // touched after the pointer has left it
            let after = self.active_generation()?;
            if after == generation {
                return Ok(chunks);
            }
            trace!(scanned = current, active = ?after, "Knowledge generation moved during read, rescanning");
            generation = after;
        }
    }

    fn backend_name(&self) -> &'static str {
        "Sled"
    }
}
