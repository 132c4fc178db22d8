//! In-memory record store for tests and single-process runs
//!
//! Thread-safe via `RwLock`. Not durable, data is lost on restart.

use arc_swap::ArcSwap;
use std::sync::{Arc, RwLock, RwLockWriteGuard};
use uuid::Uuid;

use super::{RecordStore, StorageError};
use crate::knowledge::vector::rank_nearest;
use crate::types::{
    ActionPlan, Alert, Berth, ContainerMove, Event, KnowledgeChunk, ScoredChunk, Surge,
    UtilizationSample, Vessel, WeatherObservation, YardBlock,
};

pub struct InMemoryStore {
    vessels: RwLock<Vec<Vessel>>,
    yard_blocks: RwLock<Vec<YardBlock>>,
    berths: RwLock<Vec<Berth>>,
    alerts: RwLock<Vec<Alert>>,
    events: RwLock<Vec<Event>>,
    surges: RwLock<Vec<Surge>>,
    plans: RwLock<Vec<ActionPlan>>,
    weather: RwLock<Vec<WeatherObservation>>,
    moves: RwLock<Vec<ContainerMove>>,
    utilization: RwLock<Vec<UtilizationSample>>,
    knowledge: ArcSwap<Vec<KnowledgeChunk>>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self {
            vessels: RwLock::new(Vec::new()),
            yard_blocks: RwLock::new(Vec::new()),
            berths: RwLock::new(Vec::new()),
            alerts: RwLock::new(Vec::new()),
            events: RwLock::new(Vec::new()),
            surges: RwLock::new(Vec::new()),
            plans: RwLock::new(Vec::new()),
            weather: RwLock::new(Vec::new()),
            moves: RwLock::new(Vec::new()),
            utilization: RwLock::new(Vec::new()),
            knowledge: ArcSwap::from_pointee(Vec::new()),
        }
    }
}

impl Default for InMemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

fn read_all<T: Clone>(lock: &RwLock<Vec<T>>) -> Result<Vec<T>, StorageError> {
    let store = lock
        .read()
        .map_err(|e| StorageError::Database(e.to_string()))?;
    Ok(store.clone())
}

fn find<T: Clone>(
    lock: &RwLock<Vec<T>>,
    pred: impl Fn(&T) -> bool,
) -> Result<Option<T>, StorageError> {
    let store = lock
        .read()
        .map_err(|e| StorageError::Database(e.to_string()))?;
    Ok(store.iter().find(|item| pred(item)).cloned())
}

fn write<T>(lock: &RwLock<Vec<T>>) -> Result<RwLockWriteGuard<'_, Vec<T>>, StorageError> {
    lock.write()
        .map_err(|e| StorageError::Database(e.to_string()))
}

/// Replace the first item matching `same`, or append
fn upsert_into<T: Clone>(store: &mut Vec<T>, item: &T, same: impl Fn(&T) -> bool) {
    match store.iter_mut().find(|existing| same(existing)) {
        Some(slot) => *slot = item.clone(),
        None => store.push(item.clone()),
    }
}

fn upsert<T: Clone>(
    lock: &RwLock<Vec<T>>,
    item: &T,
    same: impl Fn(&T) -> bool,
) -> Result<(), StorageError> {
    upsert_into(&mut *write(lock)?, item, same);
    Ok(())
}

impl RecordStore for InMemoryStore {
    fn list_vessels(&self) -> Result<Vec<Vessel>, StorageError> {
        read_all(&self.vessels)
    }

    fn save_vessel(&self, vessel: &Vessel) -> Result<(), StorageError> {
        upsert(&self.vessels, vessel, |v| v.id == vessel.id)
    }

    fn list_yard_blocks(&self) -> Result<Vec<YardBlock>, StorageError> {
        let mut blocks = read_all(&self.yard_blocks)?;
        blocks.sort_by(|a, b| a.code.cmp(&b.code));
        Ok(blocks)
    }

    fn get_yard_block(&self, code: &str) -> Result<Option<YardBlock>, StorageError> {
        find(&self.yard_blocks, |b| b.code == code)
    }

    fn save_yard_block(&self, block: &YardBlock) -> Result<(), StorageError> {
        upsert(&self.yard_blocks, block, |b| b.code == block.code)
    }

    fn list_berths(&self) -> Result<Vec<Berth>, StorageError> {
        let mut berths = read_all(&self.berths)?;
        berths.sort_by(|a, b| a.code.cmp(&b.code));
        Ok(berths)
    }

    fn save_berth(&self, berth: &Berth) -> Result<(), StorageError> {
        upsert(&self.berths, berth, |b| b.code == berth.code)
    }

    fn list_alerts(&self) -> Result<Vec<Alert>, StorageError> {
        read_all(&self.alerts)
    }

    fn get_alert(&self, id: Uuid) -> Result<Option<Alert>, StorageError> {
        find(&self.alerts, |a| a.id == id)
    }

    fn save_alert(&self, alert: &Alert) -> Result<(), StorageError> {
        upsert(&self.alerts, alert, |a| a.id == alert.id)
    }

    fn list_events(&self) -> Result<Vec<Event>, StorageError> {
        let mut events = read_all(&self.events)?;
        events.sort_by_key(|e| e.created_at);
        Ok(events)
    }

    fn save_event(&self, event: &Event) -> Result<(), StorageError> {
        upsert(&self.events, event, |e| e.id == event.id)
    }

    fn list_surges(&self) -> Result<Vec<Surge>, StorageError> {
        read_all(&self.surges)
    }

    fn get_surge(&self, id: Uuid) -> Result<Option<Surge>, StorageError> {
        find(&self.surges, |s| s.id == id)
    }

    fn save_surge(&self, surge: &Surge) -> Result<(), StorageError> {
        upsert(&self.surges, surge, |s| s.id == surge.id)
    }

    fn record_surge(&self, surge: &Surge, alert: &Alert, event: &Event) -> Result<(), StorageError> {
        // All three guards are held before anything is mutated
        let mut surges = write(&self.surges)?;
        let mut alerts = write(&self.alerts)?;
        let mut events = write(&self.events)?;
        upsert_into(&mut *surges, surge, |s| s.id == surge.id);
        upsert_into(&mut *alerts, alert, |a| a.id == alert.id);
        upsert_into(&mut *events, event, |e| e.id == event.id);
        Ok(())
    }

    fn save_action_plan(&self, plan: &ActionPlan) -> Result<(), StorageError> {
        upsert(&self.plans, plan, |p| p.id == plan.id)
    }

    fn latest_plan_for_surge(&self, surge_id: Uuid) -> Result<Option<ActionPlan>, StorageError> {
        let plans = self
            .plans
            .read()
            .map_err(|e| StorageError::Database(e.to_string()))?;
        // Later insertions win ties on generated_at
        Ok(plans
            .iter()
            .filter(|p| p.surge_id == surge_id)
            .fold(None::<&ActionPlan>, |best, p| match best {
                Some(b) if b.generated_at > p.generated_at => Some(b),
                _ => Some(p),
            })
            .cloned())
    }

    fn list_weather(&self) -> Result<Vec<WeatherObservation>, StorageError> {
        let mut weather = read_all(&self.weather)?;
        weather.sort_by_key(|w| w.observed_at);
        Ok(weather)
    }

    fn save_weather(&self, observation: &WeatherObservation) -> Result<(), StorageError> {
        upsert(&self.weather, observation, |w| w.id == observation.id)
    }

    fn list_container_moves(&self) -> Result<Vec<ContainerMove>, StorageError> {
        let mut moves = read_all(&self.moves)?;
        moves.sort_by_key(|m| m.ts);
        Ok(moves)
    }

    fn save_container_move(&self, mv: &ContainerMove) -> Result<(), StorageError> {
        upsert(&self.moves, mv, |m| m.id == mv.id)
    }

    fn list_utilization_samples(&self) -> Result<Vec<UtilizationSample>, StorageError> {
        let mut samples = read_all(&self.utilization)?;
        samples.sort_by_key(|s| s.time);
        Ok(samples)
    }

    fn save_utilization_sample(&self, sample: &UtilizationSample) -> Result<(), StorageError> {
        upsert(&self.utilization, sample, |s| s.id == sample.id)
    }

    fn replace_knowledge(&self, chunks: Vec<KnowledgeChunk>) -> Result<(), StorageError> {
        self.knowledge.store(Arc::new(chunks));
        Ok(())
    }

    fn knowledge_chunks(&self) -> Result<Vec<KnowledgeChunk>, StorageError> {
        Ok(self.knowledge.load().as_ref().clone())
    }

    fn nearest_chunks(&self, vector: &[f32], limit: usize) -> Result<Vec<ScoredChunk>, StorageError> {
        let generation = self.knowledge.load_full();
        Ok(rank_nearest(generation.iter(), vector, limit))
    }

    fn backend_name(&self) -> &'static str {
        "InMemory"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{ActionPlanStatus, ChunkKind};
    use chrono::{Duration, Utc};

    fn plan(surge_id: Uuid, offset_secs: i64, payload: &str) -> ActionPlan {
        ActionPlan {
            id: Uuid::new_v4(),
            surge_id,
            generated_at: Utc::now() + Duration::seconds(offset_secs),
            status: ActionPlanStatus::Ready,
            payload: payload.to_string(),
            source: "template".to_string(),
        }
    }

    #[test]
    fn test_yard_block_upsert_by_code() {
        let store = InMemoryStore::new();
        store.save_yard_block(&YardBlock::new("B", 100, 10)).unwrap();
        store.save_yard_block(&YardBlock::new("A", 100, 10)).unwrap();
        store.save_yard_block(&YardBlock::new("B", 100, 90)).unwrap();

        let blocks = store.list_yard_blocks().unwrap();
        assert_eq!(blocks.len(), 2);
        assert_eq!(blocks[0].code, "A");
        assert_eq!(store.get_yard_block("B").unwrap().unwrap().current_count, 90);
    }

    #[test]
    fn test_latest_plan_for_surge() {
        let store = InMemoryStore::new();
        let surge_id = Uuid::new_v4();
        store.save_action_plan(&plan(surge_id, 0, "{\"a\":1}")).unwrap();
        store.save_action_plan(&plan(surge_id, 10, "{\"a\":2}")).unwrap();
        store.save_action_plan(&plan(Uuid::new_v4(), 20, "{\"a\":3}")).unwrap();

        let latest = store.latest_plan_for_surge(surge_id).unwrap().unwrap();
        assert_eq!(latest.payload, "{\"a\":2}");
        assert!(store.latest_plan_for_surge(Uuid::new_v4()).unwrap().is_none());
    }

    #[test]
    fn test_replace_knowledge_swaps_generation() {
        let store = InMemoryStore::new();
        let chunk = |key: &str| KnowledgeChunk {
            id: Uuid::new_v4(),
            kind: ChunkKind::Berth,
            source_key: key.to_string(),
            title: String::new(),
            content: String::new(),
            embedding: Some(vec![0.0, 1.0]),
            updated_at: Utc::now(),
        };

        store.replace_knowledge(vec![chunk("B1"), chunk("B2")]).unwrap();
        let before = store.knowledge.load_full();
        store.replace_knowledge(vec![chunk("B3")]).unwrap();

        // A reader holding the old generation still sees all of it
        assert_eq!(before.len(), 2);
        let after = store.knowledge_chunks().unwrap();
        assert_eq!(after.len(), 1);
        assert_eq!(after[0].source_key, "B3");
        assert_eq!(store.nearest_chunks(&[0.0, 1.0], 5).unwrap().len(), 1);
    }

    #[test]
    fn test_record_surge_stores_all_three() {
        use crate::types::{AlertSeverity, EventSeverity, EventType, MetricsSnapshot, SurgeStatus};

        let store = InMemoryStore::new();
        let now = Utc::now();
        let surge = Surge {
            id: Uuid::new_v4(),
            detected_at: now,
            window_start: now,
            window_end: now + Duration::hours(6),
            reason: "High arrivals in next 6 hours".to_string(),
            metrics: MetricsSnapshot::default(),
            status: SurgeStatus::Open,
        };
        let alert = Alert {
            id: Uuid::new_v4(),
            surge_id: Some(surge.id),
            created_at: now,
            severity: AlertSeverity::High,
            message: "Surge detected".to_string(),
            acknowledged: false,
            suggestion: None,
        };
        let event = Event {
            id: Uuid::new_v4(),
            created_at: now,
            event_type: EventType::Surge,
            severity: EventSeverity::Warning,
            message: "Surge detected".to_string(),
            payload: serde_json::json!({}),
        };

        store.record_surge(&surge, &alert, &event).unwrap();
        store.record_surge(&surge, &alert, &event).unwrap();

        assert_eq!(store.list_surges().unwrap(), vec![surge]);
        assert_eq!(store.list_alerts().unwrap(), vec![alert]);
        assert_eq!(store.list_events().unwrap(), vec![event]);
    }
}
