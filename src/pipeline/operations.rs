//! Operator-facing operations around the pipeline
//!
//! Vessel upserts, alert acknowledgement, yard moves, utilisation history,
//! plan lookup and event summaries.
//! Invalid input is returned as an [`OperationError`] and never absorbed.

use chrono::{DateTime, Duration, Utc};
use serde::Serialize;
use tracing::{debug, info, warn};
use uuid::Uuid;

use super::SurgePipeline;
use crate::config::defaults::{EVENT_SUMMARY_LIMIT, UTILIZATION_HISTORY_HOURS};
use crate::detection::average_utilization;
use crate::llm::ChatMessage;
use crate::storage::StorageError;
use crate::types::{
    ActionPlan, Alert, ContainerMove, Event, Surge, UtilizationSample, Vessel, VesselUpsert,
    YardBlockStatus,
};

#[derive(Debug, thiserror::Error)]
pub enum OperationError {
    #[error("vessel name must not be blank")]
    BlankVesselName,
    #[error("TEU must be positive, got {0}")]
    InvalidQuantity(i64),
    #[error("yard block not found: {0}")]
    UnknownBlock(String),
    #[error("alert not found: {0}")]
    AlertNotFound(Uuid),
    #[error("surge not found: {0}")]
    SurgeNotFound(Uuid),
    #[error(transparent)]
    Storage(#[from] StorageError),
}

/// Result of a vessel upsert: the stored vessel and the surge, if the
/// evaluation that followed detected one
#[derive(Debug, Clone, Serialize)]
pub struct VesselUpdate {
    pub vessel: Vessel,
    pub surge: Option<Surge>,
}

fn event_line(e: &Event) -> String {
    format!("[{}] {}: {}", e.severity, e.event_type, e.message)
}

impl SurgePipeline {
    /// Insert or update a vessel, then run surge detection.
    ///
    /// With `vessel_id` set only that id is matched; otherwise a non-blank
    /// IMO is matched, otherwise the name. No match creates a vessel with a
    /// fresh id. An unparseable ETA or status is stored as none.
    pub async fn upsert_vessel(&self, request: &VesselUpsert) -> Result<VesselUpdate, OperationError> {
        if request.name.trim().is_empty() {
            return Err(OperationError::BlankVesselName);
        }

        let existing = match (request.vessel_id, request.imo()) {
            (Some(id), _) => self.store.get_vessel(id)?,
            (None, Some(imo)) => self.store.find_vessel_by_imo(imo)?,
            (None, None) => self.store.find_vessel_by_name(&request.name)?,
        };
        let created = existing.is_none();
        let mut vessel = existing.unwrap_or_else(|| Vessel {
            id: Uuid::new_v4(),
            name: String::new(),
            imo: None,
            expected_teu: None,
            eta: None,
            status: None,
        });
        request.apply_to(&mut vessel);
        self.store.save_vessel(&vessel)?;

        info!(
            vessel_id = %vessel.id,
            name = %vessel.name,
            created,
            has_eta = vessel.eta.is_some(),
            "Vessel upserted"
        );

        let surge = self.evaluate_surge(Utc::now()).await?;
        Ok(VesselUpdate { vessel, surge })
    }

    /// Flip an alert to acknowledged. Acknowledging twice is a no-op.
    pub fn acknowledge_alert(&self, id: Uuid) -> Result<Alert, OperationError> {
        let mut alert = self
            .store
            .get_alert(id)?
            .ok_or(OperationError::AlertNotFound(id))?;

        if alert.acknowledge() {
            self.store.save_alert(&alert)?;
            info!(alert_id = %id, "Alert acknowledged");
        } else {
            debug!(alert_id = %id, "Alert already acknowledged");
        }
        Ok(alert)
    }

    /// Alerts newest first, optionally only those created after `since`
    pub fn list_alerts(&self, since: Option<DateTime<Utc>>) -> Result<Vec<Alert>, StorageError> {
        let mut alerts: Vec<Alert> = self
            .store
            .list_alerts()?
            .into_iter()
            .filter(|a| since.map_or(true, |s| a.created_at > s))
            .collect();
        alerts.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(alerts)
    }

    /// Move `teu` containers between yard blocks and record the move.
    ///
    /// The source count saturates at zero; both block statuses are
    /// recomputed from their new utilisation.
    pub fn move_containers(&self, from: &str, to: &str, teu: i64) -> Result<ContainerMove, OperationError> {
        let qty = u32::try_from(teu)
            .ok()
            .filter(|q| *q > 0)
            .ok_or(OperationError::InvalidQuantity(teu))?;

        let mut from_block = self
            .store
            .get_yard_block(from)?
            .ok_or_else(|| OperationError::UnknownBlock(from.to_string()))?;
        let mut to_block = self
            .store
            .get_yard_block(to)?
            .ok_or_else(|| OperationError::UnknownBlock(to.to_string()))?;

        from_block.current_count = from_block.current_count.saturating_sub(qty);
        from_block.refresh_status();
        self.store.save_yard_block(&from_block)?;

        // Self-move: both adjustments land on the same block
        if to_block.code == from_block.code {
            to_block = from_block;
        }
        to_block.current_count = to_block.current_count.saturating_add(qty);
        to_block.refresh_status();
        self.store.save_yard_block(&to_block)?;

        let mv = ContainerMove {
            id: Uuid::new_v4(),
            from_block: from.to_string(),
            to_block: to.to_string(),
            teu: qty,
            ts: Utc::now(),
        };
        self.store.save_container_move(&mv)?;

        let blocks = self.store.list_yard_blocks()?;
        let sample = UtilizationSample {
            id: Uuid::new_v4(),
            time: mv.ts,
            utilization: average_utilization(&blocks),
            threshold: YardBlockStatus::CRITICAL_UTIL,
        };
        self.store.save_utilization_sample(&sample)?;

        info!(from, to, teu = qty, overall_util = sample.utilization, "Containers moved");
        Ok(mv)
    }

    /// Utilisation samples from the trailing window before `now`, oldest
    /// first. An empty window returns the whole history.
    pub fn utilization_history(&self, now: DateTime<Utc>) -> Result<Vec<UtilizationSample>, StorageError> {
        let samples = self.store.list_utilization_samples()?;
        let since = now - Duration::hours(UTILIZATION_HISTORY_HOURS);
        let recent: Vec<UtilizationSample> = samples.iter().filter(|s| s.time > since).cloned().collect();
        if recent.is_empty() {
            return Ok(samples);
        }
        Ok(recent)
    }

    /// Most recently generated plan for a surge
    pub fn latest_plan_for_surge(&self, surge_id: Uuid) -> Result<Option<ActionPlan>, StorageError> {
        self.store.latest_plan_for_surge(surge_id)
    }

    /// Generate a fresh plan for a stored surge
    pub async fn regenerate_plan(&self, surge_id: Uuid) -> Result<ActionPlan, OperationError> {
        let surge = self
            .store
            .get_surge(surge_id)?
            .ok_or(OperationError::SurgeNotFound(surge_id))?;
        Ok(self.planner.generate_plan(&surge).await)
    }

    /// Summary of the latest events.
    ///
    /// Lines are `[severity] type: message`, newest first. With a chat
    /// backend the lines are condensed by the model; any failure returns
    /// the lines themselves.
    pub async fn summarize_recent_events(&self) -> Result<String, StorageError> {
        let events = self.store.list_events()?;
        let lines: Vec<String> = events
            .iter()
            .rev()
            .take(EVENT_SUMMARY_LIMIT)
            .map(event_line)
            .collect();
        let concatenated = lines.join("\n");

        let Some(chat) = &self.chat else {
            return Ok(concatenated);
        };
        if lines.is_empty() {
            return Ok(concatenated);
        }

        let prompt = format!("Summarize the following port events concisely:\n{concatenated}");
        match chat.chat_complete(&[ChatMessage::user(prompt)]).await {
            Ok(summary) if !summary.trim().is_empty() => Ok(summary.trim().to_string()),
            Ok(_) => Ok(concatenated),
            Err(e) => {
                warn!(backend = chat.backend_name(), error = %e, "Event summary failed, returning raw events");
                Ok(concatenated)
            }
        }
    }
}
