//! Surge detection types: metrics snapshot, surge record, timeline events

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// Time-windowed aggregates computed fresh for every evaluation.
///
/// Serialized field names match the snapshot JSON attached to surges and
/// surge events (`arrivalsNext6h`, `baseline6h`, ...).
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MetricsSnapshot {
    /// Vessels with ETA in `[now, now+6h)`
    pub arrivals_next_6h: u64,
    /// Vessels with ETA in `[now-6h, now)`, floored to 1
    pub baseline_6h: u64,
    /// Expected TEU of vessels with ETA in `[now, now+12h)`
    pub projected_teu_next_12h: u64,
    /// Expected TEU of vessels with ETA in `[now-12h, now)`, floored to 1
    pub baseline_teu_12h: u64,
    /// Mean block utilisation (0-100)
    pub avg_yard_util: f64,
    /// Vessels currently Waiting or Berthing
    pub waiting_vessels: u64,
}

impl MetricsSnapshot {
    pub fn to_json(&self) -> serde_json::Value {
        serde_json::to_value(self).unwrap_or_else(|_| serde_json::json!({}))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SurgeStatus {
    Open,
    Accepted,
    Closed,
}

/// A detected period of abnormal demand.
///
/// Created exactly once per detection; `metrics` is the frozen snapshot that
/// triggered it and is never recomputed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Surge {
    pub id: Uuid,
    pub detected_at: DateTime<Utc>,
    pub window_start: DateTime<Utc>,
    pub window_end: DateTime<Utc>,
    pub reason: String,
    pub status: SurgeStatus,
    pub metrics: MetricsSnapshot,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EventType {
    Surge,
    Weather,
    Info,
}

impl fmt::Display for EventType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Surge => "surge",
            Self::Weather => "weather",
            Self::Info => "info",
        };
        f.write_str(s)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EventSeverity {
    Info,
    Warning,
    Error,
}

impl fmt::Display for EventSeverity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Info => "info",
            Self::Warning => "warning",
            Self::Error => "error",
        };
        f.write_str(s)
    }
}

/// Timeline entry shown to operators
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Event {
    pub id: Uuid,
    pub created_at: DateTime<Utc>,
    pub event_type: EventType,
    pub severity: EventSeverity,
    pub message: String,
    #[serde(default)]
    pub payload: serde_json::Value,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_snapshot_json_keys() {
        let snapshot = MetricsSnapshot {
            arrivals_next_6h: 3,
            baseline_6h: 1,
            projected_teu_next_12h: 4200,
            baseline_teu_12h: 1,
            avg_yard_util: 72.5,
            waiting_vessels: 2,
        };
        let json = snapshot.to_json();
        assert_eq!(json["arrivalsNext6h"], 3);
        assert_eq!(json["baseline6h"], 1);
        assert_eq!(json["projectedTeuNext12h"], 4200);
        assert_eq!(json["baselineTeu12h"], 1);
        assert_eq!(json["avgYardUtil"], 72.5);
        assert_eq!(json["waitingVessels"], 2);
    }
}
