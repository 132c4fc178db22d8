//! Current KPI snapshot (yard, vessels, alerts, throughput)

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use super::{Alert, ContainerMove, Vessel, YardBlock};
use crate::detection::average_utilization;

/// Trailing window used for the throughput KPI
pub const THROUGHPUT_WINDOW_HOURS: i64 = 24;

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct KpiSnapshot {
    /// Mean block utilisation, rounded to one decimal
    pub avg_yard_utilization: f64,
    pub waiting_vessels: u64,
    /// Alerts not yet acknowledged
    pub active_alerts: u64,
    pub teu_processed_24h: u64,
}

impl KpiSnapshot {
    pub fn compute(
        now: DateTime<Utc>,
        blocks: &[YardBlock],
        vessels: &[Vessel],
        alerts: &[Alert],
        moves: &[ContainerMove],
    ) -> Self {
        let avg = average_utilization(blocks);

        let since = now - Duration::hours(THROUGHPUT_WINDOW_HOURS);

        Self {
            avg_yard_utilization: (avg * 10.0).round() / 10.0,
            waiting_vessels: vessels.iter().filter(|v| v.is_waiting()).count() as u64,
            active_alerts: alerts.iter().filter(|a| !a.acknowledged).count() as u64,
            teu_processed_24h: moves
                .iter()
                .filter(|m| m.ts > since)
                .map(|m| u64::from(m.teu))
                .sum(),
        }
    }
}
