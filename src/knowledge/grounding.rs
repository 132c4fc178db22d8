//! Grounding facts - compact textual summary of current port state
//!
//! Fed into the plan prompt so the generative backend reasons over actual
//! records rather than the surge metrics alone.

use chrono::{DateTime, Duration, Utc};

use super::facts::{format_instant, PortRecords};
use crate::types::{YardBlock, THROUGHPUT_WINDOW_HOURS};

const RECENT_ALERTS: usize = 3;
const UPCOMING_VESSELS: usize = 5;
const TOP_BLOCKS: usize = 3;

pub struct GroundingFacts;

impl GroundingFacts {
    /// Multi-line summary: alerts, upcoming vessels, fullest yard blocks,
    /// latest weather, berths, trailing 24h throughput.
    pub fn build(now: DateTime<Utc>, records: &PortRecords) -> String {
        let mut lines: Vec<String> = Vec::new();

        let active = records.alerts.iter().filter(|a| !a.acknowledged).count();
        lines.push(format!("Active alerts: {active}"));
        if !records.alerts.is_empty() {
            let mut alerts: Vec<_> = records.alerts.iter().collect();
            alerts.sort_by(|a, b| b.created_at.cmp(&a.created_at));
            lines.push("Recent alerts:".to_string());
            lines.extend(
                alerts
                    .into_iter()
                    .take(RECENT_ALERTS)
                    .map(|alert| format!("- {}: {}", alert.severity, alert.message)),
            );
        }

        let mut upcoming: Vec<_> = records
            .vessels
            .iter()
            .filter(|v| v.eta.is_some_and(|eta| eta > now))
            .collect();
        upcoming.sort_by_key(|v| v.eta);
        if !upcoming.is_empty() {
            lines.push("Upcoming/Waiting vessels:".to_string());
            for v in upcoming.into_iter().take(UPCOMING_VESSELS) {
                let status = v.status.map_or_else(|| "unknown".to_string(), |s| s.to_string());
                lines.push(format!(
                    "- {} (IMO {}) ETA {} carrying {} TEU status {}",
                    v.name,
                    v.imo.as_deref().unwrap_or("unknown"),
                    format_instant(v.eta),
                    v.teu(),
                    status
                ));
            }
        }

        let mut blocks: Vec<&YardBlock> = records.yard_blocks.iter().collect();
        blocks.sort_by(|a, b| b.utilization().total_cmp(&a.utilization()));
        lines.push("Top yard blocks by utilisation:".to_string());
        lines.extend(
            blocks
                .into_iter()
                .take(TOP_BLOCKS)
                .map(|b| format!("- {}: {:.1}% ({})", b.code, b.utilization(), b.status)),
        );

        if let Some(w) = &records.weather {
            lines.push(format!(
                "Latest weather ({}): {}, {:.1}°C, wind {:.1}m/s, humidity {:.1}% (impact {})",
                w.location, w.condition, w.temperature, w.wind_speed, w.humidity, w.operational_impact
            ));
        }

        if !records.berths.is_empty() {
            lines.push("Berth status:".to_string());
            lines.extend(records.berths.iter().map(|b| format!("- {}: {}", b.code, b.status)));
        }

        let since = now - Duration::hours(THROUGHPUT_WINDOW_HOURS);
        let teu: u64 = records
            .moves
            .iter()
            .filter(|m| m.ts > since)
            .map(|m| u64::from(m.teu))
            .sum();
        lines.push(format!("TEU processed in last 24h: {teu}"));

        let mut out = lines.join("\n");
        out.push('\n');
        out
    }
}
