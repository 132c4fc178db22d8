//! Metrics Window - time-windowed port aggregates
//!
//! Pure computation over the current vessel and yard block lists. Forward
//! windows start at `now` (inclusive); trailing windows end at `now`
//! (exclusive). Baselines are floored to 1 so a quiet history cannot blow up
//! the ratio comparisons into "always surge".

use chrono::{DateTime, Duration, Utc};

use crate::config::defaults::{ARRIVALS_WINDOW_HOURS, TEU_WINDOW_HOURS};
use crate::types::{MetricsSnapshot, Vessel, YardBlock};

/// Computes a [`MetricsSnapshot`] for a point in time
#[derive(Debug, Clone, Copy)]
pub struct MetricsWindow {
    pub now: DateTime<Utc>,
}

impl MetricsWindow {
    pub const fn new(now: DateTime<Utc>) -> Self {
        Self { now }
    }

    /// Aggregate the given records. Never fails: an empty fleet yields zero
    /// forward metrics and floored baselines.
    pub fn compute(&self, vessels: &[Vessel], blocks: &[YardBlock]) -> MetricsSnapshot {
        let now = self.now;
        let arrivals = Duration::hours(ARRIVALS_WINDOW_HOURS);
        let teu_window = Duration::hours(TEU_WINDOW_HOURS);

        let arrivals_next_6h = count_in(vessels, now, now + arrivals);
        let baseline_6h = count_in(vessels, now - arrivals, now).max(1);

        let projected_teu_next_12h = teu_in(vessels, now, now + teu_window);
        let baseline_teu_12h = teu_in(vessels, now - teu_window, now).max(1);

        MetricsSnapshot {
            arrivals_next_6h,
            baseline_6h,
            projected_teu_next_12h,
            baseline_teu_12h,
            avg_yard_util: average_utilization(blocks),
            waiting_vessels: vessels.iter().filter(|v| v.is_waiting()).count() as u64,
        }
    }
}

fn count_in(vessels: &[Vessel], start: DateTime<Utc>, end: DateTime<Utc>) -> u64 {
    vessels.iter().filter(|v| v.eta_in(start, end)).count() as u64
}

fn teu_in(vessels: &[Vessel], start: DateTime<Utc>, end: DateTime<Utc>) -> u64 {
    vessels
        .iter()
        .filter(|v| v.eta_in(start, end))
        .map(Vessel::teu)
        .sum()
}

/// Mean of per-block utilisation; zero-capacity blocks contribute 0%
pub fn average_utilization(blocks: &[YardBlock]) -> f64 {
    if blocks.is_empty() {
        return 0.0;
    }
    blocks.iter().map(YardBlock::utilization).sum::<f64>() / blocks.len() as f64
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::VesselStatus;

    fn vessel_at(now: DateTime<Utc>, offset_hours: i64, teu: u32) -> Vessel {
        Vessel::new(format!("V{offset_hours}"), now + Duration::hours(offset_hours), teu)
    }

    #[test]
    fn test_empty_inputs_floor_baselines() {
        let snapshot = MetricsWindow::new(Utc::now()).compute(&[], &[]);
        assert_eq!(snapshot.arrivals_next_6h, 0);
        assert_eq!(snapshot.baseline_6h, 1);
        assert_eq!(snapshot.projected_teu_next_12h, 0);
        assert_eq!(snapshot.baseline_teu_12h, 1);
        assert_eq!(snapshot.avg_yard_util, 0.0);
        assert_eq!(snapshot.waiting_vessels, 0);
    }

    #[test]
    fn test_windows_split_forward_and_trailing() {
        let now = Utc::now();
        let vessels = vec![
            vessel_at(now, -10, 500), // trailing 12h only
            vessel_at(now, -3, 200),  // trailing 6h and 12h
            vessel_at(now, 0, 300),   // forward 6h and 12h (inclusive start)
            vessel_at(now, 5, 400),   // forward 6h and 12h
            vessel_at(now, 6, 1000),  // forward 12h only (6h end exclusive)
            vessel_at(now, 13, 9000), // outside every window
        ];

        let s = MetricsWindow::new(now).compute(&vessels, &[]);
        assert_eq!(s.arrivals_next_6h, 2);
        assert_eq!(s.baseline_6h, 1);
        assert_eq!(s.projected_teu_next_12h, 1700);
        assert_eq!(s.baseline_teu_12h, 700);
    }

    #[test]
    fn test_vessel_without_eta_is_ignored() {
        let now = Utc::now();
        let mut v = vessel_at(now, 1, 100);
        v.eta = None;
        let s = MetricsWindow::new(now).compute(&[v], &[]);
        assert_eq!(s.arrivals_next_6h, 0);
        assert_eq!(s.projected_teu_next_12h, 0);
        // Status still counts toward waiting vessels
        assert_eq!(s.waiting_vessels, 1);
    }

    #[test]
    fn test_waiting_counts_waiting_and_berthing() {
        let now = Utc::now();
        let statuses = [
            Some(VesselStatus::Waiting),
            Some(VesselStatus::Berthing),
            Some(VesselStatus::Loading),
            Some(VesselStatus::Departed),
            None,
        ];
        let vessels: Vec<Vessel> = statuses
            .iter()
            .map(|s| {
                let mut v = vessel_at(now, 48, 0);
                v.status = *s;
                v
            })
            .collect();
        let s = MetricsWindow::new(now).compute(&vessels, &[]);
        assert_eq!(s.waiting_vessels, 2);
    }

    #[test]
    fn test_average_utilization_counts_zero_capacity_as_zero() {
        let blocks = vec![YardBlock::new("A", 100, 90), YardBlock::new("Z", 0, 0)];
        assert_eq!(average_utilization(&blocks), 45.0);
    }
}
