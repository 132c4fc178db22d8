//! Alert Synthesizer - surge alert, timeline event and yard move suggestion
//!
//! The suggestion relieves the fullest block into the emptiest one. Ties are
//! broken by first occurrence in the provided block order, so the result is
//! deterministic for a stable input ordering.

use uuid::Uuid;

use crate::config::defaults::SUGGESTION_TARGET_UTIL;
use crate::types::{
    Alert, AlertSeverity, Event, EventSeverity, EventType, MoveSuggestion, Surge, YardBlock,
};

/// Suggestion action label
pub const MOVE_ACTION: &str = "Move containers";

/// Alert + event pair raised for one surge
#[derive(Debug, Clone, PartialEq)]
pub struct SurgeNotice {
    pub alert: Alert,
    pub event: Event,
}

#[derive(Debug, Clone, Copy)]
pub struct AlertSynthesizer {
    /// Utilisation (%) the fullest block is relieved down to
    target_util: f64,
}

impl Default for AlertSynthesizer {
    fn default() -> Self {
        Self::new(SUGGESTION_TARGET_UTIL)
    }
}

impl AlertSynthesizer {
    pub const fn new(target_util: f64) -> Self {
        Self { target_util }
    }

    /// Compute the move suggestion, or `None` for an empty yard.
    ///
    /// `quantity = round((from.util - target) / 100 * from.capacity)`, floored at 0.
    pub fn suggest(&self, blocks: &[YardBlock]) -> Option<MoveSuggestion> {
        let (from, to) = extremes(blocks)?;

        let raw = ((from.utilization() - self.target_util) / 100.0 * f64::from(from.capacity)).round();
        let quantity = if raw.is_finite() && raw > 0.0 {
            raw.min(f64::from(u32::MAX)) as u32
        } else {
            0
        };

        Some(MoveSuggestion {
            action: MOVE_ACTION.to_string(),
            from_location: from.code.clone(),
            to_location: to.code.clone(),
            quantity,
        })
    }

    /// Build the HIGH alert and the warning event for a detected surge.
    ///
    /// Both carry the surge's detection timestamp.
    pub fn synthesize(&self, surge: &Surge, blocks: &[YardBlock]) -> SurgeNotice {
        let message = format!("Surge detected: {}", surge.reason);

        let alert = Alert {
            id: Uuid::new_v4(),
            surge_id: Some(surge.id),
            created_at: surge.detected_at,
            severity: AlertSeverity::High,
            message: message.clone(),
            acknowledged: false,
            suggestion: self.suggest(blocks),
        };

        let event = Event {
            id: Uuid::new_v4(),
            created_at: surge.detected_at,
            event_type: EventType::Surge,
            severity: EventSeverity::Warning,
            message,
            payload: surge.metrics.to_json(),
        };

        SurgeNotice { alert, event }
    }
}

/// (max-utilisation block, min-utilisation block), first occurrence wins ties
fn extremes(blocks: &[YardBlock]) -> Option<(&YardBlock, &YardBlock)> {
    let first = blocks.first()?;
    let mut max = first;
    let mut min = first;
    for block in &blocks[1..] {
        let util = block.utilization();
        if util > max.utilization() {
            max = block;
        }
        if util < min.utilization() {
            min = block;
        }
    }
    Some((max, min))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{MetricsSnapshot, SurgeStatus};
    use chrono::{Duration, Utc};

    fn surge() -> Surge {
        let now = Utc::now();
        Surge {
            id: Uuid::new_v4(),
            detected_at: now,
            window_start: now,
            window_end: now + Duration::hours(6),
            reason: "High arrivals in next 6 hours".to_string(),
            status: SurgeStatus::Open,
            metrics: MetricsSnapshot::default(),
        }
    }

    #[test]
    fn test_suggestion_from_fullest_to_emptiest() {
        let blocks = vec![YardBlock::new("A", 100, 95), YardBlock::new("B", 100, 10)];
        let s = AlertSynthesizer::default().suggest(&blocks).unwrap();
        assert_eq!(s.from_location, "A");
        assert_eq!(s.to_location, "B");
        assert_eq!(s.quantity, 15);
        assert_eq!(s.action, "Move containers");
    }

    #[test]
    fn test_quantity_floored_at_zero() {
        let blocks = vec![YardBlock::new("A", 100, 40), YardBlock::new("B", 100, 10)];
        let s = AlertSynthesizer::default().suggest(&blocks).unwrap();
        assert_eq!(s.quantity, 0);
    }

    #[test]
    fn test_quantity_rounds() {
        // (85.5 - 80) / 100 * 200 = 11
        let blocks = vec![YardBlock::new("A", 200, 171), YardBlock::new("B", 100, 0)];
        assert_eq!(AlertSynthesizer::default().suggest(&blocks).unwrap().quantity, 11);
    }

    #[test]
    fn test_ties_prefer_first_encountered() {
        let blocks = vec![
            YardBlock::new("A", 100, 90),
            YardBlock::new("B", 100, 20),
            YardBlock::new("C", 100, 90),
            YardBlock::new("D", 100, 20),
        ];
        let s = AlertSynthesizer::default().suggest(&blocks).unwrap();
        assert_eq!(s.from_location, "A");
        assert_eq!(s.to_location, "B");
    }

    #[test]
    fn test_single_block_moves_to_itself() {
        let blocks = vec![YardBlock::new("A", 100, 99)];
        let s = AlertSynthesizer::default().suggest(&blocks).unwrap();
        assert_eq!(s.from_location, "A");
        assert_eq!(s.to_location, "A");
    }

    #[test]
    fn test_empty_yard_plain_alert() {
        let notice = AlertSynthesizer::default().synthesize(&surge(), &[]);
        assert!(notice.alert.suggestion.is_none());
        assert_eq!(notice.alert.message, "Surge detected: High arrivals in next 6 hours");
    }

    #[test]
    fn test_alert_and_event_share_surge_timestamp() {
        let surge = surge();
        let blocks = vec![YardBlock::new("A", 100, 95)];
        let notice = AlertSynthesizer::default().synthesize(&surge, &blocks);

        assert_eq!(notice.alert.created_at, surge.detected_at);
        assert_eq!(notice.event.created_at, surge.detected_at);
        assert_eq!(notice.alert.surge_id, Some(surge.id));
        assert_eq!(notice.alert.severity, AlertSeverity::High);
        assert!(!notice.alert.acknowledged);
        assert_eq!(notice.event.event_type, EventType::Surge);
        assert_eq!(notice.event.severity, EventSeverity::Warning);
        assert_eq!(notice.event.payload["baseline6h"], 0);
    }
}
