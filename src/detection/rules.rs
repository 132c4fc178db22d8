//! Surge Rule Evaluator - priority-ordered guard chain
//!
//! Rules are checked in fixed order and the first one that fires wins, so a
//! detected surge always carries exactly one reason. Evaluation is stateless:
//! every call decides from the snapshot it is given.

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::config::SurgeThresholds;
use crate::types::MetricsSnapshot;

/// Rule that can trigger a surge, in priority order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SurgeTrigger {
    /// `arrivalsNext6h > baseline6h * arrivals_factor`
    HighArrivals,
    /// `projectedTeuNext12h > baselineTeu12h * projected_teu_factor`
    HighProjectedTeu,
    /// `avgYardUtil > yard_util_threshold && waitingVessels >= min_waiting_vessels`
    YardPressure,
}

/// The guard chain, highest priority first
pub const RULE_CHAIN: [SurgeTrigger; 3] = [
    SurgeTrigger::HighArrivals,
    SurgeTrigger::HighProjectedTeu,
    SurgeTrigger::YardPressure,
];

impl SurgeTrigger {
    pub const fn reason(self) -> &'static str {
        match self {
            Self::HighArrivals => "High arrivals in next 6 hours",
            Self::HighProjectedTeu => "High projected TEU in next 12 hours",
            Self::YardPressure => "High yard utilisation and waiting vessels",
        }
    }

    pub fn fires(self, m: &MetricsSnapshot, t: &SurgeThresholds) -> bool {
        match self {
            Self::HighArrivals => m.arrivals_next_6h as f64 > m.baseline_6h as f64 * t.arrivals_factor,
            Self::HighProjectedTeu => {
                m.projected_teu_next_12h as f64 > m.baseline_teu_12h as f64 * t.projected_teu_factor
            }
            Self::YardPressure => {
                m.avg_yard_util > t.yard_util_threshold && m.waiting_vessels >= t.min_waiting_vessels
            }
        }
    }
}

/// Result of one evaluation
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Evaluation {
    NoSurge,
    Surge {
        trigger: SurgeTrigger,
        snapshot: MetricsSnapshot,
    },
}

impl Evaluation {
    pub const fn is_surge(&self) -> bool {
        matches!(self, Self::Surge { .. })
    }

    pub const fn reason(&self) -> Option<&'static str> {
        match self {
            Self::NoSurge => None,
            Self::Surge { trigger, .. } => Some(trigger.reason()),
        }
    }
}

/// Applies [`SurgeThresholds`] to metric snapshots
#[derive(Debug, Clone, Copy, Default)]
pub struct SurgeRuleEvaluator {
    thresholds: SurgeThresholds,
}

impl SurgeRuleEvaluator {
    pub const fn new(thresholds: SurgeThresholds) -> Self {
        Self { thresholds }
    }

    pub const fn thresholds(&self) -> &SurgeThresholds {
        &self.thresholds
    }

    pub fn evaluate(&self, snapshot: &MetricsSnapshot) -> Evaluation {
        let fired = RULE_CHAIN
            .iter()
            .copied()
            .find(|rule| rule.fires(snapshot, &self.thresholds));

        match fired {
            Some(trigger) => {
                debug!(?trigger, ?snapshot, "Surge rule fired");
                Evaluation::Surge {
                    trigger,
                    snapshot: *snapshot,
                }
            }
            None => Evaluation::NoSurge,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn quiet() -> MetricsSnapshot {
        MetricsSnapshot {
            arrivals_next_6h: 1,
            baseline_6h: 1,
            projected_teu_next_12h: 100,
            baseline_teu_12h: 100,
            avg_yard_util: 50.0,
            waiting_vessels: 0,
        }
    }

    #[test]
    fn test_quiet_port_no_surge() {
        let eval = SurgeRuleEvaluator::default().evaluate(&quiet());
        assert_eq!(eval, Evaluation::NoSurge);
        assert_eq!(eval.reason(), None);
    }

    #[test]
    fn test_floored_baseline_two_arrivals_surge() {
        // baseline6h of 0 is floored to 1 by the metrics window; 2 > 1 * 1.5
        let snapshot = MetricsSnapshot {
            arrivals_next_6h: 2,
            baseline_6h: 1,
            ..quiet()
        };
        let eval = SurgeRuleEvaluator::default().evaluate(&snapshot);
        assert_eq!(eval.reason(), Some("High arrivals in next 6 hours"));
    }

    #[test]
    fn test_boundary_is_strict() {
        // 3 > 2 * 1.5 is false
        let snapshot = MetricsSnapshot {
            arrivals_next_6h: 3,
            baseline_6h: 2,
            ..quiet()
        };
        assert!(!SurgeRuleEvaluator::default().evaluate(&snapshot).is_surge());

        // 140 > 100 * 1.4 is false (factor multiplication lands on the boundary)
        let snapshot = MetricsSnapshot {
            projected_teu_next_12h: 140,
            baseline_teu_12h: 100,
            ..quiet()
        };
        assert!(!SurgeRuleEvaluator::default().evaluate(&snapshot).is_surge());
    }

    #[test]
    fn test_projected_teu_rule() {
        let snapshot = MetricsSnapshot {
            projected_teu_next_12h: 141,
            baseline_teu_12h: 100,
            ..quiet()
        };
        let eval = SurgeRuleEvaluator::default().evaluate(&snapshot);
        assert_eq!(eval.reason(), Some("High projected TEU in next 12 hours"));
    }

    #[test]
    fn test_yard_rule_needs_both_conditions() {
        let evaluator = SurgeRuleEvaluator::default();

        let util_only = MetricsSnapshot {
            avg_yard_util: 92.0,
            waiting_vessels: 1,
            ..quiet()
        };
        assert!(!evaluator.evaluate(&util_only).is_surge());

        let waiting_only = MetricsSnapshot {
            avg_yard_util: 88.0,
            waiting_vessels: 5,
            ..quiet()
        };
        assert!(!evaluator.evaluate(&waiting_only).is_surge());

        let both = MetricsSnapshot {
            avg_yard_util: 88.1,
            waiting_vessels: 2,
            ..quiet()
        };
        assert_eq!(
            evaluator.evaluate(&both).reason(),
            Some("High yard utilisation and waiting vessels")
        );
    }

    #[test]
    fn test_priority_first_match_wins() {
        // Satisfies rule 1 and rule 3 simultaneously
        let snapshot = MetricsSnapshot {
            arrivals_next_6h: 10,
            baseline_6h: 1,
            avg_yard_util: 97.0,
            waiting_vessels: 6,
            ..quiet()
        };
        match SurgeRuleEvaluator::default().evaluate(&snapshot) {
            Evaluation::Surge { trigger, snapshot: s } => {
                assert_eq!(trigger, SurgeTrigger::HighArrivals);
                assert_eq!(s, snapshot);
            }
            Evaluation::NoSurge => panic!("expected surge"),
        }
    }

    #[test]
    fn test_custom_thresholds() {
        let thresholds = SurgeThresholds {
            arrivals_factor: 5.0,
            ..SurgeThresholds::default()
        };
        let snapshot = MetricsSnapshot {
            arrivals_next_6h: 4,
            baseline_6h: 1,
            ..quiet()
        };
        assert!(!SurgeRuleEvaluator::new(thresholds).evaluate(&snapshot).is_surge());
    }

    #[test]
    fn test_non_firing_region_sweep() {
        let evaluator = SurgeRuleEvaluator::default();
        for baseline in 1..6u64 {
            for arrivals in 0..=((baseline as f64 * 1.5) as u64) {
                for waiting in 0..4u64 {
                    let snapshot = MetricsSnapshot {
                        arrivals_next_6h: arrivals,
                        baseline_6h: baseline,
                        projected_teu_next_12h: 130 * baseline,
                        baseline_teu_12h: 100 * baseline,
                        avg_yard_util: if waiting >= 2 { 88.0 } else { 99.0 },
                        waiting_vessels: waiting,
                    };
                    assert!(
                        !evaluator.evaluate(&snapshot).is_surge(),
                        "unexpected surge for {:?}",
                        snapshot
                    );
                }
            }
        }
    }
}
