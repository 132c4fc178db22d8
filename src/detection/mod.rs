//! Surge detection: metrics window, rule chain, alert synthesis
//!
//! ## Architecture
//!
//! - `MetricsWindow`: forward/trailing aggregates over vessels and yard blocks
//! - `SurgeRuleEvaluator`: first-match-wins threshold rules
//! - `AlertSynthesizer`: HIGH alert + move suggestion + surge event

pub mod metrics;
pub mod rules;
pub mod alerts;

pub use metrics::{average_utilization, MetricsWindow};
pub use rules::{Evaluation, SurgeRuleEvaluator, SurgeTrigger, RULE_CHAIN};
pub use alerts::{AlertSynthesizer, SurgeNotice, MOVE_ACTION};
