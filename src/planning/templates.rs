//! Template-based plan generation
//!
//! Deterministic payload used whenever the generative backend is not
//! configured, fails, or returns something that does not normalise into a
//! plan. Plans built here are tagged `source: "template"`.

use uuid::Uuid;

use crate::types::PlanPayload;

/// Source tag for generated plans
pub const LLM_SOURCE: &str = "llm";
/// Source tag for fallback plans
pub const TEMPLATE_SOURCE: &str = "template";

pub const FALLBACK_TITLE: &str = "Default Action Plan";

/// The fallback payload for a surge
pub fn fallback_payload(surge_id: Uuid) -> PlanPayload {
    PlanPayload {
        id: surge_id.to_string(),
        title: FALLBACK_TITLE.to_string(),
        severity: "Medium".to_string(),
        estimated_time: "2h".to_string(),
        impact: "Medium".to_string(),
        description:
            "Balance yard utilisation by moving containers and adjusting berth assignments."
                .to_string(),
        steps: vec![
            "Identify overloaded blocks".to_string(),
            "Relocate containers".to_string(),
        ],
        resources_required: vec!["Trucks".to_string(), "Personnel".to_string()],
        before_data: serde_json::json!({}),
        after_data: serde_json::json!({}),
    }
}
