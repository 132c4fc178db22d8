//! Action plan types

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ActionPlanStatus {
    Ready,
    Accepted,
    Superseded,
}

/// Structured plan body with a fixed key set.
///
/// Serialized keys: `id`, `title`, `severity`, `estimatedTime`, `impact`,
/// `description`, `steps`, `resourcesRequired`, `beforeData`, `afterData`.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlanPayload {
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub severity: String,
    #[serde(default)]
    pub estimated_time: String,
    #[serde(default)]
    pub impact: String,
    #[serde(default)]
    pub description: String,
    /// Ordered remediation steps
    #[serde(default)]
    pub steps: Vec<String>,
    #[serde(default)]
    pub resources_required: Vec<String>,
    #[serde(default = "empty_object")]
    pub before_data: serde_json::Value,
    #[serde(default = "empty_object")]
    pub after_data: serde_json::Value,
}

fn empty_object() -> serde_json::Value {
    serde_json::Value::Object(serde_json::Map::new())
}

/// A generated plan tied to one surge.
///
/// `payload` is the compact JSON encoding of a [`PlanPayload`] and is stored
/// and returned byte-for-byte.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActionPlan {
    pub id: Uuid,
    pub surge_id: Uuid,
    pub generated_at: DateTime<Utc>,
    pub status: ActionPlanStatus,
    pub payload: String,
    /// "llm" or "template"
    #[serde(default)]
    pub source: String,
}

impl ActionPlan {
    /// Decode the stored payload
    pub fn payload(&self) -> Result<PlanPayload, serde_json::Error> {
        serde_json::from_str(&self.payload)
    }
}
