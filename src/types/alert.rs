//! Operator alerts and yard move suggestions

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum AlertSeverity {
    Low,
    Medium,
    High,
    Critical,
}

impl fmt::Display for AlertSeverity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Low => "LOW",
            Self::Medium => "MEDIUM",
            Self::High => "HIGH",
            Self::Critical => "CRITICAL",
        };
        f.write_str(s)
    }
}

/// Concrete remediation attached to an alert
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MoveSuggestion {
    pub action: String,
    pub from_location: String,
    pub to_location: String,
    /// TEU to relocate, never negative
    pub quantity: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Alert {
    pub id: Uuid,
    /// Alerts may exist without a surge
    #[serde(default)]
    pub surge_id: Option<Uuid>,
    pub created_at: DateTime<Utc>,
    pub severity: AlertSeverity,
    pub message: String,
    /// One-way flag: false -> true only
    #[serde(default)]
    pub acknowledged: bool,
    #[serde(default)]
    pub suggestion: Option<MoveSuggestion>,
}

impl Alert {
    /// Mark as acknowledged. Returns false if it already was.
    pub fn acknowledge(&mut self) -> bool {
        if self.acknowledged {
            return false;
        }
        self.acknowledged = true;
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_acknowledge_is_one_way() {
        let mut alert = Alert {
            id: Uuid::new_v4(),
            surge_id: None,
            created_at: Utc::now(),
            severity: AlertSeverity::Low,
            message: "test".to_string(),
            acknowledged: false,
            suggestion: None,
        };
        assert!(alert.acknowledge());
        assert!(!alert.acknowledge());
        assert!(alert.acknowledged);
    }

    #[test]
    fn test_severity_serializes_uppercase() {
        let json = serde_json::to_string(&AlertSeverity::High).unwrap();
        assert_eq!(json, "\"HIGH\"");
    }
}
