//! Plan reply parsing and normalisation
//!
//! Replies are expected to be a single JSON object, optionally wrapped in a
//! markdown code fence. The object is normalised into the fixed
//! [`PlanPayload`] key set: text fields accept strings or numbers, list
//! entries that are objects collapse to their `title`/`description`/`action`
//! text, and `beforeData`/`afterData` default to `{}`. A plan must carry a
//! non-empty title and at least one step.

use regex::Regex;
use serde_json::{Map, Value};
use std::sync::OnceLock;
use uuid::Uuid;

use crate::types::PlanPayload;

static CODE_FENCE: OnceLock<Option<Regex>> = OnceLock::new();

fn code_fence() -> Option<&'static Regex> {
    CODE_FENCE
        .get_or_init(|| Regex::new(r"(?s)```[A-Za-z]*[ \t]*\r?\n?(.*?)```").ok())
        .as_ref()
}

#[derive(Debug, thiserror::Error)]
pub enum PlanParseError {
    #[error("reply is not valid JSON: {0}")]
    InvalidJson(#[from] serde_json::Error),
    #[error("reply is not a JSON object")]
    NotAnObject,
    #[error("plan has no title")]
    MissingTitle,
    #[error("plan has no steps")]
    MissingSteps,
}

/// Inner text of the first fenced block, or the trimmed reply
pub fn strip_code_fence(reply: &str) -> &str {
    code_fence()
        .and_then(|re| re.captures(reply))
        .and_then(|c| c.get(1))
        .map_or(reply, |m| m.as_str())
        .trim()
}

/// Parse and normalise a generative reply. A missing `id` becomes the surge id.
pub fn parse_plan_reply(reply: &str, surge_id: Uuid) -> Result<PlanPayload, PlanParseError> {
    let value: Value = serde_json::from_str(strip_code_fence(reply))?;
    let Value::Object(map) = value else {
        return Err(PlanParseError::NotAnObject);
    };

    let title = text(&map, &["title"]);
    if title.is_empty() {
        return Err(PlanParseError::MissingTitle);
    }
    let steps = list(&map, &["steps"]);
    if steps.is_empty() {
        return Err(PlanParseError::MissingSteps);
    }

    let id = text(&map, &["id"]);
    Ok(PlanPayload {
        id: if id.is_empty() { surge_id.to_string() } else { id },
        title,
        severity: text(&map, &["severity"]),
        estimated_time: text(&map, &["estimatedTime", "estimated_time"]),
        impact: text(&map, &["impact"]),
        description: text(&map, &["description"]),
        steps,
        resources_required: list(&map, &["resourcesRequired", "resources_required", "resources"]),
        before_data: data(&map, &["beforeData", "before_data"]),
        after_data: data(&map, &["afterData", "after_data"]),
    })
}

fn lookup<'a>(map: &'a Map<String, Value>, keys: &[&str]) -> Option<&'a Value> {
    keys.iter().find_map(|k| map.get(*k))
}

fn scalar_text(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.trim().to_string()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

fn text(map: &Map<String, Value>, keys: &[&str]) -> String {
    lookup(map, keys).and_then(scalar_text).unwrap_or_default()
}

fn item_text(value: &Value) -> String {
    match value {
        Value::Object(obj) => ["title", "description", "action", "name", "step"]
            .iter()
            .find_map(|k| obj.get(*k).and_then(scalar_text).filter(|s| !s.is_empty()))
            .unwrap_or_else(|| value.to_string()),
        Value::Null => String::new(),
        other => scalar_text(other).unwrap_or_else(|| other.to_string()),
    }
}

fn list(map: &Map<String, Value>, keys: &[&str]) -> Vec<String> {
    let items: Vec<String> = match lookup(map, keys) {
        Some(Value::Array(items)) => items.iter().map(item_text).collect(),
        Some(Value::Null) | None => Vec::new(),
        Some(single) => vec![item_text(single)],
    };
    items.into_iter().filter(|s| !s.is_empty()).collect()
}

fn data(map: &Map<String, Value>, keys: &[&str]) -> Value {
    match lookup(map, keys) {
        None | Some(Value::Null) => Value::Object(Map::new()),
        Some(v) => v.clone(),
    }
}
