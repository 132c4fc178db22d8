//! Knowledge base chunk types

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// Entity kind a chunk was extracted from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChunkKind {
    Vessel,
    YardBlock,
    Berth,
    Alert,
    Weather,
    Kpi,
}

impl ChunkKind {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Vessel => "vessel",
            Self::YardBlock => "yard_block",
            Self::Berth => "berth",
            Self::Alert => "alert",
            Self::Weather => "weather",
            Self::Kpi => "kpi",
        }
    }
}

impl fmt::Display for ChunkKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A short factual statement about one tracked entity.
///
/// `(kind, source_key)` is the natural key of the originating entity and is
/// stable across rebuilds. When present, `embedding` has exactly the
/// configured dimension.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct KnowledgeChunk {
    pub id: Uuid,
    pub kind: ChunkKind,
    pub source_key: String,
    pub title: String,
    pub content: String,
    #[serde(default)]
    pub embedding: Option<Vec<f32>>,
    pub updated_at: DateTime<Utc>,
}

impl KnowledgeChunk {
    pub fn natural_key(&self) -> (ChunkKind, &str) {
        (self.kind, self.source_key.as_str())
    }
}

/// A retrieved chunk with its distance to the query vector
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScoredChunk {
    pub chunk: KnowledgeChunk,
    pub distance: f32,
}
