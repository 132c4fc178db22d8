//! System-wide default constants.
//!
//! Grouped by subsystem for easy discovery.

// ============================================================================
// Surge Rules
// ============================================================================

/// Arrivals in the next 6h must exceed `baseline * factor` to fire.
pub const ARRIVALS_FACTOR: f64 = 1.5;

/// Projected TEU in the next 12h must exceed `baseline * factor` to fire.
pub const PROJECTED_TEU_FACTOR: f64 = 1.4;

/// Average yard utilisation (%) above which yard pressure is considered high.
pub const YARD_UTIL_THRESHOLD: f64 = 88.0;

/// Minimum Waiting/Berthing vessels required alongside high yard utilisation.
pub const MIN_WAITING_VESSELS: u64 = 2;

/// Utilisation (%) the move suggestion aims to bring the fullest block down to.
pub const SUGGESTION_TARGET_UTIL: f64 = 80.0;

// ============================================================================
// Metrics Windows
// ============================================================================

/// Short arrival window (hours), forward and trailing.
pub const ARRIVALS_WINDOW_HOURS: i64 = 6;

/// TEU projection window (hours), forward and trailing.
pub const TEU_WINDOW_HOURS: i64 = 12;

// ============================================================================
// Generative / Embedding Backend
// ============================================================================

pub const LLM_API_VERSION: &str = "2024-06-01";

pub const LLM_CHAT_DEPLOYMENT: &str = "gpt-4o-mini";

pub const LLM_EMBEDDINGS_DEPLOYMENT: &str = "text-embedding-3-large";

/// HTTP timeout for a single backend call (seconds). No retry.
pub const LLM_HTTP_TIMEOUT_SECS: u64 = 30;

pub const LLM_TEMPERATURE: f64 = 0.1;

pub const LLM_MAX_TOKENS: u32 = 512;

// ============================================================================
// Knowledge Base
// ============================================================================

/// Stored embedding dimension (D). Vectors are truncated or zero-padded.
pub const EMBEDDING_DIM: usize = 1536;

/// Knowledge chunks retrieved as context for plan prompts.
pub const PLAN_CONTEXT_CHUNKS: usize = 5;

// ============================================================================
// Storage
// ============================================================================

pub const STORAGE_PATH: &str = "./data/surgeops.db";

// ============================================================================
// Event Summary
// ============================================================================

/// Newest events included in an event summary.
pub const EVENT_SUMMARY_LIMIT: usize = 10;

// ============================================================================
// Utilisation History
// ============================================================================

/// Trailing window returned by the utilisation history query. An empty
/// window falls back to the full history.
pub const UTILIZATION_HISTORY_HOURS: i64 = 36;
