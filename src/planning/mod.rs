//! Action plan generation
//!
//! - `generator`: prompt assembly, single chat call, persistence
//! - `parsing`: reply normalisation into the fixed plan key set
//! - `templates`: deterministic fallback plan

pub mod generator;
pub mod parsing;
pub mod templates;

pub use generator::PlanGenerator;
pub use parsing::{parse_plan_reply, strip_code_fence, PlanParseError};
pub use templates::{fallback_payload, FALLBACK_TITLE, LLM_SOURCE, TEMPLATE_SOURCE};
