//! Shared data structures for port surge operations
//!
//! This module defines the core types for the detection-and-response pipeline:
//! - Records: vessels, yard blocks, berths, weather, container moves
//! - Surge: frozen metrics snapshot + detection reason
//! - Alert: operator-facing warning with an optional move suggestion
//! - KnowledgeChunk: embedded fact statement for similarity retrieval
//! - ActionPlan: structured remediation plan tied to a surge

mod records;
mod surge;
mod alert;
mod knowledge;
mod plan;
mod kpi;

pub use records::*;
pub use surge::*;
pub use alert::*;
pub use knowledge::*;
pub use plan::*;
pub use kpi::*;
