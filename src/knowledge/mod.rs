//! Knowledge base: fact extraction, embedding, similarity retrieval
//!
//! ## Architecture
//!
//! ```text
//! RecordStore ──► PortRecords ──► extract_facts ──► EmbeddingBackend ──► replace_knowledge
//!                                                                            │
//! query ──► EmbeddingBackend ──► canonicalize ──► nearest_chunks ◄───────────┘
//! ```
//!
//! `GroundingFacts` renders the same record view as a plain-text summary for
//! plan prompts.

pub mod builder;
pub mod facts;
pub mod grounding;
pub mod retriever;
pub mod vector;

pub use builder::KnowledgeBaseBuilder;
pub use facts::{extract_facts, FactStatement, PortRecords};
pub use grounding::GroundingFacts;
pub use retriever::Retriever;
