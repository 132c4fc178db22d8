//! SurgeOps Configuration Module
//!
//! Rule thresholds, backend credentials and storage settings loaded from
//! TOML, with built-in defaults for everything.
//!
//! ## Loading Order
//!
//! 1. `SURGEOPS_CONFIG` environment variable (path to TOML file)
//! 2. `surgeops.toml` in the current working directory
//! 3. Built-in defaults
//!
//! A file that exists but fails to parse or validate is an error, never a
//! silent fallback.
//!
//! `AZURE_OPENAI_ENDPOINT` / `AZURE_OPENAI_API_KEY` override the `[llm]`
//! credentials after the file is read.
//!
//! ## Usage
//!
//! The loaded config is passed explicitly to the components that need it:
//!
//! ```ignore
//! let config = SurgeOpsConfig::load()?;
//! let evaluator = SurgeRuleEvaluator::new(config.surge);
//! ```

mod surge_config;
pub mod defaults;

pub use surge_config::*;
