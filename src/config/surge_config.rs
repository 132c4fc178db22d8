//! SurgeOps Configuration - rule thresholds and backend settings as TOML values
//!
//! Each struct implements `Default` with the documented defaults, so a missing
//! file or a partial file behaves exactly like the built-in policy.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::{info, warn};

use super::defaults;

/// Environment variable naming an explicit config file
pub const CONFIG_ENV_VAR: &str = "SURGEOPS_CONFIG";

/// Config file looked up in the working directory
pub const LOCAL_CONFIG_FILE: &str = "surgeops.toml";

// ============================================================================
// Top-Level Config
// ============================================================================

/// Root configuration for a SurgeOps deployment.
///
/// Load with `SurgeOpsConfig::load()` which searches:
/// 1. `$SURGEOPS_CONFIG` env var
/// 2. `./surgeops.toml`
/// 3. Built-in defaults
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SurgeOpsConfig {
    /// Surge rule thresholds
    #[serde(default)]
    pub surge: SurgeThresholds,

    /// Generative + embedding backend
    #[serde(default)]
    pub llm: LlmConfig,

    /// Knowledge base and retrieval
    #[serde(default)]
    pub knowledge: KnowledgeConfig,

    /// Record store location
    #[serde(default)]
    pub storage: StorageConfig,
}

impl SurgeOpsConfig {
    /// Load configuration using the standard search order:
    /// 1. `$SURGEOPS_CONFIG` environment variable
    /// 2. `./surgeops.toml` in the current working directory
    /// 3. Built-in defaults
    ///
    /// A missing file moves on to the next source. A file that exists but
    /// does not parse or validate is an error. Backend credentials from the
    /// environment are applied last.
    pub fn load() -> Result<Self, ConfigError> {
        let env_path = std::env::var_os(CONFIG_ENV_VAR).map(PathBuf::from);
        let mut config = Self::load_from_sources(env_path.as_deref(), Path::new(LOCAL_CONFIG_FILE))?;
        config.llm.apply_env_overrides();
        Ok(config)
    }

    fn load_from_sources(env_path: Option<&Path>, local: &Path) -> Result<Self, ConfigError> {
        // 1. Check env var
        if let Some(path) = env_path {
            if path.exists() {
                let config = Self::load_from_file(path)?;
                info!(path = %path.display(), "Loaded config from SURGEOPS_CONFIG");
                return Ok(config);
            }
            warn!(path = %path.display(), "SURGEOPS_CONFIG points to non-existent file, falling back");
        }

        // 2. Check ./surgeops.toml
        if local.exists() {
            let config = Self::load_from_file(local)?;
            info!(path = %local.display(), "Loaded config from working directory");
            return Ok(config);
        }

        // 3. Defaults
        info!("No surgeops.toml found, using built-in defaults");
        Ok(Self::default())
    }

    /// Load from a specific TOML file path.
    pub fn load_from_file(path: &Path) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path)
            .map_err(|e| ConfigError::Io(path.to_path_buf(), e))?;
        let config: Self = toml::from_str(&contents)
            .map_err(|e| ConfigError::Parse(path.to_path_buf(), e))?;
        config.validate()?;
        Ok(config)
    }

    /// Serialize the current config to a TOML string.
    pub fn to_toml(&self) -> Result<String, ConfigError> {
        toml::to_string_pretty(self).map_err(ConfigError::Serialize)
    }

    /// Validate all values for internal consistency.
    ///
    /// Rules:
    /// - Rule factors must be finite and > 0
    /// - Utilisation thresholds must lie in [0, 100]
    /// - Embedding dimension and HTTP timeout must be > 0
    pub fn validate(&self) -> Result<(), ConfigError> {
        let s = &self.surge;
        let mut errors: Vec<String> = Vec::new();

        Self::check_factor(s.arrivals_factor, "surge.arrivals_factor", &mut errors);
        Self::check_factor(s.projected_teu_factor, "surge.projected_teu_factor", &mut errors);
        Self::check_percent(s.yard_util_threshold, "surge.yard_util_threshold", &mut errors);
        Self::check_percent(s.suggestion_target_util, "surge.suggestion_target_util", &mut errors);

        if self.knowledge.embedding_dim == 0 {
            errors.push("knowledge.embedding_dim must be > 0".to_string());
        }
        if self.llm.timeout_secs == 0 {
            errors.push("llm.timeout_secs must be > 0".to_string());
        }
        if !self.llm.temperature.is_finite() || self.llm.temperature < 0.0 {
            errors.push(format!(
                "llm.temperature must be a finite non-negative number (got {})",
                self.llm.temperature
            ));
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(ConfigError::Validation(errors))
        }
    }

    fn check_factor(value: f64, name: &str, errors: &mut Vec<String>) {
        if !value.is_finite() || value <= 0.0 {
            errors.push(format!("{name} must be a finite number > 0 (got {value})"));
        }
    }

    fn check_percent(value: f64, name: &str, errors: &mut Vec<String>) {
        if !value.is_finite() || !(0.0..=100.0).contains(&value) {
            errors.push(format!("{name} must be within 0-100 (got {value})"));
        }
    }
}

// ============================================================================
// Error Type
// ============================================================================

#[derive(Debug)]
pub enum ConfigError {
    Io(PathBuf, std::io::Error),
    Parse(PathBuf, toml::de::Error),
    Serialize(toml::ser::Error),
    Validation(Vec<String>),
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigError::Io(path, e) => write!(f, "Config I/O error ({}): {}", path.display(), e),
            ConfigError::Parse(path, e) => {
                write!(f, "Config parse error ({}): {}", path.display(), e)
            }
            ConfigError::Serialize(e) => write!(f, "Config serialization error: {}", e),
            ConfigError::Validation(errors) => {
                writeln!(f, "Config validation failed:")?;
                for e in errors {
                    writeln!(f, "  - {}", e)?;
                }
                Ok(())
            }
        }
    }
}

impl std::error::Error for ConfigError {}

// ============================================================================
// Surge Thresholds
// ============================================================================

/// Threshold constants for the surge rule chain
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SurgeThresholds {
    #[serde(default = "default_arrivals_factor")]
    pub arrivals_factor: f64,

    #[serde(default = "default_projected_teu_factor")]
    pub projected_teu_factor: f64,

    /// Average yard utilisation (%)
    #[serde(default = "default_yard_util_threshold")]
    pub yard_util_threshold: f64,

    #[serde(default = "default_min_waiting_vessels")]
    pub min_waiting_vessels: u64,

    /// Utilisation (%) the fullest block is relieved down to
    #[serde(default = "default_suggestion_target_util")]
    pub suggestion_target_util: f64,
}

fn default_arrivals_factor() -> f64 {
    defaults::ARRIVALS_FACTOR
}
fn default_projected_teu_factor() -> f64 {
    defaults::PROJECTED_TEU_FACTOR
}
fn default_yard_util_threshold() -> f64 {
    defaults::YARD_UTIL_THRESHOLD
}
fn default_min_waiting_vessels() -> u64 {
    defaults::MIN_WAITING_VESSELS
}
fn default_suggestion_target_util() -> f64 {
    defaults::SUGGESTION_TARGET_UTIL
}

impl Default for SurgeThresholds {
    fn default() -> Self {
        Self {
            arrivals_factor: default_arrivals_factor(),
            projected_teu_factor: default_projected_teu_factor(),
            yard_util_threshold: default_yard_util_threshold(),
            min_waiting_vessels: default_min_waiting_vessels(),
            suggestion_target_util: default_suggestion_target_util(),
        }
    }
}

// ============================================================================
// LLM Backend
// ============================================================================

/// Azure-OpenAI-style REST backend settings.
///
/// The backend counts as configured only when both `endpoint` and `api_key`
/// are non-blank.
#[derive(Clone, Serialize, Deserialize)]
pub struct LlmConfig {
    #[serde(default)]
    pub endpoint: String,

    #[serde(default)]
    pub api_key: String,

    #[serde(default = "default_api_version")]
    pub api_version: String,

    #[serde(default = "default_chat_deployment")]
    pub chat_deployment: String,

    #[serde(default = "default_embeddings_deployment")]
    pub embeddings_deployment: String,

    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,

    #[serde(default = "default_temperature")]
    pub temperature: f64,

    #[serde(default = "default_max_tokens")]
    pub max_tokens: u32,
}

fn default_api_version() -> String {
    defaults::LLM_API_VERSION.to_string()
}
fn default_chat_deployment() -> String {
    defaults::LLM_CHAT_DEPLOYMENT.to_string()
}
fn default_embeddings_deployment() -> String {
    defaults::LLM_EMBEDDINGS_DEPLOYMENT.to_string()
}
fn default_timeout_secs() -> u64 {
    defaults::LLM_HTTP_TIMEOUT_SECS
}
fn default_temperature() -> f64 {
    defaults::LLM_TEMPERATURE
}
fn default_max_tokens() -> u32 {
    defaults::LLM_MAX_TOKENS
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            endpoint: String::new(),
            api_key: String::new(),
            api_version: default_api_version(),
            chat_deployment: default_chat_deployment(),
            embeddings_deployment: default_embeddings_deployment(),
            timeout_secs: default_timeout_secs(),
            temperature: default_temperature(),
            max_tokens: default_max_tokens(),
        }
    }
}

// The API key must never reach the logs.
impl std::fmt::Debug for LlmConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LlmConfig")
            .field("endpoint", &self.endpoint)
            .field("api_key", &if self.api_key.is_empty() { "" } else { "***" })
            .field("api_version", &self.api_version)
            .field("chat_deployment", &self.chat_deployment)
            .field("embeddings_deployment", &self.embeddings_deployment)
            .field("timeout_secs", &self.timeout_secs)
            .finish_non_exhaustive()
    }
}

impl LlmConfig {
    pub const ENDPOINT_ENV_VAR: &'static str = "AZURE_OPENAI_ENDPOINT";
    pub const API_KEY_ENV_VAR: &'static str = "AZURE_OPENAI_API_KEY";

    pub fn is_configured(&self) -> bool {
        !self.endpoint.trim().is_empty() && !self.api_key.trim().is_empty()
    }

    /// Environment credentials win over file values
    pub fn apply_env_overrides(&mut self) {
        if let Ok(endpoint) = std::env::var(Self::ENDPOINT_ENV_VAR) {
            if !endpoint.trim().is_empty() {
                self.endpoint = endpoint;
            }
        }
        if let Ok(key) = std::env::var(Self::API_KEY_ENV_VAR) {
            if !key.trim().is_empty() {
                self.api_key = key;
            }
        }
    }
}

// ============================================================================
// Knowledge Base
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct KnowledgeConfig {
    /// Stored vector dimension (D)
    #[serde(default = "default_embedding_dim")]
    pub embedding_dim: usize,

    /// Chunks retrieved as plan prompt context
    #[serde(default = "default_plan_context_chunks")]
    pub plan_context_chunks: usize,
}

fn default_embedding_dim() -> usize {
    defaults::EMBEDDING_DIM
}
fn default_plan_context_chunks() -> usize {
    defaults::PLAN_CONTEXT_CHUNKS
}

impl Default for KnowledgeConfig {
    fn default() -> Self {
        Self {
            embedding_dim: default_embedding_dim(),
            plan_context_chunks: default_plan_context_chunks(),
        }
    }
}

// ============================================================================
// Storage
// ============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageConfig {
    #[serde(default = "default_storage_path")]
    pub path: PathBuf,
}

fn default_storage_path() -> PathBuf {
    PathBuf::from(defaults::STORAGE_PATH)
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            path: default_storage_path(),
        }
    }
}
