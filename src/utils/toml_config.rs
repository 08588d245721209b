//! TOML-based configuration for DeepSearch
//!
//! This module provides declarative configuration for the model provider, the
//! search and memory services, the session store, the run budget, the user
//! profile and per-agent model overrides via a TOML file (`deepsearch.toml`).
//!
//! Secrets are never stored in the file: each external service names the
//! environment variable holding its key, and [`DeepSearchConfig::validate_secrets`]
//! fails fast when one is missing.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::info;

use crate::types::UserProfile;

/// Agent keys accepted under `[agents.*]`.
pub const AGENT_KEYS: &[&str] = &[
    "coordinator",
    "requirement_gathering",
    "planning",
    "lead",
    "citation",
    "reflection",
];

/// Root configuration structure loaded from deepsearch.toml
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DeepSearchConfig {
    #[serde(default)]
    pub server: ServerConfig,

    /// Chat-completions model provider
    #[serde(default)]
    pub provider: ProviderConfig,

    #[serde(default)]
    pub search: SearchConfig,

    #[serde(default)]
    pub memory: MemoryConfig,

    #[serde(default)]
    pub session: SessionConfig,

    #[serde(default)]
    pub run: RunConfig,

    /// Profile handed to every run as its context
    #[serde(default)]
    pub user: UserConfig,

    /// Per-agent overrides keyed by agent key
    #[serde(default)]
    pub agents: HashMap<String, AgentOverride>,
}

// ============= Server Configuration =============

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,

    #[serde(default = "default_port")]
    pub port: u16,

    #[serde(default = "default_log_level")]
    pub log_level: String,

    /// `text` for humans, `json` for one event object per line
    #[serde(default = "default_log_format")]
    pub log_format: String,
}

fn default_host() -> String {
    "127.0.0.1".to_string()
}

fn default_port() -> u16 {
    3000
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_log_format() -> String {
    "text".to_string()
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            log_level: default_log_level(),
            log_format: default_log_format(),
        }
    }
}

// ============= Provider Configuration =============

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProviderConfig {
    /// Environment variable containing the model provider API key
    #[serde(default = "default_provider_key_env")]
    pub api_key_env: String,

    /// Base URL of the OpenAI-compatible chat-completions API
    #[serde(default = "default_api_base")]
    pub api_base: String,

    /// Model used by agents without an override
    #[serde(default = "default_model")]
    pub default_model: String,

    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,

    /// Transport-level retries for connection errors, 429 and 5xx responses
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,
}

fn default_provider_key_env() -> String {
    "GEMINI_API_KEY".to_string()
}

fn default_api_base() -> String {
    "https://generativelanguage.googleapis.com/v1beta/openai/".to_string()
}

fn default_model() -> String {
    "gemini-2.5-flash".to_string()
}

fn default_timeout_secs() -> u64 {
    30
}

fn default_max_retries() -> u32 {
    3
}

impl Default for ProviderConfig {
    fn default() -> Self {
        Self {
            api_key_env: default_provider_key_env(),
            api_base: default_api_base(),
            default_model: default_model(),
            timeout_secs: default_timeout_secs(),
            max_retries: default_max_retries(),
        }
    }
}

// ============= Search Configuration =============

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchConfig {
    #[serde(default = "default_search_key_env")]
    pub api_key_env: String,

    #[serde(default = "default_search_url")]
    pub base_url: String,
}

fn default_search_key_env() -> String {
    "TAVILY_API_KEY".to_string()
}

fn default_search_url() -> String {
    "https://api.tavily.com".to_string()
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            api_key_env: default_search_key_env(),
            base_url: default_search_url(),
        }
    }
}

// ============= Memory Configuration =============

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MemoryConfig {
    #[serde(default = "default_memory_key_env")]
    pub api_key_env: String,

    #[serde(default = "default_memory_url")]
    pub base_url: String,

    /// Maximum number of fragments returned by `search_user_memory`
    #[serde(default = "default_top_k")]
    pub top_k: usize,
}

fn default_memory_key_env() -> String {
    "MEM0_API_KEY".to_string()
}

fn default_memory_url() -> String {
    "https://api.mem0.ai".to_string()
}

fn default_top_k() -> usize {
    10
}

impl Default for MemoryConfig {
    fn default() -> Self {
        Self {
            api_key_env: default_memory_key_env(),
            base_url: default_memory_url(),
            top_k: default_top_k(),
        }
    }
}

// ============= Session Configuration =============

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionConfig {
    /// SQLite file holding conversation history; empty keeps it in memory
    #[serde(default = "default_database")]
    pub database: String,

    #[serde(default = "default_session_id")]
    pub session_id: String,
}

fn default_database() -> String {
    "./data/sessions.db".to_string()
}

fn default_session_id() -> String {
    "default".to_string()
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            database: default_database(),
            session_id: default_session_id(),
        }
    }
}

// ============= Run Configuration =============

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunConfig {
    /// Turn budget of one user turn (inferences, tool calls and handoffs)
    #[serde(default = "default_max_turns")]
    pub max_turns: usize,

    /// Turn budget of each citation/reflection sub-agent call
    #[serde(default = "default_sub_agent_max_turns")]
    pub sub_agent_max_turns: usize,

    #[serde(default = "default_workflow_name")]
    pub workflow_name: String,
}

fn default_max_turns() -> usize {
    50
}

fn default_sub_agent_max_turns() -> usize {
    10
}

fn default_workflow_name() -> String {
    "Deep Research Session".to_string()
}

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            max_turns: default_max_turns(),
            sub_agent_max_turns: default_sub_agent_max_turns(),
            workflow_name: default_workflow_name(),
        }
    }
}

// ============= User Configuration =============

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserConfig {
    #[serde(default = "default_user_name")]
    pub name: String,

    #[serde(default)]
    pub interests: Vec<String>,
}

fn default_user_name() -> String {
    "guest".to_string()
}

impl Default for UserConfig {
    fn default() -> Self {
        Self {
            name: default_user_name(),
            interests: Vec::new(),
        }
    }
}

impl UserConfig {
    pub fn profile(&self) -> UserProfile {
        UserProfile {
            name: self.name.clone(),
            interests: self.interests.clone(),
        }
    }
}

// ============= Agent Configuration =============

/// Overrides applied on top of an agent's built-in definition
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AgentOverride {
    /// Model name/identifier to use with the provider
    #[serde(default)]
    pub model: Option<String>,

    #[serde(default)]
    pub temperature: Option<f32>,
}

// ============= Configuration Loading & Validation =============

/// Errors that can occur during configuration loading
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Configuration file not found: {0}")]
    FileNotFound(PathBuf),

    #[error("Failed to read configuration file: {0}")]
    ReadError(#[from] std::io::Error),

    #[error("Failed to parse TOML: {0}")]
    ParseError(#[from] toml::de::Error),

    #[error("Validation error: {0}")]
    ValidationError(String),

    #[error("Environment variable '{0}' referenced in config is not set")]
    MissingEnvVar(String),

    #[error("Unknown agent '{0}' in [agents] section")]
    UnknownAgent(String),

    #[error("Agent '{0}' referenced by agent '{1}' does not exist")]
    MissingAgent(String, String),

    #[error("Agent '{0}' is not reachable from the coordinator")]
    UnreachableAgent(String),

    #[error("Circular reference detected: {0}")]
    CircularReference(String),
}

impl DeepSearchConfig {
    /// Load configuration from a TOML file
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let path = path.as_ref();

        if !path.exists() {
            return Err(ConfigError::FileNotFound(path.to_path_buf()));
        }

        let content = fs::read_to_string(path)?;
        let config: DeepSearchConfig = toml::from_str(&content)?;

        config.validate()?;

        Ok(config)
    }

    /// Load the file when present, otherwise fall back to the built-in defaults
    pub fn load_or_default<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        if path.exists() {
            Self::load(path)
        } else {
            info!("No configuration at {:?}, using defaults", path);
            Ok(Self::default())
        }
    }

    /// Validate the configuration for internal consistency
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !matches!(self.server.log_format.as_str(), "text" | "json") {
            return Err(ConfigError::ValidationError(format!(
                "server.log_format must be \"text\" or \"json\", got \"{}\"",
                self.server.log_format
            )));
        }
        if self.run.max_turns == 0 {
            return Err(ConfigError::ValidationError(
                "run.max_turns must be greater than zero".to_string(),
            ));
        }
        if self.run.sub_agent_max_turns == 0 {
            return Err(ConfigError::ValidationError(
                "run.sub_agent_max_turns must be greater than zero".to_string(),
            ));
        }
        if self.memory.top_k == 0 {
            return Err(ConfigError::ValidationError(
                "memory.top_k must be greater than zero".to_string(),
            ));
        }
        if self.provider.default_model.trim().is_empty() {
            return Err(ConfigError::ValidationError(
                "provider.default_model must not be empty".to_string(),
            ));
        }
        if self.user.name.is_empty() {
            return Err(ConfigError::ValidationError(
                "user.name must not be empty".to_string(),
            ));
        }

        for (key, agent) in &self.agents {
            if !AGENT_KEYS.contains(&key.as_str()) {
                return Err(ConfigError::UnknownAgent(key.clone()));
            }
            if let Some(temperature) = agent.temperature {
                if !(0.0..=2.0).contains(&temperature) {
                    return Err(ConfigError::ValidationError(format!(
                        "agents.{}.temperature must be within 0.0..=2.0, got {}",
                        key, temperature
                    )));
                }
            }
        }

        Ok(())
    }

    /// Check that every secret the configuration references is present
    ///
    /// The process cannot serve a single turn without all three keys, so
    /// callers treat an error here as fatal.
    pub fn validate_secrets(&self) -> Result<(), ConfigError> {
        for env in self.secret_envs() {
            self.validate_env_var(env)?;
        }
        Ok(())
    }

    /// Names of the referenced environment variables that are unset or empty
    pub fn missing_secrets(&self) -> Vec<String> {
        self.secret_envs()
            .into_iter()
            .filter(|env| self.validate_env_var(env).is_err())
            .map(str::to_string)
            .collect()
    }

    fn secret_envs(&self) -> [&str; 3] {
        [
            self.provider.api_key_env.as_str(),
            self.search.api_key_env.as_str(),
            self.memory.api_key_env.as_str(),
        ]
    }

    fn validate_env_var(&self, name: &str) -> Result<(), ConfigError> {
        match std::env::var(name) {
            Ok(value) if !value.is_empty() => Ok(()),
            _ => Err(ConfigError::MissingEnvVar(name.to_string())),
        }
    }

    /// Get a resolved value from an env var reference
    pub fn resolve_env(&self, env_name: &str) -> Result<String, ConfigError> {
        std::env::var(env_name).map_err(|_| ConfigError::MissingEnvVar(env_name.to_string()))
    }

    /// Get the override for an agent key, if any
    pub fn agent_override(&self, key: &str) -> Option<&AgentOverride> {
        self.agents.get(key)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn create_test_config() -> String {
        r#"
[server]
host = "0.0.0.0"
port = 8080
log_level = "debug"

[provider]
api_key_env = "TEST_MODEL_KEY"
default_model = "gemini-2.5-flash"
timeout_secs = 10
max_retries = 1

[search]
api_key_env = "TEST_SEARCH_KEY"

[memory]
api_key_env = "TEST_MEMORY_KEY"
top_k = 5

[session]
database = "./data/test.db"
session_id = "abdullah1"

[run]
max_turns = 30

[user]
name = "nafay"
interests = ["AI", "Web development", "Agentic AI"]

[agents.lead]
model = "gemini-2.5-pro"
temperature = 1.9
"#
        .to_string()
    }

    #[test]
    fn test_parse_config() {
        let config: DeepSearchConfig =
            toml::from_str(&create_test_config()).expect("Failed to parse config");

        assert_eq!(config.server.host, "0.0.0.0");
        assert_eq!(config.server.port, 8080);
        assert_eq!(config.provider.max_retries, 1);
        assert_eq!(config.memory.top_k, 5);
        assert_eq!(config.run.max_turns, 30);
        assert_eq!(config.run.sub_agent_max_turns, 10);
        assert_eq!(config.user.interests.len(), 3);
        assert_eq!(
            config.agent_override("lead").and_then(|a| a.model.clone()),
            Some("gemini-2.5-pro".to_string())
        );
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_defaults() {
        let config: DeepSearchConfig = toml::from_str("").unwrap();

        assert_eq!(config.server.port, 3000);
        assert_eq!(config.server.log_format, "text");
        assert_eq!(config.provider.api_key_env, "GEMINI_API_KEY");
        assert_eq!(config.provider.timeout_secs, 30);
        assert_eq!(config.provider.max_retries, 3);
        assert_eq!(config.search.api_key_env, "TAVILY_API_KEY");
        assert_eq!(config.memory.api_key_env, "MEM0_API_KEY");
        assert_eq!(config.memory.top_k, 10);
        assert_eq!(config.run.max_turns, 50);
        assert_eq!(config.run.workflow_name, "Deep Research Session");
    }

    #[test]
    fn test_validation_unknown_agent() {
        let content = r#"
[agents.sales]
model = "gemini-2.5-flash"
"#;
        let config: DeepSearchConfig = toml::from_str(content).unwrap();
        assert!(matches!(
            config.validate(),
            Err(ConfigError::UnknownAgent(name)) if name == "sales"
        ));
    }

    #[test]
    fn test_validation_temperature_range() {
        let content = r#"
[agents.planning]
temperature = 3.5
"#;
        let config: DeepSearchConfig = toml::from_str(content).unwrap();
        assert!(matches!(
            config.validate(),
            Err(ConfigError::ValidationError(_))
        ));
    }

    #[test]
    fn test_validation_zero_turns() {
        let content = r#"
[run]
max_turns = 0
"#;
        let config: DeepSearchConfig = toml::from_str(content).unwrap();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validation_log_format() {
        let json: DeepSearchConfig = toml::from_str("[server]\nlog_format = \"json\"").unwrap();
        assert!(json.validate().is_ok());

        let xml: DeepSearchConfig = toml::from_str("[server]\nlog_format = \"xml\"").unwrap();
        let err = xml.validate().unwrap_err();
        assert!(err.to_string().contains("log_format"));
    }

    #[test]
    fn test_missing_secret_fails_fast() {
        let content = r#"
[provider]
api_key_env = "DEEPSEARCH_TEST_UNSET_MODEL_KEY"
"#;
        let config: DeepSearchConfig = toml::from_str(content).unwrap();
        assert!(matches!(
            config.validate_secrets(),
            Err(ConfigError::MissingEnvVar(name)) if name == "DEEPSEARCH_TEST_UNSET_MODEL_KEY"
        ));
        assert!(config
            .missing_secrets()
            .contains(&"DEEPSEARCH_TEST_UNSET_MODEL_KEY".to_string()));
    }

    #[test]
    fn test_secrets_present() {
        std::env::set_var("DEEPSEARCH_TEST_MODEL_KEY", "model-key");
        std::env::set_var("DEEPSEARCH_TEST_SEARCH_KEY", "search-key");
        std::env::set_var("DEEPSEARCH_TEST_MEMORY_KEY", "memory-key");

        let content = r#"
[provider]
api_key_env = "DEEPSEARCH_TEST_MODEL_KEY"
[search]
api_key_env = "DEEPSEARCH_TEST_SEARCH_KEY"
[memory]
api_key_env = "DEEPSEARCH_TEST_MEMORY_KEY"
"#;
        let config: DeepSearchConfig = toml::from_str(content).unwrap();
        assert!(config.validate_secrets().is_ok());
        assert!(config.missing_secrets().is_empty());
        assert_eq!(
            config.resolve_env("DEEPSEARCH_TEST_SEARCH_KEY").unwrap(),
            "search-key"
        );
    }

    #[test]
    fn test_load_missing_file() {
        let result = DeepSearchConfig::load("/nonexistent/deepsearch.toml");
        assert!(matches!(result, Err(ConfigError::FileNotFound(_))));

        let fallback = DeepSearchConfig::load_or_default("/nonexistent/deepsearch.toml")
            .expect("defaults should load");
        assert_eq!(fallback.run.max_turns, 50);
    }

    #[test]
    fn test_load_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("deepsearch.toml");
        std::fs::write(&path, create_test_config()).unwrap();

        let config = DeepSearchConfig::load(&path).unwrap();
        assert_eq!(config.session.session_id, "abdullah1");
        assert_eq!(config.user.profile().name, "nafay");
    }

    #[test]
    fn test_example_config_parses() {
        let path = Path::new(env!("CARGO_MANIFEST_DIR")).join("deepsearch.example.toml");
        let config = DeepSearchConfig::load(&path).unwrap();
        assert_eq!(config.run.max_turns, 50);
        assert_eq!(
            config.agent_override("lead").and_then(|o| o.model.as_deref()),
            Some("gemini-2.5-pro")
        );
    }
}
