//! Centralized server configuration.
//!
//! This module provides strongly-typed configuration for the server,
//! loaded via the `config` crate from environment variables
//! (`PROVIDER__API_KEY`, `STORAGE__LEADS_PATH`, ...).

use frontdesk_ai::{LlmBackendConfig, LlmProvider};
use frontdesk_conversation::context::DEFAULT_FALLBACK;
use frontdesk_conversation::{AgentPersona, SessionLimits};
use serde::Deserialize;
use std::fmt;
use std::path::PathBuf;
use std::time::Duration;

/// Server configuration composed from library configs.
#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    /// Address the HTTP listener binds to.
    #[serde(default = "default_bind_addr")]
    pub bind_addr: String,

    /// Language-model provider configuration.
    #[serde(default)]
    pub provider: ProviderConfig,

    /// Business knowledge documents.
    #[serde(default)]
    pub knowledge: KnowledgeConfig,

    /// Lead and feedback snapshot files.
    #[serde(default)]
    pub storage: StorageConfig,

    /// Persona the agent presents.
    #[serde(default)]
    pub agent: AgentConfig,

    /// Session configuration.
    #[serde(default)]
    pub session: SessionConfig,
}

fn default_bind_addr() -> String {
    "127.0.0.1:3000".to_string()
}

/// Provider configuration.
#[derive(Clone, Deserialize)]
pub struct ProviderConfig {
    /// Base URL of the OpenAI-compatible API.
    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// Model identifier.
    #[serde(default = "default_model")]
    pub model: String,

    /// Key used when a session is initialized without one.
    #[serde(default)]
    pub api_key: Option<String>,

    /// Bound on each provider round-trip.
    #[serde(default = "default_timeout_seconds")]
    pub timeout_seconds: u64,
}

fn default_base_url() -> String {
    LlmBackendConfig::OPENAI_BASE_URL.to_string()
}

fn default_model() -> String {
    LlmBackendConfig::DEFAULT_MODEL.to_string()
}

fn default_timeout_seconds() -> u64 {
    LlmBackendConfig::DEFAULT_TIMEOUT_SECS
}

impl Default for ProviderConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            model: default_model(),
            api_key: None,
            timeout_seconds: default_timeout_seconds(),
        }
    }
}

impl fmt::Debug for ProviderConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ProviderConfig")
            .field("base_url", &self.base_url)
            .field("model", &self.model)
            .field("api_key", &self.api_key.as_ref().map(|_| "<redacted>"))
            .field("timeout_seconds", &self.timeout_seconds)
            .finish()
    }
}

impl ProviderConfig {
    /// Converts to the backend configuration.
    #[must_use]
    pub fn backend_config(&self) -> LlmBackendConfig {
        let provider = if self.base_url.trim_end_matches('/') == LlmBackendConfig::OPENAI_BASE_URL {
            LlmProvider::OpenAi
        } else {
            LlmProvider::OpenAiCompatible
        };

        LlmBackendConfig {
            provider,
            base_url: self.base_url.clone(),
            model: self.model.clone(),
            api_key: self.api_key.clone(),
            timeout_secs: self.timeout_seconds,
        }
    }
}

/// Knowledge document configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct KnowledgeConfig {
    /// Plain-text business summary.
    #[serde(default = "default_summary_path")]
    pub summary_path: PathBuf,

    /// Additional plain-text documents, appended in order.
    #[serde(default)]
    pub documents: Vec<PathBuf>,

    /// Summary used when the summary file is missing.
    #[serde(default = "default_fallback")]
    pub fallback: String,
}

fn default_summary_path() -> PathBuf {
    PathBuf::from("me/business_summary.txt")
}

fn default_fallback() -> String {
    DEFAULT_FALLBACK.to_string()
}

impl Default for KnowledgeConfig {
    fn default() -> Self {
        Self {
            summary_path: default_summary_path(),
            documents: Vec::new(),
            fallback: default_fallback(),
        }
    }
}

/// Snapshot file configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct StorageConfig {
    #[serde(default = "default_leads_path")]
    pub leads_path: PathBuf,

    #[serde(default = "default_feedback_path")]
    pub feedback_path: PathBuf,
}

fn default_leads_path() -> PathBuf {
    PathBuf::from("leads_log.json")
}

fn default_feedback_path() -> PathBuf {
    PathBuf::from("feedback_log.json")
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            leads_path: default_leads_path(),
            feedback_path: default_feedback_path(),
        }
    }
}

/// Persona configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct AgentConfig {
    /// The representative's name.
    #[serde(default = "default_persona")]
    pub persona: String,

    /// The business being represented.
    #[serde(default = "default_business_name")]
    pub business_name: String,
}

fn default_persona() -> String {
    AgentPersona::default().agent_name
}

fn default_business_name() -> String {
    AgentPersona::default().business_name
}

impl Default for AgentConfig {
    fn default() -> Self {
        Self {
            persona: default_persona(),
            business_name: default_business_name(),
        }
    }
}

impl AgentConfig {
    /// Returns the configured persona.
    #[must_use]
    pub fn persona(&self) -> AgentPersona {
        AgentPersona::new(&self.persona, &self.business_name)
    }
}

/// Session-related configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct SessionConfig {
    /// Most sessions held at once.
    #[serde(default = "default_max_sessions")]
    pub max_sessions: usize,

    /// Sessions idle for longer than this are evicted, in seconds.
    #[serde(default = "default_idle_timeout_seconds")]
    pub idle_timeout_seconds: u64,

    /// Interval between session cleanup runs, in seconds.
    #[serde(default = "default_cleanup_interval_seconds")]
    pub cleanup_interval_seconds: u64,
}

fn default_max_sessions() -> usize {
    SessionLimits::DEFAULT_MAX_SESSIONS
}

fn default_idle_timeout_seconds() -> u64 {
    SessionLimits::DEFAULT_IDLE_TIMEOUT.as_secs()
}

fn default_cleanup_interval_seconds() -> u64 {
    300
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            max_sessions: default_max_sessions(),
            idle_timeout_seconds: default_idle_timeout_seconds(),
            cleanup_interval_seconds: default_cleanup_interval_seconds(),
        }
    }
}

impl SessionConfig {
    /// Converts to the session manager's limits.
    #[must_use]
    pub fn limits(&self) -> SessionLimits {
        SessionLimits {
            max_sessions: self.max_sessions,
            idle_timeout: Duration::from_secs(self.idle_timeout_seconds),
        }
    }

    /// Interval between cleanup runs, never zero.
    #[must_use]
    pub fn cleanup_interval(&self) -> Duration {
        Duration::from_secs(self.cleanup_interval_seconds.max(1))
    }
}

impl ServerConfig {
    /// Loads configuration from environment variables.
    ///
    /// `KNOWLEDGE__DOCUMENTS` is a comma-separated list of paths.
    ///
    /// # Errors
    ///
    /// Returns an error if configuration is present but invalid.
    pub fn from_env() -> Result<Self, config::ConfigError> {
        config::Config::builder()
            .add_source(
                config::Environment::default()
                    .separator("__")
                    .list_separator(",")
                    .with_list_parse_key("knowledge.documents")
                    .try_parsing(true),
            )
            .build()?
            .try_deserialize()
    }
}
