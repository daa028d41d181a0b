//! Configuration schema for the Synapse assistant core.

use crate::ConfigError;
use serde::{Deserialize, Serialize};

/// Root config for the Synapse core.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct SynapseConfig {
    #[serde(default, rename = "$schema")]
    pub schema: Option<String>,
    #[serde(default)]
    pub gateway: GatewayConfig,
    #[serde(default)]
    pub retrieval: RetrievalConfig,
    #[serde(default)]
    pub history: HistoryConfig,
    #[serde(default)]
    pub persona: PersonaConfig,
    #[serde(default)]
    pub sessions: SessionsConfig,
}

impl SynapseConfig {
    /// Start building a config programmatically with defaults applied.
    pub fn builder() -> SynapseConfigBuilder {
        SynapseConfigBuilder::new()
    }

    /// Validate field-level constraints on the effective config.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(0.0..=2.0).contains(&self.gateway.temperature) {
            return Err(ConfigError::InvalidField {
                path: "gateway.temperature".to_string(),
                message: format!("must be within [0, 2], got {}", self.gateway.temperature),
            });
        }
        if self.gateway.max_tokens == 0 {
            return Err(ConfigError::InvalidField {
                path: "gateway.max_tokens".to_string(),
                message: "must be greater than zero".to_string(),
            });
        }
        if self.gateway.timeout_secs == 0 {
            return Err(ConfigError::InvalidField {
                path: "gateway.timeout_secs".to_string(),
                message: "must be greater than zero".to_string(),
            });
        }
        if self.retrieval.max_chunks == 0 {
            return Err(ConfigError::InvalidField {
                path: "retrieval.max_chunks".to_string(),
                message: "must be greater than zero".to_string(),
            });
        }
        if self.history.limit == 0 {
            return Err(ConfigError::InvalidField {
                path: "history.limit".to_string(),
                message: "must be greater than zero".to_string(),
            });
        }
        Ok(())
    }
}

/// Builder for assembling a `SynapseConfig` in code.
#[derive(Debug, Default, Clone)]
pub struct SynapseConfigBuilder {
    config: SynapseConfig,
}

impl SynapseConfigBuilder {
    /// Create a new builder seeded with default config values.
    pub fn new() -> Self {
        Self {
            config: SynapseConfig::default(),
        }
    }

    /// Replace the completion gateway configuration.
    pub fn gateway(mut self, gateway: GatewayConfig) -> Self {
        self.config.gateway = gateway;
        self
    }

    /// Replace the retrieval configuration.
    pub fn retrieval(mut self, retrieval: RetrievalConfig) -> Self {
        self.config.retrieval = retrieval;
        self
    }

    /// Replace the history bounding configuration.
    pub fn history(mut self, history: HistoryConfig) -> Self {
        self.config.history = history;
        self
    }

    /// Replace the assistant persona configuration.
    pub fn persona(mut self, persona: PersonaConfig) -> Self {
        self.config.persona = persona;
        self
    }

    /// Replace the session persistence configuration.
    pub fn sessions(mut self, sessions: SessionsConfig) -> Self {
        self.config.sessions = sessions;
        self
    }

    /// Finalize and return the built `SynapseConfig`.
    pub fn build(self) -> SynapseConfig {
        self.config
    }
}

/// Completion gateway and language-model backend settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GatewayConfig {
    /// Backend credential; absence puts the gateway in degraded mode.
    #[serde(default)]
    pub api_key: Option<String>,
    /// Chat-completions endpoint base URL.
    #[serde(default = "default_base_url")]
    pub base_url: String,
    /// Model identifier sent to the backend.
    #[serde(default = "default_model")]
    pub model: String,
    /// Sampling temperature.
    #[serde(default = "default_temperature")]
    pub temperature: f64,
    /// Response token cap.
    #[serde(default = "default_max_tokens")]
    pub max_tokens: u32,
    /// Request timeout for one backend call.
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
    /// Completion cache entry time-to-live.
    #[serde(default = "default_cache_ttl_secs")]
    pub cache_ttl_secs: u64,
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            base_url: default_base_url(),
            model: default_model(),
            temperature: default_temperature(),
            max_tokens: default_max_tokens(),
            timeout_secs: default_timeout_secs(),
            cache_ttl_secs: default_cache_ttl_secs(),
        }
    }
}

fn default_base_url() -> String {
    "https://api.openai.com/v1".to_string()
}

fn default_model() -> String {
    "gpt-4o-mini".to_string()
}

fn default_temperature() -> f64 {
    0.7
}

fn default_max_tokens() -> u32 {
    1024
}

fn default_timeout_secs() -> u64 {
    10
}

fn default_cache_ttl_secs() -> u64 {
    1800
}

/// Knowledge retrieval bounds.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RetrievalConfig {
    /// Maximum chunks returned per retrieval.
    #[serde(default = "default_max_chunks")]
    pub max_chunks: usize,
    /// Per-chunk content cap applied before formatting.
    #[serde(default = "default_chunk_char_cap")]
    pub chunk_char_cap: usize,
    /// How many recent records to pull per domain source.
    #[serde(default = "default_recent_limit")]
    pub recent_limit: usize,
}

impl Default for RetrievalConfig {
    fn default() -> Self {
        Self {
            max_chunks: default_max_chunks(),
            chunk_char_cap: default_chunk_char_cap(),
            recent_limit: default_recent_limit(),
        }
    }
}

fn default_max_chunks() -> usize {
    8
}

fn default_chunk_char_cap() -> usize {
    400
}

fn default_recent_limit() -> usize {
    3
}

/// Conversation history bounding for prompt assembly.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HistoryConfig {
    /// Maximum prior messages included in a prompt.
    #[serde(default = "default_history_limit")]
    pub limit: usize,
}

impl Default for HistoryConfig {
    fn default() -> Self {
        Self {
            limit: default_history_limit(),
        }
    }
}

fn default_history_limit() -> usize {
    10
}

/// Assistant persona settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PersonaConfig {
    /// Display name used in the system prompt.
    #[serde(default = "default_persona_name")]
    pub name: String,
    /// Extra instructions appended to the persona prompt.
    #[serde(default)]
    pub additional_instructions: Option<String>,
}

impl Default for PersonaConfig {
    fn default() -> Self {
        Self {
            name: default_persona_name(),
            additional_instructions: None,
        }
    }
}

fn default_persona_name() -> String {
    "Synapse".to_string()
}

/// Session persistence settings.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct SessionsConfig {
    /// Enable durable session storage.
    #[serde(default)]
    pub enabled: bool,
    /// Storage root; resolved relative to the working directory.
    #[serde(default)]
    pub path: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::{GatewayConfig, SynapseConfig};
    use pretty_assertions::assert_eq;

    #[test]
    fn default_config_passes_validation() {
        let config = SynapseConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.gateway.timeout_secs, 10);
        assert_eq!(config.gateway.cache_ttl_secs, 1800);
        assert_eq!(config.retrieval.max_chunks, 8);
    }

    #[test]
    fn validate_rejects_out_of_range_temperature() {
        let config = SynapseConfig::builder()
            .gateway(GatewayConfig {
                temperature: 3.5,
                ..GatewayConfig::default()
            })
            .build();
        let err = config.validate().expect_err("invalid");
        assert!(err.to_string().contains("gateway.temperature"));
    }

    #[test]
    fn builder_overrides_sections() {
        let config = SynapseConfig::builder()
            .gateway(GatewayConfig {
                model: "local-llm".to_string(),
                ..GatewayConfig::default()
            })
            .build();
        assert_eq!(config.gateway.model, "local-llm");
        assert_eq!(config.history.limit, 10);
    }
}
