//! Config file loading with environment credential overrides.

use crate::{ConfigError, SynapseConfig};
use log::{debug, info};
use std::fs;
use std::path::Path;

/// Environment variable consulted for the backend credential.
pub const API_KEY_ENV: &str = "SYNAPSE_API_KEY";

/// Load a config file (JSON5), overlay environment credentials, validate.
pub fn load_from_path(path: impl AsRef<Path>) -> Result<SynapseConfig, ConfigError> {
    let path = path.as_ref();
    info!("loading config (path={})", path.display());
    let raw = fs::read_to_string(path)?;
    let mut config: SynapseConfig = json5::from_str(&raw)?;
    apply_env_overrides(&mut config);
    config.validate()?;
    Ok(config)
}

/// Build an effective config from defaults plus environment credentials.
pub fn from_env() -> SynapseConfig {
    let mut config = SynapseConfig::default();
    apply_env_overrides(&mut config);
    config
}

/// Overlay credentials from the process environment.
fn apply_env_overrides(config: &mut SynapseConfig) {
    if config.gateway.api_key.is_none()
        && let Ok(key) = std::env::var(API_KEY_ENV)
        && !key.trim().is_empty()
    {
        debug!("using backend credential from {}", API_KEY_ENV);
        config.gateway.api_key = Some(key);
    }
}

#[cfg(test)]
mod tests {
    use super::load_from_path;
    use pretty_assertions::assert_eq;
    use tempfile::tempdir;

    #[test]
    fn load_from_path_parses_json5_and_applies_defaults() {
        let dir = tempdir().expect("tempdir");
        let path = dir.path().join("synapse.json5");
        std::fs::write(
            &path,
            r#"{
                // local dev settings
                gateway: { model: "local-llm", timeout_secs: 5 },
                retrieval: { max_chunks: 4 },
            }"#,
        )
        .expect("write config");

        let config = load_from_path(&path).expect("load");
        assert_eq!(config.gateway.model, "local-llm");
        assert_eq!(config.gateway.timeout_secs, 5);
        assert_eq!(config.retrieval.max_chunks, 4);
        assert_eq!(config.history.limit, 10);
    }

    #[test]
    fn load_from_path_rejects_invalid_fields() {
        let dir = tempdir().expect("tempdir");
        let path = dir.path().join("synapse.json5");
        std::fs::write(&path, r#"{ history: { limit: 0 } }"#).expect("write config");

        let err = load_from_path(&path).expect_err("invalid");
        assert!(err.to_string().contains("history.limit"));
    }
}
