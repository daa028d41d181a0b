//! Public SDK surface for the Synapse assistant core.
//!
//! This crate re-exports the building blocks and provides small wiring
//! helpers to keep consumer setup consistent.

/// Re-export for convenience.
pub use synapse_config as config;
/// Re-export for convenience.
pub use synapse_core as core;
/// Re-export for convenience.
pub use synapse_knowledge as knowledge;
/// Re-export for convenience.
pub use synapse_protocol as protocol;

use anyhow::Context;
use log::info;
use std::sync::Arc;
use synapse_config::SynapseConfig;
use synapse_core::gateway::CompletionGateway;
use synapse_core::orchestrator::Orchestrator;
use synapse_core::sessions::SessionStore;
use synapse_core::state::{JsonlStateStore, SessionStateStore};
use synapse_knowledge::{DomainSources, KnowledgeRetriever};
use synapse_protocol::Notifier;

#[inline]
/// Initialize logging using env_logger if the "logging" feature is enabled.
///
/// This is a no-op if the feature is not enabled. Binaries are still expected
/// to call this early in startup to ensure log output is wired up.
pub fn init_logging() {
    #[cfg(feature = "logging")]
    {
        let _ = env_logger::try_init();
    }
}

/// Assemble a fully wired orchestrator from configuration.
///
/// The completion gateway starts degraded when no API key is configured,
/// and sessions are durable only when `sessions.enabled` is set.
pub fn build_orchestrator(
    config: SynapseConfig,
    sources: DomainSources,
    notifier: Arc<dyn Notifier>,
) -> anyhow::Result<Orchestrator> {
    let gateway = Arc::new(CompletionGateway::from_config(&config.gateway));
    let retriever = KnowledgeRetriever::new(sources, config.retrieval.clone());
    let sessions = if config.sessions.enabled {
        let root = config
            .sessions
            .path
            .clone()
            .unwrap_or_else(|| "sessions".to_string());
        let state: Arc<dyn SessionStateStore> = Arc::new(
            JsonlStateStore::new(&root)
                .with_context(|| format!("failed to open session store at {root}"))?,
        );
        Arc::new(SessionStore::with_state(state).context("failed to hydrate session store")?)
    } else {
        Arc::new(SessionStore::in_memory())
    };
    info!(
        "assembled orchestrator (backend={}, durable_sessions={})",
        gateway.is_available(),
        config.sessions.enabled
    );
    Ok(Orchestrator::new(
        config, gateway, retriever, sessions, notifier,
    ))
}

#[cfg(test)]
mod tests {
    use super::build_orchestrator;
    use pretty_assertions::assert_eq;
    use std::sync::Arc;
    use synapse_config::SynapseConfig;
    use synapse_protocol::{CallerIdentity, ChatRequest, NoopNotifier};
    use synapse_test_utils::stub_sources;

    #[tokio::test]
    async fn built_orchestrator_degrades_without_an_api_key() {
        let orchestrator =
            build_orchestrator(SynapseConfig::default(), stub_sources(), Arc::new(NoopNotifier))
                .expect("orchestrator");
        assert!(!orchestrator.gateway_available());

        let outcome = orchestrator
            .handle_message(
                ChatRequest::new("hello"),
                &CallerIdentity::Authenticated("user-1".to_string()),
            )
            .await
            .expect("degraded turn");
        assert_eq!(outcome.metadata["degraded"], true);
    }

    #[tokio::test]
    async fn durable_sessions_come_from_configuration() {
        let temp = tempfile::tempdir().expect("tempdir");
        let mut config = SynapseConfig::default();
        config.sessions.enabled = true;
        config.sessions.path = Some(temp.path().to_string_lossy().into_owned());

        let orchestrator =
            build_orchestrator(config, stub_sources(), Arc::new(NoopNotifier))
                .expect("orchestrator");
        let caller = CallerIdentity::Authenticated("user-1".to_string());
        let outcome = orchestrator
            .handle_message(ChatRequest::new("persist me"), &caller)
            .await
            .expect("turn");

        let rollout = temp.path().join(format!("{}.jsonl", outcome.session_id));
        assert!(rollout.exists());
    }
}
