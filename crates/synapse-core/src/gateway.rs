//! Completion gateway with caching and graceful degradation.

use crate::types::WireMessage;
use async_trait::async_trait;
use log::{debug, info, warn};
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::{Duration, Instant};
use synapse_config::GatewayConfig;
use thiserror::Error;

/// Canned reply returned when no language-model backend is reachable.
pub const DEGRADED_MESSAGE: &str = "I'm currently operating in limited mode and can't reach the \
language model. I can still help you navigate your sessions and saved context, and full answers \
will resume once the service is available again.";

/// Per-request overrides for a completion call.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CompletionOptions {
    /// Sampling temperature override.
    pub temperature: Option<f64>,
    /// Maximum tokens override.
    pub max_tokens: Option<u32>,
    /// Model override.
    pub model: Option<String>,
}

/// Token accounting reported by the backend.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct TokenUsage {
    /// Tokens consumed by the prompt.
    pub prompt_tokens: u32,
    /// Tokens produced in the completion.
    pub completion_tokens: u32,
}

/// Result of a completion call.
#[derive(Debug, Clone, PartialEq)]
pub struct Completion {
    /// Generated text.
    pub text: String,
    /// Token usage, when the backend reports it.
    pub usage: Option<TokenUsage>,
    /// Wall-clock latency of the call.
    pub latency: Duration,
    /// Model that produced the text.
    pub model: String,
    /// Whether the result came from the cache.
    pub cached: bool,
    /// Whether the result is the degraded canned reply.
    pub degraded: bool,
}

/// Errors surfaced by a completion backend.
#[derive(Debug, Error)]
pub enum BackendError {
    /// Credentials were rejected.
    #[error("authentication failed: {0}")]
    Auth(String),
    /// The request timed out.
    #[error("request timed out after {0:?}")]
    Timeout(Duration),
    /// Any other remote failure.
    #[error("remote error: {0}")]
    Remote(String),
}

/// Errors surfaced by the gateway.
#[derive(Debug, Error)]
pub enum GatewayError {
    /// The underlying backend failed.
    #[error("backend error: {0}")]
    Backend(#[from] BackendError),
}

/// Abstraction over a chat-completion provider.
#[async_trait]
pub trait CompletionBackend: Send + Sync {
    /// Model used when no per-request override is given.
    fn default_model(&self) -> &str;

    /// Run a completion over the given messages.
    async fn complete(
        &self,
        messages: &[WireMessage],
        model: &str,
        temperature: f64,
        max_tokens: u32,
    ) -> Result<(String, Option<TokenUsage>), BackendError>;
}

/// HTTP backend speaking the OpenAI-compatible chat completions protocol.
pub struct HttpBackend {
    client: reqwest::Client,
    base_url: String,
    api_key: String,
    model: String,
    timeout: Duration,
}

#[derive(Serialize)]
struct ChatCompletionRequest<'a> {
    model: &'a str,
    messages: &'a [WireMessage],
    temperature: f64,
    max_tokens: u32,
}

#[derive(Deserialize)]
struct ChatCompletionResponse {
    choices: Vec<ChatChoice>,
    usage: Option<TokenUsage>,
}

#[derive(Deserialize)]
struct ChatChoice {
    message: ChatChoiceMessage,
}

#[derive(Deserialize)]
struct ChatChoiceMessage {
    content: String,
}

impl HttpBackend {
    /// Build an HTTP backend from gateway config; `None` when no API key is set.
    pub fn from_config(config: &GatewayConfig) -> Option<Self> {
        let api_key = config.api_key.clone()?;
        Some(Self {
            client: reqwest::Client::new(),
            base_url: config.base_url.trim_end_matches('/').to_string(),
            api_key,
            model: config.model.clone(),
            timeout: Duration::from_secs(config.timeout_secs),
        })
    }
}

#[async_trait]
impl CompletionBackend for HttpBackend {
    fn default_model(&self) -> &str {
        &self.model
    }

    async fn complete(
        &self,
        messages: &[WireMessage],
        model: &str,
        temperature: f64,
        max_tokens: u32,
    ) -> Result<(String, Option<TokenUsage>), BackendError> {
        let url = format!("{}/chat/completions", self.base_url);
        let body = ChatCompletionRequest {
            model,
            messages,
            temperature,
            max_tokens,
        };
        let response = self
            .client
            .post(&url)
            .bearer_auth(&self.api_key)
            .timeout(self.timeout)
            .json(&body)
            .send()
            .await
            .map_err(|err| {
                if err.is_timeout() {
                    BackendError::Timeout(self.timeout)
                } else {
                    BackendError::Remote(err.to_string())
                }
            })?;

        let status = response.status();
        if status.as_u16() == 401 || status.as_u16() == 403 {
            return Err(BackendError::Auth(format!("status {status}")));
        }
        if !status.is_success() {
            let detail = response.text().await.unwrap_or_default();
            return Err(BackendError::Remote(format!("status {status}: {detail}")));
        }

        let parsed: ChatCompletionResponse = response
            .json()
            .await
            .map_err(|err| BackendError::Remote(format!("decode failed: {err}")))?;
        let text = parsed
            .choices
            .into_iter()
            .next()
            .map(|choice| choice.message.content)
            .ok_or_else(|| BackendError::Remote("response contained no choices".to_string()))?;
        Ok((text, parsed.usage))
    }
}

struct CacheEntry {
    text: String,
    model: String,
    stored_at: Instant,
}

/// Gateway in front of the completion backend with a TTL response cache.
///
/// When no backend is configured, or the backend has marked itself
/// unavailable, calls return the degraded canned reply without a network
/// round trip.
pub struct CompletionGateway {
    backend: Option<Arc<dyn CompletionBackend>>,
    available: AtomicBool,
    cache: Mutex<HashMap<String, CacheEntry>>,
    cache_ttl: Duration,
    temperature: f64,
    max_tokens: u32,
}

impl CompletionGateway {
    /// Build a gateway over an optional backend.
    pub fn new(backend: Option<Arc<dyn CompletionBackend>>, config: &GatewayConfig) -> Self {
        if backend.is_none() {
            warn!("no completion backend configured, gateway starts degraded");
        }
        Self {
            available: AtomicBool::new(backend.is_some()),
            backend,
            cache: Mutex::new(HashMap::new()),
            cache_ttl: Duration::from_secs(config.cache_ttl_secs),
            temperature: config.temperature,
            max_tokens: config.max_tokens,
        }
    }

    /// Build a gateway from config, wiring an HTTP backend when an API key exists.
    pub fn from_config(config: &GatewayConfig) -> Self {
        let backend = HttpBackend::from_config(config)
            .map(|backend| Arc::new(backend) as Arc<dyn CompletionBackend>);
        Self::new(backend, config)
    }

    /// Whether the gateway currently believes the backend is reachable.
    pub fn is_available(&self) -> bool {
        self.backend.is_some() && self.available.load(Ordering::Relaxed)
    }

    /// Number of live entries in the response cache.
    pub fn cache_len(&self) -> usize {
        let cache = self.cache.lock();
        let ttl = self.cache_ttl;
        cache
            .values()
            .filter(|entry| entry.stored_at.elapsed() < ttl)
            .count()
    }

    /// Run a completion, consulting the cache first.
    pub async fn complete(
        &self,
        messages: &[WireMessage],
        options: &CompletionOptions,
    ) -> Result<Completion, GatewayError> {
        let start = Instant::now();

        let backend = match &self.backend {
            Some(backend) if self.available.load(Ordering::Relaxed) => backend,
            _ => {
                debug!("gateway degraded, returning canned reply");
                return Ok(Completion {
                    text: DEGRADED_MESSAGE.to_string(),
                    usage: None,
                    latency: start.elapsed(),
                    model: "degraded".to_string(),
                    cached: false,
                    degraded: true,
                });
            }
        };

        let model = options
            .model
            .clone()
            .unwrap_or_else(|| backend.default_model().to_string());
        let temperature = options.temperature.unwrap_or(self.temperature);
        let max_tokens = options.max_tokens.unwrap_or(self.max_tokens);

        let key = cache_key(messages, &model, temperature, max_tokens);
        if let Some((text, model)) = self.cache_lookup(&key) {
            debug!("completion cache hit (model={model})");
            // Served from memory, so no tokens were spent.
            return Ok(Completion {
                text,
                usage: None,
                latency: start.elapsed(),
                model,
                cached: true,
                degraded: false,
            });
        }

        let result = backend
            .complete(messages, &model, temperature, max_tokens)
            .await;
        match result {
            Ok((text, usage)) => {
                let latency = start.elapsed();
                info!(
                    "completion succeeded (model={}, latency_ms={})",
                    model,
                    latency.as_millis()
                );
                self.cache.lock().insert(
                    key,
                    CacheEntry {
                        text: text.clone(),
                        model: model.clone(),
                        stored_at: Instant::now(),
                    },
                );
                Ok(Completion {
                    text,
                    usage,
                    latency,
                    model,
                    cached: false,
                    degraded: false,
                })
            }
            Err(BackendError::Auth(detail)) => {
                // Rejected credentials will keep failing; stop hitting the
                // backend and serve the canned reply from here on.
                warn!("backend authentication failed, marking gateway unavailable ({detail})");
                self.available.store(false, Ordering::Relaxed);
                Ok(Completion {
                    text: DEGRADED_MESSAGE.to_string(),
                    usage: None,
                    latency: start.elapsed(),
                    model: "degraded".to_string(),
                    cached: false,
                    degraded: true,
                })
            }
            Err(err) => Err(GatewayError::Backend(err)),
        }
    }

    /// Single-turn convenience wrapper returning just the completion text.
    pub async fn generate_text(
        &self,
        prompt: &str,
        system_prompt: Option<&str>,
    ) -> Result<String, GatewayError> {
        let mut messages = Vec::with_capacity(2);
        if let Some(system) = system_prompt {
            messages.push(WireMessage::new(crate::types::Role::System, system));
        }
        messages.push(WireMessage::new(crate::types::Role::User, prompt));
        Ok(self
            .complete(&messages, &CompletionOptions::default())
            .await?
            .text)
    }

    fn cache_lookup(&self, key: &str) -> Option<(String, String)> {
        let mut cache = self.cache.lock();
        match cache.get(key) {
            Some(entry) if entry.stored_at.elapsed() < self.cache_ttl => {
                Some((entry.text.clone(), entry.model.clone()))
            }
            Some(_) => {
                cache.remove(key);
                None
            }
            None => None,
        }
    }
}

/// Stable cache key over the full request shape.
fn cache_key(messages: &[WireMessage], model: &str, temperature: f64, max_tokens: u32) -> String {
    let canonical = serde_json::json!({
        "messages": messages,
        "model": model,
        "temperature": temperature,
        "max_tokens": max_tokens,
    });
    let mut hasher = Sha256::new();
    hasher.update(canonical.to_string().as_bytes());
    format!("{:x}", hasher.finalize())
}

#[cfg(test)]
mod tests {
    use super::{
        BackendError, CompletionBackend, CompletionGateway, CompletionOptions, DEGRADED_MESSAGE,
        TokenUsage, cache_key,
    };
    use crate::types::{Role, WireMessage};
    use async_trait::async_trait;
    use pretty_assertions::assert_eq;
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use synapse_config::GatewayConfig;

    struct CountingBackend {
        calls: AtomicUsize,
    }

    #[async_trait]
    impl CompletionBackend for CountingBackend {
        fn default_model(&self) -> &str {
            "test-model"
        }

        async fn complete(
            &self,
            _messages: &[WireMessage],
            _model: &str,
            _temperature: f64,
            _max_tokens: u32,
        ) -> Result<(String, Option<TokenUsage>), BackendError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok((
                "a reply".to_string(),
                Some(TokenUsage {
                    prompt_tokens: 10,
                    completion_tokens: 5,
                }),
            ))
        }
    }

    struct RejectingBackend;

    #[async_trait]
    impl CompletionBackend for RejectingBackend {
        fn default_model(&self) -> &str {
            "test-model"
        }

        async fn complete(
            &self,
            _messages: &[WireMessage],
            _model: &str,
            _temperature: f64,
            _max_tokens: u32,
        ) -> Result<(String, Option<TokenUsage>), BackendError> {
            Err(BackendError::Auth("status 401".to_string()))
        }
    }

    fn messages() -> Vec<WireMessage> {
        vec![WireMessage::new(Role::User, "What is CRISPR?")]
    }

    #[tokio::test]
    async fn missing_backend_returns_degraded_reply() {
        let gateway = CompletionGateway::new(None, &GatewayConfig::default());
        assert!(!gateway.is_available());

        let completion = gateway
            .complete(&messages(), &CompletionOptions::default())
            .await
            .expect("degraded completion");
        assert!(completion.degraded);
        assert_eq!(completion.text, DEGRADED_MESSAGE);
    }

    #[tokio::test]
    async fn identical_requests_hit_the_cache() {
        let backend = Arc::new(CountingBackend {
            calls: AtomicUsize::new(0),
        });
        let gateway = CompletionGateway::new(Some(backend.clone()), &GatewayConfig::default());

        let first = gateway
            .complete(&messages(), &CompletionOptions::default())
            .await
            .expect("first completion");
        let second = gateway
            .complete(&messages(), &CompletionOptions::default())
            .await
            .expect("second completion");

        assert!(!first.cached);
        assert!(second.cached);
        assert_eq!(second.text, first.text);
        // A cached reply costs nothing, so usage is not repeated.
        assert!(first.usage.is_some());
        assert!(second.usage.is_none());
        assert_eq!(backend.calls.load(Ordering::SeqCst), 1);
        assert_eq!(gateway.cache_len(), 1);
    }

    #[tokio::test]
    async fn option_overrides_produce_distinct_cache_entries() {
        let backend = Arc::new(CountingBackend {
            calls: AtomicUsize::new(0),
        });
        let gateway = CompletionGateway::new(Some(backend.clone()), &GatewayConfig::default());

        gateway
            .complete(&messages(), &CompletionOptions::default())
            .await
            .expect("default completion");
        gateway
            .complete(
                &messages(),
                &CompletionOptions {
                    temperature: Some(0.1),
                    ..Default::default()
                },
            )
            .await
            .expect("override completion");

        assert_eq!(backend.calls.load(Ordering::SeqCst), 2);
        assert_eq!(gateway.cache_len(), 2);
    }

    #[tokio::test]
    async fn auth_failure_degrades_instead_of_erroring() {
        let gateway =
            CompletionGateway::new(Some(Arc::new(RejectingBackend)), &GatewayConfig::default());
        assert!(gateway.is_available());

        let completion = gateway
            .complete(&messages(), &CompletionOptions::default())
            .await
            .expect("degraded completion");
        assert!(completion.degraded);
        assert_eq!(completion.text, DEGRADED_MESSAGE);
        assert!(!gateway.is_available());

        // Subsequent calls fast-fail without touching the backend.
        let completion = gateway
            .complete(&messages(), &CompletionOptions::default())
            .await
            .expect("degraded completion");
        assert!(completion.degraded);
    }

    #[tokio::test]
    async fn generate_text_wraps_a_single_turn() {
        let backend = Arc::new(CountingBackend {
            calls: AtomicUsize::new(0),
        });
        let gateway = CompletionGateway::new(Some(backend), &GatewayConfig::default());
        let text = gateway
            .generate_text("summarize this", Some("be terse"))
            .await
            .expect("text");
        assert_eq!(text, "a reply");
    }

    #[test]
    fn cache_key_is_stable_and_shape_sensitive() {
        let msgs = messages();
        let a = cache_key(&msgs, "m", 0.7, 1024);
        let b = cache_key(&msgs, "m", 0.7, 1024);
        let c = cache_key(&msgs, "m", 0.2, 1024);
        assert_eq!(a, b);
        assert_ne!(a, c);
    }
}
