use async_trait::async_trait;
use parking_lot::Mutex;
use synapse_core::gateway::{BackendError, CompletionBackend, TokenUsage};
use synapse_core::types::WireMessage;

/// Backend that always returns the same text.
#[derive(Debug, Clone)]
pub struct FixedBackend {
    response: String,
}

impl FixedBackend {
    pub fn new(response: impl Into<String>) -> Self {
        Self {
            response: response.into(),
        }
    }
}

#[async_trait]
impl CompletionBackend for FixedBackend {
    fn default_model(&self) -> &str {
        "fixed-model"
    }

    async fn complete(
        &self,
        _messages: &[WireMessage],
        _model: &str,
        _temperature: f64,
        _max_tokens: u32,
    ) -> Result<(String, Option<TokenUsage>), BackendError> {
        Ok((self.response.clone(), None))
    }
}

/// Backend that always fails with a remote error.
#[derive(Debug, Clone, Default)]
pub struct FailingBackend;

#[async_trait]
impl CompletionBackend for FailingBackend {
    fn default_model(&self) -> &str {
        "failing-model"
    }

    async fn complete(
        &self,
        _messages: &[WireMessage],
        _model: &str,
        _temperature: f64,
        _max_tokens: u32,
    ) -> Result<(String, Option<TokenUsage>), BackendError> {
        Err(BackendError::Remote("mock backend failure".to_string()))
    }
}

/// Backend that always rejects credentials.
#[derive(Debug, Clone, Default)]
pub struct AuthFailingBackend;

#[async_trait]
impl CompletionBackend for AuthFailingBackend {
    fn default_model(&self) -> &str {
        "auth-failing-model"
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

/// Backend that records every request it sees.
#[derive(Default)]
pub struct RecordingBackend {
    response: String,
    calls: Mutex<Vec<Vec<WireMessage>>>,
}

impl RecordingBackend {
    pub fn new(response: impl Into<String>) -> Self {
        Self {
            response: response.into(),
            calls: Mutex::new(Vec::new()),
        }
    }

    /// Number of completion calls made so far.
    pub fn call_count(&self) -> usize {
        self.calls.lock().len()
    }

    /// All recorded request message lists.
    pub fn requests(&self) -> Vec<Vec<WireMessage>> {
        self.calls.lock().clone()
    }

    /// Messages from the most recent request.
    pub fn last_request(&self) -> Option<Vec<WireMessage>> {
        self.calls.lock().last().cloned()
    }
}

#[async_trait]
impl CompletionBackend for RecordingBackend {
    fn default_model(&self) -> &str {
        "recording-model"
    }

    async fn complete(
        &self,
        messages: &[WireMessage],
        _model: &str,
        _temperature: f64,
        _max_tokens: u32,
    ) -> Result<(String, Option<TokenUsage>), BackendError> {
        self.calls.lock().push(messages.to_vec());
        Ok((
            self.response.clone(),
            Some(TokenUsage {
                prompt_tokens: 10,
                completion_tokens: 5,
            }),
        ))
    }
}
