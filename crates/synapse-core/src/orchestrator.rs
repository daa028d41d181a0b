//! Orchestrates one assistant turn end to end.

use crate::error::SynapseCoreError;
use crate::feedback::{FeedbackDetails, FeedbackRecord, FeedbackRecorder, FeedbackStats};
use crate::gateway::{CompletionGateway, CompletionOptions};
use crate::prompt::PromptAssembler;
use crate::sessions::SessionStore;
use crate::types::{ChatSession, Message, SessionSummary, default_title};
use log::{info, warn};
use serde_json::{Value, json};
use std::sync::Arc;
use synapse_config::SynapseConfig;
use synapse_knowledge::{KnowledgeRetriever, format_chunks};
use synapse_protocol::{
    ANONYMOUS_USER, CallerIdentity, ChatRequest, ContextHint, ContextScope, FeedbackKind,
    MessageId, Notifier, NotifierEvent, SessionId,
};

/// Reply stored nowhere and returned when the assistant turn fails after
/// the user's message was already persisted.
const APOLOGY_MESSAGE: &str =
    "Something went wrong while preparing a response. Your message was saved, please try again.";

/// Result of one assistant turn.
#[derive(Debug, Clone)]
pub struct ChatOutcome {
    /// Session the turn ran in (newly created when the request had none).
    pub session_id: SessionId,
    /// Id of the persisted assistant message; absent when the turn failed
    /// after the user message was saved.
    pub message_id: Option<MessageId>,
    /// Text to show the user.
    pub response: String,
    /// Failure description for turns that degraded into an apology.
    pub error: Option<String>,
    /// Turn metadata (model, latency, cache and degradation flags).
    pub metadata: Value,
}

/// Coordinates sessions, retrieval, prompt assembly, and completion.
pub struct Orchestrator {
    config: SynapseConfig,
    gateway: Arc<CompletionGateway>,
    retriever: KnowledgeRetriever,
    sessions: Arc<SessionStore>,
    assembler: PromptAssembler,
    feedback: FeedbackRecorder,
    notifier: Arc<dyn Notifier>,
}

impl Orchestrator {
    /// Wire an orchestrator from its collaborators.
    pub fn new(
        config: SynapseConfig,
        gateway: Arc<CompletionGateway>,
        retriever: KnowledgeRetriever,
        sessions: Arc<SessionStore>,
        notifier: Arc<dyn Notifier>,
    ) -> Self {
        let assembler = PromptAssembler::new(&config.persona);
        Self {
            config,
            gateway,
            retriever,
            sessions,
            assembler,
            feedback: FeedbackRecorder::new(),
            notifier,
        }
    }

    /// Run one assistant turn.
    ///
    /// The user message is persisted before any fallible downstream work,
    /// so a failed turn never loses what the user typed. Failures after
    /// that point surface as an apology outcome rather than an error.
    pub async fn handle_message(
        &self,
        request: ChatRequest,
        caller: &CallerIdentity,
    ) -> Result<ChatOutcome, SynapseCoreError> {
        let content = request.content.trim();
        if content.is_empty() {
            return Err(SynapseCoreError::Validation(
                "message content must not be empty".to_string(),
            ));
        }
        let user_id = caller.user_id().unwrap_or(ANONYMOUS_USER);

        let session = self.resolve_session(&request, user_id, content)?;
        let session_id = session.id;

        let user_message = Message::user(content);
        let user_message_id = user_message.id;
        self.sessions.append(session_id, user_id, user_message)?;

        self.notifier
            .notify(user_id, NotifierEvent::AssistantTyping { session_id });

        let hint = effective_hint(&request.hint, session.context.as_ref());
        let chunks = self.retriever.retrieve(content, &hint, caller).await;
        let context = format_chunks(&chunks);

        // One extra slot because the just-appended user message is part of
        // the tail and is sent separately as the final prompt message.
        // The user message is already persisted, so a failed read here
        // degrades into an apology like any other post-persist failure.
        let history: Vec<Message> = match self.sessions.history(
            session_id,
            user_id,
            self.config.history.limit + 1,
        ) {
            Ok(messages) => messages
                .into_iter()
                .filter(|msg| msg.id != user_message_id)
                .collect(),
            Err(err) => {
                warn!("history read failed after persist (session_id={session_id}, err={err})");
                return Ok(apology(session_id, err.to_string()));
            }
        };

        let messages = self.assembler.assemble(&context, &history, content);
        let completion = match self
            .gateway
            .complete(&messages, &CompletionOptions::default())
            .await
        {
            Ok(completion) => completion,
            Err(err) => {
                warn!("assistant turn failed after persist (session_id={session_id}, err={err})");
                return Ok(apology(session_id, err.to_string()));
            }
        };

        let metadata = json!({
            "model": completion.model,
            "latency_ms": completion.latency.as_millis() as u64,
            "cached": completion.cached,
            "degraded": completion.degraded,
        });
        let assistant = Message::assistant(&completion.text).with_metadata(metadata.clone());
        let message_id = assistant.id;
        if let Err(err) = self.sessions.append(session_id, user_id, assistant) {
            warn!("failed to persist assistant reply (session_id={session_id}, err={err})");
            return Ok(apology(session_id, err.to_string()));
        }

        self.notifier.notify(
            user_id,
            NotifierEvent::AssistantResponded {
                session_id,
                message_id,
            },
        );
        info!(
            "assistant turn completed (session_id={}, cached={}, degraded={})",
            session_id, completion.cached, completion.degraded
        );

        Ok(ChatOutcome {
            session_id,
            message_id: Some(message_id),
            response: completion.text,
            error: None,
            metadata,
        })
    }

    fn resolve_session(
        &self,
        request: &ChatRequest,
        user_id: &str,
        content: &str,
    ) -> Result<ChatSession, SynapseCoreError> {
        match request.session_id {
            Some(session_id) => self
                .sessions
                .get(session_id, user_id)
                .ok_or(SynapseCoreError::UnknownSession(session_id)),
            None => {
                let context = if request.hint.scope == ContextScope::General {
                    None
                } else {
                    Some(request.hint.clone())
                };
                self.sessions
                    .create(user_id, &default_title(content), context)
            }
        }
    }

    /// Create an empty session for the caller.
    pub fn create_session(
        &self,
        caller: &CallerIdentity,
        title: &str,
        context: Option<ContextHint>,
    ) -> Result<ChatSession, SynapseCoreError> {
        self.sessions
            .create(caller.user_id().unwrap_or(ANONYMOUS_USER), title, context)
    }

    /// List the caller's sessions, most recently active first.
    pub fn list_sessions(&self, caller: &CallerIdentity) -> Vec<SessionSummary> {
        self.sessions
            .list(caller.user_id().unwrap_or(ANONYMOUS_USER))
    }

    /// Fetch one of the caller's sessions.
    pub fn get_session(
        &self,
        session_id: SessionId,
        caller: &CallerIdentity,
    ) -> Option<ChatSession> {
        self.sessions
            .get(session_id, caller.user_id().unwrap_or(ANONYMOUS_USER))
    }

    /// Delete one of the caller's sessions; `false` when not visible.
    pub fn delete_session(
        &self,
        session_id: SessionId,
        caller: &CallerIdentity,
    ) -> Result<bool, SynapseCoreError> {
        self.sessions
            .delete(session_id, caller.user_id().unwrap_or(ANONYMOUS_USER))
    }

    /// Rename one of the caller's sessions.
    pub fn rename_session(
        &self,
        session_id: SessionId,
        caller: &CallerIdentity,
        title: &str,
    ) -> Result<(), SynapseCoreError> {
        self.sessions
            .rename(session_id, caller.user_id().unwrap_or(ANONYMOUS_USER), title)
    }

    /// Record typed feedback for an assistant message.
    pub fn submit_feedback(
        &self,
        session_id: SessionId,
        message_id: MessageId,
        caller: &CallerIdentity,
        kind: FeedbackKind,
        details: FeedbackDetails,
    ) -> Result<FeedbackRecord, SynapseCoreError> {
        self.feedback.submit(
            session_id,
            message_id,
            caller.user_id().unwrap_or(ANONYMOUS_USER),
            kind,
            details,
        )
    }

    /// Record feedback given a raw kind string from a client.
    pub fn submit_raw_feedback(
        &self,
        session_id: SessionId,
        message_id: MessageId,
        caller: &CallerIdentity,
        kind: &str,
        details: FeedbackDetails,
    ) -> Result<FeedbackRecord, SynapseCoreError> {
        self.feedback.submit_raw(
            session_id,
            message_id,
            caller.user_id().unwrap_or(ANONYMOUS_USER),
            kind,
            details,
        )
    }

    /// Aggregate feedback counts across the caller's submissions.
    pub fn feedback_stats(&self, caller: &CallerIdentity) -> FeedbackStats {
        self.feedback
            .stats_for(caller.user_id().unwrap_or(ANONYMOUS_USER))
    }

    /// Whether the completion backend is currently reachable.
    pub fn gateway_available(&self) -> bool {
        self.gateway.is_available()
    }
}

/// Outcome for a turn that failed after the user message was persisted.
fn apology(session_id: SessionId, error: String) -> ChatOutcome {
    ChatOutcome {
        session_id,
        message_id: None,
        response: APOLOGY_MESSAGE.to_string(),
        error: Some(error),
        metadata: Value::Null,
    }
}

/// A sticky session context overrides a general request hint, so a session
/// opened from a record page stays scoped to that record on follow-ups.
fn effective_hint(request_hint: &ContextHint, session_context: Option<&ContextHint>) -> ContextHint {
    if request_hint.scope == ContextScope::General {
        if let Some(context) = session_context {
            return context.clone();
        }
    }
    request_hint.clone()
}

#[cfg(test)]
mod tests {
    use super::effective_hint;
    use pretty_assertions::assert_eq;
    use synapse_protocol::ContextHint;

    #[test]
    fn session_context_wins_over_general_request_hint() {
        let sticky = ContextHint::gene_analysis("rec-9");
        let effective = effective_hint(&ContextHint::general(), Some(&sticky));
        assert_eq!(effective, sticky);
    }

    #[test]
    fn explicit_request_hint_wins_over_session_context() {
        let sticky = ContextHint::gene_analysis("rec-9");
        let explicit = ContextHint::lab_monitor("lab-3");
        let effective = effective_hint(&explicit, Some(&sticky));
        assert_eq!(effective, explicit);
    }
}
