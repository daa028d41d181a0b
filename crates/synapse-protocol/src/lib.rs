//! Wire types shared across the Synapse assistant core.
//!
//! Holds the client-facing submission types, the normalized caller
//! identity, page context hints, and the push-notification interface.

mod notify;

pub use notify::{Notifier, NotifierEvent, NoopNotifier};

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use uuid::Uuid;

/// Unique identifier for a chat session.
pub type SessionId = Uuid;
/// Unique identifier for a message within a session.
pub type MessageId = Uuid;
/// Unique identifier for a feedback record.
pub type FeedbackId = Uuid;

/// Sentinel user id used by unauthenticated callers.
pub const ANONYMOUS_USER: &str = "anonymous";

/// Caller identity normalized once at the API boundary.
///
/// Downstream code matches on this instead of re-deriving the user id
/// from request shapes at every step.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "kind", content = "user_id")]
pub enum CallerIdentity {
    /// An authenticated user with a stable id.
    Authenticated(String),
    /// No credential, or the anonymous sentinel.
    Anonymous,
}

impl CallerIdentity {
    /// Normalize a raw user id into a caller identity.
    ///
    /// Empty strings and the `anonymous` sentinel map to `Anonymous`.
    pub fn normalize(raw: Option<&str>) -> Self {
        match raw {
            Some(id) if !id.trim().is_empty() && id != ANONYMOUS_USER => {
                CallerIdentity::Authenticated(id.to_string())
            }
            _ => CallerIdentity::Anonymous,
        }
    }

    /// Return the user id for authenticated callers.
    pub fn user_id(&self) -> Option<&str> {
        match self {
            CallerIdentity::Authenticated(id) => Some(id),
            CallerIdentity::Anonymous => None,
        }
    }

    /// True when the caller carries no usable identity.
    pub fn is_anonymous(&self) -> bool {
        matches!(self, CallerIdentity::Anonymous)
    }
}

/// Page context a query relates to, dispatched exhaustively by the retriever.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case", tag = "data_type")]
pub enum ContextScope {
    /// A specific gene analysis record.
    GeneAnalysis { record_id: String },
    /// A specific blockchain transaction.
    BlockchainTransaction { hash: String },
    /// A lab monitoring dashboard.
    LabMonitor { lab_id: String },
    /// No specific page context.
    #[default]
    General,
}

/// Caller-supplied context hint attached to a chat submission.
///
/// The scope drives retrieval dispatch; `extra` carries forward-compatible
/// page metadata that the core echoes into message metadata untouched.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct ContextHint {
    /// Typed page scope.
    #[serde(flatten)]
    pub scope: ContextScope,
    /// Open string-keyed extras from the originating page.
    #[serde(default, skip_serializing_if = "Map::is_empty")]
    pub extra: Map<String, Value>,
}

impl ContextHint {
    /// Hint with no page scope.
    pub fn general() -> Self {
        Self::default()
    }

    /// Hint scoped to one gene analysis record.
    pub fn gene_analysis(record_id: impl Into<String>) -> Self {
        Self {
            scope: ContextScope::GeneAnalysis {
                record_id: record_id.into(),
            },
            extra: Map::new(),
        }
    }

    /// Hint scoped to one blockchain transaction.
    pub fn blockchain_transaction(hash: impl Into<String>) -> Self {
        Self {
            scope: ContextScope::BlockchainTransaction { hash: hash.into() },
            extra: Map::new(),
        }
    }

    /// Hint scoped to one lab dashboard.
    pub fn lab_monitor(lab_id: impl Into<String>) -> Self {
        Self {
            scope: ContextScope::LabMonitor {
                lab_id: lab_id.into(),
            },
            extra: Map::new(),
        }
    }
}

/// A single chat submission from a client.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatRequest {
    /// Target session; a missing id creates a session lazily.
    #[serde(default)]
    pub session_id: Option<SessionId>,
    /// User message text.
    pub content: String,
    /// Page context hint for retrieval.
    #[serde(default)]
    pub hint: ContextHint,
}

impl ChatRequest {
    /// Build a request for a new session.
    pub fn new(content: impl Into<String>) -> Self {
        Self {
            session_id: None,
            content: content.into(),
            hint: ContextHint::general(),
        }
    }

    /// Target an existing session.
    pub fn in_session(mut self, session_id: SessionId) -> Self {
        self.session_id = Some(session_id);
        self
    }

    /// Attach a context hint.
    pub fn with_hint(mut self, hint: ContextHint) -> Self {
        self.hint = hint;
        self
    }
}

/// Kind of feedback a user can leave on an assistant message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FeedbackKind {
    /// Positive rating.
    ThumbsUp,
    /// Negative rating.
    ThumbsDown,
    /// Detailed feedback with a reason or comment.
    Specific,
}

impl FeedbackKind {
    /// Parse a wire string, rejecting anything outside the enumerated kinds.
    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "thumbs_up" => Some(FeedbackKind::ThumbsUp),
            "thumbs_down" => Some(FeedbackKind::ThumbsDown),
            "specific" => Some(FeedbackKind::Specific),
            _ => None,
        }
    }

    /// Return the kind as its wire string.
    pub fn as_str(&self) -> &'static str {
        match self {
            FeedbackKind::ThumbsUp => "thumbs_up",
            FeedbackKind::ThumbsDown => "thumbs_down",
            FeedbackKind::Specific => "specific",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{ANONYMOUS_USER, CallerIdentity, ContextHint, ContextScope, FeedbackKind};
    use pretty_assertions::assert_eq;

    #[test]
    fn caller_identity_normalizes_sentinels() {
        assert_eq!(CallerIdentity::normalize(None), CallerIdentity::Anonymous);
        assert_eq!(
            CallerIdentity::normalize(Some("")),
            CallerIdentity::Anonymous
        );
        assert_eq!(
            CallerIdentity::normalize(Some(ANONYMOUS_USER)),
            CallerIdentity::Anonymous
        );
        assert_eq!(
            CallerIdentity::normalize(Some("user-7")),
            CallerIdentity::Authenticated("user-7".to_string())
        );
    }

    #[test]
    fn context_hint_round_trips_tagged_scope() {
        let hint = ContextHint::gene_analysis("rec-42");
        let json = serde_json::to_value(&hint).expect("serialize");
        assert_eq!(json["data_type"], "gene_analysis");
        assert_eq!(json["record_id"], "rec-42");

        let parsed: ContextHint = serde_json::from_value(json).expect("deserialize");
        assert_eq!(parsed.scope, ContextScope::GeneAnalysis {
            record_id: "rec-42".to_string()
        });
    }

    #[test]
    fn feedback_kind_rejects_unknown_values() {
        assert_eq!(FeedbackKind::parse("thumbs_up"), Some(FeedbackKind::ThumbsUp));
        assert_eq!(FeedbackKind::parse("stars"), None);
        assert_eq!(FeedbackKind::ThumbsDown.as_str(), "thumbs_down");
    }
}
