//! Core data types shared across the orchestration API.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::str::FromStr;
use synapse_protocol::{ContextHint, MessageId, SessionId};
use uuid::Uuid;

/// Characters kept when deriving a session title from a first message.
const TITLE_PREFIX_LEN: usize = 50;

/// Message stored in a session transcript.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Message {
    /// Unique id within the session.
    pub id: MessageId,
    /// Role that produced the message.
    pub role: Role,
    /// Message content.
    pub content: String,
    /// Timestamp for the message; ordering authority is append sequence.
    pub created_at: DateTime<Utc>,
    /// Free-form metadata (model used, latency, context hint echo).
    #[serde(default)]
    pub metadata: Value,
}

impl Message {
    /// Build a message for the given role with fresh id and timestamp.
    pub fn new(role: Role, content: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            role,
            content: content.into(),
            created_at: Utc::now(),
            metadata: Value::Null,
        }
    }

    /// Build a user message.
    pub fn user(content: impl Into<String>) -> Self {
        Self::new(Role::User, content)
    }

    /// Build an assistant message.
    pub fn assistant(content: impl Into<String>) -> Self {
        Self::new(Role::Assistant, content)
    }

    /// Attach metadata.
    pub fn with_metadata(mut self, metadata: Value) -> Self {
        self.metadata = metadata;
        self
    }
}

/// Speaker role for a message.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// System-generated message.
    System,
    /// User-authored message.
    User,
    /// Assistant-authored message.
    Assistant,
}

impl Role {
    /// Return the role as a lowercase string.
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::System => "system",
            Role::User => "user",
            Role::Assistant => "assistant",
        }
    }

    /// Parse a role from a lowercase string, defaulting unknowns to user.
    pub fn parse(value: &str) -> Self {
        if value == "system" {
            Role::System
        } else if value == "assistant" {
            Role::Assistant
        } else {
            Role::User
        }
    }
}

impl FromStr for Role {
    type Err = ();

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        Ok(Role::parse(value))
    }
}

/// Role/content pair sent to the language-model backend.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct WireMessage {
    /// Speaker role.
    pub role: Role,
    /// Message content.
    pub content: String,
}

impl WireMessage {
    /// Build a wire message.
    pub fn new(role: Role, content: impl Into<String>) -> Self {
        Self {
            role,
            content: content.into(),
        }
    }
}

/// Full conversation thread owned by one user.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ChatSession {
    /// Session identifier, immutable once created.
    pub id: SessionId,
    /// Owning identity; never readable or writable by another identity.
    pub user_id: String,
    /// Short label for session lists.
    pub title: String,
    /// Ordered messages; append order is chronological and authoritative.
    pub messages: Vec<Message>,
    /// Sticky metadata captured at creation (originating page, record id).
    pub context: Option<ContextHint>,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
    /// Timestamp of the last append; used to sort session lists.
    pub last_message_at: DateTime<Utc>,
}

/// Summary view of a session for listing.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SessionSummary {
    /// Session identifier.
    pub id: SessionId,
    /// Owning identity.
    pub user_id: String,
    /// Short label.
    pub title: String,
    /// Count of messages stored.
    pub message_count: usize,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
    /// Timestamp of the last append.
    pub last_message_at: DateTime<Utc>,
}

/// Derive a session title from the first user message.
pub fn default_title(content: &str) -> String {
    let trimmed = content.trim();
    if trimmed.chars().count() <= TITLE_PREFIX_LEN {
        return trimmed.to_string();
    }
    let prefix: String = trimmed.chars().take(TITLE_PREFIX_LEN).collect();
    format!("{}…", prefix.trim_end())
}

#[cfg(test)]
mod tests {
    use super::{Message, Role, default_title};
    use pretty_assertions::assert_eq;

    #[test]
    fn role_parses_and_formats() {
        assert_eq!(Role::parse("system"), Role::System);
        assert_eq!(Role::parse("assistant"), Role::Assistant);
        assert_eq!(Role::parse("user"), Role::User);
        assert_eq!(Role::parse("tool"), Role::User);
        assert_eq!(Role::System.as_str(), "system");
    }

    #[test]
    fn default_title_truncates_long_messages() {
        assert_eq!(default_title("  short question  "), "short question");
        let long = "x".repeat(80);
        let title = default_title(&long);
        assert_eq!(title.chars().count(), 51);
        assert!(title.ends_with('…'));
    }

    #[test]
    fn message_constructors_set_roles() {
        assert_eq!(Message::user("hi").role, Role::User);
        assert_eq!(Message::assistant("hello").role, Role::Assistant);
    }
}
