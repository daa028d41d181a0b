//! Durable session persistence using JSONL rollouts.

use chrono::{DateTime, Utc};
use log::{debug, info, warn};
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fs::{self, OpenOptions};
use std::io::{BufRead, BufReader, Write};
use std::path::{Path, PathBuf};
use synapse_protocol::{ContextHint, MessageId, SessionId};
use thiserror::Error;
use uuid::Uuid;

/// Persisted message record.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct MessageRecord {
    /// Message id.
    pub id: MessageId,
    /// Role name.
    pub role: String,
    /// Message content.
    pub content: String,
    /// Timestamp for the message.
    pub created_at: DateTime<Utc>,
    /// Free-form metadata.
    #[serde(default)]
    pub metadata: Value,
}

/// Persisted session record.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SessionRecord {
    /// Session identifier.
    pub id: SessionId,
    /// Owning user id.
    pub user_id: String,
    /// Session title.
    pub title: String,
    /// Sticky context captured at creation.
    pub context: Option<ContextHint>,
    /// Session creation timestamp.
    pub created_at: DateTime<Utc>,
    /// All messages in the session.
    pub messages: Vec<MessageRecord>,
}

/// Summary record used for listing sessions.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SessionSummaryRecord {
    /// Session identifier.
    pub id: SessionId,
    /// Owning user id.
    pub user_id: String,
    /// Session title.
    pub title: String,
    /// Total number of messages.
    pub message_count: usize,
    /// Session creation timestamp.
    pub created_at: DateTime<Utc>,
    /// Timestamp of the most recent message.
    pub updated_at: DateTime<Utc>,
}

/// Persistent store abstraction for sessions and messages.
pub trait SessionStateStore: Send + Sync {
    /// Record a new session creation.
    fn record_session(
        &self,
        session_id: SessionId,
        user_id: &str,
        title: &str,
        context: Option<&ContextHint>,
        created_at: DateTime<Utc>,
    ) -> Result<(), StateError>;
    /// Append a message to a session.
    fn append_message(
        &self,
        session_id: SessionId,
        message: &MessageRecord,
    ) -> Result<(), StateError>;
    /// Record a title change.
    fn record_title(&self, session_id: SessionId, title: &str) -> Result<(), StateError>;
    /// Load a session record by id.
    fn load_session(&self, session_id: SessionId) -> Result<Option<SessionRecord>, StateError>;
    /// List all session summaries.
    fn list_sessions(&self) -> Result<Vec<SessionSummaryRecord>, StateError>;
    /// Delete a session and its backing storage.
    fn delete_session(&self, session_id: SessionId) -> Result<bool, StateError>;
}

/// Errors returned by the state store.
#[derive(Debug, Error)]
pub enum StateError {
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("serialization error: {0}")]
    Serde(#[from] serde_json::Error),
    #[error("unsupported schema version: {0}")]
    UnsupportedSchema(u32),
    #[error("missing session metadata")]
    MissingMetadata,
    #[error("session already exists: {0}")]
    SessionExists(SessionId),
}

/// Internal JSONL event representation.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
enum RolloutEvent {
    SchemaVersion {
        version: u32,
    },
    SessionCreated {
        session_id: SessionId,
        user_id: String,
        title: String,
        context: Option<ContextHint>,
        created_at: DateTime<Utc>,
    },
    Message {
        session_id: SessionId,
        id: MessageId,
        role: String,
        content: String,
        created_at: DateTime<Utc>,
        #[serde(default)]
        metadata: Value,
    },
    TitleChanged {
        session_id: SessionId,
        title: String,
    },
}

#[derive(Default)]
struct RolloutState {
    version: Option<u32>,
    user_id: Option<String>,
    title: Option<String>,
    context: Option<ContextHint>,
    created_at: Option<DateTime<Utc>>,
    messages: Vec<MessageRecord>,
}

impl RolloutState {
    fn apply(&mut self, event: RolloutEvent) -> Result<(), StateError> {
        match event {
            RolloutEvent::SchemaVersion { version } => {
                self.version = Some(version);
                if version > 1 {
                    return Err(StateError::UnsupportedSchema(version));
                }
            }
            RolloutEvent::SessionCreated {
                user_id,
                title,
                context,
                created_at,
                ..
            } => {
                self.user_id = Some(user_id);
                self.title = Some(title);
                self.context = context;
                self.created_at = Some(created_at);
            }
            RolloutEvent::Message {
                id,
                role,
                content,
                created_at,
                metadata,
                ..
            } => {
                self.messages.push(MessageRecord {
                    id,
                    role,
                    content,
                    created_at,
                    metadata,
                });
            }
            RolloutEvent::TitleChanged { title, .. } => {
                self.title = Some(title);
            }
        }
        Ok(())
    }

    fn finish(self, session_id: SessionId) -> Result<SessionRecord, StateError> {
        let _ = self.version.ok_or(StateError::MissingMetadata)?;
        let user_id = self.user_id.ok_or(StateError::MissingMetadata)?;
        let title = self.title.ok_or(StateError::MissingMetadata)?;
        let created_at = self.created_at.ok_or(StateError::MissingMetadata)?;
        Ok(SessionRecord {
            id: session_id,
            user_id,
            title,
            context: self.context,
            created_at,
            messages: self.messages,
        })
    }
}

/// JSONL-backed state store implementation.
pub struct JsonlStateStore {
    /// Root directory for session rollouts.
    root: PathBuf,
    /// Serialize write access to rollout files.
    write_lock: Mutex<()>,
}

impl JsonlStateStore {
    /// Create a new JSONL store under the given root.
    pub fn new(root: impl AsRef<Path>) -> Result<Self, StateError> {
        let root = root.as_ref().to_path_buf();
        fs::create_dir_all(&root)?;
        info!("initialized JSONL state store (root={})", root.display());
        Ok(Self {
            root,
            write_lock: Mutex::new(()),
        })
    }

    /// Build the rollout file path for a session.
    fn rollout_path(&self, session_id: SessionId) -> PathBuf {
        self.root.join(format!("{session_id}.jsonl"))
    }

    /// Append an event to an existing rollout file.
    fn write_event(&self, session_id: SessionId, event: &RolloutEvent) -> Result<(), StateError> {
        let _guard = self.write_lock.lock();
        let path = self.rollout_path(session_id);
        let mut file = OpenOptions::new().create(true).append(true).open(path)?;
        let line = serde_json::to_string(event)?;
        writeln!(file, "{line}")?;
        Ok(())
    }

    /// Create a new rollout file and write the initial event.
    fn write_new_rollout(
        &self,
        session_id: SessionId,
        event: &RolloutEvent,
    ) -> Result<(), StateError> {
        let _guard = self.write_lock.lock();
        let path = self.rollout_path(session_id);
        if path.exists() {
            return Err(StateError::SessionExists(session_id));
        }
        let mut file = OpenOptions::new()
            .create_new(true)
            .write(true)
            .open(&path)?;
        let header = serde_json::to_string(&RolloutEvent::SchemaVersion { version: 1 })?;
        writeln!(file, "{header}")?;
        let line = serde_json::to_string(event)?;
        writeln!(file, "{line}")?;
        Ok(())
    }

    /// Read and reconstruct a session from its rollout file.
    fn read_rollout(&self, session_id: SessionId) -> Result<Option<SessionRecord>, StateError> {
        let path = self.rollout_path(session_id);
        if !path.exists() {
            return Ok(None);
        }
        let file = OpenOptions::new().read(true).open(&path)?;
        let reader = BufReader::new(file);
        let mut rollout = RolloutState::default();

        for line in reader.lines() {
            let line = line?;
            if line.trim().is_empty() {
                continue;
            }
            let event: RolloutEvent = serde_json::from_str(&line)?;
            rollout.apply(event)?;
        }
        Ok(Some(rollout.finish(session_id)?))
    }
}

impl SessionStateStore for JsonlStateStore {
    /// Record session creation as a rollout event.
    fn record_session(
        &self,
        session_id: SessionId,
        user_id: &str,
        title: &str,
        context: Option<&ContextHint>,
        created_at: DateTime<Utc>,
    ) -> Result<(), StateError> {
        info!(
            "recording session creation (session_id={}, user_id={})",
            session_id, user_id
        );
        let event = RolloutEvent::SessionCreated {
            session_id,
            user_id: user_id.to_string(),
            title: title.to_string(),
            context: context.cloned(),
            created_at,
        };
        self.write_new_rollout(session_id, &event)
    }

    /// Append a message event to a session rollout.
    fn append_message(
        &self,
        session_id: SessionId,
        message: &MessageRecord,
    ) -> Result<(), StateError> {
        debug!(
            "appending message event (session_id={}, role={}, content_len={})",
            session_id,
            message.role,
            message.content.len()
        );
        let event = RolloutEvent::Message {
            session_id,
            id: message.id,
            role: message.role.clone(),
            content: message.content.clone(),
            created_at: message.created_at,
            metadata: message.metadata.clone(),
        };
        self.write_event(session_id, &event)
    }

    /// Record a title change as a rollout event.
    fn record_title(&self, session_id: SessionId, title: &str) -> Result<(), StateError> {
        let event = RolloutEvent::TitleChanged {
            session_id,
            title: title.to_string(),
        };
        self.write_event(session_id, &event)
    }

    /// Load a session from the rollout file.
    fn load_session(&self, session_id: SessionId) -> Result<Option<SessionRecord>, StateError> {
        self.read_rollout(session_id)
    }

    /// List all sessions by scanning rollout files.
    fn list_sessions(&self) -> Result<Vec<SessionSummaryRecord>, StateError> {
        let mut summaries = Vec::new();
        for entry in fs::read_dir(&self.root)? {
            let entry = entry?;
            let path = entry.path();
            if path.extension().and_then(|ext| ext.to_str()) != Some("jsonl") {
                continue;
            }
            let file_name = match path.file_stem().and_then(|stem| stem.to_str()) {
                Some(name) => name,
                None => continue,
            };
            let session_id = match Uuid::parse_str(file_name) {
                Ok(id) => id,
                Err(_) => continue,
            };
            if let Some(record) = self.read_rollout(session_id)? {
                let updated_at = record
                    .messages
                    .last()
                    .map(|msg| msg.created_at)
                    .unwrap_or(record.created_at);
                summaries.push(SessionSummaryRecord {
                    id: record.id,
                    user_id: record.user_id,
                    title: record.title,
                    message_count: record.messages.len(),
                    created_at: record.created_at,
                    updated_at,
                });
            }
        }
        summaries.sort_by(|a, b| b.updated_at.cmp(&a.updated_at));
        Ok(summaries)
    }

    /// Delete the rollout file for a session.
    fn delete_session(&self, session_id: SessionId) -> Result<bool, StateError> {
        let path = self.rollout_path(session_id);
        if path.exists() {
            info!("deleting session rollout (session_id={})", session_id);
            fs::remove_file(path)?;
            Ok(true)
        } else {
            warn!("session rollout not found (session_id={})", session_id);
            Ok(false)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{JsonlStateStore, MessageRecord, SessionStateStore};
    use chrono::Utc;
    use pretty_assertions::assert_eq;
    use serde_json::{Value, json};
    use tempfile::tempdir;
    use uuid::Uuid;

    #[test]
    fn jsonl_state_store_round_trip() {
        let temp = tempdir().expect("tempdir");
        let store = JsonlStateStore::new(temp.path()).expect("store");
        let session_id = Uuid::new_v4();
        let created_at = Utc::now();
        store
            .record_session(session_id, "user-1", "first question", None, created_at)
            .expect("record session");

        let message = MessageRecord {
            id: Uuid::new_v4(),
            role: "user".to_string(),
            content: "hello".to_string(),
            created_at,
            metadata: Value::Null,
        };
        store
            .append_message(session_id, &message)
            .expect("append message");

        let record = store
            .load_session(session_id)
            .expect("load")
            .expect("record");
        assert_eq!(record.user_id, "user-1");
        assert_eq!(record.title, "first question");
        assert_eq!(record.messages, vec![message]);

        let summaries = store.list_sessions().expect("summaries");
        assert_eq!(summaries.len(), 1);
        assert_eq!(summaries[0].message_count, 1);

        assert_eq!(store.delete_session(session_id).expect("delete"), true);
        assert_eq!(
            store.load_session(session_id).expect("load after delete"),
            None
        );
    }

    #[test]
    fn title_changes_apply_in_order() {
        let temp = tempdir().expect("tempdir");
        let store = JsonlStateStore::new(temp.path()).expect("store");
        let session_id = Uuid::new_v4();
        store
            .record_session(session_id, "user-1", "draft", None, Utc::now())
            .expect("record session");
        store
            .record_title(session_id, "renamed")
            .expect("record title");

        let record = store
            .load_session(session_id)
            .expect("load")
            .expect("record");
        assert_eq!(record.title, "renamed");
    }

    #[test]
    fn message_metadata_round_trips() {
        let temp = tempdir().expect("tempdir");
        let store = JsonlStateStore::new(temp.path()).expect("store");
        let session_id = Uuid::new_v4();
        store
            .record_session(session_id, "user-1", "meta", None, Utc::now())
            .expect("record session");
        let message = MessageRecord {
            id: Uuid::new_v4(),
            role: "assistant".to_string(),
            content: "answer".to_string(),
            created_at: Utc::now(),
            metadata: json!({"model": "local-llm", "cached": true}),
        };
        store
            .append_message(session_id, &message)
            .expect("append message");

        let record = store
            .load_session(session_id)
            .expect("load")
            .expect("record");
        assert_eq!(record.messages[0].metadata["model"], "local-llm");
    }
}
