//! Owner-scoped session store with optional durable persistence.

use crate::error::SynapseCoreError;
use crate::state::{MessageRecord, SessionStateStore};
use crate::types::{ChatSession, Message, Role, SessionSummary, default_title};
use chrono::Utc;
use log::{debug, info, warn};
use parking_lot::RwLock;
use std::collections::HashMap;
use std::sync::Arc;
use synapse_protocol::{ContextHint, SessionId};
use uuid::Uuid;

/// In-memory session store, optionally backed by a durable state store.
///
/// All lookups are scoped to the owning user id. A session owned by one
/// identity is invisible to every other identity, including the anonymous
/// one.
pub struct SessionStore {
    sessions: RwLock<HashMap<SessionId, ChatSession>>,
    state: Option<Arc<dyn SessionStateStore>>,
}

impl SessionStore {
    /// Create a purely in-memory store.
    pub fn in_memory() -> Self {
        Self {
            sessions: RwLock::new(HashMap::new()),
            state: None,
        }
    }

    /// Create a store backed by durable state, hydrating existing sessions.
    pub fn with_state(state: Arc<dyn SessionStateStore>) -> Result<Self, SynapseCoreError> {
        let mut sessions = HashMap::new();
        let summaries = state
            .list_sessions()
            .map_err(|err| SynapseCoreError::State(err.to_string()))?;
        for summary in summaries {
            match state.load_session(summary.id) {
                Ok(Some(record)) => {
                    let messages: Vec<Message> = record
                        .messages
                        .into_iter()
                        .map(|msg| Message {
                            id: msg.id,
                            role: Role::parse(&msg.role),
                            content: msg.content,
                            created_at: msg.created_at,
                            metadata: msg.metadata,
                        })
                        .collect();
                    let last_message_at = messages
                        .last()
                        .map(|msg| msg.created_at)
                        .unwrap_or(record.created_at);
                    sessions.insert(
                        record.id,
                        ChatSession {
                            id: record.id,
                            user_id: record.user_id,
                            title: record.title,
                            messages,
                            context: record.context,
                            created_at: record.created_at,
                            last_message_at,
                        },
                    );
                }
                Ok(None) => {}
                Err(err) => {
                    warn!(
                        "skipping unreadable session rollout (session_id={}, error={})",
                        summary.id, err
                    );
                }
            }
        }
        info!("hydrated session store (sessions={})", sessions.len());
        Ok(Self {
            sessions: RwLock::new(sessions),
            state: Some(state),
        })
    }

    /// Create a new session owned by the given user.
    pub fn create(
        &self,
        user_id: &str,
        title: &str,
        context: Option<ContextHint>,
    ) -> Result<ChatSession, SynapseCoreError> {
        let now = Utc::now();
        let session = ChatSession {
            id: Uuid::new_v4(),
            user_id: user_id.to_string(),
            title: title.to_string(),
            messages: Vec::new(),
            context,
            created_at: now,
            last_message_at: now,
        };
        if let Some(state) = &self.state {
            state
                .record_session(
                    session.id,
                    user_id,
                    title,
                    session.context.as_ref(),
                    session.created_at,
                )
                .map_err(|err| SynapseCoreError::State(err.to_string()))?;
        }
        info!(
            "created session (session_id={}, user_id={})",
            session.id, user_id
        );
        self.sessions.write().insert(session.id, session.clone());
        Ok(session)
    }

    /// Append a message to a session owned by the given user.
    ///
    /// First-message-creates-session semantics: an unknown session id is
    /// created on the spot, titled from the message content. A session id
    /// owned by another user is rejected as unknown.
    pub fn append(
        &self,
        session_id: SessionId,
        user_id: &str,
        message: Message,
    ) -> Result<(), SynapseCoreError> {
        let exists = {
            let sessions = self.sessions.read();
            match sessions.get(&session_id) {
                Some(session) if session.user_id == user_id => true,
                Some(_) => return Err(SynapseCoreError::UnknownSession(session_id)),
                None => false,
            }
        };
        if !exists {
            let now = message.created_at;
            let title = default_title(&message.content);
            if let Some(state) = &self.state {
                state
                    .record_session(session_id, user_id, &title, None, now)
                    .map_err(|err| SynapseCoreError::State(err.to_string()))?;
            }
            info!(
                "created session on first write (session_id={}, user_id={})",
                session_id, user_id
            );
            self.sessions.write().insert(
                session_id,
                ChatSession {
                    id: session_id,
                    user_id: user_id.to_string(),
                    title,
                    messages: Vec::new(),
                    context: None,
                    created_at: now,
                    last_message_at: now,
                },
            );
        }
        if let Some(state) = &self.state {
            // Persist before mutating memory so the durable log never lags.
            let record = MessageRecord {
                id: message.id,
                role: message.role.as_str().to_string(),
                content: message.content.clone(),
                created_at: message.created_at,
                metadata: message.metadata.clone(),
            };
            state
                .append_message(session_id, &record)
                .map_err(|err| SynapseCoreError::State(err.to_string()))?;
        }
        let mut sessions = self.sessions.write();
        let session = sessions
            .get_mut(&session_id)
            .filter(|session| session.user_id == user_id)
            .ok_or(SynapseCoreError::UnknownSession(session_id))?;
        session.last_message_at = message.created_at;
        session.messages.push(message);
        debug!(
            "appended message (session_id={}, messages={})",
            session_id,
            session.messages.len()
        );
        Ok(())
    }

    /// Fetch a session by id, scoped to the owner.
    pub fn get(&self, session_id: SessionId, user_id: &str) -> Option<ChatSession> {
        self.sessions
            .read()
            .get(&session_id)
            .filter(|session| session.user_id == user_id)
            .cloned()
    }

    /// Return the most recent `limit` messages in chronological order.
    pub fn history(
        &self,
        session_id: SessionId,
        user_id: &str,
        limit: usize,
    ) -> Result<Vec<Message>, SynapseCoreError> {
        let sessions = self.sessions.read();
        let session = sessions
            .get(&session_id)
            .filter(|session| session.user_id == user_id)
            .ok_or(SynapseCoreError::UnknownSession(session_id))?;
        let skip = session.messages.len().saturating_sub(limit);
        Ok(session.messages[skip..].to_vec())
    }

    /// List the user's sessions, most recently active first.
    pub fn list(&self, user_id: &str) -> Vec<SessionSummary> {
        let sessions = self.sessions.read();
        let mut summaries: Vec<SessionSummary> = sessions
            .values()
            .filter(|session| session.user_id == user_id)
            .map(|session| SessionSummary {
                id: session.id,
                user_id: session.user_id.clone(),
                title: session.title.clone(),
                message_count: session.messages.len(),
                created_at: session.created_at,
                last_message_at: session.last_message_at,
            })
            .collect();
        summaries.sort_by(|a, b| b.last_message_at.cmp(&a.last_message_at));
        summaries
    }

    /// Delete a session owned by the given user; `false` when not visible.
    pub fn delete(&self, session_id: SessionId, user_id: &str) -> Result<bool, SynapseCoreError> {
        let owned = {
            let sessions = self.sessions.read();
            sessions
                .get(&session_id)
                .map(|session| session.user_id == user_id)
                .unwrap_or(false)
        };
        if !owned {
            return Ok(false);
        }
        if let Some(state) = &self.state {
            state
                .delete_session(session_id)
                .map_err(|err| SynapseCoreError::State(err.to_string()))?;
        }
        self.sessions.write().remove(&session_id);
        info!(
            "deleted session (session_id={}, user_id={})",
            session_id, user_id
        );
        Ok(true)
    }

    /// Rename a session owned by the given user.
    pub fn rename(
        &self,
        session_id: SessionId,
        user_id: &str,
        title: &str,
    ) -> Result<(), SynapseCoreError> {
        self.owned(session_id, user_id)?;
        if let Some(state) = &self.state {
            state
                .record_title(session_id, title)
                .map_err(|err| SynapseCoreError::State(err.to_string()))?;
        }
        let mut sessions = self.sessions.write();
        let session = sessions
            .get_mut(&session_id)
            .filter(|session| session.user_id == user_id)
            .ok_or(SynapseCoreError::UnknownSession(session_id))?;
        session.title = title.to_string();
        Ok(())
    }

    /// Number of sessions held in memory, across all users.
    pub fn len(&self) -> usize {
        self.sessions.read().len()
    }

    /// Whether the store holds no sessions.
    pub fn is_empty(&self) -> bool {
        self.sessions.read().is_empty()
    }

    fn owned(&self, session_id: SessionId, user_id: &str) -> Result<(), SynapseCoreError> {
        let sessions = self.sessions.read();
        sessions
            .get(&session_id)
            .filter(|session| session.user_id == user_id)
            .map(|_| ())
            .ok_or(SynapseCoreError::UnknownSession(session_id))
    }
}

#[cfg(test)]
mod tests {
    use super::SessionStore;
    use crate::types::Message;
    use pretty_assertions::assert_eq;
    use uuid::Uuid;

    #[test]
    fn history_returns_chronological_tail() {
        let store = SessionStore::in_memory();
        let session = store.create("user-1", "tail", None).expect("create");
        for index in 0..5 {
            store
                .append(session.id, "user-1", Message::user(format!("m{index}")))
                .expect("append");
        }

        let tail = store.history(session.id, "user-1", 3).expect("history");
        let contents: Vec<&str> = tail.iter().map(|msg| msg.content.as_str()).collect();
        assert_eq!(contents, vec!["m2", "m3", "m4"]);
    }

    #[test]
    fn sessions_are_invisible_to_other_users() {
        let store = SessionStore::in_memory();
        let session = store.create("alice", "private", None).expect("create");

        assert!(store.get(session.id, "bob").is_none());
        assert!(store.history(session.id, "bob", 10).is_err());
        assert_eq!(store.delete(session.id, "bob").expect("delete"), false);
        assert!(store.get(session.id, "alice").is_some());
    }

    #[test]
    fn list_sorts_by_recent_activity() {
        let store = SessionStore::in_memory();
        let first = store.create("user-1", "first", None).expect("create");
        let second = store.create("user-1", "second", None).expect("create");
        store
            .append(first.id, "user-1", Message::user("later activity"))
            .expect("append");

        let summaries = store.list("user-1");
        assert_eq!(summaries.len(), 2);
        assert_eq!(summaries[0].id, first.id);
        assert_eq!(summaries[1].id, second.id);
    }

    #[test]
    fn first_write_creates_the_session_with_a_derived_title() {
        let store = SessionStore::in_memory();
        let session_id = Uuid::new_v4();
        store
            .append(session_id, "user-1", Message::user("How do wallets work?"))
            .expect("first write");

        let session = store.get(session_id, "user-1").expect("created session");
        assert_eq!(session.title, "How do wallets work?");
        assert_eq!(session.messages.len(), 1);
    }

    #[test]
    fn append_to_another_users_session_fails() {
        let store = SessionStore::in_memory();
        let session = store.create("alice", "private", None).expect("create");
        let err = store
            .append(session.id, "bob", Message::user("hello"))
            .expect_err("foreign session");
        assert!(err.to_string().contains("unknown session"));
    }

    #[test]
    fn rename_updates_title() {
        let store = SessionStore::in_memory();
        let session = store.create("user-1", "draft", None).expect("create");
        store
            .rename(session.id, "user-1", "renamed")
            .expect("rename");
        assert_eq!(store.get(session.id, "user-1").expect("get").title, "renamed");
    }
}
