//! Push-notification channel interface.

use crate::{MessageId, SessionId};
use serde::{Deserialize, Serialize};

/// Events pushed to a user's channel during a turn.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case", tag = "type", content = "payload")]
pub enum NotifierEvent {
    /// The assistant started working on a reply.
    AssistantTyping { session_id: SessionId },
    /// The assistant finished a reply.
    AssistantResponded {
        session_id: SessionId,
        message_id: MessageId,
    },
}

/// Push channel used by the orchestrator for fire-and-forget events.
///
/// Implementations must not block; delivery failures are swallowed by the
/// channel, never surfaced into the pipeline. Absence of a subscribed
/// listener is not an error.
pub trait Notifier: Send + Sync {
    /// Deliver an event to the target user's channel.
    fn notify(&self, user_id: &str, event: NotifierEvent);
}

/// Notifier that drops every event, used when no push channel is wired.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopNotifier;

impl Notifier for NoopNotifier {
    fn notify(&self, _user_id: &str, _event: NotifierEvent) {}
}
