//! Records user feedback on assistant responses.

use crate::error::SynapseCoreError;
use chrono::{DateTime, Utc};
use log::info;
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use synapse_protocol::{FeedbackId, FeedbackKind, MessageId, SessionId};
use uuid::Uuid;

/// One stored feedback entry.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct FeedbackRecord {
    /// Feedback identifier.
    pub id: FeedbackId,
    /// Session the feedback belongs to.
    pub session_id: SessionId,
    /// Message the feedback targets.
    pub message_id: MessageId,
    /// Submitting user id.
    pub user_id: String,
    /// Feedback kind.
    pub kind: FeedbackKind,
    /// Optional reason, category, and comment.
    pub details: FeedbackDetails,
    /// Submission timestamp.
    pub created_at: DateTime<Utc>,
}

/// Details supplied with a feedback submission.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct FeedbackDetails {
    /// Short reason label.
    pub reason: Option<String>,
    /// Category the feedback falls under.
    pub category: Option<String>,
    /// Free-text comment.
    pub comment: Option<String>,
}

impl FeedbackDetails {
    /// Details carrying only a comment.
    pub fn comment(comment: impl Into<String>) -> Self {
        Self {
            comment: Some(comment.into()),
            ..Self::default()
        }
    }
}

/// Aggregate counts across a user's submissions.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct FeedbackStats {
    /// Total records.
    pub total: usize,
    /// Positive reactions.
    pub thumbs_up: usize,
    /// Negative reactions.
    pub thumbs_down: usize,
    /// Specific written feedback entries.
    pub specific: usize,
}

/// In-memory feedback log.
///
/// Entries are append-only. Repeat submissions against the same message
/// are kept as separate records rather than overwriting earlier ones.
#[derive(Default)]
pub struct FeedbackRecorder {
    records: RwLock<Vec<FeedbackRecord>>,
}

impl FeedbackRecorder {
    /// Create an empty recorder.
    pub fn new() -> Self {
        Self::default()
    }

    /// Record typed feedback for a message.
    pub fn submit(
        &self,
        session_id: SessionId,
        message_id: MessageId,
        user_id: &str,
        kind: FeedbackKind,
        details: FeedbackDetails,
    ) -> Result<FeedbackRecord, SynapseCoreError> {
        if kind == FeedbackKind::Specific
            && details
                .comment
                .as_deref()
                .map(str::trim)
                .unwrap_or_default()
                .is_empty()
        {
            return Err(SynapseCoreError::Validation(
                "specific feedback requires a comment".to_string(),
            ));
        }
        let record = FeedbackRecord {
            id: Uuid::new_v4(),
            session_id,
            message_id,
            user_id: user_id.to_string(),
            kind,
            details,
            created_at: Utc::now(),
        };
        info!(
            "recorded feedback (message_id={}, kind={})",
            message_id,
            kind.as_str()
        );
        self.records.write().push(record.clone());
        Ok(record)
    }

    /// Record feedback given a raw kind string, as received from clients.
    pub fn submit_raw(
        &self,
        session_id: SessionId,
        message_id: MessageId,
        user_id: &str,
        kind: &str,
        details: FeedbackDetails,
    ) -> Result<FeedbackRecord, SynapseCoreError> {
        let kind = FeedbackKind::parse(kind)
            .ok_or_else(|| SynapseCoreError::Validation(format!("unknown feedback kind: {kind}")))?;
        self.submit(session_id, message_id, user_id, kind, details)
    }

    /// All feedback recorded for one message.
    pub fn for_message(&self, message_id: MessageId) -> Vec<FeedbackRecord> {
        self.records
            .read()
            .iter()
            .filter(|record| record.message_id == message_id)
            .cloned()
            .collect()
    }

    /// Aggregate counts across one user's submissions.
    pub fn stats_for(&self, user_id: &str) -> FeedbackStats {
        let records = self.records.read();
        let mut stats = FeedbackStats::default();
        for record in records.iter() {
            if record.user_id != user_id {
                continue;
            }
            stats.total += 1;
            match record.kind {
                FeedbackKind::ThumbsUp => stats.thumbs_up += 1,
                FeedbackKind::ThumbsDown => stats.thumbs_down += 1,
                FeedbackKind::Specific => stats.specific += 1,
            }
        }
        stats
    }

    /// Total number of stored records.
    pub fn len(&self) -> usize {
        self.records.read().len()
    }

    /// Whether no feedback has been recorded.
    pub fn is_empty(&self) -> bool {
        self.records.read().is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::{FeedbackDetails, FeedbackRecorder};
    use pretty_assertions::assert_eq;
    use synapse_protocol::FeedbackKind;
    use uuid::Uuid;

    #[test]
    fn repeat_feedback_accumulates_instead_of_overwriting() {
        let recorder = FeedbackRecorder::new();
        let session_id = Uuid::new_v4();
        let message_id = Uuid::new_v4();

        recorder
            .submit(
                session_id,
                message_id,
                "user-1",
                FeedbackKind::ThumbsUp,
                FeedbackDetails::default(),
            )
            .expect("first");
        recorder
            .submit(
                session_id,
                message_id,
                "user-1",
                FeedbackKind::ThumbsDown,
                FeedbackDetails::default(),
            )
            .expect("second");

        assert_eq!(recorder.for_message(message_id).len(), 2);
        let stats = recorder.stats_for("user-1");
        assert_eq!(stats.total, 2);
        assert_eq!(stats.thumbs_up, 1);
        assert_eq!(stats.thumbs_down, 1);
    }

    #[test]
    fn specific_feedback_requires_a_comment() {
        let recorder = FeedbackRecorder::new();
        let err = recorder
            .submit(
                Uuid::new_v4(),
                Uuid::new_v4(),
                "user-1",
                FeedbackKind::Specific,
                FeedbackDetails::comment("  "),
            )
            .expect_err("missing comment");
        assert!(err.to_string().contains("requires a comment"));
    }

    #[test]
    fn raw_kind_strings_parse_or_fail_validation() {
        let recorder = FeedbackRecorder::new();
        let session_id = Uuid::new_v4();
        recorder
            .submit_raw(
                session_id,
                Uuid::new_v4(),
                "user-1",
                "thumbs_up",
                FeedbackDetails::default(),
            )
            .expect("valid kind");
        let err = recorder
            .submit_raw(
                session_id,
                Uuid::new_v4(),
                "user-1",
                "sideways",
                FeedbackDetails::default(),
            )
            .expect_err("invalid kind");
        assert!(err.to_string().contains("unknown feedback kind"));
    }
}
