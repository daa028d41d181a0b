//! Retrieved context chunk model.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Origin category for a knowledge chunk.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SourceType {
    /// Personalized user context (profile, activity summaries).
    User,
    /// Gene analysis records.
    Gene,
    /// Blockchain transaction records.
    Transaction,
    /// Lab telemetry and alerts.
    Lab,
    /// Static knowledge base entries.
    System,
    /// Anything else.
    Other,
}

impl SourceType {
    /// Header label used when rendering a chunk into the context block.
    pub fn label(&self) -> &'static str {
        match self {
            SourceType::User => "USER",
            SourceType::Gene => "GENE",
            SourceType::Transaction => "TRANSACTION",
            SourceType::Lab => "LAB",
            SourceType::System => "SYSTEM",
            SourceType::Other => "OTHER",
        }
    }
}

/// One retrieved unit of context.
///
/// Chunks are created fresh on every retrieval call and discarded once the
/// request completes; they are never persisted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct KnowledgeChunk {
    /// Bounded text content.
    pub content: String,
    /// Stable identifier of the origin record, e.g. `gene:rec-42`.
    pub source: String,
    /// Origin category.
    pub source_type: SourceType,
    /// Recency signal when the origin record carries one.
    pub timestamp: Option<DateTime<Utc>>,
    /// Pre-assigned weight in [0, 1]; unscored chunks get ranked purely
    /// on keyword overlap and recency.
    pub relevance: Option<f64>,
}

impl KnowledgeChunk {
    /// Create a chunk with no timestamp or pre-assigned relevance.
    pub fn new(
        content: impl Into<String>,
        source: impl Into<String>,
        source_type: SourceType,
    ) -> Self {
        Self {
            content: content.into(),
            source: source.into(),
            source_type,
            timestamp: None,
            relevance: None,
        }
    }

    /// Attach a recency timestamp.
    pub fn with_timestamp(mut self, timestamp: DateTime<Utc>) -> Self {
        self.timestamp = Some(timestamp);
        self
    }

    /// Attach a pre-assigned relevance weight, clamped to [0, 1].
    pub fn with_relevance(mut self, relevance: f64) -> Self {
        self.relevance = Some(relevance.clamp(0.0, 1.0));
        self
    }

    /// Truncate content to at most `cap` characters, appending an ellipsis
    /// when anything was cut.
    pub fn cap_content(&mut self, cap: usize) {
        if self.content.chars().count() <= cap {
            return;
        }
        let truncated: String = self.content.chars().take(cap.saturating_sub(1)).collect();
        self.content = format!("{}…", truncated.trim_end());
    }
}

#[cfg(test)]
mod tests {
    use super::{KnowledgeChunk, SourceType};
    use pretty_assertions::assert_eq;

    #[test]
    fn cap_content_truncates_and_marks() {
        let mut chunk = KnowledgeChunk::new("a".repeat(500), "user_profile", SourceType::User);
        chunk.cap_content(100);
        assert_eq!(chunk.content.chars().count(), 100);
        assert!(chunk.content.ends_with('…'));

        let mut short = KnowledgeChunk::new("short", "user_profile", SourceType::User);
        short.cap_content(100);
        assert_eq!(short.content, "short");
    }

    #[test]
    fn with_relevance_clamps_to_unit_interval() {
        let chunk =
            KnowledgeChunk::new("x", "gene:rec-1", SourceType::Gene).with_relevance(1.7);
        assert_eq!(chunk.relevance, Some(1.0));
    }
}
