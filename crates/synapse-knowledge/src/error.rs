//! Error types for domain source lookups.

/// Errors returned by domain collaborator fetches.
///
/// These never escape the retriever; a failed fetch contributes an empty
/// chunk set for that source and is logged.
#[derive(Debug, thiserror::Error)]
pub enum SourceError {
    /// The collaborator is unreachable.
    #[error("source unavailable: {0}")]
    Unavailable(String),
    /// The collaborator rejected or failed the lookup.
    #[error("lookup failed: {0}")]
    Lookup(String),
    /// IO error from a local collaborator.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    /// Malformed collaborator payload.
    #[error("decode error: {0}")]
    Decode(#[from] serde_json::Error),
}
