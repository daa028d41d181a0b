//! Error types for the core orchestration crate.

use synapse_protocol::SessionId;
use thiserror::Error;

/// Errors returned by core orchestration operations.
#[derive(Debug, Error)]
pub enum SynapseCoreError {
    /// Session id is unknown or not visible to the caller.
    #[error("unknown session: {0}")]
    UnknownSession(SessionId),
    /// A required field was missing or malformed; rejected before side effects.
    #[error("validation error: {0}")]
    Validation(String),
    /// Session state store error.
    #[error("state error: {0}")]
    State(String),
    /// Completion gateway error.
    #[error("gateway error: {0}")]
    Gateway(String),
    /// IO error.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}
