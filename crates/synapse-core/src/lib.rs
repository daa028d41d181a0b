//! Core orchestration for the Synapse assistant.
//!
//! Coordinates the completion gateway, knowledge retrieval, session
//! storage, prompt assembly, and feedback recording behind a single
//! orchestrator entry point.

pub mod error;
pub mod feedback;
pub mod gateway;
pub mod orchestrator;
pub mod prompt;
pub mod sessions;
pub mod state;
pub mod types;

/// Crate error type.
pub use error::SynapseCoreError;
/// Feedback recording.
pub use feedback::{FeedbackDetails, FeedbackRecord, FeedbackRecorder, FeedbackStats};
/// Completion gateway and backend abstraction.
pub use gateway::{
    BackendError, Completion, CompletionBackend, CompletionGateway, CompletionOptions,
    DEGRADED_MESSAGE, GatewayError, HttpBackend, TokenUsage,
};
/// Turn orchestration.
pub use orchestrator::{ChatOutcome, Orchestrator};
/// Prompt assembly.
pub use prompt::PromptAssembler;
/// Session storage facade.
pub use sessions::SessionStore;
/// Durable session persistence.
pub use state::{
    JsonlStateStore, MessageRecord, SessionRecord, SessionStateStore, SessionSummaryRecord,
    StateError,
};
/// Core data types.
pub use types::{ChatSession, Message, Role, SessionSummary, WireMessage, default_title};
