//! Knowledge retrieval, ranking, and formatting for Synapse.
//!
//! Pulls typed context chunks from the domain collaborators (profile,
//! gene records, transaction ledger, lab telemetry, static knowledge),
//! orders them by relevance and recency, and renders them into the
//! bounded context block used for prompt assembly.

pub mod chunk;
pub mod error;
pub mod format;
pub mod kb;
pub mod rank;
pub mod retriever;
pub mod sources;

/// Chunk model and source typing.
pub use chunk::{KnowledgeChunk, SourceType};
/// Domain source error type.
pub use error::SourceError;
/// Context block rendering.
pub use format::{NO_CONTEXT, format_chunks};
/// Relevance ordering.
pub use rank::rank;
/// Retrieval entry point and source wiring.
pub use retriever::{DomainSources, KnowledgeRetriever};
/// Collaborator traits and summary records.
pub use sources::{
    AlertSeverity, GeneAnalysisSummary, GeneSource, LabAlert, LabSnapshot, LedgerSource,
    ProfileSource, ProfileSummary, SensorReading, TelemetrySource, TransactionSummary,
    TransactionView,
};
