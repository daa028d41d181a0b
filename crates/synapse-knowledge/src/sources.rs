//! Collaborator traits for the domain stores the retriever reads from.
//!
//! Transport is out of scope here; implementations may call HTTP services,
//! databases, or in-process stores. Every method is independently
//! fault-tolerant from the retriever's point of view.

use crate::error::SourceError;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use synapse_protocol::CallerIdentity;

/// Profile fields surfaced into user context.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProfileSummary {
    /// Display name.
    pub display_name: String,
    /// Contact handle (email or similar).
    pub contact: Option<String>,
    /// Theme or preference label.
    pub theme: Option<String>,
}

/// One gene analysis record summary.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GeneAnalysisSummary {
    /// Stable record id.
    pub record_id: String,
    /// Human-readable sequence label.
    pub sequence_label: String,
    /// Predicted editing efficiency in [0, 1].
    pub efficiency: f64,
    /// When the analysis ran.
    pub created_at: DateTime<Utc>,
}

/// One blockchain transaction summary.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TransactionSummary {
    /// Transaction hash.
    pub hash: String,
    /// Transaction kind (mint, transfer, log, ...).
    pub kind: String,
    /// Lifecycle status (pending, confirmed, failed).
    pub status: String,
    /// When the transaction was recorded.
    pub created_at: DateTime<Utc>,
}

/// Ownership-scoped view of a transaction lookup.
///
/// Non-owners receive the restricted variant rather than the full record;
/// full content never leaks across identities.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "visibility")]
pub enum TransactionView {
    /// Caller owns the transaction.
    Full(TransactionSummary),
    /// Reduced view for non-owners.
    Restricted { hash: String, status: String },
}

/// Severity of a lab alert.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AlertSeverity {
    Info,
    Warning,
    Critical,
}

/// An open alert on a lab dashboard.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LabAlert {
    /// Alert severity.
    pub severity: AlertSeverity,
    /// Alert message.
    pub message: String,
}

/// One sensor reading.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SensorReading {
    /// Sensor name (temperature, humidity, ...).
    pub sensor: String,
    /// Most recent value.
    pub value: f64,
    /// Unit for the value.
    pub unit: String,
    /// When the value was recorded.
    pub recorded_at: DateTime<Utc>,
}

/// Latest telemetry for a lab.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LabSnapshot {
    /// Lab identifier.
    pub lab_id: String,
    /// Most recent reading per sensor.
    pub readings: Vec<SensorReading>,
    /// Open alerts, most severe first.
    pub alerts: Vec<LabAlert>,
}

/// Identity context read surface.
#[async_trait]
pub trait ProfileSource: Send + Sync {
    /// Fetch profile summary fields, or None when unknown.
    async fn profile(&self, user_id: &str) -> Result<Option<ProfileSummary>, SourceError>;
}

/// Genetic record store read surface.
#[async_trait]
pub trait GeneSource: Send + Sync {
    /// Fetch the most recent analyses for a user, newest first.
    async fn recent_analyses(
        &self,
        user_id: &str,
        limit: usize,
    ) -> Result<Vec<GeneAnalysisSummary>, SourceError>;

    /// Fetch a single analysis by record id.
    async fn analysis(&self, record_id: &str)
    -> Result<Option<GeneAnalysisSummary>, SourceError>;
}

/// Transaction ledger read surface.
#[async_trait]
pub trait LedgerSource: Send + Sync {
    /// Fetch the most recent transactions for a user, newest first.
    async fn recent_transactions(
        &self,
        user_id: &str,
        limit: usize,
    ) -> Result<Vec<TransactionSummary>, SourceError>;

    /// Fetch one transaction by hash, honoring ownership visibility.
    async fn transaction(
        &self,
        hash: &str,
        caller: &CallerIdentity,
    ) -> Result<Option<TransactionView>, SourceError>;
}

/// Lab telemetry read surface.
#[async_trait]
pub trait TelemetrySource: Send + Sync {
    /// Fetch the latest readings and open alerts for a lab or user key.
    async fn snapshot(&self, lab_id: &str) -> Result<Option<LabSnapshot>, SourceError>;
}
