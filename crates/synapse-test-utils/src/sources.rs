use async_trait::async_trait;
use synapse_knowledge::sources::{
    GeneAnalysisSummary, GeneSource, LabSnapshot, LedgerSource, ProfileSource, ProfileSummary,
    TelemetrySource, TransactionSummary, TransactionView,
};
use synapse_knowledge::{DomainSources, SourceError};
use synapse_protocol::CallerIdentity;

/// Profile source over a fixed summary.
#[derive(Debug, Clone, Default)]
pub struct StubProfileSource {
    pub profile: Option<ProfileSummary>,
    pub fail: bool,
}

impl StubProfileSource {
    pub fn with_profile(profile: ProfileSummary) -> Self {
        Self {
            profile: Some(profile),
            fail: false,
        }
    }
}

#[async_trait]
impl ProfileSource for StubProfileSource {
    async fn profile(&self, _user_id: &str) -> Result<Option<ProfileSummary>, SourceError> {
        if self.fail {
            return Err(SourceError::Unavailable("stub profile down".into()));
        }
        Ok(self.profile.clone())
    }
}

/// Gene source over a fixed analysis list.
#[derive(Debug, Clone, Default)]
pub struct StubGeneSource {
    pub analyses: Vec<GeneAnalysisSummary>,
    pub fail: bool,
}

impl StubGeneSource {
    pub fn with_analyses(analyses: Vec<GeneAnalysisSummary>) -> Self {
        Self {
            analyses,
            fail: false,
        }
    }
}

#[async_trait]
impl GeneSource for StubGeneSource {
    async fn recent_analyses(
        &self,
        _user_id: &str,
        limit: usize,
    ) -> Result<Vec<GeneAnalysisSummary>, SourceError> {
        if self.fail {
            return Err(SourceError::Unavailable("stub gene store down".into()));
        }
        Ok(self.analyses.iter().take(limit).cloned().collect())
    }

    async fn analysis(&self, record_id: &str) -> Result<Option<GeneAnalysisSummary>, SourceError> {
        if self.fail {
            return Err(SourceError::Unavailable("stub gene store down".into()));
        }
        Ok(self
            .analyses
            .iter()
            .find(|analysis| analysis.record_id == record_id)
            .cloned())
    }
}

/// Ledger source over a fixed transaction list.
///
/// Single-transaction lookups return the restricted view unless the
/// caller id matches `owner_id`.
#[derive(Debug, Clone, Default)]
pub struct StubLedgerSource {
    pub transactions: Vec<TransactionSummary>,
    pub owner_id: Option<String>,
    pub fail: bool,
}

impl StubLedgerSource {
    pub fn with_transactions(transactions: Vec<TransactionSummary>) -> Self {
        Self {
            transactions,
            owner_id: None,
            fail: false,
        }
    }

    pub fn owned_by(mut self, owner_id: impl Into<String>) -> Self {
        self.owner_id = Some(owner_id.into());
        self
    }
}

#[async_trait]
impl LedgerSource for StubLedgerSource {
    async fn recent_transactions(
        &self,
        _user_id: &str,
        limit: usize,
    ) -> Result<Vec<TransactionSummary>, SourceError> {
        if self.fail {
            return Err(SourceError::Unavailable("stub ledger down".into()));
        }
        Ok(self.transactions.iter().take(limit).cloned().collect())
    }

    async fn transaction(
        &self,
        hash: &str,
        caller: &CallerIdentity,
    ) -> Result<Option<TransactionView>, SourceError> {
        if self.fail {
            return Err(SourceError::Unavailable("stub ledger down".into()));
        }
        let found = self.transactions.iter().find(|tx| tx.hash == hash).cloned();
        Ok(found.map(|tx| {
            let owned = match &self.owner_id {
                Some(owner) => caller.user_id() == Some(owner.as_str()),
                None => true,
            };
            if owned {
                TransactionView::Full(tx)
            } else {
                TransactionView::Restricted {
                    hash: tx.hash,
                    status: tx.status,
                }
            }
        }))
    }
}

/// Telemetry source over a fixed snapshot.
#[derive(Debug, Clone, Default)]
pub struct StubTelemetrySource {
    pub snapshot: Option<LabSnapshot>,
    pub fail: bool,
}

impl StubTelemetrySource {
    pub fn with_snapshot(snapshot: LabSnapshot) -> Self {
        Self {
            snapshot: Some(snapshot),
            fail: false,
        }
    }
}

#[async_trait]
impl TelemetrySource for StubTelemetrySource {
    async fn snapshot(&self, _lab_id: &str) -> Result<Option<LabSnapshot>, SourceError> {
        if self.fail {
            return Err(SourceError::Unavailable("stub telemetry down".into()));
        }
        Ok(self.snapshot.clone())
    }
}

/// Bundle empty stubs into a `DomainSources` for wiring tests.
pub fn stub_sources() -> DomainSources {
    use std::sync::Arc;
    DomainSources {
        profile: Arc::new(StubProfileSource::default()),
        genes: Arc::new(StubGeneSource::default()),
        ledger: Arc::new(StubLedgerSource::default()),
        telemetry: Arc::new(StubTelemetrySource::default()),
    }
}
