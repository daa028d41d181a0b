//! Knowledge retrieval across domain collaborators.
//!
//! Gathers personalized context, page-scoped records, and static knowledge
//! for one query. Every sub-fetch is independently fault-tolerant: a
//! failing collaborator contributes nothing and the rest proceed.

use crate::chunk::{KnowledgeChunk, SourceType};
use crate::error::SourceError;
use crate::kb;
use crate::rank::rank;
use crate::sources::{
    GeneAnalysisSummary, GeneSource, LabSnapshot, LedgerSource, ProfileSource, TelemetrySource,
    TransactionSummary, TransactionView,
};
use log::{debug, warn};
use std::sync::Arc;
use synapse_config::RetrievalConfig;
use synapse_protocol::{CallerIdentity, ContextHint, ContextScope};

const GENETICS_KEYWORDS: &[&str] = &[
    "crispr",
    "gene",
    "dna",
    "sequence",
    "prediction",
    "efficiency",
    "genetic",
    "analysis",
    "mutation",
];
const BLOCKCHAIN_KEYWORDS: &[&str] = &[
    "blockchain",
    "transaction",
    "hash",
    "ledger",
    "wallet",
    "token",
    "block",
];
const LAB_KEYWORDS: &[&str] = &[
    "lab",
    "sensor",
    "temperature",
    "humidity",
    "alert",
    "equipment",
    "monitor",
];

/// Knowledge-base chunks pulled per retrieval.
const KB_LIMIT: usize = 2;

/// Domain collaborator handles injected into the retriever.
#[derive(Clone)]
pub struct DomainSources {
    /// Identity context store.
    pub profile: Arc<dyn ProfileSource>,
    /// Genetic record store.
    pub genes: Arc<dyn GeneSource>,
    /// Transaction ledger store.
    pub ledger: Arc<dyn LedgerSource>,
    /// Lab telemetry store.
    pub telemetry: Arc<dyn TelemetrySource>,
}

/// Pulls, ranks, and bounds context chunks for one query.
#[derive(Clone)]
pub struct KnowledgeRetriever {
    sources: DomainSources,
    config: RetrievalConfig,
}

impl KnowledgeRetriever {
    /// Create a retriever over the given collaborators.
    pub fn new(sources: DomainSources, config: RetrievalConfig) -> Self {
        Self { sources, config }
    }

    /// Retrieve at most `retrieval.max_chunks` ranked chunks for a query.
    ///
    /// Never fails; total collaborator loss yields an empty vector.
    /// Anonymous callers receive only system chunks.
    pub async fn retrieve(
        &self,
        query: &str,
        hint: &ContextHint,
        caller: &CallerIdentity,
    ) -> Vec<KnowledgeChunk> {
        let mut chunks = Vec::new();

        if let Some(user_id) = caller.user_id() {
            let (profile, genes, transactions) = tokio::join!(
                self.fetch_profile(user_id),
                self.fetch_gene_activity(user_id),
                self.fetch_transaction_activity(user_id),
            );
            chunks.extend(profile);
            chunks.extend(genes);
            chunks.extend(transactions);
            chunks.extend(self.fetch_scoped(query, hint, caller, user_id).await);
        }

        chunks.extend(kb::lookup(query, KB_LIMIT));

        debug!(
            "retrieval gathered chunks (query_len={}, candidates={}, anonymous={})",
            query.len(),
            chunks.len(),
            caller.is_anonymous()
        );

        let mut ranked = rank(chunks, query);
        ranked.truncate(self.config.max_chunks);
        for chunk in &mut ranked {
            chunk.cap_content(self.config.chunk_char_cap);
        }
        ranked
    }

    /// Fetch the record the page context points at, or fall back to
    /// keyword-directed lookups for general queries.
    async fn fetch_scoped(
        &self,
        query: &str,
        hint: &ContextHint,
        caller: &CallerIdentity,
        user_id: &str,
    ) -> Vec<KnowledgeChunk> {
        match &hint.scope {
            ContextScope::GeneAnalysis { record_id } => self.fetch_gene_record(record_id).await,
            ContextScope::BlockchainTransaction { hash } => {
                self.fetch_transaction_record(hash, caller).await
            }
            ContextScope::LabMonitor { lab_id } => self.fetch_lab_snapshot(lab_id).await,
            ContextScope::General => self.fetch_by_keywords(query, user_id).await,
        }
    }

    /// Keyword detection against the query for unscoped pages.
    async fn fetch_by_keywords(&self, query: &str, user_id: &str) -> Vec<KnowledgeChunk> {
        let query_lower = query.to_lowercase();
        let mut chunks = Vec::new();

        if matches_any(&query_lower, GENETICS_KEYWORDS) {
            chunks.extend(self.fetch_recent_genes(user_id).await);
        }
        if matches_any(&query_lower, BLOCKCHAIN_KEYWORDS) {
            chunks.extend(self.fetch_recent_transactions(user_id).await);
        }
        if matches_any(&query_lower, LAB_KEYWORDS) {
            chunks.extend(self.fetch_lab_snapshot(user_id).await);
        }
        chunks
    }

    async fn fetch_profile(&self, user_id: &str) -> Vec<KnowledgeChunk> {
        match self.sources.profile.profile(user_id).await {
            Ok(Some(profile)) => {
                let mut content = format!("Profile: {}", profile.display_name);
                if let Some(contact) = &profile.contact {
                    content.push_str(&format!(", contact {contact}"));
                }
                if let Some(theme) = &profile.theme {
                    content.push_str(&format!(", prefers {theme}"));
                }
                vec![
                    KnowledgeChunk::new(content, "user_profile", SourceType::User)
                        .with_relevance(0.9),
                ]
            }
            Ok(None) => Vec::new(),
            Err(err) => absorb("profile", err),
        }
    }

    async fn fetch_gene_activity(&self, user_id: &str) -> Vec<KnowledgeChunk> {
        match self
            .sources
            .genes
            .recent_analyses(user_id, self.config.recent_limit)
            .await
        {
            Ok(analyses) if !analyses.is_empty() => {
                let newest = analyses
                    .iter()
                    .map(|analysis| analysis.created_at)
                    .max()
                    .unwrap_or_else(chrono::Utc::now);
                let lines: Vec<String> = analyses
                    .iter()
                    .map(|analysis| {
                        format!(
                            "{} scored {:.2} on {}",
                            analysis.sequence_label,
                            analysis.efficiency,
                            analysis.created_at.format("%Y-%m-%d")
                        )
                    })
                    .collect();
                let content = format!(
                    "Recent gene analyses (predicted efficiency): {}",
                    lines.join("; ")
                );
                vec![
                    KnowledgeChunk::new(content, "user_activity:genes", SourceType::User)
                        .with_relevance(0.8)
                        .with_timestamp(newest),
                ]
            }
            Ok(_) => Vec::new(),
            Err(err) => absorb("gene activity", err),
        }
    }

    async fn fetch_transaction_activity(&self, user_id: &str) -> Vec<KnowledgeChunk> {
        match self
            .sources
            .ledger
            .recent_transactions(user_id, self.config.recent_limit)
            .await
        {
            Ok(transactions) if !transactions.is_empty() => {
                let newest = transactions
                    .iter()
                    .map(|tx| tx.created_at)
                    .max()
                    .unwrap_or_else(chrono::Utc::now);
                let lines: Vec<String> = transactions
                    .iter()
                    .map(|tx| format!("{} {} ({})", tx.kind, tx.hash, tx.status))
                    .collect();
                let content = format!("Recent blockchain activity: {}", lines.join("; "));
                vec![
                    KnowledgeChunk::new(content, "user_activity:transactions", SourceType::User)
                        .with_relevance(0.8)
                        .with_timestamp(newest),
                ]
            }
            Ok(_) => Vec::new(),
            Err(err) => absorb("transaction activity", err),
        }
    }

    async fn fetch_gene_record(&self, record_id: &str) -> Vec<KnowledgeChunk> {
        match self.sources.genes.analysis(record_id).await {
            Ok(Some(analysis)) => vec![gene_chunk(&analysis).with_relevance(0.95)],
            Ok(None) => Vec::new(),
            Err(err) => absorb("gene record", err),
        }
    }

    async fn fetch_recent_genes(&self, user_id: &str) -> Vec<KnowledgeChunk> {
        match self
            .sources
            .genes
            .recent_analyses(user_id, self.config.recent_limit)
            .await
        {
            Ok(analyses) => analyses.iter().map(gene_chunk).collect(),
            Err(err) => absorb("recent genes", err),
        }
    }

    async fn fetch_transaction_record(
        &self,
        hash: &str,
        caller: &CallerIdentity,
    ) -> Vec<KnowledgeChunk> {
        match self.sources.ledger.transaction(hash, caller).await {
            Ok(Some(TransactionView::Full(tx))) => vec![transaction_chunk(&tx).with_relevance(0.95)],
            Ok(Some(TransactionView::Restricted { hash, status })) => {
                let content = format!(
                    "Transaction {hash}: status {status}. Full details are only visible to the owner."
                );
                vec![
                    KnowledgeChunk::new(
                        content,
                        format!("transaction:{hash}"),
                        SourceType::Transaction,
                    )
                    .with_relevance(0.6),
                ]
            }
            Ok(None) => Vec::new(),
            Err(err) => absorb("transaction record", err),
        }
    }

    async fn fetch_recent_transactions(&self, user_id: &str) -> Vec<KnowledgeChunk> {
        match self
            .sources
            .ledger
            .recent_transactions(user_id, self.config.recent_limit)
            .await
        {
            Ok(transactions) => transactions.iter().map(transaction_chunk).collect(),
            Err(err) => absorb("recent transactions", err),
        }
    }

    async fn fetch_lab_snapshot(&self, lab_id: &str) -> Vec<KnowledgeChunk> {
        match self.sources.telemetry.snapshot(lab_id).await {
            Ok(Some(snapshot)) => vec![lab_chunk(&snapshot)],
            Ok(None) => Vec::new(),
            Err(err) => absorb("lab telemetry", err),
        }
    }
}

/// Log and swallow a domain fetch failure.
fn absorb(source: &str, err: SourceError) -> Vec<KnowledgeChunk> {
    warn!("domain fetch failed, continuing without it (source={source}, err={err})");
    Vec::new()
}

fn matches_any(query_lower: &str, keywords: &[&str]) -> bool {
    keywords.iter().any(|keyword| query_lower.contains(keyword))
}

fn gene_chunk(analysis: &GeneAnalysisSummary) -> KnowledgeChunk {
    let content = format!(
        "Gene analysis {} ({}): predicted efficiency {:.2}, recorded {}",
        analysis.record_id,
        analysis.sequence_label,
        analysis.efficiency,
        analysis.created_at.format("%Y-%m-%d")
    );
    KnowledgeChunk::new(
        content,
        format!("gene:{}", analysis.record_id),
        SourceType::Gene,
    )
    .with_timestamp(analysis.created_at)
}

fn transaction_chunk(tx: &TransactionSummary) -> KnowledgeChunk {
    let content = format!(
        "Transaction {}: {} {}, recorded {}",
        tx.hash,
        tx.kind,
        tx.status,
        tx.created_at.format("%Y-%m-%d")
    );
    KnowledgeChunk::new(content, format!("transaction:{}", tx.hash), SourceType::Transaction)
        .with_timestamp(tx.created_at)
}

fn lab_chunk(snapshot: &LabSnapshot) -> KnowledgeChunk {
    let readings: Vec<String> = snapshot
        .readings
        .iter()
        .map(|reading| format!("{} {}{}", reading.sensor, reading.value, reading.unit))
        .collect();
    let mut content = format!("Lab {} telemetry: {}", snapshot.lab_id, readings.join(", "));
    if snapshot.alerts.is_empty() {
        content.push_str("; no open alerts");
    } else {
        let alerts: Vec<String> = snapshot
            .alerts
            .iter()
            .map(|alert| format!("{:?}: {}", alert.severity, alert.message))
            .collect();
        content.push_str(&format!("; open alerts: {}", alerts.join("; ")));
    }
    let newest = snapshot.readings.iter().map(|r| r.recorded_at).max();
    let mut chunk = KnowledgeChunk::new(
        content,
        format!("lab:{}", snapshot.lab_id),
        SourceType::Lab,
    );
    if let Some(newest) = newest {
        chunk = chunk.with_timestamp(newest);
    }
    chunk
}
