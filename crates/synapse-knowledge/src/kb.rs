//! Built-in knowledge base consulted on every retrieval.

use crate::chunk::{KnowledgeChunk, SourceType};

struct KbEntry {
    topic: &'static str,
    keywords: &'static [&'static str],
    content: &'static str,
}

const ENTRIES: &[KbEntry] = &[
    KbEntry {
        topic: "crispr_efficiency",
        keywords: &["crispr", "efficiency", "prediction", "score", "editing"],
        content: "CRISPR editing predictions score guide sequences from 0.0 to 1.0; \
                  values above 0.7 indicate a high-efficiency edit, 0.4 to 0.7 moderate, \
                  and below 0.4 a poor candidate worth redesigning.",
    },
    KbEntry {
        topic: "gene_analysis",
        keywords: &["gene", "dna", "sequence", "genetic", "analysis", "mutation"],
        content: "Gene analyses run a transformer model over the submitted DNA sequence \
                  and report a predicted editing outcome together with the sequence \
                  embedding used for comparison against prior runs.",
    },
    KbEntry {
        topic: "transaction_lifecycle",
        keywords: &["blockchain", "transaction", "hash", "ledger", "block", "confirmed"],
        content: "Analysis results are anchored to the ledger in three stages: pending \
                  while queued, confirmed once mined into a block, and failed if the \
                  network rejects the submission. The transaction hash is the permanent \
                  reference for an anchored record.",
    },
    KbEntry {
        topic: "wallet",
        keywords: &["wallet", "token", "balance", "transfer"],
        content: "Each account holds a platform wallet used to pay for anchoring and to \
                  receive reward tokens for contributed datasets.",
    },
    KbEntry {
        topic: "lab_thresholds",
        keywords: &["lab", "sensor", "temperature", "humidity", "alert", "equipment", "monitor"],
        content: "Lab monitors alert when incubator temperature leaves the 36.5-37.5 C \
                  band, humidity drops below 40%, or a sensor stops reporting for more \
                  than five minutes.",
    },
    KbEntry {
        topic: "platform_help",
        keywords: &[],
        content: "Synapse can explain your gene analyses, blockchain activity, and lab \
                  telemetry. Ask about a specific record or open its page and ask from \
                  there for focused answers.",
    },
];

/// Return knowledge-base chunks whose keywords match the query.
///
/// The keyword-less fallback entry is included only when nothing else
/// matched, so general questions still get a system chunk.
pub fn lookup(query: &str, limit: usize) -> Vec<KnowledgeChunk> {
    let query = query.to_lowercase();
    let mut chunks: Vec<KnowledgeChunk> = ENTRIES
        .iter()
        .filter(|entry| {
            !entry.keywords.is_empty()
                && entry.keywords.iter().any(|keyword| query.contains(keyword))
        })
        .take(limit)
        .map(chunk_for)
        .collect();

    if chunks.is_empty()
        && let Some(fallback) = ENTRIES.iter().find(|entry| entry.keywords.is_empty())
    {
        chunks.push(chunk_for(fallback));
    }
    chunks
}

fn chunk_for(entry: &KbEntry) -> KnowledgeChunk {
    KnowledgeChunk::new(
        entry.content,
        format!("kb:{}", entry.topic),
        SourceType::System,
    )
}

#[cfg(test)]
mod tests {
    use super::lookup;
    use pretty_assertions::assert_eq;

    #[test]
    fn lookup_matches_domain_vocabulary() {
        let chunks = lookup("how do I read a CRISPR efficiency score?", 3);
        assert!(!chunks.is_empty());
        assert_eq!(chunks[0].source, "kb:crispr_efficiency");
    }

    #[test]
    fn lookup_falls_back_to_platform_help() {
        let chunks = lookup("what can you do?", 3);
        assert_eq!(chunks.len(), 1);
        assert_eq!(chunks[0].source, "kb:platform_help");
    }

    #[test]
    fn lookup_honors_limit() {
        let chunks = lookup("blockchain transaction hash for my gene sequence", 1);
        assert_eq!(chunks.len(), 1);
    }
}
