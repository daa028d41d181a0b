//! Relevance ordering for retrieved chunks.
//!
//! Scoring combines pre-assigned relevance, keyword overlap with the
//! query, and a normalized recency decay. Recency is an exponential decay
//! against the newest timestamp in the batch, not a raw epoch multiplier,
//! so a fresh low-relevance chunk cannot swamp the ordering.

use crate::chunk::KnowledgeChunk;
use chrono::{DateTime, Utc};
use std::cmp::Ordering;

/// Weight per matched query token.
const TOKEN_WEIGHT: f64 = 0.5;
/// Flat bonus when the chunk contains the full query as a substring.
const PHRASE_BONUS: f64 = 1.0;
/// Hours for the recency decay to fall to 1/e.
const DECAY_HOURS: f64 = 48.0;

/// Order chunks most-relevant first. Deterministic for identical inputs.
pub fn rank(chunks: Vec<KnowledgeChunk>, query: &str) -> Vec<KnowledgeChunk> {
    let query_lower = query.to_lowercase();
    let tokens: Vec<String> = query_lower
        .split(|c: char| !c.is_alphanumeric())
        .filter(|token| token.len() > 2)
        .map(str::to_string)
        .collect();
    let newest = chunks.iter().filter_map(|chunk| chunk.timestamp).max();

    let mut scored: Vec<(f64, KnowledgeChunk)> = chunks
        .into_iter()
        .map(|chunk| {
            let score = score_chunk(&chunk, &tokens, &query_lower, newest);
            (score, chunk)
        })
        .collect();

    scored.sort_by(|a, b| {
        b.0.total_cmp(&a.0)
            .then_with(|| compare_timestamps(b.1.timestamp, a.1.timestamp))
            .then_with(|| a.1.source.cmp(&b.1.source))
    });

    scored.into_iter().map(|(_, chunk)| chunk).collect()
}

fn score_chunk(
    chunk: &KnowledgeChunk,
    tokens: &[String],
    query_lower: &str,
    newest: Option<DateTime<Utc>>,
) -> f64 {
    let content = chunk.content.to_lowercase();
    let matched = tokens
        .iter()
        .filter(|token| content.contains(token.as_str()))
        .count() as f64;
    let mut keyword = matched * TOKEN_WEIGHT;
    if query_lower.len() > 2 && content.contains(query_lower) {
        keyword += PHRASE_BONUS;
    }

    if let (Some(timestamp), Some(newest)) = (chunk.timestamp, newest) {
        let age_hours = (newest - timestamp).num_minutes().max(0) as f64 / 60.0;
        let decay = (-age_hours / DECAY_HOURS).exp();
        keyword *= 0.5 + 0.5 * decay;
    }

    chunk.relevance.unwrap_or(0.0) + keyword
}

fn compare_timestamps(a: Option<DateTime<Utc>>, b: Option<DateTime<Utc>>) -> Ordering {
    match (a, b) {
        (Some(a), Some(b)) => a.cmp(&b),
        (Some(_), None) => Ordering::Greater,
        (None, Some(_)) => Ordering::Less,
        (None, None) => Ordering::Equal,
    }
}
