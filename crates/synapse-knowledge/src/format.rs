//! Context block rendering.

use crate::chunk::{KnowledgeChunk, SourceType};

/// Sentinel returned for an empty chunk set. The prompt assembler omits
/// the context block entirely when it sees this value.
pub const NO_CONTEXT: &str = "No additional context available.";

/// Render ranked chunks into a single bounded text block.
///
/// Each chunk becomes a `[SOURCE_TYPE]` header plus its content, separated
/// by blank lines. User-sourced chunks are moved ahead of all others while
/// preserving relative rank order, so personalization is never pushed out
/// of the window by a higher-scoring non-user chunk.
pub fn format_chunks(chunks: &[KnowledgeChunk]) -> String {
    if chunks.is_empty() {
        return NO_CONTEXT.to_string();
    }

    let mut ordered: Vec<&KnowledgeChunk> = Vec::with_capacity(chunks.len());
    ordered.extend(chunks.iter().filter(|c| c.source_type == SourceType::User));
    ordered.extend(chunks.iter().filter(|c| c.source_type != SourceType::User));

    ordered
        .iter()
        .map(|chunk| format!("[{}]\n{}", chunk.source_type.label(), chunk.content))
        .collect::<Vec<_>>()
        .join("\n\n")
}

#[cfg(test)]
mod tests {
    use super::{NO_CONTEXT, format_chunks};
    use crate::chunk::{KnowledgeChunk, SourceType};
    use pretty_assertions::assert_eq;

    #[test]
    fn empty_input_returns_sentinel() {
        assert_eq!(format_chunks(&[]), NO_CONTEXT);
    }

    #[test]
    fn user_chunks_lead_regardless_of_rank_position() {
        let chunks = vec![
            KnowledgeChunk::new("ledger note", "transaction:abc", SourceType::Transaction),
            KnowledgeChunk::new("profile line", "user_profile", SourceType::User),
            KnowledgeChunk::new("kb line", "kb:help", SourceType::System),
        ];
        let block = format_chunks(&chunks);
        let first_header = block.lines().next().expect("header");
        assert_eq!(first_header, "[USER]");
        assert!(block.contains("[TRANSACTION]\nledger note"));
        assert!(block.contains("[SYSTEM]\nkb line"));
    }

    #[test]
    fn chunks_are_blank_line_separated() {
        let chunks = vec![
            KnowledgeChunk::new("one", "kb:a", SourceType::System),
            KnowledgeChunk::new("two", "kb:b", SourceType::System),
        ];
        assert_eq!(format_chunks(&chunks), "[SYSTEM]\none\n\n[SYSTEM]\ntwo");
    }
}
