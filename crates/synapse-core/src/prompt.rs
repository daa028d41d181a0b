//! Assembles the message list sent to the completion backend.

use crate::types::{Message, Role, WireMessage};
use synapse_config::PersonaConfig;
use synapse_knowledge::NO_CONTEXT;

/// Builds the final prompt from persona, retrieved context, and history.
///
/// Ordering is fixed: persona system message, context system message (when
/// any context was retrieved), prior history oldest-first, then the current
/// user message last.
pub struct PromptAssembler {
    persona: String,
}

impl PromptAssembler {
    /// Build an assembler from persona configuration.
    pub fn new(persona: &PersonaConfig) -> Self {
        let mut text = format!(
            "You are {}, an assistant for a genetics research platform. You help \
researchers interpret gene analyses, track blockchain transactions for their \
records, and monitor lab conditions. Use the provided context when it is \
relevant and mention which record or source you drew on. Say so plainly when \
you do not know.",
            persona.name
        );
        if let Some(extra) = &persona.additional_instructions {
            text.push_str("\n\n");
            text.push_str(extra);
        }
        Self { persona: text }
    }

    /// Assemble the wire messages for one turn.
    pub fn assemble(
        &self,
        context: &str,
        history: &[Message],
        user_message: &str,
    ) -> Vec<WireMessage> {
        let mut messages = Vec::with_capacity(history.len() + 3);
        messages.push(WireMessage::new(Role::System, self.persona.clone()));

        if !context.is_empty() && context != NO_CONTEXT {
            messages.push(WireMessage::new(
                Role::System,
                format!("Relevant context:\n\n{context}"),
            ));
        }

        for msg in history {
            // Stored system turns replay as assistant turns so the backend
            // never sees a third system voice mid-conversation.
            let role = match msg.role {
                Role::System => Role::Assistant,
                other => other,
            };
            messages.push(WireMessage::new(role, msg.content.clone()));
        }

        messages.push(WireMessage::new(Role::User, user_message.to_string()));
        messages
    }
}

#[cfg(test)]
mod tests {
    use super::PromptAssembler;
    use crate::types::{Message, Role};
    use pretty_assertions::assert_eq;
    use synapse_config::PersonaConfig;
    use synapse_knowledge::NO_CONTEXT;

    fn assembler() -> PromptAssembler {
        PromptAssembler::new(&PersonaConfig::default())
    }

    #[test]
    fn assembles_in_fixed_order() {
        let history = vec![
            Message::user("earlier question"),
            Message::assistant("earlier answer"),
        ];
        let messages = assembler().assemble("[USER]\nProfile", &history, "new question");

        assert_eq!(messages.len(), 5);
        assert_eq!(messages[0].role, Role::System);
        assert!(messages[0].content.contains("Synapse"));
        assert_eq!(messages[1].role, Role::System);
        assert!(messages[1].content.contains("[USER]"));
        assert_eq!(messages[2].content, "earlier question");
        assert_eq!(messages[3].content, "earlier answer");
        assert_eq!(messages[4].role, Role::User);
        assert_eq!(messages[4].content, "new question");
    }

    #[test]
    fn skips_context_block_when_empty() {
        let messages = assembler().assemble(NO_CONTEXT, &[], "hello");
        assert_eq!(messages.len(), 2);
        assert_eq!(messages[1].role, Role::User);
    }

    #[test]
    fn history_system_turns_replay_as_assistant() {
        let history = vec![Message::new(Role::System, "service notice")];
        let messages = assembler().assemble(NO_CONTEXT, &history, "hello");
        assert_eq!(messages[1].role, Role::Assistant);
        assert_eq!(messages[1].content, "service notice");
    }

    #[test]
    fn additional_instructions_extend_persona() {
        let persona = PersonaConfig {
            name: "Synapse".to_string(),
            additional_instructions: Some("Always cite record ids.".to_string()),
        };
        let messages = PromptAssembler::new(&persona).assemble(NO_CONTEXT, &[], "hi");
        assert!(messages[0].content.contains("Always cite record ids."));
    }
}
