//! Prompt composition.
//!
//! Builds the ordered role-tagged message list sent upstream: exactly one
//! leading system entry carrying the character's fixed directive, the prior
//! turns of the conversation in creation order, then exactly one trailing
//! user entry with the new prompt.

use std::collections::BTreeMap;

use charla_types::chat::ChatMessage;
use charla_types::error::ChatError;
use charla_types::llm::{MessageRole, PromptMessage};

/// Maps character identifiers to their fixed system directives.
///
/// Populated from config at startup; lookups for unknown identifiers are
/// validation errors raised before any upstream call or persistence.
#[derive(Debug, Clone)]
pub struct CharacterRegistry {
    directives: BTreeMap<String, String>,
}

impl CharacterRegistry {
    pub fn new(directives: BTreeMap<String, String>) -> Self {
        Self { directives }
    }

    /// Look up the system directive for a character identifier.
    pub fn directive(&self, character: &str) -> Result<&str, ChatError> {
        self.directives
            .get(character)
            .map(String::as_str)
            .ok_or_else(|| ChatError::UnknownCharacter(character.to_string()))
    }

    pub fn len(&self) -> usize {
        self.directives.len()
    }

    pub fn is_empty(&self) -> bool {
        self.directives.is_empty()
    }
}

/// Compose the upstream message list for one exchange.
///
/// Prior messages are mirrored in their original order; any persisted role
/// other than `user` maps to `assistant` (the store only holds those two).
pub fn compose(directive: &str, prior: &[ChatMessage], prompt: &str) -> Vec<PromptMessage> {
    let mut messages = Vec::with_capacity(prior.len() + 2);
    messages.push(PromptMessage::new(MessageRole::System, directive));

    for msg in prior {
        let role = match msg.role {
            MessageRole::User => MessageRole::User,
            _ => MessageRole::Assistant,
        };
        messages.push(PromptMessage::new(role, msg.content.clone()));
    }

    messages.push(PromptMessage::new(MessageRole::User, prompt));
    messages
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use uuid::Uuid;

    fn registry() -> CharacterRegistry {
        let mut directives = BTreeMap::new();
        directives.insert("pirate".to_string(), "You are a pirate.".to_string());
        CharacterRegistry::new(directives)
    }

    fn message(role: MessageRole, content: &str) -> ChatMessage {
        ChatMessage {
            id: Uuid::now_v7(),
            conversation_id: Uuid::now_v7(),
            role,
            content: content.to_string(),
            created_at: Utc::now(),
        }
    }

    #[test]
    fn test_directive_lookup() {
        let registry = registry();
        assert_eq!(registry.directive("pirate").unwrap(), "You are a pirate.");
    }

    #[test]
    fn test_unknown_character_is_error() {
        let registry = registry();
        let err = registry.directive("ninja").unwrap_err();
        assert!(matches!(err, ChatError::UnknownCharacter(name) if name == "ninja"));
    }

    #[test]
    fn test_compose_empty_prior() {
        let messages = compose("You are a pirate.", &[], "Ahoy?");
        assert_eq!(messages.len(), 2);
        assert_eq!(messages[0].role, MessageRole::System);
        assert_eq!(messages[0].content, "You are a pirate.");
        assert_eq!(messages[1].role, MessageRole::User);
        assert_eq!(messages[1].content, "Ahoy?");
    }

    #[test]
    fn test_compose_mirrors_prior_turns_in_order() {
        let prior = vec![
            message(MessageRole::User, "Hello"),
            message(MessageRole::Assistant, "Hi there"),
            message(MessageRole::User, "How are you?"),
            message(MessageRole::Assistant, "Splendid"),
        ];
        let messages = compose("directive", &prior, "And now?");

        assert_eq!(messages.len(), 6);
        assert_eq!(messages[0].role, MessageRole::System);
        let roles: Vec<MessageRole> = messages[1..5].iter().map(|m| m.role).collect();
        assert_eq!(
            roles,
            vec![
                MessageRole::User,
                MessageRole::Assistant,
                MessageRole::User,
                MessageRole::Assistant
            ]
        );
        assert_eq!(messages[1].content, "Hello");
        assert_eq!(messages[4].content, "Splendid");
        assert_eq!(messages[5].role, MessageRole::User);
        assert_eq!(messages[5].content, "And now?");
    }

    #[test]
    fn test_compose_trailing_entry_is_new_prompt() {
        let prior = vec![message(MessageRole::User, "old")];
        let messages = compose("d", &prior, "new");
        let last = messages.last().unwrap();
        assert_eq!(last.role, MessageRole::User);
        assert_eq!(last.content, "new");
    }
}
