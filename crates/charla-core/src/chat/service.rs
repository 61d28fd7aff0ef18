//! Conversation service orchestrating transcript persistence.
//!
//! Records both sides of an exchange: the user message before the upstream
//! call, and the accumulated assistant message once -- and only once -- the
//! stream has completed normally. A failed or aborted stream persists no
//! assistant message.

use charla_types::chat::{ChatMessage, Conversation, DEFAULT_CONVERSATION_TITLE};
use charla_types::error::RepositoryError;
use charla_types::llm::MessageRole;
use chrono::Utc;
use tracing::info;
use uuid::Uuid;

use crate::chat::repository::ConversationRepository;

/// Stored in place of assistant content when a completed stream produced no
/// text, keeping the non-empty-content invariant.
pub const EMPTY_RESPONSE_PLACEHOLDER: &str = "Empty response from bot.";

/// Orchestrates conversation lifecycle and message persistence.
///
/// Generic over `ConversationRepository` (charla-core never depends on
/// charla-infra).
pub struct ConversationService<R: ConversationRepository> {
    repo: R,
}

impl<R: ConversationRepository> ConversationService<R> {
    pub fn new(repo: R) -> Self {
        Self { repo }
    }

    /// Create a new conversation for a user, with the default title.
    pub async fn create_conversation(
        &self,
        user_id: Uuid,
    ) -> Result<Conversation, RepositoryError> {
        let now = Utc::now();
        let conversation = Conversation {
            id: Uuid::now_v7(),
            user_id,
            title: DEFAULT_CONVERSATION_TITLE.to_string(),
            created_at: now,
            updated_at: now,
        };
        self.repo.create_conversation(&conversation).await?;
        info!(conversation_id = %conversation.id, user_id = %user_id, "Conversation created");
        Ok(conversation)
    }

    /// Get a conversation by ID.
    pub async fn get_conversation(
        &self,
        conversation_id: &Uuid,
    ) -> Result<Option<Conversation>, RepositoryError> {
        self.repo.get_conversation(conversation_id).await
    }

    /// Persist a user message. Called before the upstream call is issued,
    /// so the prompt is retained even when the assistant turn fails.
    pub async fn save_user_message(
        &self,
        conversation_id: Uuid,
        content: String,
    ) -> Result<ChatMessage, RepositoryError> {
        let message = ChatMessage {
            id: Uuid::now_v7(),
            conversation_id,
            role: MessageRole::User,
            content,
            created_at: Utc::now(),
        };
        self.repo.save_message(&message).await?;
        Ok(message)
    }

    /// Persist the assistant message for a completed stream.
    ///
    /// Empty accumulated content is replaced with a placeholder.
    pub async fn save_assistant_message(
        &self,
        conversation_id: Uuid,
        content: String,
    ) -> Result<ChatMessage, RepositoryError> {
        let content = if content.is_empty() {
            EMPTY_RESPONSE_PLACEHOLDER.to_string()
        } else {
            content
        };
        let message = ChatMessage {
            id: Uuid::now_v7(),
            conversation_id,
            role: MessageRole::Assistant,
            content,
            created_at: Utc::now(),
        };
        self.repo.save_message(&message).await?;
        Ok(message)
    }

    /// Get the messages of a conversation, ordered by creation time.
    pub async fn get_messages(
        &self,
        conversation_id: &Uuid,
    ) -> Result<Vec<ChatMessage>, RepositoryError> {
        self.repo.get_messages(conversation_id).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::sync::Mutex;

    /// In-memory repository for exercising the service without a database.
    #[derive(Default)]
    struct MemoryRepository {
        conversations: Mutex<HashMap<Uuid, Conversation>>,
        messages: Mutex<Vec<ChatMessage>>,
    }

    impl ConversationRepository for MemoryRepository {
        async fn create_conversation(
            &self,
            conversation: &Conversation,
        ) -> Result<(), RepositoryError> {
            self.conversations
                .lock()
                .unwrap()
                .insert(conversation.id, conversation.clone());
            Ok(())
        }

        async fn get_conversation(
            &self,
            conversation_id: &Uuid,
        ) -> Result<Option<Conversation>, RepositoryError> {
            Ok(self
                .conversations
                .lock()
                .unwrap()
                .get(conversation_id)
                .cloned())
        }

        async fn save_message(&self, message: &ChatMessage) -> Result<(), RepositoryError> {
            let mut conversations = self.conversations.lock().unwrap();
            let conversation = conversations
                .get_mut(&message.conversation_id)
                .ok_or(RepositoryError::NotFound)?;
            conversation.updated_at = message.created_at;
            self.messages.lock().unwrap().push(message.clone());
            Ok(())
        }

        async fn get_messages(
            &self,
            conversation_id: &Uuid,
        ) -> Result<Vec<ChatMessage>, RepositoryError> {
            let mut messages: Vec<ChatMessage> = self
                .messages
                .lock()
                .unwrap()
                .iter()
                .filter(|m| &m.conversation_id == conversation_id)
                .cloned()
                .collect();
            messages.sort_by(|a, b| (a.created_at, a.id).cmp(&(b.created_at, b.id)));
            Ok(messages)
        }
    }

    #[tokio::test]
    async fn test_create_conversation_defaults() {
        let service = ConversationService::new(MemoryRepository::default());
        let user_id = Uuid::now_v7();

        let conversation = service.create_conversation(user_id).await.unwrap();
        assert_eq!(conversation.user_id, user_id);
        assert_eq!(conversation.title, DEFAULT_CONVERSATION_TITLE);

        let found = service
            .get_conversation(&conversation.id)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(found.id, conversation.id);
    }

    #[tokio::test]
    async fn test_completed_exchange_persists_user_then_assistant() {
        let service = ConversationService::new(MemoryRepository::default());
        let conversation = service.create_conversation(Uuid::now_v7()).await.unwrap();

        service
            .save_user_message(conversation.id, "Hello".to_string())
            .await
            .unwrap();
        service
            .save_assistant_message(conversation.id, "Hi".to_string())
            .await
            .unwrap();

        let messages = service.get_messages(&conversation.id).await.unwrap();
        assert_eq!(messages.len(), 2);
        assert_eq!(messages[0].role, MessageRole::User);
        assert_eq!(messages[0].content, "Hello");
        assert_eq!(messages[1].role, MessageRole::Assistant);
        assert_eq!(messages[1].content, "Hi");
    }

    #[tokio::test]
    async fn test_empty_assistant_content_gets_placeholder() {
        let service = ConversationService::new(MemoryRepository::default());
        let conversation = service.create_conversation(Uuid::now_v7()).await.unwrap();

        let message = service
            .save_assistant_message(conversation.id, String::new())
            .await
            .unwrap();
        assert_eq!(message.content, EMPTY_RESPONSE_PLACEHOLDER);
    }

    #[tokio::test]
    async fn test_append_refreshes_conversation_timestamp() {
        let service = ConversationService::new(MemoryRepository::default());
        let conversation = service.create_conversation(Uuid::now_v7()).await.unwrap();
        let created_updated_at = conversation.updated_at;

        let message = service
            .save_user_message(conversation.id, "Hello".to_string())
            .await
            .unwrap();

        let found = service
            .get_conversation(&conversation.id)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(found.updated_at, message.created_at);
        assert!(found.updated_at >= created_updated_at);
    }
}
