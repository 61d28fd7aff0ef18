//! Conversation and message types.
//!
//! A conversation is an ordered transcript of user/assistant messages owned
//! by one user. Message order reflects creation order; the conversation's
//! `updated_at` is refreshed on every append.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

// Re-export MessageRole from the llm module (used in both chat and llm contexts).
pub use crate::llm::MessageRole;

/// Default title for a conversation created on first prompt.
pub const DEFAULT_CONVERSATION_TITLE: &str = "New Conversation";

/// A conversation between a user and a character.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Conversation {
    pub id: Uuid,
    pub user_id: Uuid,
    pub title: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// A single message within a conversation.
///
/// Persisted messages carry only the `User` or `Assistant` role; system
/// directives are composed per request and never stored.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatMessage {
    pub id: Uuid,
    pub conversation_id: Uuid,
    pub role: MessageRole,
    pub content: String,
    pub created_at: DateTime<Utc>,
}
