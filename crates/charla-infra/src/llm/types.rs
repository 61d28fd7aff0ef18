//! Wire types for the OpenAI-compatible chat-completion API.

use charla_types::llm::PromptMessage;
use serde::{Deserialize, Serialize};

/// Request body for `POST {base_url}/chat/completions`.
#[derive(Debug, Serialize)]
pub struct ChatCompletionRequest {
    pub model: String,
    pub messages: Vec<PromptMessage>,
    pub stream: bool,
}

/// One streamed completion chunk, carried in the payload of a `data:` frame.
///
/// Only the fields this service reads are modeled; everything else in the
/// provider payload is ignored.
#[derive(Debug, Deserialize)]
pub struct ChatCompletionChunk {
    #[serde(default)]
    pub choices: Vec<ChunkChoice>,
}

#[derive(Debug, Deserialize)]
pub struct ChunkChoice {
    #[serde(default)]
    pub delta: ChunkDelta,
}

#[derive(Debug, Default, Deserialize)]
pub struct ChunkDelta {
    #[serde(default)]
    pub content: Option<String>,
}

impl ChatCompletionChunk {
    /// Extract the content delta, if this chunk carries one.
    ///
    /// Role-only and empty-content events yield `None`.
    pub fn content_delta(self) -> Option<String> {
        self.choices
            .into_iter()
            .next()
            .and_then(|choice| choice.delta.content)
            .filter(|content| !content.is_empty())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use charla_types::llm::MessageRole;

    #[test]
    fn test_request_serializes_wire_shape() {
        let request = ChatCompletionRequest {
            model: "deepseek-chat".to_string(),
            messages: vec![PromptMessage::new(MessageRole::User, "Hi")],
            stream: true,
        };
        let json = serde_json::to_value(&request).unwrap();
        assert_eq!(json["model"], "deepseek-chat");
        assert_eq!(json["stream"], true);
        assert_eq!(json["messages"][0]["role"], "user");
        assert_eq!(json["messages"][0]["content"], "Hi");
    }

    #[test]
    fn test_chunk_content_delta() {
        let chunk: ChatCompletionChunk =
            serde_json::from_str(r#"{"choices":[{"delta":{"content":"Hi"}}]}"#).unwrap();
        assert_eq!(chunk.content_delta().as_deref(), Some("Hi"));
    }

    #[test]
    fn test_chunk_role_only_delta_is_none() {
        let chunk: ChatCompletionChunk =
            serde_json::from_str(r#"{"choices":[{"delta":{"role":"assistant"}}]}"#).unwrap();
        assert!(chunk.content_delta().is_none());
    }

    #[test]
    fn test_chunk_empty_content_is_none() {
        let chunk: ChatCompletionChunk =
            serde_json::from_str(r#"{"choices":[{"delta":{"content":""}}]}"#).unwrap();
        assert!(chunk.content_delta().is_none());
    }

    #[test]
    fn test_chunk_no_choices_is_none() {
        let chunk: ChatCompletionChunk = serde_json::from_str(r#"{"choices":[]}"#).unwrap();
        assert!(chunk.content_delta().is_none());
    }
}
