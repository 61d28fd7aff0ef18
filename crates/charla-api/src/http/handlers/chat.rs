//! Streaming chat endpoints.
//!
//! POST /api/v1/chat/conversations -- create a conversation and store its
//! first user message.
//! POST /api/v1/chat/stream-first -- stream the reply to that first prompt.
//! POST /api/v1/chat/prompt -- continue (or implicitly start) a
//! conversation with a new prompt.
//!
//! The streaming endpoints share one pipeline: validate -> quota gate
//! (admission consumes one unit) -> compose prompt -> persist user message
//! -> open upstream stream -> relay decoded deltas to the client as raw
//! chunked text, accumulating them -> on normal completion persist exactly
//! one assistant message. A stream that fails or is abandoned mid-flight
//! persists no assistant message; the quota unit is not refunded.

use std::convert::Infallible;
use std::pin::Pin;
use std::sync::Arc;

use axum::body::{Body, Bytes};
use axum::extract::State;
use axum::http::{header, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::Json;
use futures_util::{Stream, StreamExt};
use serde::Deserialize;
use uuid::Uuid;

use charla_core::prompt::compose;
use charla_core::quota;
use charla_core::user::UserRepository;
use charla_types::chat::Conversation;
use charla_types::error::ChatError;
use charla_types::llm::{LlmError, StreamEvent};
use charla_types::user::User;

use crate::http::error::AppError;
use crate::http::extractors::auth::Authenticated;
use crate::state::{AppState, ConcreteConversationService};

/// Request body for conversation creation.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateConversationRequest {
    pub prompt: Option<String>,
    pub character: Option<String>,
}

/// Request body for streaming the reply to a conversation's first prompt.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StreamFirstRequest {
    pub conversation_id: Option<String>,
    pub character: Option<String>,
    pub prompt: Option<String>,
}

/// Request body for continuing (or implicitly starting) a conversation.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SendPromptRequest {
    pub prompt: Option<String>,
    pub character: Option<String>,
    pub conversation_id: Option<String>,
}

/// POST /api/v1/chat/conversations -- create a conversation and store the
/// first user prompt. The reply is streamed separately via `stream-first`.
pub async fn create_conversation(
    State(state): State<AppState>,
    Authenticated(user_id): Authenticated,
    Json(body): Json<CreateConversationRequest>,
) -> Result<impl IntoResponse, AppError> {
    let prompt = require(body.prompt.as_deref(), "prompt")?;
    let character = require(body.character.as_deref(), "character")?;
    state.characters.directive(character)?;

    let conversation = state
        .conversation_service
        .create_conversation(user_id)
        .await?;
    state
        .conversation_service
        .save_user_message(conversation.id, prompt.to_string())
        .await?;

    Ok((
        StatusCode::CREATED,
        Json(serde_json::json!({
            "success": true,
            "conversationId": conversation.id,
        })),
    ))
}

/// POST /api/v1/chat/stream-first -- stream the assistant's reply to the
/// first prompt of an existing conversation.
///
/// The user message was already stored by the conversation-create call, so
/// this endpoint composes from the character directive and prompt alone and
/// persists only the assistant side.
pub async fn stream_first(
    State(state): State<AppState>,
    Authenticated(user_id): Authenticated,
    Json(body): Json<StreamFirstRequest>,
) -> Result<Response, AppError> {
    let conversation_id = require(body.conversation_id.as_deref(), "conversationId")?;
    let conversation_id = parse_conversation_id(conversation_id)?;
    let character = require(body.character.as_deref(), "character")?;
    let prompt = require(body.prompt.as_deref(), "prompt")?;

    let user = load_user(&state, &user_id).await?;
    check_quota(&user)?;
    let directive = state.characters.directive(character)?.to_string();

    // Admission consumes exactly one unit, before the upstream call; a
    // later upstream failure does not refund it.
    state.user_repo.increment_message_count(&user.id).await?;

    let messages = compose(&directive, &[], prompt);
    let events = state.upstream.open_stream(messages).await?;

    Ok(relay_response(
        events,
        state.conversation_service.clone(),
        conversation_id,
    ))
}

/// POST /api/v1/chat/prompt -- stream the assistant's reply to a new
/// prompt, with prior turns of the conversation as context.
///
/// When no conversation id is supplied (or the id matches nothing), a new
/// conversation is created. The user message is persisted before the
/// upstream call is issued, so it is retained even if the assistant turn
/// fails.
pub async fn send_prompt(
    State(state): State<AppState>,
    Authenticated(user_id): Authenticated,
    Json(body): Json<SendPromptRequest>,
) -> Result<Response, AppError> {
    let prompt = require(body.prompt.as_deref(), "prompt")?;
    let character = require(body.character.as_deref(), "character")?;
    let conversation_id = body
        .conversation_id
        .as_deref()
        .map(parse_conversation_id)
        .transpose()?;

    let user = load_user(&state, &user_id).await?;
    check_quota(&user)?;
    let directive = state.characters.directive(character)?.to_string();

    // Load existing conversation (if provided) so prior turns become context.
    let conversation = match conversation_id {
        Some(id) => state.conversation_service.get_conversation(&id).await?,
        None => None,
    };

    state.user_repo.increment_message_count(&user.id).await?;

    let prior = match &conversation {
        Some(conversation) => {
            state
                .conversation_service
                .get_messages(&conversation.id)
                .await?
        }
        None => Vec::new(),
    };
    let messages = compose(&directive, &prior, prompt);

    // Reuse the loaded conversation or start a new one, then record the
    // user's side of the exchange up front.
    let conversation: Conversation = match conversation {
        Some(conversation) => conversation,
        None => {
            state
                .conversation_service
                .create_conversation(user.id)
                .await?
        }
    };
    state
        .conversation_service
        .save_user_message(conversation.id, prompt.to_string())
        .await?;

    let events = state.upstream.open_stream(messages).await?;

    Ok(relay_response(
        events,
        state.conversation_service.clone(),
        conversation.id,
    ))
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

/// Reject absent or empty request fields before any side effect.
fn require<'a>(value: Option<&'a str>, name: &'static str) -> Result<&'a str, ChatError> {
    match value {
        Some(value) if !value.is_empty() => Ok(value),
        _ => Err(ChatError::MissingField(name)),
    }
}

fn parse_conversation_id(id: &str) -> Result<Uuid, AppError> {
    id.parse::<Uuid>()
        .map_err(|_| AppError::Validation("Invalid conversationId format.".to_string()))
}

async fn load_user(state: &AppState, user_id: &Uuid) -> Result<User, AppError> {
    state
        .user_repo
        .find_by_id(user_id)
        .await?
        .ok_or_else(|| AppError::Unauthorized("User not found.".to_string()))
}

fn check_quota(user: &User) -> Result<(), AppError> {
    if quota::evaluate(user.plan, user.message_count).is_admitted() {
        Ok(())
    } else {
        Err(AppError::QuotaExceeded)
    }
}

/// Build the chunked streaming response relaying decoded deltas to the
/// client.
///
/// Each delta is forwarded as soon as it is decoded, in arrival order, as
/// raw text appended to the response body. After normal completion the
/// accumulated content is persisted as the conversation's assistant
/// message. On a mid-stream upstream error a single terminal JSON payload
/// is written and nothing is persisted. If the client disconnects, the
/// body stream is dropped, which drops the upstream stream and skips
/// persistence -- the exchange is failed, not recorded.
fn relay_response(
    events: Pin<Box<dyn Stream<Item = Result<StreamEvent, LlmError>> + Send + 'static>>,
    service: Arc<ConcreteConversationService>,
    conversation_id: Uuid,
) -> Response {
    let body_stream = async_stream::stream! {
        let mut events = events;
        let mut accumulated = String::new();
        let mut failed = false;

        while let Some(event) = events.next().await {
            match event {
                Ok(StreamEvent::TextDelta { text }) => {
                    accumulated.push_str(&text);
                    yield Ok::<_, Infallible>(Bytes::from(text));
                }
                Ok(StreamEvent::Done) => break,
                Err(err) => {
                    tracing::error!(
                        error = %err,
                        conversation_id = %conversation_id,
                        "upstream stream failed mid-flight"
                    );
                    let payload = serde_json::json!({
                        "success": false,
                        "message": "Error streaming from upstream",
                        "error": err.to_string(),
                    });
                    yield Ok(Bytes::from(payload.to_string()));
                    failed = true;
                    break;
                }
            }
        }

        if failed {
            return;
        }

        // Only a fully completed stream yields an assistant message.
        match service.get_conversation(&conversation_id).await {
            Ok(Some(_)) => {
                if let Err(err) = service
                    .save_assistant_message(conversation_id, accumulated)
                    .await
                {
                    tracing::error!(
                        error = %err,
                        conversation_id = %conversation_id,
                        "failed to persist assistant message"
                    );
                }
            }
            Ok(None) => {
                tracing::warn!(
                    conversation_id = %conversation_id,
                    "conversation not found when saving assistant message"
                );
            }
            Err(err) => {
                tracing::error!(
                    error = %err,
                    conversation_id = %conversation_id,
                    "failed to load conversation for assistant message"
                );
            }
        }
    };

    // No Content-Length is set, so the transfer is chunked and each delta
    // reaches the client as it is written.
    (
        [(header::CONTENT_TYPE, "text/plain; charset=utf-8")],
        Body::from_stream(body_stream),
    )
        .into_response()
}
