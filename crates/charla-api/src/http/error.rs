//! Application error type mapping to HTTP status codes and envelope format.

use axum::http::header::HeaderValue;
use axum::http::{HeaderName, StatusCode};
use axum::response::{IntoResponse, Response};
use serde_json::json;

use charla_types::error::{ChatError, RepositoryError};
use charla_types::llm::LlmError;

/// Header signalling quota exhaustion to the client, alongside the 403 body.
pub const LIMIT_REACHED_HEADER: HeaderName = HeaderName::from_static("x-limit-reached");

/// Application-level error that maps to HTTP responses.
#[derive(Debug)]
pub enum AppError {
    /// Invalid or missing request input.
    Validation(String),
    /// Validation errors from the domain layer.
    Chat(ChatError),
    /// Authentication failure.
    Unauthorized(String),
    /// The user's exchange quota for the period is exhausted.
    QuotaExceeded,
    /// The upstream provider is not configured (missing API key).
    Misconfigured(String),
    /// The upstream call failed before any content was delivered.
    Upstream(LlmError),
    /// Storage failure.
    Repository(RepositoryError),
    /// Generic internal error.
    Internal(String),
}

impl From<ChatError> for AppError {
    fn from(e: ChatError) -> Self {
        AppError::Chat(e)
    }
}

impl From<RepositoryError> for AppError {
    fn from(e: RepositoryError) -> Self {
        AppError::Repository(e)
    }
}

impl From<LlmError> for AppError {
    fn from(e: LlmError) -> Self {
        match e {
            LlmError::MissingApiKey => {
                AppError::Misconfigured("Upstream API key not configured.".to_string())
            }
            other => AppError::Upstream(other),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, code, message) = match &self {
            AppError::Validation(msg) => {
                (StatusCode::BAD_REQUEST, "VALIDATION_ERROR", msg.clone())
            }
            AppError::Chat(e @ ChatError::MissingField(_)) => {
                (StatusCode::BAD_REQUEST, "VALIDATION_ERROR", e.to_string())
            }
            AppError::Chat(ChatError::UnknownCharacter(_)) => {
                (StatusCode::BAD_REQUEST, "INVALID_CHARACTER", "Invalid character.".to_string())
            }
            AppError::Unauthorized(msg) => {
                (StatusCode::UNAUTHORIZED, "UNAUTHORIZED", msg.clone())
            }
            AppError::QuotaExceeded => {
                (
                    StatusCode::FORBIDDEN,
                    "QUOTA_EXCEEDED",
                    "Message limit reached. Please upgrade your plan.".to_string(),
                )
            }
            AppError::Misconfigured(msg) => {
                (StatusCode::INTERNAL_SERVER_ERROR, "UPSTREAM_MISCONFIGURED", msg.clone())
            }
            AppError::Upstream(e) => {
                (StatusCode::BAD_GATEWAY, "UPSTREAM_ERROR", e.to_string())
            }
            AppError::Repository(e) => {
                (StatusCode::INTERNAL_SERVER_ERROR, "STORAGE_ERROR", e.to_string())
            }
            AppError::Internal(msg) => {
                (StatusCode::INTERNAL_SERVER_ERROR, "INTERNAL_ERROR", msg.clone())
            }
        };

        let body = json!({
            "data": null,
            "meta": {
                "timestamp": chrono::Utc::now().to_rfc3339(),
            },
            "errors": [{
                "code": code,
                "message": message,
            }]
        });

        let mut response = (
            status,
            [(axum::http::header::CONTENT_TYPE, "application/json")],
            body.to_string(),
        )
            .into_response();

        if matches!(self, AppError::QuotaExceeded) {
            response
                .headers_mut()
                .insert(LIMIT_REACHED_HEADER, HeaderValue::from_static("true"));
        }

        response
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_field_maps_to_400() {
        let response = AppError::Chat(ChatError::MissingField("prompt")).into_response();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[test]
    fn test_unknown_character_maps_to_400() {
        let response =
            AppError::Chat(ChatError::UnknownCharacter("zorro".to_string())).into_response();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[test]
    fn test_quota_exceeded_maps_to_403_with_signal_header() {
        let response = AppError::QuotaExceeded.into_response();
        assert_eq!(response.status(), StatusCode::FORBIDDEN);
        assert_eq!(
            response
                .headers()
                .get(&LIMIT_REACHED_HEADER)
                .and_then(|v| v.to_str().ok()),
            Some("true")
        );
    }

    #[test]
    fn test_misconfigured_maps_to_500() {
        let response = AppError::Misconfigured("no key".to_string()).into_response();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[test]
    fn test_upstream_transport_maps_to_502() {
        let response =
            AppError::from(LlmError::Transport("connection refused".to_string())).into_response();
        assert_eq!(response.status(), StatusCode::BAD_GATEWAY);
    }

    #[test]
    fn test_missing_api_key_maps_to_misconfigured() {
        let err = AppError::from(LlmError::MissingApiKey);
        assert!(matches!(err, AppError::Misconfigured(_)));
    }
}
