//! Streaming client for the upstream chat-completion endpoint.
//!
//! Opens the HTTP request with `stream: true` and exposes the response as a
//! stream of [`StreamEvent`]s, decoded incrementally by [`FrameDecoder`].
//! The request is resolved (status-checked) before the stream is returned,
//! so transport failures that occur before any chunk arrives surface as a
//! hard error rather than a mid-stream one.

use std::pin::Pin;
use std::time::Duration;

use futures_util::{Stream, StreamExt};
use secrecy::{ExposeSecret, SecretString};

use charla_types::config::UpstreamConfig;
use charla_types::llm::{LlmError, PromptMessage, StreamEvent};

use super::decoder::{Frame, FrameDecoder};
use super::types::ChatCompletionRequest;

/// Connect timeout for the upstream request.
const CONNECT_TIMEOUT: Duration = Duration::from_secs(10);

/// Maximum bytes of an upstream error body carried into the error message.
const ERROR_BODY_LIMIT: usize = 512;

/// Client for an OpenAI-compatible streaming completion endpoint.
///
/// # API Key Security
///
/// Does NOT derive Debug to prevent accidental exposure of the API key.
pub struct ChatCompletionClient {
    http: reqwest::Client,
    base_url: String,
    model: String,
    api_key: Option<SecretString>,
}

impl ChatCompletionClient {
    /// Create a new client from upstream settings and an optional API key.
    ///
    /// A missing key is not an error here -- it is reported per request, so
    /// the server can start without one and return a configuration error to
    /// callers instead.
    pub fn new(upstream: &UpstreamConfig, api_key: Option<SecretString>) -> Result<Self, LlmError> {
        let http = reqwest::Client::builder()
            .connect_timeout(CONNECT_TIMEOUT)
            .timeout(Duration::from_secs(upstream.request_timeout_secs))
            .build()
            .map_err(|e| LlmError::Transport(e.to_string()))?;

        Ok(Self {
            http,
            base_url: upstream.base_url.trim_end_matches('/').to_string(),
            model: upstream.model.clone(),
            api_key,
        })
    }

    /// Open a streaming completion request for the composed message list.
    ///
    /// Returns after the response headers have arrived and the status has
    /// been checked; the returned stream then yields a [`StreamEvent`] per
    /// decoded content delta, terminated by exactly one
    /// [`StreamEvent::Done`] (on the `[DONE]` sentinel or upstream EOF) or
    /// a single [`LlmError`].
    pub async fn open_stream(
        &self,
        messages: Vec<PromptMessage>,
    ) -> Result<Pin<Box<dyn Stream<Item = Result<StreamEvent, LlmError>> + Send + 'static>>, LlmError>
    {
        let api_key = self.api_key.as_ref().ok_or(LlmError::MissingApiKey)?;

        let request = ChatCompletionRequest {
            model: self.model.clone(),
            messages,
            stream: true,
        };

        let response = self
            .http
            .post(format!("{}/chat/completions", self.base_url))
            .bearer_auth(api_key.expose_secret())
            .json(&request)
            .send()
            .await
            .map_err(|e| LlmError::Transport(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(LlmError::Status {
                status: status.as_u16(),
                message: truncate(&body, ERROR_BODY_LIMIT),
            });
        }

        let byte_stream = response.bytes_stream();

        let events = async_stream::stream! {
            let mut decoder = FrameDecoder::new();
            let mut byte_stream = std::pin::pin!(byte_stream);

            while let Some(chunk) = byte_stream.next().await {
                match chunk {
                    Ok(bytes) => {
                        for frame in decoder.feed(&bytes) {
                            match frame {
                                Frame::Delta(text) => yield Ok(StreamEvent::TextDelta { text }),
                                Frame::Done => {
                                    yield Ok(StreamEvent::Done);
                                    return;
                                }
                            }
                        }
                    }
                    Err(err) => {
                        yield Err(LlmError::Stream(err.to_string()));
                        return;
                    }
                }
            }

            // Upstream EOF without the sentinel: treated as normal completion.
            yield Ok(StreamEvent::Done);
        };

        Ok(Box::pin(events))
    }
}

fn truncate(s: &str, limit: usize) -> String {
    if s.len() <= limit {
        s.to_string()
    } else {
        let mut end = limit;
        while !s.is_char_boundary(end) {
            end -= 1;
        }
        format!("{}...", &s[..end])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn upstream_config() -> UpstreamConfig {
        UpstreamConfig {
            base_url: "http://localhost:9/v1/".to_string(),
            model: "test-model".to_string(),
            request_timeout_secs: 5,
        }
    }

    #[test]
    fn test_base_url_trailing_slash_trimmed() {
        let client = ChatCompletionClient::new(&upstream_config(), None).unwrap();
        assert_eq!(client.base_url, "http://localhost:9/v1");
    }

    #[tokio::test]
    async fn test_missing_api_key_is_hard_error() {
        let client = ChatCompletionClient::new(&upstream_config(), None).unwrap();
        let err = match client.open_stream(Vec::new()).await {
            Ok(_) => panic!("expected error"),
            Err(e) => e,
        };
        assert!(matches!(err, LlmError::MissingApiKey));
    }

    #[tokio::test]
    async fn test_unreachable_endpoint_is_transport_error() {
        // Port 9 (discard) is a safe never-listening target.
        let client = ChatCompletionClient::new(
            &upstream_config(),
            Some(SecretString::from("test-key".to_string())),
        )
        .unwrap();
        let err = match client.open_stream(Vec::new()).await {
            Ok(_) => panic!("expected error"),
            Err(e) => e,
        };
        assert!(matches!(err, LlmError::Transport(_)));
    }

    #[test]
    fn test_truncate_respects_char_boundaries() {
        let s = "héllo wörld";
        let out = truncate(s, 3);
        assert!(out.starts_with("h"));
        assert!(out.ends_with("..."));
        assert_eq!(truncate("short", 512), "short");
    }
}
