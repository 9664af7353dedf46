//! Streaming messages client for Anthropic-compatible endpoints.

use std::time::Duration;

use async_trait::async_trait;
use futures::stream::{StreamExt, TryStreamExt};
use reqwest::Client;
use secrecy::{ExposeSecret, SecretString};
use serde::Serialize;

use crate::chat::{ByteStream, ChatBackend, ChatMessage, ChatRequest, ToolSchema};
use crate::error::AgentError;

pub const DEFAULT_BASE_URL: &str = "https://api.anthropic.com/v1/messages";
pub const DEFAULT_MODEL: &str = "claude-sonnet-4-5";
pub const DEFAULT_MAX_TOKENS: u32 = 8192;
const API_VERSION: &str = "2023-06-01";

/// Configuration for the HTTP chat backend.
#[derive(Debug, Clone)]
pub struct HttpBackendConfig {
    /// Full URL of the streaming messages endpoint
    pub base_url: String,
    /// Model identifier
    pub model: String,
    /// Sent as `x-api-key` when present
    pub api_key: Option<SecretString>,
    /// Maximum tokens to generate per response
    pub max_tokens: u32,
    /// Connect timeout in seconds; the body itself is never timed out
    pub connect_timeout_seconds: Option<u64>,
}

impl Default for HttpBackendConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            model: DEFAULT_MODEL.to_string(),
            api_key: None,
            max_tokens: DEFAULT_MAX_TOKENS,
            connect_timeout_seconds: Some(30),
        }
    }
}

#[derive(Serialize)]
struct MessagesRequest<'a> {
    model: &'a str,
    max_tokens: u32,
    stream: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    system: Option<&'a str>,
    messages: &'a [ChatMessage],
    #[serde(skip_serializing_if = "no_tools")]
    tools: &'a [ToolSchema],
}

fn no_tools(tools: &&[ToolSchema]) -> bool {
    tools.is_empty()
}

/// [`ChatBackend`] over HTTP with a streamed response body.
#[derive(Debug, Clone)]
pub struct HttpBackend {
    config: HttpBackendConfig,
    client: Client,
}

impl HttpBackend {
    pub fn new(config: HttpBackendConfig) -> Result<Self, AgentError> {
        let mut builder = Client::builder();
        if let Some(secs) = config.connect_timeout_seconds {
            builder = builder.connect_timeout(Duration::from_secs(secs));
        }
        let client = builder.build()?;
        Ok(Self { config, client })
    }

    pub fn model(&self) -> &str {
        &self.config.model
    }

    pub fn base_url(&self) -> &str {
        &self.config.base_url
    }
}

#[async_trait]
impl ChatBackend for HttpBackend {
    async fn open_stream(&self, request: ChatRequest<'_>) -> Result<ByteStream, AgentError> {
        if request.messages.is_empty() {
            return Err(AgentError::InvalidRequest(
                "conversation has no messages".to_string(),
            ));
        }

        let body = MessagesRequest {
            model: &self.config.model,
            max_tokens: self.config.max_tokens,
            stream: true,
            system: request.system,
            messages: request.messages,
            tools: request.tools,
        };
        if log::log_enabled!(log::Level::Trace) {
            if let Ok(json) = serde_json::to_string(&body) {
                log::trace!("messages request payload: {json}");
            }
        }

        let mut http = self
            .client
            .post(&self.config.base_url)
            .header("anthropic-version", API_VERSION)
            .header("accept", "text/event-stream")
            .json(&body);
        if let Some(key) = &self.config.api_key {
            http = http.header("x-api-key", key.expose_secret());
        }

        let response = http.send().await?;
        log::debug!("messages HTTP status: {}", response.status());
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(AgentError::Provider {
                status: status.as_u16(),
                body,
            });
        }

        let stream = response
            .bytes_stream()
            .map_err(|err| AgentError::Stream(err.to_string()));
        Ok(stream.boxed())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chat::{Frame, FrameReader};

    fn config(url: String) -> HttpBackendConfig {
        HttpBackendConfig {
            base_url: url,
            api_key: Some(SecretString::new("sk-test".to_string())),
            ..HttpBackendConfig::default()
        }
    }

    #[tokio::test]
    async fn streams_body_with_auth_headers() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/v1/messages")
            .match_header("x-api-key", "sk-test")
            .match_header("anthropic-version", API_VERSION)
            .match_body(mockito::Matcher::PartialJsonString(
                r#"{"stream": true, "messages": [{"role": "user", "content": [{"type": "text", "text": "hi"}]}]}"#
                    .to_string(),
            ))
            .with_status(200)
            .with_header("content-type", "text/event-stream")
            .with_body("data: {\"type\":\"text\",\"text\":\"hello\"}\n\ndata: [DONE]\n\n")
            .create_async()
            .await;

        let backend = HttpBackend::new(config(format!("{}/v1/messages", server.url()))).unwrap();
        let messages = vec![ChatMessage::user("hi")];
        let body = backend
            .open_stream(ChatRequest {
                messages: &messages,
                tools: &[],
                system: None,
            })
            .await
            .unwrap();

        let mut reader = FrameReader::new(body);
        let mut frames = Vec::new();
        while let Some(frame) = reader.next_frame().await {
            frames.push(frame.unwrap());
        }
        assert_eq!(
            frames,
            vec![
                Frame::Data("{\"type\":\"text\",\"text\":\"hello\"}".to_string()),
                Frame::Done
            ]
        );
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn non_success_status_becomes_provider_error() {
        let mut server = mockito::Server::new_async().await;
        let _mock = server
            .mock("POST", "/v1/messages")
            .with_status(529)
            .with_body(r#"{"type":"error","error":{"type":"overloaded_error"}}"#)
            .create_async()
            .await;

        let backend = HttpBackend::new(config(format!("{}/v1/messages", server.url()))).unwrap();
        let messages = vec![ChatMessage::user("hi")];
        let err = match backend
            .open_stream(ChatRequest {
                messages: &messages,
                tools: &[],
                system: Some("be brief"),
            })
            .await
        {
            Ok(_) => panic!("expected provider error"),
            Err(err) => err,
        };
        match err {
            AgentError::Provider { status, body } => {
                assert_eq!(status, 529);
                assert!(body.contains("overloaded_error"));
            }
            other => panic!("unexpected {other:?}"),
        }
        assert!(AgentError::Provider { status: 529, body: String::new() }.is_retryable());
    }

    #[tokio::test]
    async fn empty_conversation_is_rejected_locally() {
        let backend = HttpBackend::new(HttpBackendConfig::default()).unwrap();
        let result = backend
            .open_stream(ChatRequest {
                messages: &[],
                tools: &[],
                system: None,
            })
            .await;
        assert!(matches!(result, Err(AgentError::InvalidRequest(_))));
    }
}
