use async_trait::async_trait;

use crate::error::AgentError;

use super::message::ChatMessage;
use super::sse::ByteStream;
use super::tool::ToolSchema;

/// Everything a backend needs to produce the next response of a turn.
#[derive(Debug, Clone, Copy)]
pub struct ChatRequest<'a> {
    pub messages: &'a [ChatMessage],
    pub tools: &'a [ToolSchema],
    pub system: Option<&'a str>,
}

/// A streaming text-generation service.
///
/// Implementations return the raw response body; framing and event
/// normalization happen in [`EventCursor`](crate::normalize::EventCursor).
#[async_trait]
pub trait ChatBackend: Send + Sync {
    async fn open_stream(&self, request: ChatRequest<'_>) -> Result<ByteStream, AgentError>;
}
