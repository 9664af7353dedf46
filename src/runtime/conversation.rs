use std::fmt;
use std::sync::Arc;

use serde_json::Value;
use tokio_util::sync::CancellationToken;

use crate::chat::{
    ChatBackend, ChatMessage, ChatRequest, ContentBlock, MessagePart, StreamEvent, ToolSchema,
    ToolsPendingBatch, Usage,
};
use crate::coordinator::ToolCoordinator;
use crate::error::AgentError;
use crate::normalize::EventCursor;
use crate::tools::ToolCallResult;

/// Where a conversation is within the current user turn.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TurnState {
    Idle,
    AwaitingBackend,
    Streaming,
    ExecutingTools,
    Done,
    Failed,
}

impl fmt::Display for TurnState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            TurnState::Idle => "idle",
            TurnState::AwaitingBackend => "awaiting-backend",
            TurnState::Streaming => "streaming",
            TurnState::ExecutingTools => "executing-tools",
            TurnState::Done => "done",
            TurnState::Failed => "failed",
        };
        f.write_str(name)
    }
}

/// What one user turn produced.
#[derive(Debug, Clone, Default)]
pub struct TurnOutcome {
    /// Assistant text across every response of the turn
    pub text: String,
    /// Usage summed over every response of the turn
    pub usage: Usage,
    /// Results of every tool call executed, in execution order
    pub tool_calls: Vec<ToolCallResult>,
    /// Number of tool batches executed
    pub loop_depth: usize,
}

struct ResponseSummary {
    text: String,
    batch: Option<ToolsPendingBatch>,
    usage: Usage,
}

/// In-memory message history plus the turn loop driving it.
pub struct Conversation {
    id: String,
    messages: Vec<ChatMessage>,
    chat: Arc<dyn ChatBackend>,
    coordinator: ToolCoordinator,
    tools: Vec<ToolSchema>,
    system: Option<String>,
    max_tool_loops: usize,
    cancel: CancellationToken,
    state: TurnState,
}

impl Conversation {
    pub(super) fn new(
        id: String,
        chat: Arc<dyn ChatBackend>,
        coordinator: ToolCoordinator,
        system: Option<String>,
        max_tool_loops: usize,
        cancel: CancellationToken,
    ) -> Self {
        let tools = coordinator.definitions();
        Self {
            id,
            messages: Vec::new(),
            chat,
            coordinator,
            tools,
            system,
            max_tool_loops,
            cancel,
            state: TurnState::Idle,
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn messages(&self) -> &[ChatMessage] {
        &self.messages
    }

    pub fn state(&self) -> TurnState {
        self.state
    }

    pub fn tools(&self) -> &[ToolSchema] {
        &self.tools
    }

    /// Token that aborts the running turn. Cancelling it releases the stream
    /// and stops new tool dispatches.
    pub fn cancel_token(&self) -> CancellationToken {
        self.cancel.clone()
    }

    /// Replaces a spent cancellation token so the next turn can run.
    pub fn reset_cancellation(&mut self) {
        if self.cancel.is_cancelled() {
            self.cancel = CancellationToken::new();
            self.coordinator = self.coordinator.clone().with_cancellation(self.cancel.clone());
        }
    }

    /// Sends `user_text` and drives the backend until it completes normally,
    /// feeding every event to `sink`. Tool batches are executed and their
    /// results sent back automatically.
    pub async fn run_turn<F>(&mut self, user_text: &str, mut sink: F) -> Result<TurnOutcome, AgentError>
    where
        F: FnMut(&StreamEvent),
    {
        self.messages.push(ChatMessage::user(user_text));
        let mut outcome = TurnOutcome::default();

        loop {
            let response = match self.stream_response(outcome.loop_depth, &mut sink).await {
                Ok(response) => response,
                Err(err) => {
                    self.transition(TurnState::Failed);
                    return Err(err);
                }
            };
            outcome.text.push_str(&response.text);
            outcome.usage.input_tokens = outcome.usage.input_tokens.saturating_add(response.usage.input_tokens);
            outcome.usage.output_tokens = outcome.usage.output_tokens.saturating_add(response.usage.output_tokens);

            let Some(batch) = response.batch else {
                if !response.text.is_empty() {
                    self.messages.push(ChatMessage::assistant(vec![ContentBlock::Text {
                        text: response.text,
                    }]));
                }
                self.transition(TurnState::Done);
                return Ok(outcome);
            };

            if outcome.loop_depth >= self.max_tool_loops {
                log::warn!(
                    "conversation {}: tool loop limit {} reached",
                    self.id,
                    self.max_tool_loops
                );
                self.transition(TurnState::Failed);
                return Err(AgentError::LoopLimit(self.max_tool_loops));
            }
            outcome.loop_depth += 1;

            self.transition(TurnState::ExecutingTools);
            let results = self.coordinator.execute_batch(&batch.calls).await;
            for result in &results {
                sink(&result_event(result));
            }

            self.messages.push(ChatMessage::assistant(batch.assistant_content));
            self.messages.push(ChatMessage::tool_results(
                results
                    .iter()
                    .map(|result| MessagePart::ToolResult {
                        tool_use_id: result.id.clone(),
                        content: result.result.model_text(),
                        is_error: !result.result.success,
                    })
                    .collect(),
            ));
            outcome.tool_calls.extend(results);

            if self.cancel.is_cancelled() {
                self.transition(TurnState::Failed);
                return Err(AgentError::Cancelled);
            }
        }
    }

    async fn stream_response<F>(&mut self, loop_depth: usize, sink: &mut F) -> Result<ResponseSummary, AgentError>
    where
        F: FnMut(&StreamEvent),
    {
        self.transition(TurnState::AwaitingBackend);
        let request = ChatRequest {
            messages: &self.messages,
            tools: &self.tools,
            system: self.system.as_deref(),
        };
        let body = tokio::select! {
            biased;
            _ = self.cancel.cancelled() => return Err(AgentError::Cancelled),
            body = self.chat.open_stream(request) => body?,
        };

        self.transition(TurnState::Streaming);
        let mut cursor = EventCursor::new(body, self.cancel.clone());
        let mut text = String::new();
        let mut batch: Option<ToolsPendingBatch> = None;
        let mut terminal: Option<Result<(), String>> = None;

        while let Some(mut event) = cursor.next().await {
            match &mut event {
                StreamEvent::Text { chars } => text.push_str(chars),
                StreamEvent::ToolsPendingBatch(pending) => {
                    if pending.loop_depth.is_none() {
                        pending.loop_depth = Some(loop_depth);
                    }
                    if batch.is_some() {
                        log::debug!("conversation {}: later tool batch supersedes earlier one", self.id);
                    }
                    batch = Some(pending.clone());
                }
                StreamEvent::Error { message } => terminal = Some(Err(message.clone())),
                StreamEvent::Done => terminal = Some(Ok(())),
                _ => {}
            }
            sink(&event);
        }

        match terminal {
            Some(Ok(())) => Ok(ResponseSummary {
                text,
                batch,
                usage: cursor.usage(),
            }),
            Some(Err(message)) => Err(AgentError::Stream(message)),
            None => Err(AgentError::Cancelled),
        }
    }

    fn transition(&mut self, next: TurnState) {
        if self.state != next {
            log::debug!("conversation {}: {} -> {}", self.id, self.state, next);
            self.state = next;
        }
    }
}

fn result_event(call: &ToolCallResult) -> StreamEvent {
    if call.result.success {
        StreamEvent::ToolCompleted {
            id: Some(call.id.clone()),
            name: call.name.clone(),
            output: serde_json::to_value(&call.result).unwrap_or(Value::Null),
        }
    } else {
        StreamEvent::ToolFailed {
            id: Some(call.id.clone()),
            name: call.name.clone(),
            error: call.result.model_text(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn failed_results_become_tool_failed_events() {
        let call = ToolCallResult {
            id: "t1".into(),
            name: "Read".into(),
            result: crate::tools::ToolResult::failure("No such file"),
            retry: None,
        };
        assert_eq!(
            result_event(&call),
            StreamEvent::ToolFailed {
                id: Some("t1".into()),
                name: "Read".into(),
                error: "Error: No such file".into(),
            }
        );
    }

    #[test]
    fn states_display_kebab_case() {
        assert_eq!(TurnState::ExecutingTools.to_string(), "executing-tools");
        assert_eq!(TurnState::AwaitingBackend.to_string(), "awaiting-backend");
    }
}
