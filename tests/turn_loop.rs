use std::collections::VecDeque;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use bytes::Bytes;
use parking_lot::Mutex;
use serde_json::{json, Map, Value};

use agentcore::chat::{ByteStream, ChatRequest, ChatRole};
use agentcore::tools::{ToolBackend, ToolError, ToolResult};
use agentcore::{AgentError, AgentRuntime, ChatBackend, RuntimeConfig, StreamEvent, ToolSchema};

/// Serves one scripted SSE body per request, repeating the last one.
struct ScriptedChat {
    responses: Mutex<VecDeque<Vec<Value>>>,
    requests: Mutex<Vec<usize>>,
}

impl ScriptedChat {
    fn new(responses: Vec<Vec<Value>>) -> Arc<Self> {
        Arc::new(Self {
            responses: Mutex::new(responses.into()),
            requests: Mutex::new(Vec::new()),
        })
    }

    fn request_sizes(&self) -> Vec<usize> {
        self.requests.lock().clone()
    }
}

#[async_trait]
impl ChatBackend for ScriptedChat {
    async fn open_stream(&self, request: ChatRequest<'_>) -> Result<ByteStream, AgentError> {
        self.requests.lock().push(request.messages.len());
        let lines = {
            let mut responses = self.responses.lock();
            if responses.len() > 1 {
                responses.pop_front()
            } else {
                responses.front().cloned()
            }
        }
        .unwrap_or_default();
        let chunks: Vec<Result<Bytes, AgentError>> = lines
            .iter()
            .map(|line| Ok(Bytes::from(format!("data: {line}\n\n"))))
            .collect();
        Ok(Box::pin(futures::stream::iter(chunks)))
    }
}

/// Never produces a byte.
struct StalledChat;

#[async_trait]
impl ChatBackend for StalledChat {
    async fn open_stream(&self, _request: ChatRequest<'_>) -> Result<ByteStream, AgentError> {
        Ok(Box::pin(futures::stream::pending()))
    }
}

#[derive(Default)]
struct RecordingTools {
    executed: Mutex<Vec<(String, Value)>>,
}

#[async_trait]
impl ToolBackend for RecordingTools {
    async fn execute(&self, name: &str, params: &Map<String, Value>) -> Result<ToolResult, ToolError> {
        self.executed
            .lock()
            .push((name.to_string(), Value::Object(params.clone())));
        Ok(ToolResult::ok(format!("{name} ok")))
    }

    fn definitions(&self) -> Vec<ToolSchema> {
        Vec::new()
    }
}

fn tool_response(id: &str, pattern: &str) -> Vec<Value> {
    vec![
        json!({"type": "text", "text": "Looking. "}),
        json!({"type": "tool_use", "id": id, "name": "Glob", "input": {"pattern": pattern}}),
        json!({"type": "done", "stop_reason": "tool_use", "usage": {"input_tokens": 10, "output_tokens": 5}}),
    ]
}

fn final_response(text: &str) -> Vec<Value> {
    vec![
        json!({"type": "text", "text": text}),
        json!({"type": "done", "stop_reason": "end_turn", "usage": {"input_tokens": 12, "output_tokens": 3}}),
    ]
}

fn runtime(chat: Arc<dyn ChatBackend>, tools: Arc<RecordingTools>, max_tool_loops: usize) -> AgentRuntime {
    let dir = std::env::temp_dir();
    AgentRuntime::builder(chat, tools)
        .config(RuntimeConfig {
            max_tool_loops,
            working_directory: dir,
            ..RuntimeConfig::default()
        })
        .build()
}

#[tokio::test]
async fn tool_batch_is_executed_and_fed_back() {
    let chat = ScriptedChat::new(vec![tool_response("t1", "*.rs"), final_response("Found it.")]);
    let tools = Arc::new(RecordingTools::default());
    let runtime = runtime(chat.clone(), tools.clone(), 5);
    let mut conversation = runtime.conversation();

    let mut events = Vec::new();
    let outcome = conversation
        .run_turn("find rust files", |event| events.push(event.clone()))
        .await
        .unwrap();

    assert_eq!(outcome.text, "Looking. Found it.");
    assert_eq!(outcome.loop_depth, 1);
    assert_eq!(outcome.tool_calls.len(), 1);
    assert_eq!(outcome.usage.input_tokens, 22);
    assert_eq!(outcome.usage.output_tokens, 8);

    assert_eq!(
        tools.executed.lock().clone(),
        vec![("Glob".to_string(), json!({"pattern": "*.rs"}))]
    );
    assert!(events.contains(&StreamEvent::ToolCallStarted {
        id: "t1".into(),
        name: "Glob".into()
    }));
    assert!(events
        .iter()
        .any(|event| matches!(event, StreamEvent::ToolCompleted { name, .. } if name == "Glob")));

    // user, assistant tool_use, tool results, assistant text
    let roles: Vec<ChatRole> = conversation.messages().iter().map(|m| m.role).collect();
    assert_eq!(
        roles,
        [ChatRole::User, ChatRole::Assistant, ChatRole::User, ChatRole::Assistant]
    );
    assert_eq!(chat.request_sizes(), vec![1, 3]);
}

#[tokio::test]
async fn tool_loop_limit_fails_the_turn() {
    let chat = ScriptedChat::new(vec![tool_response("t1", "*.rs"), tool_response("t2", "*.md")]);
    let tools = Arc::new(RecordingTools::default());
    let runtime = runtime(chat, tools.clone(), 1);
    let mut conversation = runtime.conversation();

    let err = conversation.run_turn("loop forever", |_| {}).await.unwrap_err();
    assert!(matches!(err, AgentError::LoopLimit(1)));
    assert_eq!(tools.executed.lock().len(), 1);
}

#[tokio::test]
async fn later_batch_in_one_response_supersedes_earlier() {
    let chat = ScriptedChat::new(vec![
        vec![
            json!({"type": "tool_use", "id": "t1", "name": "Glob", "input": {"pattern": "old"}}),
            json!({"type": "message_delta", "delta": {"stop_reason": "tool_use"}}),
            json!({"type": "tool_use", "id": "t2", "name": "Glob", "input": {"pattern": "new"}}),
            json!({"type": "done", "stop_reason": "tool_use"}),
        ],
        final_response("ok"),
    ]);
    let tools = Arc::new(RecordingTools::default());
    let runtime = runtime(chat, tools.clone(), 5);
    let mut conversation = runtime.conversation();

    let outcome = conversation.run_turn("go", |_| {}).await.unwrap();
    assert_eq!(outcome.tool_calls.len(), 1);
    assert_eq!(outcome.tool_calls[0].id, "t2");
    assert_eq!(
        tools.executed.lock().clone(),
        vec![("Glob".to_string(), json!({"pattern": "new"}))]
    );
}

#[tokio::test]
async fn stream_error_fails_the_turn() {
    let chat = ScriptedChat::new(vec![vec![
        json!({"type": "text", "text": "partial"}),
        json!({"type": "error", "message": "overloaded"}),
    ]]);
    let runtime = runtime(chat, Arc::new(RecordingTools::default()), 5);
    let mut conversation = runtime.conversation();

    let err = conversation.run_turn("hi", |_| {}).await.unwrap_err();
    assert!(matches!(err, AgentError::Stream(message) if message.contains("overloaded")));
}

#[tokio::test]
async fn cancellation_aborts_a_stalled_turn() {
    let runtime = runtime(Arc::new(StalledChat), Arc::new(RecordingTools::default()), 5);
    let mut conversation = runtime.conversation();
    let cancel = conversation.cancel_token();
    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(20)).await;
        cancel.cancel();
    });

    let err = conversation.run_turn("hello", |_| {}).await.unwrap_err();
    assert!(matches!(err, AgentError::Cancelled));

    // A fresh token lets the next turn start.
    conversation.reset_cancellation();
    assert!(!conversation.cancel_token().is_cancelled());
}
