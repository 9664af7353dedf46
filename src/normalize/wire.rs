//! Wire records of the three supported backend dialects.
//!
//! All dialects share one `type` discriminator, so a single internally tagged
//! enum covers them. Records whose `type` is unknown fail to deserialize and
//! are dropped by the normalizer.

use serde::Deserialize;
use serde_json::{Map, Value};

use crate::chat::{parse_arguments, ContentBlock, PendingToolCall, UsagePatch};

#[derive(Debug, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub(super) enum WireRecord {
    // Fine-grained delta dialect
    MessageStart {
        #[serde(default)]
        message: MessageStartBody,
    },
    ContentBlockStart {
        #[serde(default)]
        index: usize,
        content_block: BlockStart,
    },
    ContentBlockDelta {
        #[serde(default)]
        index: usize,
        delta: BlockDelta,
    },
    ContentBlockStop {
        #[serde(default)]
        index: usize,
    },
    MessageDelta {
        #[serde(default)]
        delta: MessageDeltaBody,
        #[serde(default)]
        usage: Option<UsagePatch>,
    },
    MessageStop,
    Ping,

    // Pre-batched envelope dialect
    #[serde(alias = "tool_calls_pending")]
    ToolsPending(Envelope),

    // Plain text/tool dialect
    Text {
        #[serde(alias = "content", alias = "chars")]
        text: String,
    },
    #[serde(alias = "tool_start")]
    ToolUse {
        id: String,
        name: String,
        #[serde(default, alias = "arguments")]
        input: Value,
    },
    ToolResult {
        #[serde(default)]
        id: Option<String>,
        #[serde(alias = "tool")]
        name: String,
        #[serde(default, alias = "result", alias = "content")]
        output: Value,
    },
    ToolError {
        #[serde(default)]
        id: Option<String>,
        #[serde(alias = "tool")]
        name: String,
        #[serde(default)]
        error: String,
    },
    Usage(UsageRecord),

    // Shared terminal records
    Error {
        #[serde(default)]
        error: Option<Value>,
        #[serde(default)]
        message: Option<String>,
    },
    Done {
        #[serde(default)]
        usage: Option<UsagePatch>,
        #[serde(default)]
        stop_reason: Option<String>,
    },
}

#[derive(Debug, Default, Deserialize)]
pub(super) struct MessageStartBody {
    #[serde(default)]
    pub usage: Option<UsagePatch>,
}

#[derive(Debug, Default, Deserialize)]
pub(super) struct MessageDeltaBody {
    #[serde(default)]
    pub stop_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub(super) enum BlockStart {
    Text {
        #[serde(default)]
        text: String,
    },
    ToolUse {
        id: String,
        name: String,
        #[serde(default)]
        input: Value,
    },
    #[serde(other)]
    Other,
}

#[derive(Debug, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub(super) enum BlockDelta {
    TextDelta { text: String },
    InputJsonDelta { partial_json: String },
    #[serde(other)]
    Other,
}

#[derive(Debug, Deserialize)]
pub(super) struct Envelope {
    #[serde(default, alias = "toolCalls", alias = "calls")]
    pub tool_calls: Vec<EnvelopeCall>,
    #[serde(default, alias = "assistantContent")]
    pub assistant_content: Vec<ContentBlock>,
    #[serde(default, alias = "toolCallCount")]
    pub tool_call_count: Option<usize>,
    #[serde(default, alias = "loopDepth")]
    pub loop_depth: Option<usize>,
}

#[derive(Debug, Deserialize)]
pub(super) struct EnvelopeCall {
    pub id: String,
    pub name: String,
    #[serde(default, alias = "arguments", alias = "params")]
    pub input: Value,
}

impl From<EnvelopeCall> for PendingToolCall {
    fn from(call: EnvelopeCall) -> Self {
        PendingToolCall {
            id: call.id,
            name: call.name,
            input: input_record(call.input),
        }
    }
}

#[derive(Debug, Deserialize)]
pub(super) struct UsageRecord {
    #[serde(default)]
    pub usage: Option<UsagePatch>,
    #[serde(flatten)]
    pub inline: UsagePatch,
}

impl UsageRecord {
    pub fn patch(self) -> UsagePatch {
        self.usage.unwrap_or(self.inline)
    }
}

/// Tool input may arrive as an object or as serialized JSON text.
pub(super) fn input_record(input: Value) -> Map<String, Value> {
    match input {
        Value::Object(map) => map,
        Value::String(raw) => parse_arguments(&raw),
        _ => Map::new(),
    }
}

/// Human-readable message for the various error record shapes.
pub(super) fn error_message(error: Option<Value>, message: Option<String>) -> String {
    match (error, message) {
        (Some(Value::Object(map)), _) => {
            let kind = map.get("type").and_then(Value::as_str);
            let text = map
                .get("message")
                .and_then(Value::as_str)
                .unwrap_or("unknown error");
            match kind {
                Some(kind) => format!("{kind}: {text}"),
                None => text.to_string(),
            }
        }
        (Some(Value::String(text)), _) => text,
        (_, Some(message)) => message,
        _ => "unknown error".to_string(),
    }
}
