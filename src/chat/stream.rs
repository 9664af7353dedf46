use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use super::usage::Usage;

/// A normalized event produced while a backend response streams in.
///
/// Exactly one terminal event (`Done` or `Error`) ends a response stream.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum StreamEvent {
    /// Incremental assistant text
    Text { chars: String },
    /// A tool call was announced; its arguments may still be streaming
    ToolCallStarted { id: String, name: String },
    /// Running token totals
    UsageUpdate {
        input_tokens: u32,
        output_tokens: u32,
    },
    /// A tool the backend ran server-side produced output
    ToolCompleted {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        id: Option<String>,
        name: String,
        output: Value,
    },
    /// A tool the backend ran server-side failed
    ToolFailed {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        id: Option<String>,
        name: String,
        error: String,
    },
    /// The backend paused for tool use; these calls must run before continuing
    ToolsPendingBatch(ToolsPendingBatch),
    /// Terminal failure
    Error { message: String },
    /// Terminal success
    Done,
}

impl StreamEvent {
    pub fn is_terminal(&self) -> bool {
        matches!(self, StreamEvent::Done | StreamEvent::Error { .. })
    }

    pub(crate) fn usage(usage: Usage) -> Self {
        StreamEvent::UsageUpdate {
            input_tokens: usage.input_tokens,
            output_tokens: usage.output_tokens,
        }
    }
}

/// Completed tool calls plus the exact assistant content that produced them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolsPendingBatch {
    pub calls: Vec<PendingToolCall>,
    pub assistant_content: Vec<ContentBlock>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tool_call_count: Option<usize>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub loop_depth: Option<usize>,
}

/// A fully assembled tool call awaiting execution.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PendingToolCall {
    /// Unique within the turn
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub input: Map<String, Value>,
}

/// One block of assistant output, in the order the backend produced it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ContentBlock {
    Text {
        text: String,
    },
    ToolUse {
        id: String,
        name: String,
        #[serde(default)]
        input: Map<String, Value>,
    },
}

impl From<&PendingToolCall> for ContentBlock {
    fn from(call: &PendingToolCall) -> Self {
        ContentBlock::ToolUse {
            id: call.id.clone(),
            name: call.name.clone(),
            input: call.input.clone(),
        }
    }
}

/// A tool call whose arguments are still arriving as opaque string fragments.
#[derive(Debug, Clone, Default)]
pub(crate) struct AccumulatingToolCall {
    pub id: String,
    pub name: String,
    pub partial_arguments: String,
}

impl AccumulatingToolCall {
    pub fn new(id: String, name: String) -> Self {
        Self {
            id,
            name,
            partial_arguments: String::new(),
        }
    }

    pub fn push(&mut self, fragment: &str) {
        self.partial_arguments.push_str(fragment);
    }

    /// Closes the buffer and parses it once. Anything that is not a JSON
    /// object becomes an empty record.
    pub fn finalize(self) -> PendingToolCall {
        let input = parse_arguments(&self.partial_arguments);
        PendingToolCall {
            id: self.id,
            name: self.name,
            input,
        }
    }
}

pub(crate) fn parse_arguments(raw: &str) -> Map<String, Value> {
    if raw.trim().is_empty() {
        return Map::new();
    }
    match serde_json::from_str::<Value>(raw) {
        Ok(Value::Object(map)) => map,
        Ok(_) | Err(_) => {
            log::warn!("discarding unparsable tool arguments ({} bytes)", raw.len());
            Map::new()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use serde_json::json;

    #[test]
    fn finalize_parses_concatenated_fragments() {
        let mut call = AccumulatingToolCall::new("t1".into(), "Search".into());
        call.push("{\"query\":\"");
        call.push("x\"}");
        let done = call.finalize();
        assert_eq!(Value::Object(done.input), json!({"query": "x"}));
    }

    #[test]
    fn finalize_falls_back_to_empty_record() {
        let mut call = AccumulatingToolCall::new("t1".into(), "Search".into());
        call.push("{\"query\":");
        assert!(call.finalize().input.is_empty());

        let mut array = AccumulatingToolCall::new("t2".into(), "Search".into());
        array.push("[1,2]");
        assert!(array.finalize().input.is_empty());
    }

    #[test]
    fn stream_event_serializes_tagged() {
        let event = StreamEvent::ToolCallStarted {
            id: "a".into(),
            name: "Read".into(),
        };
        assert_eq!(
            serde_json::to_value(&event).unwrap(),
            json!({"type": "tool_call_started", "id": "a", "name": "Read"})
        );
    }

    proptest! {
        #[test]
        fn chunked_arguments_match_single_chunk(
            query in "[a-zA-Z0-9 _.-]{0,40}",
            limit in 0u32..500,
            cuts in prop::collection::vec(any::<prop::sample::Index>(), 0..6),
        ) {
            let whole = json!({"query": query, "limit": limit}).to_string();
            let mut points: Vec<usize> = cuts.iter().map(|c| c.index(whole.len() + 1)).collect();
            points.sort_unstable();
            points.dedup();

            let mut call = AccumulatingToolCall::new("id".into(), "Search".into());
            let mut start = 0;
            for point in points {
                call.push(&whole[start..point]);
                start = point;
            }
            call.push(&whole[start..]);

            let expected = parse_arguments(&whole);
            prop_assert_eq!(call.finalize().input, expected);
        }
    }
}
