//! Wire event normalization.
//!
//! [`EventNormalizer`] is the synchronous state machine that turns frames into
//! [`StreamEvent`]s; [`EventCursor`] drives it over an asynchronous body.
//!
//! Three dialects are understood:
//! - the fine-grained delta dialect (`message_start` … `message_stop`), where
//!   tool arguments arrive as string fragments and are reassembled here;
//! - the pre-batched envelope dialect (`tools_pending`), passed through;
//! - the plain text/tool dialect (`text`, `tool_result`, `usage`, `done`, …).

mod cursor;
mod wire;

use std::collections::HashSet;

use crate::chat::{
    AccumulatingToolCall, ContentBlock, Frame, PendingToolCall, StreamEvent, ToolsPendingBatch,
    Usage, UsagePatch,
};

use wire::{error_message, input_record, BlockDelta, BlockStart, Envelope, WireRecord};

pub use cursor::EventCursor;

/// Stop reason announcing that the backend paused for tool execution.
pub const STOP_REASON_TOOL_USE: &str = "tool_use";

/// Reassembles discrete events from wire frames.
///
/// One instance serves one backend response. Tool-call ids are tracked for
/// the lifetime of the instance and never reused.
#[derive(Debug, Default)]
pub struct EventNormalizer {
    in_flight: Option<AccumulatingToolCall>,
    in_flight_prefilled: bool,
    open_index: Option<usize>,
    text_block: Option<String>,
    loose_text: String,
    content_blocks: Vec<ContentBlock>,
    pending: Vec<PendingToolCall>,
    seen_ids: HashSet<String>,
    usage: Usage,
    stop_reason: Option<String>,
    finished: bool,
}

impl EventNormalizer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Last usage reported by the backend.
    pub fn usage(&self) -> Usage {
        self.usage
    }

    pub fn stop_reason(&self) -> Option<&str> {
        self.stop_reason.as_deref()
    }

    pub fn is_finished(&self) -> bool {
        self.finished
    }

    /// Feeds one frame. Frames that cannot be parsed are dropped.
    pub fn push_frame(&mut self, frame: &Frame) -> Vec<StreamEvent> {
        if self.finished {
            return Vec::new();
        }
        match frame {
            Frame::Done => self.finish(),
            Frame::Data(payload) => match serde_json::from_str::<WireRecord>(payload) {
                Ok(record) => self.apply(record),
                Err(err) => self.reject_payload(payload, &err),
            },
        }
    }

    /// Marks the end of the body. Emits `Done` unless a terminal event was
    /// already produced. Unfinished tool calls are discarded.
    pub fn finish(&mut self) -> Vec<StreamEvent> {
        if self.finished {
            return Vec::new();
        }
        self.finished = true;
        if let Some(call) = self.in_flight.take() {
            log::warn!("stream ended while tool call {} was still streaming", call.id);
        }
        vec![StreamEvent::Done]
    }

    /// Terminates the stream with an error.
    pub fn fail(&mut self, message: impl Into<String>) -> Vec<StreamEvent> {
        if self.finished {
            return Vec::new();
        }
        self.finished = true;
        self.in_flight = None;
        vec![StreamEvent::Error {
            message: message.into(),
        }]
    }

    fn reject_payload(&mut self, payload: &str, err: &serde_json::Error) -> Vec<StreamEvent> {
        // A malformed `done` tail is the one parse failure that ends the turn.
        let is_done_tail = serde_json::from_str::<serde_json::Value>(payload)
            .ok()
            .and_then(|value| value.get("type").and_then(|t| t.as_str()).map(str::to_owned))
            .is_some_and(|kind| kind == "done");
        if is_done_tail {
            return self.fail(format!("malformed done record: {err}"));
        }
        log::debug!("skipping unparsable frame: {err}");
        Vec::new()
    }

    fn apply(&mut self, record: WireRecord) -> Vec<StreamEvent> {
        match record {
            WireRecord::MessageStart { message } => {
                self.stop_reason = None;
                self.apply_usage(message.usage)
            }
            WireRecord::ContentBlockStart {
                index,
                content_block,
            } => {
                let events = self.start_block(content_block);
                self.open_index = Some(index);
                events
            }
            WireRecord::ContentBlockDelta { index, delta } => {
                self.check_index("delta", index);
                self.apply_delta(delta)
            }
            WireRecord::ContentBlockStop { index } => {
                self.check_index("stop", index);
                self.stop_block();
                self.open_index = None;
                Vec::new()
            }
            WireRecord::MessageDelta { delta, usage } => {
                let mut events = self.apply_usage(usage);
                if let Some(reason) = delta.stop_reason {
                    events.extend(self.observe_stop_reason(reason));
                }
                events
            }
            WireRecord::MessageStop => self.finish(),
            WireRecord::Ping => Vec::new(),
            WireRecord::ToolsPending(envelope) => vec![self.pass_through(envelope)],
            WireRecord::Text { text } => {
                self.push_text(&text);
                vec![StreamEvent::Text { chars: text }]
            }
            WireRecord::ToolUse { id, name, input } => self.announce_complete(id, name, input),
            WireRecord::ToolResult { id, name, output } => {
                vec![StreamEvent::ToolCompleted { id, name, output }]
            }
            WireRecord::ToolError { id, name, error } => {
                vec![StreamEvent::ToolFailed { id, name, error }]
            }
            WireRecord::Usage(record) => self.apply_usage(Some(record.patch())),
            WireRecord::Error { error, message } => {
                let message = error_message(error, message);
                log::warn!("backend reported error: {message}");
                self.fail(message)
            }
            WireRecord::Done { usage, stop_reason } => {
                let mut events = self.apply_usage(usage);
                if let Some(reason) = stop_reason {
                    events.extend(self.observe_stop_reason(reason));
                }
                events.extend(self.finish());
                events
            }
        }
    }

    /// Blocks never interleave; a mismatched index is logged and the record
    /// is applied to the open block.
    fn check_index(&self, record: &str, index: usize) {
        if let Some(open) = self.open_index {
            if open != index {
                log::debug!("content block {record} for index {index} while block {open} is open");
            }
        }
    }

    fn apply_usage(&mut self, patch: Option<UsagePatch>) -> Vec<StreamEvent> {
        match patch {
            Some(patch) if self.usage.apply(patch) => vec![StreamEvent::usage(self.usage)],
            _ => Vec::new(),
        }
    }

    fn start_block(&mut self, block: BlockStart) -> Vec<StreamEvent> {
        match block {
            BlockStart::Text { text } => {
                self.close_text_block();
                self.flush_loose_text();
                let events = if text.is_empty() {
                    Vec::new()
                } else {
                    vec![StreamEvent::Text {
                        chars: text.clone(),
                    }]
                };
                self.text_block = Some(text);
                events
            }
            BlockStart::ToolUse { id, name, input } => {
                self.stop_block();
                self.flush_loose_text();
                if !self.seen_ids.insert(id.clone()) {
                    log::warn!("dropping tool call with reused id {id}");
                    return Vec::new();
                }
                let mut call = AccumulatingToolCall::new(id.clone(), name.clone());
                self.in_flight_prefilled = false;
                if let serde_json::Value::Object(map) = &input {
                    if !map.is_empty() {
                        call.push(&input.to_string());
                        self.in_flight_prefilled = true;
                    }
                }
                self.in_flight = Some(call);
                vec![StreamEvent::ToolCallStarted { id, name }]
            }
            BlockStart::Other => {
                self.stop_block();
                Vec::new()
            }
        }
    }

    fn apply_delta(&mut self, delta: BlockDelta) -> Vec<StreamEvent> {
        match delta {
            BlockDelta::TextDelta { text } => {
                match self.text_block.as_mut() {
                    Some(block) => block.push_str(&text),
                    None => self.loose_text.push_str(&text),
                }
                vec![StreamEvent::Text { chars: text }]
            }
            BlockDelta::InputJsonDelta { partial_json } => {
                if let Some(call) = self.in_flight.as_mut() {
                    if self.in_flight_prefilled {
                        call.partial_arguments.clear();
                        self.in_flight_prefilled = false;
                    }
                    call.push(&partial_json);
                }
                Vec::new()
            }
            BlockDelta::Other => Vec::new(),
        }
    }

    fn stop_block(&mut self) {
        if let Some(call) = self.in_flight.take() {
            self.in_flight_prefilled = false;
            let call = call.finalize();
            self.content_blocks.push(ContentBlock::from(&call));
            self.pending.push(call);
        }
        self.close_text_block();
    }

    fn close_text_block(&mut self) {
        if let Some(text) = self.text_block.take() {
            if !text.is_empty() {
                self.content_blocks.push(ContentBlock::Text { text });
            }
        }
    }

    fn push_text(&mut self, text: &str) {
        match self.text_block.as_mut() {
            Some(block) => block.push_str(text),
            None => self.loose_text.push_str(text),
        }
    }

    fn flush_loose_text(&mut self) {
        if !self.loose_text.is_empty() {
            let text = std::mem::take(&mut self.loose_text);
            self.content_blocks.push(ContentBlock::Text { text });
        }
    }

    /// Plain dialect: a call announced with its complete input.
    fn announce_complete(
        &mut self,
        id: String,
        name: String,
        input: serde_json::Value,
    ) -> Vec<StreamEvent> {
        self.stop_block();
        self.flush_loose_text();
        if !self.seen_ids.insert(id.clone()) {
            log::warn!("dropping tool call with reused id {id}");
            return Vec::new();
        }
        let call = PendingToolCall {
            id: id.clone(),
            name: name.clone(),
            input: input_record(input),
        };
        self.content_blocks.push(ContentBlock::from(&call));
        self.pending.push(call);
        vec![StreamEvent::ToolCallStarted { id, name }]
    }

    fn observe_stop_reason(&mut self, reason: String) -> Vec<StreamEvent> {
        let is_tool_use = reason == STOP_REASON_TOOL_USE;
        self.stop_reason = Some(reason);
        if !is_tool_use {
            return Vec::new();
        }
        self.take_batch()
            .map(StreamEvent::ToolsPendingBatch)
            .into_iter()
            .collect()
    }

    /// Assembles the batch for the current turn-continuation boundary and
    /// resets accumulation state.
    fn take_batch(&mut self) -> Option<ToolsPendingBatch> {
        self.stop_block();
        self.flush_loose_text();
        if self.pending.is_empty() {
            log::debug!("tool_use stop reason without completed calls; no batch");
            return None;
        }
        let calls = std::mem::take(&mut self.pending);
        let assistant_content = std::mem::take(&mut self.content_blocks);
        Some(ToolsPendingBatch {
            tool_call_count: Some(calls.len()),
            calls,
            assistant_content,
            loop_depth: None,
        })
    }

    fn pass_through(&mut self, envelope: Envelope) -> StreamEvent {
        // Anything accumulated from other dialects is superseded by the envelope.
        self.in_flight = None;
        self.open_index = None;
        self.text_block = None;
        self.loose_text.clear();
        self.pending.clear();
        self.content_blocks.clear();

        let calls: Vec<PendingToolCall> = envelope
            .tool_calls
            .into_iter()
            .map(PendingToolCall::from)
            .collect();
        for call in &calls {
            self.seen_ids.insert(call.id.clone());
        }
        let assistant_content = if envelope.assistant_content.is_empty() {
            calls.iter().map(ContentBlock::from).collect()
        } else {
            envelope.assistant_content
        };
        StreamEvent::ToolsPendingBatch(ToolsPendingBatch {
            tool_call_count: envelope.tool_call_count.or(Some(calls.len())),
            loop_depth: envelope.loop_depth,
            calls,
            assistant_content,
        })
    }
}
