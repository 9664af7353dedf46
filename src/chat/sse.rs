use std::collections::VecDeque;
use std::pin::Pin;

use bytes::Bytes;
use futures::stream::{Stream, StreamExt};

use crate::error::AgentError;

const LINE_DELIMITER: char = '\n';
const DATA_PREFIX: &str = "data:";
const DONE_SENTINEL: &str = "[DONE]";

/// Raw response body as delivered by a chat backend.
pub type ByteStream = Pin<Box<dyn Stream<Item = Result<Bytes, AgentError>> + Send>>;

/// One logical frame of a line-delimited event stream.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Frame {
    /// JSON payload of a `data:` line (or a bare JSON line).
    Data(String),
    /// The `[DONE]` terminator.
    Done,
}

/// Splits a byte stream into frames, tolerating chunk boundaries that fall
/// inside a line or inside a multi-byte UTF-8 sequence.
pub struct FrameReader {
    inner: Option<ByteStream>,
    state: LineState,
    queued: VecDeque<Frame>,
}

impl FrameReader {
    pub fn new(stream: ByteStream) -> Self {
        Self {
            inner: Some(stream),
            state: LineState::default(),
            queued: VecDeque::new(),
        }
    }

    /// Pulls the next frame. Returns `None` once the body is exhausted or the
    /// reader was released. A transport error releases the reader.
    pub async fn next_frame(&mut self) -> Option<Result<Frame, AgentError>> {
        loop {
            if let Some(frame) = self.queued.pop_front() {
                return Some(Ok(frame));
            }
            let inner = self.inner.as_mut()?;
            match inner.next().await {
                Some(Ok(bytes)) => {
                    self.state.push_bytes(&bytes);
                    self.queued.extend(self.state.drain_lines());
                }
                Some(Err(err)) => {
                    self.release();
                    return Some(Err(err));
                }
                None => {
                    self.inner = None;
                    self.queued.extend(self.state.flush_tail());
                }
            }
        }
    }

    /// Drops the underlying body. Idempotent.
    pub fn release(&mut self) {
        if self.inner.take().is_some() {
            log::debug!("frame reader released");
        }
        self.queued.clear();
    }

    pub fn is_released(&self) -> bool {
        self.inner.is_none() && self.queued.is_empty()
    }
}

#[derive(Default)]
struct LineState {
    buffer: String,
    utf8_buffer: Vec<u8>,
}

impl LineState {
    fn push_bytes(&mut self, bytes: &[u8]) {
        self.utf8_buffer.extend_from_slice(bytes);
        loop {
            match std::str::from_utf8(&self.utf8_buffer) {
                Ok(text) => {
                    self.buffer.push_str(text);
                    self.utf8_buffer.clear();
                    return;
                }
                Err(err) => {
                    self.consume_valid_prefix(err.valid_up_to());
                    match err.error_len() {
                        // Incomplete sequence at the end: wait for more bytes.
                        None => return,
                        Some(len) => {
                            self.buffer.push(char::REPLACEMENT_CHARACTER);
                            self.utf8_buffer.drain(..len);
                        }
                    }
                }
            }
        }
    }

    fn consume_valid_prefix(&mut self, valid_up_to: usize) {
        if valid_up_to == 0 {
            return;
        }

        let valid = String::from_utf8_lossy(&self.utf8_buffer[..valid_up_to]);
        self.buffer.push_str(&valid);
        self.utf8_buffer.drain(..valid_up_to);
    }

    fn drain_lines(&mut self) -> Vec<Frame> {
        let mut frames = Vec::new();
        while let Some(pos) = self.buffer.find(LINE_DELIMITER) {
            let line: String = self.buffer.drain(..=pos).collect();
            if let Some(frame) = parse_line(&line) {
                frames.push(frame);
            }
        }
        frames
    }

    fn flush_tail(&mut self) -> Vec<Frame> {
        let mut frames = self.drain_lines();
        let tail = std::mem::take(&mut self.buffer);
        if let Some(frame) = parse_line(&tail) {
            frames.push(frame);
        }
        frames
    }
}

fn parse_line(line: &str) -> Option<Frame> {
    let line = line.trim();
    if line.is_empty() || line.starts_with(':') {
        return None;
    }
    if let Some(payload) = line.strip_prefix(DATA_PREFIX) {
        let payload = payload.trim_start();
        return match payload {
            "" => None,
            DONE_SENTINEL => Some(Frame::Done),
            _ => Some(Frame::Data(payload.to_string())),
        };
    }
    if line == DONE_SENTINEL {
        return Some(Frame::Done);
    }
    // Some simpler backends emit bare JSON lines without the sentinel.
    if line.starts_with('{') {
        return Some(Frame::Data(line.to_string()));
    }
    None
}

#[cfg(test)]
#[path = "sse_tests.rs"]
mod tests;
