use std::collections::VecDeque;

use futures::stream::{self, Stream};
use tokio_util::sync::CancellationToken;

use crate::chat::{ByteStream, Frame, FrameReader, StreamEvent, Usage};
use crate::error::AgentError;

use super::EventNormalizer;

/// Pull-based cursor over the normalized events of one backend response.
///
/// The underlying body is released as soon as a terminal event is handed
/// out, the token is cancelled, or the cursor is dropped.
pub struct EventCursor {
    reader: FrameReader,
    normalizer: EventNormalizer,
    queued: VecDeque<StreamEvent>,
    cancel: CancellationToken,
    finished: bool,
}

enum Step {
    Cancelled,
    Frame(Option<Result<Frame, AgentError>>),
}

impl EventCursor {
    pub fn new(body: ByteStream, cancel: CancellationToken) -> Self {
        Self {
            reader: FrameReader::new(body),
            normalizer: EventNormalizer::new(),
            queued: VecDeque::new(),
            cancel,
            finished: false,
        }
    }

    /// Next event, or `None` once the stream is finished or cancelled.
    /// At most one terminal event is ever returned.
    pub async fn next(&mut self) -> Option<StreamEvent> {
        loop {
            if self.finished {
                return None;
            }
            if self.cancel.is_cancelled() {
                self.abort();
                return None;
            }
            if let Some(event) = self.queued.pop_front() {
                if event.is_terminal() {
                    self.close();
                }
                return Some(event);
            }

            let step = tokio::select! {
                biased;
                _ = self.cancel.cancelled() => Step::Cancelled,
                frame = self.reader.next_frame() => Step::Frame(frame),
            };

            match step {
                Step::Cancelled => {
                    self.abort();
                    return None;
                }
                Step::Frame(Some(Ok(frame))) => {
                    let events = self.normalizer.push_frame(&frame);
                    self.queued.extend(events);
                }
                Step::Frame(Some(Err(err))) => {
                    log::warn!("stream read failed: {err}");
                    let events = self.normalizer.fail(err.to_string());
                    self.queued.extend(events);
                }
                Step::Frame(None) => {
                    let events = self.normalizer.finish();
                    self.queued.extend(events);
                }
            }
        }
    }

    /// Usage as last reported by the backend.
    pub fn usage(&self) -> Usage {
        self.normalizer.usage()
    }

    pub fn is_finished(&self) -> bool {
        self.finished
    }

    /// Adapts the cursor into a [`Stream`] of events.
    pub fn into_stream(self) -> impl Stream<Item = StreamEvent> + Send {
        stream::unfold(self, |mut cursor| async move {
            let event = cursor.next().await?;
            Some((event, cursor))
        })
    }

    fn close(&mut self) {
        self.finished = true;
        self.queued.clear();
        self.reader.release();
    }

    fn abort(&mut self) {
        log::debug!("event cursor cancelled");
        self.close();
    }
}

impl Drop for EventCursor {
    fn drop(&mut self) {
        self.reader.release();
    }
}
