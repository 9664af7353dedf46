mod message;
mod sse;
mod stream;
mod tool;
mod traits;
mod usage;

pub use message::{ChatMessage, ChatRole, MessagePart};
pub use sse::{ByteStream, Frame, FrameReader};
pub use stream::{ContentBlock, PendingToolCall, StreamEvent, ToolsPendingBatch};
pub use tool::{ParameterProperty, ParametersSchema, ToolSchema};
pub use traits::{ChatBackend, ChatRequest};
pub use usage::Usage;

pub(crate) use stream::{parse_arguments, AccumulatingToolCall};
pub(crate) use usage::UsagePatch;
