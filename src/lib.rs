//! Agent protocol runtime for tool-using chat backends.
//!
//! The crate turns a streamed backend response into typed [`StreamEvent`]s,
//! executes the tool calls the backend asks for through a pre/post hook
//! pipeline, and feeds the results back until the turn completes.
//!
//! ```no_run
//! use std::sync::Arc;
//!
//! # async fn demo(tools: Arc<dyn agentcore::ToolBackend>) -> Result<(), agentcore::AgentError> {
//! let chat = Arc::new(agentcore::HttpBackend::new(Default::default())?);
//! let runtime = agentcore::AgentRuntime::builder(chat, tools).build();
//! let mut conversation = runtime.conversation();
//! let outcome = conversation
//!     .run_turn("List the Rust files", |event| println!("{event:?}"))
//!     .await?;
//! println!("{}", outcome.text);
//! # Ok(())
//! # }
//! ```

pub mod backend;
pub mod chat;
pub mod coordinator;
pub mod error;
pub mod hooks;
pub mod normalize;
pub mod retry;
pub mod runtime;
pub mod tools;

pub use backend::{HttpBackend, HttpBackendConfig};
pub use chat::{ChatBackend, ChatMessage, PendingToolCall, StreamEvent, ToolSchema, ToolsPendingBatch, Usage};
pub use coordinator::{CoordinatorConfig, ToolCoordinator};
pub use error::AgentError;
pub use hooks::{HookContext, HookRegistry, PostHookResult, PreHookResult};
pub use normalize::{EventCursor, EventNormalizer};
pub use retry::{retry_tool_call, retry_with_backoff, RetryConfig};
pub use runtime::{AgentRuntime, Conversation, RuntimeConfig, TurnOutcome};
pub use tools::{
    NonInteractive, ToolBackend, ToolError, ToolKind, ToolResult, UserInteraction,
};
