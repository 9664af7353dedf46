//! Tool identities, results and the collaborator traits the coordinator
//! dispatches to.

mod backend;
mod error;
mod interaction;
mod kind;
mod result;
mod safety;
mod todo;

pub use backend::ToolBackend;
pub use error::ToolError;
pub use interaction::{NonInteractive, UserInteraction, NO_ANSWER_MARKER};
pub use kind::{ExecutionClass, ToolKind};
pub use result::{ErrorType, RetryRequest, ToolCallResult, ToolResult};
pub use safety::{classify_command, DangerCategory, DangerousOperation};
pub use todo::{TodoItem, TodoStatus, TodoSummary};
