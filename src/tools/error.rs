//! Tool execution error types.

/// Errors a [`ToolBackend`](super::ToolBackend) may return. The coordinator
/// folds every variant into a failed [`ToolResult`](super::ToolResult).
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum ToolError {
    /// Invalid arguments provided to the tool.
    #[error("invalid tool arguments: {0}")]
    InvalidArgs(String),

    /// Tool execution failed with a message to show the model.
    #[error("tool execution failed: {0}")]
    Execution(String),

    /// The backend does not provide this tool.
    #[error("Unknown tool: {0}")]
    NotFound(String),

    /// Tool execution was denied by a permission check.
    #[error("tool denied: {0}")]
    Denied(String),

    /// Fatal error that cannot be recovered.
    #[error("fatal error: {0}")]
    Fatal(String),
}

impl From<std::io::Error> for ToolError {
    fn from(err: std::io::Error) -> Self {
        ToolError::Execution(err.to_string())
    }
}
