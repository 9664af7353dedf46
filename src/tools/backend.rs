use async_trait::async_trait;
use serde_json::{Map, Value};

use crate::chat::ToolSchema;

use super::error::ToolError;
use super::result::ToolResult;

/// Executes the concrete tools (file I/O, shell, remote services).
///
/// Implementations must tolerate concurrent calls; the coordinator runs
/// parallel-safe tools at the same time.
#[async_trait]
pub trait ToolBackend: Send + Sync {
    /// Runs `name` with `params`. Unknown tools should return
    /// [`ToolError::NotFound`].
    async fn execute(&self, name: &str, params: &Map<String, Value>)
        -> Result<ToolResult, ToolError>;

    /// Schemas advertised to the chat backend.
    fn definitions(&self) -> Vec<ToolSchema>;
}
