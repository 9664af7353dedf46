use thiserror::Error;

/// Error types that can terminate a conversation turn.
///
/// Tool dispatch failures never surface here; they are folded into
/// [`ToolResult`](crate::tools::ToolResult)s and fed back to the model.
#[derive(Debug, Error)]
pub enum AgentError {
    /// HTTP request/response errors
    #[error("HTTP error: {0}")]
    Http(String),
    /// Non-success status returned by the chat backend
    #[error("Provider error ({status}): {body}")]
    Provider { status: u16, body: String },
    /// Invalid request parameters or configuration
    #[error("Invalid request: {0}")]
    InvalidRequest(String),
    /// The response stream failed or ended with an error event
    #[error("Stream error: {0}")]
    Stream(String),
    /// JSON serialization/deserialization errors
    #[error("JSON parse error: {0}")]
    Json(String),
    /// The turn was cancelled by the caller
    #[error("Turn cancelled")]
    Cancelled,
    /// The model kept requesting tools past the configured ceiling
    #[error("Tool loop limit of {0} reached")]
    LoopLimit(usize),
    /// Retry attempts exceeded
    #[error("Retry attempts exceeded after {attempts} tries: {last_error}")]
    RetryExceeded { attempts: usize, last_error: String },
}

impl AgentError {
    /// Whether retrying the same operation may succeed.
    pub fn is_retryable(&self) -> bool {
        match self {
            AgentError::Http(_) => true,
            AgentError::Stream(_) => true,
            AgentError::Provider { status, .. } => *status == 429 || *status >= 500,
            AgentError::Json(_) => true,
            AgentError::InvalidRequest(_) => false,
            AgentError::Cancelled => false,
            AgentError::LoopLimit(_) => false,
            AgentError::RetryExceeded { .. } => false,
        }
    }
}

/// Converts reqwest HTTP errors into AgentErrors
impl From<reqwest::Error> for AgentError {
    fn from(err: reqwest::Error) -> Self {
        AgentError::Http(err.to_string())
    }
}

impl From<serde_json::Error> for AgentError {
    fn from(err: serde_json::Error) -> Self {
        AgentError::Json(format!(
            "{} at line {} column {}",
            err,
            err.line(),
            err.column()
        ))
    }
}
