use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Coarse failure category attached by the error classifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorType {
    /// The model can fix the call (wrong path, missing read, bad args).
    Recoverable,
    /// Retrying the same call may succeed (timeouts, rate limits).
    Transient,
    /// Retrying will not help (permissions, disk full).
    Fatal,
    Unknown,
}

/// Outcome of one tool dispatch, as fed back to the model.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ToolResult {
    pub success: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    /// The user declined the operation; distinct from a failure.
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub cancelled: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error_type: Option<ErrorType>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub suggestion: Option<String>,
    /// Tool-specific fields carried alongside the result.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl ToolResult {
    pub fn ok(content: impl Into<String>) -> Self {
        Self {
            success: true,
            content: Some(content.into()),
            ..Self::default()
        }
    }

    pub fn failure(error: impl Into<String>) -> Self {
        Self {
            success: false,
            error: Some(error.into()),
            ..Self::default()
        }
    }

    pub fn cancelled(reason: impl Into<String>) -> Self {
        Self {
            success: false,
            cancelled: true,
            error: Some(reason.into()),
            ..Self::default()
        }
    }

    pub fn with_suggestion(mut self, suggestion: impl Into<String>) -> Self {
        self.suggestion = Some(suggestion.into());
        self
    }

    pub fn with_extra(mut self, key: &str, value: Value) -> Self {
        self.extra.insert(key.to_string(), value);
        self
    }

    pub fn is_failure(&self) -> bool {
        !self.success && !self.cancelled
    }

    /// Text handed back to the model as the `tool_result` content.
    pub fn model_text(&self) -> String {
        if self.success {
            return self.content.clone().unwrap_or_default();
        }
        let mut text = match (&self.error, self.cancelled) {
            (Some(error), true) => format!("Cancelled: {error}"),
            (None, true) => "Cancelled by user".to_string(),
            (Some(error), false) => format!("Error: {error}"),
            (None, false) => "Error: tool failed".to_string(),
        };
        if let Some(suggestion) = &self.suggestion {
            text.push_str("\nSuggestion: ");
            text.push_str(suggestion);
        }
        text
    }
}

/// A post-hook's request to run the same call again.
#[derive(Debug, Clone, PartialEq)]
pub struct RetryRequest {
    /// Parameters for the retry; `None` keeps the original ones.
    pub params: Option<Map<String, Value>>,
}

/// Coordinator output for one call of a batch.
#[derive(Debug, Clone, PartialEq)]
pub struct ToolCallResult {
    pub id: String,
    pub name: String,
    pub result: ToolResult,
    pub retry: Option<RetryRequest>,
}
