use std::path::PathBuf;

use serde_json::{Map, Value};

use crate::tools::{ToolKind, ToolResult};

/// What a hook sees about the call being dispatched.
#[derive(Debug, Clone)]
pub struct HookContext {
    /// Canonical tool name.
    pub tool_name: String,
    pub kind: ToolKind,
    pub params: Map<String, Value>,
    pub working_directory: PathBuf,
    pub conversation_id: Option<String>,
    /// 0 for the first attempt.
    pub retry_count: u32,
}

impl HookContext {
    pub fn new(name: &str, params: Map<String, Value>, working_directory: PathBuf) -> Self {
        let kind = ToolKind::from_name(name);
        Self {
            tool_name: kind.canonical_name().to_string(),
            kind,
            params,
            working_directory,
            conversation_id: None,
            retry_count: 0,
        }
    }

    pub fn with_conversation(mut self, conversation_id: Option<String>) -> Self {
        self.conversation_id = conversation_id;
        self
    }

    pub fn with_retry_count(mut self, retry_count: u32) -> Self {
        self.retry_count = retry_count;
        self
    }

    /// First string parameter among `keys`.
    pub fn str_param(&self, keys: &[&str]) -> Option<&str> {
        keys.iter()
            .find_map(|key| self.params.get(*key).and_then(Value::as_str))
    }
}

/// Verdict of a pre-execution hook.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PreHookResult {
    pub proceed: bool,
    pub modified_params: Option<Map<String, Value>>,
    pub error: Option<String>,
    pub suggestion: Option<String>,
}

impl PreHookResult {
    pub fn proceed() -> Self {
        Self {
            proceed: true,
            ..Self::default()
        }
    }

    pub fn modify(params: Map<String, Value>) -> Self {
        Self {
            proceed: true,
            modified_params: Some(params),
            ..Self::default()
        }
    }

    pub fn reject(error: impl Into<String>, suggestion: Option<String>) -> Self {
        Self {
            proceed: false,
            error: Some(error.into()),
            suggestion,
            ..Self::default()
        }
    }
}

/// Output of a post-execution hook.
#[derive(Debug, Clone, PartialEq)]
pub struct PostHookResult {
    pub result: ToolResult,
    pub should_retry: bool,
    pub retry_params: Option<Map<String, Value>>,
    pub follow_up_action: Option<String>,
}

impl PostHookResult {
    pub fn pass(result: ToolResult) -> Self {
        Self {
            result,
            should_retry: false,
            retry_params: None,
            follow_up_action: None,
        }
    }

    pub fn retry(result: ToolResult, retry_params: Option<Map<String, Value>>) -> Self {
        Self {
            result,
            should_retry: true,
            retry_params,
            follow_up_action: None,
        }
    }

    pub fn with_follow_up(mut self, action: impl Into<String>) -> Self {
        self.follow_up_action = Some(action.into());
        self
    }
}

/// Combined outcome of the pre-hook chain.
#[derive(Debug, Clone, PartialEq)]
pub enum PreDecision {
    Proceed(Map<String, Value>),
    Reject {
        error: String,
        suggestion: Option<String>,
    },
}
