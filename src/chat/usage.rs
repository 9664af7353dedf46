use serde::{Deserialize, Serialize};

/// Token usage reported by the backend.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Usage {
    /// Number of tokens in the prompt
    #[serde(default, alias = "prompt_tokens", alias = "inputTokens")]
    pub input_tokens: u32,
    /// Number of tokens in the completion
    #[serde(default, alias = "completion_tokens", alias = "outputTokens")]
    pub output_tokens: u32,
}

/// Partial usage as carried by individual wire records; absent fields keep
/// the previously reported value.
#[derive(Debug, Clone, Copy, Default, Deserialize)]
pub(crate) struct UsagePatch {
    #[serde(default, alias = "prompt_tokens", alias = "inputTokens")]
    pub input_tokens: Option<u32>,
    #[serde(default, alias = "completion_tokens", alias = "outputTokens")]
    pub output_tokens: Option<u32>,
}

impl Usage {
    /// Returns whether the patch carried any field.
    pub(crate) fn apply(&mut self, patch: UsagePatch) -> bool {
        if let Some(input) = patch.input_tokens {
            self.input_tokens = input;
        }
        if let Some(output) = patch.output_tokens {
            self.output_tokens = output;
        }
        patch.input_tokens.is_some() || patch.output_tokens.is_some()
    }

    pub fn total(&self) -> u32 {
        self.input_tokens.saturating_add(self.output_tokens)
    }
}
