use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::stream::ContentBlock;

/// Role of a participant in a chat conversation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChatRole {
    /// The user/human participant in the conversation
    User,
    /// The AI assistant participant in the conversation
    Assistant,
}

/// One content part of a message, in the backend's block format.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum MessagePart {
    Text {
        text: String,
    },
    ToolUse {
        id: String,
        name: String,
        input: serde_json::Map<String, Value>,
    },
    ToolResult {
        tool_use_id: String,
        content: String,
        #[serde(default, skip_serializing_if = "std::ops::Not::not")]
        is_error: bool,
    },
}

impl From<ContentBlock> for MessagePart {
    fn from(block: ContentBlock) -> Self {
        match block {
            ContentBlock::Text { text } => MessagePart::Text { text },
            ContentBlock::ToolUse { id, name, input } => MessagePart::ToolUse { id, name, input },
        }
    }
}

/// A single message in a chat conversation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatMessage {
    /// The role of who sent this message (user or assistant)
    pub role: ChatRole,
    /// Ordered content parts
    pub content: Vec<MessagePart>,
}

impl ChatMessage {
    /// A plain user text message
    pub fn user(text: impl Into<String>) -> Self {
        Self {
            role: ChatRole::User,
            content: vec![MessagePart::Text { text: text.into() }],
        }
    }

    /// An assistant message reproducing the blocks of one response
    pub fn assistant(blocks: Vec<ContentBlock>) -> Self {
        Self {
            role: ChatRole::Assistant,
            content: blocks.into_iter().map(MessagePart::from).collect(),
        }
    }

    /// A user message carrying tool results back to the backend
    pub fn tool_results(parts: Vec<MessagePart>) -> Self {
        Self {
            role: ChatRole::User,
            content: parts,
        }
    }

    /// Concatenated text parts.
    pub fn text(&self) -> String {
        self.content
            .iter()
            .filter_map(|part| match part {
                MessagePart::Text { text } => Some(text.as_str()),
                _ => None,
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn tool_result_parts_use_backend_wire_shape() {
        let message = ChatMessage::tool_results(vec![
            MessagePart::ToolResult {
                tool_use_id: "t1".into(),
                content: "ok".into(),
                is_error: false,
            },
            MessagePart::ToolResult {
                tool_use_id: "t2".into(),
                content: "boom".into(),
                is_error: true,
            },
        ]);
        assert_eq!(
            serde_json::to_value(&message).unwrap(),
            json!({
                "role": "user",
                "content": [
                    {"type": "tool_result", "tool_use_id": "t1", "content": "ok"},
                    {"type": "tool_result", "tool_use_id": "t2", "content": "boom", "is_error": true}
                ]
            })
        );
    }

    #[test]
    fn assistant_message_preserves_block_order() {
        let message = ChatMessage::assistant(vec![
            ContentBlock::Text {
                text: "Looking".into(),
            },
            ContentBlock::ToolUse {
                id: "t1".into(),
                name: "Read".into(),
                input: serde_json::Map::new(),
            },
        ]);
        assert_eq!(message.role, ChatRole::Assistant);
        assert!(matches!(message.content[0], MessagePart::Text { .. }));
        assert!(matches!(message.content[1], MessagePart::ToolUse { .. }));
        assert_eq!(message.text(), "Looking");
    }
}
