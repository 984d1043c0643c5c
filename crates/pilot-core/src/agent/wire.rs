use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, Deserialize, Serialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    User,
    Assistant,
}

/// Base64 image envelope in the shape the remote model expects.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq, Eq)]
pub struct ImageSource {
    #[serde(rename = "type")]
    pub source_type: String,
    pub media_type: String,
    pub data: String,
}

impl ImageSource {
    pub fn png_base64(data: impl Into<String>) -> Self {
        Self {
            source_type: "base64".to_string(),
            media_type: "image/png".to_string(),
            data: data.into(),
        }
    }
}

/// One content block of a message.
///
/// The set mirrors the remote model's wire contract: plain text, an inline
/// image, a tool invocation proposed by the model, and a tool result fed back
/// by us. `ToolResult` carries nested blocks so a screenshot can be returned
/// as an image.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ContentBlock {
    Text {
        text: String,
    },
    Image {
        source: ImageSource,
    },
    ToolUse {
        id: String,
        name: String,
        #[serde(default)]
        input: serde_json::Value,
    },
    ToolResult {
        tool_use_id: String,
        content: Vec<ContentBlock>,
        #[serde(default, skip_serializing_if = "is_false")]
        is_error: bool,
    },
}

fn is_false(v: &bool) -> bool {
    !v
}

impl ContentBlock {
    pub fn text(text: impl Into<String>) -> Self {
        ContentBlock::Text { text: text.into() }
    }
}

/// A message exchanged with the remote model. Immutable once appended to the
/// conversation window.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
pub struct Message {
    pub role: Role,
    pub content: Vec<ContentBlock>,
}

impl Message {
    pub fn user(content: Vec<ContentBlock>) -> Self {
        Self {
            role: Role::User,
            content,
        }
    }

    pub fn user_text(text: impl Into<String>) -> Self {
        Self::user(vec![ContentBlock::text(text)])
    }

    pub fn assistant(content: Vec<ContentBlock>) -> Self {
        Self {
            role: Role::Assistant,
            content,
        }
    }
}

/// A tool invocation lifted out of an assistant reply, correlated by the
/// model-assigned `id`.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
pub struct ToolUseRequest {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub input: serde_json::Value,
}

/// Extracts the tool invocations from a reply's content blocks, in order.
pub fn collect_tool_uses(content: &[ContentBlock]) -> Vec<ToolUseRequest> {
    content
        .iter()
        .filter_map(|block| match block {
            ContentBlock::ToolUse { id, name, input } => Some(ToolUseRequest {
                id: id.clone(),
                name: name.clone(),
                input: input.clone(),
            }),
            _ => None,
        })
        .collect()
}

/// Concatenates the free-text "thoughts" blocks of a reply, if any.
pub fn collect_thoughts(content: &[ContentBlock]) -> Option<String> {
    let text: Vec<&str> = content
        .iter()
        .filter_map(|block| match block {
            ContentBlock::Text { text } => Some(text.as_str()),
            _ => None,
        })
        .collect();
    if text.is_empty() {
        None
    } else {
        Some(text.join("\n"))
    }
}

#[derive(Debug, Clone, Copy, Default, Deserialize, Serialize, PartialEq, Eq)]
pub struct TokenUsage {
    #[serde(default)]
    pub input_tokens: u64,
    #[serde(default)]
    pub output_tokens: u64,
}

impl TokenUsage {
    pub fn add(&mut self, other: TokenUsage) {
        self.input_tokens = self.input_tokens.saturating_add(other.input_tokens);
        self.output_tokens = self.output_tokens.saturating_add(other.output_tokens);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn content_block_serializes_with_type_tag() {
        let block = ContentBlock::text("hello");
        let v = serde_json::to_value(&block).unwrap();
        assert_eq!(v["type"], "text");
        assert_eq!(v["text"], "hello");
    }

    #[test]
    fn tool_result_omits_is_error_when_false() {
        let block = ContentBlock::ToolResult {
            tool_use_id: "tu_1".to_string(),
            content: vec![ContentBlock::text("ok")],
            is_error: false,
        };
        let v = serde_json::to_value(&block).unwrap();
        assert!(v.get("is_error").is_none());
    }

    #[test]
    fn tool_use_roundtrips() {
        let json = r#"{"type":"tool_use","id":"tu_9","name":"press_key","input":{"key":"w"}}"#;
        let block: ContentBlock = serde_json::from_str(json).unwrap();
        let uses = collect_tool_uses(std::slice::from_ref(&block));
        assert_eq!(uses.len(), 1);
        assert_eq!(uses[0].id, "tu_9");
        assert_eq!(uses[0].name, "press_key");
        assert_eq!(uses[0].input["key"], "w");
    }

    #[test]
    fn thoughts_skip_non_text_blocks() {
        let content = vec![
            ContentBlock::text("thinking"),
            ContentBlock::ToolUse {
                id: "tu_1".to_string(),
                name: "wait".to_string(),
                input: serde_json::json!({}),
            },
        ];
        assert_eq!(collect_thoughts(&content).as_deref(), Some("thinking"));
        assert_eq!(collect_thoughts(&[]), None);
    }

    #[test]
    fn usage_accumulates_saturating() {
        let mut usage = TokenUsage::default();
        usage.add(TokenUsage {
            input_tokens: 10,
            output_tokens: 5,
        });
        usage.add(TokenUsage {
            input_tokens: 3,
            output_tokens: 2,
        });
        assert_eq!(usage.input_tokens, 13);
        assert_eq!(usage.output_tokens, 7);
    }
}
