//! Application-facing chat types: requests from the UI layer, history
//! turns consumed by the context layer, and the final response shape.

use serde::{Deserialize, Serialize};

use super::content::{Content, Part, Role};
use super::generation::{FinishReason, UsageMetadata};

/// The author of a conversation turn.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum TurnRole {
    /// The end user.
    User,
    /// The assistant.
    Assistant,
}

impl TurnRole {
    /// The wire role this turn maps to.
    pub fn wire_role(self) -> Role {
        match self {
            TurnRole::User => Role::User,
            TurnRole::Assistant => Role::Model,
        }
    }
}

/// One message in a chat request.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ChatMessage {
    /// Who authored the message.
    pub role: TurnRole,
    /// The message text.
    pub content: String,
}

impl ChatMessage {
    /// A user message.
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: TurnRole::User,
            content: content.into(),
        }
    }

    /// An assistant message.
    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: TurnRole::Assistant,
            content: content.into(),
        }
    }
}

/// A recorded conversation turn, as stored by the session history.
///
/// Turns carry wire parts so tool traffic (function calls/responses)
/// is representable; the context layer forwards only the text payload.
#[derive(Debug, Clone, PartialEq)]
pub struct ChatTurn {
    /// Stable turn identifier within the session.
    pub id: u64,
    /// Who authored the turn.
    pub role: TurnRole,
    /// The turn's parts.
    pub parts: Vec<Part>,
    /// Wall-clock timestamp, milliseconds since the epoch.
    pub timestamp_ms: u64,
}

impl ChatTurn {
    /// A plain text turn.
    pub fn text(id: u64, role: TurnRole, text: impl Into<String>, timestamp_ms: u64) -> Self {
        Self {
            id,
            role,
            parts: vec![Part::Text { text: text.into() }],
            timestamp_ms,
        }
    }

    /// Concatenated text of the turn's text parts.
    pub fn text_content(&self) -> String {
        self.parts
            .iter()
            .filter_map(|p| match p {
                Part::Text { text } => Some(text.as_str()),
                _ => None,
            })
            .collect::<Vec<_>>()
            .join("")
    }

    /// True when the turn carries tool traffic (function call/response).
    pub fn is_tool_turn(&self) -> bool {
        self.parts.iter().any(|p| {
            matches!(
                p,
                Part::FunctionCall { .. } | Part::FunctionResponse { .. }
            )
        })
    }
}

/// A chat request from the UI layer.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ChatRequest {
    /// Target model id.
    pub model: String,
    /// Ordered messages to send.
    pub messages: Vec<ChatMessage>,
    /// Sampling temperature.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f32>,
    /// Generation token cap.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_tokens: Option<i32>,
    /// Nucleus sampling probability.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub top_p: Option<f32>,
    /// Top-k sampling parameter.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub top_k: Option<i32>,
    /// System instruction.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub system_instruction: Option<String>,
    /// Whether to stream the response.
    #[serde(default)]
    pub stream: bool,
}

impl ChatRequest {
    /// A minimal non-streaming request with one user message.
    pub fn user_message(model: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            model: model.into(),
            messages: vec![ChatMessage::user(content)],
            temperature: None,
            max_tokens: None,
            top_p: None,
            top_k: None,
            system_instruction: None,
            stream: false,
        }
    }

    /// The wire contents for this request.
    pub fn wire_contents(&self) -> Vec<Content> {
        self.messages
            .iter()
            .map(|m| Content {
                role: Some(m.role.wire_role()),
                parts: vec![Part::Text {
                    text: m.content.clone(),
                }],
            })
            .collect()
    }
}

/// A completed (non-streaming or accumulated) chat response.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ChatResponse {
    /// The generated text.
    pub text: String,
    /// The model that produced it.
    pub model: String,
    /// Token usage, when reported.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub usage: Option<UsageMetadata>,
    /// Why generation stopped, when reported.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub finish_reason: Option<FinishReason>,
}

/// An incremental streaming event delivered to the caller's chunk handler.
#[derive(Debug, Clone, PartialEq)]
pub enum StreamEvent {
    /// An incremental text delta.
    Delta(String),
    /// Terminal marker: the stream completed.
    Done,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::content::{FunctionCall, FunctionResponse};

    #[test]
    fn test_tool_turn_detection() {
        let tool_call = ChatTurn {
            id: 1,
            role: TurnRole::Assistant,
            parts: vec![Part::FunctionCall {
                function_call: FunctionCall {
                    name: "read_file".into(),
                    args: serde_json::json!({"path": "src/main.rs"}),
                },
            }],
            timestamp_ms: 0,
        };
        assert!(tool_call.is_tool_turn());
        assert_eq!(tool_call.text_content(), "");

        let tool_result = ChatTurn {
            id: 2,
            role: TurnRole::User,
            parts: vec![Part::FunctionResponse {
                function_response: FunctionResponse {
                    name: "read_file".into(),
                    response: serde_json::json!({"ok": true}),
                },
            }],
            timestamp_ms: 0,
        };
        assert!(tool_result.is_tool_turn());

        let plain = ChatTurn::text(3, TurnRole::User, "hello", 0);
        assert!(!plain.is_tool_turn());
        assert_eq!(plain.text_content(), "hello");
    }

    #[test]
    fn test_wire_contents_roles() {
        let request = ChatRequest {
            model: "gemini-1.5-flash".into(),
            messages: vec![
                ChatMessage::user("question"),
                ChatMessage::assistant("answer"),
                ChatMessage::user("follow-up"),
            ],
            temperature: Some(0.2),
            max_tokens: None,
            top_p: None,
            top_k: None,
            system_instruction: None,
            stream: false,
        };

        let contents = request.wire_contents();
        assert_eq!(contents.len(), 3);
        assert_eq!(contents[0].role, Some(Role::User));
        assert_eq!(contents[1].role, Some(Role::Model));
        assert_eq!(contents[2].text(), "follow-up");
    }
}
