use serde::{Deserialize, Serialize};

use super::error::BackendError;

/// Capabilities advertised by a backend for UI feature toggles.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BackendCapabilities {
    /// Whether the backend can deliver incremental output.
    pub supports_streaming: bool,
    /// Advertised context window, in tokens.
    pub max_context_tokens: u32,
}

impl BackendCapabilities {
    /// Construct a new capabilities struct with explicit values.
    #[must_use]
    pub const fn new(supports_streaming: bool, max_context_tokens: u32) -> Self {
        Self {
            supports_streaming,
            max_context_tokens,
        }
    }
}

impl Default for BackendCapabilities {
    fn default() -> Self {
        Self::new(false, 4096)
    }
}

/// Summary information about a registered backend.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BackendSummary {
    /// Stable identifier for the backend.
    pub id: String,
    /// Human-friendly label for display.
    pub label: String,
    /// Capability flags.
    pub capabilities: BackendCapabilities,
}

/// The role of a message in a chat exchange.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// System-level instructions.
    System,
    /// User input.
    User,
    /// Assistant response.
    Assistant,
}

/// A plain role/content chat message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage {
    /// Author of the message.
    pub role: Role,
    /// Message body.
    pub content: String,
}

impl ChatMessage {
    /// Create a message with an explicit role.
    #[must_use]
    pub fn new(role: Role, content: impl Into<String>) -> Self {
        Self {
            role,
            content: content.into(),
        }
    }

    /// System message.
    #[must_use]
    pub fn system(content: impl Into<String>) -> Self {
        Self::new(Role::System, content)
    }

    /// User message.
    #[must_use]
    pub fn user(content: impl Into<String>) -> Self {
        Self::new(Role::User, content)
    }

    /// Assistant message.
    #[must_use]
    pub fn assistant(content: impl Into<String>) -> Self {
        Self::new(Role::Assistant, content)
    }
}

/// Token accounting reported by the backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct Usage {
    /// Tokens in the prompt.
    pub prompt_tokens: u32,
    /// Tokens in the completion.
    pub completion_tokens: u32,
    /// Total tokens billed.
    pub total_tokens: u32,
}

/// Final text produced by a chat completion.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatResponse {
    /// Assistant text after response normalization.
    pub content: String,
    /// Token usage, if the backend reported it.
    #[serde(default)]
    pub usage: Option<Usage>,
}

impl ChatResponse {
    /// Response without usage information.
    #[must_use]
    pub fn text(content: impl Into<String>) -> Self {
        Self {
            content: content.into(),
            usage: None,
        }
    }
}

/// Receives incremental output from a completion.
pub trait ProgressSink {
    /// A piece of assistant text became available.
    fn on_chunk(&self, chunk: &str);

    /// The completion finished, with the error if it failed.
    fn on_done(&self, error: Option<&BackendError>);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn role_serialization() {
        let json = serde_json::to_string(&Role::Assistant).expect("serialize role");
        assert_eq!(json, "\"assistant\"");
        let role: Role = serde_json::from_str("\"system\"").expect("deserialize role");
        assert_eq!(role, Role::System);
    }

    #[test]
    fn message_serialization() {
        let json = serde_json::to_string(&ChatMessage::user("Hi")).expect("serialize message");
        assert!(json.contains("\"role\":\"user\""));
        assert!(json.contains("\"content\":\"Hi\""));
    }

    #[test]
    fn response_usage_is_optional() {
        let response: ChatResponse =
            serde_json::from_str(r#"{"content": "ok"}"#).expect("deserialize response");
        assert_eq!(response, ChatResponse::text("ok"));
    }
}
