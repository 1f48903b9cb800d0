//! Core domain types and error definitions for beacon.
//!
//! This crate provides the fundamental types shared across the beacon crates:
//!
//! - [`AgentError`] — Error type for workflow and LLM operations
//! - [`ChatMessage`] and [`ChatRole`] — Conversation message types
//! - [`ToolCall`], [`ToolSchema`] — Tool interaction types
//! - [`Secret`] — API key wrapper that never prints its value
//!
//! # Example
//!
//! ```rust
//! use beacon_core::{ChatMessage, ChatRole, Secret};
//!
//! let msg = ChatMessage::user("What's the weather in Paris?");
//! assert_eq!(msg.role, ChatRole::User);
//!
//! let key = Secret::new("sk-or-123");
//! assert_eq!(format!("{:?}", key), "[REDACTED]");
//! ```

use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors that can occur during workflow execution or LLM operations.
#[derive(Error, Debug)]
pub enum AgentError {
    /// LLM API request failed.
    #[error("LLM request failed: {0}")]
    LlmError(String),

    /// Prompt template could not be loaded or rendered.
    #[error("Prompt error: {0}")]
    Prompt(String),

    /// A tool the model asked for failed to run.
    #[error("Tool '{name}' failed: {message}")]
    Tool { name: String, message: String },

    /// A remote service behind a tool failed or could not be reached.
    #[error("External API error: {0}")]
    ExternalApi(String),

    /// The tool loop did not converge on a final answer.
    #[error("Max tool iterations ({0}) exceeded")]
    MaxIterationsExceeded(usize),
}

impl AgentError {
    /// Returns true if the failure originated at a remote service.
    pub fn is_upstream(&self) -> bool {
        matches!(self, AgentError::LlmError(_) | AgentError::ExternalApi(_))
    }
}

/// Role of a message in a conversation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChatRole {
    /// Message from the user.
    User,
    /// Message from the assistant/LLM.
    Assistant,
    /// Result of a tool call, fed back to the LLM.
    Tool,
}

/// A single message sent to the model.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: ChatRole,
    pub content: String,
    /// Tool calls requested by an assistant message.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tool_calls: Vec<ToolCall>,
    /// For tool messages, the id of the call being answered.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tool_call_id: Option<String>,
}

impl ChatMessage {
    /// Creates a new user message.
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: ChatRole::User,
            content: content.into(),
            tool_calls: Vec::new(),
            tool_call_id: None,
        }
    }

    /// Creates a new assistant message.
    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: ChatRole::Assistant,
            content: content.into(),
            tool_calls: Vec::new(),
            tool_call_id: None,
        }
    }

    /// Creates an assistant message that carries tool calls.
    pub fn assistant_tool_calls(calls: Vec<ToolCall>, content: impl Into<String>) -> Self {
        Self {
            role: ChatRole::Assistant,
            content: content.into(),
            tool_calls: calls,
            tool_call_id: None,
        }
    }

    /// Creates a tool result message answering `tool_call_id`.
    pub fn tool_result(tool_call_id: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            role: ChatRole::Tool,
            content: content.into(),
            tool_calls: Vec::new(),
            tool_call_id: Some(tool_call_id.into()),
        }
    }
}

// ============================================================================
// Tool Types
// ============================================================================

/// A tool call requested by the LLM.
///
/// When an LLM decides to use a tool, it returns one or more `ToolCall`
/// instances with the tool name and arguments to execute.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolCall {
    /// Unique identifier for this tool call (used to match results).
    pub id: String,
    /// Name of the tool to execute.
    pub name: String,
    /// Arguments to pass to the tool (JSON object).
    pub arguments: serde_json::Value,
}

/// JSON schema describing a tool for LLM function calling.
///
/// This follows the OpenAI function calling format and is used
/// to inform the LLM about available tools and their parameters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolSchema {
    /// Unique name of the tool (e.g., "get_weather", "search_web").
    pub name: String,
    /// Human-readable description of what the tool does.
    pub description: String,
    /// JSON Schema object describing the tool's parameters.
    pub parameters: serde_json::Value,
}

// ============================================================================
// Secrets
// ============================================================================

/// A credential that must never reach logs or responses.
///
/// `Debug` and `Display` both print `[REDACTED]`; the value is only
/// reachable through [`Secret::expose`].
#[derive(Clone, PartialEq, Eq)]
pub struct Secret(String);

impl Secret {
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    /// Returns the raw value. Call sites should hand it straight to a client.
    pub fn expose(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for Secret {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("[REDACTED]")
    }
}

impl fmt::Display for Secret {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("[REDACTED]")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn secret_is_redacted_in_debug_and_display() {
        let key = Secret::new("sk-or-v1-abcdef");
        assert_eq!(format!("{:?}", key), "[REDACTED]");
        assert_eq!(key.to_string(), "[REDACTED]");
        assert_eq!(key.expose(), "sk-or-v1-abcdef");
    }

    #[test]
    fn tool_result_message_carries_call_id() {
        let msg = ChatMessage::tool_result("call_1", "Sunny");
        assert_eq!(msg.role, ChatRole::Tool);
        assert_eq!(msg.tool_call_id.as_deref(), Some("call_1"));
        assert!(msg.tool_calls.is_empty());
    }

    #[test]
    fn message_serializes_without_empty_tool_fields() {
        let json = serde_json::to_value(ChatMessage::user("hi")).unwrap();
        assert_eq!(json, serde_json::json!({ "role": "user", "content": "hi" }));
    }

    #[test]
    fn upstream_errors_are_classified() {
        assert!(AgentError::LlmError("timeout".into()).is_upstream());
        assert!(AgentError::ExternalApi("503".into()).is_upstream());
        assert!(!AgentError::Prompt("missing".into()).is_upstream());
        assert!(!AgentError::MaxIterationsExceeded(10).is_upstream());
    }
}
