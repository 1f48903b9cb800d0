//! The chat model seam and its reply types.

use async_trait::async_trait;
use beacon_core::{AgentError, ChatMessage, ToolCall, ToolSchema};

/// Token usage and timing metrics from an LLM call.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LlmMetrics {
    pub input_tokens: u32,
    pub output_tokens: u32,
    pub elapsed_ms: u64,
}

/// Complete content response from an LLM call.
#[derive(Debug, Clone)]
pub struct LlmResponse {
    pub content: String,
    pub metrics: LlmMetrics,
}

/// Response from an LLM that may include tool calls.
#[derive(Debug, Clone)]
pub enum ModelReply {
    Content(LlmResponse),
    ToolCalls {
        calls: Vec<ToolCall>,
        /// Text the model sent alongside the calls, often empty.
        content: String,
        metrics: LlmMetrics,
    },
}

impl ModelReply {
    /// Tool calls requested by the model; empty for content replies.
    pub fn tool_calls(&self) -> &[ToolCall] {
        match self {
            ModelReply::Content(_) => &[],
            ModelReply::ToolCalls { calls, .. } => calls,
        }
    }

    /// Text content of the reply.
    pub fn content(&self) -> &str {
        match self {
            ModelReply::Content(resp) => &resp.content,
            ModelReply::ToolCalls { content, .. } => content,
        }
    }

    /// Usage and timing of the call that produced this reply.
    pub fn metrics(&self) -> &LlmMetrics {
        match self {
            ModelReply::Content(resp) => &resp.metrics,
            ModelReply::ToolCalls { metrics, .. } => metrics,
        }
    }
}

/// A chat-completion backend with tool calling.
///
/// Tools are only offered to the model when `tools` is non-empty.
#[async_trait]
pub trait ChatModel: Send + Sync {
    /// Model identifier, used for logging.
    fn model_name(&self) -> &str;

    /// Sends `messages` and returns the model's reply.
    async fn complete(
        &self,
        messages: &[ChatMessage],
        tools: &[ToolSchema],
    ) -> Result<ModelReply, AgentError>;
}
