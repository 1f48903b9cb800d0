//! OpenAI-compatible chat client.
//!
//! Works with OpenRouter, the OpenAI API, and any endpoint speaking the same
//! chat-completions protocol. Supports plain chat and tool calling.

use std::time::Instant;

use async_openai::{
    config::OpenAIConfig,
    types::{
        ChatCompletionMessageToolCall, ChatCompletionRequestAssistantMessageArgs,
        ChatCompletionRequestMessage, ChatCompletionRequestToolMessageArgs,
        ChatCompletionRequestUserMessageArgs, ChatCompletionTool, ChatCompletionToolType,
        CreateChatCompletionRequestArgs, FunctionCall, FunctionObject,
    },
    Client,
};
use async_trait::async_trait;
use beacon_config::LlmSettings;
use beacon_core::{AgentError, ChatMessage, ChatRole, ToolCall, ToolSchema};
use tracing::{debug, info, warn};

use crate::model::{ChatModel, LlmMetrics, LlmResponse, ModelReply};

/// Converts any error into an AgentError::LlmError.
fn llm_err(e: impl ToString) -> AgentError {
    AgentError::LlmError(e.to_string())
}

/// Converts a conversation message into the request format.
fn to_request_message(msg: &ChatMessage) -> Result<ChatCompletionRequestMessage, AgentError> {
    let message = match msg.role {
        ChatRole::User => ChatCompletionRequestMessage::User(
            ChatCompletionRequestUserMessageArgs::default()
                .content(&*msg.content)
                .build()
                .map_err(llm_err)?,
        ),
        ChatRole::Assistant => {
            let mut args = ChatCompletionRequestAssistantMessageArgs::default();
            if !msg.content.is_empty() || msg.tool_calls.is_empty() {
                args.content(&*msg.content);
            }
            if !msg.tool_calls.is_empty() {
                args.tool_calls(msg.tool_calls.iter().map(to_openai_call).collect::<Vec<_>>());
            }
            ChatCompletionRequestMessage::Assistant(args.build().map_err(llm_err)?)
        }
        ChatRole::Tool => ChatCompletionRequestMessage::Tool(
            ChatCompletionRequestToolMessageArgs::default()
                .tool_call_id(msg.tool_call_id.clone().unwrap_or_default())
                .content(&*msg.content)
                .build()
                .map_err(llm_err)?,
        ),
    };
    Ok(message)
}

fn to_openai_call(call: &ToolCall) -> ChatCompletionMessageToolCall {
    ChatCompletionMessageToolCall {
        id: call.id.clone(),
        r#type: ChatCompletionToolType::Function,
        function: FunctionCall {
            name: call.name.clone(),
            arguments: call.arguments.to_string(),
        },
    }
}

fn from_openai_call(tc: ChatCompletionMessageToolCall) -> ToolCall {
    let arguments = serde_json::from_str(&tc.function.arguments).unwrap_or_else(|e| {
        warn!(
            "Tool call '{}' has malformed arguments ({}), using empty object",
            tc.function.name, e
        );
        serde_json::json!({})
    });
    ToolCall {
        id: tc.id,
        name: tc.function.name,
        arguments,
    }
}

fn to_openai_tool(schema: &ToolSchema) -> ChatCompletionTool {
    ChatCompletionTool {
        r#type: ChatCompletionToolType::Function,
        function: FunctionObject {
            name: schema.name.clone(),
            description: Some(schema.description.clone()),
            parameters: Some(schema.parameters.clone()),
            strict: None,
        },
    }
}

/// Client for OpenAI-compatible chat completion APIs.
pub struct OpenAiCompatClient {
    client: Client<OpenAIConfig>,
    model: String,
}

impl OpenAiCompatClient {
    /// Creates a client for the configured base URL, key and model.
    pub fn new(settings: &LlmSettings) -> Self {
        let config = OpenAIConfig::new()
            .with_api_base(&settings.base_url)
            .with_api_key(settings.api_key.expose());

        Self {
            client: Client::with_config(config),
            model: settings.model.clone(),
        }
    }
}

#[async_trait]
impl ChatModel for OpenAiCompatClient {
    fn model_name(&self) -> &str {
        &self.model
    }

    async fn complete(
        &self,
        messages: &[ChatMessage],
        tools: &[ToolSchema],
    ) -> Result<ModelReply, AgentError> {
        let start = Instant::now();

        let request_messages = messages
            .iter()
            .map(to_request_message)
            .collect::<Result<Vec<_>, _>>()?;

        let mut request_builder = CreateChatCompletionRequestArgs::default();
        request_builder.model(&self.model).messages(request_messages);

        if !tools.is_empty() {
            request_builder.tools(tools.iter().map(to_openai_tool).collect::<Vec<_>>());
        }

        let request = request_builder.build().map_err(llm_err)?;
        debug!("LLM request: model={}, messages={}, tools={}", self.model, messages.len(), tools.len());

        let response = self.client.chat().create(request).await.map_err(llm_err)?;
        let elapsed_ms = start.elapsed().as_millis() as u64;

        let (input_tokens, output_tokens) = response
            .usage
            .as_ref()
            .map(|u| (u.prompt_tokens, u.completion_tokens))
            .unwrap_or((0, 0));

        let metrics = LlmMetrics { input_tokens, output_tokens, elapsed_ms };

        info!("LLM: {}ms, tokens: {}/{} (in/out)", elapsed_ms, input_tokens, output_tokens);

        let choice = response
            .choices
            .into_iter()
            .next()
            .ok_or_else(|| AgentError::LlmError("No response choices".into()))?;

        // Check for tool calls
        if let Some(tool_calls) = choice.message.tool_calls.filter(|tc| !tc.is_empty()) {
            let calls = tool_calls.into_iter().map(from_openai_call).collect();
            return Ok(ModelReply::ToolCalls {
                calls,
                content: choice.message.content.unwrap_or_default(),
                metrics,
            });
        }

        let content = choice
            .message
            .content
            .ok_or_else(|| AgentError::LlmError("No response content".into()))?;

        Ok(ModelReply::Content(LlmResponse { content, metrics }))
    }
}
