//! LLM client abstractions for OpenAI-compatible chat-completion APIs.
//!
//! This crate provides:
//!
//! - [`ChatModel`] — The trait the workflow talks to
//! - [`OpenAiCompatClient`] — `ChatModel` over any OpenAI-compatible endpoint
//!   (OpenRouter by default)
//! - [`ModelReply`] — Final content or tool calls requested by the model
//!
//! # Quick Start
//!
//! ```rust,ignore
//! use beacon_config::Settings;
//! use beacon_core::ChatMessage;
//! use beacon_llm::{ChatModel, ModelReply, OpenAiCompatClient};
//!
//! let settings = Settings::from_env()?;
//! let client = OpenAiCompatClient::new(&settings.llm);
//!
//! let reply = client.complete(&[ChatMessage::user("Hello!")], &[]).await?;
//! if let ModelReply::Content(resp) = reply {
//!     println!("{}", resp.content);
//! }
//! ```
//!
//! # Tool Calling
//!
//! ```rust,ignore
//! use beacon_llm::{ModelReply, ToolSchema};
//!
//! let tools = vec![ToolSchema {
//!     name: "get_weather".to_string(),
//!     description: "Get current weather for a location".to_string(),
//!     parameters: serde_json::json!({
//!         "type": "object",
//!         "properties": { "location": { "type": "string" } },
//!         "required": ["location"]
//!     }),
//! }];
//!
//! match client.complete(&messages, &tools).await? {
//!     ModelReply::Content(resp) => println!("{}", resp.content),
//!     ModelReply::ToolCalls { calls, .. } => {
//!         for call in calls {
//!             println!("Call {}: {}({})", call.id, call.name, call.arguments);
//!         }
//!     }
//! }
//! ```

mod client;
mod model;

pub use beacon_core::{ChatMessage, ChatRole, ToolCall, ToolSchema};
pub use client::OpenAiCompatClient;
pub use model::{ChatModel, LlmMetrics, LlmResponse, ModelReply};
