//! Tool registry and built-in tools for beacon.
//!
//! This crate provides the tool abstraction for LLM function calling:
//!
//! - [`Tool`] — Trait for implementing tools
//! - [`ToolRegistry`] — Name → tool mapping offered to the model
//! - [`WeatherTool`] — `get_weather`
//! - [`WebSearchTool`] — `search_web` (live results with a Tavily API key)
//!
//! # Implementing a Custom Tool
//!
//! ```rust,ignore
//! use beacon_tools::{Tool, ToolError};
//! use async_trait::async_trait;
//!
//! struct CalculatorTool;
//!
//! #[async_trait]
//! impl Tool for CalculatorTool {
//!     fn name(&self) -> &str { "calculator" }
//!     fn description(&self) -> &str { "Evaluate a mathematical expression" }
//!     fn parameters(&self) -> serde_json::Value {
//!         serde_json::json!({
//!             "type": "object",
//!             "properties": { "expression": { "type": "string" } },
//!             "required": ["expression"]
//!         })
//!     }
//!     async fn execute(&self, args: serde_json::Value) -> Result<String, ToolError> {
//!         Ok("42".to_string())
//!     }
//! }
//!
//! let mut registry = ToolRegistry::with_defaults(None);
//! registry.register(CalculatorTool);
//! ```

mod weather;
mod web_search;

pub use weather::WeatherTool;
pub use web_search::WebSearchTool;

use std::collections::BTreeMap;
use std::sync::Arc;

use async_trait::async_trait;
use beacon_core::Secret;
use thiserror::Error;
use tracing::{debug, info};

pub use beacon_core::{ToolCall, ToolSchema};

/// Errors that can occur during tool execution.
#[derive(Error, Debug)]
pub enum ToolError {
    /// Invalid arguments were passed to the tool.
    #[error("Invalid arguments: {0}")]
    InvalidArguments(String),

    /// Network request failed.
    #[error("Network error: {0}")]
    NetworkError(#[from] reqwest::Error),

    /// The remote service answered with an error or an unreadable body.
    #[error("Upstream error: {0}")]
    Upstream(String),

    /// Requested tool was not found in the registry.
    #[error("Tool not found: {0}")]
    NotFound(String),
}

impl ToolError {
    /// Returns true if the failure came from the network or a remote service.
    pub fn is_upstream(&self) -> bool {
        matches!(self, ToolError::NetworkError(_) | ToolError::Upstream(_))
    }
}

/// Trait for implementing tools that can be called by LLMs.
#[async_trait]
pub trait Tool: Send + Sync {
    /// Returns the unique name of this tool.
    fn name(&self) -> &str;

    /// Returns a description of what this tool does.
    fn description(&self) -> &str;

    /// Returns the JSON Schema for this tool's parameters.
    fn parameters(&self) -> serde_json::Value;

    /// Executes the tool with the given JSON object of arguments.
    async fn execute(&self, args: serde_json::Value) -> Result<String, ToolError>;

    /// Generates the schema for this tool (default implementation).
    fn schema(&self) -> ToolSchema {
        ToolSchema {
            name: self.name().to_string(),
            description: self.description().to_string(),
            parameters: self.parameters(),
        }
    }
}

/// Reads a required string argument.
pub(crate) fn required_str<'a>(args: &'a serde_json::Value, key: &str) -> Result<&'a str, ToolError> {
    args.get(key)
        .and_then(|v| v.as_str())
        .ok_or_else(|| ToolError::InvalidArguments(format!("Missing '{}' parameter", key)))
}

/// Registry of tools offered to the model.
///
/// Tools are kept ordered by name so the schema list sent to the model is
/// stable between requests.
#[derive(Default)]
pub struct ToolRegistry {
    tools: BTreeMap<String, Arc<dyn Tool>>,
}

impl ToolRegistry {
    /// Creates an empty tool registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a registry with the built-in tools.
    ///
    /// `search_web` returns live Tavily results only when a key is given.
    pub fn with_defaults(tavily_api_key: Option<Secret>) -> Self {
        let mut registry = Self::new();

        registry.register(WeatherTool);
        match tavily_api_key {
            Some(key) => registry.register(WebSearchTool::tavily(key)),
            None => registry.register(WebSearchTool::offline()),
        }

        registry
    }

    /// Registers a tool in the registry.
    ///
    /// If a tool with the same name already exists, it will be replaced.
    pub fn register<T: Tool + 'static>(&mut self, tool: T) {
        self.tools.insert(tool.name().to_string(), Arc::new(tool));
    }

    /// Gets a tool by name.
    pub fn get(&self, name: &str) -> Option<Arc<dyn Tool>> {
        self.tools.get(name).cloned()
    }

    /// Returns schemas for all registered tools, ordered by name.
    pub fn schemas(&self) -> Vec<ToolSchema> {
        self.tools.values().map(|t| t.schema()).collect()
    }

    /// Returns the names of all registered tools, ordered.
    pub fn names(&self) -> Vec<String> {
        self.tools.keys().cloned().collect()
    }

    /// Executes the tool named in `call` with its arguments.
    pub async fn invoke(&self, call: &ToolCall) -> Result<String, ToolError> {
        let tool = self
            .get(&call.name)
            .ok_or_else(|| ToolError::NotFound(call.name.clone()))?;

        info!("Executing tool: {}", call.name);
        debug!("Tool arguments: {}", call.arguments);
        let result = tool.execute(call.arguments.clone()).await?;
        info!("Tool {} returned {} chars", call.name, result.len());

        Ok(result)
    }
}
