use std::fmt::Write as _;

use async_trait::async_trait;
use beacon_core::Secret;
use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::warn;

use crate::{required_str, Tool, ToolError};

const TAVILY_SEARCH_URL: &str = "https://api.tavily.com/search";
const DEFAULT_MAX_RESULTS: u32 = 5;
const MAX_RESULTS_CAP: u32 = 20;

enum Backend {
    /// Answers with a placeholder line, no network access.
    Offline,
    Tavily {
        api_key: Secret,
        endpoint: String,
        client: reqwest::Client,
    },
}

/// Web search tool, backed by the Tavily API when a key is configured.
pub struct WebSearchTool {
    backend: Backend,
}

impl WebSearchTool {
    /// Search without a provider: returns `Results for: <query>`.
    pub fn offline() -> Self {
        Self { backend: Backend::Offline }
    }

    /// Search through the Tavily API.
    pub fn tavily(api_key: Secret) -> Self {
        Self::tavily_at(api_key, TAVILY_SEARCH_URL)
    }

    /// Search through a Tavily-compatible endpoint.
    pub fn tavily_at(api_key: Secret, endpoint: impl Into<String>) -> Self {
        Self {
            backend: Backend::Tavily {
                api_key,
                endpoint: endpoint.into(),
                client: reqwest::Client::new(),
            },
        }
    }
}

#[derive(Debug, Serialize)]
struct TavilyRequest<'a> {
    api_key: &'a str,
    query: &'a str,
    max_results: u32,
    search_depth: &'static str,
}

#[derive(Debug, Deserialize)]
struct TavilyResponse {
    #[serde(default)]
    results: Vec<TavilyResult>,
    #[serde(default)]
    answer: Option<String>,
}

#[derive(Debug, Deserialize)]
struct TavilyResult {
    title: String,
    url: String,
    content: String,
}

/// Formats Tavily results as a numbered list, summary first.
fn format_results(response: &TavilyResponse) -> String {
    let mut output = String::new();

    if let Some(answer) = &response.answer {
        let _ = write!(output, "Summary: {}\n\n", answer);
    }

    if response.results.is_empty() {
        output.push_str("No results found.");
        return output;
    }

    output.push_str("Search Results:\n\n");
    for (i, result) in response.results.iter().enumerate() {
        let _ = write!(
            output,
            "{}. {}\n   URL: {}\n   {}\n\n",
            i + 1,
            result.title,
            result.url,
            result.content
        );
    }

    output.trim_end().to_string()
}

#[async_trait]
impl Tool for WebSearchTool {
    fn name(&self) -> &str {
        "search_web"
    }

    fn description(&self) -> &str {
        "Search the web for information"
    }

    fn parameters(&self) -> serde_json::Value {
        json!({
            "type": "object",
            "properties": {
                "query": {
                    "type": "string",
                    "description": "The search query"
                },
                "max_results": {
                    "type": "integer",
                    "description": "Maximum number of results to return (default: 5)",
                    "default": DEFAULT_MAX_RESULTS
                }
            },
            "required": ["query"]
        })
    }

    async fn execute(&self, args: serde_json::Value) -> Result<String, ToolError> {
        let query = required_str(&args, "query")?;

        let (api_key, endpoint, client) = match &self.backend {
            Backend::Offline => return Ok(format!("Results for: {}", query)),
            Backend::Tavily { api_key, endpoint, client } => (api_key, endpoint, client),
        };

        let max_results = args
            .get("max_results")
            .and_then(|v| v.as_u64())
            .map(|v| v.clamp(1, MAX_RESULTS_CAP as u64) as u32)
            .unwrap_or(DEFAULT_MAX_RESULTS);

        let request = TavilyRequest {
            api_key: api_key.expose(),
            query,
            max_results,
            search_depth: "basic",
        };

        let response = client.post(endpoint.as_str()).json(&request).send().await?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            warn!("Tavily search failed with status {}", status);
            return Err(ToolError::Upstream(format!(
                "Tavily API error: {} - {}",
                status, body
            )));
        }

        let tavily_response: TavilyResponse = response
            .json()
            .await
            .map_err(|e| ToolError::Upstream(format!("Failed to parse Tavily response: {}", e)))?;

        Ok(format_results(&tavily_response))
    }
}
