//! HTTP server entry point.
//!
//! Loads settings from the environment (and `.env`), wires the chat client,
//! tool registry and prompt store into a workflow, and serves the Axum router.

mod dto;
mod error;
mod handlers;
mod routes;

use std::sync::Arc;

use anyhow::{Context, Result};
use beacon_config::{PromptStore, Settings};
use beacon_engine::{Workflow, WorkflowOptions};
use beacon_llm::OpenAiCompatClient;
use beacon_tools::ToolRegistry;
use tracing::{info, warn};

/// Shared server state accessible from all handlers.
pub struct ServerState {
    pub workflow: Workflow,
    pub max_query_chars: usize,
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_target(false)
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .compact()
        .init();

    let settings = Settings::from_env().context("failed to load settings")?;
    let state = Arc::new(init_server_state(&settings));
    let app = routes::router(state);

    let listener = tokio::net::TcpListener::bind(&settings.bind_addr)
        .await
        .with_context(|| format!("failed to bind {}", settings.bind_addr))?;
    info!("Starting server on {}", settings.bind_addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Server stopped");
    Ok(())
}

/// Builds the workflow from settings.
fn init_server_state(settings: &Settings) -> ServerState {
    info!("Model: {} via {}", settings.llm.model, settings.llm.base_url);
    info!("Tool mode: {}", settings.tool_mode);

    let client = OpenAiCompatClient::new(&settings.llm);

    if settings.tavily_api_key.is_none() {
        info!("TAVILY_API_KEY not set, search_web returns placeholder results");
    }
    let tool_registry = ToolRegistry::with_defaults(settings.tavily_api_key.clone());
    let tool_names = tool_registry.names();
    info!("Registered {} tools", tool_names.len());
    for name in tool_names {
        info!("  - {}", name);
    }

    let prompts = PromptStore::new(&settings.prompts_dir);
    if !prompts.exists(&settings.system_prompt) {
        warn!(
            "System prompt '{}' not found in {}, queries will fail until it exists",
            settings.system_prompt,
            prompts.dir().display()
        );
    }

    let workflow = Workflow::new(
        Arc::new(client),
        Arc::new(tool_registry),
        prompts,
        WorkflowOptions::from(settings),
    );

    ServerState {
        workflow,
        max_query_chars: settings.max_query_chars,
    }
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
    info!("Shutdown signal received");
}
