//! Agent workflow for beacon.
//!
//! This crate turns a user query into a response:
//!
//! - [`Workflow`] — Runs the agent/tools state machine for one query
//! - [`WorkflowOptions`] — Prompt name, tool mode and iteration cap
//! - [`Step`] — The states the workflow moves through
//!
//! # Quick Start
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use beacon_config::{PromptStore, Settings};
//! use beacon_engine::{Workflow, WorkflowOptions};
//! use beacon_llm::OpenAiCompatClient;
//! use beacon_tools::ToolRegistry;
//!
//! let settings = Settings::from_env()?;
//! let workflow = Workflow::new(
//!     Arc::new(OpenAiCompatClient::new(&settings.llm)),
//!     Arc::new(ToolRegistry::with_defaults(settings.tavily_api_key.clone())),
//!     PromptStore::new(&settings.prompts_dir),
//!     WorkflowOptions::from(&settings),
//! );
//!
//! let response = workflow.run("What's the weather in Paris?").await?;
//! ```
//!
//! # Execution Model
//!
//! ```text
//!            ┌──────────── Loop mode ────────────┐
//!            ▼                                   │
//! input → Agent ──(tool calls)──→ Tools ─────────┤
//!            │                                   │ Direct mode
//!            └──(content)──→ End ←───────────────┘
//! ```
//!
//! 1. **Agent** — The system prompt and the query are sent to the model with
//!    every registered tool bound.
//! 2. **Routing** — Tool calls in the reply lead to `Tools`, otherwise `End`.
//! 3. **Tools** — Each call runs in order. In `Direct` mode the outputs,
//!    one `Tool <name> result: <output>` line per call, are the response. In
//!    `Loop` mode they are sent back to the model, up to a fixed number of rounds.

mod workflow;

pub use workflow::{
    route_after_agent, Step, ToolOutcome, Workflow, WorkflowOptions, WorkflowState, NO_TOOLS_EXECUTED,
    TOOL_NOT_FOUND,
};
pub use beacon_config::ToolMode;
