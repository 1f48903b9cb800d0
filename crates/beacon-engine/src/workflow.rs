//! The agent/tools state machine.

use std::fmt;
use std::sync::Arc;
use std::time::Instant;

use beacon_config::{PromptStore, Settings, ToolMode, DEFAULT_MAX_TOOL_ITERATIONS, DEFAULT_SYSTEM_PROMPT};
use beacon_core::{AgentError, ChatMessage, ToolCall, ToolSchema};
use beacon_llm::{ChatModel, ModelReply};
use beacon_tools::{ToolError, ToolRegistry};
use serde_json::json;
use tracing::{debug, info, warn};

/// Output recorded for a call to a tool that is not registered.
pub const TOOL_NOT_FOUND: &str = "Tool not found";

/// Response of a tools step that had nothing to run.
pub const NO_TOOLS_EXECUTED: &str = "No tools executed";

/// Per-workflow options.
#[derive(Debug, Clone)]
pub struct WorkflowOptions {
    /// Name of the system prompt template.
    pub system_prompt: String,
    pub tool_mode: ToolMode,
    /// Maximum number of model calls in `Loop` mode.
    pub max_tool_iterations: usize,
}

impl Default for WorkflowOptions {
    fn default() -> Self {
        Self {
            system_prompt: DEFAULT_SYSTEM_PROMPT.to_string(),
            tool_mode: ToolMode::Direct,
            max_tool_iterations: DEFAULT_MAX_TOOL_ITERATIONS,
        }
    }
}

impl From<&Settings> for WorkflowOptions {
    fn from(settings: &Settings) -> Self {
        Self {
            system_prompt: settings.system_prompt.clone(),
            tool_mode: settings.tool_mode,
            max_tool_iterations: settings.max_tool_iterations,
        }
    }
}

/// States of the workflow.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Step {
    /// Call the model.
    Agent,
    /// Run the tool calls of the last reply.
    Tools,
    /// Done; the state holds the response.
    End,
}

/// Result of one tool call.
#[derive(Debug, Clone, PartialEq)]
pub struct ToolOutcome {
    pub name: String,
    pub output: String,
}

impl fmt::Display for ToolOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Tool {} result: {}", self.name, self.output)
    }
}

/// Data carried between steps.
#[derive(Debug, Clone, Default)]
pub struct WorkflowState {
    pub input: String,
    /// Conversation sent to the model.
    pub messages: Vec<ChatMessage>,
    /// Tool calls from the last model reply, not yet executed.
    pub pending_calls: Vec<ToolCall>,
    pub response: Option<String>,
    pub model_calls: usize,
}

impl WorkflowState {
    /// Starts a conversation with the system prompt and input as a single user message.
    pub fn new(input: &str, system_prompt: &str) -> Self {
        let first = if system_prompt.is_empty() {
            input.to_string()
        } else {
            format!("{}\n\n{}", system_prompt, input)
        };
        Self {
            input: input.to_string(),
            messages: vec![ChatMessage::user(first)],
            ..Default::default()
        }
    }
}

/// Chooses the step after the agent: tools if the model asked for any.
pub fn route_after_agent(state: &WorkflowState) -> Step {
    if state.pending_calls.is_empty() {
        Step::End
    } else {
        Step::Tools
    }
}

/// Runs queries through the model and the tool registry.
pub struct Workflow {
    model: Arc<dyn ChatModel>,
    tools: Arc<ToolRegistry>,
    prompts: PromptStore,
    options: WorkflowOptions,
}

impl Workflow {
    pub fn new(
        model: Arc<dyn ChatModel>,
        tools: Arc<ToolRegistry>,
        prompts: PromptStore,
        options: WorkflowOptions,
    ) -> Self {
        Self { model, tools, prompts, options }
    }

    pub fn tools(&self) -> &ToolRegistry {
        &self.tools
    }

    /// Runs the workflow for `input` and returns the response text.
    pub async fn run(&self, input: &str) -> Result<String, AgentError> {
        let start = Instant::now();
        info!("╔══════════════════════════════════════════════════════════════");
        info!("║ WORKFLOW: model={} mode={}", self.model.model_name(), self.options.tool_mode);
        info!("║ Input: {}...", input.chars().take(50).collect::<String>());

        let system_prompt = self
            .prompts
            .render(&self.options.system_prompt, &json!({ "tools": self.tools.names() }))?;
        let schemas = self.tools.schemas();

        let mut state = WorkflowState::new(input, &system_prompt);
        let mut step = Step::Agent;

        while step != Step::End {
            step = match step {
                Step::Agent => {
                    self.agent_step(&mut state, &schemas).await?;
                    route_after_agent(&state)
                }
                Step::Tools => self.tools_step(&mut state).await?,
                Step::End => Step::End,
            };
        }

        info!("║ Workflow complete in {:?} ({} model calls)", start.elapsed(), state.model_calls);
        info!("╚══════════════════════════════════════════════════════════════");

        Ok(state.response.unwrap_or_default())
    }

    /// Calls the model with the conversation so far.
    async fn agent_step(&self, state: &mut WorkflowState, schemas: &[ToolSchema]) -> Result<(), AgentError> {
        if state.model_calls >= self.options.max_tool_iterations {
            warn!("║ ⚠ Max tool iterations ({}) reached", self.options.max_tool_iterations);
            return Err(AgentError::MaxIterationsExceeded(self.options.max_tool_iterations));
        }
        state.model_calls += 1;

        info!("╠──────────────────────────────────────────────────────────────");
        info!("║ [{}] AGENT → Calling LLM with {} tools", state.model_calls, schemas.len());

        let reply = self.model.complete(&state.messages, schemas).await?;
        let metrics = reply.metrics();
        debug!(
            "║     ← {}ms, tokens: {}/{} (in/out)",
            metrics.elapsed_ms, metrics.input_tokens, metrics.output_tokens
        );

        match reply {
            ModelReply::Content(resp) => {
                info!("║     ← Response: {} chars", resp.content.len());
                state.messages.push(ChatMessage::assistant(resp.content.clone()));
                state.pending_calls.clear();
                state.response = Some(resp.content);
            }
            ModelReply::ToolCalls { calls, content, .. } => {
                info!(
                    "║     ← Tool calls: {:?}",
                    calls.iter().map(|c| &c.name).collect::<Vec<_>>()
                );
                state
                    .messages
                    .push(ChatMessage::assistant_tool_calls(calls.clone(), content.clone()));
                state.pending_calls = calls;
                if !content.is_empty() {
                    state.response = Some(content);
                }
            }
        }

        Ok(())
    }

    /// Executes pending tool calls in order and picks the next step.
    ///
    /// Routing only enters this step with pending calls; an empty batch in
    /// `Direct` mode answers `NO_TOOLS_EXECUTED`.
    async fn tools_step(&self, state: &mut WorkflowState) -> Result<Step, AgentError> {
        let calls = std::mem::take(&mut state.pending_calls);
        info!("╠──────────────────────────────────────────────────────────────");
        info!("║ TOOLS → Executing {} calls", calls.len());

        let mut outcomes = Vec::with_capacity(calls.len());
        for call in &calls {
            let output = self.execute_call(call).await?;
            debug!("║       ← {}: {} chars", call.name, output.len());
            outcomes.push(ToolOutcome { name: call.name.clone(), output });
        }

        match self.options.tool_mode {
            ToolMode::Direct => {
                let response = if outcomes.is_empty() {
                    NO_TOOLS_EXECUTED.to_string()
                } else {
                    outcomes.iter().map(ToString::to_string).collect::<Vec<_>>().join("\n")
                };
                state.response = Some(response);
                Ok(Step::End)
            }
            ToolMode::Loop => {
                for (call, outcome) in calls.iter().zip(outcomes) {
                    state.messages.push(ChatMessage::tool_result(call.id.clone(), outcome.output));
                }
                Ok(Step::Agent)
            }
        }
    }

    async fn execute_call(&self, call: &ToolCall) -> Result<String, AgentError> {
        info!("║       → Executing tool: {}", call.name);
        match self.tools.invoke(call).await {
            Ok(output) => Ok(output),
            Err(ToolError::NotFound(name)) => {
                warn!("║       ⚠ Model asked for unknown tool '{}'", name);
                Ok(TOOL_NOT_FOUND.to_string())
            }
            Err(e) if e.is_upstream() => {
                warn!("║       ⚠ Tool '{}' upstream failure: {}", call.name, e);
                Err(AgentError::ExternalApi(format!("{}: {}", call.name, e)))
            }
            Err(e) => Err(AgentError::Tool {
                name: call.name.clone(),
                message: e.to_string(),
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::VecDeque;
    use std::sync::Mutex;

    use async_trait::async_trait;
    use beacon_core::ChatRole;
    use beacon_core::Secret;
    use beacon_llm::{LlmMetrics, LlmResponse};
    use beacon_tools::WebSearchTool;
    use httpmock::prelude::*;
    use tempfile::TempDir;

    /// Replays canned replies and records every request.
    #[derive(Default)]
    struct ScriptedModel {
        replies: Mutex<VecDeque<Result<ModelReply, AgentError>>>,
        requests: Mutex<Vec<(Vec<ChatMessage>, Vec<ToolSchema>)>>,
    }

    impl ScriptedModel {
        fn new(replies: Vec<Result<ModelReply, AgentError>>) -> Arc<Self> {
            Arc::new(Self {
                replies: Mutex::new(replies.into()),
                requests: Mutex::default(),
            })
        }

        fn requests(&self) -> Vec<(Vec<ChatMessage>, Vec<ToolSchema>)> {
            self.requests.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl ChatModel for ScriptedModel {
        fn model_name(&self) -> &str {
            "scripted"
        }

        async fn complete(&self, messages: &[ChatMessage], tools: &[ToolSchema]) -> Result<ModelReply, AgentError> {
            self.requests.lock().unwrap().push((messages.to_vec(), tools.to_vec()));
            self.replies
                .lock()
                .unwrap()
                .pop_front()
                .unwrap_or_else(|| Err(AgentError::LlmError("script exhausted".into())))
        }
    }

    fn content(text: &str) -> Result<ModelReply, AgentError> {
        Ok(ModelReply::Content(LlmResponse { content: text.into(), metrics: LlmMetrics::default() }))
    }

    fn tool_calls(calls: &[(&str, &str, serde_json::Value)]) -> Result<ModelReply, AgentError> {
        Ok(ModelReply::ToolCalls {
            calls: calls
                .iter()
                .map(|(id, name, args)| ToolCall { id: id.to_string(), name: name.to_string(), arguments: args.clone() })
                .collect(),
            content: String::new(),
            metrics: LlmMetrics::default(),
        })
    }

    fn prompts(system_prompt: &str) -> (TempDir, PromptStore) {
        let dir = TempDir::new().unwrap();
        std::fs::write(dir.path().join("system_prompt.txt"), system_prompt).unwrap();
        let store = PromptStore::new(dir.path());
        (dir, store)
    }

    fn workflow(model: Arc<ScriptedModel>, store: PromptStore, mode: ToolMode) -> Workflow {
        Workflow::new(
            model,
            Arc::new(ToolRegistry::with_defaults(None)),
            store,
            WorkflowOptions { tool_mode: mode, max_tool_iterations: 3, ..Default::default() },
        )
    }

    #[tokio::test]
    async fn content_reply_ends_workflow() {
        let model = ScriptedModel::new(vec![content("Hello there!")]);
        let (_dir, store) = prompts("You are a helpful assistant.\n");
        let wf = workflow(model.clone(), store, ToolMode::Direct);

        let response = wf.run("Hi").await.unwrap();

        assert_eq!(response, "Hello there!");
        let requests = model.requests();
        assert_eq!(requests.len(), 1);
        let (messages, tools) = &requests[0];
        assert_eq!(messages.len(), 1);
        assert_eq!(messages[0].role, ChatRole::User);
        assert_eq!(messages[0].content, "You are a helpful assistant.\n\nHi");
        let names: Vec<&str> = tools.iter().map(|t| t.name.as_str()).collect();
        assert_eq!(names, vec!["get_weather", "search_web"]);
    }

    #[tokio::test]
    async fn direct_mode_returns_tool_results() {
        let model = ScriptedModel::new(vec![tool_calls(&[
            ("call_1", "get_weather", json!({ "location": "Paris" })),
            ("call_2", "search_web", json!({ "query": "rust" })),
        ])]);
        let (_dir, store) = prompts("Use tools.");
        let wf = workflow(model.clone(), store, ToolMode::Direct);

        let response = wf.run("Weather and news").await.unwrap();

        assert_eq!(
            response,
            "Tool get_weather result: Sunny, 72°F in Paris\nTool search_web result: Results for: rust"
        );
        assert_eq!(model.requests().len(), 1);
    }

    #[tokio::test]
    async fn unknown_tool_yields_not_found_output() {
        let model = ScriptedModel::new(vec![tool_calls(&[("call_1", "calculator", json!({ "expression": "1+1" }))])]);
        let (_dir, store) = prompts("Use tools.");
        let wf = workflow(model, store, ToolMode::Direct);

        let response = wf.run("1+1?").await.unwrap();
        assert_eq!(response, "Tool calculator result: Tool not found");
    }

    #[tokio::test]
    async fn tool_failure_fails_the_run() {
        let model = ScriptedModel::new(vec![tool_calls(&[("call_1", "get_weather", json!({}))])]);
        let (_dir, store) = prompts("Use tools.");
        let wf = workflow(model, store, ToolMode::Direct);

        let err = wf.run("weather?").await.unwrap_err();
        assert!(matches!(err, AgentError::Tool { ref name, .. } if name == "get_weather"));
    }

    #[tokio::test]
    async fn search_backend_failure_is_upstream() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(POST).path("/search");
                then.status(503).body("service unavailable");
            })
            .await;

        let mut registry = ToolRegistry::with_defaults(None);
        registry.register(WebSearchTool::tavily_at(Secret::new("tvly-test"), server.url("/search")));

        let model = ScriptedModel::new(vec![tool_calls(&[("call_1", "search_web", json!({ "query": "tokio" }))])]);
        let (_dir, store) = prompts("Use tools.");
        let wf = Workflow::new(model, Arc::new(registry), store, WorkflowOptions::default());

        let err = wf.run("search tokio").await.unwrap_err();

        assert!(matches!(err, AgentError::ExternalApi(ref msg) if msg.contains("503")));
        assert!(err.is_upstream());
        assert!(!err.to_string().contains("tvly-test"));
    }

    #[tokio::test]
    async fn empty_tools_step_reports_nothing_ran() {
        let model = ScriptedModel::new(vec![]);
        let (_dir, store) = prompts("Use tools.");
        let wf = workflow(model.clone(), store, ToolMode::Direct);
        let mut state = WorkflowState::new("q", "p");

        let next = wf.tools_step(&mut state).await.unwrap();

        assert_eq!(next, Step::End);
        assert_eq!(state.response.as_deref(), Some(NO_TOOLS_EXECUTED));
        assert!(model.requests().is_empty());
    }

    #[tokio::test]
    async fn loop_mode_feeds_results_back() {
        let model = ScriptedModel::new(vec![
            tool_calls(&[("call_1", "get_weather", json!({ "location": "Oslo" }))]),
            content("It's sunny in Oslo, 72°F."),
        ]);
        let (_dir, store) = prompts("Be brief.");
        let wf = workflow(model.clone(), store, ToolMode::Loop);

        let response = wf.run("Weather in Oslo?").await.unwrap();

        assert_eq!(response, "It's sunny in Oslo, 72°F.");
        let requests = model.requests();
        assert_eq!(requests.len(), 2);
        let follow_up = &requests[1].0;
        assert_eq!(follow_up.len(), 3);
        assert_eq!(follow_up[1].role, ChatRole::Assistant);
        assert_eq!(follow_up[1].tool_calls[0].id, "call_1");
        assert_eq!(follow_up[2].role, ChatRole::Tool);
        assert_eq!(follow_up[2].tool_call_id.as_deref(), Some("call_1"));
        assert_eq!(follow_up[2].content, "Sunny, 72°F in Oslo");
    }

    #[tokio::test]
    async fn loop_mode_stops_at_iteration_cap() {
        let call = || tool_calls(&[("call_x", "search_web", json!({ "query": "again" }))]);
        let model = ScriptedModel::new(vec![call(), call(), call(), call()]);
        let (_dir, store) = prompts("Loop forever.");
        let wf = workflow(model.clone(), store, ToolMode::Loop);

        let err = wf.run("go").await.unwrap_err();

        assert!(matches!(err, AgentError::MaxIterationsExceeded(3)));
        assert_eq!(model.requests().len(), 3);
    }

    #[tokio::test]
    async fn missing_prompt_fails_before_model_call() {
        let model = ScriptedModel::new(vec![content("unused")]);
        let dir = TempDir::new().unwrap();
        let wf = workflow(model.clone(), PromptStore::new(dir.path()), ToolMode::Direct);

        let err = wf.run("Hi").await.unwrap_err();

        assert!(matches!(err, AgentError::Prompt(_)));
        assert!(model.requests().is_empty());
    }

    #[tokio::test]
    async fn system_prompt_can_list_tools() {
        let model = ScriptedModel::new(vec![content("ok")]);
        let (_dir, store) = prompts("Tools: {{ tools | join(', ') }}");
        let wf = workflow(model.clone(), store, ToolMode::Direct);

        wf.run("Hi").await.unwrap();

        assert_eq!(model.requests()[0].0[0].content, "Tools: get_weather, search_web\n\nHi");
    }

    #[tokio::test]
    async fn model_errors_propagate() {
        let model = ScriptedModel::new(vec![Err(AgentError::LlmError("rate limited".into()))]);
        let (_dir, store) = prompts("Hi.");
        let wf = workflow(model, store, ToolMode::Direct);

        let err = wf.run("Hi").await.unwrap_err();
        assert!(err.is_upstream());
    }

    #[test]
    fn routing_follows_pending_calls() {
        let mut state = WorkflowState::new("q", "p");
        assert_eq!(route_after_agent(&state), Step::End);

        state.pending_calls.push(ToolCall { id: "1".into(), name: "get_weather".into(), arguments: json!({}) });
        assert_eq!(route_after_agent(&state), Step::Tools);
    }

    #[test]
    fn outcome_renders_as_result_line() {
        let outcome = ToolOutcome { name: "search_web".into(), output: "Results for: x".into() };
        assert_eq!(outcome.to_string(), "Tool search_web result: Results for: x");
    }
}
