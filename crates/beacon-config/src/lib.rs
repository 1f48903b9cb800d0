//! Environment settings and prompt templates for beacon.
//!
//! This crate defines how the service is configured:
//!
//! - [`Settings`] — Everything read from the environment at startup
//! - [`LlmSettings`] — API key, model and base URL of the chat-completion API
//! - [`ToolMode`] — Whether tool results are returned directly or fed back to the model
//! - [`PromptStore`] — Loads and renders prompt templates from a directory
//!
//! # Loading from the environment
//!
//! ```rust,ignore
//! use beacon_config::Settings;
//!
//! dotenvy::dotenv().ok();
//! let settings = Settings::from_env()?;
//! ```
//!
//! # Loading from a lookup function
//!
//! ```rust
//! use std::collections::HashMap;
//! use beacon_config::{Settings, ToolMode};
//!
//! let vars = HashMap::from([("OPENROUTER_API_KEY", "sk-test")]);
//! let settings = Settings::from_lookup(|k| vars.get(k).map(|v| v.to_string())).unwrap();
//!
//! assert_eq!(settings.llm.model, "openai/gpt-4o-mini");
//! assert_eq!(settings.tool_mode, ToolMode::Direct);
//! ```

mod prompt;

pub use prompt::{PromptError, PromptStore};

use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

use beacon_core::Secret;

pub const API_KEY_VAR: &str = "OPENROUTER_API_KEY";
pub const MODEL_VAR: &str = "OPENROUTER_MODEL";
pub const BASE_URL_VAR: &str = "OPENROUTER_BASE_URL";
pub const BIND_ADDR_VAR: &str = "BEACON_BIND_ADDR";
pub const PROMPTS_DIR_VAR: &str = "BEACON_PROMPTS_DIR";
pub const SYSTEM_PROMPT_VAR: &str = "BEACON_SYSTEM_PROMPT";
pub const TOOL_MODE_VAR: &str = "BEACON_TOOL_MODE";
pub const MAX_TOOL_ITERATIONS_VAR: &str = "BEACON_MAX_TOOL_ITERATIONS";
pub const MAX_QUERY_CHARS_VAR: &str = "BEACON_MAX_QUERY_CHARS";
pub const TAVILY_API_KEY_VAR: &str = "TAVILY_API_KEY";

pub const DEFAULT_MODEL: &str = "openai/gpt-4o-mini";
pub const DEFAULT_BASE_URL: &str = "https://openrouter.ai/api/v1";
pub const DEFAULT_BIND_ADDR: &str = "127.0.0.1:8000";
pub const DEFAULT_PROMPTS_DIR: &str = "prompts";
pub const DEFAULT_SYSTEM_PROMPT: &str = "system_prompt";
pub const DEFAULT_MAX_TOOL_ITERATIONS: usize = 10;
pub const DEFAULT_MAX_QUERY_CHARS: usize = 8000;

/// Errors that can occur when reading settings.
#[derive(thiserror::Error, Debug)]
pub enum ConfigError {
    /// A required variable is unset or blank.
    #[error("missing required environment variable {0}")]
    Missing(&'static str),

    /// A variable is set but cannot be parsed.
    #[error("invalid value for {key}: '{value}'")]
    Invalid { key: &'static str, value: String },
}

/// How the workflow treats tool calls requested by the model.
///
/// | Mode | Behavior |
/// |------|----------|
/// | `Direct` | Run the tools once, return their outputs as the response |
/// | `Loop` | Feed tool outputs back to the model until it answers |
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ToolMode {
    #[default]
    Direct,
    Loop,
}

impl FromStr for ToolMode {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "direct" => Ok(Self::Direct),
            "loop" => Ok(Self::Loop),
            _ => Err(()),
        }
    }
}

impl fmt::Display for ToolMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ToolMode::Direct => f.write_str("direct"),
            ToolMode::Loop => f.write_str("loop"),
        }
    }
}

/// Connection settings for the chat-completion API.
#[derive(Debug, Clone)]
pub struct LlmSettings {
    pub api_key: Secret,
    pub model: String,
    pub base_url: String,
}

/// All runtime settings of the service.
///
/// `Debug` is safe to log: every credential is a [`Secret`].
#[derive(Debug, Clone)]
pub struct Settings {
    pub llm: LlmSettings,
    pub bind_addr: String,
    pub prompts_dir: PathBuf,
    pub system_prompt: String,
    pub tool_mode: ToolMode,
    pub max_tool_iterations: usize,
    pub max_query_chars: usize,
    pub tavily_api_key: Option<Secret>,
}

impl Settings {
    /// Reads settings from the process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Reads settings through `lookup`, treating blank values as unset.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());

        let api_key = get(API_KEY_VAR).ok_or(ConfigError::Missing(API_KEY_VAR))?;

        let tool_mode = match get(TOOL_MODE_VAR) {
            Some(value) => value
                .parse::<ToolMode>()
                .map_err(|_| ConfigError::Invalid { key: TOOL_MODE_VAR, value })?,
            None => ToolMode::default(),
        };

        Ok(Self {
            llm: LlmSettings {
                api_key: Secret::new(api_key),
                model: get(MODEL_VAR).unwrap_or_else(|| DEFAULT_MODEL.into()),
                base_url: get(BASE_URL_VAR).unwrap_or_else(|| DEFAULT_BASE_URL.into()),
            },
            bind_addr: get(BIND_ADDR_VAR).unwrap_or_else(|| DEFAULT_BIND_ADDR.into()),
            prompts_dir: get(PROMPTS_DIR_VAR)
                .map(PathBuf::from)
                .unwrap_or_else(|| PathBuf::from(DEFAULT_PROMPTS_DIR)),
            system_prompt: get(SYSTEM_PROMPT_VAR).unwrap_or_else(|| DEFAULT_SYSTEM_PROMPT.into()),
            tool_mode,
            max_tool_iterations: parse_positive(
                MAX_TOOL_ITERATIONS_VAR,
                get(MAX_TOOL_ITERATIONS_VAR),
                DEFAULT_MAX_TOOL_ITERATIONS,
            )?,
            max_query_chars: parse_positive(
                MAX_QUERY_CHARS_VAR,
                get(MAX_QUERY_CHARS_VAR),
                DEFAULT_MAX_QUERY_CHARS,
            )?,
            tavily_api_key: get(TAVILY_API_KEY_VAR).map(Secret::new),
        })
    }
}

fn parse_positive(key: &'static str, value: Option<String>, default: usize) -> Result<usize, ConfigError> {
    let Some(value) = value else {
        return Ok(default);
    };
    match value.parse::<usize>() {
        Ok(n) if n > 0 => Ok(n),
        _ => Err(ConfigError::Invalid { key, value }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn settings_from(vars: &[(&str, &str)]) -> Result<Settings, ConfigError> {
        let map: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        Settings::from_lookup(|k| map.get(k).cloned())
    }

    #[test]
    fn defaults_apply_when_only_key_is_set() {
        let settings = settings_from(&[(API_KEY_VAR, "sk-test")]).unwrap();

        assert_eq!(settings.llm.api_key.expose(), "sk-test");
        assert_eq!(settings.llm.model, DEFAULT_MODEL);
        assert_eq!(settings.llm.base_url, DEFAULT_BASE_URL);
        assert_eq!(settings.bind_addr, DEFAULT_BIND_ADDR);
        assert_eq!(settings.prompts_dir, PathBuf::from("prompts"));
        assert_eq!(settings.system_prompt, "system_prompt");
        assert_eq!(settings.tool_mode, ToolMode::Direct);
        assert_eq!(settings.max_tool_iterations, 10);
        assert_eq!(settings.max_query_chars, 8000);
        assert!(settings.tavily_api_key.is_none());
    }

    #[test]
    fn missing_api_key_is_an_error() {
        let err = settings_from(&[]).unwrap_err();
        assert!(matches!(err, ConfigError::Missing(API_KEY_VAR)));
        assert_eq!(err.to_string(), "missing required environment variable OPENROUTER_API_KEY");
    }

    #[test]
    fn blank_api_key_counts_as_missing() {
        let err = settings_from(&[(API_KEY_VAR, "   ")]).unwrap_err();
        assert!(matches!(err, ConfigError::Missing(_)));
    }

    #[test]
    fn overrides_are_read() {
        let settings = settings_from(&[
            (API_KEY_VAR, "sk-test"),
            (MODEL_VAR, "anthropic/claude-3.5-haiku"),
            (BASE_URL_VAR, "http://localhost:9999/v1"),
            (TOOL_MODE_VAR, "LOOP"),
            (MAX_TOOL_ITERATIONS_VAR, "3"),
            (MAX_QUERY_CHARS_VAR, "200"),
            (TAVILY_API_KEY_VAR, "tvly-123"),
        ])
        .unwrap();

        assert_eq!(settings.llm.model, "anthropic/claude-3.5-haiku");
        assert_eq!(settings.llm.base_url, "http://localhost:9999/v1");
        assert_eq!(settings.tool_mode, ToolMode::Loop);
        assert_eq!(settings.max_tool_iterations, 3);
        assert_eq!(settings.max_query_chars, 200);
        assert_eq!(settings.tavily_api_key.as_ref().map(Secret::expose), Some("tvly-123"));
    }

    #[test]
    fn invalid_numbers_are_rejected() {
        let err = settings_from(&[(API_KEY_VAR, "sk-test"), (MAX_QUERY_CHARS_VAR, "lots")]).unwrap_err();
        assert!(matches!(err, ConfigError::Invalid { key: MAX_QUERY_CHARS_VAR, .. }));

        let err = settings_from(&[(API_KEY_VAR, "sk-test"), (MAX_TOOL_ITERATIONS_VAR, "0")]).unwrap_err();
        assert!(matches!(err, ConfigError::Invalid { key: MAX_TOOL_ITERATIONS_VAR, .. }));
    }

    #[test]
    fn unknown_tool_mode_is_rejected() {
        let err = settings_from(&[(API_KEY_VAR, "sk-test"), (TOOL_MODE_VAR, "parallel")]).unwrap_err();
        assert_eq!(err.to_string(), "invalid value for BEACON_TOOL_MODE: 'parallel'");
    }

    #[test]
    fn debug_output_never_contains_keys() {
        let settings = settings_from(&[(API_KEY_VAR, "sk-very-secret"), (TAVILY_API_KEY_VAR, "tvly-secret")]).unwrap();
        let rendered = format!("{:?}", settings);
        assert!(!rendered.contains("sk-very-secret"));
        assert!(!rendered.contains("tvly-secret"));
        assert!(rendered.contains("[REDACTED]"));
    }
}
