//! Prompt templates stored as flat `.txt` files.
//!
//! A template named `system_prompt` lives at `<dir>/system_prompt.txt`.
//! Templates may contain Jinja-style substitution points (`{{ name }}`),
//! filled in by [`PromptStore::render`].

use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use minijinja::Environment;
use tracing::debug;

const TEMPLATE_EXT: &str = "txt";

/// Errors that can occur when loading or rendering a prompt template.
#[derive(thiserror::Error, Debug)]
pub enum PromptError {
    /// Name is empty or would escape the prompts directory.
    #[error("invalid prompt name '{0}'")]
    InvalidName(String),

    /// No template file exists for the name.
    #[error("prompt template '{name}' not found at {path}")]
    NotFound { name: String, path: String },

    /// Failed to read the template file.
    #[error("failed to read prompt template '{path}': {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    /// Template syntax or substitution failed.
    #[error("failed to render prompt template '{name}': {detail}")]
    Render { name: String, detail: String },
}

impl From<PromptError> for beacon_core::AgentError {
    fn from(err: PromptError) -> Self {
        beacon_core::AgentError::Prompt(err.to_string())
    }
}

/// Loads prompt templates from a directory.
///
/// Files are read on every call, so edits are picked up without a restart.
#[derive(Debug, Clone)]
pub struct PromptStore {
    dir: PathBuf,
}

impl PromptStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// Directory the templates are read from.
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Returns true if a template file exists for `name`.
    pub fn exists(&self, name: &str) -> bool {
        self.path_for(name).is_ok_and(|p| p.is_file())
    }

    /// Loads the raw template text, trimmed of surrounding whitespace.
    pub fn load(&self, name: &str) -> Result<String, PromptError> {
        let path = self.path_for(name)?;
        let content = fs::read_to_string(&path).map_err(|e| match e.kind() {
            ErrorKind::NotFound => PromptError::NotFound {
                name: name.to_string(),
                path: path.display().to_string(),
            },
            _ => PromptError::Io {
                path: path.display().to_string(),
                source: e,
            },
        })?;
        debug!("Loaded prompt '{}' ({} chars)", name, content.len());
        Ok(content.trim().to_string())
    }

    /// Loads a template and fills its substitution points from `vars`.
    ///
    /// `vars` is usually a JSON object; a template without substitution
    /// points renders to its trimmed text.
    pub fn render(&self, name: &str, vars: &serde_json::Value) -> Result<String, PromptError> {
        let template = self.load(name)?;
        let env = Environment::new();
        env.render_str(&template, vars).map_err(|e| PromptError::Render {
            name: name.to_string(),
            detail: e.to_string(),
        })
    }

    fn path_for(&self, name: &str) -> Result<PathBuf, PromptError> {
        let valid = !name.is_empty()
            && !name.contains("..")
            && !name.contains(['/', '\\'])
            && !Path::new(name).is_absolute();
        if !valid {
            return Err(PromptError::InvalidName(name.to_string()));
        }
        Ok(self.dir.join(format!("{}.{}", name, TEMPLATE_EXT)))
    }
}
