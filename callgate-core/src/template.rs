//! Template evaluation seam.

use callgate_types::Variables;
use minijinja::{Environment, UndefinedBehavior};
use thiserror::Error;

/// A template failed to compile or evaluate.
#[derive(Debug, Clone, Error)]
#[error("{message}")]
pub struct TemplateError {
    message: String,
}

impl TemplateError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

impl From<minijinja::Error> for TemplateError {
    fn from(e: minijinja::Error) -> Self {
        Self::new(e.to_string())
    }
}

/// Evaluates a single template string against variables.
pub trait TemplateEngine: Send + Sync {
    fn render(&self, source: &str, variables: &Variables) -> Result<String, TemplateError>;
}

/// Returns true if `s` contains template markup.
pub fn is_template(s: &str) -> bool {
    s.contains("{{") || s.contains("{%") || s.contains("{#")
}

/// Jinja templates via `minijinja`.
///
/// Undefined variables are errors, and rendered output is trimmed.
pub struct JinjaTemplateEngine {
    env: Environment<'static>,
}

impl JinjaTemplateEngine {
    pub fn new() -> Self {
        let mut env = Environment::new();
        env.set_undefined_behavior(UndefinedBehavior::Strict);
        Self { env }
    }
}

impl Default for JinjaTemplateEngine {
    fn default() -> Self {
        Self::new()
    }
}

impl TemplateEngine for JinjaTemplateEngine {
    fn render(&self, source: &str, variables: &Variables) -> Result<String, TemplateError> {
        let rendered = self.env.render_str(source, variables)?;
        Ok(rendered.trim().to_string())
    }
}
