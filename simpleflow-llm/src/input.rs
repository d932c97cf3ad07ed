//! Prompt construction from the flow context.

use std::fmt::Debug;

use async_trait::async_trait;
use minijinja::{Environment, UndefinedBehavior};
use simpleflow_core::prelude::Context;

use crate::error::{LlmError, Result};

/// Builds the prompt for a language-model call.
///
/// An `Err(LlmError::Template(_))` means the context cannot produce a
/// prompt; [`LlmNode`](crate::block::LlmNode) routes that to its sentinel
/// action instead of failing the flow.
#[async_trait]
pub trait InputBuilder: Send + Sync + Debug {
    async fn build(&self, context: &Context) -> Result<String>;
}

const TEMPLATE_NAME: &str = "prompt";

/// Renders a Jinja template against the context's fields.
///
/// Every context field is a top-level template variable. The rendered
/// prompt is trimmed. Undefined variables render as empty text unless the
/// builder was made [`strict`](TemplateInput::strict).
pub struct TemplateInput {
    env: Environment<'static>,
    source: String,
}

impl Debug for TemplateInput {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TemplateInput")
            .field("source_len", &self.source.len())
            .finish()
    }
}

impl TemplateInput {
    /// Compile `source` once to reject syntax errors up front.
    pub fn new(source: impl Into<String>) -> Result<Self> {
        let source = source.into();
        let mut env = Environment::new();
        env.add_template_owned(TEMPLATE_NAME, source.clone())
            .map_err(|e| LlmError::template(format!("Template compile error: {e}")))?;
        Ok(Self { env, source })
    }

    /// Fail rendering when the template references a missing field.
    pub fn strict(mut self) -> Self {
        self.env.set_undefined_behavior(UndefinedBehavior::Strict);
        self
    }

    pub fn source(&self) -> &str {
        &self.source
    }

    /// Render against an arbitrary serializable value.
    pub fn render(&self, variables: impl serde::Serialize) -> Result<String> {
        let template = self
            .env
            .get_template(TEMPLATE_NAME)
            .map_err(|e| LlmError::template(format!("Template lookup error: {e}")))?;
        let rendered = template
            .render(variables)
            .map_err(|e| LlmError::template(format!("Template render error: {e}")))?;
        Ok(rendered.trim().to_string())
    }
}

#[async_trait]
impl InputBuilder for TemplateInput {
    async fn build(&self, context: &Context) -> Result<String> {
        self.render(context.to_json())
    }
}
