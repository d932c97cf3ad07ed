//! Node that renders a prompt, calls a model and stores the answer.

use std::sync::Arc;

use async_trait::async_trait;
use simpleflow_core::prelude::{Action, Context, FlowError, Node};
use tracing::{debug, warn};

use crate::{
    error::{LlmError, Result},
    input::{InputBuilder, TemplateInput},
    output::{OutputParser, VerbatimOutput},
    provider::CompletionProvider,
};

/// Action returned when the prompt cannot be built from the context.
pub const INVALID_INPUT: &str = "invalid_input";

/// A language-model step composed of an input builder, a completion
/// provider and an output parser.
///
/// A template failure is not a fault: the node leaves the context untouched
/// and returns [`INVALID_INPUT`] (or the configured replacement), so the
/// graph can route it. Provider and parser errors abort the run.
#[derive(Debug, Clone)]
pub struct LlmNode {
    name: String,
    input: Arc<dyn InputBuilder>,
    provider: Arc<dyn CompletionProvider>,
    output: Arc<dyn OutputParser>,
    on_success: Action,
    on_invalid_input: Action,
}

impl LlmNode {
    pub fn builder(name: impl Into<String>) -> LlmNodeBuilder {
        LlmNodeBuilder::new(name)
    }

    /// Template in, whole answer out into `output_field`.
    pub fn simple(
        name: impl Into<String>,
        template: &str,
        output_field: impl Into<String>,
        provider: Arc<dyn CompletionProvider>,
    ) -> Result<Self> {
        Self::builder(name)
            .input(TemplateInput::new(template)?)
            .provider(provider)
            .output(VerbatimOutput::new(output_field))
            .build()
    }
}

#[async_trait]
impl Node for LlmNode {
    async fn execute(
        &self,
        mut context: Context,
    ) -> std::result::Result<(Context, Action), FlowError> {
        let prompt = match self.input.build(&context).await {
            Ok(prompt) => prompt,
            Err(LlmError::Template(reason)) => {
                warn!(node = %self.name, %reason, "prompt could not be built");
                return Ok((context, self.on_invalid_input.clone()));
            }
            Err(err) => return Err(err.into()),
        };

        debug!(node = %self.name, prompt_chars = prompt.len(), "calling completion provider");
        let output = self.provider.complete(&prompt).await?;
        self.output.parse(&mut context, &output).await?;

        Ok((context, self.on_success.clone()))
    }

    fn name(&self) -> String {
        self.name.clone()
    }
}

/// Builder for [`LlmNode`].
#[derive(Debug)]
pub struct LlmNodeBuilder {
    name: String,
    input: Option<Arc<dyn InputBuilder>>,
    provider: Option<Arc<dyn CompletionProvider>>,
    output: Option<Arc<dyn OutputParser>>,
    on_success: Action,
    on_invalid_input: Action,
}

impl LlmNodeBuilder {
    fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            input: None,
            provider: None,
            output: None,
            on_success: Action::default(),
            on_invalid_input: Action::new(INVALID_INPUT),
        }
    }

    pub fn input(mut self, input: impl InputBuilder + 'static) -> Self {
        self.input = Some(Arc::new(input));
        self
    }

    pub fn provider(mut self, provider: Arc<dyn CompletionProvider>) -> Self {
        self.provider = Some(provider);
        self
    }

    pub fn output(mut self, output: impl OutputParser + 'static) -> Self {
        self.output = Some(Arc::new(output));
        self
    }

    /// Action returned after a successful call. Defaults to the default edge.
    pub fn on_success(mut self, action: impl Into<Action>) -> Self {
        self.on_success = action.into();
        self
    }

    /// Action returned when the prompt cannot be built.
    pub fn on_invalid_input(mut self, action: impl Into<Action>) -> Self {
        self.on_invalid_input = action.into();
        self
    }

    pub fn build(self) -> Result<LlmNode> {
        let missing = |part: &str| {
            LlmError::configuration(format!("LlmNode '{}' has no {part}", self.name))
        };
        let input = self.input.clone().ok_or_else(|| missing("input builder"))?;
        let provider = self.provider.clone().ok_or_else(|| missing("provider"))?;
        let output = self.output.clone().ok_or_else(|| missing("output parser"))?;

        Ok(LlmNode {
            name: self.name,
            input,
            provider,
            output,
            on_success: self.on_success,
            on_invalid_input: self.on_invalid_input,
        })
    }
}
