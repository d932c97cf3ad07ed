//! # SimpleFlow LLM
//!
//! Language-model steps for SimpleFlow graphs.
//!
//! An [`LlmNode`](block::LlmNode) is assembled from three parts:
//!
//! - an [`InputBuilder`](input::InputBuilder) that turns the context into a
//!   prompt ([`TemplateInput`](input::TemplateInput) renders a Jinja template)
//! - a [`CompletionProvider`](provider::CompletionProvider) that sends the
//!   prompt to a model ([`ChatCompletionProvider`](provider::ChatCompletionProvider)
//!   talks to any OpenAI-compatible chat-completions endpoint)
//! - an [`OutputParser`](output::OutputParser) that writes the answer back
//!   ([`VerbatimOutput`](output::VerbatimOutput),
//!   [`PatternExtractor`](output::PatternExtractor))
//!
//! ```rust
//! use std::sync::Arc;
//!
//! use simpleflow_llm::prelude::*;
//!
//! # tokio_test::block_on(async {
//! let provider = Arc::new(ScriptedProvider::new(["Twelve dollars a month."]));
//! let summarize = LlmNode::simple("summarize", prompts::DETAILED_SUMMARY, "summary", provider)?;
//!
//! let mut graph = Graph::new();
//! let start = graph.add_node(summarize);
//! let flow = Flow::new(graph, start)?;
//!
//! let context = ContextBuilder::new()
//!     .with_json("document", "The monthly fee is $12.")?
//!     .build();
//! let context = flow.run(context).await?;
//! assert_eq!(
//!     context.get::<String>("summary")?.as_deref(),
//!     Some("Twelve dollars a month.")
//! );
//! # Ok::<(), FlowError>(())
//! # }).unwrap();
//! ```

pub mod block;
pub mod config;
pub mod error;
pub mod input;
pub mod output;
pub mod prompts;
pub mod provider;

/// Prelude module for convenient imports
pub mod prelude {
    pub use simpleflow_core::prelude::*;

    pub use crate::{
        block::{INVALID_INPUT, LlmNode, LlmNodeBuilder},
        config::CompletionConfig,
        error::LlmError,
        input::{InputBuilder, TemplateInput},
        output::{OutputParser, PatternExtractor, VerbatimOutput},
        prompts,
        provider::{ChatCompletionProvider, CompletionProvider, ScriptedProvider},
    };
}
