//! Writing model output back into the flow context.

use std::fmt::Debug;

use async_trait::async_trait;
use regex::Regex;
use simpleflow_core::prelude::Context;

use crate::error::{LlmError, Result};

/// Stores generated text in the context.
#[async_trait]
pub trait OutputParser: Send + Sync + Debug {
    async fn parse(&self, context: &mut Context, output: &str) -> Result<()>;
}

/// Assigns the whole output, untouched, to one field.
#[derive(Debug, Clone)]
pub struct VerbatimOutput {
    field: String,
}

impl VerbatimOutput {
    pub fn new(field: impl Into<String>) -> Self {
        Self {
            field: field.into(),
        }
    }

    pub fn field(&self) -> &str {
        &self.field
    }
}

#[async_trait]
impl OutputParser for VerbatimOutput {
    async fn parse(&self, context: &mut Context, output: &str) -> Result<()> {
        context.set(self.field.clone(), output)?;
        Ok(())
    }
}

/// Applies a regex repeatedly and collects its named groups.
///
/// Each named group maps to a list-valued field of the same name; every
/// match appends the group's trimmed text. Fields are created empty when
/// nothing matches, so later templates can always iterate them.
#[derive(Debug, Clone)]
pub struct PatternExtractor {
    pattern: Regex,
    fields: Vec<String>,
}

impl PatternExtractor {
    pub fn new(pattern: &str) -> Result<Self> {
        let pattern = Regex::new(pattern)?;
        let fields: Vec<String> = pattern
            .capture_names()
            .flatten()
            .map(str::to_string)
            .collect();
        if fields.is_empty() {
            return Err(LlmError::extraction(format!(
                "pattern {:?} has no named groups",
                pattern.as_str()
            )));
        }
        Ok(Self { pattern, fields })
    }

    /// `[QUESTION] ... [ANSWER] ... [END]` blocks into `question` and
    /// `response` lists.
    pub fn question_answer() -> Result<Self> {
        Self::new(r"(?s)\[QUESTION\](?P<question>.*?)\[ANSWER\](?P<response>.*?)\[END\]")
    }

    /// Field names written by this extractor.
    pub fn fields(&self) -> &[String] {
        &self.fields
    }
}

#[async_trait]
impl OutputParser for PatternExtractor {
    async fn parse(&self, context: &mut Context, output: &str) -> Result<()> {
        for field in &self.fields {
            if !context.contains(field) {
                context.set(field.clone(), Vec::<String>::new())?;
            }
        }

        for captures in self.pattern.captures_iter(output) {
            for field in &self.fields {
                if let Some(group) = captures.name(field) {
                    context.push(field.clone(), group.as_str().trim())?;
                }
            }
        }
        Ok(())
    }
}
