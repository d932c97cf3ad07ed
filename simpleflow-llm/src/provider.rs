//! Completion providers.

use std::{
    collections::VecDeque,
    fmt::Debug,
    sync::{Arc, Mutex},
};

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::{
    config::CompletionConfig,
    error::{LlmError, Result},
};

/// Turns a prompt into generated text.
#[async_trait]
pub trait CompletionProvider: Send + Sync + Debug {
    async fn complete(&self, prompt: &str) -> Result<String>;
}

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
    max_tokens: u32,
    temperature: f32,
    stream: bool,
}

#[derive(Debug, Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    #[serde(default)]
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChoiceMessage,
}

#[derive(Debug, Deserialize)]
struct ChoiceMessage {
    content: Option<String>,
}

/// Extract the first choice's message content from a chat-completions body.
pub fn parse_completion(body: &str) -> Result<String> {
    let response: ChatResponse = serde_json::from_str(body)?;
    response
        .choices
        .into_iter()
        .next()
        .and_then(|choice| choice.message.content)
        .ok_or_else(|| LlmError::malformed("response carries no choice with content"))
}

/// Client for an OpenAI-compatible `/chat/completions` endpoint.
///
/// Each prompt is sent as a single user message with streaming disabled.
/// The whole request is bounded by [`CompletionConfig::timeout`].
#[derive(Debug, Clone)]
pub struct ChatCompletionProvider {
    client: reqwest::Client,
    config: CompletionConfig,
}

impl ChatCompletionProvider {
    pub fn new(config: CompletionConfig) -> Result<Self> {
        config.validate()?;
        let client = reqwest::Client::builder()
            .timeout(config.timeout())
            .build()
            .map_err(|e| LlmError::configuration(e.to_string()))?;
        Ok(Self { client, config })
    }

    /// Provider configured from `SIMPLEFLOW_LLM_*` environment variables.
    pub fn from_env() -> Result<Self> {
        Self::new(CompletionConfig::from_env()?)
    }

    pub fn config(&self) -> &CompletionConfig {
        &self.config
    }
}

#[async_trait]
impl CompletionProvider for ChatCompletionProvider {
    async fn complete(&self, prompt: &str) -> Result<String> {
        let body = ChatRequest {
            model: &self.config.model,
            messages: vec![ChatMessage {
                role: "user",
                content: prompt,
            }],
            max_tokens: self.config.max_tokens,
            temperature: self.config.temperature,
            stream: false,
        };

        let mut request = self.client.post(&self.config.endpoint).json(&body);
        if let Some(api_key) = &self.config.api_key {
            request = request.bearer_auth(api_key);
        }

        debug!(
            model = %self.config.model,
            prompt_chars = prompt.len(),
            "requesting completion"
        );
        let response = request.send().await?;
        let status = response.status();
        let text = response.text().await?;

        if !status.is_success() {
            return Err(LlmError::status(status.as_u16(), text));
        }
        parse_completion(&text)
    }
}

/// Provider that replays canned replies in order.
///
/// Once the script runs out the last reply is repeated. Every prompt is
/// recorded so tests and offline demos can inspect what was asked.
#[derive(Debug, Clone, Default)]
pub struct ScriptedProvider {
    replies: Arc<Mutex<VecDeque<String>>>,
    last: Arc<Mutex<Option<String>>>,
    prompts: Arc<Mutex<Vec<String>>>,
}

impl ScriptedProvider {
    pub fn new<I, S>(replies: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            replies: Arc::new(Mutex::new(replies.into_iter().map(Into::into).collect())),
            ..Self::default()
        }
    }

    /// Prompts received so far.
    pub fn prompts(&self) -> Vec<String> {
        self.prompts
            .lock()
            .map(|prompts| prompts.clone())
            .unwrap_or_default()
    }
}

#[async_trait]
impl CompletionProvider for ScriptedProvider {
    async fn complete(&self, prompt: &str) -> Result<String> {
        self.prompts.lock().map_err(poisoned)?.push(prompt.to_string());

        let next = self.replies.lock().map_err(poisoned)?.pop_front();
        let mut last = self.last.lock().map_err(poisoned)?;
        match next {
            Some(reply) => {
                *last = Some(reply.clone());
                Ok(reply)
            }
            None => last
                .clone()
                .ok_or_else(|| LlmError::transport("scripted provider has no replies")),
        }
    }
}

fn poisoned<T>(_: std::sync::PoisonError<T>) -> LlmError {
    LlmError::context("scripted provider lock poisoned")
}
