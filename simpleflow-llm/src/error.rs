//! Error types for language-model nodes.

use simpleflow_core::prelude::FlowError;
use thiserror::Error;

/// Result type for language-model operations.
pub type Result<T> = std::result::Result<T, LlmError>;

/// Errors raised by providers, input builders and output parsers.
#[derive(Error, Debug, Clone)]
pub enum LlmError {
    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("Transport error: {0}")]
    Transport(String),

    #[error("Timeout error: {0}")]
    Timeout(String),

    #[error("Endpoint returned {code}: {body}")]
    Status { code: u16, body: String },

    #[error("Malformed response: {0}")]
    MalformedResponse(String),

    #[error("Template error: {0}")]
    Template(String),

    #[error("Extraction error: {0}")]
    Extraction(String),

    #[error("Context error: {0}")]
    Context(String),
}

impl LlmError {
    /// Create a configuration error
    pub fn configuration(message: impl Into<String>) -> Self {
        Self::Configuration(message.into())
    }

    /// Create a transport error
    pub fn transport(message: impl Into<String>) -> Self {
        Self::Transport(message.into())
    }

    /// Create a timeout error
    pub fn timeout(message: impl Into<String>) -> Self {
        Self::Timeout(message.into())
    }

    /// Create a status error from a non-success response
    pub fn status(code: u16, body: impl Into<String>) -> Self {
        Self::Status {
            code,
            body: body.into(),
        }
    }

    /// Create a malformed response error
    pub fn malformed(message: impl Into<String>) -> Self {
        Self::MalformedResponse(message.into())
    }

    /// Create a template error
    pub fn template(message: impl Into<String>) -> Self {
        Self::Template(message.into())
    }

    /// Create an extraction error
    pub fn extraction(message: impl Into<String>) -> Self {
        Self::Extraction(message.into())
    }

    /// Create a context error
    pub fn context(message: impl Into<String>) -> Self {
        Self::Context(message.into())
    }

    /// Check if a retry could succeed without changing the request.
    ///
    /// 429 and 5xx responses count as transient.
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::Transport(_) | Self::Timeout(_) => true,
            Self::Status { code, .. } => *code == 429 || *code >= 500,
            _ => false,
        }
    }

    /// Get error category for logging
    pub fn category(&self) -> &'static str {
        match self {
            Self::Configuration(_) => "configuration",
            Self::Transport(_) => "transport",
            Self::Timeout(_) => "timeout",
            Self::Status { .. } => "status",
            Self::MalformedResponse(_) => "malformed_response",
            Self::Template(_) => "template",
            Self::Extraction(_) => "extraction",
            Self::Context(_) => "context",
        }
    }
}

impl From<serde_json::Error> for LlmError {
    fn from(err: serde_json::Error) -> Self {
        Self::MalformedResponse(err.to_string())
    }
}

impl From<reqwest::Error> for LlmError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            Self::Timeout(err.to_string())
        } else if err.is_decode() {
            Self::MalformedResponse(err.to_string())
        } else if let Some(status) = err.status() {
            Self::status(status.as_u16(), err.to_string())
        } else {
            Self::Transport(err.to_string())
        }
    }
}

impl From<minijinja::Error> for LlmError {
    fn from(err: minijinja::Error) -> Self {
        Self::Template(err.to_string())
    }
}

impl From<regex::Error> for LlmError {
    fn from(err: regex::Error) -> Self {
        Self::Extraction(err.to_string())
    }
}

// Integration with simpleflow-core
impl From<LlmError> for FlowError {
    fn from(err: LlmError) -> Self {
        FlowError::node(err)
    }
}

impl From<FlowError> for LlmError {
    fn from(err: FlowError) -> Self {
        Self::Context(err.to_string())
    }
}
