//! Completion endpoint configuration.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::{LlmError, Result};

/// Prefix of the environment variables read by [`CompletionConfig::from_env`].
pub const ENV_PREFIX: &str = "SIMPLEFLOW_LLM_";

/// Settings for an OpenAI-compatible chat-completions endpoint.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CompletionConfig {
    /// Full URL of the chat-completions route
    pub endpoint: String,
    /// Model name sent with every request
    pub model: String,
    /// Bearer token, if the endpoint needs one
    #[serde(skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,
    pub max_tokens: u32,
    pub temperature: f32,
    /// Total request timeout, written as fractional seconds
    #[serde(rename = "timeout_secs", with = "fractional_secs")]
    pub timeout: Duration,
}

impl Default for CompletionConfig {
    fn default() -> Self {
        Self {
            endpoint: "http://localhost:11434/v1/chat/completions".to_string(),
            model: "phi4-mini".to_string(),
            api_key: None,
            max_tokens: 1024,
            temperature: 0.8,
            timeout: Duration::from_secs(120),
        }
    }
}

impl CompletionConfig {
    pub fn with_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = endpoint.into();
        self
    }

    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    pub fn with_api_key(mut self, api_key: impl Into<String>) -> Self {
        self.api_key = Some(api_key.into());
        self
    }

    pub fn with_max_tokens(mut self, max_tokens: u32) -> Self {
        self.max_tokens = max_tokens;
        self
    }

    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = temperature;
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Total request timeout.
    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Defaults overridden by `SIMPLEFLOW_LLM_*` environment variables.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Defaults overridden by whatever `lookup` returns for each
    /// `SIMPLEFLOW_LLM_*` name. Unset names keep their default.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |suffix: &str| lookup(&format!("{ENV_PREFIX}{suffix}"));
        let mut config = Self::default();

        if let Some(endpoint) = var("ENDPOINT") {
            config.endpoint = endpoint;
        }
        if let Some(model) = var("MODEL") {
            config.model = model;
        }
        if let Some(api_key) = var("API_KEY").filter(|key| !key.is_empty()) {
            config.api_key = Some(api_key);
        }
        if let Some(raw) = var("MAX_TOKENS") {
            config.max_tokens = parse_var("MAX_TOKENS", &raw)?;
        }
        if let Some(raw) = var("TEMPERATURE") {
            config.temperature = parse_var("TEMPERATURE", &raw)?;
        }
        if let Some(raw) = var("TIMEOUT_SECS") {
            let secs: f64 = parse_var("TIMEOUT_SECS", &raw)?;
            config.timeout = Duration::try_from_secs_f64(secs).map_err(|_| {
                LlmError::configuration(format!(
                    "invalid value for {ENV_PREFIX}TIMEOUT_SECS: {raw:?}"
                ))
            })?;
        }

        config.validate()?;
        Ok(config)
    }

    /// Reject settings no endpoint would accept.
    pub fn validate(&self) -> Result<()> {
        if self.endpoint.trim().is_empty() {
            return Err(LlmError::configuration("endpoint must not be empty"));
        }
        if self.model.trim().is_empty() {
            return Err(LlmError::configuration("model must not be empty"));
        }
        if self.timeout.is_zero() {
            return Err(LlmError::configuration("timeout must be positive"));
        }
        if !(0.0..=2.0).contains(&self.temperature) {
            return Err(LlmError::configuration(format!(
                "temperature {} outside 0.0..=2.0",
                self.temperature
            )));
        }
        Ok(())
    }
}

fn parse_var<T: std::str::FromStr>(suffix: &str, raw: &str) -> Result<T> {
    raw.trim().parse().map_err(|_| {
        LlmError::configuration(format!("invalid value for {ENV_PREFIX}{suffix}: {raw:?}"))
    })
}

mod fractional_secs {
    use std::time::Duration;

    use serde::{Deserialize, Deserializer, Serializer, de::Error};

    pub fn serialize<S: Serializer>(timeout: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_f64(timeout.as_secs_f64())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Duration, D::Error> {
        let secs = f64::deserialize(deserializer)?;
        Duration::try_from_secs_f64(secs).map_err(D::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use pretty_assertions::assert_eq;

    use super::*;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |name| vars.get(name).cloned()
    }

    #[test]
    fn test_defaults_without_env() {
        let config = CompletionConfig::from_lookup(lookup(&[])).unwrap();
        assert_eq!(config, CompletionConfig::default());
        assert_eq!(config.timeout(), Duration::from_secs(120));
        assert_eq!(config.model, "phi4-mini");
    }

    #[test]
    fn test_env_overrides() {
        let config = CompletionConfig::from_lookup(lookup(&[
            ("SIMPLEFLOW_LLM_MODEL", "llama3"),
            ("SIMPLEFLOW_LLM_MAX_TOKENS", "2048"),
            ("SIMPLEFLOW_LLM_TEMPERATURE", "0.2"),
            ("SIMPLEFLOW_LLM_API_KEY", "secret"),
        ]))
        .unwrap();

        assert_eq!(config.model, "llama3");
        assert_eq!(config.max_tokens, 2048);
        assert_eq!(config.temperature, 0.2);
        assert_eq!(config.api_key.as_deref(), Some("secret"));
        assert_eq!(config.endpoint, CompletionConfig::default().endpoint);
    }

    #[test]
    fn test_invalid_env_value() {
        let err = CompletionConfig::from_lookup(lookup(&[("SIMPLEFLOW_LLM_TIMEOUT_SECS", "soon")]))
            .unwrap_err();
        assert_eq!(err.category(), "configuration");
        assert!(err.to_string().contains("SIMPLEFLOW_LLM_TIMEOUT_SECS"));
    }

    #[test]
    fn test_validate() {
        assert!(CompletionConfig::default().validate().is_ok());
        assert!(CompletionConfig::default().with_model(" ").validate().is_err());
        assert!(
            CompletionConfig::default()
                .with_temperature(3.5)
                .validate()
                .is_err()
        );
        assert!(
            CompletionConfig::default()
                .with_timeout(Duration::ZERO)
                .validate()
                .is_err()
        );
    }

    #[test]
    fn test_sub_second_timeout_is_kept() {
        let config = CompletionConfig::default().with_timeout(Duration::from_millis(500));
        assert!(config.validate().is_ok());
        assert_eq!(config.timeout(), Duration::from_millis(500));

        let config = CompletionConfig::default().with_timeout(Duration::from_millis(1500));
        let json = serde_json::to_value(&config).unwrap();
        assert_eq!(json["timeout_secs"], serde_json::json!(1.5));
        let back: CompletionConfig = serde_json::from_value(json).unwrap();
        assert_eq!(back.timeout(), Duration::from_millis(1500));
    }

    #[test]
    fn test_fractional_timeout_from_env() {
        let config =
            CompletionConfig::from_lookup(lookup(&[("SIMPLEFLOW_LLM_TIMEOUT_SECS", "2.5")]))
                .unwrap();
        assert_eq!(config.timeout(), Duration::from_millis(2500));

        let err = CompletionConfig::from_lookup(lookup(&[("SIMPLEFLOW_LLM_TIMEOUT_SECS", "-1")]))
            .unwrap_err();
        assert_eq!(err.category(), "configuration");
    }

    #[test]
    fn test_deserialize_partial() {
        let config: CompletionConfig =
            serde_json::from_str(r#"{"model": "mistral", "timeout_secs": 30}"#).unwrap();
        assert_eq!(config.model, "mistral");
        assert_eq!(config.timeout(), Duration::from_secs(30));
        assert_eq!(config.max_tokens, 1024);
    }
}
