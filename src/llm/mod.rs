//! LLM integration for fit-coach.
//!
//! A single backend is supported: any OpenAI-compatible chat-completions
//! endpoint, reached through reqwest. Callers depend on the `LlmProvider`
//! trait so tests can swap in a stub.

pub mod openai;
pub mod provider;
pub mod retry;

pub use openai::OpenAiProvider;
pub use provider::*;
pub use retry::RetryConfig;

use std::sync::Arc;
use std::time::Duration;

use crate::config::AppConfig;
use crate::error::LlmError;

/// Configuration for creating an LLM provider.
#[derive(Debug, Clone)]
pub struct LlmConfig {
    pub api_key: secrecy::SecretString,
    pub base_url: String,
    pub model: String,
    pub timeout: Duration,
}

impl LlmConfig {
    /// Extract provider settings from the app config.
    ///
    /// Returns `None` when no API key is set. That is not an error here;
    /// callers report it when a model call is actually needed.
    pub fn from_app(config: &AppConfig) -> Option<Self> {
        config.api_key.as_ref().map(|key| Self {
            api_key: key.clone(),
            base_url: config.base_url.clone(),
            model: config.model.clone(),
            timeout: config.request_timeout,
        })
    }
}

/// Create an LLM provider from configuration.
pub fn create_provider(config: &LlmConfig) -> Result<Arc<dyn LlmProvider>, LlmError> {
    let provider = OpenAiProvider::new(
        config.api_key.clone(),
        &config.base_url,
        &config.model,
        config.timeout,
    )?;
    tracing::info!(model = %config.model, base_url = %config.base_url, "Using OpenAI-compatible provider");
    Ok(Arc::new(provider))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn create_provider_with_any_key_constructs() {
        // Auth failures only surface once a request is made.
        let config = LlmConfig {
            api_key: secrecy::SecretString::from("test-key"),
            base_url: "https://api.openai.com/v1".to_string(),
            model: "gpt-3.5-turbo".to_string(),
            timeout: Duration::from_secs(30),
        };
        let provider = create_provider(&config).unwrap();
        assert_eq!(provider.model_name(), "gpt-3.5-turbo");
    }

    #[test]
    fn no_key_means_no_llm_config() {
        let app = AppConfig::default();
        assert!(LlmConfig::from_app(&app).is_none());

        let app = AppConfig {
            api_key: Some(secrecy::SecretString::from("sk-1")),
            model: "gpt-4o".to_string(),
            ..AppConfig::default()
        };
        let llm = LlmConfig::from_app(&app).unwrap();
        assert_eq!(llm.model, "gpt-4o");
    }
}
