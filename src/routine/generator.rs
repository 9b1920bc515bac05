//! Routine generation: prompt in, normalized routine out.
//!
//! Wraps the LLM provider with JSON mode, bounded retries and the fallback
//! routine. Persistence lives in the orchestrator.

use std::sync::Arc;

use serde::Serialize;
use tracing::{debug, info, warn};

use crate::error::{ConfigError, LlmError, NormalizationError, RoutineError};
use crate::llm::provider::{ChatMessage, CompletionRequest, LlmProvider};
use crate::llm::retry::{RetryConfig, with_retry};

use super::fallback::fallback_routine;
use super::model::{GeneratedRoutine, RoutineRequest};
use super::normalize::normalize_text;
use super::prompt::{ROUTINE_SYSTEM_PROMPT, build_routine_prompt};

/// Sampling temperature for routine generation.
pub const ROUTINE_TEMPERATURE: f32 = 0.7;

/// Where a routine came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum RoutineSource {
    /// Development mode: the model was never called.
    Development,
    Model,
    /// The model call or normalization failed.
    Fallback,
}

impl RoutineSource {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Development => "development",
            Self::Model => "model",
            Self::Fallback => "fallback",
        }
    }
}

#[derive(Debug, Clone)]
pub struct GenerationOutcome {
    pub routine: GeneratedRoutine,
    pub source: RoutineSource,
}

impl GenerationOutcome {
    fn fallback(request: &RoutineRequest, source: RoutineSource) -> Self {
        Self {
            routine: fallback_routine(request),
            source,
        }
    }
}

/// Generates routines through an optional LLM provider.
///
/// `llm` is `None` when no API key is configured.
pub struct RoutineGenerator {
    llm: Option<Arc<dyn LlmProvider>>,
    development_mode: bool,
    retry: RetryConfig,
}

impl RoutineGenerator {
    pub fn new(
        llm: Option<Arc<dyn LlmProvider>>,
        development_mode: bool,
        retry: RetryConfig,
    ) -> Self {
        Self {
            llm,
            development_mode,
            retry,
        }
    }

    /// Send a routine prompt in JSON mode and return the raw completion text.
    pub async fn request_routine(&self, prompt: &str) -> Result<String, LlmError> {
        let llm = self.llm.as_ref().ok_or_else(|| LlmError::NotConfigured {
            provider: "openai".to_string(),
            reason: "OPENAI_API_KEY is not set".to_string(),
        })?;

        let response = with_retry(&self.retry, "routine_generation", || {
            let request = CompletionRequest::new(vec![
                ChatMessage::system(ROUTINE_SYSTEM_PROMPT),
                ChatMessage::user(prompt),
            ])
            .with_temperature(ROUTINE_TEMPERATURE)
            .with_json_output();
            llm.complete(request)
        })
        .await?;

        if response.content.trim().is_empty() {
            return Err(LlmError::EmptyResponse {
                provider: llm.model_name().to_string(),
            });
        }

        debug!(
            model = llm.model_name(),
            input_tokens = response.input_tokens,
            output_tokens = response.output_tokens,
            "Routine completion received"
        );
        Ok(response.content)
    }

    /// Call the model and normalize its answer. No fallback.
    pub async fn generate_from_model(
        &self,
        request: &RoutineRequest,
    ) -> Result<GeneratedRoutine, RoutineError> {
        let prompt = build_routine_prompt(request);
        let text = self.request_routine(&prompt).await?;
        let routine = normalize_text(&text)?;
        if routine.is_empty() {
            return Err(NormalizationError::Empty.into());
        }
        Ok(routine)
    }

    /// Generate a routine, falling back on upstream or normalization failure.
    ///
    /// Fails only with [`RoutineError::Config`] when the model is needed but
    /// no API key is configured.
    pub async fn generate(
        &self,
        request: &RoutineRequest,
    ) -> Result<GenerationOutcome, RoutineError> {
        if self.development_mode {
            info!("Development mode, serving default routine");
            return Ok(GenerationOutcome::fallback(request, RoutineSource::Development));
        }
        if self.llm.is_none() {
            return Err(ConfigError::missing_api_key().into());
        }

        match self.generate_from_model(request).await {
            Ok(routine) => {
                info!(days = routine.weekly_plan.len(), "Routine generated by model");
                Ok(GenerationOutcome {
                    routine,
                    source: RoutineSource::Model,
                })
            }
            Err(e) => {
                warn!(error = %e, "Routine generation failed, using fallback");
                Ok(GenerationOutcome::fallback(request, RoutineSource::Fallback))
            }
        }
    }

    /// Like [`generate`](Self::generate), but a missing API key also falls back.
    pub async fn generate_with_fallback(&self, request: &RoutineRequest) -> GenerationOutcome {
        match self.generate(request).await {
            Ok(outcome) => outcome,
            Err(e) => {
                warn!(error = %e, "Routine generation unavailable, using fallback");
                GenerationOutcome::fallback(request, RoutineSource::Fallback)
            }
        }
    }
}
