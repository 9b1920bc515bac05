//! Error types for fit-coach.

use std::time::Duration;

/// Configuration-related errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing required configuration: {key}. {hint}")]
    MissingRequired { key: String, hint: String },

    #[error("Invalid configuration value for {key}: {message}")]
    InvalidValue { key: String, message: String },
}

impl ConfigError {
    /// The error raised when the completion API credential is absent.
    pub fn missing_api_key() -> Self {
        Self::MissingRequired {
            key: "OPENAI_API_KEY".to_string(),
            hint: "Set it or enable DEVELOPMENT_MODE to serve the default routine".to_string(),
        }
    }
}

/// Database-related errors.
#[derive(Debug, thiserror::Error)]
pub enum DatabaseError {
    #[error("Connection pool error: {0}")]
    Pool(String),

    #[error("Query failed: {0}")]
    Query(String),

    #[error("Migration failed: {0}")]
    Migration(String),

    #[error("Serialization error: {0}")]
    Serialization(String),
}

/// LLM provider errors.
#[derive(Debug, thiserror::Error)]
pub enum LlmError {
    #[error("Provider {provider} is not configured: {reason}")]
    NotConfigured { provider: String, reason: String },

    #[error("Provider {provider} request failed: {reason}")]
    RequestFailed { provider: String, reason: String },

    #[error("Provider {provider} rate limited, retry after {retry_after:?}")]
    RateLimited {
        provider: String,
        retry_after: Option<Duration>,
    },

    #[error("Provider {provider} returned HTTP {status}: {body}")]
    HttpStatus {
        provider: String,
        status: u16,
        body: String,
    },

    #[error("Invalid response from {provider}: {reason}")]
    InvalidResponse { provider: String, reason: String },

    #[error("Provider {provider} returned an empty completion")]
    EmptyResponse { provider: String },
}

impl LlmError {
    /// Whether a retry has a chance of succeeding.
    ///
    /// Network failures, throttling and server-side errors are transient.
    /// Auth problems, bad payloads and empty completions are not.
    pub fn is_transient(&self) -> bool {
        match self {
            Self::RequestFailed { .. } | Self::RateLimited { .. } => true,
            Self::HttpStatus { status, .. } => *status >= 500,
            Self::NotConfigured { .. }
            | Self::InvalidResponse { .. }
            | Self::EmptyResponse { .. } => false,
        }
    }
}

/// Raised when a model document cannot be normalized at all.
#[derive(Debug, thiserror::Error)]
pub enum NormalizationError {
    #[error("Routine document is not a JSON object (got {found})")]
    NotAnObject { found: &'static str },

    #[error("Routine document has no plan and no tips")]
    Empty,

    #[error("Routine text is not valid JSON: {0}")]
    InvalidJson(#[from] serde_json::Error),
}

/// Errors from the routine generation and persistence flow.
#[derive(Debug, thiserror::Error)]
pub enum RoutineError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("No profile found for user {user_id}")]
    ProfileNotFound { user_id: String },

    #[error("Profile for user {user_id} is incomplete: missing {missing}")]
    ProfileIncomplete { user_id: String, missing: String },

    #[error("Invalid profile data: {0}")]
    InvalidProfile(String),

    #[error("Upstream generation failed: {0}")]
    Upstream(#[from] LlmError),

    #[error("Normalization failed: {0}")]
    Normalization(#[from] NormalizationError),

    #[error("Database error: {0}")]
    Database(#[from] DatabaseError),
}

/// Errors from the coach chat.
#[derive(Debug, thiserror::Error)]
pub enum ChatError {
    #[error("Message must not be empty")]
    EmptyMessage,

    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Coach reply failed: {0}")]
    Upstream(#[from] LlmError),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn transient_classification() {
        let net = LlmError::RequestFailed {
            provider: "openai".into(),
            reason: "connection reset".into(),
        };
        assert!(net.is_transient());

        let server = LlmError::HttpStatus {
            provider: "openai".into(),
            status: 503,
            body: String::new(),
        };
        assert!(server.is_transient());

        let auth = LlmError::HttpStatus {
            provider: "openai".into(),
            status: 401,
            body: "bad key".into(),
        };
        assert!(!auth.is_transient());

        let empty = LlmError::EmptyResponse {
            provider: "openai".into(),
        };
        assert!(!empty.is_transient());
    }

    #[test]
    fn missing_api_key_mentions_variable() {
        let err = ConfigError::missing_api_key();
        assert!(err.to_string().contains("OPENAI_API_KEY"));
    }
}
