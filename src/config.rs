//! Configuration types.
//!
//! Everything is read from environment variables once at startup. Lookups go
//! through a closure so tests can feed a map instead of mutating the process
//! environment.

use std::net::SocketAddr;
use std::path::PathBuf;
use std::time::Duration;

use secrecy::SecretString;

use crate::error::ConfigError;
use crate::llm::RetryConfig;

pub const DEFAULT_MODEL: &str = "gpt-3.5-turbo";
pub const DEFAULT_BASE_URL: &str = "https://api.openai.com/v1";
pub const DEFAULT_PORT: u16 = 8080;
pub const DEFAULT_DB_PATH: &str = "./data/fit-coach.db";

/// Service configuration.
#[derive(Debug, Clone)]
pub struct AppConfig {
    /// Serve the deterministic default routine instead of calling the model.
    pub development_mode: bool,
    /// Completion API credential. `None` is a configuration error at call time,
    /// not at startup, so development mode works without it.
    pub api_key: Option<SecretString>,
    pub model: String,
    pub base_url: String,
    /// Per-request timeout for the completion API.
    pub request_timeout: Duration,
    pub retry: RetryConfig,
    pub port: u16,
    pub db_path: PathBuf,
    /// Optional directory for a daily-rolling log file.
    pub log_dir: Option<PathBuf>,
    /// Comma-separated CORS origins, or `*` for any.
    pub cors_origins: String,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            development_mode: false,
            api_key: None,
            model: DEFAULT_MODEL.to_string(),
            base_url: DEFAULT_BASE_URL.to_string(),
            request_timeout: Duration::from_secs(60),
            retry: RetryConfig::default(),
            port: DEFAULT_PORT,
            db_path: PathBuf::from(DEFAULT_DB_PATH),
            log_dir: None,
            cors_origins: "*".to_string(),
        }
    }
}

impl AppConfig {
    /// Load configuration from the process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load configuration from an arbitrary key lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();
        let get = |key: &str| lookup(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());

        let development_mode = match get("DEVELOPMENT_MODE") {
            Some(v) => parse_bool("DEVELOPMENT_MODE", &v)?,
            None => false,
        };

        let api_key = get("OPENAI_API_KEY").map(SecretString::from);

        let port = match get("FIT_COACH_PORT") {
            Some(v) => parse_num::<u16>("FIT_COACH_PORT", &v)?,
            None => defaults.port,
        };

        let request_timeout = match get("FIT_COACH_LLM_TIMEOUT_SECS") {
            Some(v) => match parse_num::<u64>("FIT_COACH_LLM_TIMEOUT_SECS", &v)? {
                0 => {
                    return Err(ConfigError::InvalidValue {
                        key: "FIT_COACH_LLM_TIMEOUT_SECS".to_string(),
                        message: "must be at least 1 second".to_string(),
                    });
                }
                secs => Duration::from_secs(secs),
            },
            None => defaults.request_timeout,
        };

        let mut retry = RetryConfig::default();
        if let Some(v) = get("FIT_COACH_LLM_MAX_RETRIES") {
            retry.max_retries = parse_num::<u32>("FIT_COACH_LLM_MAX_RETRIES", &v)?;
        }

        Ok(Self {
            development_mode,
            api_key,
            model: get("OPENAI_MODEL").unwrap_or(defaults.model),
            base_url: get("OPENAI_BASE_URL")
                .map(|u| u.trim_end_matches('/').to_string())
                .unwrap_or(defaults.base_url),
            request_timeout,
            retry,
            port,
            db_path: get("FIT_COACH_DB_PATH")
                .map(PathBuf::from)
                .unwrap_or(defaults.db_path),
            log_dir: get("FIT_COACH_LOG_DIR").map(PathBuf::from),
            cors_origins: get("FIT_COACH_CORS_ORIGINS").unwrap_or(defaults.cors_origins),
        })
    }

    pub fn bind_addr(&self) -> SocketAddr {
        SocketAddr::from(([0, 0, 0, 0], self.port))
    }
}

fn parse_bool(key: &str, value: &str) -> Result<bool, ConfigError> {
    match value.to_ascii_lowercase().as_str() {
        "true" | "1" | "yes" | "on" => Ok(true),
        "false" | "0" | "no" | "off" => Ok(false),
        other => Err(ConfigError::InvalidValue {
            key: key.to_string(),
            message: format!("expected a boolean, got '{other}'"),
        }),
    }
}

fn parse_num<T: std::str::FromStr>(key: &str, value: &str) -> Result<T, ConfigError>
where
    T::Err: std::fmt::Display,
{
    value.parse::<T>().map_err(|e| ConfigError::InvalidValue {
        key: key.to_string(),
        message: format!("'{value}': {e}"),
    })
}
