//! Configuration from environment variables.

use std::env;
use std::time::Duration;
use thiserror::Error;

/// Default number of LLM attempts per generation.
pub const DEFAULT_GENERATION_ATTEMPTS: u32 = 3;

/// Default limit on a single LLM call, in seconds.
pub const DEFAULT_LLM_TIMEOUT_SECS: u64 = 120;

pub const DEFAULT_GEMINI_MODEL: &str = "gemini-2.5-flash";
pub const DEFAULT_CLAUDE_MODEL: &str = "claude-3-5-sonnet-20241022";

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Missing required environment variable: {0}")]
    MissingEnvVar(String),

    #[error("Invalid value for {name}: {value}")]
    InvalidValue { name: String, value: String },
}

/// Which LLM backend generates recipes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProviderKind {
    Gemini,
    Claude,
    Fake,
}

/// LLM provider configuration.
#[derive(Debug, Clone)]
pub struct LlmConfig {
    pub provider: ProviderKind,
    pub model: String,
    /// Empty for the fake provider.
    pub api_key: String,
}

impl LlmConfig {
    /// Load configuration from environment variables.
    ///
    /// - `MEALWISE_LLM_PROVIDER`: "gemini" | "claude" | "fake" (default: "fake")
    /// - `MEALWISE_LLM_MODEL`: model name (default depends on provider)
    /// - `GEMINI_API_KEY`: required for gemini
    /// - `ANTHROPIC_API_KEY`: required for claude
    pub fn from_env() -> Result<Self, ConfigError> {
        let provider = env::var("MEALWISE_LLM_PROVIDER").unwrap_or_else(|_| "fake".to_string());
        let model = env::var("MEALWISE_LLM_MODEL").ok();

        match provider.as_str() {
            "fake" => Ok(Self {
                provider: ProviderKind::Fake,
                model: model.unwrap_or_else(|| "fake-model".to_string()),
                api_key: String::new(),
            }),
            "gemini" => Ok(Self {
                provider: ProviderKind::Gemini,
                model: model.unwrap_or_else(|| DEFAULT_GEMINI_MODEL.to_string()),
                api_key: required("GEMINI_API_KEY")?,
            }),
            "claude" => Ok(Self {
                provider: ProviderKind::Claude,
                model: model.unwrap_or_else(|| DEFAULT_CLAUDE_MODEL.to_string()),
                api_key: required("ANTHROPIC_API_KEY")?,
            }),
            other => Err(ConfigError::InvalidValue {
                name: "MEALWISE_LLM_PROVIDER".to_string(),
                value: other.to_string(),
            }),
        }
    }
}

/// Orchestrator tuning.
#[derive(Debug, Clone)]
pub struct PlannerConfig {
    /// Upper bound on LLM calls per generation. Always at least 1.
    pub max_attempts: u32,
    /// A call still running after this long counts as a failed attempt.
    pub call_timeout: Duration,
}

impl Default for PlannerConfig {
    fn default() -> Self {
        Self {
            max_attempts: DEFAULT_GENERATION_ATTEMPTS,
            call_timeout: Duration::from_secs(DEFAULT_LLM_TIMEOUT_SECS),
        }
    }
}

impl PlannerConfig {
    /// Reads `MEALWISE_GENERATION_ATTEMPTS` (default: 3) and
    /// `MEALWISE_LLM_TIMEOUT_SECS` (default: 120).
    pub fn from_env() -> Result<Self, ConfigError> {
        let mut config = Self::default();
        if let Ok(raw) = env::var("MEALWISE_GENERATION_ATTEMPTS") {
            config.max_attempts = positive("MEALWISE_GENERATION_ATTEMPTS", &raw)?;
        }
        if let Ok(raw) = env::var("MEALWISE_LLM_TIMEOUT_SECS") {
            config.call_timeout =
                Duration::from_secs(positive("MEALWISE_LLM_TIMEOUT_SECS", &raw)?.into());
        }
        Ok(config)
    }
}

fn positive(name: &str, raw: &str) -> Result<u32, ConfigError> {
    match raw.trim().parse::<u32>() {
        Ok(n) if n >= 1 => Ok(n),
        _ => Err(ConfigError::InvalidValue {
            name: name.to_string(),
            value: raw.to_string(),
        }),
    }
}

fn required(name: &str) -> Result<String, ConfigError> {
    env::var(name).map_err(|_| ConfigError::MissingEnvVar(name.to_string()))
}
