//! LLM provider abstraction for recipe generation.
//!
//! Providers are stateless text-in/text-out clients. The [`RecipeGateway`]
//! pairs a provider with the two fixed system instructions (create and edit)
//! and is handed to the orchestrator at construction time.

mod claude;
mod fake;
mod gateway;
mod gemini;

pub use claude::ClaudeProvider;
pub use fake::FakeProvider;
pub use gateway::RecipeGateway;
pub use gemini::GeminiProvider;

use async_trait::async_trait;
use std::fmt;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;

use crate::config::{LlmConfig, ProviderKind};

/// Error type for LLM operations.
#[derive(Debug, Error)]
pub enum LlmError {
    #[error("API request failed: {0}")]
    RequestFailed(String),

    #[error("API returned error: {status} - {message}")]
    ApiError { status: u16, message: String },

    #[error("Failed to parse response: {0}")]
    ParseError(String),

    #[error("Rate limited, retry after {retry_after_secs:?} seconds")]
    RateLimited { retry_after_secs: Option<u64> },

    #[error("Provider not configured: {0}")]
    NotConfigured(String),

    #[error("No response within {0:?}")]
    Timeout(Duration),
}

/// Trait for LLM providers.
///
/// Implementations must be thread-safe; the same provider serves every
/// generation loop in the process.
#[async_trait]
pub trait LlmProvider: Send + Sync + fmt::Debug {
    /// Send a system instruction and a user prompt, get the model's text back.
    async fn complete(&self, system: &str, prompt: &str) -> Result<String, LlmError>;

    /// Provider name (e.g., "gemini", "claude", "fake").
    fn provider_name(&self) -> &'static str;

    fn model_name(&self) -> &str;
}

/// Build the provider selected by [`LlmConfig`].
pub fn create_provider(config: &LlmConfig) -> Arc<dyn LlmProvider> {
    match config.provider {
        ProviderKind::Fake => Arc::new(FakeProvider::default()),
        ProviderKind::Gemini => Arc::new(GeminiProvider::new(
            config.api_key.clone(),
            config.model.clone(),
        )),
        ProviderKind::Claude => Arc::new(ClaudeProvider::new(
            config.api_key.clone(),
            config.model.clone(),
        )),
    }
}
