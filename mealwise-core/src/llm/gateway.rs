use std::sync::Arc;

use super::{LlmError, LlmProvider};
use crate::prompts::{CREATE_PLAN_SYSTEM_PROMPT, EDIT_PLAN_SYSTEM_PROMPT};

/// Entry points the planner uses to talk to the model.
///
/// Returned text is untrusted: it goes through the sanitizer and the
/// recipe decoder before anything is persisted.
#[derive(Debug, Clone)]
pub struct RecipeGateway {
    provider: Arc<dyn LlmProvider>,
}

impl RecipeGateway {
    pub fn new(provider: Arc<dyn LlmProvider>) -> Self {
        Self { provider }
    }

    /// Generate recipes for a new (or rerun) plan.
    pub async fn generate_create(&self, prompt: &str) -> Result<String, LlmError> {
        self.provider
            .complete(&CREATE_PLAN_SYSTEM_PROMPT, prompt)
            .await
    }

    /// Generate a revised recipe list for an existing plan.
    pub async fn generate_edit(&self, prompt: &str) -> Result<String, LlmError> {
        self.provider.complete(&EDIT_PLAN_SYSTEM_PROMPT, prompt).await
    }

    pub fn provider(&self) -> &dyn LlmProvider {
        self.provider.as_ref()
    }
}
