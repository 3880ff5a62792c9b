//! Fake LLM provider for testing and offline development.
//!
//! Scripted responses are consumed first, in order. After the script runs
//! out, prompts are matched against registered substrings, then the default
//! response (if any) is returned.

use super::{LlmError, LlmProvider};
use async_trait::async_trait;
use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use tokio::sync::Mutex;

/// Canned recipe list used as the default response, so a server started with
/// the fake provider produces plans end to end.
const SAMPLE_RECIPES: &str = r#"[
  {
    "title": "Pantry Omelette",
    "description": "A quick omelette with whatever is on hand.",
    "servings": 1,
    "totalTimeMin": 10,
    "tags": ["quick"],
    "ingredients": [{"name": "Egg", "amount": "2"}],
    "steps": [
      {"order": 1, "text": "Whisk the eggs."},
      {"order": 2, "text": "Cook in a hot pan until set.", "durationMin": 3}
    ]
  }
]"#;

#[derive(Debug)]
pub struct FakeProvider {
    script: Mutex<VecDeque<Result<String, String>>>,
    /// prompt substring -> response
    responses: Vec<(String, String)>,
    default_response: Option<String>,
    calls: AtomicUsize,
    prompts: Mutex<Vec<String>>,
}

impl Default for FakeProvider {
    fn default() -> Self {
        Self::new().with_default_response(SAMPLE_RECIPES)
    }
}

impl FakeProvider {
    /// A provider with no responses at all; every call fails.
    pub fn new() -> Self {
        Self {
            script: Mutex::new(VecDeque::new()),
            responses: Vec::new(),
            default_response: None,
            calls: AtomicUsize::new(0),
            prompts: Mutex::new(Vec::new()),
        }
    }

    /// Responses returned one per call, in order. `Err` entries simulate
    /// provider failures with the given message.
    pub fn with_script(script: Vec<Result<String, String>>) -> Self {
        let provider = Self::new();
        Self {
            script: Mutex::new(script.into()),
            ..provider
        }
    }

    pub fn with_response(prompt_contains: &str, response: &str) -> Self {
        let mut provider = Self::new();
        provider.add_response(prompt_contains, response);
        provider
    }

    pub fn add_response(&mut self, prompt_contains: &str, response: &str) {
        self.responses
            .push((prompt_contains.to_lowercase(), response.to_string()));
    }

    pub fn with_default_response(mut self, response: &str) -> Self {
        self.default_response = Some(response.to_string());
        self
    }

    /// Number of `complete` calls made so far.
    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    /// User prompts received so far, oldest first.
    pub async fn prompts(&self) -> Vec<String> {
        self.prompts.lock().await.clone()
    }
}

#[async_trait]
impl LlmProvider for FakeProvider {
    async fn complete(&self, _system: &str, prompt: &str) -> Result<String, LlmError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.prompts.lock().await.push(prompt.to_string());

        if let Some(next) = self.script.lock().await.pop_front() {
            return next.map_err(LlmError::RequestFailed);
        }

        let prompt_lower = prompt.to_lowercase();
        if let Some((_, response)) = self
            .responses
            .iter()
            .find(|(pattern, _)| prompt_lower.contains(pattern))
        {
            return Ok(response.clone());
        }

        self.default_response.clone().ok_or_else(|| {
            LlmError::RequestFailed(format!(
                "FakeProvider: No response configured for prompt (first 100 chars): {}",
                prompt.chars().take(100).collect::<String>()
            ))
        })
    }

    fn provider_name(&self) -> &'static str {
        "fake"
    }

    fn model_name(&self) -> &str {
        "fake-model"
    }
}
