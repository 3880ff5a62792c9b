//! The bounded-retry generation loop.
//!
//! One invocation makes at most `max_attempts` gateway calls, strictly in
//! sequence, and writes exactly one generation log entry per call. Terminal
//! writes are conditional on the plan still waiting on this job's
//! generation id, so a superseded loop never overwrites a newer one.

use std::time::Duration;

use uuid::Uuid;

use super::decode::{decode_recipes, GeneratedRecipe};
use super::sanitize::strip_code_fences;
use super::store::PlanStore;
use crate::error::DecodeError;
use crate::llm::{LlmError, RecipeGateway};
use crate::prompts::{CREATE_PLAN_TASK, EDIT_PLAN_TASK};
use crate::types::{NewGenerationLogEntry, NewRecipe};

const SUPERSEDED_MESSAGE: &str = "Generation superseded by a newer request";

/// Which gateway entry point a job uses.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GenerationKind {
    Create,
    Edit,
}

impl GenerationKind {
    pub fn task_name(&self) -> &'static str {
        match self {
            GenerationKind::Create => CREATE_PLAN_TASK,
            GenerationKind::Edit => EDIT_PLAN_TASK,
        }
    }
}

/// Everything a loop needs, captured when it is scheduled.
#[derive(Debug, Clone)]
pub struct GenerationJob {
    pub generation_id: Uuid,
    pub owner_id: Uuid,
    pub plan_id: Uuid,
    pub party_size: i32,
    pub kind: GenerationKind,
    /// Rendered from slimmed inputs; sent verbatim on every attempt.
    pub prompt: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GenerationOutcome {
    /// Recipes were committed and the plan is `success`.
    Succeeded { attempts: u32 },
    /// Every attempt failed; the plan was forced to `fail`.
    Exhausted { attempts: u32 },
    /// Recipes validated but the commit failed; the plan was forced to `fail`.
    PersistFailed { attempts: u32 },
    /// A newer generation owns the plan; this result was discarded.
    Superseded { attempts: u32 },
}

#[derive(Debug)]
enum AttemptFailure {
    Gateway(LlmError),
    Decode { raw: String, error: DecodeError },
}

impl AttemptFailure {
    fn raw_response(&self) -> &str {
        match self {
            AttemptFailure::Gateway(_) => "",
            AttemptFailure::Decode { raw, .. } => raw,
        }
    }

    fn message(&self) -> String {
        match self {
            AttemptFailure::Gateway(e) => e.to_string(),
            AttemptFailure::Decode { error, .. } => error.to_string(),
        }
    }
}

async fn attempt(
    gateway: &RecipeGateway,
    job: &GenerationJob,
    call_timeout: Duration,
) -> Result<(String, Vec<GeneratedRecipe>), AttemptFailure> {
    let call = async {
        match job.kind {
            GenerationKind::Create => gateway.generate_create(&job.prompt).await,
            GenerationKind::Edit => gateway.generate_edit(&job.prompt).await,
        }
    };
    let raw = tokio::time::timeout(call_timeout, call)
        .await
        .unwrap_or(Err(LlmError::Timeout(call_timeout)))
        .map_err(AttemptFailure::Gateway)?;

    match decode_recipes(strip_code_fences(&raw)) {
        Ok(recipes) => Ok((raw, recipes)),
        Err(error) => Err(AttemptFailure::Decode { raw, error }),
    }
}

/// Run the generation loop to completion.
///
/// Never returns an error: every failure ends up in the generation log and
/// the plan's terminal status. A gateway call that outlives `call_timeout`
/// is abandoned and counts as a failed attempt.
pub async fn run_generation(
    store: &dyn PlanStore,
    gateway: &RecipeGateway,
    job: &GenerationJob,
    max_attempts: u32,
    call_timeout: Duration,
) -> GenerationOutcome {
    let max_attempts = max_attempts.max(1);

    for attempt_no in 1..=max_attempts {
        tracing::info!(
            plan_id = %job.plan_id,
            generation_id = %job.generation_id,
            attempt = attempt_no,
            task = job.kind.task_name(),
            provider = gateway.provider().provider_name(),
            model = gateway.provider().model_name(),
            "Requesting recipes"
        );

        let (raw, recipes) = match attempt(gateway, job, call_timeout).await {
            Ok(result) => result,
            Err(failure) => {
                tracing::warn!(
                    plan_id = %job.plan_id,
                    attempt = attempt_no,
                    "Generation attempt failed: {}",
                    failure.message()
                );
                write_log(
                    store,
                    job,
                    attempt_no,
                    failure.raw_response(),
                    &failure.message(),
                )
                .await;
                continue;
            }
        };

        let new_recipes: Vec<NewRecipe> = recipes
            .into_iter()
            .map(|r| r.into_new_recipe(job.owner_id, job.plan_id, job.party_size))
            .collect();
        let count = new_recipes.len();

        return match store
            .commit_generation(job.plan_id, job.generation_id, new_recipes)
            .await
        {
            Ok(true) => {
                write_log(store, job, attempt_no, &raw, "").await;
                tracing::info!(
                    plan_id = %job.plan_id,
                    attempt = attempt_no,
                    "Plan generated with {} recipes",
                    count
                );
                GenerationOutcome::Succeeded {
                    attempts: attempt_no,
                }
            }
            Ok(false) => {
                write_log(store, job, attempt_no, &raw, SUPERSEDED_MESSAGE).await;
                tracing::info!(
                    plan_id = %job.plan_id,
                    generation_id = %job.generation_id,
                    "Discarding result of superseded generation"
                );
                GenerationOutcome::Superseded {
                    attempts: attempt_no,
                }
            }
            Err(e) => {
                tracing::error!(plan_id = %job.plan_id, "Failed to persist recipes: {}", e);
                write_log(
                    store,
                    job,
                    attempt_no,
                    &raw,
                    &format!("Failed to persist recipes: {}", e),
                )
                .await;
                force_fail(store, job).await;
                GenerationOutcome::PersistFailed {
                    attempts: attempt_no,
                }
            }
        };
    }

    tracing::warn!(
        plan_id = %job.plan_id,
        "Generation exhausted {} attempts",
        max_attempts
    );
    force_fail(store, job).await;
    GenerationOutcome::Exhausted {
        attempts: max_attempts,
    }
}

async fn write_log(
    store: &dyn PlanStore,
    job: &GenerationJob,
    attempt: u32,
    llm_response: &str,
    error_message: &str,
) {
    let entry = NewGenerationLogEntry {
        owner_id: job.owner_id,
        plan_id: job.plan_id,
        task_name: job.kind.task_name().to_string(),
        attempt: i32::try_from(attempt).unwrap_or(i32::MAX),
        user_prompt: job.prompt.clone(),
        llm_response: llm_response.to_string(),
        error_message: error_message.to_string(),
    };

    if let Err(e) = store.append_generation_log(entry).await {
        tracing::warn!(plan_id = %job.plan_id, "Failed to write generation log: {}", e);
    }
}

async fn force_fail(store: &dyn PlanStore, job: &GenerationJob) {
    match store.fail_generation(job.plan_id, job.generation_id).await {
        Ok(true) => {}
        Ok(false) => tracing::info!(
            plan_id = %job.plan_id,
            generation_id = %job.generation_id,
            "Plan no longer waiting on this generation, leaving status alone"
        ),
        Err(e) => tracing::error!(plan_id = %job.plan_id, "Failed to mark plan as failed: {}", e),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::llm::FakeProvider;
    use crate::planning::MemoryStore;
    use crate::types::{MealType, NewPlan, PlanStatus};
    use std::sync::Arc;

    const TIMEOUT: Duration = Duration::from_secs(5);

    const GOOD: &str =
        r#"[{"title":"X","ingredients":[{"name":"Egg"}],"steps":[{"order":1,"text":"Boil"}]}]"#;

    async fn setup(store: &MemoryStore) -> GenerationJob {
        let owner_id = Uuid::new_v4();
        let generation_id = Uuid::new_v4();
        let plan = store
            .create_plan(NewPlan {
                owner_id,
                title: "Lunch".to_string(),
                tags: vec![],
                prompt: None,
                meal_type: MealType::Lunch,
                party_size: 3,
                time_budget_minutes: 45,
                generation_id,
            })
            .await
            .unwrap();

        GenerationJob {
            generation_id,
            owner_id,
            plan_id: plan.id,
            party_size: plan.party_size,
            kind: GenerationKind::Create,
            prompt: "make lunch".to_string(),
        }
    }

    fn gateway(provider: FakeProvider) -> (Arc<FakeProvider>, RecipeGateway) {
        let provider = Arc::new(provider);
        (provider.clone(), RecipeGateway::new(provider))
    }

    #[tokio::test]
    async fn test_retries_until_valid_output() {
        let store = MemoryStore::new();
        let job = setup(&store).await;
        let (provider, gateway) = gateway(FakeProvider::with_script(vec![
            Err("connection reset".to_string()),
            Ok("not json".to_string()),
            Ok(GOOD.to_string()),
        ]));

        let outcome = run_generation(&store, &gateway, &job, 3, TIMEOUT).await;

        assert_eq!(outcome, GenerationOutcome::Succeeded { attempts: 3 });
        assert_eq!(provider.call_count(), 3);

        let logs = store.generation_logs(job.plan_id).await;
        assert_eq!(logs.len(), 3);
        assert!(!logs[0].is_success());
        assert_eq!(logs[0].llm_response, "");
        assert_eq!(logs[1].llm_response, "not json");
        assert!(logs[2].is_success());
        assert_eq!(
            logs.iter().map(|l| l.attempt).collect::<Vec<_>>(),
            vec![1, 2, 3]
        );

        let plan = store.get_plan(job.plan_id).await.unwrap().unwrap();
        assert_eq!(plan.status, PlanStatus::Success);
        let recipes = store.list_plan_recipes(job.plan_id).await.unwrap();
        assert_eq!(recipes.len(), 1);
        assert_eq!(recipes[0].servings, 3);
    }

    #[tokio::test]
    async fn test_overlong_title_is_retried_not_persisted() {
        let store = MemoryStore::new();
        let job = setup(&store).await;
        let long = serde_json::json!([{
            "title": "t".repeat(300),
            "ingredients": [],
            "steps": [{"order": 1, "text": "Plate"}]
        }])
        .to_string();
        let (provider, gateway) =
            gateway(FakeProvider::with_script(vec![Ok(long), Ok(GOOD.to_string())]));

        let outcome = run_generation(&store, &gateway, &job, 3, TIMEOUT).await;

        assert_eq!(outcome, GenerationOutcome::Succeeded { attempts: 2 });
        assert_eq!(provider.call_count(), 2);
        let logs = store.generation_logs(job.plan_id).await;
        assert!(logs[0].error_message.contains("longer than"));
        let recipes = store.list_plan_recipes(job.plan_id).await.unwrap();
        assert_eq!(recipes[0].title, "X");
    }

    #[tokio::test]
    async fn test_respects_attempt_limit() {
        let store = MemoryStore::new();
        let job = setup(&store).await;
        let (provider, gateway) =
            gateway(FakeProvider::new().with_default_response("[]"));

        let outcome = run_generation(&store, &gateway, &job, 2, TIMEOUT).await;

        assert_eq!(outcome, GenerationOutcome::Exhausted { attempts: 2 });
        assert_eq!(provider.call_count(), 2);
        assert_eq!(store.generation_logs(job.plan_id).await.len(), 2);
        let plan = store.get_plan(job.plan_id).await.unwrap().unwrap();
        assert_eq!(plan.status, PlanStatus::Fail);
    }

    #[tokio::test]
    async fn test_stale_generation_is_discarded() {
        let store = MemoryStore::new();
        let mut job = setup(&store).await;
        job.generation_id = Uuid::new_v4();
        let (_, gateway) = gateway(FakeProvider::with_script(vec![Ok(GOOD.to_string())]));

        let outcome = run_generation(&store, &gateway, &job, 3, TIMEOUT).await;

        assert_eq!(outcome, GenerationOutcome::Superseded { attempts: 1 });
        let plan = store.get_plan(job.plan_id).await.unwrap().unwrap();
        assert_eq!(plan.status, PlanStatus::Waiting);
        assert!(store.list_plan_recipes(job.plan_id).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_edit_kind_logs_edit_task() {
        let store = MemoryStore::new();
        let mut job = setup(&store).await;
        job.kind = GenerationKind::Edit;
        let (_, gateway) = gateway(FakeProvider::with_script(vec![Ok(GOOD.to_string())]));

        run_generation(&store, &gateway, &job, 1, TIMEOUT).await;

        let logs = store.generation_logs(job.plan_id).await;
        assert_eq!(logs[0].task_name, EDIT_PLAN_TASK);
    }

    /// Never answers.
    #[derive(Debug)]
    struct StalledProvider;

    #[async_trait::async_trait]
    impl crate::llm::LlmProvider for StalledProvider {
        async fn complete(&self, _system: &str, _prompt: &str) -> Result<String, LlmError> {
            std::future::pending().await
        }

        fn provider_name(&self) -> &'static str {
            "stalled"
        }

        fn model_name(&self) -> &str {
            "stalled"
        }
    }

    #[tokio::test]
    async fn test_stalled_calls_time_out_and_fail_the_plan() {
        let store = MemoryStore::new();
        let job = setup(&store).await;
        let gateway = RecipeGateway::new(Arc::new(StalledProvider));

        let outcome = tokio::time::timeout(
            Duration::from_secs(5),
            run_generation(&store, &gateway, &job, 2, Duration::from_millis(20)),
        )
        .await
        .expect("loop must end once every call has timed out");

        assert_eq!(outcome, GenerationOutcome::Exhausted { attempts: 2 });
        let logs = store.generation_logs(job.plan_id).await;
        assert_eq!(logs.len(), 2);
        assert!(logs.iter().all(|l| l.error_message.contains("No response within")));
        let plan = store.get_plan(job.plan_id).await.unwrap().unwrap();
        assert_eq!(plan.status, PlanStatus::Fail);
    }
}
