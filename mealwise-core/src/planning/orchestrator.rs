//! Plan orchestration: request validation, inventory gating, status
//! transitions and scheduling of background generation loops.

use std::collections::HashMap;
use std::sync::Arc;

use chrono::Utc;
use serde::Serialize;
use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use uuid::Uuid;

use super::generation::{run_generation, GenerationJob, GenerationKind, GenerationOutcome};
use super::inventory::{check_inventory, InventorySnapshot, NotReady, Readiness};
use super::slim::{build_create_prompt, build_edit_prompt};
use super::store::{InventoryStore, PlanStore};
use crate::config::PlannerConfig;
use crate::error::PlanningError;
use crate::llm::RecipeGateway;
use crate::types::{MealType, NewPlan, Owner, Plan, PlanStatus, PromptFrequency, Recipe};

pub const MAX_TITLE_LENGTH: usize = 200;
pub const MAX_PROMPT_LENGTH: usize = 500;
pub const PARTY_SIZE_RANGE: std::ops::RangeInclusive<i32> = 1..=10;
pub const TIME_BUDGET_RANGE: std::ops::RangeInclusive<i32> = 1..=600;

/// A planning request as submitted by a user, before validation.
#[derive(Debug, Clone)]
pub struct PlanRequest {
    pub title: String,
    pub tags: Vec<String>,
    pub prompt: Option<String>,
    /// Display name, e.g. "High Tea".
    pub meal_type: String,
    pub party_size: i32,
    pub time_budget_minutes: i32,
}

impl PlanRequest {
    fn into_new_plan(self, owner_id: Uuid, generation_id: Uuid) -> Result<NewPlan, PlanningError> {
        let title = self.title.trim().to_string();
        if title.is_empty() {
            return Err(PlanningError::InvalidRequest(
                "Title is required".to_string(),
            ));
        }
        if title.chars().count() > MAX_TITLE_LENGTH {
            return Err(PlanningError::InvalidRequest(format!(
                "Title must be at most {} characters",
                MAX_TITLE_LENGTH
            )));
        }

        let meal_type = MealType::parse(&self.meal_type).ok_or_else(|| {
            PlanningError::InvalidRequest(format!(
                "Invalid meal type '{}', expected one of: {}",
                self.meal_type,
                MealType::ALL.map(|m| m.as_str()).join(", ")
            ))
        })?;

        if !PARTY_SIZE_RANGE.contains(&self.party_size) {
            return Err(PlanningError::InvalidRequest(format!(
                "Party size must be between {} and {}",
                PARTY_SIZE_RANGE.start(),
                PARTY_SIZE_RANGE.end()
            )));
        }
        if !TIME_BUDGET_RANGE.contains(&self.time_budget_minutes) {
            return Err(PlanningError::InvalidRequest(format!(
                "Time budget must be between {} and {} minutes",
                TIME_BUDGET_RANGE.start(),
                TIME_BUDGET_RANGE.end()
            )));
        }

        let prompt = self
            .prompt
            .map(|p| p.trim().to_string())
            .filter(|p| !p.is_empty());
        if prompt
            .as_ref()
            .is_some_and(|p| p.chars().count() > MAX_PROMPT_LENGTH)
        {
            return Err(PlanningError::InvalidRequest(format!(
                "Prompt must be at most {} characters",
                MAX_PROMPT_LENGTH
            )));
        }

        let tags = self
            .tags
            .into_iter()
            .map(|t| t.trim().to_string())
            .filter(|t| !t.is_empty())
            .collect();

        Ok(NewPlan {
            owner_id,
            title,
            tags,
            prompt,
            meal_type,
            party_size: self.party_size,
            time_budget_minutes: self.time_budget_minutes,
            generation_id,
        })
    }
}

/// Result of an operation gated on the owner's inventory.
#[derive(Debug, Clone)]
pub enum PlanOutcome {
    /// The plan is `waiting` and a generation loop has been scheduled.
    Scheduled(Plan),
    /// Inventory is insufficient; nothing was written.
    NotReady(NotReady),
}

#[derive(Debug, Clone, Serialize)]
pub struct PlanDetail {
    pub plan: Plan,
    pub recipes: Vec<Recipe>,
}

struct RunningGeneration {
    generation_id: Uuid,
    handle: JoinHandle<GenerationOutcome>,
}

type RunningMap = Arc<Mutex<HashMap<Uuid, RunningGeneration>>>;

/// Coordinates plan lifecycles. Cheap to share behind an `Arc`.
pub struct PlanOrchestrator {
    plans: Arc<dyn PlanStore>,
    inventory: Arc<dyn InventoryStore>,
    gateway: RecipeGateway,
    config: PlannerConfig,
    running: RunningMap,
}

impl PlanOrchestrator {
    pub fn new(
        plans: Arc<dyn PlanStore>,
        inventory: Arc<dyn InventoryStore>,
        gateway: RecipeGateway,
        config: PlannerConfig,
    ) -> Self {
        Self {
            plans,
            inventory,
            gateway,
            config,
            running: Arc::new(Mutex::new(HashMap::new())),
        }
    }

    /// Validate a request, gate it on inventory, create the plan and
    /// schedule generation. Returns as soon as the plan is stored.
    pub async fn submit(
        &self,
        owner: &Owner,
        request: PlanRequest,
    ) -> Result<PlanOutcome, PlanningError> {
        let generation_id = Uuid::new_v4();
        let new_plan = request.into_new_plan(owner.id, generation_id)?;

        let snapshot = match check_inventory(self.inventory.as_ref(), owner.id, Utc::now()).await? {
            Readiness::Ready(snapshot) => snapshot,
            Readiness::NotReady(not_ready) => {
                tracing::info!(owner_id = %owner.id, "Plan not created: {}", not_ready.message);
                return Ok(PlanOutcome::NotReady(not_ready));
            }
        };

        let plan = self.plans.create_plan(new_plan).await?;
        tracing::info!(plan_id = %plan.id, owner_id = %owner.id, "Created plan");

        self.schedule_create(owner, &plan, generation_id, &snapshot)
            .await;
        Ok(PlanOutcome::Scheduled(plan))
    }

    /// Re-run generation for a failed plan with a fresh inventory snapshot.
    pub async fn rerun(&self, owner: &Owner, plan_id: Uuid) -> Result<PlanOutcome, PlanningError> {
        let plan = self.load_owned(owner.id, plan_id).await?;
        if plan.status != PlanStatus::Fail {
            return Err(PlanningError::Conflict(format!(
                "Only failed plans can be rerun (plan is {})",
                plan.status.as_str()
            )));
        }

        let snapshot = match check_inventory(self.inventory.as_ref(), owner.id, Utc::now()).await? {
            Readiness::Ready(snapshot) => snapshot,
            Readiness::NotReady(not_ready) => return Ok(PlanOutcome::NotReady(not_ready)),
        };

        let generation_id = Uuid::new_v4();
        let plan = self
            .plans
            .transition_plan(
                plan_id,
                &[PlanStatus::Fail],
                PlanStatus::Waiting,
                Some(generation_id),
            )
            .await?
            .ok_or_else(|| PlanningError::Conflict("Plan changed state, try again".to_string()))?;
        tracing::info!(plan_id = %plan.id, "Rerunning plan");

        self.schedule_create(owner, &plan, generation_id, &snapshot)
            .await;
        Ok(PlanOutcome::Scheduled(plan))
    }

    /// Regenerate a successful plan's recipes following a free-text
    /// instruction. The previous recipes stay until the edit succeeds.
    pub async fn edit_plan(
        &self,
        owner: &Owner,
        plan_id: Uuid,
        instruction: &str,
    ) -> Result<Plan, PlanningError> {
        let instruction = instruction.trim();
        if instruction.is_empty() {
            return Err(PlanningError::InvalidRequest(
                "Edit instruction is required".to_string(),
            ));
        }
        if instruction.chars().count() > MAX_PROMPT_LENGTH {
            return Err(PlanningError::InvalidRequest(format!(
                "Edit instruction must be at most {} characters",
                MAX_PROMPT_LENGTH
            )));
        }

        let plan = self.load_owned(owner.id, plan_id).await?;
        if plan.status != PlanStatus::Success {
            return Err(PlanningError::Conflict(format!(
                "Only successful plans can be edited (plan is {})",
                plan.status.as_str()
            )));
        }

        let recipes = self.plans.list_plan_recipes(plan_id).await?;
        let generation_id = Uuid::new_v4();
        let plan = self
            .plans
            .transition_plan(
                plan_id,
                &[PlanStatus::Success],
                PlanStatus::Waiting,
                Some(generation_id),
            )
            .await?
            .ok_or_else(|| PlanningError::Conflict("Plan changed state, try again".to_string()))?;
        tracing::info!(plan_id = %plan.id, "Editing plan");

        let job = GenerationJob {
            generation_id,
            owner_id: owner.id,
            plan_id: plan.id,
            party_size: plan.party_size,
            kind: GenerationKind::Edit,
            prompt: build_edit_prompt(&recipes, instruction),
        };
        self.schedule(job).await;
        Ok(plan)
    }

    /// Archive a finished plan.
    pub async fn close_plan(&self, owner: &Owner, plan_id: Uuid) -> Result<Plan, PlanningError> {
        const CLOSABLE: [PlanStatus; 2] = [PlanStatus::Success, PlanStatus::Fail];

        let plan = self.load_owned(owner.id, plan_id).await?;
        if !CLOSABLE.contains(&plan.status) {
            return Err(PlanningError::Conflict(format!(
                "Only finished plans can be closed (plan is {})",
                plan.status.as_str()
            )));
        }

        self.plans
            .transition_plan(plan_id, &CLOSABLE, PlanStatus::Closed, None)
            .await?
            .ok_or_else(|| PlanningError::Conflict("Plan changed state, try again".to_string()))
    }

    /// Delete a plan and all of its recipes. Returns the number of recipes
    /// removed.
    pub async fn delete_plan(&self, owner: &Owner, plan_id: Uuid) -> Result<usize, PlanningError> {
        let plan = self.load_owned(owner.id, plan_id).await?;
        if plan.status == PlanStatus::Waiting {
            return Err(PlanningError::Conflict(
                "Cannot delete a plan while it is generating".to_string(),
            ));
        }

        let removed = self.plans.delete_plan(plan_id).await?.ok_or_else(|| {
            PlanningError::Conflict("Cannot delete a plan while it is generating".to_string())
        })?;
        tracing::info!(plan_id = %plan_id, "Deleted plan and {} recipes", removed);
        Ok(removed)
    }

    pub async fn get_plan(&self, owner: &Owner, plan_id: Uuid) -> Result<Plan, PlanningError> {
        self.load_owned(owner.id, plan_id).await
    }

    pub async fn get_plan_detail(
        &self,
        owner: &Owner,
        plan_id: Uuid,
    ) -> Result<PlanDetail, PlanningError> {
        let plan = self.load_owned(owner.id, plan_id).await?;
        let recipes = self.plans.list_plan_recipes(plan_id).await?;
        Ok(PlanDetail { plan, recipes })
    }

    pub async fn list_plans(&self, owner: &Owner) -> Result<Vec<Plan>, PlanningError> {
        Ok(self.plans.list_plans(owner.id).await?)
    }

    pub async fn list_prompts(&self, owner: &Owner) -> Result<Vec<PromptFrequency>, PlanningError> {
        Ok(self.plans.list_prompts(owner.id).await?)
    }

    /// Fail every plan left `waiting` by a previous process. Call once at
    /// startup before serving requests; those plans can then be rerun or
    /// deleted.
    pub async fn recover_stranded_plans(&self) -> Result<usize, PlanningError> {
        let count = self.plans.fail_stranded_generations().await?;
        if count > 0 {
            tracing::warn!("Marked {} plans stranded in waiting as failed", count);
        }
        Ok(count)
    }

    /// Whether a generation loop for the plan is still tracked as running.
    pub async fn is_generating(&self, plan_id: Uuid) -> bool {
        self.running
            .lock()
            .await
            .get(&plan_id)
            .is_some_and(|r| !r.handle.is_finished())
    }

    /// Wait for the plan's most recently scheduled generation loop to end.
    /// Returns `None` if nothing is tracked for the plan, which includes a
    /// loop that already finished.
    pub async fn wait_for_generation(&self, plan_id: Uuid) -> Option<GenerationOutcome> {
        let running = self.running.lock().await.remove(&plan_id)?;
        running.handle.await.ok()
    }

    /// Fails closed: a plan owned by someone else is `Forbidden` even though
    /// it exists.
    async fn load_owned(&self, owner_id: Uuid, plan_id: Uuid) -> Result<Plan, PlanningError> {
        let plan = self
            .plans
            .get_plan(plan_id)
            .await?
            .ok_or(PlanningError::NotFound)?;

        if plan.owner_id != owner_id {
            tracing::warn!(plan_id = %plan_id, owner_id = %owner_id, "Rejected access to plan of another owner");
            return Err(PlanningError::Forbidden);
        }
        Ok(plan)
    }

    async fn schedule_create(
        &self,
        owner: &Owner,
        plan: &Plan,
        generation_id: Uuid,
        snapshot: &InventorySnapshot,
    ) {
        let job = GenerationJob {
            generation_id,
            owner_id: owner.id,
            plan_id: plan.id,
            party_size: plan.party_size,
            kind: GenerationKind::Create,
            prompt: build_create_prompt(owner, plan, &snapshot.ingredients, &snapshot.kitchenware),
        };
        self.schedule(job).await;
    }

    /// Spawn the generation loop and track its handle. The lock is held
    /// across spawn and insert so the task's own cleanup always runs after
    /// the insert.
    async fn schedule(&self, job: GenerationJob) {
        let plans = self.plans.clone();
        let gateway = self.gateway.clone();
        let running = self.running.clone();
        let max_attempts = self.config.max_attempts;
        let call_timeout = self.config.call_timeout;
        let plan_id = job.plan_id;
        let generation_id = job.generation_id;

        let mut tracked = self.running.lock().await;
        let handle = tokio::spawn(async move {
            let outcome =
                run_generation(plans.as_ref(), &gateway, &job, max_attempts, call_timeout).await;

            let mut running = running.lock().await;
            if running
                .get(&plan_id)
                .is_some_and(|r| r.generation_id == generation_id)
            {
                running.remove(&plan_id);
            }
            outcome
        });

        if let Some(previous) = tracked.insert(
            plan_id,
            RunningGeneration {
                generation_id,
                handle,
            },
        ) {
            if !previous.handle.is_finished() {
                tracing::info!(
                    plan_id = %plan_id,
                    superseded = %previous.generation_id,
                    "New generation supersedes a running one"
                );
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request() -> PlanRequest {
        PlanRequest {
            title: "  Date night ".to_string(),
            tags: vec!["italian".to_string(), " ".to_string()],
            prompt: Some(" quick pasta ".to_string()),
            meal_type: "Dinner".to_string(),
            party_size: 2,
            time_budget_minutes: 30,
        }
    }

    fn invalid(request: PlanRequest) -> String {
        match request.into_new_plan(Uuid::new_v4(), Uuid::new_v4()) {
            Err(PlanningError::InvalidRequest(message)) => message,
            other => panic!("expected invalid request, got {:?}", other),
        }
    }

    #[test]
    fn test_valid_request_is_normalized() {
        let owner_id = Uuid::new_v4();
        let generation_id = Uuid::new_v4();
        let plan = request().into_new_plan(owner_id, generation_id).unwrap();

        assert_eq!(plan.title, "Date night");
        assert_eq!(plan.tags, vec!["italian".to_string()]);
        assert_eq!(plan.prompt.as_deref(), Some("quick pasta"));
        assert_eq!(plan.meal_type, MealType::Dinner);
        assert_eq!(plan.generation_id, generation_id);
    }

    #[test]
    fn test_whitespace_prompt_is_absent() {
        let mut req = request();
        req.prompt = Some("   ".to_string());
        let plan = req.into_new_plan(Uuid::new_v4(), Uuid::new_v4()).unwrap();
        assert_eq!(plan.prompt, None);
    }

    #[test]
    fn test_rejects_unknown_meal_type() {
        let mut req = request();
        req.meal_type = "Supper".to_string();
        assert!(invalid(req).contains("High Tea"));
    }

    #[test]
    fn test_rejects_out_of_range_numbers() {
        for (party, time) in [(0, 30), (11, 30), (2, 0), (2, 601)] {
            let mut req = request();
            req.party_size = party;
            req.time_budget_minutes = time;
            invalid(req);
        }

        let mut req = request();
        req.party_size = 10;
        req.time_budget_minutes = 600;
        assert!(req.into_new_plan(Uuid::new_v4(), Uuid::new_v4()).is_ok());
    }

    #[test]
    fn test_rejects_bad_title_and_long_prompt() {
        let mut req = request();
        req.title = " ".to_string();
        invalid(req);

        let mut req = request();
        req.title = "t".repeat(MAX_TITLE_LENGTH + 1);
        invalid(req);

        let mut req = request();
        req.prompt = Some("p".repeat(MAX_PROMPT_LENGTH + 1));
        invalid(req);
    }
}
