//! In-memory store for tests and offline development.
//!
//! All state sits behind one lock, so every trait method is atomic.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tokio::sync::Mutex;
use uuid::Uuid;

use super::store::{InventoryStore, PlanStore};
use crate::error::StoreError;
use crate::types::{
    GenerationLogEntry, Kitchenware, NewGenerationLogEntry, NewPlan, NewRecipe, PantryIngredient,
    Plan, PlanStatus, PromptFrequency, Recipe,
};

#[derive(Debug, Default)]
struct State {
    plans: Vec<Plan>,
    recipes: Vec<Recipe>,
    prompts: Vec<PromptFrequency>,
    logs: Vec<GenerationLogEntry>,
    ingredients: Vec<PantryIngredient>,
    kitchenware: Vec<Kitchenware>,
    /// Number of upcoming `commit_generation` calls that fail.
    failing_commits: usize,
}

#[derive(Debug, Default)]
pub struct MemoryStore {
    state: Mutex<State>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn add_ingredient(
        &self,
        owner_id: Uuid,
        name: &str,
        expiration_date: Option<DateTime<Utc>>,
    ) -> PantryIngredient {
        let ingredient = PantryIngredient {
            id: Uuid::new_v4(),
            owner_id,
            name: name.to_string(),
            quantity: "1".to_string(),
            expiration_date,
            category: "General".to_string(),
        };
        self.state.lock().await.ingredients.push(ingredient.clone());
        ingredient
    }

    pub async fn add_kitchenware(&self, owner_id: Uuid, name: &str) -> Kitchenware {
        let item = Kitchenware {
            id: Uuid::new_v4(),
            owner_id,
            name: name.to_string(),
            quantity: "1".to_string(),
        };
        self.state.lock().await.kitchenware.push(item.clone());
        item
    }

    pub async fn clear_inventory(&self, owner_id: Uuid) {
        let mut state = self.state.lock().await;
        state.ingredients.retain(|i| i.owner_id != owner_id);
        state.kitchenware.retain(|k| k.owner_id != owner_id);
    }

    /// Make the next `count` recipe commits fail without writing anything.
    pub async fn fail_next_commits(&self, count: usize) {
        self.state.lock().await.failing_commits = count;
    }

    pub async fn generation_logs(&self, plan_id: Uuid) -> Vec<GenerationLogEntry> {
        self.state
            .lock()
            .await
            .logs
            .iter()
            .filter(|l| l.plan_id == plan_id)
            .cloned()
            .collect()
    }

    pub async fn all_recipes(&self) -> Vec<Recipe> {
        self.state.lock().await.recipes.clone()
    }

    pub async fn plan_count(&self) -> usize {
        self.state.lock().await.plans.len()
    }
}

#[async_trait]
impl PlanStore for MemoryStore {
    async fn create_plan(&self, new_plan: NewPlan) -> Result<Plan, StoreError> {
        let mut state = self.state.lock().await;
        let now = Utc::now();

        if let Some(text) = new_plan.prompt.as_deref() {
            match state
                .prompts
                .iter_mut()
                .find(|p| p.owner_id == new_plan.owner_id && p.text == text)
            {
                Some(existing) => {
                    existing.frequency += 1;
                    existing.updated_at = now;
                }
                None => state.prompts.push(PromptFrequency {
                    id: Uuid::new_v4(),
                    owner_id: new_plan.owner_id,
                    text: text.to_string(),
                    frequency: 1,
                    created_at: now,
                    updated_at: now,
                }),
            }
        }

        let plan = Plan {
            id: Uuid::new_v4(),
            owner_id: new_plan.owner_id,
            title: new_plan.title,
            tags: new_plan.tags,
            prompt: new_plan.prompt,
            meal_type: new_plan.meal_type,
            party_size: new_plan.party_size,
            time_budget_minutes: new_plan.time_budget_minutes,
            status: PlanStatus::Waiting,
            generation_id: Some(new_plan.generation_id),
            created_at: now,
            updated_at: now,
        };
        state.plans.push(plan.clone());
        Ok(plan)
    }

    async fn get_plan(&self, plan_id: Uuid) -> Result<Option<Plan>, StoreError> {
        let state = self.state.lock().await;
        Ok(state.plans.iter().find(|p| p.id == plan_id).cloned())
    }

    async fn list_plans(&self, owner_id: Uuid) -> Result<Vec<Plan>, StoreError> {
        let state = self.state.lock().await;
        Ok(state
            .plans
            .iter()
            .filter(|p| p.owner_id == owner_id)
            .cloned()
            .collect())
    }

    async fn list_plan_recipes(&self, plan_id: Uuid) -> Result<Vec<Recipe>, StoreError> {
        let state = self.state.lock().await;
        Ok(state
            .recipes
            .iter()
            .filter(|r| r.plan_id == plan_id)
            .cloned()
            .collect())
    }

    async fn list_prompts(&self, owner_id: Uuid) -> Result<Vec<PromptFrequency>, StoreError> {
        let state = self.state.lock().await;
        let mut prompts: Vec<PromptFrequency> = state
            .prompts
            .iter()
            .filter(|p| p.owner_id == owner_id)
            .cloned()
            .collect();
        prompts.sort_by(|a, b| {
            b.frequency
                .cmp(&a.frequency)
                .then(b.updated_at.cmp(&a.updated_at))
        });
        Ok(prompts)
    }

    async fn transition_plan(
        &self,
        plan_id: Uuid,
        from: &[PlanStatus],
        to: PlanStatus,
        generation_id: Option<Uuid>,
    ) -> Result<Option<Plan>, StoreError> {
        let mut state = self.state.lock().await;
        let Some(plan) = state
            .plans
            .iter_mut()
            .find(|p| p.id == plan_id && from.contains(&p.status))
        else {
            return Ok(None);
        };

        plan.status = to;
        if generation_id.is_some() {
            plan.generation_id = generation_id;
        }
        plan.updated_at = Utc::now();
        Ok(Some(plan.clone()))
    }

    async fn commit_generation(
        &self,
        plan_id: Uuid,
        generation_id: Uuid,
        recipes: Vec<NewRecipe>,
    ) -> Result<bool, StoreError> {
        let mut state = self.state.lock().await;

        if state.failing_commits > 0 {
            state.failing_commits -= 1;
            return Err(StoreError::Database(
                "simulated transaction failure".to_string(),
            ));
        }

        let now = Utc::now();
        let Some(plan) = state.plans.iter_mut().find(|p| {
            p.id == plan_id
                && p.status == PlanStatus::Waiting
                && p.generation_id == Some(generation_id)
        }) else {
            return Ok(false);
        };
        plan.status = PlanStatus::Success;
        plan.updated_at = now;

        state.recipes.retain(|r| r.plan_id != plan_id);
        state.recipes.extend(recipes.into_iter().map(|r| Recipe {
            id: Uuid::new_v4(),
            owner_id: r.owner_id,
            plan_id: r.plan_id,
            title: r.title,
            description: r.description,
            image_url: r.image_url,
            servings: r.servings,
            total_time_minutes: r.total_time_minutes,
            tags: r.tags,
            source_type: r.source_type,
            ingredients: r.ingredients,
            steps: r.steps,
            created_at: now,
            updated_at: now,
        }));
        Ok(true)
    }

    async fn fail_generation(
        &self,
        plan_id: Uuid,
        generation_id: Uuid,
    ) -> Result<bool, StoreError> {
        let mut state = self.state.lock().await;
        let Some(plan) = state.plans.iter_mut().find(|p| {
            p.id == plan_id
                && p.status == PlanStatus::Waiting
                && p.generation_id == Some(generation_id)
        }) else {
            return Ok(false);
        };
        plan.status = PlanStatus::Fail;
        plan.updated_at = Utc::now();
        Ok(true)
    }

    async fn fail_stranded_generations(&self) -> Result<usize, StoreError> {
        let mut state = self.state.lock().await;
        let now = Utc::now();
        let mut count = 0;
        for plan in state
            .plans
            .iter_mut()
            .filter(|p| p.status == PlanStatus::Waiting)
        {
            plan.status = PlanStatus::Fail;
            plan.updated_at = now;
            count += 1;
        }
        Ok(count)
    }

    async fn delete_plan(&self, plan_id: Uuid) -> Result<Option<usize>, StoreError> {
        let mut state = self.state.lock().await;
        let Some(index) = state
            .plans
            .iter()
            .position(|p| p.id == plan_id && p.status != PlanStatus::Waiting)
        else {
            return Ok(None);
        };

        state.plans.remove(index);
        let before = state.recipes.len();
        state.recipes.retain(|r| r.plan_id != plan_id);
        Ok(Some(before - state.recipes.len()))
    }

    async fn append_generation_log(&self, entry: NewGenerationLogEntry) -> Result<(), StoreError> {
        let mut state = self.state.lock().await;
        state.logs.push(GenerationLogEntry {
            id: Uuid::new_v4(),
            owner_id: entry.owner_id,
            plan_id: entry.plan_id,
            task_name: entry.task_name,
            attempt: entry.attempt,
            user_prompt: entry.user_prompt,
            llm_response: entry.llm_response,
            error_message: entry.error_message,
            created_at: Utc::now(),
        });
        Ok(())
    }
}

#[async_trait]
impl InventoryStore for MemoryStore {
    async fn list_unexpired_ingredients(
        &self,
        owner_id: Uuid,
        as_of: DateTime<Utc>,
    ) -> Result<Vec<PantryIngredient>, StoreError> {
        let state = self.state.lock().await;
        Ok(state
            .ingredients
            .iter()
            .filter(|i| i.owner_id == owner_id && i.is_unexpired(as_of))
            .cloned()
            .collect())
    }

    async fn list_kitchenware(&self, owner_id: Uuid) -> Result<Vec<Kitchenware>, StoreError> {
        let state = self.state.lock().await;
        Ok(state
            .kitchenware
            .iter()
            .filter(|k| k.owner_id == owner_id)
            .cloned()
            .collect())
    }
}
