//! Storage seams used by the planner.
//!
//! The server implements these on Postgres; [`super::MemoryStore`] implements
//! them in memory for tests and offline runs. Every method documented as
//! atomic must apply all of its writes or none of them.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::error::StoreError;
use crate::types::{
    Kitchenware, NewGenerationLogEntry, NewPlan, NewRecipe, PantryIngredient, Plan, PlanStatus,
    PromptFrequency, Recipe,
};

#[async_trait]
pub trait PlanStore: Send + Sync {
    /// Atomically insert a `waiting` plan and, when it carries a prompt,
    /// bump that prompt's frequency for the owner (inserting it at 1).
    async fn create_plan(&self, plan: NewPlan) -> Result<Plan, StoreError>;

    async fn get_plan(&self, plan_id: Uuid) -> Result<Option<Plan>, StoreError>;

    /// The owner's plans, oldest first.
    async fn list_plans(&self, owner_id: Uuid) -> Result<Vec<Plan>, StoreError>;

    async fn list_plan_recipes(&self, plan_id: Uuid) -> Result<Vec<Recipe>, StoreError>;

    /// The owner's prompts, most used first.
    async fn list_prompts(&self, owner_id: Uuid) -> Result<Vec<PromptFrequency>, StoreError>;

    /// Compare-and-swap on status: move the plan to `to` only if its current
    /// status is one of `from`. When `generation_id` is given it replaces the
    /// plan's generation id in the same write.
    ///
    /// Returns the updated plan, or `None` if the plan is gone or its status
    /// did not match.
    async fn transition_plan(
        &self,
        plan_id: Uuid,
        from: &[PlanStatus],
        to: PlanStatus,
        generation_id: Option<Uuid>,
    ) -> Result<Option<Plan>, StoreError>;

    /// Atomically replace every recipe of the plan with `recipes` and set the
    /// plan to `success`, only if it is still `waiting` on `generation_id`.
    ///
    /// Returns `false` (and writes nothing) when the generation is stale.
    async fn commit_generation(
        &self,
        plan_id: Uuid,
        generation_id: Uuid,
        recipes: Vec<NewRecipe>,
    ) -> Result<bool, StoreError>;

    /// Set the plan to `fail` if it is still `waiting` on `generation_id`.
    async fn fail_generation(&self, plan_id: Uuid, generation_id: Uuid)
        -> Result<bool, StoreError>;

    /// Set every `waiting` plan to `fail`. Run once at startup, before any
    /// generation is scheduled: a plan still waiting then has no live loop
    /// and would otherwise stay waiting forever. Returns the number of plans
    /// changed.
    async fn fail_stranded_generations(&self) -> Result<usize, StoreError>;

    /// Atomically delete a plan that is not `waiting` together with all of
    /// its recipes. Returns the number of recipes removed, or `None` if the
    /// plan is gone or currently `waiting`.
    async fn delete_plan(&self, plan_id: Uuid) -> Result<Option<usize>, StoreError>;

    async fn append_generation_log(&self, entry: NewGenerationLogEntry) -> Result<(), StoreError>;
}

/// Read side of the owner's kitchen inventory.
#[async_trait]
pub trait InventoryStore: Send + Sync {
    /// Ingredients whose expiration date is strictly after `as_of`.
    async fn list_unexpired_ingredients(
        &self,
        owner_id: Uuid,
        as_of: DateTime<Utc>,
    ) -> Result<Vec<PantryIngredient>, StoreError>;

    async fn list_kitchenware(&self, owner_id: Uuid) -> Result<Vec<Kitchenware>, StoreError>;
}
