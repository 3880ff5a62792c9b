use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use diesel::prelude::*;
use diesel::r2d2::{self, ConnectionManager};
use diesel_migrations::{embed_migrations, EmbeddedMigrations, MigrationHarness};
use mealwise_core::{
    InventoryStore, Kitchenware, NewGenerationLogEntry, NewPlan, NewRecipe, PantryIngredient,
    Plan, PlanStatus, PlanStore, PromptFrequency, Recipe, StoreError,
};
use uuid::Uuid;

use crate::models::{
    IngredientRow, KitchenwareRow, NewGenerationLogRow, NewPlanRow, NewPromptRow, NewRecipeRow,
    PlanRow, PromptRow, RecipeRow,
};
use crate::schema::{generation_logs, ingredients, kitchenware, plans, preferred_prompts, recipes};

pub const MIGRATIONS: EmbeddedMigrations = embed_migrations!("../migrations");

pub type DbPool = r2d2::Pool<ConnectionManager<PgConnection>>;

pub fn create_pool(database_url: &str) -> DbPool {
    let manager = ConnectionManager::<PgConnection>::new(database_url);
    let pool = r2d2::Pool::builder()
        .build(manager)
        .expect("Failed to create database pool");

    // Run pending migrations on startup
    let mut conn = pool
        .get()
        .expect("Failed to get DB connection for migrations");
    conn.run_pending_migrations(MIGRATIONS)
        .expect("Failed to run database migrations");

    pool
}

fn db_error(e: diesel::result::Error) -> StoreError {
    StoreError::Database(e.to_string())
}

/// Runs a diesel transaction whose body reports domain errors as
/// `StoreError`. Any error rolls the transaction back.
fn transaction<T, F>(conn: &mut PgConnection, f: F) -> Result<T, StoreError>
where
    F: FnOnce(&mut PgConnection) -> Result<T, TxError>,
{
    conn.transaction(f).map_err(|e| match e {
        TxError::Diesel(e) => db_error(e),
        TxError::Store(e) => e,
    })
}

#[derive(Debug)]
enum TxError {
    Diesel(diesel::result::Error),
    Store(StoreError),
}

impl From<diesel::result::Error> for TxError {
    fn from(e: diesel::result::Error) -> Self {
        TxError::Diesel(e)
    }
}

impl From<StoreError> for TxError {
    fn from(e: StoreError) -> Self {
        TxError::Store(e)
    }
}

/// Postgres implementation of the planner's storage traits.
///
/// Diesel is synchronous, so every call runs on the blocking thread pool.
#[derive(Clone)]
pub struct PgStore {
    pool: Arc<DbPool>,
}

impl PgStore {
    pub fn new(pool: Arc<DbPool>) -> Self {
        Self { pool }
    }

    async fn with_conn<T, F>(&self, f: F) -> Result<T, StoreError>
    where
        T: Send + 'static,
        F: FnOnce(&mut PgConnection) -> Result<T, StoreError> + Send + 'static,
    {
        let pool = self.pool.clone();
        tokio::task::spawn_blocking(move || {
            let mut conn = pool.get().map_err(|e| StoreError::Pool(e.to_string()))?;
            f(&mut conn)
        })
        .await
        .map_err(|e| StoreError::Database(format!("Database task failed: {}", e)))?
    }
}

fn status_strs(statuses: &[PlanStatus]) -> Vec<&'static str> {
    statuses.iter().map(|s| s.as_str()).collect()
}

#[async_trait]
impl PlanStore for PgStore {
    async fn create_plan(&self, new_plan: NewPlan) -> Result<Plan, StoreError> {
        self.with_conn(move |conn| {
            let row = transaction(conn, |conn| {
                if let Some(text) = new_plan.prompt.as_deref() {
                    diesel::insert_into(preferred_prompts::table)
                        .values(NewPromptRow {
                            user_id: new_plan.owner_id,
                            text,
                            frequency: 1,
                        })
                        .on_conflict((preferred_prompts::user_id, preferred_prompts::text))
                        .do_update()
                        .set((
                            preferred_prompts::frequency.eq(preferred_prompts::frequency + 1),
                            preferred_prompts::updated_at.eq(Utc::now()),
                        ))
                        .execute(conn)?;
                }

                let row = diesel::insert_into(plans::table)
                    .values(NewPlanRow {
                        user_id: new_plan.owner_id,
                        title: &new_plan.title,
                        tags: &new_plan.tags,
                        prompt: new_plan.prompt.as_deref(),
                        meal_type: new_plan.meal_type.as_str(),
                        party_size: new_plan.party_size,
                        time_budget_minutes: new_plan.time_budget_minutes,
                        status: PlanStatus::Waiting.as_str(),
                        generation_id: Some(new_plan.generation_id),
                    })
                    .returning(PlanRow::as_returning())
                    .get_result(conn)?;
                Ok(row)
            })?;
            Plan::try_from(row)
        })
        .await
    }

    async fn get_plan(&self, plan_id: Uuid) -> Result<Option<Plan>, StoreError> {
        self.with_conn(move |conn| {
            plans::table
                .find(plan_id)
                .select(PlanRow::as_select())
                .first(conn)
                .optional()
                .map_err(db_error)?
                .map(Plan::try_from)
                .transpose()
        })
        .await
    }

    async fn list_plans(&self, owner_id: Uuid) -> Result<Vec<Plan>, StoreError> {
        self.with_conn(move |conn| {
            plans::table
                .filter(plans::user_id.eq(owner_id))
                .order((plans::created_at.asc(), plans::id.asc()))
                .select(PlanRow::as_select())
                .load(conn)
                .map_err(db_error)?
                .into_iter()
                .map(Plan::try_from)
                .collect()
        })
        .await
    }

    async fn list_plan_recipes(&self, plan_id: Uuid) -> Result<Vec<Recipe>, StoreError> {
        self.with_conn(move |conn| {
            recipes::table
                .filter(recipes::plan_id.eq(plan_id))
                .order((recipes::created_at.asc(), recipes::id.asc()))
                .select(RecipeRow::as_select())
                .load(conn)
                .map_err(db_error)?
                .into_iter()
                .map(Recipe::try_from)
                .collect()
        })
        .await
    }

    async fn list_prompts(&self, owner_id: Uuid) -> Result<Vec<PromptFrequency>, StoreError> {
        self.with_conn(move |conn| {
            let rows = preferred_prompts::table
                .filter(preferred_prompts::user_id.eq(owner_id))
                .order((
                    preferred_prompts::frequency.desc(),
                    preferred_prompts::updated_at.desc(),
                ))
                .select(PromptRow::as_select())
                .load(conn)
                .map_err(db_error)?;
            Ok(rows.into_iter().map(PromptFrequency::from).collect())
        })
        .await
    }

    async fn transition_plan(
        &self,
        plan_id: Uuid,
        from: &[PlanStatus],
        to: PlanStatus,
        generation_id: Option<Uuid>,
    ) -> Result<Option<Plan>, StoreError> {
        let from = status_strs(from);
        self.with_conn(move |conn| {
            let target = plans::table
                .filter(plans::id.eq(plan_id))
                .filter(plans::status.eq_any(from));

            let row = match generation_id {
                Some(generation_id) => diesel::update(target)
                    .set((
                        plans::status.eq(to.as_str()),
                        plans::generation_id.eq(Some(generation_id)),
                        plans::updated_at.eq(Utc::now()),
                    ))
                    .returning(PlanRow::as_returning())
                    .get_result(conn),
                None => diesel::update(target)
                    .set((
                        plans::status.eq(to.as_str()),
                        plans::updated_at.eq(Utc::now()),
                    ))
                    .returning(PlanRow::as_returning())
                    .get_result(conn),
            }
            .optional()
            .map_err(db_error)?;

            row.map(Plan::try_from).transpose()
        })
        .await
    }

    async fn commit_generation(
        &self,
        plan_id: Uuid,
        generation_id: Uuid,
        new_recipes: Vec<NewRecipe>,
    ) -> Result<bool, StoreError> {
        let rows = new_recipes
            .into_iter()
            .map(NewRecipeRow::try_from)
            .collect::<Result<Vec<_>, _>>()?;

        self.with_conn(move |conn| {
            transaction(conn, |conn| {
                let claimed = diesel::update(
                    plans::table
                        .filter(plans::id.eq(plan_id))
                        .filter(plans::status.eq(PlanStatus::Waiting.as_str()))
                        .filter(plans::generation_id.eq(generation_id)),
                )
                .set((
                    plans::status.eq(PlanStatus::Success.as_str()),
                    plans::updated_at.eq(Utc::now()),
                ))
                .execute(conn)?;

                if claimed == 0 {
                    return Ok(false);
                }

                diesel::delete(recipes::table.filter(recipes::plan_id.eq(plan_id)))
                    .execute(conn)?;
                if !rows.is_empty() {
                    diesel::insert_into(recipes::table)
                        .values(&rows)
                        .execute(conn)?;
                }
                Ok(true)
            })
        })
        .await
    }

    async fn fail_generation(
        &self,
        plan_id: Uuid,
        generation_id: Uuid,
    ) -> Result<bool, StoreError> {
        self.with_conn(move |conn| {
            let updated = diesel::update(
                plans::table
                    .filter(plans::id.eq(plan_id))
                    .filter(plans::status.eq(PlanStatus::Waiting.as_str()))
                    .filter(plans::generation_id.eq(generation_id)),
            )
            .set((
                plans::status.eq(PlanStatus::Fail.as_str()),
                plans::updated_at.eq(Utc::now()),
            ))
            .execute(conn)
            .map_err(db_error)?;
            Ok(updated > 0)
        })
        .await
    }

    async fn fail_stranded_generations(&self) -> Result<usize, StoreError> {
        self.with_conn(move |conn| {
            diesel::update(plans::table.filter(plans::status.eq(PlanStatus::Waiting.as_str())))
                .set((
                    plans::status.eq(PlanStatus::Fail.as_str()),
                    plans::updated_at.eq(Utc::now()),
                ))
                .execute(conn)
                .map_err(db_error)
        })
        .await
    }

    async fn delete_plan(&self, plan_id: Uuid) -> Result<Option<usize>, StoreError> {
        self.with_conn(move |conn| {
            transaction(conn, |conn| {
                let status: Option<String> = plans::table
                    .find(plan_id)
                    .select(plans::status)
                    .for_update()
                    .first(conn)
                    .optional()?;

                match status.as_deref() {
                    None => return Ok(None),
                    Some(s) if s == PlanStatus::Waiting.as_str() => return Ok(None),
                    Some(_) => {}
                }

                let removed = diesel::delete(recipes::table.filter(recipes::plan_id.eq(plan_id)))
                    .execute(conn)?;
                diesel::delete(plans::table.find(plan_id)).execute(conn)?;
                Ok(Some(removed))
            })
        })
        .await
    }

    async fn append_generation_log(&self, entry: NewGenerationLogEntry) -> Result<(), StoreError> {
        self.with_conn(move |conn| {
            diesel::insert_into(generation_logs::table)
                .values(NewGenerationLogRow::from(entry))
                .execute(conn)
                .map_err(db_error)?;
            Ok(())
        })
        .await
    }
}

#[async_trait]
impl InventoryStore for PgStore {
    async fn list_unexpired_ingredients(
        &self,
        owner_id: Uuid,
        as_of: DateTime<Utc>,
    ) -> Result<Vec<PantryIngredient>, StoreError> {
        self.with_conn(move |conn| {
            // NULL expiration dates never compare greater, so undated
            // ingredients are excluded.
            let rows = ingredients::table
                .filter(ingredients::user_id.eq(owner_id))
                .filter(ingredients::expiration_date.gt(as_of))
                .order(ingredients::expiration_date.asc())
                .select(IngredientRow::as_select())
                .load(conn)
                .map_err(db_error)?;
            Ok(rows.into_iter().map(PantryIngredient::from).collect())
        })
        .await
    }

    async fn list_kitchenware(&self, owner_id: Uuid) -> Result<Vec<Kitchenware>, StoreError> {
        self.with_conn(move |conn| {
            let rows = kitchenware::table
                .filter(kitchenware::user_id.eq(owner_id))
                .order(kitchenware::name.asc())
                .select(KitchenwareRow::as_select())
                .load(conn)
                .map_err(db_error)?;
            Ok(rows.into_iter().map(Kitchenware::from).collect())
        })
        .await
    }
}
