use chrono::{DateTime, Utc};
use diesel::prelude::*;
use mealwise_core::{
    GenerationLogEntry, Kitchenware, MealType, Owner, PantryIngredient, Plan, PlanStatus,
    PromptFrequency, Recipe, RecipeIngredient, RecipeStep, SourceType, StoreError,
};
use uuid::Uuid;

#[derive(Queryable, Selectable, Debug)]
#[diesel(table_name = crate::schema::users)]
#[diesel(check_for_backend(diesel::pg::Pg))]
#[allow(dead_code)]
pub struct User {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    pub created_at: DateTime<Utc>,
    pub deleted_at: Option<DateTime<Utc>>,
}

impl From<User> for Owner {
    fn from(user: User) -> Self {
        Owner {
            id: user.id,
            name: user.name,
            email: user.email,
        }
    }
}

#[derive(Insertable)]
#[diesel(table_name = crate::schema::users)]
pub struct NewUser<'a> {
    pub name: &'a str,
    pub email: &'a str,
}

#[derive(Insertable)]
#[diesel(table_name = crate::schema::sessions)]
pub struct NewSession<'a> {
    pub user_id: Uuid,
    pub token_hash: &'a str,
    pub expires_at: DateTime<Utc>,
}

#[derive(Queryable, Selectable, Debug)]
#[diesel(table_name = crate::schema::plans)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct PlanRow {
    pub id: Uuid,
    pub user_id: Uuid,
    pub title: String,
    pub tags: Vec<String>,
    pub prompt: Option<String>,
    pub meal_type: String,
    pub party_size: i32,
    pub time_budget_minutes: i32,
    pub status: String,
    pub generation_id: Option<Uuid>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl TryFrom<PlanRow> for Plan {
    type Error = StoreError;

    fn try_from(row: PlanRow) -> Result<Self, Self::Error> {
        let meal_type = MealType::parse(&row.meal_type).ok_or_else(|| {
            StoreError::Corrupt(format!("plan {} has meal type '{}'", row.id, row.meal_type))
        })?;
        let status = PlanStatus::parse(&row.status).ok_or_else(|| {
            StoreError::Corrupt(format!("plan {} has status '{}'", row.id, row.status))
        })?;

        Ok(Plan {
            id: row.id,
            owner_id: row.user_id,
            title: row.title,
            tags: row.tags,
            prompt: row.prompt,
            meal_type,
            party_size: row.party_size,
            time_budget_minutes: row.time_budget_minutes,
            status,
            generation_id: row.generation_id,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

#[derive(Insertable)]
#[diesel(table_name = crate::schema::plans)]
pub struct NewPlanRow<'a> {
    pub user_id: Uuid,
    pub title: &'a str,
    pub tags: &'a [String],
    pub prompt: Option<&'a str>,
    pub meal_type: &'a str,
    pub party_size: i32,
    pub time_budget_minutes: i32,
    pub status: &'a str,
    pub generation_id: Option<Uuid>,
}

#[derive(Queryable, Selectable, Debug)]
#[diesel(table_name = crate::schema::recipes)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct RecipeRow {
    pub id: Uuid,
    pub user_id: Uuid,
    pub plan_id: Uuid,
    pub title: String,
    pub description: String,
    pub image_url: String,
    pub servings: i32,
    pub total_time_minutes: i32,
    pub tags: Vec<String>,
    pub source_type: String,
    pub ingredients: serde_json::Value,
    pub steps: serde_json::Value,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl TryFrom<RecipeRow> for Recipe {
    type Error = StoreError;

    fn try_from(row: RecipeRow) -> Result<Self, Self::Error> {
        let source_type = SourceType::parse(&row.source_type).ok_or_else(|| {
            StoreError::Corrupt(format!(
                "recipe {} has source type '{}'",
                row.id, row.source_type
            ))
        })?;
        let ingredients: Vec<RecipeIngredient> = serde_json::from_value(row.ingredients)
            .map_err(|e| StoreError::Corrupt(format!("recipe {} ingredients: {}", row.id, e)))?;
        let steps: Vec<RecipeStep> = serde_json::from_value(row.steps)
            .map_err(|e| StoreError::Corrupt(format!("recipe {} steps: {}", row.id, e)))?;

        Ok(Recipe {
            id: row.id,
            owner_id: row.user_id,
            plan_id: row.plan_id,
            title: row.title,
            description: row.description,
            image_url: row.image_url,
            servings: row.servings,
            total_time_minutes: row.total_time_minutes,
            tags: row.tags,
            source_type,
            ingredients,
            steps,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

#[derive(Insertable)]
#[diesel(table_name = crate::schema::recipes)]
pub struct NewRecipeRow {
    pub user_id: Uuid,
    pub plan_id: Uuid,
    pub title: String,
    pub description: String,
    pub image_url: String,
    pub servings: i32,
    pub total_time_minutes: i32,
    pub tags: Vec<String>,
    pub source_type: &'static str,
    pub ingredients: serde_json::Value,
    pub steps: serde_json::Value,
}

impl TryFrom<mealwise_core::NewRecipe> for NewRecipeRow {
    type Error = StoreError;

    fn try_from(recipe: mealwise_core::NewRecipe) -> Result<Self, Self::Error> {
        let ingredients = serde_json::to_value(&recipe.ingredients)
            .map_err(|e| StoreError::Database(e.to_string()))?;
        let steps =
            serde_json::to_value(&recipe.steps).map_err(|e| StoreError::Database(e.to_string()))?;

        Ok(NewRecipeRow {
            user_id: recipe.owner_id,
            plan_id: recipe.plan_id,
            title: recipe.title,
            description: recipe.description,
            image_url: recipe.image_url,
            servings: recipe.servings,
            total_time_minutes: recipe.total_time_minutes,
            tags: recipe.tags,
            source_type: recipe.source_type.as_str(),
            ingredients,
            steps,
        })
    }
}

#[derive(Queryable, Selectable, Debug)]
#[diesel(table_name = crate::schema::preferred_prompts)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct PromptRow {
    pub id: Uuid,
    pub user_id: Uuid,
    pub text: String,
    pub frequency: i32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<PromptRow> for PromptFrequency {
    fn from(row: PromptRow) -> Self {
        PromptFrequency {
            id: row.id,
            owner_id: row.user_id,
            text: row.text,
            frequency: row.frequency,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

#[derive(Insertable)]
#[diesel(table_name = crate::schema::preferred_prompts)]
pub struct NewPromptRow<'a> {
    pub user_id: Uuid,
    pub text: &'a str,
    pub frequency: i32,
}

#[derive(Queryable, Selectable, Debug)]
#[diesel(table_name = crate::schema::generation_logs)]
#[diesel(check_for_backend(diesel::pg::Pg))]
#[allow(dead_code)]
pub struct GenerationLogRow {
    pub id: Uuid,
    pub user_id: Uuid,
    pub plan_id: Uuid,
    pub task_name: String,
    pub attempt: i32,
    pub user_prompt: String,
    pub llm_response: String,
    pub error_message: String,
    pub created_at: DateTime<Utc>,
}

impl From<GenerationLogRow> for GenerationLogEntry {
    fn from(row: GenerationLogRow) -> Self {
        GenerationLogEntry {
            id: row.id,
            owner_id: row.user_id,
            plan_id: row.plan_id,
            task_name: row.task_name,
            attempt: row.attempt,
            user_prompt: row.user_prompt,
            llm_response: row.llm_response,
            error_message: row.error_message,
            created_at: row.created_at,
        }
    }
}

#[derive(Insertable)]
#[diesel(table_name = crate::schema::generation_logs)]
pub struct NewGenerationLogRow {
    pub user_id: Uuid,
    pub plan_id: Uuid,
    pub task_name: String,
    pub attempt: i32,
    pub user_prompt: String,
    pub llm_response: String,
    pub error_message: String,
}

impl From<mealwise_core::NewGenerationLogEntry> for NewGenerationLogRow {
    fn from(entry: mealwise_core::NewGenerationLogEntry) -> Self {
        NewGenerationLogRow {
            user_id: entry.owner_id,
            plan_id: entry.plan_id,
            task_name: entry.task_name,
            attempt: entry.attempt,
            user_prompt: entry.user_prompt,
            llm_response: entry.llm_response,
            error_message: entry.error_message,
        }
    }
}

#[derive(Queryable, Selectable, Debug)]
#[diesel(table_name = crate::schema::ingredients)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct IngredientRow {
    pub id: Uuid,
    pub user_id: Uuid,
    pub name: String,
    pub quantity: String,
    pub expiration_date: Option<DateTime<Utc>>,
    pub category: String,
}

impl From<IngredientRow> for PantryIngredient {
    fn from(row: IngredientRow) -> Self {
        PantryIngredient {
            id: row.id,
            owner_id: row.user_id,
            name: row.name,
            quantity: row.quantity,
            expiration_date: row.expiration_date,
            category: row.category,
        }
    }
}

#[derive(Queryable, Selectable, Debug)]
#[diesel(table_name = crate::schema::kitchenware)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct KitchenwareRow {
    pub id: Uuid,
    pub user_id: Uuid,
    pub name: String,
    pub quantity: String,
}

impl From<KitchenwareRow> for Kitchenware {
    fn from(row: KitchenwareRow) -> Self {
        Kitchenware {
            id: row.id,
            owner_id: row.user_id,
            name: row.name,
            quantity: row.quantity,
        }
    }
}
