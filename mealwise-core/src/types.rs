use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// The meal a plan is for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum MealType {
    Breakfast,
    Brunch,
    Lunch,
    #[serde(rename = "High Tea")]
    HighTea,
    Dinner,
    #[serde(rename = "Night Snack")]
    NightSnack,
}

impl MealType {
    pub const ALL: [MealType; 6] = [
        MealType::Breakfast,
        MealType::Brunch,
        MealType::Lunch,
        MealType::HighTea,
        MealType::Dinner,
        MealType::NightSnack,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            MealType::Breakfast => "Breakfast",
            MealType::Brunch => "Brunch",
            MealType::Lunch => "Lunch",
            MealType::HighTea => "High Tea",
            MealType::Dinner => "Dinner",
            MealType::NightSnack => "Night Snack",
        }
    }

    /// Exact match on the display name; anything else is not a meal type.
    pub fn parse(s: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|mt| mt.as_str() == s)
    }
}

/// Lifecycle status of a plan.
///
/// A plan enters `Waiting` when created, rerun or edited, and leaves it
/// exactly once per generation for `Success` or `Fail`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PlanStatus {
    Waiting,
    Success,
    Fail,
    Closed,
}

impl PlanStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            PlanStatus::Waiting => "waiting",
            PlanStatus::Success => "success",
            PlanStatus::Fail => "fail",
            PlanStatus::Closed => "closed",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "waiting" => Some(PlanStatus::Waiting),
            "success" => Some(PlanStatus::Success),
            "fail" => Some(PlanStatus::Fail),
            "closed" => Some(PlanStatus::Closed),
            _ => None,
        }
    }
}

/// Where a recipe came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SourceType {
    Manual,
    Ai,
    Plan,
}

impl SourceType {
    pub fn as_str(&self) -> &'static str {
        match self {
            SourceType::Manual => "manual",
            SourceType::Ai => "ai",
            SourceType::Plan => "plan",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "manual" => Some(SourceType::Manual),
            "ai" => Some(SourceType::Ai),
            "plan" => Some(SourceType::Plan),
            _ => None,
        }
    }
}

/// The verified identity a request acts on behalf of.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Owner {
    pub id: Uuid,
    pub name: String,
    pub email: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Plan {
    pub id: Uuid,
    pub owner_id: Uuid,
    pub title: String,
    pub tags: Vec<String>,
    pub prompt: Option<String>,
    pub meal_type: MealType,
    pub party_size: i32,
    pub time_budget_minutes: i32,
    pub status: PlanStatus,
    /// Generation currently allowed to write a terminal status.
    pub generation_id: Option<Uuid>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// A plan about to be inserted. Status is always `waiting`.
#[derive(Debug, Clone)]
pub struct NewPlan {
    pub owner_id: Uuid,
    pub title: String,
    pub tags: Vec<String>,
    pub prompt: Option<String>,
    pub meal_type: MealType,
    pub party_size: i32,
    pub time_budget_minutes: i32,
    pub generation_id: Uuid,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecipeIngredient {
    pub name: String,
    #[serde(default)]
    pub amount: String,
    #[serde(default)]
    pub note: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecipeStep {
    pub order: i32,
    pub text: String,
    #[serde(default)]
    pub duration_minutes: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Recipe {
    pub id: Uuid,
    pub owner_id: Uuid,
    pub plan_id: Uuid,
    pub title: String,
    pub description: String,
    pub image_url: String,
    pub servings: i32,
    pub total_time_minutes: i32,
    pub tags: Vec<String>,
    pub source_type: SourceType,
    pub ingredients: Vec<RecipeIngredient>,
    pub steps: Vec<RecipeStep>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct NewRecipe {
    pub owner_id: Uuid,
    pub plan_id: Uuid,
    pub title: String,
    pub description: String,
    pub image_url: String,
    pub servings: i32,
    pub total_time_minutes: i32,
    pub tags: Vec<String>,
    pub source_type: SourceType,
    pub ingredients: Vec<RecipeIngredient>,
    pub steps: Vec<RecipeStep>,
}

/// How often an owner has used a free-text prompt.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PromptFrequency {
    pub id: Uuid,
    pub owner_id: Uuid,
    pub text: String,
    pub frequency: i32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GenerationLogEntry {
    pub id: Uuid,
    pub owner_id: Uuid,
    pub plan_id: Uuid,
    pub task_name: String,
    pub attempt: i32,
    pub user_prompt: String,
    pub llm_response: String,
    /// Empty on success.
    pub error_message: String,
    pub created_at: DateTime<Utc>,
}

impl GenerationLogEntry {
    pub fn is_success(&self) -> bool {
        self.error_message.is_empty()
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct NewGenerationLogEntry {
    pub owner_id: Uuid,
    pub plan_id: Uuid,
    pub task_name: String,
    pub attempt: i32,
    pub user_prompt: String,
    pub llm_response: String,
    pub error_message: String,
}

/// An ingredient in the owner's kitchen inventory.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PantryIngredient {
    pub id: Uuid,
    pub owner_id: Uuid,
    pub name: String,
    pub quantity: String,
    pub expiration_date: Option<DateTime<Utc>>,
    pub category: String,
}

impl PantryIngredient {
    /// Ingredients without an expiration date never count as unexpired.
    pub fn is_unexpired(&self, as_of: DateTime<Utc>) -> bool {
        self.expiration_date.is_some_and(|exp| exp > as_of)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Kitchenware {
    pub id: Uuid,
    pub owner_id: Uuid,
    pub name: String,
    pub quantity: String,
}
