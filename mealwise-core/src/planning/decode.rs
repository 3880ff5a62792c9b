//! Schema-checked decoding of model output into recipes.
//!
//! Decoding is all-or-nothing: one bad recipe rejects the whole response.

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use uuid::Uuid;

use crate::error::DecodeError;
use crate::types::{NewRecipe, Recipe, RecipeIngredient, RecipeStep, SourceType};

/// Longest recipe title the recipe store accepts, in characters.
pub const MAX_RECIPE_TITLE_LENGTH: usize = 255;

/// A recipe exactly as the model is asked to produce it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GeneratedRecipe {
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub servings: Option<i32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub total_time_min: Option<i32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tags: Option<Vec<String>>,
    pub ingredients: Vec<GeneratedIngredient>,
    pub steps: Vec<GeneratedStep>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GeneratedIngredient {
    pub name: String,
    #[serde(
        default,
        deserialize_with = "lenient_text",
        skip_serializing_if = "Option::is_none"
    )]
    pub amount: Option<String>,
    #[serde(
        default,
        deserialize_with = "lenient_text",
        skip_serializing_if = "Option::is_none"
    )]
    pub note: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GeneratedStep {
    pub order: i64,
    pub text: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub duration_min: Option<f64>,
}

/// Models write `"amount": 2` as often as `"amount": "2"`.
fn lenient_text<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Value::deserialize(deserializer)? {
        Value::Null => None,
        Value::String(s) => Some(s),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        other => Some(other.to_string()),
    })
}

/// Decode sanitized model text into a validated, non-empty recipe list.
pub fn decode_recipes(text: &str) -> Result<Vec<GeneratedRecipe>, DecodeError> {
    let value: Value =
        serde_json::from_str(text).map_err(|e| DecodeError::InvalidJson(e.to_string()))?;

    let Value::Array(items) = value else {
        return Err(DecodeError::NotAnArray);
    };

    if items.is_empty() {
        return Err(DecodeError::EmptyList);
    }

    items
        .into_iter()
        .enumerate()
        .map(|(index, item)| {
            let recipe: GeneratedRecipe =
                serde_json::from_value(item).map_err(|e| DecodeError::Schema {
                    index,
                    message: e.to_string(),
                })?;
            recipe.validate(index)?;
            Ok(recipe)
        })
        .collect()
}

impl GeneratedRecipe {
    fn validate(&self, index: usize) -> Result<(), DecodeError> {
        let title = self.title.trim();
        if title.is_empty() {
            return Err(DecodeError::EmptyTitle { index });
        }
        if title.chars().count() > MAX_RECIPE_TITLE_LENGTH {
            return Err(DecodeError::TitleTooLong {
                index,
                max: MAX_RECIPE_TITLE_LENGTH,
            });
        }

        if let Some(ingredient) = self
            .ingredients
            .iter()
            .position(|i| i.name.trim().is_empty())
        {
            return Err(DecodeError::EmptyIngredientName { index, ingredient });
        }

        if self.steps.is_empty() {
            return Err(DecodeError::NoSteps { index });
        }

        for (step, s) in self.steps.iter().enumerate() {
            if s.order < 1 {
                return Err(DecodeError::InvalidStepOrder {
                    index,
                    step,
                    order: s.order,
                });
            }
            if s.text.trim().is_empty() {
                return Err(DecodeError::EmptyStepText { index, step });
            }
        }

        Ok(())
    }

    /// Attach ownership and fill defaults. Steps come out sorted by order.
    pub fn into_new_recipe(self, owner_id: Uuid, plan_id: Uuid, party_size: i32) -> NewRecipe {
        let mut steps: Vec<RecipeStep> = self
            .steps
            .into_iter()
            .map(|s| RecipeStep {
                order: i32::try_from(s.order).unwrap_or(i32::MAX),
                text: s.text.trim().to_string(),
                duration_minutes: s.duration_min.filter(|d| d.is_finite() && *d >= 0.0),
            })
            .collect();
        steps.sort_by_key(|s| s.order);

        NewRecipe {
            owner_id,
            plan_id,
            title: self.title.trim().to_string(),
            description: self.description.unwrap_or_default(),
            image_url: self.image_url.unwrap_or_default(),
            servings: self.servings.filter(|s| *s > 0).unwrap_or(party_size),
            total_time_minutes: self.total_time_min.unwrap_or(0).max(0),
            tags: self.tags.unwrap_or_default(),
            source_type: SourceType::Plan,
            ingredients: self
                .ingredients
                .into_iter()
                .map(|i| RecipeIngredient {
                    name: i.name.trim().to_string(),
                    amount: i.amount.unwrap_or_default(),
                    note: i.note.unwrap_or_default(),
                })
                .collect(),
            steps,
        }
    }

    /// The stored recipe in the shape the model reads and writes, for edit
    /// prompts.
    pub fn from_recipe(recipe: &Recipe) -> Self {
        Self {
            title: recipe.title.clone(),
            description: Some(recipe.description.clone()).filter(|d| !d.is_empty()),
            image_url: None,
            servings: Some(recipe.servings),
            total_time_min: Some(recipe.total_time_minutes),
            tags: Some(recipe.tags.clone()),
            ingredients: recipe
                .ingredients
                .iter()
                .map(|i| GeneratedIngredient {
                    name: i.name.clone(),
                    amount: Some(i.amount.clone()).filter(|a| !a.is_empty()),
                    note: Some(i.note.clone()).filter(|n| !n.is_empty()),
                })
                .collect(),
            steps: recipe
                .steps
                .iter()
                .map(|s| GeneratedStep {
                    order: i64::from(s.order),
                    text: s.text.clone(),
                    duration_min: s.duration_minutes,
                })
                .collect(),
        }
    }
}
