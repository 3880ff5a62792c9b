//! Data minimization for prompts.
//!
//! Only fields relevant to cooking leave the process: no internal ids,
//! timestamps or statuses are ever rendered into a prompt.

use chrono::{DateTime, Utc};
use serde::Serialize;

use super::decode::GeneratedRecipe;
use crate::prompts::{render_create_plan_prompt, render_edit_plan_prompt};
use crate::types::{Kitchenware, Owner, PantryIngredient, Plan, Recipe};

#[derive(Debug, Serialize)]
pub struct SlimOwner<'a> {
    pub name: &'a str,
    pub email: &'a str,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SlimPlan<'a> {
    pub title: &'a str,
    pub tags: &'a [String],
    #[serde(skip_serializing_if = "Option::is_none")]
    pub prompt: Option<&'a str>,
    pub meal_type: &'static str,
    pub party_size: i32,
    pub time_limit_minutes: i32,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SlimIngredient<'a> {
    pub name: &'a str,
    pub quantity: &'a str,
    pub expiration_date: Option<DateTime<Utc>>,
    pub category: &'a str,
}

#[derive(Debug, Serialize)]
pub struct SlimKitchenware<'a> {
    pub name: &'a str,
    pub quantity: &'a str,
}

impl<'a> From<&'a Owner> for SlimOwner<'a> {
    fn from(owner: &'a Owner) -> Self {
        Self {
            name: &owner.name,
            email: &owner.email,
        }
    }
}

impl<'a> From<&'a Plan> for SlimPlan<'a> {
    fn from(plan: &'a Plan) -> Self {
        Self {
            title: &plan.title,
            tags: &plan.tags,
            prompt: plan.prompt.as_deref(),
            meal_type: plan.meal_type.as_str(),
            party_size: plan.party_size,
            time_limit_minutes: plan.time_budget_minutes,
        }
    }
}

impl<'a> From<&'a PantryIngredient> for SlimIngredient<'a> {
    fn from(ingredient: &'a PantryIngredient) -> Self {
        Self {
            name: &ingredient.name,
            quantity: &ingredient.quantity,
            expiration_date: ingredient.expiration_date,
            category: &ingredient.category,
        }
    }
}

impl<'a> From<&'a Kitchenware> for SlimKitchenware<'a> {
    fn from(item: &'a Kitchenware) -> Self {
        Self {
            name: &item.name,
            quantity: &item.quantity,
        }
    }
}

fn to_json<T: Serialize>(value: &T) -> String {
    // Serializing these plain structs cannot fail.
    serde_json::to_string(value).unwrap_or_default()
}

/// Render the create-plan prompt from slimmed copies of the inputs.
pub fn build_create_prompt(
    owner: &Owner,
    plan: &Plan,
    ingredients: &[PantryIngredient],
    kitchenware: &[Kitchenware],
) -> String {
    let ingredients: Vec<SlimIngredient> = ingredients.iter().map(Into::into).collect();
    let kitchenware: Vec<SlimKitchenware> = kitchenware.iter().map(Into::into).collect();

    render_create_plan_prompt(
        &to_json(&SlimOwner::from(owner)),
        &to_json(&SlimPlan::from(plan)),
        &to_json(&ingredients),
        &to_json(&kitchenware),
    )
}

/// Render the edit prompt from the plan's current recipes.
pub fn build_edit_prompt(recipes: &[Recipe], instruction: &str) -> String {
    let recipes: Vec<GeneratedRecipe> = recipes.iter().map(GeneratedRecipe::from_recipe).collect();
    render_edit_plan_prompt(&to_json(&recipes), instruction)
}
