use chrono::{DateTime, Utc};
use serde::Serialize;
use uuid::Uuid;

use super::store::InventoryStore;
use crate::error::StoreError;
use crate::types::{Kitchenware, PantryIngredient};

/// Inventory captured once when a generation is scheduled.
#[derive(Debug, Clone, Default)]
pub struct InventorySnapshot {
    pub ingredients: Vec<PantryIngredient>,
    pub kitchenware: Vec<Kitchenware>,
}

/// Why the owner cannot plan a meal yet. This is a normal outcome, not an error.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NotReady {
    pub missing_ingredients: bool,
    pub missing_kitchenware: bool,
    pub message: String,
}

impl NotReady {
    fn new(missing_ingredients: bool, missing_kitchenware: bool) -> Self {
        let message = match (missing_ingredients, missing_kitchenware) {
            (true, true) => "Add at least one unexpired ingredient and one piece of kitchenware before planning a meal.",
            (true, false) => "Add at least one unexpired ingredient before planning a meal.",
            _ => "Add at least one piece of kitchenware before planning a meal.",
        };
        Self {
            missing_ingredients,
            missing_kitchenware,
            message: message.to_string(),
        }
    }
}

#[derive(Debug, Clone)]
pub enum Readiness {
    Ready(InventorySnapshot),
    NotReady(NotReady),
}

/// Read the owner's inventory and decide whether a plan can be generated.
///
/// Always reads current state; nothing is cached between calls.
pub async fn check_inventory(
    store: &dyn InventoryStore,
    owner_id: Uuid,
    as_of: DateTime<Utc>,
) -> Result<Readiness, StoreError> {
    let ingredients = store.list_unexpired_ingredients(owner_id, as_of).await?;
    let kitchenware = store.list_kitchenware(owner_id).await?;

    if ingredients.is_empty() || kitchenware.is_empty() {
        return Ok(Readiness::NotReady(NotReady::new(
            ingredients.is_empty(),
            kitchenware.is_empty(),
        )));
    }

    Ok(Readiness::Ready(InventorySnapshot {
        ingredients,
        kitchenware,
    }))
}
