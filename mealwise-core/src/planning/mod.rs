//! Plan generation: from a user's request to persisted recipes.

mod decode;
mod generation;
mod inventory;
mod memory;
mod orchestrator;
mod sanitize;
mod slim;
mod store;

pub use decode::{decode_recipes, GeneratedIngredient, GeneratedRecipe, GeneratedStep};
pub use generation::{run_generation, GenerationJob, GenerationKind, GenerationOutcome};
pub use inventory::{check_inventory, InventorySnapshot, NotReady, Readiness};
pub use memory::MemoryStore;
pub use orchestrator::{
    PlanDetail, PlanOrchestrator, PlanOutcome, PlanRequest, MAX_PROMPT_LENGTH, MAX_TITLE_LENGTH,
    PARTY_SIZE_RANGE, TIME_BUDGET_RANGE,
};
pub use sanitize::strip_code_fences;
pub use slim::{build_create_prompt, build_edit_prompt};
pub use store::{InventoryStore, PlanStore};
