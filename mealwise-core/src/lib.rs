pub mod config;
pub mod error;
pub mod llm;
pub mod planning;
pub mod prompts;
pub mod types;

pub use config::{ConfigError, LlmConfig, PlannerConfig, ProviderKind};
pub use error::{DecodeError, PlanningError, StoreError};
pub use llm::{create_provider, FakeProvider, LlmError, LlmProvider, RecipeGateway};
pub use planning::{
    InventoryStore, MemoryStore, NotReady, PlanDetail, PlanOrchestrator, PlanOutcome,
    PlanRequest, PlanStore,
};
pub use types::{
    GenerationLogEntry, Kitchenware, MealType, NewGenerationLogEntry, NewPlan, NewRecipe, Owner,
    PantryIngredient, Plan, PlanStatus, PromptFrequency, Recipe, RecipeIngredient, RecipeStep,
    SourceType,
};
