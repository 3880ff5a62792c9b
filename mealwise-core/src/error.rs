use thiserror::Error;

#[derive(Error, Debug)]
pub enum StoreError {
    #[error("Database error: {0}")]
    Database(String),

    #[error("Connection pool error: {0}")]
    Pool(String),

    #[error("Corrupt record: {0}")]
    Corrupt(String),
}

/// Why a block of model output was rejected.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum DecodeError {
    #[error("Response is not valid JSON: {0}")]
    InvalidJson(String),

    #[error("Response is not a JSON array")]
    NotAnArray,

    #[error("Response contains no recipes")]
    EmptyList,

    #[error("Recipe {index} does not match the recipe schema: {message}")]
    Schema { index: usize, message: String },

    #[error("Recipe {index} has an empty title")]
    EmptyTitle { index: usize },

    #[error("Recipe {index} title is longer than {max} characters")]
    TitleTooLong { index: usize, max: usize },

    #[error("Recipe {index} ingredient {ingredient} has an empty name")]
    EmptyIngredientName { index: usize, ingredient: usize },

    #[error("Recipe {index} has no steps")]
    NoSteps { index: usize },

    #[error("Recipe {index} step {step} has an empty text")]
    EmptyStepText { index: usize, step: usize },

    #[error("Recipe {index} step {step} has a non-positive order {order}")]
    InvalidStepOrder { index: usize, step: usize, order: i64 },
}

/// Outcome of a synchronous planning operation that did not succeed.
#[derive(Error, Debug)]
pub enum PlanningError {
    #[error("{0}")]
    InvalidRequest(String),

    #[error("Plan not found")]
    NotFound,

    #[error("Forbidden")]
    Forbidden,

    #[error("{0}")]
    Conflict(String),

    #[error(transparent)]
    Store(#[from] StoreError),
}
