pub mod close;
pub mod create;
pub mod delete;
pub mod detail;
pub mod edit;
pub mod get;
pub mod list;
pub mod rerun;

use crate::api::ErrorResponse;
use crate::AppState;
use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use chrono::{DateTime, Utc};
use mealwise_core::{NotReady, Plan, PlanningError, Recipe};
use serde::Serialize;
use utoipa::{OpenApi, ToSchema};
use uuid::Uuid;

/// Returns the router for /api/plans endpoints (mounted at /api/plans)
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(list::list_plans).post(create::create_plan))
        .route("/{id}", get(get::get_plan).delete(delete::delete_plan))
        .route("/{id}/detail", get(detail::get_plan_detail))
        .route("/{id}/rerun", post(rerun::rerun_plan))
        .route("/{id}/edit", post(edit::edit_plan))
        .route("/{id}/close", post(close::close_plan))
}

#[derive(OpenApi)]
#[openapi(
    paths(
        list::list_plans,
        create::create_plan,
        get::get_plan,
        detail::get_plan_detail,
        rerun::rerun_plan,
        edit::edit_plan,
        close::close_plan,
        delete::delete_plan
    ),
    components(schemas(
        PlanResponse,
        RecipeResponse,
        RecipeIngredientResponse,
        RecipeStepResponse,
        NotReadyResponse,
        list::PlanListResponse,
        create::CreatePlanRequest,
        detail::PlanDetailResponse,
        edit::EditPlanRequest,
        delete::DeletePlanResponse,
    ))
)]
pub struct ApiDoc;

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct PlanResponse {
    pub id: Uuid,
    pub title: String,
    pub tags: Vec<String>,
    pub prompt: Option<String>,
    /// One of Breakfast, Brunch, Lunch, High Tea, Dinner, Night Snack
    pub meal_type: String,
    pub party_size: i32,
    pub time_budget_minutes: i32,
    /// One of waiting, success, fail, closed
    pub status: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<Plan> for PlanResponse {
    fn from(plan: Plan) -> Self {
        PlanResponse {
            id: plan.id,
            title: plan.title,
            tags: plan.tags,
            prompt: plan.prompt,
            meal_type: plan.meal_type.as_str().to_string(),
            party_size: plan.party_size,
            time_budget_minutes: plan.time_budget_minutes,
            status: plan.status.as_str().to_string(),
            created_at: plan.created_at,
            updated_at: plan.updated_at,
        }
    }
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct RecipeIngredientResponse {
    pub name: String,
    pub amount: String,
    pub note: String,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct RecipeStepResponse {
    pub order: i32,
    pub text: String,
    pub duration_minutes: Option<f64>,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct RecipeResponse {
    pub id: Uuid,
    pub plan_id: Uuid,
    pub title: String,
    pub description: String,
    pub image_url: String,
    pub servings: i32,
    pub total_time_minutes: i32,
    pub tags: Vec<String>,
    /// One of manual, ai, plan
    pub source_type: String,
    pub ingredients: Vec<RecipeIngredientResponse>,
    pub steps: Vec<RecipeStepResponse>,
    pub created_at: DateTime<Utc>,
}

impl From<Recipe> for RecipeResponse {
    fn from(recipe: Recipe) -> Self {
        RecipeResponse {
            id: recipe.id,
            plan_id: recipe.plan_id,
            title: recipe.title,
            description: recipe.description,
            image_url: recipe.image_url,
            servings: recipe.servings,
            total_time_minutes: recipe.total_time_minutes,
            tags: recipe.tags,
            source_type: recipe.source_type.as_str().to_string(),
            ingredients: recipe
                .ingredients
                .into_iter()
                .map(|i| RecipeIngredientResponse {
                    name: i.name,
                    amount: i.amount,
                    note: i.note,
                })
                .collect(),
            steps: recipe
                .steps
                .into_iter()
                .map(|s| RecipeStepResponse {
                    order: s.order,
                    text: s.text,
                    duration_minutes: s.duration_minutes,
                })
                .collect(),
            created_at: recipe.created_at,
        }
    }
}

/// Returned instead of a plan when the owner's inventory cannot support
/// planning yet. This is a normal outcome, not an error.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct NotReadyResponse {
    pub message: String,
    pub missing_ingredients: bool,
    pub missing_kitchenware: bool,
}

impl From<NotReady> for NotReadyResponse {
    fn from(not_ready: NotReady) -> Self {
        NotReadyResponse {
            message: not_ready.message,
            missing_ingredients: not_ready.missing_ingredients,
            missing_kitchenware: not_ready.missing_kitchenware,
        }
    }
}

pub fn not_ready_response(not_ready: NotReady) -> Response {
    (StatusCode::OK, Json(NotReadyResponse::from(not_ready))).into_response()
}

/// Map a synchronous planning failure to its HTTP response.
pub fn planning_error_response(err: PlanningError) -> Response {
    let (status, message) = match err {
        PlanningError::InvalidRequest(message) => (StatusCode::BAD_REQUEST, message),
        PlanningError::Conflict(message) => (StatusCode::BAD_REQUEST, message),
        PlanningError::Forbidden => (
            StatusCode::FORBIDDEN,
            "You do not have access to this plan".to_string(),
        ),
        PlanningError::NotFound => (StatusCode::NOT_FOUND, "Plan not found".to_string()),
        PlanningError::Store(e) => {
            tracing::error!("Plan storage failure: {}", e);
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                "Internal server error".to_string(),
            )
        }
    };

    (status, Json(ErrorResponse { error: message })).into_response()
}

#[cfg(test)]
mod tests {
    use super::*;
    use mealwise_core::StoreError;

    #[test]
    fn test_error_status_codes() {
        let cases = [
            (
                PlanningError::InvalidRequest("bad".to_string()),
                StatusCode::BAD_REQUEST,
            ),
            (
                PlanningError::Conflict("busy".to_string()),
                StatusCode::BAD_REQUEST,
            ),
            (PlanningError::Forbidden, StatusCode::FORBIDDEN),
            (PlanningError::NotFound, StatusCode::NOT_FOUND),
            (
                PlanningError::Store(StoreError::Pool("timeout".to_string())),
                StatusCode::INTERNAL_SERVER_ERROR,
            ),
        ];

        for (err, expected) in cases {
            assert_eq!(planning_error_response(err).status(), expected);
        }
    }

    #[test]
    fn test_not_ready_is_ok() {
        let response = not_ready_response(NotReady {
            missing_ingredients: true,
            missing_kitchenware: false,
            message: "Add an ingredient".to_string(),
        });
        assert_eq!(response.status(), StatusCode::OK);
    }
}
