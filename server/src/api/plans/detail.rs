use super::{planning_error_response, PlanResponse, RecipeResponse};
use crate::api::ErrorResponse;
use crate::auth::AuthUser;
use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use mealwise_core::PlanOrchestrator;
use serde::Serialize;
use std::sync::Arc;
use utoipa::ToSchema;
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct PlanDetailResponse {
    pub plan: PlanResponse,
    pub recipes: Vec<RecipeResponse>,
}

#[utoipa::path(
    get,
    path = "/api/plans/{id}/detail",
    tag = "plans",
    params(
        ("id" = Uuid, Path, description = "Plan ID")
    ),
    responses(
        (status = 200, description = "Plan with its recipes", body = PlanDetailResponse),
        (status = 401, description = "Unauthorized", body = ErrorResponse),
        (status = 403, description = "Plan belongs to another user", body = ErrorResponse),
        (status = 404, description = "Plan not found", body = ErrorResponse)
    ),
    security(("bearer_auth" = []))
)]
pub async fn get_plan_detail(
    AuthUser(owner): AuthUser,
    State(planner): State<Arc<PlanOrchestrator>>,
    Path(id): Path<Uuid>,
) -> impl IntoResponse {
    match planner.get_plan_detail(&owner, id).await {
        Ok(detail) => (
            StatusCode::OK,
            Json(PlanDetailResponse {
                plan: detail.plan.into(),
                recipes: detail.recipes.into_iter().map(RecipeResponse::from).collect(),
            }),
        )
            .into_response(),
        Err(e) => planning_error_response(e),
    }
}
