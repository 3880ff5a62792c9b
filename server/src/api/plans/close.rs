use super::{planning_error_response, PlanResponse};
use crate::api::ErrorResponse;
use crate::auth::AuthUser;
use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use mealwise_core::PlanOrchestrator;
use std::sync::Arc;
use uuid::Uuid;

#[utoipa::path(
    post,
    path = "/api/plans/{id}/close",
    tag = "plans",
    params(
        ("id" = Uuid, Path, description = "Plan ID")
    ),
    responses(
        (status = 200, description = "Plan closed", body = PlanResponse),
        (status = 400, description = "Plan is not finished", body = ErrorResponse),
        (status = 401, description = "Unauthorized", body = ErrorResponse),
        (status = 403, description = "Plan belongs to another user", body = ErrorResponse),
        (status = 404, description = "Plan not found", body = ErrorResponse)
    ),
    security(("bearer_auth" = []))
)]
pub async fn close_plan(
    AuthUser(owner): AuthUser,
    State(planner): State<Arc<PlanOrchestrator>>,
    Path(id): Path<Uuid>,
) -> impl IntoResponse {
    match planner.close_plan(&owner, id).await {
        Ok(plan) => (StatusCode::OK, Json(PlanResponse::from(plan))).into_response(),
        Err(e) => planning_error_response(e),
    }
}
