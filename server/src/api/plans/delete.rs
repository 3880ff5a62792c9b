use super::planning_error_response;
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
pub struct DeletePlanResponse {
    pub deleted_recipes: usize,
}

#[utoipa::path(
    delete,
    path = "/api/plans/{id}",
    tag = "plans",
    params(
        ("id" = Uuid, Path, description = "Plan ID")
    ),
    responses(
        (status = 200, description = "Plan and its recipes deleted", body = DeletePlanResponse),
        (status = 400, description = "Plan is still generating", body = ErrorResponse),
        (status = 401, description = "Unauthorized", body = ErrorResponse),
        (status = 403, description = "Plan belongs to another user", body = ErrorResponse),
        (status = 404, description = "Plan not found", body = ErrorResponse)
    ),
    security(("bearer_auth" = []))
)]
pub async fn delete_plan(
    AuthUser(owner): AuthUser,
    State(planner): State<Arc<PlanOrchestrator>>,
    Path(id): Path<Uuid>,
) -> impl IntoResponse {
    match planner.delete_plan(&owner, id).await {
        Ok(deleted_recipes) => {
            (StatusCode::OK, Json(DeletePlanResponse { deleted_recipes })).into_response()
        }
        Err(e) => planning_error_response(e),
    }
}
