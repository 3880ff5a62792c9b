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
use serde::Deserialize;
use std::sync::Arc;
use utoipa::ToSchema;
use uuid::Uuid;

#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct EditPlanRequest {
    /// What to change, e.g. "make it vegetarian"
    pub instruction: String,
}

#[utoipa::path(
    post,
    path = "/api/plans/{id}/edit",
    tag = "plans",
    params(
        ("id" = Uuid, Path, description = "Plan ID")
    ),
    request_body = EditPlanRequest,
    responses(
        (status = 202, description = "Plan set to waiting, revised recipes are generating", body = PlanResponse),
        (status = 400, description = "Empty instruction or plan is not in the success state", body = ErrorResponse),
        (status = 401, description = "Unauthorized", body = ErrorResponse),
        (status = 403, description = "Plan belongs to another user", body = ErrorResponse),
        (status = 404, description = "Plan not found", body = ErrorResponse)
    ),
    security(("bearer_auth" = []))
)]
pub async fn edit_plan(
    AuthUser(owner): AuthUser,
    State(planner): State<Arc<PlanOrchestrator>>,
    Path(id): Path<Uuid>,
    Json(request): Json<EditPlanRequest>,
) -> impl IntoResponse {
    match planner.edit_plan(&owner, id, &request.instruction).await {
        Ok(plan) => (StatusCode::ACCEPTED, Json(PlanResponse::from(plan))).into_response(),
        Err(e) => planning_error_response(e),
    }
}
