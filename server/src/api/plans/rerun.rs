use super::{not_ready_response, planning_error_response, NotReadyResponse, PlanResponse};
use crate::api::ErrorResponse;
use crate::auth::AuthUser;
use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use mealwise_core::{PlanOrchestrator, PlanOutcome};
use std::sync::Arc;
use uuid::Uuid;

#[utoipa::path(
    post,
    path = "/api/plans/{id}/rerun",
    tag = "plans",
    params(
        ("id" = Uuid, Path, description = "Plan ID")
    ),
    responses(
        (status = 202, description = "Plan reset to waiting, recipes are generating", body = PlanResponse),
        (status = 200, description = "Inventory not ready, plan unchanged", body = NotReadyResponse),
        (status = 400, description = "Plan is not in the fail state", body = ErrorResponse),
        (status = 401, description = "Unauthorized", body = ErrorResponse),
        (status = 403, description = "Plan belongs to another user", body = ErrorResponse),
        (status = 404, description = "Plan not found", body = ErrorResponse)
    ),
    security(("bearer_auth" = []))
)]
pub async fn rerun_plan(
    AuthUser(owner): AuthUser,
    State(planner): State<Arc<PlanOrchestrator>>,
    Path(id): Path<Uuid>,
) -> impl IntoResponse {
    match planner.rerun(&owner, id).await {
        Ok(PlanOutcome::Scheduled(plan)) => {
            (StatusCode::ACCEPTED, Json(PlanResponse::from(plan))).into_response()
        }
        Ok(PlanOutcome::NotReady(not_ready)) => not_ready_response(not_ready),
        Err(e) => planning_error_response(e),
    }
}
