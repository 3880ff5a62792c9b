use super::{planning_error_response, PlanResponse};
use crate::api::ErrorResponse;
use crate::auth::AuthUser;
use axum::{extract::State, http::StatusCode, response::IntoResponse, Json};
use mealwise_core::PlanOrchestrator;
use serde::Serialize;
use std::sync::Arc;
use utoipa::ToSchema;

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct PlanListResponse {
    pub plans: Vec<PlanResponse>,
}

#[utoipa::path(
    get,
    path = "/api/plans",
    tag = "plans",
    responses(
        (status = 200, description = "The caller's plans, oldest first", body = PlanListResponse),
        (status = 401, description = "Unauthorized", body = ErrorResponse)
    ),
    security(("bearer_auth" = []))
)]
pub async fn list_plans(
    AuthUser(owner): AuthUser,
    State(planner): State<Arc<PlanOrchestrator>>,
) -> impl IntoResponse {
    match planner.list_plans(&owner).await {
        Ok(plans) => (
            StatusCode::OK,
            Json(PlanListResponse {
                plans: plans.into_iter().map(PlanResponse::from).collect(),
            }),
        )
            .into_response(),
        Err(e) => planning_error_response(e),
    }
}
