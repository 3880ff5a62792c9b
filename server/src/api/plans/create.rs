use super::{not_ready_response, planning_error_response, NotReadyResponse, PlanResponse};
use crate::api::ErrorResponse;
use crate::auth::AuthUser;
use axum::{extract::State, http::StatusCode, response::IntoResponse, Json};
use mealwise_core::{PlanOrchestrator, PlanOutcome, PlanRequest};
use serde::Deserialize;
use std::sync::Arc;
use utoipa::ToSchema;

#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct CreatePlanRequest {
    pub title: String,
    #[serde(default)]
    pub tags: Vec<String>,
    pub prompt: Option<String>,
    /// One of Breakfast, Brunch, Lunch, High Tea, Dinner, Night Snack
    pub meal_type: String,
    /// 1 to 10
    pub party_size: i32,
    /// 1 to 600
    pub time_budget_minutes: i32,
}

impl From<CreatePlanRequest> for PlanRequest {
    fn from(request: CreatePlanRequest) -> Self {
        PlanRequest {
            title: request.title,
            tags: request.tags,
            prompt: request.prompt,
            meal_type: request.meal_type,
            party_size: request.party_size,
            time_budget_minutes: request.time_budget_minutes,
        }
    }
}

#[utoipa::path(
    post,
    path = "/api/plans",
    tag = "plans",
    request_body = CreatePlanRequest,
    responses(
        (status = 201, description = "Plan created, recipes are generating", body = PlanResponse),
        (status = 200, description = "Inventory not ready, no plan created", body = NotReadyResponse),
        (status = 400, description = "Invalid request", body = ErrorResponse),
        (status = 401, description = "Unauthorized", body = ErrorResponse)
    ),
    security(("bearer_auth" = []))
)]
pub async fn create_plan(
    AuthUser(owner): AuthUser,
    State(planner): State<Arc<PlanOrchestrator>>,
    Json(request): Json<CreatePlanRequest>,
) -> impl IntoResponse {
    match planner.submit(&owner, request.into()).await {
        Ok(PlanOutcome::Scheduled(plan)) => {
            (StatusCode::CREATED, Json(PlanResponse::from(plan))).into_response()
        }
        Ok(PlanOutcome::NotReady(not_ready)) => not_ready_response(not_ready),
        Err(e) => planning_error_response(e),
    }
}
