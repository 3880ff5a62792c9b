use crate::api::plans::planning_error_response;
use crate::api::ErrorResponse;
use crate::auth::AuthUser;
use crate::AppState;
use axum::{extract::State, http::StatusCode, response::IntoResponse, routing::get, Json, Router};
use chrono::{DateTime, Utc};
use mealwise_core::PlanOrchestrator;
use serde::Serialize;
use std::sync::Arc;
use utoipa::{OpenApi, ToSchema};

/// Returns the router for /api/prompts endpoints (mounted at /api/prompts)
pub fn router() -> Router<AppState> {
    Router::new().route("/", get(list_prompts))
}

#[derive(OpenApi)]
#[openapi(
    paths(list_prompts),
    components(schemas(PromptItem, PromptListResponse))
)]
pub struct ApiDoc;

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct PromptItem {
    pub text: String,
    pub frequency: i32,
    pub last_used_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct PromptListResponse {
    pub prompts: Vec<PromptItem>,
}

#[utoipa::path(
    get,
    path = "/api/prompts",
    tag = "prompts",
    responses(
        (status = 200, description = "The caller's previously used prompts, most used first", body = PromptListResponse),
        (status = 401, description = "Unauthorized", body = ErrorResponse)
    ),
    security(("bearer_auth" = []))
)]
pub async fn list_prompts(
    AuthUser(owner): AuthUser,
    State(planner): State<Arc<PlanOrchestrator>>,
) -> impl IntoResponse {
    match planner.list_prompts(&owner).await {
        Ok(prompts) => (
            StatusCode::OK,
            Json(PromptListResponse {
                prompts: prompts
                    .into_iter()
                    .map(|p| PromptItem {
                        text: p.text,
                        frequency: p.frequency,
                        last_used_at: p.updated_at,
                    })
                    .collect(),
            }),
        )
            .into_response(),
        Err(e) => planning_error_response(e),
    }
}
