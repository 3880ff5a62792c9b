mod api;
mod auth;
mod db;
mod models;
mod schema;
mod telemetry;

use axum::extract::{FromRef, MatchedPath};
use axum::http::Request;
use axum::Router;
use mealwise_core::{create_provider, LlmConfig, PlanOrchestrator, PlannerConfig, RecipeGateway};
use std::env;
use std::sync::Arc;
use tower_http::trace::TraceLayer;
use tracing::Span;
use utoipa_swagger_ui::SwaggerUi;

const DEFAULT_BIND_ADDR: &str = "0.0.0.0:3000";

/// Application state shared across all handlers
#[derive(Clone)]
pub struct AppState {
    pub pool: Arc<db::DbPool>,
    pub planner: Arc<PlanOrchestrator>,
}

impl FromRef<AppState> for Arc<db::DbPool> {
    fn from_ref(state: &AppState) -> Self {
        state.pool.clone()
    }
}

impl FromRef<AppState> for Arc<PlanOrchestrator> {
    fn from_ref(state: &AppState) -> Self {
        state.planner.clone()
    }
}

/// `--issue-token <email> [name]` creates the user if needed and prints a
/// bearer token for them.
fn issue_token(pool: &db::DbPool, args: &[String]) {
    let Some(email) = args.first() else {
        eprintln!("usage: mealwise-server --issue-token <email> [name]");
        std::process::exit(2);
    };
    let name = args.get(1).map(String::as_str).unwrap_or(email.as_str());

    let mut conn = pool.get().expect("Failed to get DB connection");
    match auth::issue_session(&mut conn, email, name) {
        Ok(token) => println!("{}", token),
        Err(e) => {
            eprintln!("Failed to issue token: {}", e);
            std::process::exit(1);
        }
    }
}

#[tokio::main]
async fn main() {
    let args: Vec<String> = env::args().collect();

    // Check for --openapi flag to dump spec and exit
    if args.iter().any(|arg| arg == "--openapi") {
        let spec = api::openapi()
            .to_pretty_json()
            .expect("Failed to serialize OpenAPI spec");
        println!("{}", spec);
        return;
    }

    telemetry::init_telemetry();

    let database_url = env::var("DATABASE_URL").expect("DATABASE_URL must be set");
    let pool = Arc::new(db::create_pool(&database_url));

    if let Some(pos) = args.iter().position(|arg| arg == "--issue-token") {
        issue_token(&pool, &args[pos + 1..]);
        return;
    }

    let llm_config = LlmConfig::from_env().expect("Invalid LLM configuration");
    let planner_config = PlannerConfig::from_env().expect("Invalid planner configuration");
    tracing::info!(
        provider = ?llm_config.provider,
        model = %llm_config.model,
        max_attempts = planner_config.max_attempts,
        "Recipe generation configured"
    );

    let store = Arc::new(db::PgStore::new(pool.clone()));
    let planner = Arc::new(PlanOrchestrator::new(
        store.clone(),
        store,
        RecipeGateway::new(create_provider(&llm_config)),
        planner_config,
    ));

    // Loops from a previous process are gone; their plans would stay waiting.
    planner
        .recover_stranded_plans()
        .await
        .expect("Failed to recover plans left waiting");

    let state = AppState { pool, planner };

    let swagger_ui = SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", api::openapi());

    let app = Router::new()
        .nest("/api/plans", api::plans::router())
        .nest("/api/prompts", api::prompts::router())
        .merge(swagger_ui)
        .with_state(state)
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(|request: &Request<_>| {
                    let matched_path = request
                        .extensions()
                        .get::<MatchedPath>()
                        .map(MatchedPath::as_str)
                        .unwrap_or(request.uri().path());

                    tracing::info_span!(
                        "http_request",
                        method = %request.method(),
                        path = %matched_path,
                    )
                })
                .on_request(|_request: &Request<_>, _span: &Span| {})
                .on_response(
                    |response: &axum::http::Response<_>,
                     latency: std::time::Duration,
                     _span: &Span| {
                        let status = response.status().as_u16();
                        if status >= 500 {
                            tracing::error!(
                                status = %status,
                                latency_ms = %latency.as_millis(),
                                "request failed with server error"
                            );
                        } else {
                            tracing::info!(
                                status = %status,
                                latency_ms = %latency.as_millis(),
                                "request completed"
                            );
                        }
                    },
                )
                .on_failure(
                    |error: tower_http::classify::ServerErrorsFailureClass,
                     latency: std::time::Duration,
                     _span: &Span| {
                        tracing::error!(
                            error = %error,
                            latency_ms = %latency.as_millis(),
                            "request failed"
                        );
                    },
                ),
        );

    let bind_addr = env::var("MEALWISE_BIND_ADDR").unwrap_or_else(|_| DEFAULT_BIND_ADDR.to_string());
    let listener = tokio::net::TcpListener::bind(&bind_addr)
        .await
        .expect("Failed to bind listener");

    tracing::info!("Server listening on {}", bind_addr);
    tracing::info!("Swagger UI available at /swagger-ui/");

    axum::serve(listener, app).await.expect("Server error");
}
