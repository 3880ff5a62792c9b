//! Identity boundary: every authenticated handler receives an [`Owner`]
//! resolved from the request's bearer token, and nothing else about the
//! caller.

use crate::api::ErrorResponse;
use crate::db::DbPool;
use axum::{
    extract::{FromRef, FromRequestParts},
    http::{header, request::Parts, HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use mealwise_core::Owner;
use std::sync::Arc;

use super::db::find_session_owner;

/// The verified owner behind the request's bearer token.
///
/// ```ignore
/// async fn my_handler(AuthUser(owner): AuthUser) -> impl IntoResponse {
///     // owner.id scopes every plan lookup
/// }
/// ```
pub struct AuthUser(pub Owner);

#[derive(Debug, thiserror::Error)]
pub enum AuthError {
    #[error("Missing Authorization header")]
    MissingHeader,

    #[error("Authorization header must be 'Bearer <token>'")]
    NotBearer,

    #[error("Invalid or expired token")]
    UnknownToken,

    #[error("Identity lookup failed: {0}")]
    Lookup(String),
}

impl AuthError {
    fn status(&self) -> StatusCode {
        match self {
            AuthError::Lookup(_) => StatusCode::SERVICE_UNAVAILABLE,
            _ => StatusCode::UNAUTHORIZED,
        }
    }
}

impl IntoResponse for AuthError {
    fn into_response(self) -> Response {
        let error = match &self {
            AuthError::Lookup(e) => {
                tracing::error!("Identity lookup failed: {}", e);
                "Identity service unavailable".to_string()
            }
            other => other.to_string(),
        };

        (self.status(), Json(ErrorResponse { error })).into_response()
    }
}

/// The credential from an `Authorization: Bearer <token>` header. The scheme
/// is matched case-insensitively.
fn bearer_token(headers: &HeaderMap) -> Result<&str, AuthError> {
    let value = headers
        .get(header::AUTHORIZATION)
        .ok_or(AuthError::MissingHeader)?
        .to_str()
        .map_err(|_| AuthError::NotBearer)?;

    let (scheme, token) = value.split_once(' ').ok_or(AuthError::NotBearer)?;
    let token = token.trim();
    if !scheme.eq_ignore_ascii_case("bearer") || token.is_empty() {
        return Err(AuthError::NotBearer);
    }
    Ok(token)
}

impl<S> FromRequestParts<S> for AuthUser
where
    S: Send + Sync,
    Arc<DbPool>: FromRef<S>,
{
    type Rejection = AuthError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let token = bearer_token(&parts.headers)?.to_string();
        let pool = Arc::<DbPool>::from_ref(state);

        let owner = tokio::task::spawn_blocking(move || {
            let mut conn = pool.get().map_err(|e| AuthError::Lookup(e.to_string()))?;
            find_session_owner(&mut conn, &token).map_err(|e| AuthError::Lookup(e.to_string()))
        })
        .await
        .map_err(|e| AuthError::Lookup(e.to_string()))??
        .ok_or(AuthError::UnknownToken)?;

        Ok(AuthUser(owner))
    }
}
