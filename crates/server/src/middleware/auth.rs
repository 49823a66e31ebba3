//! Bearer-token authentication extractor.
//!
//! Provides an extractor for requiring an authenticated user in route
//! handlers.

use axum::extract::FromRequestParts;
use axum::http::{header, request::Parts};

use crate::error::AppError;
use crate::models::User;
use crate::state::AppState;

/// Extractor that requires an authenticated user.
///
/// Resolves the `Authorization: Bearer <token>` header against the token
/// store; rejects with 401 (and `WWW-Authenticate: Bearer`) otherwise.
///
/// # Example
///
/// ```rust,ignore
/// async fn protected_handler(
///     CurrentUser(user): CurrentUser,
/// ) -> impl IntoResponse {
///     format!("Hello, {}!", user.username)
/// }
/// ```
pub struct CurrentUser(pub User);

impl FromRequestParts<AppState> for CurrentUser {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let token = bearer_token_from_parts(parts)
            .ok_or_else(|| AppError::Unauthorized("Not authenticated".to_string()))?;

        let user = state
            .auth()
            .authenticate(&token)
            .await?
            .ok_or_else(|| AppError::Unauthorized("Could not validate credentials".to_string()))?;

        Ok(Self(user))
    }
}

/// Extract the bearer token from an `Authorization` header value.
#[must_use]
pub fn bearer_token(header_value: &str) -> Option<String> {
    header_value
        .strip_prefix("Bearer ")
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .map(String::from)
}

fn bearer_token_from_parts(parts: &Parts) -> Option<String> {
    parts
        .headers
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(bearer_token)
}
