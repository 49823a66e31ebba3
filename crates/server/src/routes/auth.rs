//! Authentication route handlers.

use axum::Json;
use axum::extract::State;
use axum::http::{HeaderMap, header};
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};

use crate::error::Result;
use crate::middleware::bearer_token;
use crate::models::User;
use crate::services::auth::TokenPair;
use crate::state::AppState;

// =============================================================================
// Request / Response Types
// =============================================================================

/// Sign-in request body.
#[derive(Debug, Deserialize)]
pub struct SigninRequest {
    pub username: String,
    pub password: String,
}

/// Sign-up request body.
#[derive(Debug, Deserialize)]
pub struct SignupRequest {
    pub username: String,
    pub email: String,
    pub password: String,
}

/// Token payload returned by signin and signup.
#[derive(Debug, Serialize)]
pub struct TokenResponse {
    pub access_token: String,
    pub refresh_token: String,
    pub token_type: &'static str,
    pub user: UserPayload,
}

/// User summary embedded in the token payload.
#[derive(Debug, Serialize)]
pub struct UserPayload {
    /// Stringified ID, as the frontend expects.
    pub id: String,
    pub username: String,
    pub email: String,
    pub permissions: Vec<String>,
    pub has_submitted_website: bool,
}

impl From<&User> for UserPayload {
    fn from(user: &User) -> Self {
        Self {
            id: user.id.to_string(),
            username: user.username.clone(),
            email: user.email.to_string(),
            permissions: Vec::new(),
            has_submitted_website: user.has_submitted_website,
        }
    }
}

fn token_response(pair: TokenPair, user: &User) -> TokenResponse {
    TokenResponse {
        access_token: pair.access_token,
        refresh_token: pair.refresh_token,
        token_type: "bearer",
        user: UserPayload::from(user),
    }
}

// =============================================================================
// Handlers
// =============================================================================

/// Sign in with username and password.
///
/// Returns 401 with `WWW-Authenticate: Bearer` for wrong credentials; no
/// tokens are issued on failure.
pub async fn signin(
    State(state): State<AppState>,
    Json(req): Json<SigninRequest>,
) -> Result<Json<TokenResponse>> {
    let auth = state.auth();
    let user = auth.login(&req.username, &req.password).await?;
    let pair = auth.issue_tokens(user.id).await?;

    tracing::info!(user_id = %user.id, "user signed in");
    Ok(Json(token_response(pair, &user)))
}

/// Register a new account.
///
/// A duplicate username is a 400 and creates no row.
pub async fn signup(
    State(state): State<AppState>,
    Json(req): Json<SignupRequest>,
) -> Result<Json<TokenResponse>> {
    let auth = state.auth();
    let user = auth.register(&req.username, &req.email, &req.password).await?;
    let pair = auth.issue_tokens(user.id).await?;

    tracing::info!(user_id = %user.id, "user registered");
    Ok(Json(token_response(pair, &user)))
}

/// Log out, revoking the presented token if any.
///
/// Always succeeds so clients can clear local state unconditionally.
pub async fn logout(State(state): State<AppState>, headers: HeaderMap) -> Json<Value> {
    let token = headers
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(bearer_token);

    if let Some(token) = token
        && let Err(e) = state.auth().revoke(&token).await
    {
        tracing::warn!(error = %e, "failed to revoke token on logout");
    }

    Json(json!({ "msg": "Successfully logged out" }))
}
