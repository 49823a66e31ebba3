//! User route handlers.

use axum::Json;
use axum::extract::{Path, State};
use perche_core::UserId;
use serde::Serialize;

use crate::db::RepositoryError;
use crate::db::users::UserRepository;
use crate::error::{AppError, Result};
use crate::models::User;
use crate::state::AppState;

/// User representation returned by the user endpoints.
#[derive(Debug, Serialize)]
pub struct UserResponse {
    pub id: UserId,
    pub username: String,
    pub email: String,
    pub is_active: bool,
    pub has_submitted_website: bool,
}

impl From<User> for UserResponse {
    fn from(user: User) -> Self {
        Self {
            id: user.id,
            username: user.username,
            email: user.email.into_inner(),
            is_active: user.is_active,
            has_submitted_website: user.has_submitted_website,
        }
    }
}

/// Fetch a user by ID.
pub async fn get_user(
    State(state): State<AppState>,
    Path(user_id): Path<i64>,
) -> Result<Json<UserResponse>> {
    let user = UserRepository::new(state.pool())
        .get_by_id(UserId::new(user_id))
        .await?
        .ok_or_else(|| AppError::NotFound("User not found".to_string()))?;

    Ok(Json(user.into()))
}

/// Set the user's wizard-submission flag.
///
/// Takes no body; the flag only ever transitions to `true`.
pub async fn update_website_submission(
    State(state): State<AppState>,
    Path(user_id): Path<i64>,
) -> Result<Json<UserResponse>> {
    let user = UserRepository::new(state.pool())
        .mark_website_submitted(UserId::new(user_id))
        .await
        .map_err(|e| match e {
            RepositoryError::NotFound => AppError::NotFound("User not found".to_string()),
            other => AppError::Database(other),
        })?;

    Ok(Json(user.into()))
}
