//! Unified error handling with Sentry integration.
//!
//! Provides a unified `AppError` type that captures server-side errors to
//! Sentry before responding to the client. All route handlers should return
//! `Result<T, AppError>`. Responses carry a JSON `{"detail": ...}` body;
//! internal error text is never interpolated into 5xx bodies.

use axum::Json;
use axum::http::{StatusCode, header};
use axum::response::{IntoResponse, Response};
use serde_json::json;
use thiserror::Error;

use crate::db::RepositoryError;
use crate::services::auth::AuthError;
use crate::services::catalog::CatalogError;
use crate::services::connector::ConnectorError;

/// Application-level error type for the admin API.
#[derive(Debug, Error)]
pub enum AppError {
    /// Database operation failed.
    #[error("Database error: {0}")]
    Database(#[from] RepositoryError),

    /// Authentication operation failed.
    #[error("Auth error: {0}")]
    Auth(#[from] AuthError),

    /// Store-connection validation failed.
    #[error("Connector error: {0}")]
    Connector(#[from] ConnectorError),

    /// Catalog extraction failed.
    #[error("Catalog error: {0}")]
    Catalog(#[from] CatalogError),

    /// Resource not found.
    #[error("Not found: {0}")]
    NotFound(String),

    /// User is not authenticated.
    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    /// Bad request from client.
    #[error("Bad request: {0}")]
    BadRequest(String),

    /// Internal server error.
    #[error("Internal error: {0}")]
    Internal(String),
}

impl AppError {
    const fn status(&self) -> StatusCode {
        match self {
            Self::Database(_) | Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::Auth(err) => match err {
                AuthError::InvalidCredentials => StatusCode::UNAUTHORIZED,
                AuthError::UserAlreadyExists
                | AuthError::InvalidEmail(_)
                | AuthError::WeakPassword(_) => StatusCode::BAD_REQUEST,
                AuthError::Repository(_) | AuthError::Hash(_) => StatusCode::INTERNAL_SERVER_ERROR,
            },
            Self::Connector(err) => match err {
                ConnectorError::Request(_)
                | ConnectorError::UnsupportedPlatform(_)
                | ConnectorError::MissingCredentials
                | ConnectorError::NotAShopifyStore
                | ConnectorError::Unreachable
                | ConnectorError::InvalidCredentials => StatusCode::BAD_REQUEST,
            },
            Self::Catalog(err) => match err {
                CatalogError::UnsupportedPlatform(_) | CatalogError::UpstreamStatus(_) => {
                    StatusCode::BAD_REQUEST
                }
                CatalogError::NoProducts => StatusCode::NOT_FOUND,
                CatalogError::Request(_) | CatalogError::InvalidResponse(_) => {
                    StatusCode::INTERNAL_SERVER_ERROR
                }
            },
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            Self::BadRequest(_) => StatusCode::BAD_REQUEST,
        }
    }

    /// Client-facing detail string. Internal error text stays out of 5xx
    /// responses.
    fn detail(&self) -> String {
        match self {
            Self::Database(_) | Self::Internal(_) => "Internal server error".to_string(),
            Self::Auth(err) => match err {
                AuthError::InvalidCredentials => "Incorrect username or password".to_string(),
                AuthError::UserAlreadyExists => "Username already registered".to_string(),
                AuthError::InvalidEmail(e) => e.to_string(),
                AuthError::WeakPassword(msg) => msg.clone(),
                AuthError::Repository(_) | AuthError::Hash(_) => {
                    "Internal server error".to_string()
                }
            },
            Self::Connector(err) => err.to_string(),
            Self::Catalog(err) => match err {
                CatalogError::Request(_) | CatalogError::InvalidResponse(_) => {
                    "Failed to extract data".to_string()
                }
                other => other.to_string(),
            },
            Self::NotFound(msg) | Self::Unauthorized(msg) | Self::BadRequest(msg) => msg.clone(),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();

        // Capture server errors to Sentry
        if status.is_server_error() {
            let event_id = sentry::capture_error(&self);
            tracing::error!(
                error = %self,
                sentry_event_id = %event_id,
                "Request error"
            );
        }

        let body = Json(json!({ "detail": self.detail() }));

        if matches!(status, StatusCode::UNAUTHORIZED) {
            return (status, [(header::WWW_AUTHENTICATE, "Bearer")], body).into_response();
        }

        (status, body).into_response()
    }
}

/// Result type alias for `AppError`.
pub type Result<T> = std::result::Result<T, AppError>;
