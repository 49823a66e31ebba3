//! Integration tests for Perche.
//!
//! Tests run the real admin API router in-process against a fresh
//! in-memory `SQLite` database, driving it through `tower::ServiceExt`.
//!
//! # Test Categories
//!
//! - `auth` - Sign-up/sign-in/logout and token behavior
//! - `users` - User lookup, submission flag, organizations
//! - `sdk_wizard` - Wizard data lifecycle, validation, extraction
//! - `billing` - Plans, subscriptions, usage, history
//!
//! # Running Tests
//!
//! ```bash
//! cargo test -p perche-integration-tests
//! ```

use axum::Router;
use axum::body::Body;
use axum::http::{Request, StatusCode, header};
use http_body_util::BodyExt;
use perche_server::config::{ServerConfig, WorkflowConfig};
use perche_server::state::AppState;
use secrecy::SecretString;
use serde_json::Value;
use sqlx::SqlitePool;
use tower::ServiceExt;

/// A running in-process application with its backing database.
pub struct TestApp {
    pub router: Router,
    pub pool: SqlitePool,
}

/// Configuration for a test instance.
///
/// The workflow engine points at a closed port so triggers fail fast.
fn test_config(workflow_url: &str) -> ServerConfig {
    ServerConfig {
        database_url: SecretString::from("sqlite::memory:"),
        host: "127.0.0.1".parse().expect("valid ip"),
        port: 0,
        cors_origins: vec!["http://localhost:3000".to_string()],
        access_token_minutes: 11_520,
        refresh_token_days: 30,
        workflow: WorkflowConfig {
            url: workflow_url.to_string(),
            username: "admin".to_string(),
            password: SecretString::from("admin"),
        },
        sentry_dsn: None,
    }
}

/// Spin up the application against a fresh migrated in-memory database.
#[allow(clippy::expect_used)]
pub async fn spawn_app() -> TestApp {
    spawn_app_with_workflow("http://127.0.0.1:1").await
}

/// Like [`spawn_app`], with the workflow engine pointed at `workflow_url`.
#[allow(clippy::expect_used)]
pub async fn spawn_app_with_workflow(workflow_url: &str) -> TestApp {
    let pool = sqlx::sqlite::SqlitePoolOptions::new()
        .max_connections(1)
        .connect("sqlite::memory:")
        .await
        .expect("failed to open in-memory database");

    perche_server::db::migrator()
        .run(&pool)
        .await
        .expect("failed to run migrations");

    let state = AppState::new(test_config(workflow_url), pool.clone())
        .expect("failed to build app state");

    TestApp {
        router: perche_server::app(state),
        pool,
    }
}

impl TestApp {
    /// Issue one request and return (status, parsed JSON body).
    ///
    /// Non-JSON bodies come back as `Value::Null`.
    #[allow(clippy::expect_used)]
    pub async fn call(
        &self,
        method: &str,
        uri: &str,
        token: Option<&str>,
        body: Option<&Value>,
    ) -> (StatusCode, Value) {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(token) = token {
            builder = builder.header(header::AUTHORIZATION, format!("Bearer {token}"));
        }

        let request = match body {
            Some(json) => builder
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(json.to_string())),
            None => builder.body(Body::empty()),
        }
        .expect("failed to build request");

        let response = self
            .router
            .clone()
            .oneshot(request)
            .await
            .expect("request failed");

        let status = response.status();
        let bytes = response
            .into_body()
            .collect()
            .await
            .expect("failed to read body")
            .to_bytes();
        let value = serde_json::from_slice(&bytes).unwrap_or(Value::Null);

        (status, value)
    }

    /// Register a user and return their access token and ID.
    #[allow(clippy::expect_used)]
    pub async fn signup(&self, username: &str) -> Credentials {
        let body = serde_json::json!({
            "username": username,
            "email": format!("{username}@example.com"),
            "password": "password123",
        });
        let (status, value) = self
            .call("POST", "/api/v1/auth/signup", None, Some(&body))
            .await;
        assert_eq!(status, StatusCode::OK, "signup failed: {value}");

        Credentials {
            access_token: value["access_token"]
                .as_str()
                .expect("missing access token")
                .to_owned(),
            refresh_token: value["refresh_token"]
                .as_str()
                .expect("missing refresh token")
                .to_owned(),
            user_id: value["user"]["id"]
                .as_str()
                .expect("missing user id")
                .parse()
                .expect("user id is not numeric"),
        }
    }
}

/// Tokens and identity returned from a signup.
pub struct Credentials {
    pub access_token: String,
    pub refresh_token: String,
    pub user_id: i64,
}
