//! Integration tests for authentication: sign-up, sign-in, logout, tokens.

use axum::http::StatusCode;
use perche_integration_tests::spawn_app;
use serde_json::json;

#[tokio::test]
async fn signup_returns_token_pair_and_user() {
    let app = spawn_app().await;

    let credentials = app.signup("alice").await;
    assert!(!credentials.access_token.is_empty());
    assert!(!credentials.refresh_token.is_empty());
    assert_ne!(credentials.access_token, credentials.refresh_token);
}

#[tokio::test]
async fn duplicate_username_is_rejected_without_a_second_row() {
    let app = spawn_app().await;
    app.signup("alice").await;

    let body = json!({
        "username": "alice",
        "email": "alice-other@example.com",
        "password": "password123",
    });
    let (status, value) = app
        .call("POST", "/api/v1/auth/signup", None, Some(&body))
        .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(value["detail"], "Username already registered");

    let (count,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM users")
        .fetch_one(&app.pool)
        .await
        .unwrap();
    assert_eq!(count, 1);
}

#[tokio::test]
async fn signin_with_wrong_credentials_issues_no_tokens() {
    let app = spawn_app().await;
    app.signup("alice").await;

    let (tokens_before,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM auth_tokens")
        .fetch_one(&app.pool)
        .await
        .unwrap();

    let body = json!({ "username": "alice", "password": "wrong-password" });
    let (status, value) = app
        .call("POST", "/api/v1/auth/signin", None, Some(&body))
        .await;

    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(value["detail"], "Incorrect username or password");
    assert!(value.get("access_token").is_none());

    let (tokens_after,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM auth_tokens")
        .fetch_one(&app.pool)
        .await
        .unwrap();
    assert_eq!(tokens_before, tokens_after);
}

#[tokio::test]
async fn signin_with_unknown_user_is_unauthorized() {
    let app = spawn_app().await;

    let body = json!({ "username": "nobody", "password": "password123" });
    let (status, _) = app
        .call("POST", "/api/v1/auth/signin", None, Some(&body))
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn access_token_authenticates_requests() {
    let app = spawn_app().await;
    let credentials = app.signup("alice").await;

    // Authenticated but no usage stats yet: 404, not 401.
    let (status, _) = app
        .call(
            "GET",
            "/api/v1/billing/usage",
            Some(&credentials.access_token),
            None,
        )
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn missing_or_garbage_token_is_unauthorized() {
    let app = spawn_app().await;
    app.signup("alice").await;

    let (status, _) = app.call("GET", "/api/v1/billing/usage", None, None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, _) = app
        .call("GET", "/api/v1/billing/usage", Some("not-a-real-token"), None)
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn refresh_token_does_not_authenticate_requests() {
    let app = spawn_app().await;
    let credentials = app.signup("alice").await;

    let (status, _) = app
        .call(
            "GET",
            "/api/v1/billing/usage",
            Some(&credentials.refresh_token),
            None,
        )
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn logout_revokes_the_presented_token() {
    let app = spawn_app().await;
    let credentials = app.signup("alice").await;

    let (status, value) = app
        .call(
            "POST",
            "/api/v1/auth/logout",
            Some(&credentials.access_token),
            None,
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(value["msg"], "Successfully logged out");

    let (status, _) = app
        .call(
            "GET",
            "/api/v1/billing/usage",
            Some(&credentials.access_token),
            None,
        )
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn logout_without_token_still_succeeds() {
    let app = spawn_app().await;

    let (status, value) = app.call("POST", "/api/v1/auth/logout", None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(value["msg"], "Successfully logged out");
}
