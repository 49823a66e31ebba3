//! Integration tests for user lookup, the submission flag, and the
//! organization listing.

use axum::http::StatusCode;
use perche_integration_tests::spawn_app;

#[tokio::test]
async fn get_user_returns_profile() {
    let app = spawn_app().await;
    let credentials = app.signup("alice").await;

    let (status, value) = app
        .call(
            "GET",
            &format!("/api/v1/users/{}", credentials.user_id),
            None,
            None,
        )
        .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(value["username"], "alice");
    assert_eq!(value["email"], "alice@example.com");
    assert_eq!(value["is_active"], true);
    assert_eq!(value["has_submitted_website"], false);
}

#[tokio::test]
async fn get_missing_user_is_404() {
    let app = spawn_app().await;

    let (status, value) = app.call("GET", "/api/v1/users/999", None, None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(value["detail"], "User not found");
}

#[tokio::test]
async fn website_submission_flag_can_be_set() {
    let app = spawn_app().await;
    let credentials = app.signup("alice").await;

    let uri = format!("/api/v1/users/{}/website-submission", credentials.user_id);
    let (status, value) = app.call("PUT", &uri, None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(value["has_submitted_website"], true);

    // Setting it again leaves it set.
    let (status, value) = app.call("PUT", &uri, None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(value["has_submitted_website"], true);
}

#[tokio::test]
async fn organization_listing_paginates() {
    let app = spawn_app().await;

    let (status, value) = app.call("GET", "/api/v1/org/", None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(value.as_array().map(Vec::len), Some(0));

    for i in 0..3 {
        sqlx::query("INSERT INTO organizations (name, description) VALUES (?, ?)")
            .bind(format!("org-{i}"))
            .bind("seeded for test")
            .execute(&app.pool)
            .await
            .unwrap();
    }

    let (status, value) = app
        .call("GET", "/api/v1/org/?skip=1&limit=1", None, None)
        .await;
    assert_eq!(status, StatusCode::OK);
    let orgs = value.as_array().unwrap();
    assert_eq!(orgs.len(), 1);
    assert_eq!(orgs[0]["name"], "org-1");
}
