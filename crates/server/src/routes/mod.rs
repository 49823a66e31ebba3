//! HTTP route handlers for the admin API.
//!
//! # Route Structure (mounted under `/api/v1`)
//!
//! ```text
//! # Auth
//! POST /auth/signin             - Login, returns access/refresh tokens
//! POST /auth/signup             - Register, returns access/refresh tokens
//! POST /auth/logout             - Revoke the presented token
//!
//! # Users
//! GET  /users/{id}              - Fetch a user
//! PUT  /users/{id}/website-submission - Set the wizard-submission flag
//!
//! # Organizations
//! GET  /org/                    - Paginated organization list
//!
//! # SDK wizard (requires bearer token)
//! POST /sdk-wizard/data                - Create wizard configuration (once per user)
//! GET  /sdk-wizard/data                - Fetch wizard configuration
//! PUT  /sdk-wizard/data                - Partial update
//! POST /sdk-wizard/validate-connection - Probe the store platform
//! POST /sdk-wizard/extract-data        - Fetch a sample product from the catalog
//! POST /sdk-wizard/complete            - Mark the wizard complete, trigger pipeline
//! GET  /sdk-wizard/dashboard           - Integration stats and activities
//!
//! # Billing (requires bearer token)
//! GET  /billing/plans           - List plans
//! POST /billing/plans           - Create plan
//! GET  /billing/plans/{id}      - Fetch plan
//! PUT  /billing/plans/{id}      - Update plan
//! GET  /billing/current-plan    - Active subscription + plan + usage
//! POST /billing/subscribe/{id}  - Subscribe (cancels previous active)
//! GET  /billing/history         - Billing history
//! POST /billing/history         - Record history entry
//! GET  /billing/usage           - Usage stats
//! PUT  /billing/usage           - Update used counters
//!
//! # Dashboard / Analysis (requires bearer token; sample data)
//! GET  /dashboard/stats, /dashboard/intent-usage-area, /dashboard/intent-usage,
//!      /dashboard/top-products, /dashboard/top-brands,
//!      /dashboard/top-installed-countries
//! GET  /analysis/product, /analysis/sales, /analysis/intent,
//!      /analysis/user-segmentation, /analysis/system, /analysis/mentions
//! ```

pub mod analysis;
pub mod auth;
pub mod billing;
pub mod dashboard;
pub mod organizations;
pub mod sdk_wizard;
pub mod users;

use axum::Router;
use axum::routing::{get, post, put};
use serde::Deserialize;

use crate::state::AppState;

/// Offset/limit pagination query parameters.
#[derive(Debug, Deserialize)]
pub struct Pagination {
    #[serde(default)]
    pub skip: i64,
    #[serde(default = "default_limit")]
    pub limit: i64,
}

const fn default_limit() -> i64 {
    100
}

/// Assemble all routers under the API prefix.
pub fn routes() -> Router<AppState> {
    Router::new()
        .nest("/auth", auth_routes())
        .nest("/users", user_routes())
        .route("/org/", get(organizations::list_organizations))
        .nest("/org", organization_routes())
        .nest("/sdk-wizard", sdk_wizard_routes())
        .nest("/billing", billing_routes())
        .nest("/dashboard", dashboard_routes())
        .nest("/analysis", analysis_routes())
}

/// Create the auth routes router.
pub fn auth_routes() -> Router<AppState> {
    Router::new()
        .route("/signin", post(auth::signin))
        .route("/signup", post(auth::signup))
        .route("/logout", post(auth::logout))
}

/// Create the user routes router.
pub fn user_routes() -> Router<AppState> {
    Router::new()
        .route("/{user_id}", get(users::get_user))
        .route(
            "/{user_id}/website-submission",
            put(users::update_website_submission),
        )
}

/// Create the organization routes router.
pub fn organization_routes() -> Router<AppState> {
    Router::new().route("/", get(organizations::list_organizations))
}

/// Create the SDK wizard routes router.
pub fn sdk_wizard_routes() -> Router<AppState> {
    Router::new()
        .route(
            "/data",
            post(sdk_wizard::create_data)
                .get(sdk_wizard::get_data)
                .put(sdk_wizard::update_data),
        )
        .route("/validate-connection", post(sdk_wizard::validate_connection))
        .route("/extract-data", post(sdk_wizard::extract_data))
        .route("/complete", post(sdk_wizard::complete))
        .route("/dashboard", get(sdk_wizard::dashboard))
}

/// Create the billing routes router.
pub fn billing_routes() -> Router<AppState> {
    Router::new()
        .route("/plans", get(billing::list_plans).post(billing::create_plan))
        .route(
            "/plans/{plan_id}",
            get(billing::get_plan).put(billing::update_plan),
        )
        .route("/current-plan", get(billing::current_plan))
        .route("/subscribe/{plan_id}", post(billing::subscribe))
        .route(
            "/history",
            get(billing::list_history).post(billing::create_history),
        )
        .route("/usage", get(billing::get_usage).put(billing::update_usage))
}

/// Create the dashboard routes router (static sample data).
pub fn dashboard_routes() -> Router<AppState> {
    Router::new()
        .route("/stats", get(dashboard::stats))
        .route("/intent-usage-area", get(dashboard::intent_usage_area))
        .route("/intent-usage", get(dashboard::intent_usage))
        .route("/top-products", get(dashboard::top_products))
        .route("/top-brands", get(dashboard::top_brands))
        .route(
            "/top-installed-countries",
            get(dashboard::top_installed_countries),
        )
}

/// Create the analysis routes router (randomized sample data).
pub fn analysis_routes() -> Router<AppState> {
    Router::new()
        .route("/product", get(analysis::product_engagement))
        .route("/sales", get(analysis::sales_performance))
        .route("/intent", get(analysis::intent_trends))
        .route("/user-segmentation", get(analysis::user_segmentation))
        .route("/system", get(analysis::system_performance))
        .route("/mentions", get(analysis::most_mentioned_products))
}
