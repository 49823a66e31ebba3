//! Organization route handlers.

use axum::Json;
use axum::extract::{Query, State};

use super::Pagination;
use crate::db::organizations::OrganizationRepository;
use crate::error::Result;
use crate::models::Organization;
use crate::state::AppState;

/// List organizations with offset/limit pagination.
pub async fn list_organizations(
    State(state): State<AppState>,
    Query(page): Query<Pagination>,
) -> Result<Json<Vec<Organization>>> {
    let organizations = OrganizationRepository::new(state.pool())
        .list(page.skip, page.limit)
        .await?;

    Ok(Json(organizations))
}
