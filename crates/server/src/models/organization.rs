//! Organization model.

use perche_core::OrganizationId;
use serde::Serialize;

/// An organization visible in the admin listing.
#[derive(Debug, Clone, Serialize)]
pub struct Organization {
    pub id: OrganizationId,
    pub name: String,
    pub description: Option<String>,
}
