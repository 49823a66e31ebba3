//! Wizard configuration model.

use perche_core::{FieldMappings, UserId, WizardConfigId};

/// Per-user record describing a connected storefront.
///
/// Created at most once per user; mutated by update/extract operations and
/// never deleted.
#[derive(Debug, Clone)]
pub struct WizardConfiguration {
    pub id: WizardConfigId,
    pub user_id: UserId,
    /// Stored as entered by the user (validated at connection time, not here).
    pub platform: String,
    pub store_url: String,
    pub database_access: String,
    pub field_mappings: Option<FieldMappings>,
    pub woo_commerce_secret_key: Option<String>,
    pub woo_commerce_client_key: Option<String>,
    pub is_data_extracted: bool,
    /// First crawled product, kept as a field template for the mapping UI.
    pub sample_fields: Option<serde_json::Value>,
}
