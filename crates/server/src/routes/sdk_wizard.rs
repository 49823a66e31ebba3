//! SDK wizard route handlers.
//!
//! The wizard walks a user through connecting their storefront: create the
//! configuration, validate the connection, extract a sample product, then
//! complete - which flips the submission flag and fires the pipeline
//! trigger.

use axum::Json;
use axum::extract::State;
use perche_core::FieldMappings;
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};

use crate::db::RepositoryError;
use crate::db::users::UserRepository;
use crate::db::wizard::{NewWizardConfiguration, WizardConfigurationPatch, WizardRepository};
use crate::error::{AppError, Result};
use crate::middleware::CurrentUser;
use crate::models::WizardConfiguration;
use crate::state::AppState;

// =============================================================================
// Request / Response Types
// =============================================================================

/// Body for creating wizard data.
#[derive(Debug, Deserialize)]
pub struct WizardDataCreateRequest {
    pub platform: String,
    pub store_url: String,
    pub database_access: String,
    pub field_mappings: Option<FieldMappings>,
    pub woo_commerce_secret_key: Option<String>,
    pub woo_commerce_client_key: Option<String>,
}

/// Body for partially updating wizard data; absent fields are unchanged.
#[derive(Debug, Default, Deserialize)]
pub struct WizardDataUpdateRequest {
    pub platform: Option<String>,
    pub store_url: Option<String>,
    pub database_access: Option<String>,
    pub field_mappings: Option<FieldMappings>,
    pub woo_commerce_secret_key: Option<String>,
    pub woo_commerce_client_key: Option<String>,
}

/// Body for validating a store connection.
#[derive(Debug, Deserialize)]
pub struct ConnectionValidationRequest {
    pub platform: String,
    pub store_url: String,
    pub woo_commerce_secret_key: Option<String>,
    pub woo_commerce_client_key: Option<String>,
}

/// Body for extracting sample data from the store catalog.
#[derive(Debug, Deserialize)]
pub struct ExtractDataRequest {
    pub store_url: String,
    pub platform: String,
}

/// Wizard data representation returned by the data endpoints.
#[derive(Debug, Serialize)]
pub struct WizardDataResponse {
    pub id: perche_core::WizardConfigId,
    pub user_id: perche_core::UserId,
    pub platform: String,
    pub store_url: String,
    pub database_access: String,
    pub field_mappings: Option<FieldMappings>,
    pub woo_commerce_secret_key: Option<String>,
    pub woo_commerce_client_key: Option<String>,
    pub is_data_extracted: bool,
    /// Wire name kept from the original API.
    pub fields: Option<Value>,
}

impl From<WizardConfiguration> for WizardDataResponse {
    fn from(config: WizardConfiguration) -> Self {
        Self {
            id: config.id,
            user_id: config.user_id,
            platform: config.platform,
            store_url: config.store_url,
            database_access: config.database_access,
            field_mappings: config.field_mappings,
            woo_commerce_secret_key: config.woo_commerce_secret_key,
            woo_commerce_client_key: config.woo_commerce_client_key,
            is_data_extracted: config.is_data_extracted,
            fields: config.sample_fields,
        }
    }
}

// =============================================================================
// Data CRUD
// =============================================================================

/// Create wizard data for the current user.
///
/// At most one configuration per user; a second create is a 400.
pub async fn create_data(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Json(req): Json<WizardDataCreateRequest>,
) -> Result<Json<WizardDataResponse>> {
    let data = NewWizardConfiguration {
        platform: req.platform,
        store_url: req.store_url,
        database_access: req.database_access,
        field_mappings: req.field_mappings,
        woo_commerce_secret_key: req.woo_commerce_secret_key,
        woo_commerce_client_key: req.woo_commerce_client_key,
    };

    let config = WizardRepository::new(state.pool())
        .create(user.id, &data)
        .await
        .map_err(|e| match e {
            RepositoryError::Conflict(_) => {
                AppError::BadRequest("SDK wizard data already exists for this user".to_string())
            }
            other => AppError::Database(other),
        })?;

    Ok(Json(config.into()))
}

/// Fetch wizard data for the current user.
pub async fn get_data(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
) -> Result<Json<WizardDataResponse>> {
    let config = WizardRepository::new(state.pool())
        .get_by_user(user.id)
        .await?
        .ok_or_else(|| AppError::NotFound("SDK wizard data not found".to_string()))?;

    Ok(Json(config.into()))
}

/// Partially update wizard data for the current user.
pub async fn update_data(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Json(req): Json<WizardDataUpdateRequest>,
) -> Result<Json<WizardDataResponse>> {
    let patch = WizardConfigurationPatch {
        platform: req.platform,
        store_url: req.store_url,
        database_access: req.database_access,
        field_mappings: req.field_mappings,
        woo_commerce_secret_key: req.woo_commerce_secret_key,
        woo_commerce_client_key: req.woo_commerce_client_key,
    };

    let config = WizardRepository::new(state.pool())
        .update(user.id, &patch)
        .await
        .map_err(|e| match e {
            RepositoryError::NotFound => {
                AppError::NotFound("SDK wizard data not found".to_string())
            }
            other => AppError::Database(other),
        })?;

    Ok(Json(config.into()))
}

// =============================================================================
// Validation / Extraction / Completion
// =============================================================================

/// Validate the connection to the e-commerce platform without touching
/// wizard data.
pub async fn validate_connection(
    State(state): State<AppState>,
    CurrentUser(_user): CurrentUser,
    Json(req): Json<ConnectionValidationRequest>,
) -> Result<Json<Value>> {
    let outcome = state
        .connector()
        .validate(
            &req.platform,
            &req.store_url,
            req.woo_commerce_client_key.as_deref(),
            req.woo_commerce_secret_key.as_deref(),
        )
        .await?;

    Ok(Json(json!({
        "success": true,
        "message": outcome.message,
    })))
}

/// Extract a sample product from the store catalog.
///
/// Stores the first product as the user's field template when wizard data
/// exists.
pub async fn extract_data(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Json(req): Json<ExtractDataRequest>,
) -> Result<Json<Value>> {
    let first_product = state
        .catalog()
        .extract_first_product(&req.platform, &req.store_url)
        .await?;

    let stored = WizardRepository::new(state.pool())
        .store_sample_fields(user.id, &first_product)
        .await?;
    if !stored {
        tracing::debug!(user_id = %user.id, "no wizard data to attach sample fields to");
    }

    Ok(Json(json!({
        "success": true,
        "data": [first_product],
        "message": "Successfully extracted product data",
    })))
}

/// Mark the SDK wizard as complete for the current user.
///
/// Idempotent: repeated calls leave the submission flag set. Fires the
/// pipeline trigger best-effort; the flag commit is not rolled back on
/// trigger failure.
pub async fn complete(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
) -> Result<Json<Value>> {
    UserRepository::new(state.pool())
        .mark_website_submitted(user.id)
        .await?;

    if let Some(config) = WizardRepository::new(state.pool())
        .get_by_user(user.id)
        .await?
    {
        let conf = json!({
            "user_id": config.user_id,
            "platform": config.platform,
            "store_url": config.store_url,
            "field_mappings": config.field_mappings,
        });
        match state.workflow().trigger(&conf).await {
            Ok(run) => tracing::info!(user_id = %user.id, run = %run, "pipeline run triggered"),
            Err(e) => tracing::warn!(user_id = %user.id, error = %e, "failed to trigger pipeline run"),
        }
    }

    Ok(Json(json!({ "message": "SDK wizard completed successfully" })))
}

// =============================================================================
// Dashboard
// =============================================================================

/// SDK management dashboard: integration stats and recent activities.
pub async fn dashboard(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
) -> Result<Json<Value>> {
    let config = WizardRepository::new(state.pool())
        .get_by_user(user.id)
        .await?;

    let Some(config) = config else {
        return Ok(Json(json!({
            "stats": {
                "totalIntegrations": 0,
                "activeIntegrations": 0,
                "pendingUpdates": 0,
                "healthScore": 0,
            },
            "recent_activities": [],
        })));
    };

    let mut recent_activities = vec![json!({
        "id": 1,
        "type": "integration",
        "message": format!("Integration added: {}", config.platform),
        "time": "Just now",
    })];

    if config.is_data_extracted {
        recent_activities.push(json!({
            "id": 2,
            "type": "update",
            "message": format!("Data extracted from {}", config.platform),
            "time": "1 hour ago",
        }));
    }

    Ok(Json(json!({
        "stats": {
            "totalIntegrations": 1,
            "activeIntegrations": 1,
            "pendingUpdates": 0,
            "healthScore": 100,
        },
        "recent_activities": recent_activities,
    })))
}
