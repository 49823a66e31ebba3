//! Wizard-configuration repository.

use perche_core::{FieldMappings, UserId, WizardConfigId};
use sqlx::SqlitePool;

use super::{RepositoryError, parse_json_column};
use crate::models::WizardConfiguration;

/// Fields supplied when creating a wizard configuration.
#[derive(Debug, Clone)]
pub struct NewWizardConfiguration {
    pub platform: String,
    pub store_url: String,
    pub database_access: String,
    pub field_mappings: Option<FieldMappings>,
    pub woo_commerce_secret_key: Option<String>,
    pub woo_commerce_client_key: Option<String>,
}

/// Partial update: `None` fields are left unchanged.
#[derive(Debug, Clone, Default)]
pub struct WizardConfigurationPatch {
    pub platform: Option<String>,
    pub store_url: Option<String>,
    pub database_access: Option<String>,
    pub field_mappings: Option<FieldMappings>,
    pub woo_commerce_secret_key: Option<String>,
    pub woo_commerce_client_key: Option<String>,
}

/// Row tuple for the wizard-configuration columns.
type WizardRow = (
    i64,
    i64,
    String,
    String,
    String,
    Option<String>,
    Option<String>,
    Option<String>,
    bool,
    Option<String>,
);

/// Repository for wizard-configuration database operations.
pub struct WizardRepository<'a> {
    pool: &'a SqlitePool,
}

impl<'a> WizardRepository<'a> {
    /// Create a new wizard repository.
    #[must_use]
    pub const fn new(pool: &'a SqlitePool) -> Self {
        Self { pool }
    }

    /// Get the wizard configuration for a user, if any.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    /// Returns `RepositoryError::DataCorruption` if a stored JSON column is invalid.
    pub async fn get_by_user(
        &self,
        user_id: UserId,
    ) -> Result<Option<WizardConfiguration>, RepositoryError> {
        let row = sqlx::query_as::<_, WizardRow>(
            "SELECT id, user_id, platform, store_url, database_access, field_mappings,
                    woo_commerce_secret_key, woo_commerce_client_key, is_data_extracted,
                    sample_fields
             FROM wizard_configurations WHERE user_id = ?",
        )
        .bind(user_id.as_i64())
        .fetch_optional(self.pool)
        .await?;

        row.map(map_wizard_row).transpose()
    }

    /// Create the wizard configuration for a user.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Conflict` if the user already has one.
    /// Returns `RepositoryError::Database` for other database errors.
    pub async fn create(
        &self,
        user_id: UserId,
        data: &NewWizardConfiguration,
    ) -> Result<WizardConfiguration, RepositoryError> {
        let field_mappings = data
            .field_mappings
            .as_ref()
            .map(serde_json::to_string)
            .transpose()
            .map_err(|e| {
                RepositoryError::DataCorruption(format!("failed to serialize field mappings: {e}"))
            })?;

        let row = sqlx::query_as::<_, WizardRow>(
            "INSERT INTO wizard_configurations
                (user_id, platform, store_url, database_access, field_mappings,
                 woo_commerce_secret_key, woo_commerce_client_key)
             VALUES (?, ?, ?, ?, ?, ?, ?)
             RETURNING id, user_id, platform, store_url, database_access, field_mappings,
                       woo_commerce_secret_key, woo_commerce_client_key, is_data_extracted,
                       sample_fields",
        )
        .bind(user_id.as_i64())
        .bind(&data.platform)
        .bind(&data.store_url)
        .bind(&data.database_access)
        .bind(field_mappings)
        .bind(&data.woo_commerce_secret_key)
        .bind(&data.woo_commerce_client_key)
        .fetch_one(self.pool)
        .await
        .map_err(|e| {
            if let sqlx::Error::Database(ref db_err) = e
                && db_err.is_unique_violation()
            {
                return RepositoryError::Conflict(
                    "wizard configuration already exists for this user".to_owned(),
                );
            }
            RepositoryError::Database(e)
        })?;

        map_wizard_row(row)
    }

    /// Apply a partial update to the user's wizard configuration.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the user has no configuration.
    /// Returns `RepositoryError::Database` for other database errors.
    pub async fn update(
        &self,
        user_id: UserId,
        patch: &WizardConfigurationPatch,
    ) -> Result<WizardConfiguration, RepositoryError> {
        let current = self
            .get_by_user(user_id)
            .await?
            .ok_or(RepositoryError::NotFound)?;

        let merged = WizardConfiguration {
            platform: patch.platform.clone().unwrap_or(current.platform),
            store_url: patch.store_url.clone().unwrap_or(current.store_url),
            database_access: patch
                .database_access
                .clone()
                .unwrap_or(current.database_access),
            field_mappings: patch.field_mappings.clone().or(current.field_mappings),
            woo_commerce_secret_key: patch
                .woo_commerce_secret_key
                .clone()
                .or(current.woo_commerce_secret_key),
            woo_commerce_client_key: patch
                .woo_commerce_client_key
                .clone()
                .or(current.woo_commerce_client_key),
            ..current
        };

        let field_mappings = merged
            .field_mappings
            .as_ref()
            .map(serde_json::to_string)
            .transpose()
            .map_err(|e| {
                RepositoryError::DataCorruption(format!("failed to serialize field mappings: {e}"))
            })?;

        sqlx::query(
            "UPDATE wizard_configurations
             SET platform = ?, store_url = ?, database_access = ?, field_mappings = ?,
                 woo_commerce_secret_key = ?, woo_commerce_client_key = ?
             WHERE user_id = ?",
        )
        .bind(&merged.platform)
        .bind(&merged.store_url)
        .bind(&merged.database_access)
        .bind(field_mappings)
        .bind(&merged.woo_commerce_secret_key)
        .bind(&merged.woo_commerce_client_key)
        .bind(user_id.as_i64())
        .execute(self.pool)
        .await?;

        Ok(merged)
    }

    /// Store the extracted sample fields and set the extraction flag.
    ///
    /// # Returns
    ///
    /// Returns `true` if the user had a configuration to update.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn store_sample_fields(
        &self,
        user_id: UserId,
        fields: &serde_json::Value,
    ) -> Result<bool, RepositoryError> {
        let raw = serde_json::to_string(fields).map_err(|e| {
            RepositoryError::DataCorruption(format!("failed to serialize sample fields: {e}"))
        })?;

        let result = sqlx::query(
            "UPDATE wizard_configurations
             SET sample_fields = ?, is_data_extracted = 1
             WHERE user_id = ?",
        )
        .bind(raw)
        .bind(user_id.as_i64())
        .execute(self.pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }
}

/// Build a [`WizardConfiguration`] from a row, parsing the JSON columns.
fn map_wizard_row(
    (
        id,
        user_id,
        platform,
        store_url,
        database_access,
        field_mappings,
        woo_commerce_secret_key,
        woo_commerce_client_key,
        is_data_extracted,
        sample_fields,
    ): WizardRow,
) -> Result<WizardConfiguration, RepositoryError> {
    let field_mappings = field_mappings
        .as_deref()
        .map(|raw| parse_json_column::<FieldMappings>("field_mappings", raw))
        .transpose()?;

    let sample_fields = sample_fields
        .as_deref()
        .map(|raw| parse_json_column::<serde_json::Value>("sample_fields", raw))
        .transpose()?;

    Ok(WizardConfiguration {
        id: WizardConfigId::new(id),
        user_id: UserId::new(user_id),
        platform,
        store_url,
        database_access,
        field_mappings,
        woo_commerce_secret_key,
        woo_commerce_client_key,
        is_data_extracted,
        sample_fields,
    })
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use perche_core::Email;

    use super::*;
    use crate::db::test_support::test_pool;
    use crate::db::users::UserRepository;

    async fn seed_user(pool: &SqlitePool) -> UserId {
        let email = Email::parse("alice@example.com").unwrap();
        UserRepository::new(pool)
            .create("alice", &email, "hash")
            .await
            .unwrap()
            .id
    }

    fn sample_config() -> NewWizardConfiguration {
        let mut mappings = FieldMappings::new();
        mappings.insert("name", "title");
        NewWizardConfiguration {
            platform: "shopify".to_owned(),
            store_url: "https://store.example.com".to_owned(),
            database_access: "readonly".to_owned(),
            field_mappings: Some(mappings),
            woo_commerce_secret_key: None,
            woo_commerce_client_key: None,
        }
    }

    #[tokio::test]
    async fn test_create_once_per_user() {
        let pool = test_pool().await;
        let user_id = seed_user(&pool).await;
        let repo = WizardRepository::new(&pool);

        let created = repo.create(user_id, &sample_config()).await.unwrap();
        assert_eq!(created.platform, "shopify");
        assert!(!created.is_data_extracted);

        let err = repo.create(user_id, &sample_config()).await.unwrap_err();
        assert!(matches!(err, RepositoryError::Conflict(_)));
    }

    #[tokio::test]
    async fn test_partial_update_preserves_unset_fields() {
        let pool = test_pool().await;
        let user_id = seed_user(&pool).await;
        let repo = WizardRepository::new(&pool);
        repo.create(user_id, &sample_config()).await.unwrap();

        let patch = WizardConfigurationPatch {
            store_url: Some("https://other.example.com".to_owned()),
            ..Default::default()
        };
        let updated = repo.update(user_id, &patch).await.unwrap();

        assert_eq!(updated.store_url, "https://other.example.com");
        assert_eq!(updated.platform, "shopify");
        assert!(updated.field_mappings.is_some());

        // Persisted, not just merged in memory.
        let fetched = repo.get_by_user(user_id).await.unwrap().unwrap();
        assert_eq!(fetched.store_url, "https://other.example.com");
    }

    #[tokio::test]
    async fn test_update_without_config_is_not_found() {
        let pool = test_pool().await;
        let user_id = seed_user(&pool).await;
        let repo = WizardRepository::new(&pool);

        let err = repo
            .update(user_id, &WizardConfigurationPatch::default())
            .await
            .unwrap_err();
        assert!(matches!(err, RepositoryError::NotFound));
    }

    #[tokio::test]
    async fn test_store_sample_fields() {
        let pool = test_pool().await;
        let user_id = seed_user(&pool).await;
        let repo = WizardRepository::new(&pool);
        repo.create(user_id, &sample_config()).await.unwrap();

        let fields = serde_json::json!({"title": "Widget", "price": "9.99"});
        assert!(repo.store_sample_fields(user_id, &fields).await.unwrap());

        let fetched = repo.get_by_user(user_id).await.unwrap().unwrap();
        assert!(fetched.is_data_extracted);
        assert_eq!(fetched.sample_fields.unwrap(), fields);
    }
}
