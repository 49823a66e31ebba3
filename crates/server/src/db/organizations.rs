//! Organization repository.

use perche_core::OrganizationId;
use sqlx::SqlitePool;

use super::RepositoryError;
use crate::models::Organization;

/// Repository for organization database operations.
pub struct OrganizationRepository<'a> {
    pool: &'a SqlitePool,
}

impl<'a> OrganizationRepository<'a> {
    /// Create a new organization repository.
    #[must_use]
    pub const fn new(pool: &'a SqlitePool) -> Self {
        Self { pool }
    }

    /// List organizations with offset/limit pagination.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn list(
        &self,
        skip: i64,
        limit: i64,
    ) -> Result<Vec<Organization>, RepositoryError> {
        let rows = sqlx::query_as::<_, (i64, String, Option<String>)>(
            "SELECT id, name, description FROM organizations
             ORDER BY id LIMIT ? OFFSET ?",
        )
        .bind(limit)
        .bind(skip)
        .fetch_all(self.pool)
        .await?;

        Ok(rows
            .into_iter()
            .map(|(id, name, description)| Organization {
                id: OrganizationId::new(id),
                name,
                description,
            })
            .collect())
    }

    /// Insert an organization (used by the seeder).
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the insert fails.
    pub async fn create(
        &self,
        name: &str,
        description: Option<&str>,
    ) -> Result<Organization, RepositoryError> {
        let (id,): (i64,) = sqlx::query_as(
            "INSERT INTO organizations (name, description) VALUES (?, ?) RETURNING id",
        )
        .bind(name)
        .bind(description)
        .fetch_one(self.pool)
        .await?;

        Ok(Organization {
            id: OrganizationId::new(id),
            name: name.to_owned(),
            description: description.map(ToOwned::to_owned),
        })
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::db::test_support::test_pool;

    #[tokio::test]
    async fn test_list_pagination() {
        let pool = test_pool().await;
        let repo = OrganizationRepository::new(&pool);

        for i in 0..5 {
            repo.create(&format!("org-{i}"), Some("test org"))
                .await
                .unwrap();
        }

        let first_page = repo.list(0, 2).await.unwrap();
        assert_eq!(first_page.len(), 2);
        assert_eq!(first_page.first().unwrap().name, "org-0");

        let second_page = repo.list(2, 2).await.unwrap();
        assert_eq!(second_page.first().unwrap().name, "org-2");

        let all = repo.list(0, 100).await.unwrap();
        assert_eq!(all.len(), 5);
    }
}
