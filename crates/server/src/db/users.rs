//! User repository for database operations.

use perche_core::{Email, UserId};
use sqlx::SqlitePool;

use super::RepositoryError;
use crate::models::User;

/// Row tuple for the user columns every query selects.
type UserRow = (i64, String, String, bool, bool);

/// Repository for user database operations.
pub struct UserRepository<'a> {
    pool: &'a SqlitePool,
}

impl<'a> UserRepository<'a> {
    /// Create a new user repository.
    #[must_use]
    pub const fn new(pool: &'a SqlitePool) -> Self {
        Self { pool }
    }

    /// Get a user by their ID.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    /// Returns `RepositoryError::DataCorruption` if the stored email is invalid.
    pub async fn get_by_id(&self, id: UserId) -> Result<Option<User>, RepositoryError> {
        let row = sqlx::query_as::<_, UserRow>(
            "SELECT id, username, email, is_active, has_submitted_website
             FROM users WHERE id = ?",
        )
        .bind(id.as_i64())
        .fetch_optional(self.pool)
        .await?;

        row.map(map_user_row).transpose()
    }

    /// Get a user by their username.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    /// Returns `RepositoryError::DataCorruption` if the stored email is invalid.
    pub async fn get_by_username(&self, username: &str) -> Result<Option<User>, RepositoryError> {
        let row = sqlx::query_as::<_, UserRow>(
            "SELECT id, username, email, is_active, has_submitted_website
             FROM users WHERE username = ?",
        )
        .bind(username)
        .fetch_optional(self.pool)
        .await?;

        row.map(map_user_row).transpose()
    }

    /// Create a new user with username, email, and password hash.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Conflict` if the username or email already
    /// exists. Returns `RepositoryError::Database` for other database errors.
    pub async fn create(
        &self,
        username: &str,
        email: &Email,
        password_hash: &str,
    ) -> Result<User, RepositoryError> {
        let row = sqlx::query_as::<_, UserRow>(
            "INSERT INTO users (username, email, hashed_password)
             VALUES (?, ?, ?)
             RETURNING id, username, email, is_active, has_submitted_website",
        )
        .bind(username)
        .bind(email.as_str())
        .bind(password_hash)
        .fetch_one(self.pool)
        .await
        .map_err(|e| {
            if let sqlx::Error::Database(ref db_err) = e
                && db_err.is_unique_violation()
            {
                return RepositoryError::Conflict("username or email already exists".to_owned());
            }
            RepositoryError::Database(e)
        })?;

        map_user_row(row)
    }

    /// Get a user's password hash by username.
    ///
    /// Returns `None` if the user doesn't exist.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    /// Returns `RepositoryError::DataCorruption` if the stored email is invalid.
    pub async fn get_password_hash(
        &self,
        username: &str,
    ) -> Result<Option<(User, String)>, RepositoryError> {
        let row = sqlx::query_as::<_, (i64, String, String, bool, bool, String)>(
            "SELECT id, username, email, is_active, has_submitted_website, hashed_password
             FROM users WHERE username = ?",
        )
        .bind(username)
        .fetch_optional(self.pool)
        .await?;

        let Some((id, username, email, is_active, has_submitted_website, hash)) = row else {
            return Ok(None);
        };

        let user = map_user_row((id, username, email, is_active, has_submitted_website))?;
        Ok(Some((user, hash)))
    }

    /// Set the user's wizard-submission flag.
    ///
    /// Idempotent: repeated calls leave the flag set.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the user doesn't exist.
    /// Returns `RepositoryError::Database` for other database errors.
    pub async fn mark_website_submitted(&self, id: UserId) -> Result<User, RepositoryError> {
        let row = sqlx::query_as::<_, UserRow>(
            "UPDATE users SET has_submitted_website = 1
             WHERE id = ?
             RETURNING id, username, email, is_active, has_submitted_website",
        )
        .bind(id.as_i64())
        .fetch_optional(self.pool)
        .await?;

        row.map_or(Err(RepositoryError::NotFound), map_user_row)
    }
}

/// Build a [`User`] from a row, validating the stored email.
fn map_user_row(
    (id, username, email, is_active, has_submitted_website): UserRow,
) -> Result<User, RepositoryError> {
    let email = Email::parse(&email)
        .map_err(|e| RepositoryError::DataCorruption(format!("invalid email in database: {e}")))?;

    Ok(User {
        id: UserId::new(id),
        username,
        email,
        is_active,
        has_submitted_website,
    })
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::db::test_support::test_pool;

    #[tokio::test]
    async fn test_create_and_get() {
        let pool = test_pool().await;
        let repo = UserRepository::new(&pool);

        let email = Email::parse("alice@example.com").unwrap();
        let created = repo.create("alice", &email, "hash").await.unwrap();
        assert_eq!(created.username, "alice");
        assert!(created.is_active);
        assert!(!created.has_submitted_website);

        let fetched = repo.get_by_id(created.id).await.unwrap().unwrap();
        assert_eq!(fetched.username, "alice");

        let by_name = repo.get_by_username("alice").await.unwrap().unwrap();
        assert_eq!(by_name.id, created.id);
    }

    #[tokio::test]
    async fn test_duplicate_username_is_conflict() {
        let pool = test_pool().await;
        let repo = UserRepository::new(&pool);

        let email = Email::parse("alice@example.com").unwrap();
        repo.create("alice", &email, "hash").await.unwrap();

        let other = Email::parse("alice2@example.com").unwrap();
        let err = repo.create("alice", &other, "hash").await.unwrap_err();
        assert!(matches!(err, RepositoryError::Conflict(_)));

        // No second row was created.
        let (count,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM users")
            .fetch_one(&pool)
            .await
            .unwrap();
        assert_eq!(count, 1);
    }

    #[tokio::test]
    async fn test_mark_website_submitted_is_idempotent() {
        let pool = test_pool().await;
        let repo = UserRepository::new(&pool);

        let email = Email::parse("bob@example.com").unwrap();
        let user = repo.create("bob", &email, "hash").await.unwrap();

        let updated = repo.mark_website_submitted(user.id).await.unwrap();
        assert!(updated.has_submitted_website);

        let again = repo.mark_website_submitted(user.id).await.unwrap();
        assert!(again.has_submitted_website);
    }

    #[tokio::test]
    async fn test_mark_website_submitted_missing_user() {
        let pool = test_pool().await;
        let repo = UserRepository::new(&pool);

        let err = repo
            .mark_website_submitted(UserId::new(999))
            .await
            .unwrap_err();
        assert!(matches!(err, RepositoryError::NotFound));
    }
}
