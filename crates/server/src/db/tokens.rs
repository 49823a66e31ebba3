//! Bearer-token repository.
//!
//! Tokens themselves never touch the database - only their SHA-256 hashes.

use chrono::{DateTime, Utc};
use perche_core::{Email, UserId};
use sqlx::SqlitePool;

use super::RepositoryError;
use crate::models::User;

/// Which half of the issued token pair a row represents.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenKind {
    Access,
    Refresh,
}

impl TokenKind {
    /// The stored form.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Access => "access",
            Self::Refresh => "refresh",
        }
    }
}

/// Repository for bearer-token rows.
pub struct TokenRepository<'a> {
    pool: &'a SqlitePool,
}

impl<'a> TokenRepository<'a> {
    /// Create a new token repository.
    #[must_use]
    pub const fn new(pool: &'a SqlitePool) -> Self {
        Self { pool }
    }

    /// Store a token hash with its kind and expiry.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the insert fails.
    pub async fn insert(
        &self,
        user_id: UserId,
        token_hash: &str,
        kind: TokenKind,
        expires_at: DateTime<Utc>,
    ) -> Result<(), RepositoryError> {
        sqlx::query(
            "INSERT INTO auth_tokens (user_id, token_hash, kind, expires_at, created_at)
             VALUES (?, ?, ?, ?, ?)",
        )
        .bind(user_id.as_i64())
        .bind(token_hash)
        .bind(kind.as_str())
        .bind(expires_at)
        .bind(Utc::now())
        .execute(self.pool)
        .await?;

        Ok(())
    }

    /// Resolve an unexpired access-token hash to its active user.
    ///
    /// Returns `None` for unknown hashes, expired tokens, refresh tokens
    /// presented as access tokens, and deactivated users.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    /// Returns `RepositoryError::DataCorruption` if the stored email is invalid.
    pub async fn find_user_for_access_hash(
        &self,
        token_hash: &str,
        now: DateTime<Utc>,
    ) -> Result<Option<User>, RepositoryError> {
        let row = sqlx::query_as::<_, (i64, String, String, bool, bool)>(
            "SELECT u.id, u.username, u.email, u.is_active, u.has_submitted_website
             FROM auth_tokens t
             JOIN users u ON u.id = t.user_id
             WHERE t.token_hash = ? AND t.kind = 'access' AND t.expires_at > ?
               AND u.is_active = 1",
        )
        .bind(token_hash)
        .bind(now)
        .fetch_optional(self.pool)
        .await?;

        let Some((id, username, email, is_active, has_submitted_website)) = row else {
            return Ok(None);
        };

        let email = Email::parse(&email).map_err(|e| {
            RepositoryError::DataCorruption(format!("invalid email in database: {e}"))
        })?;

        Ok(Some(User {
            id: UserId::new(id),
            username,
            email,
            is_active,
            has_submitted_website,
        }))
    }

    /// Delete the token row matching a hash (logout).
    ///
    /// # Returns
    ///
    /// Returns `true` if a row was deleted, `false` if the hash was unknown.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn revoke_by_hash(&self, token_hash: &str) -> Result<bool, RepositoryError> {
        let result = sqlx::query("DELETE FROM auth_tokens WHERE token_hash = ?")
            .bind(token_hash)
            .execute(self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use chrono::Duration;

    use super::*;
    use crate::db::test_support::test_pool;
    use crate::db::users::UserRepository;

    async fn seed_user(pool: &SqlitePool) -> User {
        let email = Email::parse("alice@example.com").unwrap();
        UserRepository::new(pool)
            .create("alice", &email, "hash")
            .await
            .unwrap()
    }

    #[tokio::test]
    async fn test_access_token_roundtrip() {
        let pool = test_pool().await;
        let user = seed_user(&pool).await;
        let repo = TokenRepository::new(&pool);

        let now = Utc::now();
        repo.insert(user.id, "abc123", TokenKind::Access, now + Duration::days(8))
            .await
            .unwrap();

        let resolved = repo
            .find_user_for_access_hash("abc123", now)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(resolved.id, user.id);
    }

    #[tokio::test]
    async fn test_expired_token_is_rejected() {
        let pool = test_pool().await;
        let user = seed_user(&pool).await;
        let repo = TokenRepository::new(&pool);

        let now = Utc::now();
        repo.insert(user.id, "old", TokenKind::Access, now - Duration::minutes(1))
            .await
            .unwrap();

        assert!(
            repo.find_user_for_access_hash("old", now)
                .await
                .unwrap()
                .is_none()
        );
    }

    #[tokio::test]
    async fn test_refresh_token_cannot_authenticate() {
        let pool = test_pool().await;
        let user = seed_user(&pool).await;
        let repo = TokenRepository::new(&pool);

        let now = Utc::now();
        repo.insert(user.id, "refresh1", TokenKind::Refresh, now + Duration::days(30))
            .await
            .unwrap();

        assert!(
            repo.find_user_for_access_hash("refresh1", now)
                .await
                .unwrap()
                .is_none()
        );
    }

    #[tokio::test]
    async fn test_revoke() {
        let pool = test_pool().await;
        let user = seed_user(&pool).await;
        let repo = TokenRepository::new(&pool);

        let now = Utc::now();
        repo.insert(user.id, "abc123", TokenKind::Access, now + Duration::days(8))
            .await
            .unwrap();

        assert!(repo.revoke_by_hash("abc123").await.unwrap());
        assert!(!repo.revoke_by_hash("abc123").await.unwrap());
        assert!(
            repo.find_user_for_access_hash("abc123", now)
                .await
                .unwrap()
                .is_none()
        );
    }
}
