//! Authentication service.
//!
//! Provides password registration/login and opaque bearer-token issuance.
//! Tokens are 32 random bytes, URL-safe base64 on the wire; only the
//! SHA-256 hash is persisted.

use argon2::{
    Argon2,
    password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString, rand_core::OsRng},
};
use base64::Engine;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use chrono::{DateTime, Duration, Utc};
use perche_core::{Email, EmailError, UserId};
use rand::RngCore;
use sha2::{Digest, Sha256};
use sqlx::SqlitePool;

use crate::db::RepositoryError;
use crate::db::tokens::{TokenKind, TokenRepository};
use crate::db::users::UserRepository;
use crate::models::User;

/// Minimum password length.
const MIN_PASSWORD_LENGTH: usize = 8;

/// Errors from registration, login, and token handling.
#[derive(Debug, thiserror::Error)]
pub enum AuthError {
    /// Username/password combination is wrong.
    #[error("invalid credentials")]
    InvalidCredentials,

    /// The username (or email) is already registered.
    #[error("user already exists")]
    UserAlreadyExists,

    /// The email failed validation.
    #[error("invalid email: {0}")]
    InvalidEmail(#[from] EmailError),

    /// The password failed validation.
    #[error("{0}")]
    WeakPassword(String),

    /// Repository operation failed.
    #[error("repository error: {0}")]
    Repository(#[from] RepositoryError),

    /// Password hashing failed.
    #[error("password hashing error: {0}")]
    Hash(String),
}

/// An issued access/refresh token pair.
///
/// These are the raw token values; they exist only in this response.
#[derive(Debug, Clone)]
pub struct TokenPair {
    pub access_token: String,
    pub refresh_token: String,
}

/// Authentication service.
///
/// Handles user registration, login, and bearer-token lifecycle.
pub struct AuthService<'a> {
    users: UserRepository<'a>,
    tokens: TokenRepository<'a>,
    access_ttl: Duration,
    refresh_ttl: Duration,
}

impl<'a> AuthService<'a> {
    /// Create a new authentication service.
    #[must_use]
    pub fn new(
        pool: &'a SqlitePool,
        access_token_minutes: i64,
        refresh_token_days: i64,
    ) -> Self {
        Self {
            users: UserRepository::new(pool),
            tokens: TokenRepository::new(pool),
            access_ttl: Duration::minutes(access_token_minutes),
            refresh_ttl: Duration::days(refresh_token_days),
        }
    }

    // =========================================================================
    // Registration & Login
    // =========================================================================

    /// Register a new user with username, email, and password.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::InvalidEmail` if the email format is invalid.
    /// Returns `AuthError::WeakPassword` if the password doesn't meet requirements.
    /// Returns `AuthError::UserAlreadyExists` if the username is taken.
    pub async fn register(
        &self,
        username: &str,
        email: &str,
        password: &str,
    ) -> Result<User, AuthError> {
        let email = Email::parse(email)?;
        validate_password(password)?;

        let password_hash = hash_password(password)?;

        let user = self
            .users
            .create(username, &email, &password_hash)
            .await
            .map_err(|e| match e {
                RepositoryError::Conflict(_) => AuthError::UserAlreadyExists,
                other => AuthError::Repository(other),
            })?;

        Ok(user)
    }

    /// Login with username and password.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::InvalidCredentials` if the username/password is wrong.
    pub async fn login(&self, username: &str, password: &str) -> Result<User, AuthError> {
        let (user, password_hash) = self
            .users
            .get_password_hash(username)
            .await?
            .ok_or(AuthError::InvalidCredentials)?;

        verify_password(password, &password_hash)?;

        Ok(user)
    }

    // =========================================================================
    // Tokens
    // =========================================================================

    /// Issue a fresh access/refresh token pair for a user.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::Repository` if persisting the hashes fails.
    pub async fn issue_tokens(&self, user_id: UserId) -> Result<TokenPair, AuthError> {
        let now = Utc::now();
        let access_token = generate_token();
        let refresh_token = generate_token();

        self.tokens
            .insert(
                user_id,
                &token_hash(&access_token),
                TokenKind::Access,
                now + self.access_ttl,
            )
            .await?;
        self.tokens
            .insert(
                user_id,
                &token_hash(&refresh_token),
                TokenKind::Refresh,
                now + self.refresh_ttl,
            )
            .await?;

        Ok(TokenPair {
            access_token,
            refresh_token,
        })
    }

    /// Resolve a presented access token to its user.
    ///
    /// Returns `None` for unknown, expired, or non-access tokens.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::Repository` if the lookup fails.
    pub async fn authenticate(&self, token: &str) -> Result<Option<User>, AuthError> {
        let user = self
            .tokens
            .find_user_for_access_hash(&token_hash(token), Utc::now())
            .await?;
        Ok(user)
    }

    /// Revoke a presented token (logout). Unknown tokens are a no-op.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::Repository` if the delete fails.
    pub async fn revoke(&self, token: &str) -> Result<bool, AuthError> {
        let revoked = self.tokens.revoke_by_hash(&token_hash(token)).await?;
        Ok(revoked)
    }

    /// Access-token expiry timestamp for tokens issued now.
    #[must_use]
    pub fn access_expiry(&self) -> DateTime<Utc> {
        Utc::now() + self.access_ttl
    }
}

// =============================================================================
// Helpers
// =============================================================================

/// Validate password requirements.
fn validate_password(password: &str) -> Result<(), AuthError> {
    if password.len() < MIN_PASSWORD_LENGTH {
        return Err(AuthError::WeakPassword(format!(
            "Password must be at least {MIN_PASSWORD_LENGTH} characters"
        )));
    }
    Ok(())
}

/// Hash a password with Argon2id and a fresh salt.
pub fn hash_password(password: &str) -> Result<String, AuthError> {
    let salt = SaltString::generate(&mut OsRng);
    let hash = Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map_err(|e| AuthError::Hash(e.to_string()))?;
    Ok(hash.to_string())
}

/// Verify a password against a stored Argon2 hash.
fn verify_password(password: &str, stored_hash: &str) -> Result<(), AuthError> {
    let parsed = PasswordHash::new(stored_hash).map_err(|_| AuthError::InvalidCredentials)?;
    Argon2::default()
        .verify_password(password.as_bytes(), &parsed)
        .map_err(|_| AuthError::InvalidCredentials)
}

/// Generate an opaque token: 32 random bytes, URL-safe base64.
fn generate_token() -> String {
    let mut bytes = [0_u8; 32];
    rand::rng().fill_bytes(&mut bytes);
    URL_SAFE_NO_PAD.encode(bytes)
}

/// SHA-256 hex digest of a token - the only form that touches the database.
#[must_use]
pub fn token_hash(token: &str) -> String {
    hex::encode(Sha256::digest(token.as_bytes()))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::db::test_support::test_pool;

    fn service(pool: &SqlitePool) -> AuthService<'_> {
        AuthService::new(pool, 11_520, 30)
    }

    #[tokio::test]
    async fn test_register_and_login() {
        let pool = test_pool().await;
        let auth = service(&pool);

        let user = auth
            .register("alice", "alice@example.com", "password123")
            .await
            .unwrap();
        assert_eq!(user.username, "alice");

        let logged_in = auth.login("alice", "password123").await.unwrap();
        assert_eq!(logged_in.id, user.id);
    }

    #[tokio::test]
    async fn test_login_wrong_password() {
        let pool = test_pool().await;
        let auth = service(&pool);
        auth.register("alice", "alice@example.com", "password123")
            .await
            .unwrap();

        let err = auth.login("alice", "wrong-password").await.unwrap_err();
        assert!(matches!(err, AuthError::InvalidCredentials));
    }

    #[tokio::test]
    async fn test_login_unknown_user() {
        let pool = test_pool().await;
        let auth = service(&pool);

        let err = auth.login("nobody", "password123").await.unwrap_err();
        assert!(matches!(err, AuthError::InvalidCredentials));
    }

    #[tokio::test]
    async fn test_duplicate_username() {
        let pool = test_pool().await;
        let auth = service(&pool);
        auth.register("alice", "alice@example.com", "password123")
            .await
            .unwrap();

        let err = auth
            .register("alice", "alice2@example.com", "password123")
            .await
            .unwrap_err();
        assert!(matches!(err, AuthError::UserAlreadyExists));
    }

    #[tokio::test]
    async fn test_weak_password_rejected() {
        let pool = test_pool().await;
        let auth = service(&pool);

        let err = auth
            .register("alice", "alice@example.com", "short")
            .await
            .unwrap_err();
        assert!(matches!(err, AuthError::WeakPassword(_)));
    }

    #[tokio::test]
    async fn test_token_roundtrip() {
        let pool = test_pool().await;
        let auth = service(&pool);
        let user = auth
            .register("alice", "alice@example.com", "password123")
            .await
            .unwrap();

        let pair = auth.issue_tokens(user.id).await.unwrap();
        assert_ne!(pair.access_token, pair.refresh_token);

        let resolved = auth
            .authenticate(&pair.access_token)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(resolved.id, user.id);

        // Refresh tokens do not authenticate requests.
        assert!(
            auth.authenticate(&pair.refresh_token)
                .await
                .unwrap()
                .is_none()
        );

        // Garbage tokens do not authenticate.
        assert!(auth.authenticate("not-a-token").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_revoked_token_no_longer_authenticates() {
        let pool = test_pool().await;
        let auth = service(&pool);
        let user = auth
            .register("alice", "alice@example.com", "password123")
            .await
            .unwrap();
        let pair = auth.issue_tokens(user.id).await.unwrap();

        assert!(auth.revoke(&pair.access_token).await.unwrap());
        assert!(
            auth.authenticate(&pair.access_token)
                .await
                .unwrap()
                .is_none()
        );
    }

    #[test]
    fn test_token_hash_is_stable_hex() {
        let hash = token_hash("some-token");
        assert_eq!(hash.len(), 64);
        assert_eq!(hash, token_hash("some-token"));
        assert_ne!(hash, token_hash("other-token"));
    }
}
