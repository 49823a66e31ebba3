//! Database operations for the admin API (`SQLite` via sqlx).
//!
//! # Tables
//!
//! - `users` - Accounts and the one-time wizard-submission flag
//! - `auth_tokens` - Hashed bearer tokens (access/refresh)
//! - `organizations` - Flat organization listing
//! - `wizard_configurations` - One storefront connection per user
//! - `billing_plans` / `subscriptions` / `usage_stats` / `billing_history`
//!
//! # Migrations
//!
//! Migrations are stored in `crates/server/migrations/` and run via:
//! ```bash
//! cargo run -p perche-cli -- migrate
//! ```
//!
//! Queries use the runtime sqlx API with `?` binds; JSON columns are stored
//! as TEXT and parsed on read, with invalid stored data surfacing as
//! [`RepositoryError::DataCorruption`].

pub mod billing;
pub mod organizations;
pub mod tokens;
pub mod users;
pub mod wizard;

use std::str::FromStr;
use std::time::Duration;

use secrecy::ExposeSecret;
use sqlx::SqlitePool;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use thiserror::Error;

/// Errors surfaced by the repository layer.
#[derive(Debug, Error)]
pub enum RepositoryError {
    /// Underlying database failure.
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    /// The targeted row does not exist.
    #[error("not found")]
    NotFound,

    /// A uniqueness constraint was violated.
    #[error("conflict: {0}")]
    Conflict(String),

    /// A stored value could not be decoded into its domain type.
    #[error("data corruption: {0}")]
    DataCorruption(String),
}

/// Create a `SQLite` connection pool with sensible defaults.
///
/// The database file is created if missing; foreign keys are enforced.
///
/// # Errors
///
/// Returns `sqlx::Error` if the connection cannot be established.
pub async fn create_pool(database_url: &secrecy::SecretString) -> Result<SqlitePool, sqlx::Error> {
    let options = SqliteConnectOptions::from_str(database_url.expose_secret())?
        .create_if_missing(true)
        .foreign_keys(true);

    SqlitePoolOptions::new()
        .max_connections(10)
        .acquire_timeout(Duration::from_secs(10))
        .connect_with(options)
        .await
}

/// Embedded migrations for this crate's schema.
#[must_use]
pub fn migrator() -> sqlx::migrate::Migrator {
    sqlx::migrate!("./migrations")
}

/// Parse a JSON TEXT column, mapping failures to [`RepositoryError::DataCorruption`].
pub(crate) fn parse_json_column<T: serde::de::DeserializeOwned>(
    column: &str,
    raw: &str,
) -> Result<T, RepositoryError> {
    serde_json::from_str(raw)
        .map_err(|e| RepositoryError::DataCorruption(format!("invalid JSON in {column}: {e}")))
}
