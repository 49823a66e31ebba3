//! CLI subcommand implementations.

pub mod migrate;
pub mod seed;

use secrecy::SecretString;

/// Database connection errors shared by the commands.
#[derive(Debug, thiserror::Error)]
pub enum CommandError {
    #[error("Missing environment variable: {0}")]
    MissingEnvVar(&'static str),

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Migration error: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),

    #[error("Repository error: {0}")]
    Repository(#[from] perche_server::db::RepositoryError),

    #[error("Auth error: {0}")]
    Auth(#[from] perche_server::services::auth::AuthError),
}

/// Resolve the database URL from the environment.
pub fn database_url() -> Result<SecretString, CommandError> {
    dotenvy::dotenv().ok();

    std::env::var("PERCHE_DATABASE_URL")
        .or_else(|_| std::env::var("DATABASE_URL"))
        .map(SecretString::from)
        .map_err(|_| CommandError::MissingEnvVar("PERCHE_DATABASE_URL"))
}
