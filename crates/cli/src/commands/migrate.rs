//! Database migration command.
//!
//! # Usage
//!
//! ```bash
//! perche-cli migrate
//! ```
//!
//! # Environment Variables
//!
//! - `PERCHE_DATABASE_URL` - `SQLite` connection string (falls back to
//!   `DATABASE_URL`)

use super::{CommandError, database_url};

/// Run the server schema migrations.
///
/// # Errors
///
/// Returns [`CommandError`] if the database is unreachable or a migration
/// fails.
pub async fn run() -> Result<(), CommandError> {
    let database_url = database_url()?;

    tracing::info!("Connecting to database...");
    let pool = perche_server::db::create_pool(&database_url).await?;

    tracing::info!("Running migrations...");
    perche_server::db::migrator().run(&pool).await?;

    tracing::info!("Migrations complete!");
    Ok(())
}
