//! Server configuration loaded from environment variables.
//!
//! # Environment Variables
//!
//! ## Required
//! - `PERCHE_DATABASE_URL` - `SQLite` connection string (falls back to `DATABASE_URL`)
//!
//! ## Optional
//! - `PERCHE_HOST` - Bind address (default: 127.0.0.1)
//! - `PERCHE_PORT` - Listen port (default: 8000)
//! - `PERCHE_CORS_ORIGINS` - Comma-separated allowed origins
//!   (default: localhost:3000/3001 in both spellings)
//! - `PERCHE_ACCESS_TOKEN_MINUTES` - Access token lifetime (default: 11520, i.e. 8 days)
//! - `PERCHE_REFRESH_TOKEN_DAYS` - Refresh token lifetime (default: 30)
//! - `PERCHE_WORKFLOW_URL` - Workflow engine base URL (default: <http://localhost:8080>)
//! - `PERCHE_WORKFLOW_USERNAME` / `PERCHE_WORKFLOW_PASSWORD` - Engine basic-auth
//!   credentials (default: admin/admin)
//! - `SENTRY_DSN` - Sentry error tracking DSN

use std::net::{IpAddr, SocketAddr};

use secrecy::SecretString;
use thiserror::Error;

/// Versioned API prefix all routes are mounted under.
pub const API_PREFIX: &str = "/api/v1";

/// Configuration errors that can occur during loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Missing environment variable: {0}")]
    MissingEnvVar(String),
    #[error("Invalid environment variable {0}: {1}")]
    InvalidEnvVar(String, String),
}

/// Server application configuration.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// `SQLite` database connection URL
    pub database_url: SecretString,
    /// IP address to bind the server to
    pub host: IpAddr,
    /// Port to listen on
    pub port: u16,
    /// Allowed CORS origins
    pub cors_origins: Vec<String>,
    /// Access token lifetime in minutes
    pub access_token_minutes: i64,
    /// Refresh token lifetime in days
    pub refresh_token_days: i64,
    /// Workflow engine trigger configuration
    pub workflow: WorkflowConfig,
    /// Sentry DSN for error tracking
    pub sentry_dsn: Option<String>,
}

/// Workflow engine trigger configuration.
///
/// Implements `Debug` manually to redact the password.
#[derive(Clone)]
pub struct WorkflowConfig {
    /// Base URL of the workflow engine
    pub url: String,
    /// Basic-auth username
    pub username: String,
    /// Basic-auth password
    pub password: SecretString,
}

impl std::fmt::Debug for WorkflowConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WorkflowConfig")
            .field("url", &self.url)
            .field("username", &self.username)
            .field("password", &"[REDACTED]")
            .finish()
    }
}

impl ServerConfig {
    /// Load configuration from environment variables.
    ///
    /// Calls `dotenvy::dotenv()` to load from `.env` file if present.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if required variables are missing or invalid.
    pub fn from_env() -> Result<Self, ConfigError> {
        // Load .env file if present (ignore errors if not found)
        let _ = dotenvy::dotenv();

        let database_url = get_database_url("PERCHE_DATABASE_URL")?;
        let host = get_env_or_default("PERCHE_HOST", "127.0.0.1")
            .parse::<IpAddr>()
            .map_err(|e| ConfigError::InvalidEnvVar("PERCHE_HOST".to_string(), e.to_string()))?;
        let port = get_env_or_default("PERCHE_PORT", "8000")
            .parse::<u16>()
            .map_err(|e| ConfigError::InvalidEnvVar("PERCHE_PORT".to_string(), e.to_string()))?;

        let cors_origins = match get_optional_env("PERCHE_CORS_ORIGINS") {
            Some(raw) => raw
                .split(',')
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(String::from)
                .collect(),
            None => default_cors_origins(),
        };

        let access_token_minutes = parse_env_or_default("PERCHE_ACCESS_TOKEN_MINUTES", 11_520)?;
        let refresh_token_days = parse_env_or_default("PERCHE_REFRESH_TOKEN_DAYS", 30)?;

        let workflow = WorkflowConfig::from_env();
        let sentry_dsn = get_optional_env("SENTRY_DSN");

        Ok(Self {
            database_url,
            host,
            port,
            cors_origins,
            access_token_minutes,
            refresh_token_days,
            workflow,
            sentry_dsn,
        })
    }

    /// Returns the socket address for binding the server.
    #[must_use]
    pub const fn socket_addr(&self) -> SocketAddr {
        SocketAddr::new(self.host, self.port)
    }
}

impl WorkflowConfig {
    fn from_env() -> Self {
        Self {
            url: get_env_or_default("PERCHE_WORKFLOW_URL", "http://localhost:8080"),
            username: get_env_or_default("PERCHE_WORKFLOW_USERNAME", "admin"),
            password: SecretString::from(get_env_or_default("PERCHE_WORKFLOW_PASSWORD", "admin")),
        }
    }
}

/// Default CORS origins for local frontend development.
fn default_cors_origins() -> Vec<String> {
    [
        "http://localhost:3001",
        "http://localhost:3000",
        "http://127.0.0.1:3001",
        "http://127.0.0.1:3000",
    ]
    .iter()
    .map(ToString::to_string)
    .collect()
}

// =============================================================================
// Helper Functions
// =============================================================================

/// Get database URL with fallback to generic `DATABASE_URL`.
fn get_database_url(primary_key: &str) -> Result<SecretString, ConfigError> {
    if let Ok(value) = std::env::var(primary_key) {
        return Ok(SecretString::from(value));
    }
    if let Ok(value) = std::env::var("DATABASE_URL") {
        return Ok(SecretString::from(value));
    }
    Err(ConfigError::MissingEnvVar(primary_key.to_string()))
}

/// Get an optional environment variable.
fn get_optional_env(key: &str) -> Option<String> {
    std::env::var(key).ok()
}

/// Get an environment variable with a default value.
fn get_env_or_default(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.to_string())
}

/// Parse an integer environment variable with a default value.
fn parse_env_or_default(key: &str, default: i64) -> Result<i64, ConfigError> {
    match std::env::var(key) {
        Ok(raw) => raw
            .parse::<i64>()
            .map_err(|e| ConfigError::InvalidEnvVar(key.to_string(), e.to_string())),
        Err(_) => Ok(default),
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_default_cors_origins() {
        let origins = default_cors_origins();
        assert_eq!(origins.len(), 4);
        assert!(origins.contains(&"http://localhost:3000".to_string()));
    }

    #[test]
    fn test_socket_addr() {
        let config = ServerConfig {
            database_url: SecretString::from("sqlite::memory:"),
            host: "127.0.0.1".parse().unwrap(),
            port: 8000,
            cors_origins: default_cors_origins(),
            access_token_minutes: 11_520,
            refresh_token_days: 30,
            workflow: WorkflowConfig {
                url: "http://localhost:8080".to_string(),
                username: "admin".to_string(),
                password: SecretString::from("admin"),
            },
            sentry_dsn: None,
        };

        let addr = config.socket_addr();
        assert_eq!(addr.ip().to_string(), "127.0.0.1");
        assert_eq!(addr.port(), 8000);
    }

    #[test]
    fn test_workflow_config_debug_redacts_password() {
        let config = WorkflowConfig {
            url: "http://localhost:8080".to_string(),
            username: "admin".to_string(),
            password: SecretString::from("super_secret_password"),
        };

        let debug_output = format!("{config:?}");
        assert!(debug_output.contains("admin"));
        assert!(debug_output.contains("[REDACTED]"));
        assert!(!debug_output.contains("super_secret_password"));
    }
}
