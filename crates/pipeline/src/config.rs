//! Worker configuration loaded from environment variables.
//!
//! # Environment Variables (all optional)
//!
//! - `PERCHE_PIPELINE_HOST` - Bind address (default: 127.0.0.1)
//! - `PERCHE_PIPELINE_PORT` - Listen port (default: 8080)
//! - `PERCHE_PIPELINE_USERNAME` / `PERCHE_PIPELINE_PASSWORD` - Trigger
//!   basic-auth credentials (default: admin/admin)
//! - `PERCHE_PIPELINE_WORK_DIR` - Build-context root (default: /tmp/perche-build)
//! - `PERCHE_PIPELINE_CONTAINER_ENGINE` - Engine binary (default: docker)
//! - `PERCHE_PIPELINE_CRAWL_MAX_PAGES` - Catalog page bound (default: 10)
//! - `PERCHE_PIPELINE_RETRY_MAX` - Retries per stage (default: 1)
//! - `PERCHE_PIPELINE_RETRY_DELAY_SECS` - Delay between attempts (default: 300)
//! - `SENTRY_DSN` - Sentry error tracking DSN

use std::net::{IpAddr, SocketAddr};
use std::path::PathBuf;
use std::time::Duration;

use secrecy::SecretString;
use thiserror::Error;

use crate::runner::RetryPolicy;

/// Configuration errors that can occur during loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Invalid environment variable {0}: {1}")]
    InvalidEnvVar(String, String),
}

/// Worker application configuration.
#[derive(Clone)]
pub struct PipelineConfig {
    /// IP address to bind the trigger receiver to
    pub host: IpAddr,
    /// Port to listen on
    pub port: u16,
    /// Trigger basic-auth username
    pub username: String,
    /// Trigger basic-auth password
    pub password: SecretString,
    /// Root directory for per-run build contexts
    pub work_dir: PathBuf,
    /// Container engine binary
    pub container_engine: String,
    /// Catalog crawl page bound
    pub crawl_max_pages: usize,
    /// Retries per stage (transient errors only)
    pub retry_max: u32,
    /// Delay between attempts
    pub retry_delay: Duration,
    /// Sentry DSN for error tracking
    pub sentry_dsn: Option<String>,
}

impl std::fmt::Debug for PipelineConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PipelineConfig")
            .field("host", &self.host)
            .field("port", &self.port)
            .field("username", &self.username)
            .field("password", &"[REDACTED]")
            .field("work_dir", &self.work_dir)
            .field("container_engine", &self.container_engine)
            .field("crawl_max_pages", &self.crawl_max_pages)
            .field("retry_max", &self.retry_max)
            .field("retry_delay", &self.retry_delay)
            .finish_non_exhaustive()
    }
}

impl PipelineConfig {
    /// Load configuration from environment variables.
    ///
    /// Calls `dotenvy::dotenv()` to load from `.env` file if present.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if a variable is present but invalid.
    pub fn from_env() -> Result<Self, ConfigError> {
        let _ = dotenvy::dotenv();

        let host = get_env_or_default("PERCHE_PIPELINE_HOST", "127.0.0.1")
            .parse::<IpAddr>()
            .map_err(|e| {
                ConfigError::InvalidEnvVar("PERCHE_PIPELINE_HOST".to_string(), e.to_string())
            })?;
        let port = parse_env_or_default("PERCHE_PIPELINE_PORT", 8080_u16)?;

        Ok(Self {
            host,
            port,
            username: get_env_or_default("PERCHE_PIPELINE_USERNAME", "admin"),
            password: SecretString::from(get_env_or_default("PERCHE_PIPELINE_PASSWORD", "admin")),
            work_dir: PathBuf::from(get_env_or_default(
                "PERCHE_PIPELINE_WORK_DIR",
                "/tmp/perche-build",
            )),
            container_engine: get_env_or_default("PERCHE_PIPELINE_CONTAINER_ENGINE", "docker"),
            crawl_max_pages: parse_env_or_default("PERCHE_PIPELINE_CRAWL_MAX_PAGES", 10_usize)?,
            retry_max: parse_env_or_default("PERCHE_PIPELINE_RETRY_MAX", 1_u32)?,
            retry_delay: Duration::from_secs(parse_env_or_default(
                "PERCHE_PIPELINE_RETRY_DELAY_SECS",
                300_u64,
            )?),
            sentry_dsn: std::env::var("SENTRY_DSN").ok(),
        })
    }

    /// Returns the socket address for binding the trigger receiver.
    #[must_use]
    pub const fn socket_addr(&self) -> SocketAddr {
        SocketAddr::new(self.host, self.port)
    }

    /// The per-stage retry policy.
    #[must_use]
    pub const fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy {
            max_retries: self.retry_max,
            delay: self.retry_delay,
        }
    }
}

fn get_env_or_default(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.to_string())
}

fn parse_env_or_default<T: std::str::FromStr>(key: &str, default: T) -> Result<T, ConfigError>
where
    T::Err: std::fmt::Display,
{
    match std::env::var(key) {
        Ok(raw) => raw
            .parse::<T>()
            .map_err(|e| ConfigError::InvalidEnvVar(key.to_string(), e.to_string())),
        Err(_) => Ok(default),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_debug_redacts_password() {
        let config = PipelineConfig {
            host: "127.0.0.1".parse().expect("valid ip"),
            port: 8080,
            username: "admin".to_string(),
            password: SecretString::from("super_secret"),
            work_dir: PathBuf::from("/tmp/perche-build"),
            container_engine: "docker".to_string(),
            crawl_max_pages: 10,
            retry_max: 1,
            retry_delay: Duration::from_secs(300),
            sentry_dsn: None,
        };

        let debug_output = format!("{config:?}");
        assert!(debug_output.contains("[REDACTED]"));
        assert!(!debug_output.contains("super_secret"));
    }

    #[test]
    fn test_retry_policy_from_config() {
        let config = PipelineConfig {
            host: "127.0.0.1".parse().expect("valid ip"),
            port: 8080,
            username: "admin".to_string(),
            password: SecretString::from("admin"),
            work_dir: PathBuf::from("/tmp/perche-build"),
            container_engine: "docker".to_string(),
            crawl_max_pages: 10,
            retry_max: 2,
            retry_delay: Duration::from_secs(5),
            sentry_dsn: None,
        };

        let policy = config.retry_policy();
        assert_eq!(policy.max_retries, 2);
        assert_eq!(policy.delay, Duration::from_secs(5));
    }
}
