//! Application state shared across handlers.

use std::sync::Arc;

use sqlx::SqlitePool;

use crate::config::ServerConfig;
use crate::services::auth::AuthService;
use crate::services::catalog::CatalogService;
use crate::services::connector::ConnectorService;
use crate::services::workflow::WorkflowTrigger;

/// Application state shared across all handlers.
///
/// This struct is cheaply cloneable via `Arc` and provides access to
/// shared resources like the database pool and outbound HTTP clients.
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    config: ServerConfig,
    pool: SqlitePool,
    connector: ConnectorService,
    catalog: CatalogService,
    workflow: WorkflowTrigger,
}

impl AppState {
    /// Create a new application state.
    ///
    /// # Errors
    ///
    /// Returns `reqwest::Error` if an outbound HTTP client cannot be built.
    pub fn new(config: ServerConfig, pool: SqlitePool) -> Result<Self, reqwest::Error> {
        let connector = ConnectorService::new()?;
        let catalog = CatalogService::new()?;
        let workflow = WorkflowTrigger::new(&config.workflow)?;

        Ok(Self {
            inner: Arc::new(AppStateInner {
                config,
                pool,
                connector,
                catalog,
                workflow,
            }),
        })
    }

    /// Get a reference to the server configuration.
    #[must_use]
    pub fn config(&self) -> &ServerConfig {
        &self.inner.config
    }

    /// Get a reference to the database connection pool.
    #[must_use]
    pub fn pool(&self) -> &SqlitePool {
        &self.inner.pool
    }

    /// Get a reference to the store-connection validator.
    #[must_use]
    pub fn connector(&self) -> &ConnectorService {
        &self.inner.connector
    }

    /// Get a reference to the catalog extraction service.
    #[must_use]
    pub fn catalog(&self) -> &CatalogService {
        &self.inner.catalog
    }

    /// Get a reference to the workflow trigger client.
    #[must_use]
    pub fn workflow(&self) -> &WorkflowTrigger {
        &self.inner.workflow
    }

    /// Build an authentication service over the shared pool.
    #[must_use]
    pub fn auth(&self) -> AuthService<'_> {
        AuthService::new(
            self.pool(),
            self.config().access_token_minutes,
            self.config().refresh_token_days,
        )
    }
}
