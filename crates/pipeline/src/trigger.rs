//! Trigger receiver.
//!
//! HTTP surface of the worker: accepts a wizard-completion signal (the
//! `conf` blob posted by the admin API, authenticated with fixed basic-auth
//! credentials), registers a run, and executes it on a spawned task.

use std::sync::Arc;

use axum::Json;
use axum::extract::{Path, State};
use axum::http::{HeaderMap, StatusCode, header};
use axum::routing::{get, post};
use axum::Router;
use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use secrecy::ExposeSecret;
use serde::Deserialize;
use serde_json::{Value, json};
use tower_http::trace::TraceLayer;
use tracing::{error, info};

use crate::config::PipelineConfig;
use crate::context::WizardSubmission;
use crate::error::StageError;
use crate::registry::{RunRecord, RunRegistry};
use crate::runner::PipelineRunner;
use crate::stages::crawler::StorefrontCrawler;
use crate::stages::deployer::DockerDeployer;
use crate::stages::embeddings::{ChromaDbBuilder, FaissBuilder};
use crate::stages::mapper::TableFieldMapper;
use crate::stages::packager::DockerPackager;

/// Trigger request body: the pipeline's initial context.
#[derive(Debug, Deserialize)]
pub struct TriggerRequest {
    pub conf: WizardSubmission,
}

/// Shared worker state.
#[derive(Clone)]
pub struct WorkerState {
    config: Arc<PipelineConfig>,
    registry: RunRegistry,
}

impl WorkerState {
    /// Create worker state from configuration.
    #[must_use]
    pub fn new(config: PipelineConfig) -> Self {
        Self {
            config: Arc::new(config),
            registry: RunRegistry::new(),
        }
    }
}

/// Build the worker router.
#[must_use]
pub fn app(state: WorkerState) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/api/v1/dags/sdk-wizard-workflow/runs", post(trigger_run))
        .route(
            "/api/v1/dags/sdk-wizard-workflow/runs/{run_id}",
            get(get_run),
        )
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Liveness health check endpoint.
async fn health() -> &'static str {
    "ok"
}

type ApiError = (StatusCode, Json<Value>);

fn unauthorized() -> ApiError {
    (
        StatusCode::UNAUTHORIZED,
        Json(json!({ "detail": "Not authenticated" })),
    )
}

/// Accept a wizard-completion signal and queue a pipeline run.
async fn trigger_run(
    State(state): State<WorkerState>,
    headers: HeaderMap,
    Json(request): Json<TriggerRequest>,
) -> Result<(StatusCode, Json<Value>), ApiError> {
    if !check_basic_auth(&headers, &state.config) {
        return Err(unauthorized());
    }

    let record = state.registry.create().await;
    info!(run_id = %record.id, user_id = request.conf.user_id, "pipeline run queued");

    let config = Arc::clone(&state.config);
    let registry = state.registry.clone();
    let run_id = record.id.clone();
    tokio::spawn(async move {
        execute_run(config, registry, run_id, request.conf).await;
    });

    Ok((
        StatusCode::CREATED,
        Json(json!({ "run_id": record.id, "state": record.state })),
    ))
}

/// Fetch the state of a run.
async fn get_run(
    State(state): State<WorkerState>,
    headers: HeaderMap,
    Path(run_id): Path<String>,
) -> Result<Json<RunRecord>, ApiError> {
    if !check_basic_auth(&headers, &state.config) {
        return Err(unauthorized());
    }

    state.registry.get(&run_id).await.map(Json).ok_or((
        StatusCode::NOT_FOUND,
        Json(json!({ "detail": "Run not found" })),
    ))
}

/// Execute one run end to end, recording the outcome in the registry.
async fn execute_run(
    config: Arc<PipelineConfig>,
    registry: RunRegistry,
    run_id: String,
    submission: WizardSubmission,
) {
    registry.set_running(&run_id).await;

    let outcome = match build_runner(&config, &run_id) {
        Ok(runner) => runner.run(&submission).await,
        Err(e) => Err(e),
    };

    match outcome {
        Ok(report) => {
            info!(run_id = %run_id, container_id = %report.container_id, "run succeeded");
            registry.complete(&run_id, report).await;
        }
        Err(e) => {
            error!(run_id = %run_id, stage = e.stage(), error = %e, "run failed");
            registry.fail(&run_id, e.to_string()).await;
        }
    }
}

/// Assemble the production stage set for one run.
fn build_runner(
    config: &PipelineConfig,
    run_id: &str,
) -> Result<
    PipelineRunner<
        StorefrontCrawler,
        TableFieldMapper,
        ChromaDbBuilder,
        FaissBuilder,
        DockerPackager,
        DockerDeployer,
    >,
    StageError,
> {
    let crawler = StorefrontCrawler::new(config.crawl_max_pages)?;
    let packager = DockerPackager::new(&config.container_engine, config.work_dir.join(run_id));
    let deployer = DockerDeployer::new(&config.container_engine);

    Ok(PipelineRunner::new(
        crawler,
        TableFieldMapper,
        ChromaDbBuilder,
        FaissBuilder,
        packager,
        deployer,
        config.retry_policy(),
    ))
}

/// Check the `Authorization: Basic` header against the configured
/// credentials.
fn check_basic_auth(headers: &HeaderMap, config: &PipelineConfig) -> bool {
    let Some(encoded) = headers
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Basic "))
    else {
        return false;
    };

    let Ok(decoded) = STANDARD.decode(encoded.trim()) else {
        return false;
    };
    let Ok(credentials) = String::from_utf8(decoded) else {
        return false;
    };
    let Some((username, password)) = credentials.split_once(':') else {
        return false;
    };

    username == config.username && password == config.password.expose_secret()
}
