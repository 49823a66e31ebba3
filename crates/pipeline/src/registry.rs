//! In-memory run registry.
//!
//! Tracks the state of every pipeline run this worker has accepted. Runs
//! are ephemeral; the registry is not persisted across restarts.

use std::collections::HashMap;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::Serialize;
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::runner::RunReport;

/// Lifecycle state of a run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RunState {
    Queued,
    Running,
    Succeeded,
    Failed,
}

/// A tracked run.
#[derive(Debug, Clone, Serialize)]
pub struct RunRecord {
    pub id: String,
    pub state: RunState,
    pub submitted_at: DateTime<Utc>,
    /// Failure detail when `state == Failed`.
    pub detail: Option<String>,
    /// Run summary when `state == Succeeded`.
    pub report: Option<RunReport>,
}

/// Shared registry of run records.
#[derive(Clone, Default)]
pub struct RunRegistry {
    inner: Arc<RwLock<HashMap<String, RunRecord>>>,
}

impl RunRegistry {
    /// Create an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a new queued run and return its record.
    pub async fn create(&self) -> RunRecord {
        let record = RunRecord {
            id: Uuid::new_v4().to_string(),
            state: RunState::Queued,
            submitted_at: Utc::now(),
            detail: None,
            report: None,
        };
        self.inner
            .write()
            .await
            .insert(record.id.clone(), record.clone());
        record
    }

    /// Mark a run as running.
    pub async fn set_running(&self, id: &str) {
        if let Some(record) = self.inner.write().await.get_mut(id) {
            record.state = RunState::Running;
        }
    }

    /// Mark a run as succeeded with its report.
    pub async fn complete(&self, id: &str, report: RunReport) {
        if let Some(record) = self.inner.write().await.get_mut(id) {
            record.state = RunState::Succeeded;
            record.report = Some(report);
        }
    }

    /// Mark a run as failed with a detail message.
    pub async fn fail(&self, id: &str, detail: String) {
        if let Some(record) = self.inner.write().await.get_mut(id) {
            record.state = RunState::Failed;
            record.detail = Some(detail);
        }
    }

    /// Fetch a run record by ID.
    pub async fn get(&self, id: &str) -> Option<RunRecord> {
        self.inner.read().await.get(id).cloned()
    }
}
