//! Workflow engine trigger client.
//!
//! Posts the wizard configuration to the workflow engine's REST API with
//! fixed basic-auth credentials. The conf blob becomes the pipeline run's
//! initial context.

use secrecy::ExposeSecret;
use serde_json::json;
use tracing::instrument;

use crate::config::WorkflowConfig;

/// DAG identifier of the SDK wizard pipeline.
pub const WORKFLOW_DAG_ID: &str = "sdk-wizard-workflow";

/// Errors from triggering the workflow engine.
#[derive(Debug, thiserror::Error)]
pub enum WorkflowError {
    /// The trigger request failed.
    #[error("trigger request failed: {0}")]
    Request(#[from] reqwest::Error),

    /// The engine rejected the trigger.
    #[error("workflow engine returned {0}")]
    Status(reqwest::StatusCode),
}

/// Client for the workflow engine trigger API.
#[derive(Clone)]
pub struct WorkflowTrigger {
    client: reqwest::Client,
    url: String,
    username: String,
    password: secrecy::SecretString,
}

impl WorkflowTrigger {
    /// Create a new trigger client from configuration.
    ///
    /// # Errors
    ///
    /// Returns `reqwest::Error` if the HTTP client cannot be built.
    pub fn new(config: &WorkflowConfig) -> Result<Self, reqwest::Error> {
        let client = reqwest::Client::builder().build()?;
        Ok(Self {
            client,
            url: config.url.clone(),
            username: config.username.clone(),
            password: config.password.clone(),
        })
    }

    /// Trigger a pipeline run with the given configuration blob.
    ///
    /// # Errors
    ///
    /// Returns [`WorkflowError::Status`] when the engine answers with a
    /// non-success status, [`WorkflowError::Request`] on transport failure.
    #[instrument(skip(self, conf))]
    pub async fn trigger(
        &self,
        conf: &serde_json::Value,
    ) -> Result<serde_json::Value, WorkflowError> {
        let url = format!(
            "{}/api/v1/dags/{WORKFLOW_DAG_ID}/runs",
            self.url.trim_end_matches('/')
        );

        let response = self
            .client
            .post(url)
            .basic_auth(&self.username, Some(self.password.expose_secret()))
            .json(&json!({ "conf": conf }))
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(WorkflowError::Status(status));
        }

        Ok(response.json().await?)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use secrecy::SecretString;
    use serde_json::json;
    use wiremock::matchers::{basic_auth, body_partial_json, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    use super::*;

    fn config(url: &str) -> WorkflowConfig {
        WorkflowConfig {
            url: url.to_owned(),
            username: "admin".to_owned(),
            password: SecretString::from("admin"),
        }
    }

    #[tokio::test]
    async fn test_trigger_posts_conf_with_basic_auth() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/v1/dags/sdk-wizard-workflow/runs"))
            .and(basic_auth("admin", "admin"))
            .and(body_partial_json(
                json!({"conf": {"store_url": "https://store.example.com"}}),
            ))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(json!({"run_id": "abc", "state": "queued"})),
            )
            .mount(&server)
            .await;

        let trigger = WorkflowTrigger::new(&config(&server.uri())).unwrap();
        let conf = json!({"store_url": "https://store.example.com"});
        let result = trigger.trigger(&conf).await.unwrap();
        assert_eq!(result["state"], "queued");
    }

    #[tokio::test]
    async fn test_trigger_engine_rejection() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/v1/dags/sdk-wizard-workflow/runs"))
            .respond_with(ResponseTemplate::new(401))
            .mount(&server)
            .await;

        let trigger = WorkflowTrigger::new(&config(&server.uri())).unwrap();
        let err = trigger.trigger(&json!({})).await.unwrap_err();
        assert!(matches!(err, WorkflowError::Status(status) if status.as_u16() == 401));
    }
}
