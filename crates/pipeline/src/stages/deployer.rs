//! Deployer.
//!
//! Starts a detached container of the packaged image, publishing the fixed
//! port and pointing the embedding-path environment variables at the blobs
//! baked into the image.

use tokio::process::Command;
use tracing::{info, instrument};

use super::Deployer;
use crate::context::{BuiltImage, Deployment};
use crate::error::StageError;

/// Stage name used in errors and logs.
const STAGE: &str = "deploy";

/// Port the deployed artifact is published on.
pub const PUBLISHED_PORT: u16 = 5000;

/// Environment variable pointing at the chromadb blob inside the container.
pub const CHROMADB_PATH_ENV: &str = "CHROMADB_EMBEDDINGS_PATH=/app/embeddings/chromadb_embeddings.pkl";

/// Environment variable pointing at the faiss blob inside the container.
pub const FAISS_PATH_ENV: &str = "FAISS_EMBEDDINGS_PATH=/app/embeddings/faiss_embeddings.pkl";

/// Deployer that drives the container engine CLI.
pub struct DockerDeployer {
    engine: String,
}

impl DockerDeployer {
    /// Create a deployer for the given container engine binary.
    #[must_use]
    pub fn new(engine: impl Into<String>) -> Self {
        Self {
            engine: engine.into(),
        }
    }

    /// Arguments of the container run command.
    fn run_args(tag: &str) -> Vec<String> {
        vec![
            "run".to_owned(),
            "-d".to_owned(),
            "-p".to_owned(),
            format!("{PUBLISHED_PORT}:{PUBLISHED_PORT}"),
            "-e".to_owned(),
            CHROMADB_PATH_ENV.to_owned(),
            "-e".to_owned(),
            FAISS_PATH_ENV.to_owned(),
            tag.to_owned(),
        ]
    }
}

impl Deployer for DockerDeployer {
    #[instrument(skip_all, fields(tag = %image.tag))]
    async fn deploy(&self, image: &BuiltImage) -> Result<Deployment, StageError> {
        let output = Command::new(&self.engine)
            .args(Self::run_args(&image.tag))
            .output()
            .await
            .map_err(|e| StageError::Command {
                stage: STAGE,
                message: format!("failed to run {}: {e}", self.engine),
            })?;

        if !output.status.success() {
            return Err(StageError::Command {
                stage: STAGE,
                message: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            });
        }

        let container_id = String::from_utf8_lossy(&output.stdout).trim().to_string();
        if container_id.is_empty() {
            return Err(StageError::Command {
                stage: STAGE,
                message: "container engine returned no container id".to_string(),
            });
        }

        info!(%container_id, port = PUBLISHED_PORT, "container started");
        Ok(Deployment {
            container_id,
            port: PUBLISHED_PORT,
        })
    }
}
