//! Artifact packager.
//!
//! Writes a deterministic container build context (Dockerfile template plus
//! both embedding blobs at fixed paths) and builds the image under the
//! fixed tag.

use std::path::{Path, PathBuf};

use tokio::process::Command;
use tracing::{info, instrument};

use super::ArtifactPackager;
use crate::context::{BuiltImage, EmbeddingSet};
use crate::error::StageError;

/// Stage name used in errors and logs.
const STAGE: &str = "package_artifact";

/// Image tag of the packaged artifact.
pub const IMAGE_TAG: &str = "sdk-wizard-app:latest";

/// In-context path of the chromadb embeddings blob.
pub const CHROMADB_EMBEDDINGS_FILE: &str = "embeddings/chromadb_embeddings.pkl";

/// In-context path of the faiss embeddings blob.
pub const FAISS_EMBEDDINGS_FILE: &str = "embeddings/faiss_embeddings.pkl";

/// Fixed Dockerfile template for the packaged artifact.
const DOCKERFILE: &str = "\
FROM python:3.9-slim

WORKDIR /app

# Copy embeddings
COPY embeddings /app/embeddings

# Install dependencies
COPY requirements.txt .
RUN pip install -r requirements.txt

# Copy application code
COPY . .

# Command to run the application
CMD [\"python\", \"app.py\"]
";

/// Packager that drives the container engine CLI.
pub struct DockerPackager {
    engine: String,
    context_dir: PathBuf,
}

impl DockerPackager {
    /// Create a packager that assembles its build context in `context_dir`.
    #[must_use]
    pub fn new(engine: impl Into<String>, context_dir: impl Into<PathBuf>) -> Self {
        Self {
            engine: engine.into(),
            context_dir: context_dir.into(),
        }
    }

    /// Write the deterministic build-context layout.
    ///
    /// # Errors
    ///
    /// Returns a fatal [`StageError::Io`] on filesystem failure.
    pub fn write_build_context(
        dir: &Path,
        chromadb: &EmbeddingSet,
        faiss: &EmbeddingSet,
    ) -> Result<(), StageError> {
        let io_err = |message: String| StageError::Io {
            stage: STAGE,
            message,
        };

        std::fs::create_dir_all(dir.join("embeddings"))
            .map_err(|e| io_err(format!("failed to create build context: {e}")))?;

        std::fs::write(dir.join("Dockerfile"), DOCKERFILE)
            .map_err(|e| io_err(format!("failed to write Dockerfile: {e}")))?;

        std::fs::write(dir.join(CHROMADB_EMBEDDINGS_FILE), &chromadb.data)
            .map_err(|e| io_err(format!("failed to write chromadb embeddings: {e}")))?;

        std::fs::write(dir.join(FAISS_EMBEDDINGS_FILE), &faiss.data)
            .map_err(|e| io_err(format!("failed to write faiss embeddings: {e}")))?;

        Ok(())
    }

    /// Arguments of the image build command.
    fn build_args(context_dir: &Path) -> Vec<String> {
        vec![
            "build".to_owned(),
            "-t".to_owned(),
            IMAGE_TAG.to_owned(),
            context_dir.display().to_string(),
        ]
    }
}

impl ArtifactPackager for DockerPackager {
    #[instrument(skip_all, fields(context_dir = %self.context_dir.display()))]
    async fn package(
        &self,
        chromadb: &EmbeddingSet,
        faiss: &EmbeddingSet,
    ) -> Result<BuiltImage, StageError> {
        Self::write_build_context(&self.context_dir, chromadb, faiss)?;

        let output = Command::new(&self.engine)
            .args(Self::build_args(&self.context_dir))
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

        info!(tag = IMAGE_TAG, "image built");
        Ok(BuiltImage {
            tag: IMAGE_TAG.to_owned(),
            context_dir: self.context_dir.clone(),
        })
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn blob(builder: &'static str, bytes: &[u8]) -> EmbeddingSet {
        EmbeddingSet {
            builder,
            data: bytes.to_vec(),
        }
    }

    #[test]
    fn test_build_context_layout() {
        let dir = std::env::temp_dir().join(format!("perche-pack-test-{}", uuid::Uuid::new_v4()));

        DockerPackager::write_build_context(
            &dir,
            &blob("chromadb", b"chroma-bytes"),
            &blob("faiss", b"faiss-bytes"),
        )
        .unwrap();

        let dockerfile = std::fs::read_to_string(dir.join("Dockerfile")).unwrap();
        assert!(dockerfile.contains("COPY embeddings /app/embeddings"));
        assert!(dockerfile.starts_with("FROM python:3.9-slim"));

        assert_eq!(
            std::fs::read(dir.join("embeddings/chromadb_embeddings.pkl")).unwrap(),
            b"chroma-bytes"
        );
        assert_eq!(
            std::fs::read(dir.join("embeddings/faiss_embeddings.pkl")).unwrap(),
            b"faiss-bytes"
        );

        std::fs::remove_dir_all(&dir).unwrap();
    }

    #[test]
    fn test_build_command_arguments() {
        let args = DockerPackager::build_args(Path::new("/tmp/ctx"));
        assert_eq!(args, vec!["build", "-t", "sdk-wizard-app:latest", "/tmp/ctx"]);
    }

    #[tokio::test]
    async fn test_missing_engine_is_fatal() {
        let dir = std::env::temp_dir().join(format!("perche-pack-test-{}", uuid::Uuid::new_v4()));
        let packager = DockerPackager::new("definitely-not-a-container-engine", &dir);

        let err = packager
            .package(&blob("chromadb", b"a"), &blob("faiss", b"b"))
            .await
            .unwrap_err();
        assert!(!err.is_transient());
        assert!(matches!(err, StageError::Command { .. }));

        let _ = std::fs::remove_dir_all(&dir);
    }
}
