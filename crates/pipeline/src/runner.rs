//! Pipeline orchestrator.
//!
//! Runs the stages in order - crawl -> map -> both embedding builders ->
//! package -> deploy - with the one fan-out/fan-in point around the
//! builders. Each stage runs under the retry policy; only transient errors
//! are retried, fatal errors abort the run immediately.

use std::future::Future;
use std::time::Duration;

use serde::Serialize;
use tracing::{info, instrument, warn};

use crate::context::WizardSubmission;
use crate::error::StageError;
use crate::stages::{ArtifactPackager, CatalogCrawler, Deployer, EmbeddingBuilder, FieldMapper};

/// Uniform per-stage retry policy.
#[derive(Debug, Clone, Copy)]
pub struct RetryPolicy {
    /// Additional attempts after the first failure.
    pub max_retries: u32,
    /// Delay between attempts.
    pub delay: Duration,
}

impl Default for RetryPolicy {
    /// One retry with a five-minute delay.
    fn default() -> Self {
        Self {
            max_retries: 1,
            delay: Duration::from_secs(300),
        }
    }
}

/// Summary of a completed run.
#[derive(Debug, Clone, Serialize)]
pub struct RunReport {
    pub records_crawled: usize,
    pub pages_fetched: usize,
    pub records_mapped: usize,
    pub missing_fields: usize,
    pub image_tag: String,
    pub container_id: String,
    pub port: u16,
}

/// Orchestrator generic over the stage seams.
pub struct PipelineRunner<C, M, B1, B2, P, D> {
    crawler: C,
    mapper: M,
    chromadb: B1,
    faiss: B2,
    packager: P,
    deployer: D,
    retry: RetryPolicy,
}

impl<C, M, B1, B2, P, D> PipelineRunner<C, M, B1, B2, P, D>
where
    C: CatalogCrawler,
    M: FieldMapper,
    B1: EmbeddingBuilder,
    B2: EmbeddingBuilder,
    P: ArtifactPackager,
    D: Deployer,
{
    /// Assemble a runner from its stages.
    pub const fn new(
        crawler: C,
        mapper: M,
        chromadb: B1,
        faiss: B2,
        packager: P,
        deployer: D,
        retry: RetryPolicy,
    ) -> Self {
        Self {
            crawler,
            mapper,
            chromadb,
            faiss,
            packager,
            deployer,
            retry,
        }
    }

    /// Execute a full run for one wizard submission.
    ///
    /// # Errors
    ///
    /// Returns the first [`StageError`] that survives the retry policy.
    #[instrument(skip_all, fields(user_id = submission.user_id, store_url = %submission.store_url))]
    pub async fn run(&self, submission: &WizardSubmission) -> Result<RunReport, StageError> {
        let catalog = self
            .with_retry("crawl_catalog", || self.crawler.crawl(submission))
            .await?;

        let mapped = self
            .mapper
            .map_fields(&catalog, &submission.field_mappings)?;

        // Fan-out: both builders take the same mapped data and run
        // concurrently; packaging waits for both.
        let (chromadb, faiss) = tokio::join!(
            self.with_retry(self.chromadb.name(), || self.chromadb.build(&mapped)),
            self.with_retry(self.faiss.name(), || self.faiss.build(&mapped)),
        );
        let (chromadb, faiss) = (chromadb?, faiss?);

        let image = self
            .with_retry("package_artifact", || {
                self.packager.package(&chromadb, &faiss)
            })
            .await?;

        let deployment = self
            .with_retry("deploy", || self.deployer.deploy(&image))
            .await?;

        info!(
            container_id = %deployment.container_id,
            port = deployment.port,
            "pipeline run completed"
        );

        Ok(RunReport {
            records_crawled: catalog.records.len(),
            pages_fetched: catalog.pages_fetched,
            records_mapped: mapped.records.len(),
            missing_fields: mapped.missing_fields.len(),
            image_tag: image.tag,
            container_id: deployment.container_id,
            port: deployment.port,
        })
    }

    /// Run a stage under the retry policy.
    ///
    /// Transient errors are retried up to `max_retries` times with the
    /// configured delay; fatal errors propagate immediately.
    async fn with_retry<T, F, Fut>(&self, stage: &str, mut op: F) -> Result<T, StageError>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, StageError>>,
    {
        let mut attempt: u32 = 0;
        loop {
            match op().await {
                Ok(value) => return Ok(value),
                Err(e) if e.is_transient() && attempt < self.retry.max_retries => {
                    attempt += 1;
                    warn!(
                        stage,
                        attempt,
                        error = %e,
                        delay_secs = self.retry.delay.as_secs(),
                        "transient stage failure, retrying"
                    );
                    tokio::time::sleep(self.retry.delay).await;
                }
                Err(e) => return Err(e),
            }
        }
    }
}
