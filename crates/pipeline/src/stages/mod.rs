//! Pipeline stage trait seams and their shipped implementations.
//!
//! Stage order: crawl -> map -> (chromadb || faiss) -> package -> deploy.
//! The orchestrator in [`crate::runner`] is generic over these traits so
//! tests can substitute any stage.

pub mod crawler;
pub mod deployer;
pub mod embeddings;
pub mod mapper;
pub mod packager;

use std::future::Future;

use perche_core::FieldMappings;

use crate::context::{
    BuiltImage, CrawledCatalog, Deployment, EmbeddingSet, MappedCatalog, WizardSubmission,
};
use crate::error::StageError;

/// Retrieves catalog records from a storefront.
pub trait CatalogCrawler: Send + Sync {
    /// Crawl the store named by the submission.
    fn crawl(
        &self,
        submission: &WizardSubmission,
    ) -> impl Future<Output = Result<CrawledCatalog, StageError>> + Send;
}

/// Transforms crawled records into the canonical schema.
pub trait FieldMapper: Send + Sync {
    /// Apply the mapping table to every crawled record.
    ///
    /// # Errors
    ///
    /// Returns a fatal [`StageError`] for unusable input (e.g. an empty
    /// mapping table).
    fn map_fields(
        &self,
        catalog: &CrawledCatalog,
        mappings: &FieldMappings,
    ) -> Result<MappedCatalog, StageError>;
}

/// Computes one vector-index representation of the mapped catalog.
pub trait EmbeddingBuilder: Send + Sync {
    /// Builder name; fixed by the artifact contract.
    fn name(&self) -> &'static str;

    /// Build the index blob for the mapped records.
    fn build(
        &self,
        catalog: &MappedCatalog,
    ) -> impl Future<Output = Result<EmbeddingSet, StageError>> + Send;
}

/// Bundles both embedding sets into a deployable image.
pub trait ArtifactPackager: Send + Sync {
    /// Write the build context and build the image.
    fn package(
        &self,
        chromadb: &EmbeddingSet,
        faiss: &EmbeddingSet,
    ) -> impl Future<Output = Result<BuiltImage, StageError>> + Send;
}

/// Starts a running instance of the packaged artifact.
pub trait Deployer: Send + Sync {
    /// Start a container for the built image.
    fn deploy(
        &self,
        image: &BuiltImage,
    ) -> impl Future<Output = Result<Deployment, StageError>> + Send;
}
