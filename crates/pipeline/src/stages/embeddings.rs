//! Embedding builders.
//!
//! Two alternative vector-index representations feed the packaged artifact:
//! `chromadb` and `faiss`. The index computation itself is an external
//! concern with no decided backend, chunking, or distance metric; the
//! shipped builders return an explicit contract error rather than inventing
//! one. The orchestration around them (concurrent build, packaging of both
//! blobs) is fully wired and tested against substitute builders.

use super::EmbeddingBuilder;
use crate::context::{EmbeddingSet, MappedCatalog};
use crate::error::StageError;

/// Builder name for the chromadb index, fixed by the artifact contract.
pub const CHROMADB_BUILDER: &str = "chromadb";

/// Builder name for the faiss index, fixed by the artifact contract.
pub const FAISS_BUILDER: &str = "faiss";

/// Placeholder chromadb index builder.
#[derive(Debug, Clone, Copy, Default)]
pub struct ChromaDbBuilder;

impl EmbeddingBuilder for ChromaDbBuilder {
    fn name(&self) -> &'static str {
        CHROMADB_BUILDER
    }

    async fn build(&self, _catalog: &MappedCatalog) -> Result<EmbeddingSet, StageError> {
        Err(StageError::Unimplemented {
            stage: "chromadb_embeddings",
            message: "no chromadb index backend is wired up",
        })
    }
}

/// Placeholder faiss index builder.
#[derive(Debug, Clone, Copy, Default)]
pub struct FaissBuilder;

impl EmbeddingBuilder for FaissBuilder {
    fn name(&self) -> &'static str {
        FAISS_BUILDER
    }

    async fn build(&self, _catalog: &MappedCatalog) -> Result<EmbeddingSet, StageError> {
        Err(StageError::Unimplemented {
            stage: "faiss_embeddings",
            message: "no faiss index backend is wired up",
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn empty_catalog() -> MappedCatalog {
        MappedCatalog {
            records: Vec::new(),
            missing_fields: Vec::new(),
        }
    }

    #[tokio::test]
    async fn test_builders_fail_fatally_until_backend_exists() {
        let err = ChromaDbBuilder.build(&empty_catalog()).await.unwrap_err();
        assert!(!err.is_transient());
        assert_eq!(err.stage(), "chromadb_embeddings");

        let err = FaissBuilder.build(&empty_catalog()).await.unwrap_err();
        assert!(!err.is_transient());
        assert_eq!(err.stage(), "faiss_embeddings");
    }

    #[test]
    fn test_builder_names_match_artifact_contract() {
        assert_eq!(ChromaDbBuilder.name(), "chromadb");
        assert_eq!(FaissBuilder.name(), "faiss");
    }
}
