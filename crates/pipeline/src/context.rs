//! Typed pipeline context.
//!
//! Each stage consumes the previous stage's output and produces the next;
//! nothing passes through an ambient task store. All intermediates are
//! in-memory and scoped to one run.

use std::path::PathBuf;

use perche_core::FieldMappings;
use serde::{Deserialize, Serialize};

/// The trigger payload: a completed wizard submission.
///
/// This is the `conf` blob the admin API posts when a user finishes the
/// wizard.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WizardSubmission {
    pub user_id: i64,
    /// Platform name as entered; validated by the crawler.
    pub platform: String,
    pub store_url: String,
    /// Absent and `null` both mean "no mappings yet".
    #[serde(default, deserialize_with = "null_as_default")]
    pub field_mappings: FieldMappings,
    #[serde(default)]
    pub woo_commerce_client_key: Option<String>,
    #[serde(default)]
    pub woo_commerce_secret_key: Option<String>,
}

/// Deserialize JSON `null` as the type's default value.
fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: serde::Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

/// Output of the crawl stage: raw catalog records.
#[derive(Debug, Clone)]
pub struct CrawledCatalog {
    pub store_url: String,
    pub records: Vec<serde_json::Value>,
    pub pages_fetched: usize,
}

/// A source field a mapping asked for that a record did not have.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MissingField {
    pub record_index: usize,
    pub target: String,
    pub source: String,
}

/// Output of the mapping stage: canonical records plus a report of the
/// source fields that were missing.
#[derive(Debug, Clone)]
pub struct MappedCatalog {
    pub records: Vec<serde_json::Value>,
    pub missing_fields: Vec<MissingField>,
}

/// A serialized vector index produced by one embedding builder.
#[derive(Debug, Clone)]
pub struct EmbeddingSet {
    /// Builder name; fixed by the artifact contract.
    pub builder: &'static str,
    pub data: Vec<u8>,
}

/// A built container image.
#[derive(Debug, Clone)]
pub struct BuiltImage {
    pub tag: String,
    pub context_dir: PathBuf,
}

/// A running deployment of the packaged artifact.
#[derive(Debug, Clone)]
pub struct Deployment {
    pub container_id: String,
    pub port: u16,
}
