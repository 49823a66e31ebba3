//! Field-mapping table for catalog normalization.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// A user-supplied mapping from canonical target fields to source fields.
///
/// Keys are the canonical field names the SDK expects; values are the field
/// names as they appear in the crawled catalog records. Iteration order is
/// stable (sorted by target field) so mapped output is deterministic.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FieldMappings(BTreeMap<String, String>);

impl FieldMappings {
    /// Create an empty mapping table.
    #[must_use]
    pub const fn new() -> Self {
        Self(BTreeMap::new())
    }

    /// Insert a target → source pair, replacing any previous source.
    pub fn insert(&mut self, target: impl Into<String>, source: impl Into<String>) {
        self.0.insert(target.into(), source.into());
    }

    /// Look up the source field for a target field.
    #[must_use]
    pub fn source_for(&self, target: &str) -> Option<&str> {
        self.0.get(target).map(String::as_str)
    }

    /// Iterate over (target, source) pairs in target order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0.iter().map(|(t, s)| (t.as_str(), s.as_str()))
    }

    /// Number of mapped fields.
    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Whether the mapping table is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl FromIterator<(String, String)> for FieldMappings {
    fn from_iter<I: IntoIterator<Item = (String, String)>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_insert_and_lookup() {
        let mut mappings = FieldMappings::new();
        mappings.insert("name", "title");
        mappings.insert("price", "variants.0.price");

        assert_eq!(mappings.source_for("name"), Some("title"));
        assert_eq!(mappings.source_for("missing"), None);
        assert_eq!(mappings.len(), 2);
    }

    #[test]
    fn test_iteration_is_sorted_by_target() {
        let mut mappings = FieldMappings::new();
        mappings.insert("z_field", "a");
        mappings.insert("a_field", "b");

        let targets: Vec<&str> = mappings.iter().map(|(t, _)| t).collect();
        assert_eq!(targets, vec!["a_field", "z_field"]);
    }

    #[test]
    fn test_serde_transparent_object() {
        let mut mappings = FieldMappings::new();
        mappings.insert("name", "title");

        let json = serde_json::to_string(&mappings).unwrap();
        assert_eq!(json, r#"{"name":"title"}"#);

        let parsed: FieldMappings = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, mappings);
    }
}
