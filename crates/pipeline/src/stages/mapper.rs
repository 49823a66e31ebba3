//! Field mapper: crawled records -> canonical schema.
//!
//! Applies the user-supplied target-field -> source-field table to every
//! record. Source fields support dotted paths (`variants.0.price`). Missing
//! source fields are reported per record, not silently dropped; values pass
//! through without coercion.

use perche_core::FieldMappings;
use tracing::{info, instrument};

use super::FieldMapper;
use crate::context::{CrawledCatalog, MappedCatalog, MissingField};
use crate::error::StageError;

/// Stage name used in errors and logs.
const STAGE: &str = "map_fields";

/// Mapper driven by the wizard's mapping table.
#[derive(Debug, Clone, Copy, Default)]
pub struct TableFieldMapper;

impl FieldMapper for TableFieldMapper {
    #[instrument(skip_all, fields(records = catalog.records.len(), mappings = mappings.len()))]
    fn map_fields(
        &self,
        catalog: &CrawledCatalog,
        mappings: &FieldMappings,
    ) -> Result<MappedCatalog, StageError> {
        if mappings.is_empty() {
            return Err(StageError::InvalidInput {
                stage: STAGE,
                message: "field mapping table is empty".to_string(),
            });
        }

        let mut records = Vec::with_capacity(catalog.records.len());
        let mut missing_fields = Vec::new();

        for (record_index, record) in catalog.records.iter().enumerate() {
            let mut mapped = serde_json::Map::new();

            for (target, source) in mappings.iter() {
                match lookup_path(record, source) {
                    Some(value) => {
                        mapped.insert(target.to_owned(), value.clone());
                    }
                    None => {
                        missing_fields.push(MissingField {
                            record_index,
                            target: target.to_owned(),
                            source: source.to_owned(),
                        });
                        mapped.insert(target.to_owned(), serde_json::Value::Null);
                    }
                }
            }

            records.push(serde_json::Value::Object(mapped));
        }

        info!(
            mapped = records.len(),
            missing = missing_fields.len(),
            "field mapping completed"
        );

        Ok(MappedCatalog {
            records,
            missing_fields,
        })
    }
}

/// Resolve a dotted path against a JSON value.
///
/// Path segments index objects by key and arrays by decimal position.
fn lookup_path<'a>(value: &'a serde_json::Value, path: &str) -> Option<&'a serde_json::Value> {
    let mut current = value;
    for segment in path.split('.') {
        current = match current {
            serde_json::Value::Object(map) => map.get(segment)?,
            serde_json::Value::Array(items) => items.get(segment.parse::<usize>().ok()?)?,
            _ => return None,
        };
    }
    Some(current)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use serde_json::json;

    use super::*;

    fn catalog(records: Vec<serde_json::Value>) -> CrawledCatalog {
        CrawledCatalog {
            store_url: "https://store.example.com".to_owned(),
            records,
            pages_fetched: 1,
        }
    }

    fn mappings(pairs: &[(&str, &str)]) -> FieldMappings {
        pairs
            .iter()
            .map(|(t, s)| ((*t).to_owned(), (*s).to_owned()))
            .collect()
    }

    #[test]
    fn test_maps_flat_fields() {
        let mapper = TableFieldMapper;
        let mapped = mapper
            .map_fields(
                &catalog(vec![json!({"title": "Widget", "vendor": "Acme"})]),
                &mappings(&[("name", "title"), ("brand", "vendor")]),
            )
            .unwrap();

        assert_eq!(mapped.records, vec![json!({"brand": "Acme", "name": "Widget"})]);
        assert!(mapped.missing_fields.is_empty());
    }

    #[test]
    fn test_maps_dotted_paths() {
        let mapper = TableFieldMapper;
        let record = json!({"title": "Widget", "variants": [{"price": "9.99"}]});
        let mapped = mapper
            .map_fields(
                &catalog(vec![record]),
                &mappings(&[("price", "variants.0.price")]),
            )
            .unwrap();

        assert_eq!(mapped.records, vec![json!({"price": "9.99"})]);
    }

    #[test]
    fn test_missing_source_fields_are_reported() {
        let mapper = TableFieldMapper;
        let mapped = mapper
            .map_fields(
                &catalog(vec![
                    json!({"title": "Widget"}),
                    json!({"name_only": "Gadget"}),
                ]),
                &mappings(&[("name", "title")]),
            )
            .unwrap();

        // Second record has no `title`; mapped to null and reported.
        assert_eq!(mapped.records.len(), 2);
        assert_eq!(mapped.records.get(1).unwrap(), &json!({"name": null}));
        assert_eq!(
            mapped.missing_fields,
            vec![MissingField {
                record_index: 1,
                target: "name".to_owned(),
                source: "title".to_owned(),
            }]
        );
    }

    #[test]
    fn test_empty_mapping_table_is_fatal() {
        let mapper = TableFieldMapper;
        let err = mapper
            .map_fields(&catalog(vec![json!({})]), &FieldMappings::new())
            .unwrap_err();

        assert!(!err.is_transient());
        assert!(matches!(err, StageError::InvalidInput { .. }));
    }

    #[test]
    fn test_values_pass_through_without_coercion() {
        let mapper = TableFieldMapper;
        let mapped = mapper
            .map_fields(
                &catalog(vec![json!({"price": 9.99, "tags": ["a", "b"]})]),
                &mappings(&[("cost", "price"), ("labels", "tags")]),
            )
            .unwrap();

        assert_eq!(
            mapped.records,
            vec![json!({"cost": 9.99, "labels": ["a", "b"]})]
        );
    }
}
