//! Catalog sample extraction.
//!
//! Fetches the public `/products.json` catalog of a Shopify store and keeps
//! the first product as a field template for the mapping UI.

use std::time::Duration;

use perche_core::Platform;
use serde::Deserialize;
use tracing::instrument;

/// Request timeout for the catalog fetch.
const FETCH_TIMEOUT: Duration = Duration::from_secs(10);

/// Errors from catalog extraction.
#[derive(Debug, thiserror::Error)]
pub enum CatalogError {
    /// Extraction is only implemented for Shopify.
    #[error("Platform {0} is not supported yet")]
    UnsupportedPlatform(String),

    /// The store answered with a non-success status.
    #[error("Failed to fetch products from Shopify store: {0}")]
    UpstreamStatus(reqwest::StatusCode),

    /// The catalog is empty.
    #[error("No products found in the Shopify store")]
    NoProducts,

    /// The request itself failed.
    #[error("request failed: {0}")]
    Request(#[from] reqwest::Error),

    /// The response body was not the expected catalog shape.
    #[error("invalid catalog response: {0}")]
    InvalidResponse(String),
}

/// Shopify `/products.json` response shape (only what we use).
#[derive(Debug, Deserialize)]
struct ProductsResponse {
    #[serde(default)]
    products: Vec<serde_json::Value>,
}

/// Catalog extraction service.
#[derive(Clone)]
pub struct CatalogService {
    client: reqwest::Client,
}

impl CatalogService {
    /// Create a new catalog service.
    ///
    /// # Errors
    ///
    /// Returns `reqwest::Error` if the HTTP client cannot be built.
    pub fn new() -> Result<Self, reqwest::Error> {
        let client = reqwest::Client::builder().timeout(FETCH_TIMEOUT).build()?;
        Ok(Self { client })
    }

    /// Fetch the store catalog and return the first product.
    ///
    /// # Errors
    ///
    /// Returns [`CatalogError::UnsupportedPlatform`] for non-Shopify stores,
    /// [`CatalogError::UpstreamStatus`] on a non-200 answer, and
    /// [`CatalogError::NoProducts`] when the catalog is empty.
    #[instrument(skip(self))]
    pub async fn extract_first_product(
        &self,
        platform: &str,
        store_url: &str,
    ) -> Result<serde_json::Value, CatalogError> {
        let platform =
            Platform::parse(platform).map_err(|e| CatalogError::UnsupportedPlatform(e.0))?;
        if platform != Platform::Shopify {
            return Err(CatalogError::UnsupportedPlatform(platform.to_string()));
        }

        let products_url = format!("{}/products.json", store_url.trim_end_matches('/'));
        tracing::debug!(%products_url, "fetching store catalog");

        let response = self.client.get(&products_url).send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(CatalogError::UpstreamStatus(status));
        }

        let catalog: ProductsResponse = response
            .json()
            .await
            .map_err(|e| CatalogError::InvalidResponse(e.to_string()))?;

        catalog
            .products
            .into_iter()
            .next()
            .ok_or(CatalogError::NoProducts)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use serde_json::json;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    use super::*;

    #[tokio::test]
    async fn test_extract_first_product() {
        let server = MockServer::start().await;
        let body = json!({
            "products": [
                {"id": 1, "title": "Widget", "variants": [{"price": "9.99"}]},
                {"id": 2, "title": "Gadget"}
            ]
        });
        Mock::given(method("GET"))
            .and(path("/products.json"))
            .respond_with(ResponseTemplate::new(200).set_body_json(&body))
            .mount(&server)
            .await;

        let catalog = CatalogService::new().unwrap();
        let first = catalog
            .extract_first_product("shopify", &server.uri())
            .await
            .unwrap();
        assert_eq!(first["title"], "Widget");
    }

    #[tokio::test]
    async fn test_upstream_error_status() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/products.json"))
            .respond_with(ResponseTemplate::new(403))
            .mount(&server)
            .await;

        let catalog = CatalogService::new().unwrap();
        let err = catalog
            .extract_first_product("shopify", &server.uri())
            .await
            .unwrap_err();
        assert!(matches!(err, CatalogError::UpstreamStatus(status) if status.as_u16() == 403));
    }

    #[tokio::test]
    async fn test_empty_catalog() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/products.json"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"products": []})))
            .mount(&server)
            .await;

        let catalog = CatalogService::new().unwrap();
        let err = catalog
            .extract_first_product("shopify", &server.uri())
            .await
            .unwrap_err();
        assert!(matches!(err, CatalogError::NoProducts));
    }

    #[tokio::test]
    async fn test_woocommerce_is_unsupported_for_extraction() {
        let catalog = CatalogService::new().unwrap();
        let err = catalog
            .extract_first_product("woocommerce", "https://store.example.com")
            .await
            .unwrap_err();
        assert!(matches!(err, CatalogError::UnsupportedPlatform(_)));
    }
}
