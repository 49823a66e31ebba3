//! Storefront catalog crawler.
//!
//! Fetches the public product catalog page by page: `/products.json` for
//! Shopify, the authenticated REST products endpoint for WooCommerce.
//! Page count is bounded; transport failures and upstream 5xx surface as
//! transient errors for the retry policy.

use std::time::Duration;

use perche_core::Platform;
use serde::Deserialize;
use tracing::{debug, info, instrument};

use super::CatalogCrawler;
use crate::context::{CrawledCatalog, WizardSubmission};
use crate::error::StageError;

/// Stage name used in errors and logs.
const STAGE: &str = "crawl_catalog";

/// Shopify catalog page size (the platform maximum).
const SHOPIFY_PAGE_SIZE: usize = 250;

/// WooCommerce catalog page size (the platform maximum).
const WOOCOMMERCE_PAGE_SIZE: usize = 100;

/// Per-request timeout.
const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// User-Agent for catalog requests.
const USER_AGENT: &str = concat!("perche-pipeline/", env!("CARGO_PKG_VERSION"));

#[derive(Debug, Deserialize)]
struct ShopifyProducts {
    #[serde(default)]
    products: Vec<serde_json::Value>,
}

/// Catalog crawler over the storefront HTTP APIs.
pub struct StorefrontCrawler {
    client: reqwest::Client,
    max_pages: usize,
}

impl StorefrontCrawler {
    /// Create a new crawler with a page-count bound.
    ///
    /// # Errors
    ///
    /// Returns a fatal [`StageError`] if the HTTP client cannot be built.
    pub fn new(max_pages: usize) -> Result<Self, StageError> {
        let client = reqwest::Client::builder()
            .user_agent(USER_AGENT)
            .timeout(REQUEST_TIMEOUT)
            .build()
            .map_err(|e| StageError::Io {
                stage: STAGE,
                message: format!("failed to build HTTP client: {e}"),
            })?;

        Ok(Self { client, max_pages })
    }

    async fn crawl_shopify(&self, store_url: &str) -> Result<CrawledCatalog, StageError> {
        let base = store_url.trim_end_matches('/');
        let mut records = Vec::new();
        let mut pages_fetched = 0;

        for page in 1..=self.max_pages {
            let url = format!("{base}/products.json?limit={SHOPIFY_PAGE_SIZE}&page={page}");
            debug!(%url, "fetching catalog page");

            let response = self
                .client
                .get(&url)
                .send()
                .await
                .map_err(|e| StageError::network(STAGE, &e))?;

            let status = response.status();
            if !status.is_success() {
                return Err(StageError::UpstreamStatus {
                    stage: STAGE,
                    status: status.as_u16(),
                });
            }

            let body: ShopifyProducts = response.json().await.map_err(|e| {
                StageError::InvalidInput {
                    stage: STAGE,
                    message: format!("catalog page was not valid JSON: {e}"),
                }
            })?;

            pages_fetched += 1;
            let page_len = body.products.len();
            records.extend(body.products);

            if page_len < SHOPIFY_PAGE_SIZE {
                break;
            }
        }

        Ok(CrawledCatalog {
            store_url: store_url.to_owned(),
            records,
            pages_fetched,
        })
    }

    async fn crawl_woocommerce(
        &self,
        store_url: &str,
        client_key: &str,
        secret_key: &str,
    ) -> Result<CrawledCatalog, StageError> {
        let base = store_url.trim_end_matches('/');
        let mut records = Vec::new();
        let mut pages_fetched = 0;

        for page in 1..=self.max_pages {
            let url = format!(
                "{base}/wp-json/wc/v3/products?per_page={WOOCOMMERCE_PAGE_SIZE}&page={page}"
            );
            debug!(%url, "fetching catalog page");

            let response = self
                .client
                .get(&url)
                .basic_auth(client_key, Some(secret_key))
                .send()
                .await
                .map_err(|e| StageError::network(STAGE, &e))?;

            let status = response.status();
            if !status.is_success() {
                return Err(StageError::UpstreamStatus {
                    stage: STAGE,
                    status: status.as_u16(),
                });
            }

            let body: Vec<serde_json::Value> = response.json().await.map_err(|e| {
                StageError::InvalidInput {
                    stage: STAGE,
                    message: format!("catalog page was not valid JSON: {e}"),
                }
            })?;

            pages_fetched += 1;
            let page_len = body.len();
            records.extend(body);

            if page_len < WOOCOMMERCE_PAGE_SIZE {
                break;
            }
        }

        Ok(CrawledCatalog {
            store_url: store_url.to_owned(),
            records,
            pages_fetched,
        })
    }
}

impl CatalogCrawler for StorefrontCrawler {
    #[instrument(skip_all, fields(store_url = %submission.store_url, platform = %submission.platform))]
    async fn crawl(&self, submission: &WizardSubmission) -> Result<CrawledCatalog, StageError> {
        let platform =
            Platform::parse(&submission.platform).map_err(|e| StageError::InvalidInput {
                stage: STAGE,
                message: e.to_string(),
            })?;

        let catalog = match platform {
            Platform::Shopify => self.crawl_shopify(&submission.store_url).await?,
            Platform::WooCommerce => {
                let (client_key, secret_key) = match (
                    submission.woo_commerce_client_key.as_deref(),
                    submission.woo_commerce_secret_key.as_deref(),
                ) {
                    (Some(c), Some(s)) if !c.is_empty() && !s.is_empty() => (c, s),
                    _ => {
                        return Err(StageError::InvalidInput {
                            stage: STAGE,
                            message: "WooCommerce API keys are required".to_string(),
                        });
                    }
                };
                self.crawl_woocommerce(&submission.store_url, client_key, secret_key)
                    .await?
            }
        };

        info!(
            records = catalog.records.len(),
            pages = catalog.pages_fetched,
            "catalog crawl completed"
        );
        Ok(catalog)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use serde_json::json;
    use wiremock::matchers::{method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    use super::*;

    fn submission(store_url: &str, platform: &str) -> WizardSubmission {
        WizardSubmission {
            user_id: 1,
            platform: platform.to_owned(),
            store_url: store_url.to_owned(),
            field_mappings: perche_core::FieldMappings::new(),
            woo_commerce_client_key: None,
            woo_commerce_secret_key: None,
        }
    }

    #[tokio::test]
    async fn test_single_page_catalog() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/products.json"))
            .and(query_param("page", "1"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "products": [{"id": 1, "title": "Widget"}, {"id": 2, "title": "Gadget"}]
            })))
            .mount(&server)
            .await;

        let crawler = StorefrontCrawler::new(10).unwrap();
        let catalog = crawler
            .crawl(&submission(&server.uri(), "shopify"))
            .await
            .unwrap();

        assert_eq!(catalog.records.len(), 2);
        assert_eq!(catalog.pages_fetched, 1);
    }

    #[tokio::test]
    async fn test_pagination_follows_full_pages() {
        let server = MockServer::start().await;

        // Page 1 is full, page 2 is short: exactly two fetches expected.
        let full_page: Vec<_> = (0..SHOPIFY_PAGE_SIZE)
            .map(|i| json!({"id": i, "title": format!("Product {i}")}))
            .collect();
        Mock::given(method("GET"))
            .and(path("/products.json"))
            .and(query_param("page", "1"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"products": full_page})))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/products.json"))
            .and(query_param("page", "2"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(json!({"products": [{"id": 9999, "title": "Last"}]})),
            )
            .mount(&server)
            .await;

        let crawler = StorefrontCrawler::new(10).unwrap();
        let catalog = crawler
            .crawl(&submission(&server.uri(), "shopify"))
            .await
            .unwrap();

        assert_eq!(catalog.records.len(), SHOPIFY_PAGE_SIZE + 1);
        assert_eq!(catalog.pages_fetched, 2);
    }

    #[tokio::test]
    async fn test_max_pages_bound() {
        let server = MockServer::start().await;
        let full_page: Vec<_> = (0..SHOPIFY_PAGE_SIZE).map(|i| json!({"id": i})).collect();
        Mock::given(method("GET"))
            .and(path("/products.json"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"products": full_page})))
            .mount(&server)
            .await;

        let crawler = StorefrontCrawler::new(3).unwrap();
        let catalog = crawler
            .crawl(&submission(&server.uri(), "shopify"))
            .await
            .unwrap();

        assert_eq!(catalog.pages_fetched, 3);
        assert_eq!(catalog.records.len(), SHOPIFY_PAGE_SIZE * 3);
    }

    #[tokio::test]
    async fn test_server_error_is_transient() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/products.json"))
            .respond_with(ResponseTemplate::new(503))
            .mount(&server)
            .await;

        let crawler = StorefrontCrawler::new(10).unwrap();
        let err = crawler
            .crawl(&submission(&server.uri(), "shopify"))
            .await
            .unwrap_err();

        assert!(err.is_transient());
        assert!(matches!(err, StageError::UpstreamStatus { status: 503, .. }));
    }

    #[tokio::test]
    async fn test_unsupported_platform_is_fatal() {
        let crawler = StorefrontCrawler::new(10).unwrap();
        let err = crawler
            .crawl(&submission("https://store.example.com", "magento"))
            .await
            .unwrap_err();

        assert!(!err.is_transient());
        assert!(matches!(err, StageError::InvalidInput { .. }));
    }

    #[tokio::test]
    async fn test_woocommerce_requires_keys() {
        let crawler = StorefrontCrawler::new(10).unwrap();
        let err = crawler
            .crawl(&submission("https://store.example.com", "woocommerce"))
            .await
            .unwrap_err();

        assert!(matches!(err, StageError::InvalidInput { .. }));
    }

    #[tokio::test]
    async fn test_woocommerce_catalog() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/wp-json/wc/v3/products"))
            .and(query_param("page", "1"))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(json!([{"id": 1, "name": "Widget"}])),
            )
            .mount(&server)
            .await;

        let mut sub = submission(&server.uri(), "woocommerce");
        sub.woo_commerce_client_key = Some("ck_123".to_owned());
        sub.woo_commerce_secret_key = Some("cs_456".to_owned());

        let crawler = StorefrontCrawler::new(10).unwrap();
        let catalog = crawler.crawl(&sub).await.unwrap();
        assert_eq!(catalog.records.len(), 1);
    }
}
