//! Store-connection validator.
//!
//! One synchronous probe per platform: Shopify stores are detected by a
//! `shopify`-referencing script tag on the homepage; WooCommerce stores by a
//! successful authenticated call to the REST products endpoint.

use std::time::Duration;

use perche_core::Platform;
use scraper::{Html, Selector};
use tracing::instrument;

/// Probe timeout (connect + response).
const VALIDATION_TIMEOUT: Duration = Duration::from_secs(10);

/// WooCommerce REST products path probed for credential validation.
const WOOCOMMERCE_PRODUCTS_PATH: &str = "/wp-json/wc/v3/products";

/// Errors from store-connection validation.
///
/// Display strings are client-facing; they are returned verbatim in the
/// 400 response detail.
#[derive(Debug, thiserror::Error)]
pub enum ConnectorError {
    /// The requested platform has no validator.
    #[error("Platform {0} is not supported yet")]
    UnsupportedPlatform(String),

    /// WooCommerce validation requires both API keys.
    #[error("WooCommerce API keys are required")]
    MissingCredentials,

    /// The page loaded but shows no Shopify fingerprint.
    #[error("The provided URL does not appear to be a Shopify store")]
    NotAShopifyStore,

    /// The store URL did not serve an HTML page.
    #[error("Could not access the store URL")]
    Unreachable,

    /// The WooCommerce products endpoint rejected the credentials.
    #[error("Invalid WooCommerce credentials or API access")]
    InvalidCredentials,

    /// The probe request itself failed (DNS, connect, timeout).
    #[error("Connection failed: {0}")]
    Request(#[from] reqwest::Error),
}

/// Outcome of a successful validation.
#[derive(Debug, Clone)]
pub struct ValidatedConnection {
    pub message: &'static str,
}

/// Store-connection validation service.
#[derive(Clone)]
pub struct ConnectorService {
    client: reqwest::Client,
}

impl ConnectorService {
    /// Create a new connector service with the fixed probe timeout.
    ///
    /// # Errors
    ///
    /// Returns `reqwest::Error` if the HTTP client cannot be built.
    pub fn new() -> Result<Self, reqwest::Error> {
        let client = reqwest::Client::builder()
            .timeout(VALIDATION_TIMEOUT)
            .build()?;
        Ok(Self { client })
    }

    /// Validate the connection to an e-commerce platform.
    ///
    /// # Errors
    ///
    /// Returns a [`ConnectorError`] describing why the store could not be
    /// validated; every variant maps to a client error.
    #[instrument(skip(self, woo_commerce_client_key, woo_commerce_secret_key))]
    pub async fn validate(
        &self,
        platform: &str,
        store_url: &str,
        woo_commerce_client_key: Option<&str>,
        woo_commerce_secret_key: Option<&str>,
    ) -> Result<ValidatedConnection, ConnectorError> {
        let platform = Platform::parse(platform)
            .map_err(|e| ConnectorError::UnsupportedPlatform(e.0))?;

        match platform {
            Platform::Shopify => self.validate_shopify(store_url).await,
            Platform::WooCommerce => {
                let (client_key, secret_key) =
                    match (woo_commerce_client_key, woo_commerce_secret_key) {
                        (Some(c), Some(s)) if !c.is_empty() && !s.is_empty() => (c, s),
                        _ => return Err(ConnectorError::MissingCredentials),
                    };
                self.validate_woocommerce(store_url, client_key, secret_key)
                    .await
            }
        }
    }

    /// Probe the store homepage and look for a Shopify-referencing script tag.
    async fn validate_shopify(
        &self,
        store_url: &str,
    ) -> Result<ValidatedConnection, ConnectorError> {
        let response = self.client.get(store_url).send().await?;

        let is_html = response
            .headers()
            .get(reqwest::header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .is_some_and(|ct| ct.contains("text/html"));

        if !response.status().is_success() || !is_html {
            return Err(ConnectorError::Unreachable);
        }

        let body = response.text().await?;
        if html_references_shopify(&body) {
            Ok(ValidatedConnection {
                message: "Successfully connected to Shopify store",
            })
        } else {
            Err(ConnectorError::NotAShopifyStore)
        }
    }

    /// Probe the WooCommerce REST products endpoint with basic auth.
    async fn validate_woocommerce(
        &self,
        store_url: &str,
        client_key: &str,
        secret_key: &str,
    ) -> Result<ValidatedConnection, ConnectorError> {
        let api_url = format!(
            "{}{WOOCOMMERCE_PRODUCTS_PATH}",
            store_url.trim_end_matches('/')
        );

        let response = self
            .client
            .get(api_url)
            .basic_auth(client_key, Some(secret_key))
            .send()
            .await?;

        if response.status().is_success() {
            Ok(ValidatedConnection {
                message: "Successfully connected to WooCommerce store",
            })
        } else {
            Err(ConnectorError::InvalidCredentials)
        }
    }
}

/// Whether any `<script src>` on the page references Shopify.
fn html_references_shopify(html: &str) -> bool {
    let document = Html::parse_document(html);
    let Ok(selector) = Selector::parse("script[src]") else {
        return false;
    };

    document.select(&selector).any(|el| {
        el.value()
            .attr("src")
            .is_some_and(|src| src.to_lowercase().contains("shopify"))
    })
}
