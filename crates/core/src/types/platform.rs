//! Supported e-commerce platforms.

use core::fmt;

use serde::{Deserialize, Serialize};

/// Error returned when parsing an unsupported platform name.
///
/// Carries the original input so callers can echo it back to the client.
#[derive(thiserror::Error, Debug, Clone)]
#[error("Platform {0} is not supported yet")]
pub struct PlatformError(pub String);

/// An e-commerce platform a store can be connected from.
///
/// Parsing is case-insensitive (`"Shopify"`, `"SHOPIFY"`, and `"shopify"`
/// are all accepted); the canonical wire form is lowercase.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Platform {
    Shopify,
    WooCommerce,
}

impl Platform {
    /// Parse a platform name, case-insensitively.
    ///
    /// # Errors
    ///
    /// Returns [`PlatformError`] carrying the original input when the
    /// platform is not supported.
    pub fn parse(s: &str) -> Result<Self, PlatformError> {
        match s.to_lowercase().as_str() {
            "shopify" => Ok(Self::Shopify),
            "woocommerce" => Ok(Self::WooCommerce),
            _ => Err(PlatformError(s.to_owned())),
        }
    }

    /// Canonical lowercase name.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Shopify => "shopify",
            Self::WooCommerce => "woocommerce",
        }
    }
}

impl fmt::Display for Platform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for Platform {
    type Err = PlatformError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_case_insensitive() {
        assert_eq!(Platform::parse("shopify").unwrap(), Platform::Shopify);
        assert_eq!(Platform::parse("Shopify").unwrap(), Platform::Shopify);
        assert_eq!(
            Platform::parse("WooCommerce").unwrap(),
            Platform::WooCommerce
        );
        assert_eq!(
            Platform::parse("WOOCOMMERCE").unwrap(),
            Platform::WooCommerce
        );
    }

    #[test]
    fn test_parse_unsupported() {
        let err = Platform::parse("magento").unwrap_err();
        assert_eq!(err.to_string(), "Platform magento is not supported yet");
    }

    #[test]
    fn test_serde_lowercase() {
        let json = serde_json::to_string(&Platform::WooCommerce).unwrap();
        assert_eq!(json, "\"woocommerce\"");

        let parsed: Platform = serde_json::from_str("\"shopify\"").unwrap();
        assert_eq!(parsed, Platform::Shopify);
    }
}
