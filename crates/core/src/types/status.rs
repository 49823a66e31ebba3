//! Status enums for billing entities.

use core::fmt;

use serde::{Deserialize, Serialize};

/// Error returned when a stored status string is not a known variant.
#[derive(thiserror::Error, Debug, Clone)]
#[error("unknown {kind} status: {value}")]
pub struct StatusParseError {
    /// Which status family failed to parse (`subscription` or `payment`).
    pub kind: &'static str,
    /// The offending value.
    pub value: String,
}

/// Lifecycle status of a user's plan subscription.
///
/// At most one subscription per user may be `Active` at any time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum SubscriptionStatus {
    #[default]
    Active,
    Canceled,
    Expired,
}

impl SubscriptionStatus {
    /// Canonical lowercase name (the stored form).
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Active => "active",
            Self::Canceled => "canceled",
            Self::Expired => "expired",
        }
    }

    /// Parse a stored status string.
    ///
    /// # Errors
    ///
    /// Returns [`StatusParseError`] for unknown values.
    pub fn parse(s: &str) -> Result<Self, StatusParseError> {
        match s {
            "active" => Ok(Self::Active),
            "canceled" => Ok(Self::Canceled),
            "expired" => Ok(Self::Expired),
            other => Err(StatusParseError {
                kind: "subscription",
                value: other.to_owned(),
            }),
        }
    }
}

impl fmt::Display for SubscriptionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Outcome status of a billing-history payment row.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PaymentStatus {
    Paid,
    Failed,
    Pending,
}

impl PaymentStatus {
    /// Canonical lowercase name (the stored form).
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Paid => "paid",
            Self::Failed => "failed",
            Self::Pending => "pending",
        }
    }

    /// Parse a stored status string.
    ///
    /// # Errors
    ///
    /// Returns [`StatusParseError`] for unknown values.
    pub fn parse(s: &str) -> Result<Self, StatusParseError> {
        match s {
            "paid" => Ok(Self::Paid),
            "failed" => Ok(Self::Failed),
            "pending" => Ok(Self::Pending),
            other => Err(StatusParseError {
                kind: "payment",
                value: other.to_owned(),
            }),
        }
    }
}

impl fmt::Display for PaymentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_subscription_roundtrip() {
        for status in [
            SubscriptionStatus::Active,
            SubscriptionStatus::Canceled,
            SubscriptionStatus::Expired,
        ] {
            assert_eq!(SubscriptionStatus::parse(status.as_str()).unwrap(), status);
        }
    }

    #[test]
    fn test_subscription_unknown() {
        let err = SubscriptionStatus::parse("paused").unwrap_err();
        assert_eq!(err.to_string(), "unknown subscription status: paused");
    }

    #[test]
    fn test_payment_roundtrip() {
        for status in [
            PaymentStatus::Paid,
            PaymentStatus::Failed,
            PaymentStatus::Pending,
        ] {
            assert_eq!(PaymentStatus::parse(status.as_str()).unwrap(), status);
        }
    }

    #[test]
    fn test_serde_snake_case() {
        assert_eq!(
            serde_json::to_string(&SubscriptionStatus::Active).unwrap(),
            "\"active\""
        );
        assert_eq!(
            serde_json::to_string(&PaymentStatus::Paid).unwrap(),
            "\"paid\""
        );
    }
}
