//! Billing plan catalog and per-user metering models.

use chrono::{DateTime, Utc};
use perche_core::{BillingHistoryId, PaymentStatus, PlanId, SubscriptionId, SubscriptionStatus, UsageStatsId, UserId};
use rust_decimal::Decimal;

/// A plan in the billing catalog.
#[derive(Debug, Clone)]
pub struct BillingPlan {
    pub id: PlanId,
    pub name: String,
    pub description: Option<String>,
    pub price: Decimal,
    pub features: Vec<String>,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: Option<DateTime<Utc>>,
}

/// A user's subscription to a plan.
#[derive(Debug, Clone)]
pub struct Subscription {
    pub id: SubscriptionId,
    pub user_id: UserId,
    pub plan_id: PlanId,
    pub status: SubscriptionStatus,
    pub start_date: DateTime<Utc>,
    pub end_date: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
    pub updated_at: Option<DateTime<Utc>>,
}

/// Per-user metering counters against plan limits.
///
/// Counters are unsigned in the API and CHECK-constrained non-negative in
/// the schema.
#[derive(Debug, Clone)]
pub struct UsageStats {
    pub id: UsageStatsId,
    pub user_id: UserId,
    pub api_calls_used: i64,
    pub api_calls_limit: i64,
    /// Storage figures in MB.
    pub storage_used: i64,
    pub storage_limit: i64,
    pub team_members_used: i64,
    pub team_members_limit: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: Option<DateTime<Utc>>,
}

/// A single billing-history payment row.
#[derive(Debug, Clone)]
pub struct BillingHistoryEntry {
    pub id: BillingHistoryId,
    pub user_id: UserId,
    pub plan_id: PlanId,
    pub amount: Decimal,
    pub status: PaymentStatus,
    pub payment_date: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
}
