//! Billing repository: plan catalog, subscriptions, usage stats, history.

use chrono::{DateTime, Duration, Utc};
use perche_core::{
    BillingHistoryId, PaymentStatus, PlanId, SubscriptionId, SubscriptionStatus, UsageStatsId,
    UserId,
};
use rust_decimal::Decimal;
use sqlx::SqlitePool;

use super::{RepositoryError, parse_json_column};
use crate::models::{BillingHistoryEntry, BillingPlan, Subscription, UsageStats};

/// Default metering limits applied on subscribe.
pub const DEFAULT_API_CALLS_LIMIT: i64 = 100_000;
/// Default storage limit in MB applied on subscribe.
pub const DEFAULT_STORAGE_LIMIT_MB: i64 = 100;
/// Default team-seat limit applied on subscribe.
pub const DEFAULT_TEAM_MEMBERS_LIMIT: i64 = 10;

/// Subscription period length.
const SUBSCRIPTION_PERIOD_DAYS: i64 = 30;

/// Fields supplied when creating a billing plan.
#[derive(Debug, Clone)]
pub struct NewBillingPlan {
    pub name: String,
    pub description: Option<String>,
    pub price: Decimal,
    pub features: Vec<String>,
    pub is_active: bool,
}

/// Partial plan update: `None` fields are left unchanged.
#[derive(Debug, Clone, Default)]
pub struct BillingPlanPatch {
    pub name: Option<String>,
    pub description: Option<String>,
    pub price: Option<Decimal>,
    pub features: Option<Vec<String>>,
    pub is_active: Option<bool>,
}

/// Fields supplied when recording a billing-history entry.
#[derive(Debug, Clone)]
pub struct NewBillingHistoryEntry {
    pub user_id: UserId,
    pub plan_id: PlanId,
    pub amount: Decimal,
    pub status: PaymentStatus,
    pub payment_date: DateTime<Utc>,
}

/// Partial usage update: only the `used` counters are client-writable.
#[derive(Debug, Clone, Default)]
pub struct UsageStatsPatch {
    pub api_calls_used: Option<i64>,
    pub storage_used: Option<i64>,
    pub team_members_used: Option<i64>,
}

type PlanRow = (
    i64,
    String,
    Option<String>,
    String,
    String,
    bool,
    DateTime<Utc>,
    Option<DateTime<Utc>>,
);

type SubscriptionRow = (
    i64,
    i64,
    i64,
    String,
    DateTime<Utc>,
    DateTime<Utc>,
    DateTime<Utc>,
    Option<DateTime<Utc>>,
);

type UsageRow = (
    i64,
    i64,
    i64,
    i64,
    i64,
    i64,
    i64,
    i64,
    DateTime<Utc>,
    Option<DateTime<Utc>>,
);

/// Repository for billing database operations.
pub struct BillingRepository<'a> {
    pool: &'a SqlitePool,
}

impl<'a> BillingRepository<'a> {
    /// Create a new billing repository.
    #[must_use]
    pub const fn new(pool: &'a SqlitePool) -> Self {
        Self { pool }
    }

    // =========================================================================
    // Plans
    // =========================================================================

    /// List billing plans with offset/limit pagination.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    /// Returns `RepositoryError::DataCorruption` if a stored price or
    /// feature list is invalid.
    pub async fn list_plans(
        &self,
        skip: i64,
        limit: i64,
    ) -> Result<Vec<BillingPlan>, RepositoryError> {
        let rows = sqlx::query_as::<_, PlanRow>(
            "SELECT id, name, description, price, features, is_active, created_at, updated_at
             FROM billing_plans ORDER BY id LIMIT ? OFFSET ?",
        )
        .bind(limit)
        .bind(skip)
        .fetch_all(self.pool)
        .await?;

        rows.into_iter().map(map_plan_row).collect()
    }

    /// Get a billing plan by ID.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn get_plan(&self, plan_id: PlanId) -> Result<Option<BillingPlan>, RepositoryError> {
        let row = sqlx::query_as::<_, PlanRow>(
            "SELECT id, name, description, price, features, is_active, created_at, updated_at
             FROM billing_plans WHERE id = ?",
        )
        .bind(plan_id.as_i64())
        .fetch_optional(self.pool)
        .await?;

        row.map(map_plan_row).transpose()
    }

    /// Create a new billing plan.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the insert fails.
    pub async fn create_plan(&self, plan: &NewBillingPlan) -> Result<BillingPlan, RepositoryError> {
        let features = serde_json::to_string(&plan.features).map_err(|e| {
            RepositoryError::DataCorruption(format!("failed to serialize features: {e}"))
        })?;
        let now = Utc::now();

        let (id,): (i64,) = sqlx::query_as(
            "INSERT INTO billing_plans (name, description, price, features, is_active, created_at)
             VALUES (?, ?, ?, ?, ?, ?)
             RETURNING id",
        )
        .bind(&plan.name)
        .bind(&plan.description)
        .bind(plan.price.to_string())
        .bind(features)
        .bind(plan.is_active)
        .bind(now)
        .fetch_one(self.pool)
        .await?;

        Ok(BillingPlan {
            id: PlanId::new(id),
            name: plan.name.clone(),
            description: plan.description.clone(),
            price: plan.price,
            features: plan.features.clone(),
            is_active: plan.is_active,
            created_at: now,
            updated_at: None,
        })
    }

    /// Apply a partial update to a billing plan.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the plan doesn't exist.
    /// Returns `RepositoryError::Database` for other database errors.
    pub async fn update_plan(
        &self,
        plan_id: PlanId,
        patch: &BillingPlanPatch,
    ) -> Result<BillingPlan, RepositoryError> {
        let current = self
            .get_plan(plan_id)
            .await?
            .ok_or(RepositoryError::NotFound)?;

        let merged = BillingPlan {
            name: patch.name.clone().unwrap_or(current.name),
            description: patch.description.clone().or(current.description),
            price: patch.price.unwrap_or(current.price),
            features: patch.features.clone().unwrap_or(current.features),
            is_active: patch.is_active.unwrap_or(current.is_active),
            updated_at: Some(Utc::now()),
            ..current
        };

        let features = serde_json::to_string(&merged.features).map_err(|e| {
            RepositoryError::DataCorruption(format!("failed to serialize features: {e}"))
        })?;

        sqlx::query(
            "UPDATE billing_plans
             SET name = ?, description = ?, price = ?, features = ?, is_active = ?, updated_at = ?
             WHERE id = ?",
        )
        .bind(&merged.name)
        .bind(&merged.description)
        .bind(merged.price.to_string())
        .bind(features)
        .bind(merged.is_active)
        .bind(merged.updated_at)
        .bind(plan_id.as_i64())
        .execute(self.pool)
        .await?;

        Ok(merged)
    }

    // =========================================================================
    // Subscriptions
    // =========================================================================

    /// Get the user's active subscription, if any.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn active_subscription(
        &self,
        user_id: UserId,
    ) -> Result<Option<Subscription>, RepositoryError> {
        let row = sqlx::query_as::<_, SubscriptionRow>(
            "SELECT id, user_id, plan_id, status, start_date, end_date, created_at, updated_at
             FROM subscriptions WHERE user_id = ? AND status = 'active'",
        )
        .bind(user_id.as_i64())
        .fetch_optional(self.pool)
        .await?;

        row.map(map_subscription_row).transpose()
    }

    /// Subscribe the user to a plan.
    ///
    /// Cancels any existing active subscription (end date set to the
    /// subscribe time) before creating the new 30-day active subscription,
    /// then upserts the user's usage limits. All in one transaction, so the
    /// at-most-one-active invariant holds even if the caller retries.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if any statement fails.
    pub async fn subscribe(
        &self,
        user_id: UserId,
        plan_id: PlanId,
    ) -> Result<Subscription, RepositoryError> {
        let now = Utc::now();
        let end_date = now + Duration::days(SUBSCRIPTION_PERIOD_DAYS);

        let mut tx = self.pool.begin().await?;

        sqlx::query(
            "UPDATE subscriptions SET status = 'canceled', end_date = ?, updated_at = ?
             WHERE user_id = ? AND status = 'active'",
        )
        .bind(now)
        .bind(now)
        .bind(user_id.as_i64())
        .execute(&mut *tx)
        .await?;

        let (id,): (i64,) = sqlx::query_as(
            "INSERT INTO subscriptions (user_id, plan_id, status, start_date, end_date, created_at)
             VALUES (?, ?, 'active', ?, ?, ?)
             RETURNING id",
        )
        .bind(user_id.as_i64())
        .bind(plan_id.as_i64())
        .bind(now)
        .bind(end_date)
        .bind(now)
        .fetch_one(&mut *tx)
        .await?;

        sqlx::query(
            "INSERT INTO usage_stats
                (user_id, api_calls_limit, storage_limit, team_members_limit, created_at)
             VALUES (?, ?, ?, ?, ?)
             ON CONFLICT(user_id) DO UPDATE SET
                api_calls_limit = excluded.api_calls_limit,
                storage_limit = excluded.storage_limit,
                team_members_limit = excluded.team_members_limit,
                updated_at = excluded.created_at",
        )
        .bind(user_id.as_i64())
        .bind(DEFAULT_API_CALLS_LIMIT)
        .bind(DEFAULT_STORAGE_LIMIT_MB)
        .bind(DEFAULT_TEAM_MEMBERS_LIMIT)
        .bind(now)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;

        Ok(Subscription {
            id: SubscriptionId::new(id),
            user_id,
            plan_id,
            status: SubscriptionStatus::Active,
            start_date: now,
            end_date,
            created_at: now,
            updated_at: None,
        })
    }

    /// Count subscriptions for a user by status (invariant checks and tests).
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn count_by_status(
        &self,
        user_id: UserId,
        status: SubscriptionStatus,
    ) -> Result<i64, RepositoryError> {
        let (count,): (i64,) = sqlx::query_as(
            "SELECT COUNT(*) FROM subscriptions WHERE user_id = ? AND status = ?",
        )
        .bind(user_id.as_i64())
        .bind(status.as_str())
        .fetch_one(self.pool)
        .await?;

        Ok(count)
    }

    // =========================================================================
    // Usage stats
    // =========================================================================

    /// Get the user's usage stats, if any.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn usage_stats(&self, user_id: UserId) -> Result<Option<UsageStats>, RepositoryError> {
        let row = sqlx::query_as::<_, UsageRow>(
            "SELECT id, user_id, api_calls_used, api_calls_limit, storage_used, storage_limit,
                    team_members_used, team_members_limit, created_at, updated_at
             FROM usage_stats WHERE user_id = ?",
        )
        .bind(user_id.as_i64())
        .fetch_optional(self.pool)
        .await?;

        Ok(row.map(map_usage_row))
    }

    /// Insert usage stats with the given limits (seeder).
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the insert fails.
    pub async fn insert_usage_stats(
        &self,
        user_id: UserId,
        api_calls_limit: i64,
        storage_limit: i64,
        team_members_limit: i64,
    ) -> Result<(), RepositoryError> {
        sqlx::query(
            "INSERT INTO usage_stats
                (user_id, api_calls_limit, storage_limit, team_members_limit, created_at)
             VALUES (?, ?, ?, ?, ?)",
        )
        .bind(user_id.as_i64())
        .bind(api_calls_limit)
        .bind(storage_limit)
        .bind(team_members_limit)
        .bind(Utc::now())
        .execute(self.pool)
        .await?;

        Ok(())
    }

    /// Apply a partial update to the user's `used` counters.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the user has no usage stats.
    /// Returns `RepositoryError::Database` for other database errors.
    pub async fn update_usage(
        &self,
        user_id: UserId,
        patch: &UsageStatsPatch,
    ) -> Result<UsageStats, RepositoryError> {
        let current = self
            .usage_stats(user_id)
            .await?
            .ok_or(RepositoryError::NotFound)?;

        let merged = UsageStats {
            api_calls_used: patch.api_calls_used.unwrap_or(current.api_calls_used),
            storage_used: patch.storage_used.unwrap_or(current.storage_used),
            team_members_used: patch.team_members_used.unwrap_or(current.team_members_used),
            updated_at: Some(Utc::now()),
            ..current
        };

        sqlx::query(
            "UPDATE usage_stats
             SET api_calls_used = ?, storage_used = ?, team_members_used = ?, updated_at = ?
             WHERE user_id = ?",
        )
        .bind(merged.api_calls_used)
        .bind(merged.storage_used)
        .bind(merged.team_members_used)
        .bind(merged.updated_at)
        .bind(user_id.as_i64())
        .execute(self.pool)
        .await?;

        Ok(merged)
    }

    // =========================================================================
    // Billing history
    // =========================================================================

    /// List the user's billing history with the plan for each row.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    /// Returns `RepositoryError::DataCorruption` if a stored value is invalid.
    pub async fn list_history(
        &self,
        user_id: UserId,
        skip: i64,
        limit: i64,
    ) -> Result<Vec<(BillingHistoryEntry, BillingPlan)>, RepositoryError> {
        #[allow(clippy::type_complexity)]
        let rows = sqlx::query_as::<
            _,
            (
                i64,
                i64,
                i64,
                String,
                String,
                DateTime<Utc>,
                DateTime<Utc>,
                String,
                Option<String>,
                String,
                String,
                bool,
                DateTime<Utc>,
                Option<DateTime<Utc>>,
            ),
        >(
            "SELECT h.id, h.user_id, h.plan_id, h.amount, h.status, h.payment_date, h.created_at,
                    p.name, p.description, p.price, p.features, p.is_active, p.created_at,
                    p.updated_at
             FROM billing_history h
             JOIN billing_plans p ON p.id = h.plan_id
             WHERE h.user_id = ?
             ORDER BY h.payment_date DESC
             LIMIT ? OFFSET ?",
        )
        .bind(user_id.as_i64())
        .bind(limit)
        .bind(skip)
        .fetch_all(self.pool)
        .await?;

        rows.into_iter()
            .map(
                |(
                    id,
                    user_id,
                    plan_id,
                    amount,
                    status,
                    payment_date,
                    created_at,
                    plan_name,
                    plan_description,
                    plan_price,
                    plan_features,
                    plan_is_active,
                    plan_created_at,
                    plan_updated_at,
                )| {
                    let entry = BillingHistoryEntry {
                        id: BillingHistoryId::new(id),
                        user_id: UserId::new(user_id),
                        plan_id: PlanId::new(plan_id),
                        amount: parse_decimal("amount", &amount)?,
                        status: PaymentStatus::parse(&status).map_err(|e| {
                            RepositoryError::DataCorruption(e.to_string())
                        })?,
                        payment_date,
                        created_at,
                    };
                    let plan = map_plan_row((
                        plan_id,
                        plan_name,
                        plan_description,
                        plan_price,
                        plan_features,
                        plan_is_active,
                        plan_created_at,
                        plan_updated_at,
                    ))?;
                    Ok((entry, plan))
                },
            )
            .collect()
    }

    /// Record a billing-history entry.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the insert fails.
    pub async fn create_history(
        &self,
        entry: &NewBillingHistoryEntry,
    ) -> Result<BillingHistoryEntry, RepositoryError> {
        let now = Utc::now();

        let (id,): (i64,) = sqlx::query_as(
            "INSERT INTO billing_history (user_id, plan_id, amount, status, payment_date, created_at)
             VALUES (?, ?, ?, ?, ?, ?)
             RETURNING id",
        )
        .bind(entry.user_id.as_i64())
        .bind(entry.plan_id.as_i64())
        .bind(entry.amount.to_string())
        .bind(entry.status.as_str())
        .bind(entry.payment_date)
        .bind(now)
        .fetch_one(self.pool)
        .await?;

        Ok(BillingHistoryEntry {
            id: BillingHistoryId::new(id),
            user_id: entry.user_id,
            plan_id: entry.plan_id,
            amount: entry.amount,
            status: entry.status,
            payment_date: entry.payment_date,
            created_at: now,
        })
    }
}

fn parse_decimal(column: &str, raw: &str) -> Result<Decimal, RepositoryError> {
    raw.parse::<Decimal>()
        .map_err(|e| RepositoryError::DataCorruption(format!("invalid decimal in {column}: {e}")))
}

fn map_plan_row(
    (id, name, description, price, features, is_active, created_at, updated_at): PlanRow,
) -> Result<BillingPlan, RepositoryError> {
    Ok(BillingPlan {
        id: PlanId::new(id),
        name,
        description,
        price: parse_decimal("price", &price)?,
        features: parse_json_column("features", &features)?,
        is_active,
        created_at,
        updated_at,
    })
}

fn map_subscription_row(
    (id, user_id, plan_id, status, start_date, end_date, created_at, updated_at): SubscriptionRow,
) -> Result<Subscription, RepositoryError> {
    Ok(Subscription {
        id: SubscriptionId::new(id),
        user_id: UserId::new(user_id),
        plan_id: PlanId::new(plan_id),
        status: SubscriptionStatus::parse(&status)
            .map_err(|e| RepositoryError::DataCorruption(e.to_string()))?,
        start_date,
        end_date,
        created_at,
        updated_at,
    })
}

fn map_usage_row(
    (
        id,
        user_id,
        api_calls_used,
        api_calls_limit,
        storage_used,
        storage_limit,
        team_members_used,
        team_members_limit,
        created_at,
        updated_at,
    ): UsageRow,
) -> UsageStats {
    UsageStats {
        id: UsageStatsId::new(id),
        user_id: UserId::new(user_id),
        api_calls_used,
        api_calls_limit,
        storage_used,
        storage_limit,
        team_members_used,
        team_members_limit,
        created_at,
        updated_at,
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use perche_core::Email;
    use rust_decimal::Decimal;

    use super::*;
    use crate::db::test_support::test_pool;
    use crate::db::users::UserRepository;

    async fn seed_user(pool: &SqlitePool) -> UserId {
        let email = Email::parse("alice@example.com").unwrap();
        UserRepository::new(pool)
            .create("alice", &email, "hash")
            .await
            .unwrap()
            .id
    }

    fn pro_plan() -> NewBillingPlan {
        NewBillingPlan {
            name: "Pro".to_owned(),
            description: Some("Professional plan for small teams".to_owned()),
            price: Decimal::new(2999, 2),
            features: vec!["Advanced API access".to_owned(), "Priority support".to_owned()],
            is_active: true,
        }
    }

    #[tokio::test]
    async fn test_plan_roundtrip() {
        let pool = test_pool().await;
        let repo = BillingRepository::new(&pool);

        let created = repo.create_plan(&pro_plan()).await.unwrap();
        let fetched = repo.get_plan(created.id).await.unwrap().unwrap();
        assert_eq!(fetched.name, "Pro");
        assert_eq!(fetched.price, Decimal::new(2999, 2));
        assert_eq!(fetched.features.len(), 2);
    }

    #[tokio::test]
    async fn test_update_plan_partial() {
        let pool = test_pool().await;
        let repo = BillingRepository::new(&pool);
        let plan = repo.create_plan(&pro_plan()).await.unwrap();

        let patch = BillingPlanPatch {
            price: Some(Decimal::new(3999, 2)),
            ..Default::default()
        };
        let updated = repo.update_plan(plan.id, &patch).await.unwrap();
        assert_eq!(updated.price, Decimal::new(3999, 2));
        assert_eq!(updated.name, "Pro");
        assert!(updated.updated_at.is_some());
    }

    #[tokio::test]
    async fn test_subscribe_cancels_previous_active() {
        let pool = test_pool().await;
        let user_id = seed_user(&pool).await;
        let repo = BillingRepository::new(&pool);

        let first_plan = repo.create_plan(&pro_plan()).await.unwrap();
        let second_plan = repo.create_plan(&pro_plan()).await.unwrap();

        let before = Utc::now();
        let first = repo.subscribe(user_id, first_plan.id).await.unwrap();
        assert_eq!(first.status, SubscriptionStatus::Active);

        let second = repo.subscribe(user_id, second_plan.id).await.unwrap();
        assert_eq!(second.plan_id, second_plan.id);

        // At most one active subscription, old one canceled with end date at
        // the subscribe time.
        let active = repo
            .count_by_status(user_id, SubscriptionStatus::Active)
            .await
            .unwrap();
        assert_eq!(active, 1);
        let canceled = repo
            .count_by_status(user_id, SubscriptionStatus::Canceled)
            .await
            .unwrap();
        assert_eq!(canceled, 1);

        let (canceled_end,): (DateTime<Utc>,) = sqlx::query_as(
            "SELECT end_date FROM subscriptions WHERE status = 'canceled' AND user_id = ?",
        )
        .bind(user_id.as_i64())
        .fetch_one(&pool)
        .await
        .unwrap();
        assert!(canceled_end >= before);
        assert!(canceled_end <= Utc::now());
    }

    #[tokio::test]
    async fn test_subscribe_upserts_usage_limits() {
        let pool = test_pool().await;
        let user_id = seed_user(&pool).await;
        let repo = BillingRepository::new(&pool);
        let plan = repo.create_plan(&pro_plan()).await.unwrap();

        assert!(repo.usage_stats(user_id).await.unwrap().is_none());

        repo.subscribe(user_id, plan.id).await.unwrap();
        let usage = repo.usage_stats(user_id).await.unwrap().unwrap();
        assert_eq!(usage.api_calls_limit, DEFAULT_API_CALLS_LIMIT);
        assert_eq!(usage.storage_limit, DEFAULT_STORAGE_LIMIT_MB);
        assert_eq!(usage.team_members_limit, DEFAULT_TEAM_MEMBERS_LIMIT);
        assert_eq!(usage.api_calls_used, 0);

        // Subscribing again keeps used counters and refreshes limits.
        repo.update_usage(
            user_id,
            &UsageStatsPatch {
                api_calls_used: Some(42),
                ..Default::default()
            },
        )
        .await
        .unwrap();
        repo.subscribe(user_id, plan.id).await.unwrap();
        let usage = repo.usage_stats(user_id).await.unwrap().unwrap();
        assert_eq!(usage.api_calls_used, 42);
    }

    #[tokio::test]
    async fn test_update_usage_without_row_is_not_found() {
        let pool = test_pool().await;
        let user_id = seed_user(&pool).await;
        let repo = BillingRepository::new(&pool);

        let err = repo
            .update_usage(user_id, &UsageStatsPatch::default())
            .await
            .unwrap_err();
        assert!(matches!(err, RepositoryError::NotFound));
    }

    #[tokio::test]
    async fn test_history_with_plan() {
        let pool = test_pool().await;
        let user_id = seed_user(&pool).await;
        let repo = BillingRepository::new(&pool);
        let plan = repo.create_plan(&pro_plan()).await.unwrap();

        repo.create_history(&NewBillingHistoryEntry {
            user_id,
            plan_id: plan.id,
            amount: plan.price,
            status: PaymentStatus::Paid,
            payment_date: Utc::now(),
        })
        .await
        .unwrap();

        let history = repo.list_history(user_id, 0, 100).await.unwrap();
        assert_eq!(history.len(), 1);
        let (entry, joined_plan) = history.first().unwrap();
        assert_eq!(entry.status, PaymentStatus::Paid);
        assert_eq!(joined_plan.name, "Pro");
    }
}
