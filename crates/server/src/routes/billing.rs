//! Billing route handlers: plan catalog, subscriptions, usage, history.

use axum::Json;
use axum::extract::{Path, Query, State};
use chrono::{DateTime, Utc};
use perche_core::{PaymentStatus, PlanId, SubscriptionStatus, UserId};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::Pagination;
use crate::db::RepositoryError;
use crate::db::billing::{
    BillingPlanPatch, BillingRepository, NewBillingHistoryEntry, NewBillingPlan, UsageStatsPatch,
};
use crate::error::{AppError, Result};
use crate::middleware::CurrentUser;
use crate::models::{BillingHistoryEntry, BillingPlan, Subscription, UsageStats};
use crate::state::AppState;

// =============================================================================
// Request / Response Types
// =============================================================================

/// Body for creating a billing plan.
#[derive(Debug, Deserialize)]
pub struct BillingPlanCreateRequest {
    pub name: String,
    pub description: Option<String>,
    pub price: Decimal,
    pub features: Vec<String>,
    #[serde(default = "default_true")]
    pub is_active: bool,
}

const fn default_true() -> bool {
    true
}

/// Body for partially updating a billing plan.
#[derive(Debug, Default, Deserialize)]
pub struct BillingPlanUpdateRequest {
    pub name: Option<String>,
    pub description: Option<String>,
    pub price: Option<Decimal>,
    pub features: Option<Vec<String>>,
    pub is_active: Option<bool>,
}

/// Body for recording a billing-history entry.
#[derive(Debug, Deserialize)]
pub struct BillingHistoryCreateRequest {
    pub user_id: i64,
    pub plan_id: i64,
    pub amount: Decimal,
    pub status: PaymentStatus,
    pub payment_date: DateTime<Utc>,
}

/// Body for updating usage counters. Unsigned: counters never go negative.
#[derive(Debug, Default, Deserialize)]
pub struct UsageUpdateRequest {
    pub api_calls_used: Option<u32>,
    pub storage_used: Option<u32>,
    pub team_members_used: Option<u32>,
}

/// Billing plan representation.
#[derive(Debug, Serialize)]
pub struct BillingPlanResponse {
    pub id: PlanId,
    pub name: String,
    pub description: Option<String>,
    pub price: Decimal,
    pub features: Vec<String>,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: Option<DateTime<Utc>>,
}

impl From<BillingPlan> for BillingPlanResponse {
    fn from(plan: BillingPlan) -> Self {
        Self {
            id: plan.id,
            name: plan.name,
            description: plan.description,
            price: plan.price,
            features: plan.features,
            is_active: plan.is_active,
            created_at: plan.created_at,
            updated_at: plan.updated_at,
        }
    }
}

/// Subscription representation with its plan embedded.
#[derive(Debug, Serialize)]
pub struct SubscriptionResponse {
    pub id: perche_core::SubscriptionId,
    pub user_id: UserId,
    pub plan_id: PlanId,
    pub status: SubscriptionStatus,
    pub start_date: DateTime<Utc>,
    pub end_date: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
    pub updated_at: Option<DateTime<Utc>>,
    pub plan: BillingPlanResponse,
}

impl SubscriptionResponse {
    fn from_parts(subscription: Subscription, plan: BillingPlan) -> Self {
        Self {
            id: subscription.id,
            user_id: subscription.user_id,
            plan_id: subscription.plan_id,
            status: subscription.status,
            start_date: subscription.start_date,
            end_date: subscription.end_date,
            created_at: subscription.created_at,
            updated_at: subscription.updated_at,
            plan: plan.into(),
        }
    }
}

/// Usage stats representation.
#[derive(Debug, Serialize)]
pub struct UsageStatsResponse {
    pub id: perche_core::UsageStatsId,
    pub user_id: UserId,
    pub api_calls_used: i64,
    pub api_calls_limit: i64,
    pub storage_used: i64,
    pub storage_limit: i64,
    pub team_members_used: i64,
    pub team_members_limit: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: Option<DateTime<Utc>>,
}

impl From<UsageStats> for UsageStatsResponse {
    fn from(usage: UsageStats) -> Self {
        Self {
            id: usage.id,
            user_id: usage.user_id,
            api_calls_used: usage.api_calls_used,
            api_calls_limit: usage.api_calls_limit,
            storage_used: usage.storage_used,
            storage_limit: usage.storage_limit,
            team_members_used: usage.team_members_used,
            team_members_limit: usage.team_members_limit,
            created_at: usage.created_at,
            updated_at: usage.updated_at,
        }
    }
}

/// Billing-history representation with its plan embedded.
#[derive(Debug, Serialize)]
pub struct BillingHistoryResponse {
    pub id: perche_core::BillingHistoryId,
    pub user_id: UserId,
    pub plan_id: PlanId,
    pub amount: Decimal,
    pub status: PaymentStatus,
    pub payment_date: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
    pub plan: BillingPlanResponse,
}

impl BillingHistoryResponse {
    fn from_parts(entry: BillingHistoryEntry, plan: BillingPlan) -> Self {
        Self {
            id: entry.id,
            user_id: entry.user_id,
            plan_id: entry.plan_id,
            amount: entry.amount,
            status: entry.status,
            payment_date: entry.payment_date,
            created_at: entry.created_at,
            plan: plan.into(),
        }
    }
}

/// Current-plan summary: plan, subscription, and usage together.
#[derive(Debug, Serialize)]
pub struct CurrentPlanResponse {
    pub plan: BillingPlanResponse,
    pub subscription: SubscriptionResponse,
    pub usage_stats: UsageStatsResponse,
}

// =============================================================================
// Plan Handlers
// =============================================================================

/// List billing plans.
pub async fn list_plans(
    State(state): State<AppState>,
    CurrentUser(_user): CurrentUser,
    Query(page): Query<Pagination>,
) -> Result<Json<Vec<BillingPlanResponse>>> {
    let plans = BillingRepository::new(state.pool())
        .list_plans(page.skip, page.limit)
        .await?;

    Ok(Json(plans.into_iter().map(Into::into).collect()))
}

/// Fetch a billing plan by ID.
pub async fn get_plan(
    State(state): State<AppState>,
    CurrentUser(_user): CurrentUser,
    Path(plan_id): Path<i64>,
) -> Result<Json<BillingPlanResponse>> {
    let plan = require_plan(&state, PlanId::new(plan_id)).await?;
    Ok(Json(plan.into()))
}

/// Create a new billing plan.
pub async fn create_plan(
    State(state): State<AppState>,
    CurrentUser(_user): CurrentUser,
    Json(req): Json<BillingPlanCreateRequest>,
) -> Result<Json<BillingPlanResponse>> {
    let plan = BillingRepository::new(state.pool())
        .create_plan(&NewBillingPlan {
            name: req.name,
            description: req.description,
            price: req.price,
            features: req.features,
            is_active: req.is_active,
        })
        .await?;

    Ok(Json(plan.into()))
}

/// Partially update a billing plan.
pub async fn update_plan(
    State(state): State<AppState>,
    CurrentUser(_user): CurrentUser,
    Path(plan_id): Path<i64>,
    Json(req): Json<BillingPlanUpdateRequest>,
) -> Result<Json<BillingPlanResponse>> {
    let plan = BillingRepository::new(state.pool())
        .update_plan(
            PlanId::new(plan_id),
            &BillingPlanPatch {
                name: req.name,
                description: req.description,
                price: req.price,
                features: req.features,
                is_active: req.is_active,
            },
        )
        .await
        .map_err(|e| match e {
            RepositoryError::NotFound => {
                AppError::NotFound("Billing plan not found".to_string())
            }
            other => AppError::Database(other),
        })?;

    Ok(Json(plan.into()))
}

// =============================================================================
// Subscription Handlers
// =============================================================================

/// Current subscription with its plan and usage stats.
pub async fn current_plan(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
) -> Result<Json<CurrentPlanResponse>> {
    let billing = BillingRepository::new(state.pool());

    let subscription = billing
        .active_subscription(user.id)
        .await?
        .ok_or_else(|| AppError::NotFound("No active subscription found".to_string()))?;

    let plan = require_plan(&state, subscription.plan_id).await?;

    let usage = billing
        .usage_stats(user.id)
        .await?
        .ok_or_else(|| AppError::NotFound("Usage stats not found".to_string()))?;

    Ok(Json(CurrentPlanResponse {
        plan: plan.clone().into(),
        subscription: SubscriptionResponse::from_parts(subscription, plan),
        usage_stats: usage.into(),
    }))
}

/// Subscribe to a billing plan.
///
/// Any existing active subscription is canceled (end date set to now)
/// before the new one is created.
pub async fn subscribe(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(plan_id): Path<i64>,
) -> Result<Json<SubscriptionResponse>> {
    let plan = require_plan(&state, PlanId::new(plan_id)).await?;

    let subscription = BillingRepository::new(state.pool())
        .subscribe(user.id, plan.id)
        .await?;

    tracing::info!(user_id = %user.id, plan_id = %plan.id, "subscription created");
    Ok(Json(SubscriptionResponse::from_parts(subscription, plan)))
}

// =============================================================================
// History Handlers
// =============================================================================

/// The current user's billing history.
pub async fn list_history(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Query(page): Query<Pagination>,
) -> Result<Json<Vec<BillingHistoryResponse>>> {
    let history = BillingRepository::new(state.pool())
        .list_history(user.id, page.skip, page.limit)
        .await?;

    Ok(Json(
        history
            .into_iter()
            .map(|(entry, plan)| BillingHistoryResponse::from_parts(entry, plan))
            .collect(),
    ))
}

/// Record a billing-history entry.
pub async fn create_history(
    State(state): State<AppState>,
    CurrentUser(_user): CurrentUser,
    Json(req): Json<BillingHistoryCreateRequest>,
) -> Result<Json<BillingHistoryResponse>> {
    let plan = require_plan(&state, PlanId::new(req.plan_id)).await?;

    let entry = BillingRepository::new(state.pool())
        .create_history(&NewBillingHistoryEntry {
            user_id: UserId::new(req.user_id),
            plan_id: plan.id,
            amount: req.amount,
            status: req.status,
            payment_date: req.payment_date,
        })
        .await?;

    Ok(Json(BillingHistoryResponse::from_parts(entry, plan)))
}

// =============================================================================
// Usage Handlers
// =============================================================================

/// The current user's usage statistics.
pub async fn get_usage(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
) -> Result<Json<UsageStatsResponse>> {
    let usage = BillingRepository::new(state.pool())
        .usage_stats(user.id)
        .await?
        .ok_or_else(|| AppError::NotFound("Usage stats not found".to_string()))?;

    Ok(Json(usage.into()))
}

/// Update the current user's usage counters.
pub async fn update_usage(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Json(req): Json<UsageUpdateRequest>,
) -> Result<Json<UsageStatsResponse>> {
    let usage = BillingRepository::new(state.pool())
        .update_usage(
            user.id,
            &UsageStatsPatch {
                api_calls_used: req.api_calls_used.map(i64::from),
                storage_used: req.storage_used.map(i64::from),
                team_members_used: req.team_members_used.map(i64::from),
            },
        )
        .await
        .map_err(|e| match e {
            RepositoryError::NotFound => {
                AppError::NotFound("Usage stats not found".to_string())
            }
            other => AppError::Database(other),
        })?;

    Ok(Json(usage.into()))
}

// =============================================================================
// Helpers
// =============================================================================

async fn require_plan(state: &AppState, plan_id: PlanId) -> Result<BillingPlan> {
    BillingRepository::new(state.pool())
        .get_plan(plan_id)
        .await?
        .ok_or_else(|| AppError::NotFound("Billing plan not found".to_string()))
}
