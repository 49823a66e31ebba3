//! Analytics route handlers.
//!
//! Randomized sample payloads over a date range; placeholder data until a
//! real analytics store is wired up.

use axum::Json;
use axum::extract::Query;
use chrono::{DateTime, Duration, Utc};
use rand::Rng;
use serde::Deserialize;
use serde_json::{Value, json};

use crate::middleware::CurrentUser;

/// Default trailing window when no range is given.
const DEFAULT_RANGE_DAYS: i64 = 30;

/// Optional date-range query parameters (RFC 3339 timestamps).
#[derive(Debug, Default, Deserialize)]
pub struct DateRangeQuery {
    pub start_date: Option<DateTime<Utc>>,
    pub end_date: Option<DateTime<Utc>>,
}

/// Query parameters for the mentions endpoint.
#[derive(Debug, Deserialize)]
pub struct MentionsQuery {
    #[serde(default = "default_mentions_limit")]
    pub limit: usize,
    pub start_date: Option<DateTime<Utc>>,
    pub end_date: Option<DateTime<Utc>>,
}

const fn default_mentions_limit() -> usize {
    10
}

/// Resolve a query range to concrete (start, end) bounds.
fn resolve_range(
    start_date: Option<DateTime<Utc>>,
    end_date: Option<DateTime<Utc>>,
) -> (DateTime<Utc>, DateTime<Utc>) {
    let end = end_date.unwrap_or_else(Utc::now);
    let start = start_date.unwrap_or_else(|| end - Duration::days(DEFAULT_RANGE_DAYS));
    (start, end)
}

/// Days in the range, inclusive of both endpoints.
fn days_in_range(start: DateTime<Utc>, end: DateTime<Utc>) -> i64 {
    (end - start).num_days().max(0) + 1
}

fn period(start: DateTime<Utc>, end: DateTime<Utc>) -> Value {
    json!({ "start": start.to_rfc3339(), "end": end.to_rfc3339() })
}

fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

/// Product engagement trends.
pub async fn product_engagement(
    CurrentUser(_user): CurrentUser,
    Query(query): Query<DateRangeQuery>,
) -> Json<Value> {
    let (start, end) = resolve_range(query.start_date, query.end_date);
    let mut rng = rand::rng();

    let trends: Vec<Value> = (0..days_in_range(start, end))
        .map(|day| {
            let date = start + Duration::days(day);
            json!({
                "date": date.format("%Y-%m-%d").to_string(),
                "views": rng.random_range(100..=1000),
                "clicks": rng.random_range(50..=500),
                "conversions": rng.random_range(10..=100),
                "engagement_rate": round2(rng.random_range(0.1..0.5)),
            })
        })
        .collect();

    Json(json!({ "trends": trends, "period": period(start, end) }))
}

/// Sales performance.
pub async fn sales_performance(
    CurrentUser(_user): CurrentUser,
    Query(query): Query<DateRangeQuery>,
) -> Json<Value> {
    let (start, end) = resolve_range(query.start_date, query.end_date);
    let mut rng = rand::rng();

    let performance: Vec<Value> = (0..days_in_range(start, end))
        .map(|day| {
            let date = start + Duration::days(day);
            json!({
                "date": date.format("%Y-%m-%d").to_string(),
                "revenue": round2(rng.random_range(1000.0..10000.0)),
                "orders": rng.random_range(10..=100),
                "average_order_value": round2(rng.random_range(50.0..200.0)),
                "growth_rate": round2(rng.random_range(-0.1..0.3)),
            })
        })
        .collect();

    Json(json!({ "performance": performance, "period": period(start, end) }))
}

/// Intent query trends.
pub async fn intent_trends(
    CurrentUser(_user): CurrentUser,
    Query(query): Query<DateRangeQuery>,
) -> Json<Value> {
    const INTENT_CATEGORIES: [&str; 5] =
        ["purchase", "information", "support", "comparison", "review"];

    let (start, end) = resolve_range(query.start_date, query.end_date);
    let mut rng = rand::rng();

    let trends: Vec<Value> = (0..days_in_range(start, end))
        .map(|day| {
            let date = start + Duration::days(day);
            let intents: serde_json::Map<String, Value> = INTENT_CATEGORIES
                .iter()
                .map(|category| ((*category).to_string(), json!(rng.random_range(10..=100))))
                .collect();
            json!({
                "date": date.format("%Y-%m-%d").to_string(),
                "intents": intents,
                "total_queries": rng.random_range(50..=500),
            })
        })
        .collect();

    Json(json!({ "trends": trends, "period": period(start, end) }))
}

/// User segmentation.
pub async fn user_segmentation(CurrentUser(_user): CurrentUser) -> Json<Value> {
    let mut rng = rand::rng();

    let segments = vec![
        json!({
            "name": "Power Users",
            "count": rng.random_range(100..=1000),
            "percentage": round2(rng.random_range(0.1..0.3)),
            "avg_session_duration": rng.random_range(10..=60),
            "features_used": rng.random_range(5..=15),
        }),
        json!({
            "name": "Regular Users",
            "count": rng.random_range(500..=2000),
            "percentage": round2(rng.random_range(0.3..0.5)),
            "avg_session_duration": rng.random_range(5..=30),
            "features_used": rng.random_range(3..=8),
        }),
        json!({
            "name": "Occasional Users",
            "count": rng.random_range(200..=800),
            "percentage": round2(rng.random_range(0.1..0.2)),
            "avg_session_duration": rng.random_range(1..=15),
            "features_used": rng.random_range(1..=4),
        }),
        json!({
            "name": "New Users",
            "count": rng.random_range(50..=300),
            "percentage": round2(rng.random_range(0.05..0.15)),
            "avg_session_duration": rng.random_range(1..=10),
            "features_used": rng.random_range(1..=3),
        }),
    ];

    let total_users: i64 = segments
        .iter()
        .filter_map(|s| s["count"].as_i64())
        .sum();

    Json(json!({ "segments": segments, "total_users": total_users }))
}

/// System performance metrics.
pub async fn system_performance(
    CurrentUser(_user): CurrentUser,
    Query(query): Query<DateRangeQuery>,
) -> Json<Value> {
    let (start, end) = resolve_range(query.start_date, query.end_date);
    let mut rng = rand::rng();

    let metrics: Vec<Value> = (0..days_in_range(start, end))
        .map(|day| {
            let date = start + Duration::days(day);
            json!({
                "date": date.format("%Y-%m-%d").to_string(),
                "response_time": round2(rng.random_range(100.0..500.0)),
                "error_rate": (rng.random_range(0.001..0.05_f64) * 10_000.0).round() / 10_000.0,
                "cpu_usage": round2(rng.random_range(20.0..80.0)),
                "memory_usage": round2(rng.random_range(30.0..90.0)),
                "active_users": rng.random_range(100..=1000),
            })
        })
        .collect();

    Json(json!({ "metrics": metrics, "period": period(start, end) }))
}

/// Most mentioned products.
pub async fn most_mentioned_products(
    CurrentUser(_user): CurrentUser,
    Query(query): Query<MentionsQuery>,
) -> Json<Value> {
    const PRODUCT_NAMES: [&str; 15] = [
        "iPhone 15 Pro",
        "MacBook Pro M3",
        "iPad Air",
        "Apple Watch Series 9",
        "AirPods Pro",
        "Apple Vision Pro",
        "iMac 24-inch",
        "Mac Studio",
        "Apple TV 4K",
        "HomePod mini",
        "Magic Keyboard",
        "Magic Mouse",
        "AirTag",
        "Apple Pencil",
        "Studio Display",
    ];
    const TRENDS: [&str; 3] = ["up", "down", "stable"];

    let (start, end) = resolve_range(query.start_date, query.end_date);
    let mut rng = rand::rng();

    let mut products: Vec<Value> = PRODUCT_NAMES
        .iter()
        .take(query.limit)
        .map(|name| {
            let trend = TRENDS[rng.random_range(0..TRENDS.len())];
            json!({
                "name": name,
                "mentions": rng.random_range(50..=500),
                "sentiment_score": round2(rng.random_range(-1.0..1.0)),
                "trend": trend,
                "growth_rate": round2(rng.random_range(-0.2..0.4)),
            })
        })
        .collect();

    products.sort_by_key(|p| std::cmp::Reverse(p["mentions"].as_i64().unwrap_or(0)));

    Json(json!({ "products": products, "period": period(start, end) }))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_resolve_range_defaults_to_trailing_month() {
        let (start, end) = resolve_range(None, None);
        assert_eq!((end - start).num_days(), DEFAULT_RANGE_DAYS);
    }

    #[test]
    fn test_days_in_range_is_inclusive() {
        let end = Utc::now();
        let start = end - Duration::days(2);
        assert_eq!(days_in_range(start, end), 3);
    }

    #[test]
    fn test_days_in_range_inverted_bounds() {
        let start = Utc::now();
        let end = start - Duration::days(5);
        // Inverted ranges collapse to a single day instead of panicking.
        assert_eq!(days_in_range(start, end), 1);
    }

    #[test]
    fn test_round2() {
        assert!((round2(0.12345) - 0.12).abs() < f64::EPSILON);
        assert!((round2(0.999) - 1.0).abs() < f64::EPSILON);
    }
}
