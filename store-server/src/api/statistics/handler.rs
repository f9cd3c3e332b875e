//! Statistics API Handlers
//!
//! Read-only rollups over the order ledger for a date range. Cancelled
//! orders are excluded from revenue and tracked separately as refunds.

use axum::{
    Json,
    extract::{Query, State},
};
use chrono::Duration;
use rust_decimal::Decimal;
use rust_decimal::prelude::ToPrimitive;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::core::ServerState;
use crate::db::models::Order;
use crate::db::repository::OrderRepository;
use crate::orders::money::{to_decimal, to_f64};
use crate::orders::{OrderStatus, money};
use crate::utils::time;
use crate::utils::AppResult;

// ============================================================================
// Response Types
// ============================================================================

/// Headline numbers for the selected range
#[derive(Debug, Clone, Serialize)]
pub struct SummaryStats {
    pub total_revenue: f64,
    pub total_orders: i64,
    pub completed_orders: i64,
    pub cancelled_orders: i64,
    pub average_order_value: f64,
    pub total_refund: f64,
}

/// Revenue/orders/refund for one day
#[derive(Debug, Clone, Serialize)]
pub struct DailyRevenuePoint {
    pub date: String,
    pub revenue: f64,
    pub orders: i64,
    pub refund: f64,
}

/// Breakdown per payment method
#[derive(Debug, Clone, Serialize)]
pub struct PaymentMethodStat {
    pub name: String,
    pub orders: i64,
    pub amount: f64,
    /// Share of total revenue, whole percent
    pub percent: i64,
}

/// Product ranked by revenue
#[derive(Debug, Clone, Serialize)]
pub struct TopProduct {
    pub name: String,
    pub revenue: f64,
    pub quantity: i64,
}

/// Full statistics response
#[derive(Debug, Clone, Serialize)]
pub struct RevenueStatsResponse {
    pub summary: SummaryStats,
    pub daily_revenue: Vec<DailyRevenuePoint>,
    pub payment_methods: Vec<PaymentMethodStat>,
    pub top_products: Vec<TopProduct>,
}

// ============================================================================
// Query Parameters
// ============================================================================

#[derive(Debug, Deserialize)]
pub struct StatsQuery {
    /// today | yesterday | 7days | 30days | thisMonth | lastMonth | custom
    #[serde(default = "default_range")]
    pub range: String,
    #[serde(rename = "startDate")]
    pub start_date: Option<String>,
    #[serde(rename = "endDate")]
    pub end_date: Option<String>,
}

fn default_range() -> String {
    "7days".to_string()
}

// ============================================================================
// Handler
// ============================================================================

/// GET /api/admin/statistics/revenue
pub async fn revenue_stats(
    State(state): State<ServerState>,
    Query(query): Query<StatsQuery>,
) -> AppResult<Json<RevenueStatsResponse>> {
    let (start, end) = time::resolve_range(
        &query.range,
        query.start_date.as_deref(),
        query.end_date.as_deref(),
    )?;

    let repo = OrderRepository::new(state.db.clone());
    let orders = repo.find_in_range(start, end).await?;

    let (active, cancelled): (Vec<&Order>, Vec<&Order>) = orders
        .iter()
        .partition(|o| o.order_status != OrderStatus::Cancelled);

    // ---- summary ----
    let total_revenue_dec = active
        .iter()
        .fold(Decimal::ZERO, |acc, o| acc + to_decimal(o.total_amount));
    let total_refund_dec = cancelled
        .iter()
        .fold(Decimal::ZERO, |acc, o| acc + to_decimal(o.total_amount));

    let total_orders = active.len() as i64;
    let completed_orders = active
        .iter()
        .filter(|o| o.order_status == OrderStatus::Delivered)
        .count() as i64;
    let average_order_value = if total_orders > 0 {
        to_f64(total_revenue_dec / Decimal::from(total_orders))
    } else {
        0.0
    };

    let summary = SummaryStats {
        total_revenue: to_f64(total_revenue_dec),
        total_orders,
        completed_orders,
        cancelled_orders: cancelled.len() as i64,
        average_order_value,
        total_refund: to_f64(total_refund_dec),
    };

    // ---- per-day series, one bucket per day of the range ----
    let mut day_index: Vec<String> = Vec::new();
    let mut day_buckets: HashMap<String, (Decimal, i64, Decimal)> = HashMap::new();
    let mut cursor = chrono::DateTime::from_timestamp_millis(start)
        .map(|dt| dt.date_naive())
        .unwrap_or_default();
    let last = chrono::DateTime::from_timestamp_millis(end - 1)
        .map(|dt| dt.date_naive())
        .unwrap_or(cursor);
    while cursor <= last {
        let key = cursor.format("%Y-%m-%d").to_string();
        day_index.push(key.clone());
        day_buckets.insert(key, (Decimal::ZERO, 0, Decimal::ZERO));
        cursor += Duration::days(1);
    }

    for order in &active {
        if let Some(bucket) = day_buckets.get_mut(&time::day_key(order.created_at)) {
            bucket.0 += to_decimal(order.total_amount);
            bucket.1 += 1;
        }
    }
    for order in &cancelled {
        if let Some(bucket) = day_buckets.get_mut(&time::day_key(order.created_at)) {
            bucket.2 += to_decimal(order.total_amount);
        }
    }

    let daily_revenue: Vec<DailyRevenuePoint> = day_index
        .into_iter()
        .map(|date| {
            let (revenue, orders, refund) = day_buckets
                .get(&date)
                .cloned()
                .unwrap_or((Decimal::ZERO, 0, Decimal::ZERO));
            DailyRevenuePoint {
                date,
                revenue: to_f64(revenue),
                orders,
                refund: to_f64(refund),
            }
        })
        .collect();

    // ---- payment-method breakdown ----
    let mut method_buckets: Vec<(String, i64, Decimal)> = Vec::new();
    for order in &active {
        let name = order.payment_method.as_str().to_string();
        match method_buckets.iter_mut().find(|(n, _, _)| *n == name) {
            Some(bucket) => {
                bucket.1 += 1;
                bucket.2 += to_decimal(order.total_amount);
            }
            None => method_buckets.push((name, 1, to_decimal(order.total_amount))),
        }
    }
    let payment_methods: Vec<PaymentMethodStat> = method_buckets
        .into_iter()
        .map(|(name, orders, amount)| {
            let percent = if total_revenue_dec > Decimal::ZERO {
                ((amount / total_revenue_dec) * Decimal::from(100))
                    .round()
                    .to_i64()
                    .unwrap_or(0)
            } else {
                0
            };
            PaymentMethodStat {
                name,
                orders,
                amount: to_f64(amount),
                percent,
            }
        })
        .collect();

    // ---- top products by revenue ----
    let mut product_buckets: HashMap<String, (Decimal, i64)> = HashMap::new();
    for order in &active {
        for item in &order.items {
            let entry = product_buckets
                .entry(item.product.to_string())
                .or_insert((Decimal::ZERO, 0));
            entry.0 += money::line_total(item.price, item.quantity);
            entry.1 += item.quantity;
        }
    }
    let mut ranked: Vec<(String, Decimal, i64)> = product_buckets
        .into_iter()
        .map(|(id, (revenue, quantity))| (id, revenue, quantity))
        .collect();
    ranked.sort_by(|a, b| b.1.cmp(&a.1));
    ranked.truncate(5);

    // Join display names onto the winners; deleted products keep their id
    let product_repo = crate::db::repository::ProductRepository::new(state.db.clone());
    let mut top_products = Vec::with_capacity(ranked.len());
    for (id, revenue, quantity) in ranked {
        let name = product_repo
            .find_by_id(&id)
            .await?
            .map(|p| p.name)
            .unwrap_or(id);
        top_products.push(TopProduct {
            name,
            revenue: to_f64(revenue),
            quantity,
        });
    }

    Ok(Json(RevenueStatsResponse {
        summary,
        daily_revenue,
        payment_methods,
        top_products,
    }))
}
