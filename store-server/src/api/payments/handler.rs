//! Payment API Handlers
//!
//! Manual payment entry, status updates (admin action or inbound gateway
//! notification — the notification itself is not verified here) and the
//! revenue report. Completing or failing a payment reconciles the linked
//! order through `OrderService::apply_payment_status`.

use axum::{
    Json,
    extract::{Path, Query, State},
};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::auth::CurrentUser;
use crate::core::ServerState;
use crate::db::models::{
    Payment, PaymentCreate, PaymentMethod, PaymentRecordStatus, PaymentStatusUpdate, PaymentType,
};
use crate::db::repository::payment::PaymentFilter;
use crate::db::repository::{OrderRepository, PaymentRepository};
use crate::orders::OrderService;
use crate::orders::money;
use crate::utils::time::{day_key, month_key, parse_date, day_start_millis, day_end_millis};
use crate::utils::{AppError, AppResult, ErrorCode, Page, Pagination};

/// Query params for the payment listing
#[derive(Debug, Deserialize)]
pub struct ListQuery {
    #[serde(default = "default_page")]
    pub page: i64,
    #[serde(default = "default_limit")]
    pub limit: i64,
    pub method: Option<PaymentMethod>,
    pub status: Option<PaymentRecordStatus>,
    #[serde(rename = "type")]
    pub payment_type: Option<PaymentType>,
}

fn default_page() -> i64 {
    1
}

fn default_limit() -> i64 {
    15
}

/// POST /api/admin/payments - manual payment entry
pub async fn create(
    State(state): State<ServerState>,
    user: CurrentUser,
    Json(payload): Json<PaymentCreate>,
) -> AppResult<Json<Payment>> {
    let order_repo = OrderRepository::new(state.db.clone());
    let order = order_repo
        .find_by_id(&payload.order_id)
        .await?
        .ok_or_else(|| {
            AppError::with_message(
                ErrorCode::OrderNotFound,
                format!("Order not found: {}", payload.order_id),
            )
        })?;

    let amount = payload.amount.unwrap_or(order.total_amount);
    if !amount.is_finite() || amount <= 0.0 || amount > money::MAX_PRICE {
        return Err(AppError::validation("invalid payment amount"));
    }

    let created_by: Option<surrealdb::RecordId> = user.id.parse().ok();

    let repo = PaymentRepository::new(state.db.clone());
    let payment = repo
        .create(Payment {
            id: None,
            order: order
                .id
                .ok_or_else(|| AppError::internal("Order has no id"))?,
            amount,
            method: payload.method,
            payment_type: payload.payment_type.unwrap_or(PaymentType::Income),
            status: PaymentRecordStatus::Pending,
            transaction_id: None,
            paid_at: None,
            refunded_at: None,
            note: payload.note,
            created_by,
            created_at: 0,
        })
        .await?;

    tracing::info!(order = %payload.order_id, amount, "payment recorded");
    Ok(Json(payment))
}

/// PUT /api/admin/payments/{id} - status update + order reconciliation
pub async fn update_status(
    State(state): State<ServerState>,
    Path(id): Path<String>,
    Json(payload): Json<PaymentStatusUpdate>,
) -> AppResult<Json<Payment>> {
    let repo = PaymentRepository::new(state.db.clone());

    if repo.find_by_id(&id).await?.is_none() {
        return Err(AppError::with_message(
            ErrorCode::PaymentNotFound,
            format!("Payment not found: {}", id),
        ));
    }

    let payment = repo.update_status(&id, payload).await?;

    // Keep the order ledger in sync: completed -> paid/confirmed,
    // failed -> failed. No stock effect either way.
    let service = OrderService::new(state.db.clone());
    if let Some(order) = service.apply_payment_status(&payment).await? {
        tracing::info!(
            payment = %id,
            order = %order.order_code,
            payment_status = %order.payment_status,
            "order reconciled after payment update"
        );
    }

    Ok(Json(payment))
}

/// GET /api/admin/payments - listing with filters
pub async fn list(
    State(state): State<ServerState>,
    Query(query): Query<ListQuery>,
) -> AppResult<Json<Page<Payment>>> {
    let (page, limit) = (query.page.max(1), query.limit.clamp(1, 100));
    let repo = PaymentRepository::new(state.db.clone());
    let filter = PaymentFilter {
        method: query.method,
        status: query.status,
        payment_type: query.payment_type,
    };
    let (items, total) = repo.find_page(&filter, page, limit).await?;
    Ok(Json(Page {
        items,
        pagination: Pagination::new(page, limit, total),
    }))
}

// =============================================================================
// Revenue report
// =============================================================================

#[derive(Debug, Deserialize)]
pub struct ReportQuery {
    #[serde(rename = "startDate")]
    pub start_date: String,
    #[serde(rename = "endDate")]
    pub end_date: String,
    /// "day" (default) or "month"
    #[serde(default = "default_group_by", rename = "groupBy")]
    pub group_by: String,
}

fn default_group_by() -> String {
    "day".to_string()
}

#[derive(Debug, Serialize)]
pub struct RevenueRow {
    pub period: String,
    pub total: f64,
    pub count: i64,
}

#[derive(Debug, Serialize)]
pub struct RevenueReport {
    pub revenue: Vec<RevenueRow>,
    pub total_revenue: f64,
    pub group_by: String,
}

/// GET /api/admin/payments/report - completed income grouped by period
pub async fn revenue_report(
    State(state): State<ServerState>,
    Query(query): Query<ReportQuery>,
) -> AppResult<Json<RevenueReport>> {
    if query.group_by != "day" && query.group_by != "month" {
        return Err(AppError::validation("groupBy must be 'day' or 'month'"));
    }

    let start = day_start_millis(parse_date(&query.start_date)?);
    let end = day_end_millis(parse_date(&query.end_date)?);
    if start >= end {
        return Err(AppError::validation("startDate must not be after endDate"));
    }

    let repo = PaymentRepository::new(state.db.clone());
    let payments = repo.find_completed_income_in_range(start, end).await?;

    let mut buckets: BTreeMap<String, (rust_decimal::Decimal, i64)> = BTreeMap::new();
    for payment in &payments {
        let period = if query.group_by == "month" {
            month_key(payment.created_at)
        } else {
            day_key(payment.created_at)
        };
        let entry = buckets
            .entry(period)
            .or_insert((rust_decimal::Decimal::ZERO, 0));
        entry.0 += money::to_decimal(payment.amount);
        entry.1 += 1;
    }

    let mut total = rust_decimal::Decimal::ZERO;
    let revenue: Vec<RevenueRow> = buckets
        .into_iter()
        .map(|(period, (sum, count))| {
            total += sum;
            RevenueRow {
                period,
                total: money::to_f64(sum),
                count,
            }
        })
        .collect();

    Ok(Json(RevenueReport {
        revenue,
        total_revenue: money::to_f64(total),
        group_by: query.group_by,
    }))
}
