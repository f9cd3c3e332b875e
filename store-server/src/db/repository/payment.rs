//! Payment Repository

use super::{BaseRepository, CountRow, RepoError, RepoResult, parse_record_id};
use crate::db::models::{Payment, PaymentMethod, PaymentRecordStatus, PaymentStatusUpdate, PaymentType};
use crate::utils::time::now_millis;
use surrealdb::Surreal;
use surrealdb::engine::local::Db;

const PAYMENT_TABLE: &str = "payment";

/// Filters for the payment listing
#[derive(Debug, Default, Clone)]
pub struct PaymentFilter {
    pub method: Option<PaymentMethod>,
    pub status: Option<PaymentRecordStatus>,
    pub payment_type: Option<PaymentType>,
}

#[derive(Clone)]
pub struct PaymentRepository {
    base: BaseRepository,
}

impl PaymentRepository {
    pub fn new(db: Surreal<Db>) -> Self {
        Self {
            base: BaseRepository::new(db),
        }
    }

    /// Find payment by id
    pub async fn find_by_id(&self, id: &str) -> RepoResult<Option<Payment>> {
        let rid = parse_record_id(PAYMENT_TABLE, id)?;
        let payment: Option<Payment> = self.base.db().select(rid).await?;
        Ok(payment)
    }

    /// Create a payment record
    pub async fn create(&self, payment: Payment) -> RepoResult<Payment> {
        let payment = Payment {
            created_at: now_millis(),
            ..payment
        };
        let created: Option<Payment> = self
            .base
            .db()
            .create(PAYMENT_TABLE)
            .content(payment)
            .await?;
        created.ok_or_else(|| RepoError::Database("Failed to create payment".to_string()))
    }

    /// Apply a status update, stamping paid_at / refunded_at as appropriate
    pub async fn update_status(&self, id: &str, data: PaymentStatusUpdate) -> RepoResult<Payment> {
        let rid = parse_record_id(PAYMENT_TABLE, id)?;

        let mut set_parts = vec!["status = $status"];
        if matches!(data.status, PaymentRecordStatus::Completed) {
            set_parts.push("paid_at = $now");
        }
        if matches!(
            data.status,
            PaymentRecordStatus::Refunded | PaymentRecordStatus::PartialRefunded
        ) {
            set_parts.push("refunded_at = $now");
        }
        if data.transaction_id.is_some() {
            set_parts.push("transaction_id = $transaction_id");
        }
        if data.note.is_some() {
            set_parts.push("note = $note");
        }

        let sql = format!("UPDATE $id SET {} RETURN AFTER", set_parts.join(", "));
        let mut query = self
            .base
            .db()
            .query(sql)
            .bind(("id", rid))
            .bind(("status", data.status))
            .bind(("now", now_millis()));
        if let Some(v) = data.transaction_id {
            query = query.bind(("transaction_id", v));
        }
        if let Some(v) = data.note {
            query = query.bind(("note", v));
        }

        let mut result = query.await?;
        let payments: Vec<Payment> = result.take(0)?;
        payments
            .into_iter()
            .next()
            .ok_or_else(|| RepoError::NotFound(format!("Payment {} not found", id)))
    }

    /// Paginated payment listing with filters, newest first
    pub async fn find_page(
        &self,
        filter: &PaymentFilter,
        page: i64,
        limit: i64,
    ) -> RepoResult<(Vec<Payment>, i64)> {
        let mut conditions: Vec<&str> = Vec::new();
        if filter.method.is_some() {
            conditions.push("method = $method");
        }
        if filter.status.is_some() {
            conditions.push("status = $status");
        }
        if filter.payment_type.is_some() {
            conditions.push("`type` = $type");
        }
        let where_clause = if conditions.is_empty() {
            String::new()
        } else {
            format!(" WHERE {}", conditions.join(" AND "))
        };

        let list_sql = format!(
            "SELECT * FROM payment{where_clause} ORDER BY created_at DESC LIMIT $limit START $start"
        );
        let count_sql = format!("SELECT count() AS count FROM payment{where_clause} GROUP ALL");

        let start = (page.max(1) - 1) * limit;
        let mut query = self
            .base
            .db()
            .query(list_sql)
            .query(count_sql)
            .bind(("limit", limit))
            .bind(("start", start));
        if let Some(method) = filter.method {
            query = query.bind(("method", method));
        }
        if let Some(status) = filter.status {
            query = query.bind(("status", status));
        }
        if let Some(payment_type) = filter.payment_type {
            query = query.bind(("type", payment_type));
        }

        let mut result = query.await?;
        let payments: Vec<Payment> = result.take(0)?;
        let counts: Vec<CountRow> = result.take(1)?;
        Ok((payments, counts.first().map(|c| c.count).unwrap_or(0)))
    }

    /// Completed income payments inside `[start, end)`, for revenue reports
    pub async fn find_completed_income_in_range(
        &self,
        start: i64,
        end: i64,
    ) -> RepoResult<Vec<Payment>> {
        let payments: Vec<Payment> = self
            .base
            .db()
            .query(
                "SELECT * FROM payment WHERE status = 'completed' AND `type` = 'income' \
                 AND created_at >= $start AND created_at < $end ORDER BY created_at",
            )
            .bind(("start", start))
            .bind(("end", end))
            .await?
            .take(0)?;
        Ok(payments)
    }
}
