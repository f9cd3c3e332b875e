//! Order Repository
//!
//! Read-side access to the order ledger. All order mutations go through
//! `orders::OrderService`, which owns the transactional write path.

use super::{BaseRepository, CountRow, RepoResult, parse_record_id};
use crate::db::models::Order;
use crate::orders::OrderStatus;
use surrealdb::Surreal;
use surrealdb::engine::local::Db;

const ORDER_TABLE: &str = "order";

/// Filters for the order listing
#[derive(Debug, Default, Clone)]
pub struct OrderFilter {
    pub status: Option<OrderStatus>,
    /// Matches order_code, shipping name or shipping phone
    pub search: Option<String>,
    /// "user:xxx" record id string; set for customer-scoped listings
    pub customer: Option<String>,
}

#[derive(Clone)]
pub struct OrderRepository {
    base: BaseRepository,
}

impl OrderRepository {
    pub fn new(db: Surreal<Db>) -> Self {
        Self {
            base: BaseRepository::new(db),
        }
    }

    /// Find order by id
    pub async fn find_by_id(&self, id: &str) -> RepoResult<Option<Order>> {
        let rid = parse_record_id(ORDER_TABLE, id)?;
        let order: Option<Order> = self.base.db().select(rid).await?;
        Ok(order)
    }

    /// Paginated order listing with filters, newest first
    pub async fn find_page(
        &self,
        filter: &OrderFilter,
        page: i64,
        limit: i64,
    ) -> RepoResult<(Vec<Order>, i64)> {
        let mut conditions: Vec<&str> = Vec::new();
        if filter.status.is_some() {
            conditions.push("order_status = $status");
        }
        if filter.search.is_some() {
            conditions.push(
                "(string::contains(string::lowercase(order_code), $search) \
                 OR string::contains(string::lowercase(shipping_address.name), $search) \
                 OR string::contains(shipping_address.phone, $search))",
            );
        }
        if filter.customer.is_some() {
            conditions.push("customer = $customer");
        }
        let where_clause = if conditions.is_empty() {
            String::new()
        } else {
            format!(" WHERE {}", conditions.join(" AND "))
        };

        let list_sql = format!(
            "SELECT * FROM order{where_clause} ORDER BY created_at DESC LIMIT $limit START $start"
        );
        let count_sql = format!("SELECT count() AS count FROM order{where_clause} GROUP ALL");

        let start = (page.max(1) - 1) * limit;
        let mut query = self
            .base
            .db()
            .query(list_sql)
            .query(count_sql)
            .bind(("limit", limit))
            .bind(("start", start));
        if let Some(status) = filter.status {
            query = query.bind(("status", status));
        }
        if let Some(search) = &filter.search {
            query = query.bind(("search", search.to_lowercase()));
        }
        if let Some(customer) = &filter.customer {
            query = query.bind(("customer", customer.clone()));
        }

        let mut result = query.await?;
        let orders: Vec<Order> = result.take(0)?;
        let counts: Vec<CountRow> = result.take(1)?;
        Ok((orders, counts.first().map(|c| c.count).unwrap_or(0)))
    }

    /// All orders created inside `[start, end)` Unix millis, for statistics
    pub async fn find_in_range(&self, start: i64, end: i64) -> RepoResult<Vec<Order>> {
        let orders: Vec<Order> = self
            .base
            .db()
            .query(
                "SELECT * FROM order WHERE created_at >= $start AND created_at < $end \
                 ORDER BY created_at",
            )
            .bind(("start", start))
            .bind(("end", end))
            .await?
            .take(0)?;
        Ok(orders)
    }
}
