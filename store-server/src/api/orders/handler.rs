//! Order API Handlers
//!
//! Thin request/response mapping over `orders::OrderService`, which owns
//! every stock-touching mutation.

use axum::{
    Json,
    extract::{Path, Query, State},
};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

use crate::auth::CurrentUser;
use crate::core::ServerState;
use crate::db::models::{Order, User};
use crate::db::repository::order::OrderFilter;
use crate::db::repository::{OrderRepository, ProductRepository, UserRepository};
use crate::orders::{Actor, OrderService, OrderStatus, PlaceOrderRequest, StatusUpdateRequest};
use crate::utils::{AppError, AppResult, Page, Pagination};

/// Query params for order listings
#[derive(Debug, Deserialize)]
pub struct ListQuery {
    #[serde(default = "default_page")]
    pub page: i64,
    #[serde(default = "default_limit")]
    pub limit: i64,
    pub status: Option<OrderStatus>,
    /// Matches order code, shipping name or phone
    pub search: Option<String>,
}

fn default_page() -> i64 {
    1
}

fn default_limit() -> i64 {
    10
}

/// Minimal customer display fields joined onto an order
#[derive(Debug, Serialize)]
pub struct CustomerInfo {
    pub id: String,
    pub name: String,
    pub email: Option<String>,
    pub phone: Option<String>,
}

impl From<User> for CustomerInfo {
    fn from(user: User) -> Self {
        Self {
            id: user.id.map(|i| i.to_string()).unwrap_or_default(),
            name: user.name,
            email: user.email,
            phone: user.phone,
        }
    }
}

/// Minimal product display fields joined onto an order
#[derive(Debug, Serialize)]
pub struct ProductBrief {
    pub id: String,
    pub name: String,
    pub slug: String,
    pub thumbnail: Option<String>,
}

/// Order joined with display fields for the customer and referenced products
#[derive(Debug, Serialize)]
pub struct OrderDetail {
    #[serde(flatten)]
    pub order: Order,
    pub customer_info: Option<CustomerInfo>,
    pub products: Vec<ProductBrief>,
}

fn actor(user: &CurrentUser) -> Actor {
    Actor {
        id: user.id.clone(),
        is_admin: user.is_admin(),
    }
}

/// Join minimal customer and product display fields onto an order
async fn into_detail(state: &ServerState, order: Order) -> AppResult<OrderDetail> {
    let customer_info = match &order.customer {
        Some(customer) => UserRepository::new(state.db.clone())
            .find_by_id(&customer.to_string())
            .await?
            .map(CustomerInfo::from),
        None => None,
    };

    let product_repo = ProductRepository::new(state.db.clone());
    let mut seen: HashSet<String> = HashSet::new();
    let mut products = Vec::new();
    for item in &order.items {
        let key = item.product.to_string();
        if !seen.insert(key.clone()) {
            continue;
        }
        if let Some(product) = product_repo.find_by_id(&key).await? {
            products.push(ProductBrief {
                id: key,
                name: product.name,
                slug: product.slug,
                thumbnail: product.thumbnail,
            });
        }
    }

    Ok(OrderDetail {
        order,
        customer_info,
        products,
    })
}

// =============================================================================
// Customer handlers
// =============================================================================

/// POST /api/orders - place an order (checkout)
pub async fn create(
    State(state): State<ServerState>,
    user: CurrentUser,
    Json(payload): Json<PlaceOrderRequest>,
) -> AppResult<Json<OrderDetail>> {
    let customer: surrealdb::RecordId = user
        .id
        .parse()
        .map_err(|_| AppError::internal("Malformed user id in token"))?;

    let service = OrderService::new(state.db.clone());
    let order = service.place(Some(customer), &payload).await?;

    tracing::info!(
        code = %order.order_code,
        customer = %user.username,
        total = order.total_amount,
        "order placed"
    );

    Ok(Json(into_detail(&state, order).await?))
}

/// GET /api/orders - the caller's own orders
pub async fn list_own(
    State(state): State<ServerState>,
    user: CurrentUser,
    Query(query): Query<ListQuery>,
) -> AppResult<Json<Page<Order>>> {
    let (page, limit) = (query.page.max(1), query.limit.clamp(1, 100));
    let repo = OrderRepository::new(state.db.clone());
    let filter = OrderFilter {
        status: query.status,
        search: None,
        customer: Some(user.id.clone()),
    };
    let (items, total) = repo.find_page(&filter, page, limit).await?;
    Ok(Json(Page {
        items,
        pagination: Pagination::new(page, limit, total),
    }))
}

/// GET /api/orders/{id} - order detail (owner or admin)
pub async fn get_by_id(
    State(state): State<ServerState>,
    user: CurrentUser,
    Path(id): Path<String>,
) -> AppResult<Json<OrderDetail>> {
    let service = OrderService::new(state.db.clone());
    let order = service.get(&id, &actor(&user)).await?;
    Ok(Json(into_detail(&state, order).await?))
}

/// PUT /api/orders/{id}/cancel - customer-initiated cancellation
pub async fn cancel(
    State(state): State<ServerState>,
    user: CurrentUser,
    Path(id): Path<String>,
) -> AppResult<Json<OrderDetail>> {
    let service = OrderService::new(state.db.clone());
    let order = service.cancel(&id, &actor(&user)).await?;

    tracing::info!(code = %order.order_code, customer = %user.username, "order cancelled by customer");

    Ok(Json(into_detail(&state, order).await?))
}

// =============================================================================
// Admin handlers
// =============================================================================

/// GET /api/admin/orders - back-office listing with filters
pub async fn admin_list(
    State(state): State<ServerState>,
    Query(query): Query<ListQuery>,
) -> AppResult<Json<Page<Order>>> {
    let (page, limit) = (query.page.max(1), query.limit.clamp(1, 100));
    let repo = OrderRepository::new(state.db.clone());
    let filter = OrderFilter {
        status: query.status,
        search: query.search,
        customer: None,
    };
    let (items, total) = repo.find_page(&filter, page, limit).await?;
    Ok(Json(Page {
        items,
        pagination: Pagination::new(page, limit, total),
    }))
}

/// GET /api/admin/orders/{id} - order detail without ownership check
pub async fn admin_get(
    State(state): State<ServerState>,
    Path(id): Path<String>,
) -> AppResult<Json<OrderDetail>> {
    let repo = OrderRepository::new(state.db.clone());
    let order = repo
        .find_by_id(&id)
        .await?
        .ok_or_else(|| AppError::with_message(crate::utils::ErrorCode::OrderNotFound, format!("Order not found: {}", id)))?;
    Ok(Json(into_detail(&state, order).await?))
}

/// PUT /api/admin/orders/{id}/status - admin status transition
///
/// Moving into `cancelled` restores reserved stock; shipping/delivered
/// stamp their timestamps. Transitions obey the shared state machine.
pub async fn update_status(
    State(state): State<ServerState>,
    user: CurrentUser,
    Path(id): Path<String>,
    Json(payload): Json<StatusUpdateRequest>,
) -> AppResult<Json<OrderDetail>> {
    let service = OrderService::new(state.db.clone());
    let order = service.update_status(&id, &payload).await?;

    tracing::info!(
        code = %order.order_code,
        admin = %user.username,
        order_status = %order.order_status,
        payment_status = %order.payment_status,
        "order status updated"
    );

    Ok(Json(into_detail(&state, order).await?))
}
