//! Order API module

mod handler;

use axum::{
    Router, middleware,
    routing::{get, put},
};

use crate::auth::require_admin;
use crate::core::ServerState;

pub fn router() -> Router<ServerState> {
    Router::new()
        .nest("/api/orders", customer_routes())
        .nest(
            "/api/admin/orders",
            admin_routes().route_layer(middleware::from_fn(require_admin)),
        )
}

fn customer_routes() -> Router<ServerState> {
    Router::new()
        .route("/", get(handler::list_own).post(handler::create))
        .route("/{id}", get(handler::get_by_id))
        .route("/{id}/cancel", put(handler::cancel))
}

fn admin_routes() -> Router<ServerState> {
    Router::new()
        .route("/", get(handler::admin_list))
        .route("/{id}", get(handler::admin_get))
        .route("/{id}/status", put(handler::update_status))
}
