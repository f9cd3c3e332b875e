//! Payment API module

mod handler;

use axum::{
    Router, middleware,
    routing::{get, put},
};

use crate::auth::require_admin;
use crate::core::ServerState;

pub fn router() -> Router<ServerState> {
    Router::new().nest(
        "/api/admin/payments",
        admin_routes().route_layer(middleware::from_fn(require_admin)),
    )
}

fn admin_routes() -> Router<ServerState> {
    Router::new()
        .route("/", get(handler::list).post(handler::create))
        .route("/report", get(handler::revenue_report))
        .route("/{id}", put(handler::update_status))
}
