//! Statistics API module

mod handler;

use axum::{Router, middleware, routing::get};

use crate::auth::require_admin;
use crate::core::ServerState;

pub fn router() -> Router<ServerState> {
    Router::new().nest(
        "/api/admin/statistics",
        Router::new()
            .route("/revenue", get(handler::revenue_stats))
            .route_layer(middleware::from_fn(require_admin)),
    )
}
