//! User admin API module

mod handler;

use axum::{Router, middleware, routing::get};

use crate::auth::require_admin;
use crate::core::ServerState;

pub fn router() -> Router<ServerState> {
    Router::new().nest(
        "/api/admin/users",
        Router::new()
            .route("/", get(handler::list))
            .route("/{id}", get(handler::get_by_id).put(handler::update))
            .route_layer(middleware::from_fn(require_admin)),
    )
}
