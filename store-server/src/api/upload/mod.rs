//! Upload API module

mod handler;

use axum::{Router, middleware, routing::post};

use crate::auth::require_admin;
use crate::core::ServerState;

pub fn router() -> Router<ServerState> {
    Router::new().nest(
        "/api/admin/uploads",
        Router::new()
            .route("/products", post(handler::upload_product_image))
            .route_layer(middleware::from_fn(require_admin)),
    )
}
