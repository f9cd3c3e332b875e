//! Product API module

mod handler;

use axum::{
    Router, middleware,
    routing::{delete, get, put},
};

use crate::auth::require_admin;
use crate::core::ServerState;

pub fn router() -> Router<ServerState> {
    Router::new()
        .nest("/api/products", public_routes())
        .nest(
            "/api/admin/products",
            admin_routes().route_layer(middleware::from_fn(require_admin)),
        )
}

fn public_routes() -> Router<ServerState> {
    Router::new()
        .route("/", get(handler::list))
        .route("/{slug}", get(handler::get_by_slug))
}

fn admin_routes() -> Router<ServerState> {
    Router::new()
        .route("/", get(handler::admin_list).post(handler::create))
        .route(
            "/{id}",
            put(handler::update).delete(handler::soft_delete),
        )
        .route("/{id}/hard", delete(handler::hard_delete))
}
