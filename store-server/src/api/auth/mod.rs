//! Auth API module

mod handler;

pub use handler::UserResponse;

use axum::{
    Router,
    routing::{get, post},
};

use crate::core::ServerState;

pub fn router() -> Router<ServerState> {
    Router::new().nest("/api/auth", auth_routes())
}

fn auth_routes() -> Router<ServerState> {
    Router::new()
        .route("/register", post(handler::register))
        .route("/login", post(handler::login))
        .route("/social", post(handler::social_login))
        .route("/logout", post(handler::logout))
        .route("/me", get(handler::me))
}
