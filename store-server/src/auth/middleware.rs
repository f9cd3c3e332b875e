//! Authentication middleware
//!
//! Axum middleware for JWT authentication and the admin role gate.

use axum::{
    extract::{Request, State},
    middleware::Next,
    response::Response,
};
use shared::error::AppError;

use crate::auth::{CurrentUser, JwtService};
use crate::core::ServerState;
use crate::security_log;

/// Authentication middleware
///
/// Extracts and validates the JWT from `Authorization: Bearer <token>`,
/// rejects revoked sessions, and injects [`CurrentUser`] into request
/// extensions.
///
/// # Paths that skip authentication
///
/// - `OPTIONS *` (CORS preflight)
/// - anything outside `/api/` (health check, static uploads)
/// - `/api/auth/login`, `/api/auth/register`, `/api/auth/social`
/// - customer-facing catalog reads: `GET /api/products*`, `GET /api/categories*`
pub async fn require_auth(
    State(state): State<ServerState>,
    mut req: Request,
    next: Next,
) -> Result<Response, AppError> {
    let path = req.uri().path();

    // Allow CORS preflight through
    if req.method() == http::Method::OPTIONS {
        return Ok(next.run(req).await);
    }

    // Non-API routes (health, /uploads statics) need no auth
    if !path.starts_with("/api/") {
        return Ok(next.run(req).await);
    }

    if is_public_api_route(req.method(), path) {
        return Ok(next.run(req).await);
    }

    let auth_header = req
        .headers()
        .get(http::header::AUTHORIZATION)
        .and_then(|h| h.to_str().ok());

    let token = match auth_header {
        Some(header) => JwtService::extract_from_header(header)
            .ok_or_else(|| AppError::invalid_token("Invalid authorization header"))?,
        None => {
            security_log!("WARN", "auth_missing", uri = format!("{:?}", req.uri()));
            return Err(AppError::unauthorized());
        }
    };

    match state.jwt_service.validate_token(token) {
        Ok(claims) => {
            // Logged-out sessions stay dead until the token would have expired
            if state.revoked_tokens.is_revoked(&claims.jti) {
                security_log!("WARN", "auth_revoked", uri = format!("{:?}", req.uri()));
                return Err(AppError::token_revoked());
            }

            let user = CurrentUser::try_from(claims)
                .map_err(|e| AppError::invalid_token(format!("Malformed JWT claims: {}", e)))?;
            req.extensions_mut().insert(user);
            Ok(next.run(req).await)
        }
        Err(e) => {
            security_log!(
                "WARN",
                "auth_failed",
                error = format!("{}", e),
                uri = format!("{:?}", req.uri())
            );

            match e {
                crate::auth::JwtError::ExpiredToken => Err(AppError::token_expired()),
                _ => Err(AppError::invalid_token("Invalid token")),
            }
        }
    }
}

/// Admin role gate — layered onto `/api/admin/*` routers after `require_auth`
pub async fn require_admin(req: Request, next: Next) -> Result<Response, AppError> {
    let user = req
        .extensions()
        .get::<CurrentUser>()
        .ok_or_else(AppError::unauthorized)?;

    if !user.is_admin() {
        security_log!(
            "WARN",
            "admin_denied",
            user = user.username.clone(),
            uri = format!("{:?}", req.uri())
        );
        return Err(AppError::with_message(
            shared::error::ErrorCode::AdminRequired,
            "Admin role required",
        ));
    }

    Ok(next.run(req).await)
}

fn is_public_api_route(method: &http::Method, path: &str) -> bool {
    if matches!(
        path,
        "/api/auth/login" | "/api/auth/register" | "/api/auth/social"
    ) {
        return true;
    }

    // Catalog reads are public; everything mutating is not
    if *method == http::Method::GET {
        return path == "/api/products"
            || path.starts_with("/api/products/")
            || path == "/api/categories"
            || path.starts_with("/api/categories/");
    }

    false
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_public_routes() {
        let get = http::Method::GET;
        let post = http::Method::POST;

        assert!(is_public_api_route(&post, "/api/auth/login"));
        assert!(is_public_api_route(&post, "/api/auth/register"));
        assert!(is_public_api_route(&get, "/api/products"));
        assert!(is_public_api_route(&get, "/api/products/summer-shirt"));
        assert!(is_public_api_route(&get, "/api/categories"));

        assert!(!is_public_api_route(&post, "/api/orders"));
        assert!(!is_public_api_route(&get, "/api/orders"));
        assert!(!is_public_api_route(&post, "/api/admin/products"));
        assert!(!is_public_api_route(&get, "/api/admin/orders"));
        assert!(!is_public_api_route(&get, "/api/auth/me"));
    }
}
