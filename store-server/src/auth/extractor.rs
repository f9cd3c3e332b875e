//! Authenticated-user extractor
//!
//! [`CurrentUser`] is normally injected by the auth middleware; the
//! extractor falls back to validating the Authorization header itself so
//! handlers stay usable on routes the middleware skips.

use axum::{extract::FromRequestParts, http::request::Parts};
use shared::error::AppError;

use crate::auth::{Claims, JwtService};
use crate::core::ServerState;
use crate::db::models::UserRole;
use crate::security_log;

/// Identity attached to an authenticated request
#[derive(Debug, Clone)]
pub struct CurrentUser {
    /// "user:xxx" record id string
    pub id: String,
    pub username: String,
    pub role: UserRole,
    /// Token id, needed to revoke this session on logout
    pub jti: String,
    /// Token expiry as Unix millis
    pub exp_millis: i64,
}

impl CurrentUser {
    pub fn is_admin(&self) -> bool {
        self.role == UserRole::Admin
    }
}

impl TryFrom<Claims> for CurrentUser {
    type Error = String;

    fn try_from(claims: Claims) -> Result<Self, Self::Error> {
        let role: UserRole = claims.role.parse()?;
        Ok(Self {
            id: claims.sub,
            username: claims.username,
            role,
            exp_millis: claims.exp_millis(),
            jti: claims.jti,
        })
    }
}

impl FromRequestParts<ServerState> for CurrentUser {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &ServerState,
    ) -> Result<Self, Self::Rejection> {
        // Already extracted by the middleware
        if let Some(user) = parts.extensions.get::<CurrentUser>() {
            return Ok(user.clone());
        }

        let auth_header = parts
            .headers
            .get(http::header::AUTHORIZATION)
            .and_then(|h| h.to_str().ok());

        let token = match auth_header {
            Some(header) => JwtService::extract_from_header(header)
                .ok_or_else(|| AppError::invalid_token("Invalid authorization header"))?,
            None => {
                security_log!("WARN", "auth_missing", uri = format!("{:?}", parts.uri));
                return Err(AppError::unauthorized());
            }
        };

        match state.jwt_service.validate_token(token) {
            Ok(claims) => {
                if state.revoked_tokens.is_revoked(&claims.jti) {
                    return Err(AppError::token_revoked());
                }

                let user = CurrentUser::try_from(claims)
                    .map_err(|e| AppError::invalid_token(format!("Malformed JWT claims: {}", e)))?;

                parts.extensions.insert(user.clone());
                Ok(user)
            }
            Err(e) => {
                security_log!(
                    "WARN",
                    "auth_failed",
                    error = format!("{}", e),
                    uri = format!("{:?}", parts.uri)
                );

                match e {
                    crate::auth::JwtError::ExpiredToken => Err(AppError::token_expired()),
                    _ => Err(AppError::invalid_token("Invalid token")),
                }
            }
        }
    }
}
