//! Authentication Handlers
//!
//! Registration, login (local + social), logout and token introspection.

use std::time::Duration;

use axum::{Json, extract::State};
use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::auth::CurrentUser;
use crate::core::ServerState;
use crate::db::models::{AuthProvider, SocialUserCreate, User, UserCreate, UserRole};
use crate::db::repository::UserRepository;
use crate::utils::validation::validate_payload;
use crate::utils::{AppError, AppResult, ErrorCode};
use shared::error::ApiResponse;

/// Fixed delay for authentication to prevent timing attacks
const AUTH_FIXED_DELAY_MS: u64 = 500;

// =============================================================================
// DTOs
// =============================================================================

#[derive(Debug, Deserialize, Validate)]
#[serde(deny_unknown_fields)]
pub struct RegisterRequest {
    #[validate(length(min = 1, max = 200, message = "name is required"))]
    pub name: String,
    #[validate(length(min = 3, max = 100, message = "username must be 3-100 chars"))]
    pub username: String,
    #[validate(email(message = "invalid email"), length(max = 254))]
    pub email: String,
    #[validate(length(min = 8, max = 20, message = "invalid phone number"))]
    pub phone: String,
    #[validate(length(min = 8, max = 128, message = "password must be at least 8 chars"))]
    pub password: String,
}

#[derive(Debug, Deserialize, Validate)]
#[serde(deny_unknown_fields)]
pub struct LoginRequest {
    /// Username, email or phone
    #[validate(length(min = 1, message = "identifier is required"))]
    pub identifier: String,
    #[validate(length(min = 1, message = "password is required"))]
    pub password: String,
}

#[derive(Debug, Deserialize, Validate)]
#[serde(deny_unknown_fields)]
pub struct SocialLoginRequest {
    pub provider: AuthProvider,
    /// Subject id as reported by the provider. Verification of the
    /// provider token itself is stubbed out.
    #[validate(length(min = 1, max = 100, message = "provider_id is required"))]
    pub provider_id: String,
    #[validate(length(min = 1, max = 200, message = "name is required"))]
    pub name: String,
    #[validate(email(message = "invalid email"))]
    pub email: Option<String>,
}

/// Public view of an account
#[derive(Debug, Serialize)]
pub struct UserResponse {
    pub id: String,
    pub name: String,
    pub username: String,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub role: UserRole,
    pub provider: AuthProvider,
    pub is_active: bool,
    pub created_at: i64,
}

impl From<User> for UserResponse {
    fn from(user: User) -> Self {
        Self {
            id: user.id.map(|id| id.to_string()).unwrap_or_default(),
            name: user.name,
            username: user.username,
            email: user.email,
            phone: user.phone,
            role: user.role,
            provider: user.provider,
            is_active: user.is_active,
            created_at: user.created_at,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct LoginResponse {
    pub token: String,
    pub user: UserResponse,
}

// =============================================================================
// Handlers
// =============================================================================

/// POST /api/auth/register - create a local account
pub async fn register(
    State(state): State<ServerState>,
    Json(req): Json<RegisterRequest>,
) -> AppResult<Json<LoginResponse>> {
    validate_payload(&req)?;

    let repo = UserRepository::new(state.db.clone());

    if repo.find_by_username(&req.username).await?.is_some() {
        return Err(AppError::new(ErrorCode::UsernameExists));
    }
    if repo.email_exists(&req.email).await? {
        return Err(AppError::new(ErrorCode::EmailExists));
    }
    if repo.phone_exists(&req.phone).await? {
        return Err(AppError::new(ErrorCode::PhoneExists));
    }

    let user = repo
        .create(UserCreate {
            name: req.name,
            username: req.username,
            email: Some(req.email),
            phone: Some(req.phone),
            password: req.password,
            role: Some(UserRole::Customer),
        })
        .await?;

    let token = issue_token(&state, &user)?;
    tracing::info!(username = %user.username, "user registered");

    Ok(Json(LoginResponse {
        token,
        user: user.into(),
    }))
}

/// POST /api/auth/login - authenticate with username/email/phone + password
pub async fn login(
    State(state): State<ServerState>,
    Json(req): Json<LoginRequest>,
) -> AppResult<Json<LoginResponse>> {
    validate_payload(&req)?;

    let repo = UserRepository::new(state.db.clone());
    let user = repo.find_by_identifier(&req.identifier).await?;

    // Fixed delay to prevent timing attacks (before checking result)
    tokio::time::sleep(Duration::from_millis(AUTH_FIXED_DELAY_MS)).await;

    // Unified error for unknown account / wrong password / social-only
    // account, to prevent username enumeration
    let user = match user {
        Some(u) => {
            if !u.is_active {
                return Err(AppError::with_message(
                    ErrorCode::AccountDisabled,
                    "Account has been disabled",
                ));
            }

            let password_valid = u
                .verify_password(&req.password)
                .map_err(|e| AppError::internal(format!("Password verification failed: {}", e)))?;

            if !password_valid {
                tracing::warn!(identifier = %req.identifier, "login failed - invalid credentials");
                return Err(AppError::invalid_credentials());
            }

            u
        }
        None => {
            tracing::warn!(identifier = %req.identifier, "login failed - user not found");
            return Err(AppError::invalid_credentials());
        }
    };

    let token = issue_token(&state, &user)?;
    tracing::info!(username = %user.username, role = %user.role.as_str(), "user logged in");

    Ok(Json(LoginResponse {
        token,
        user: user.into(),
    }))
}

/// POST /api/auth/social - OAuth-style login, upserts the account
pub async fn social_login(
    State(state): State<ServerState>,
    Json(req): Json<SocialLoginRequest>,
) -> AppResult<Json<LoginResponse>> {
    validate_payload(&req)?;

    if req.provider == AuthProvider::Local {
        return Err(AppError::validation("provider must be google or facebook"));
    }

    let repo = UserRepository::new(state.db.clone());
    let user = repo
        .upsert_social(SocialUserCreate {
            name: req.name,
            provider: req.provider,
            provider_id: req.provider_id,
            email: req.email,
        })
        .await?;

    if !user.is_active {
        return Err(AppError::with_message(
            ErrorCode::AccountDisabled,
            "Account has been disabled",
        ));
    }

    let token = issue_token(&state, &user)?;
    tracing::info!(username = %user.username, "social login");

    Ok(Json(LoginResponse {
        token,
        user: user.into(),
    }))
}

/// POST /api/auth/logout - revoke the current session
pub async fn logout(
    State(state): State<ServerState>,
    user: CurrentUser,
) -> AppResult<Json<ApiResponse<()>>> {
    state.revoked_tokens.revoke(&user.jti, user.exp_millis).await?;
    tracing::info!(username = %user.username, "user logged out");
    Ok(Json(ApiResponse::ok()))
}

/// GET /api/auth/me - current account info
pub async fn me(
    State(state): State<ServerState>,
    user: CurrentUser,
) -> AppResult<Json<UserResponse>> {
    let repo = UserRepository::new(state.db.clone());
    let fresh = repo
        .find_by_id(&user.id)
        .await?
        .ok_or_else(|| AppError::new(ErrorCode::UserNotFound))?;
    Ok(Json(fresh.into()))
}

// =============================================================================
// Helpers
// =============================================================================

fn issue_token(state: &ServerState, user: &User) -> AppResult<String> {
    let user_id = user.id.as_ref().map(|t| t.to_string()).unwrap_or_default();
    state
        .jwt_service
        .generate_token(&user_id, &user.username, user.role.as_str())
        .map_err(|e| AppError::internal(format!("Failed to generate token: {}", e)))
}
