//! User Admin Handlers

use axum::{
    Json,
    extract::{Path, Query, State},
};
use serde::Deserialize;

use crate::api::auth::UserResponse;
use crate::core::ServerState;
use crate::db::models::UserUpdate;
use crate::db::repository::UserRepository;
use crate::utils::validation::{MAX_NAME_LEN, validate_required_text};
use crate::utils::{AppError, AppResult, ErrorCode, Page, Pagination};

#[derive(Debug, Deserialize)]
pub struct ListQuery {
    #[serde(default = "default_page")]
    pub page: i64,
    #[serde(default = "default_limit")]
    pub limit: i64,
}

fn default_page() -> i64 {
    1
}

fn default_limit() -> i64 {
    20
}

/// GET /api/admin/users - account listing
pub async fn list(
    State(state): State<ServerState>,
    Query(query): Query<ListQuery>,
) -> AppResult<Json<Page<UserResponse>>> {
    let (page, limit) = (query.page.max(1), query.limit.clamp(1, 100));
    let repo = UserRepository::new(state.db.clone());
    let (users, total) = repo.find_page(page, limit).await?;
    Ok(Json(Page {
        items: users.into_iter().map(UserResponse::from).collect(),
        pagination: Pagination::new(page, limit, total),
    }))
}

/// GET /api/admin/users/{id}
pub async fn get_by_id(
    State(state): State<ServerState>,
    Path(id): Path<String>,
) -> AppResult<Json<UserResponse>> {
    let repo = UserRepository::new(state.db.clone());
    let user = repo
        .find_by_id(&id)
        .await?
        .ok_or_else(|| AppError::new(ErrorCode::UserNotFound))?;
    Ok(Json(user.into()))
}

/// PUT /api/admin/users/{id} - change name, role or active flag
pub async fn update(
    State(state): State<ServerState>,
    Path(id): Path<String>,
    Json(payload): Json<UserUpdate>,
) -> AppResult<Json<UserResponse>> {
    if let Some(name) = &payload.name {
        validate_required_text(name, "name", MAX_NAME_LEN)?;
    }

    let repo = UserRepository::new(state.db.clone());
    if repo.find_by_id(&id).await?.is_none() {
        return Err(AppError::new(ErrorCode::UserNotFound));
    }

    let user = repo.update(&id, payload).await?;
    Ok(Json(user.into()))
}
