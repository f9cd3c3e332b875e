//! Category API Handlers

use axum::{
    Json,
    extract::{Path, State},
};
use serde::Serialize;

use crate::core::ServerState;
use crate::db::models::{Category, CategoryCreate, CategoryUpdate};
use crate::db::repository::CategoryRepository;
use crate::utils::slug::slugify;
use crate::utils::validation::{MAX_NAME_LEN, MAX_NOTE_LEN, validate_required_text};
use crate::utils::{AppError, AppResult, ErrorCode};

/// GET /api/categories - all categories, sorted by name
pub async fn list(State(state): State<ServerState>) -> AppResult<Json<CategoryList>> {
    let repo = CategoryRepository::new(state.db.clone());
    let categories = repo.find_all().await?;
    Ok(Json(CategoryList { categories }))
}

#[derive(Debug, Serialize)]
pub struct CategoryList {
    pub categories: Vec<Category>,
}

/// GET /api/categories/{id} - single category
pub async fn get_by_id(
    State(state): State<ServerState>,
    Path(id): Path<String>,
) -> AppResult<Json<Category>> {
    let repo = CategoryRepository::new(state.db.clone());
    let category = repo
        .find_by_id(&id)
        .await?
        .ok_or_else(|| AppError::new(ErrorCode::CategoryNotFound))?;
    Ok(Json(category))
}

/// POST /api/admin/categories - create category
pub async fn create(
    State(state): State<ServerState>,
    Json(payload): Json<CategoryCreate>,
) -> AppResult<Json<Category>> {
    validate_required_text(&payload.name, "name", MAX_NAME_LEN)?;
    if let Some(desc) = &payload.description {
        if desc.len() > MAX_NOTE_LEN {
            return Err(AppError::validation("description too long"));
        }
    }

    let repo = CategoryRepository::new(state.db.clone());

    let slug = payload
        .slug
        .filter(|s| !s.trim().is_empty())
        .unwrap_or_else(|| slugify(&payload.name));
    if slug.is_empty() {
        return Err(AppError::validation("slug could not be derived from name"));
    }

    if repo.name_exists(&payload.name, None).await? {
        return Err(AppError::new(ErrorCode::CategoryNameExists));
    }
    if repo.slug_exists(&slug, None).await? {
        return Err(AppError::new(ErrorCode::CategorySlugExists));
    }

    let parent = match &payload.parent {
        Some(parent_id) => {
            let parent = repo
                .find_by_id(parent_id)
                .await?
                .ok_or_else(|| AppError::new(ErrorCode::CategoryNotFound))?;
            parent.id
        }
        None => None,
    };

    let category = repo
        .create(Category {
            id: None,
            name: payload.name,
            slug,
            description: payload.description.unwrap_or_default(),
            parent,
            is_active: payload.is_active.unwrap_or(true),
            created_at: 0,
        })
        .await?;

    Ok(Json(category))
}

/// PUT /api/admin/categories/{id} - update category
pub async fn update(
    State(state): State<ServerState>,
    Path(id): Path<String>,
    Json(payload): Json<CategoryUpdate>,
) -> AppResult<Json<Category>> {
    let repo = CategoryRepository::new(state.db.clone());
    let mut category = repo
        .find_by_id(&id)
        .await?
        .ok_or_else(|| AppError::new(ErrorCode::CategoryNotFound))?;

    if let Some(name) = payload.name {
        validate_required_text(&name, "name", MAX_NAME_LEN)?;
        if name != category.name && repo.name_exists(&name, Some(&id)).await? {
            return Err(AppError::new(ErrorCode::CategoryNameExists));
        }
        category.name = name;
    }

    if let Some(slug) = payload.slug {
        validate_required_text(&slug, "slug", MAX_NAME_LEN)?;
        if slug != category.slug && repo.slug_exists(&slug, Some(&id)).await? {
            return Err(AppError::new(ErrorCode::CategorySlugExists));
        }
        category.slug = slug;
    }

    if let Some(description) = payload.description {
        if description.len() > MAX_NOTE_LEN {
            return Err(AppError::validation("description too long"));
        }
        category.description = description;
    }

    if let Some(parent) = payload.parent {
        category.parent = match parent {
            Some(parent_id) => {
                if parent_id == category.id.as_ref().map(|i| i.to_string()).unwrap_or_default() {
                    return Err(AppError::validation("category cannot be its own parent"));
                }
                let parent = repo
                    .find_by_id(&parent_id)
                    .await?
                    .ok_or_else(|| AppError::new(ErrorCode::CategoryNotFound))?;
                parent.id
            }
            None => None,
        };
    }

    if let Some(is_active) = payload.is_active {
        category.is_active = is_active;
    }

    let updated = repo.update(&id, &category).await?;
    Ok(Json(updated))
}

/// DELETE /api/admin/categories/{id} - delete category
///
/// Refused while children or products still reference it.
pub async fn delete(
    State(state): State<ServerState>,
    Path(id): Path<String>,
) -> AppResult<Json<shared::error::ApiResponse<()>>> {
    let repo = CategoryRepository::new(state.db.clone());

    if repo.find_by_id(&id).await?.is_none() {
        return Err(AppError::new(ErrorCode::CategoryNotFound));
    }
    if repo.has_children(&id).await? {
        return Err(AppError::new(ErrorCode::CategoryHasChildren));
    }
    if repo.has_products(&id).await? {
        return Err(AppError::new(ErrorCode::CategoryHasProducts));
    }

    repo.delete(&id).await?;
    Ok(Json(shared::error::ApiResponse::ok()))
}
