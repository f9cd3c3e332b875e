//! Product API Handlers
//!
//! Public catalog reads plus the admin back-office CRUD. Variants are
//! replaced wholesale on update; SKU uniqueness is enforced across the
//! whole catalog.

use axum::{
    Json,
    extract::{Path, Query, State},
};
use serde::Deserialize;
use std::collections::HashSet;

use crate::core::ServerState;
use crate::db::models::{Product, ProductCreate, ProductUpdate, Variant, VariantInput};
use crate::db::repository::product::ProductFilter;
use crate::db::repository::{CategoryRepository, ProductRepository};
use crate::orders::money::MAX_PRICE;
use crate::utils::slug::slugify;
use crate::utils::validation::{MAX_NAME_LEN, MAX_NOTE_LEN, MAX_SHORT_TEXT_LEN, validate_required_text};
use crate::utils::{AppError, AppResult, ErrorCode, Page, Pagination};

/// Query params for product listings
#[derive(Debug, Deserialize)]
pub struct ListQuery {
    #[serde(default = "default_page")]
    pub page: i64,
    #[serde(default = "default_limit")]
    pub limit: i64,
    pub category: Option<String>,
    pub search: Option<String>,
}

fn default_page() -> i64 {
    1
}

fn default_limit() -> i64 {
    10
}

fn clamp_paging(query: &ListQuery) -> (i64, i64) {
    (query.page.max(1), query.limit.clamp(1, 100))
}

// =============================================================================
// Public handlers
// =============================================================================

/// GET /api/products - customer-facing listing (active products only)
pub async fn list(
    State(state): State<ServerState>,
    Query(query): Query<ListQuery>,
) -> AppResult<Json<Page<Product>>> {
    let (page, limit) = clamp_paging(&query);
    let repo = ProductRepository::new(state.db.clone());
    let filter = ProductFilter {
        category: query.category,
        search: query.search,
        active_only: true,
    };
    let (items, total) = repo.find_page(&filter, page, limit).await?;
    Ok(Json(Page {
        items,
        pagination: Pagination::new(page, limit, total),
    }))
}

/// GET /api/products/{slug} - product detail by slug
pub async fn get_by_slug(
    State(state): State<ServerState>,
    Path(slug): Path<String>,
) -> AppResult<Json<Product>> {
    let repo = ProductRepository::new(state.db.clone());
    let product = repo
        .find_by_slug(&slug)
        .await?
        .ok_or_else(|| AppError::new(ErrorCode::ProductNotFound))?;
    Ok(Json(product))
}

// =============================================================================
// Admin handlers
// =============================================================================

/// GET /api/admin/products - back-office listing (includes inactive)
pub async fn admin_list(
    State(state): State<ServerState>,
    Query(query): Query<ListQuery>,
) -> AppResult<Json<Page<Product>>> {
    let (page, limit) = clamp_paging(&query);
    let repo = ProductRepository::new(state.db.clone());
    let filter = ProductFilter {
        category: query.category,
        search: query.search,
        active_only: false,
    };
    let (items, total) = repo.find_page(&filter, page, limit).await?;
    Ok(Json(Page {
        items,
        pagination: Pagination::new(page, limit, total),
    }))
}

/// POST /api/admin/products - create product
pub async fn create(
    State(state): State<ServerState>,
    Json(payload): Json<ProductCreate>,
) -> AppResult<Json<Product>> {
    validate_required_text(&payload.name, "name", MAX_NAME_LEN)?;
    if let Some(desc) = &payload.description {
        if desc.len() > MAX_NOTE_LEN {
            return Err(AppError::validation("description too long"));
        }
    }
    if !payload.base_price.is_finite() || payload.base_price < 0.0 {
        return Err(AppError::validation("base_price must be a non-negative number"));
    }
    validate_variants(&payload.variants)?;

    let product_repo = ProductRepository::new(state.db.clone());
    let category_repo = CategoryRepository::new(state.db.clone());

    let category = category_repo
        .find_by_id(&payload.category)
        .await?
        .ok_or_else(|| AppError::new(ErrorCode::CategoryNotFound))?;

    let slug = payload
        .slug
        .filter(|s| !s.trim().is_empty())
        .unwrap_or_else(|| slugify(&payload.name));
    if slug.is_empty() {
        return Err(AppError::validation("slug could not be derived from name"));
    }

    if product_repo.name_exists(&payload.name, None).await? {
        return Err(AppError::new(ErrorCode::ProductNameExists));
    }
    if product_repo.slug_exists(&slug, None).await? {
        return Err(AppError::new(ErrorCode::SlugExists));
    }

    let skus: Vec<String> = payload.variants.iter().map(|v| v.sku.clone()).collect();
    let taken = product_repo.conflicting_skus(&skus, None).await?;
    if !taken.is_empty() {
        return Err(AppError::new(ErrorCode::SkuExists).with_detail("skus", taken));
    }

    let product = product_repo
        .create(Product {
            id: None,
            name: payload.name,
            slug,
            brand: payload.brand.unwrap_or_default(),
            category: category.id.ok_or_else(|| AppError::internal("Category has no id"))?,
            base_price: payload.base_price,
            description: payload.description.unwrap_or_default(),
            thumbnail: payload.thumbnail,
            variants: payload
                .variants
                .into_iter()
                .map(|v| Variant {
                    size: v.size,
                    color: v.color,
                    sku: v.sku,
                    price: v.price,
                    stock: v.stock.max(0),
                })
                .collect(),
            is_active: payload.is_active.unwrap_or(true),
            rev: 0,
            created_at: 0,
        })
        .await?;

    tracing::info!(product = %product.slug, "product created");
    Ok(Json(product))
}

/// PUT /api/admin/products/{id} - update product
pub async fn update(
    State(state): State<ServerState>,
    Path(id): Path<String>,
    Json(mut payload): Json<ProductUpdate>,
) -> AppResult<Json<Product>> {
    let product_repo = ProductRepository::new(state.db.clone());
    let existing = product_repo
        .find_by_id(&id)
        .await?
        .ok_or_else(|| AppError::new(ErrorCode::ProductNotFound))?;

    if let Some(name) = &payload.name {
        validate_required_text(name, "name", MAX_NAME_LEN)?;
        if *name != existing.name && product_repo.name_exists(name, Some(&id)).await? {
            return Err(AppError::new(ErrorCode::ProductNameExists));
        }
        // Renaming without an explicit slug derives a fresh one
        if payload.slug.is_none() && *name != existing.name {
            payload.slug = Some(slugify(name));
        }
    }

    if let Some(slug) = &payload.slug {
        validate_required_text(slug, "slug", MAX_NAME_LEN)?;
        if *slug != existing.slug && product_repo.slug_exists(slug, Some(&id)).await? {
            return Err(AppError::new(ErrorCode::SlugExists));
        }
    }

    if let Some(base_price) = payload.base_price {
        if !base_price.is_finite() || base_price < 0.0 {
            return Err(AppError::validation("base_price must be a non-negative number"));
        }
    }

    if let Some(category_id) = &payload.category {
        let category_repo = CategoryRepository::new(state.db.clone());
        if category_repo.find_by_id(category_id).await?.is_none() {
            return Err(AppError::new(ErrorCode::CategoryNotFound));
        }
    }

    if let Some(variants) = &payload.variants {
        validate_variants(variants)?;
        let skus: Vec<String> = variants.iter().map(|v| v.sku.clone()).collect();
        let taken = product_repo.conflicting_skus(&skus, Some(&id)).await?;
        if !taken.is_empty() {
            return Err(AppError::new(ErrorCode::SkuExists).with_detail("skus", taken));
        }
    }

    let product = product_repo.update(&id, payload).await?;
    tracing::info!(product = %product.slug, "product updated");
    Ok(Json(product))
}

/// DELETE /api/admin/products/{id} - soft delete (hide from storefront)
pub async fn soft_delete(
    State(state): State<ServerState>,
    Path(id): Path<String>,
) -> AppResult<Json<Product>> {
    let repo = ProductRepository::new(state.db.clone());
    let product = repo.soft_delete(&id).await?;
    tracing::info!(product = %product.slug, "product hidden");
    Ok(Json(product))
}

/// DELETE /api/admin/products/{id}/hard - irreversible removal
///
/// Also deletes the uploaded thumbnail from disk.
pub async fn hard_delete(
    State(state): State<ServerState>,
    Path(id): Path<String>,
) -> AppResult<Json<shared::error::ApiResponse<()>>> {
    let repo = ProductRepository::new(state.db.clone());
    let product = repo.delete(&id).await?;

    if let Some(thumbnail) = &product.thumbnail {
        if let Some(filename) = std::path::Path::new(thumbnail).file_name() {
            let path = state.config.uploads_dir().join("products").join(filename);
            if let Err(e) = std::fs::remove_file(&path) {
                tracing::warn!(path = %path.display(), error = %e, "could not remove thumbnail");
            }
        }
    }

    tracing::info!(product = %product.slug, "product permanently deleted");
    Ok(Json(shared::error::ApiResponse::ok()))
}

// =============================================================================
// Helpers
// =============================================================================

fn validate_variants(variants: &[VariantInput]) -> AppResult<()> {
    if variants.is_empty() {
        return Err(AppError::validation("product must have at least one variant"));
    }

    let mut seen = HashSet::new();
    for v in variants {
        validate_required_text(&v.sku, "sku", MAX_SHORT_TEXT_LEN)?;
        validate_required_text(&v.size, "size", MAX_SHORT_TEXT_LEN)?;
        validate_required_text(&v.color, "color", MAX_SHORT_TEXT_LEN)?;
        if !v.price.is_finite() || v.price < 0.0 || v.price > MAX_PRICE {
            return Err(AppError::validation(format!("invalid price for {}", v.sku)));
        }
        if v.stock < 0 {
            return Err(AppError::validation(format!("invalid stock for {}", v.sku)));
        }
        if !seen.insert(v.sku.clone()) {
            return Err(AppError::new(ErrorCode::SkuExists).with_detail("skus", vec![v.sku.clone()]));
        }
    }
    Ok(())
}
