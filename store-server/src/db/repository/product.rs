//! Product Repository

use super::{BaseRepository, CountRow, RepoError, RepoResult, parse_record_id};
use crate::db::models::{Product, ProductUpdate, VariantInput};
use crate::utils::time::now_millis;
use surrealdb::Surreal;
use surrealdb::engine::local::Db;

const PRODUCT_TABLE: &str = "product";

/// Filters for the product listing
#[derive(Debug, Default, Clone)]
pub struct ProductFilter {
    /// "category:xxx" record id string
    pub category: Option<String>,
    /// Case-insensitive substring match on name
    pub search: Option<String>,
    /// Customer-facing listings only see active products
    pub active_only: bool,
}

#[derive(Clone)]
pub struct ProductRepository {
    base: BaseRepository,
}

impl ProductRepository {
    pub fn new(db: Surreal<Db>) -> Self {
        Self {
            base: BaseRepository::new(db),
        }
    }

    /// Paginated product listing with filters, newest first
    pub async fn find_page(
        &self,
        filter: &ProductFilter,
        page: i64,
        limit: i64,
    ) -> RepoResult<(Vec<Product>, i64)> {
        let mut conditions: Vec<&str> = Vec::new();
        if filter.active_only {
            conditions.push("is_active = true");
        }
        if filter.category.is_some() {
            conditions.push("category = $category");
        }
        if filter.search.is_some() {
            conditions.push("string::contains(string::lowercase(name), $search)");
        }
        let where_clause = if conditions.is_empty() {
            String::new()
        } else {
            format!(" WHERE {}", conditions.join(" AND "))
        };

        let list_sql = format!(
            "SELECT * FROM product{where_clause} ORDER BY created_at DESC LIMIT $limit START $start"
        );
        let count_sql = format!("SELECT count() AS count FROM product{where_clause} GROUP ALL");

        let start = (page.max(1) - 1) * limit;
        let mut query = self
            .base
            .db()
            .query(list_sql)
            .query(count_sql)
            .bind(("limit", limit))
            .bind(("start", start));
        if let Some(cat) = &filter.category {
            let rid = parse_record_id("category", cat)?;
            query = query.bind(("category", rid.to_string()));
        }
        if let Some(search) = &filter.search {
            query = query.bind(("search", search.to_lowercase()));
        }

        let mut result = query.await?;
        let products: Vec<Product> = result.take(0)?;
        let counts: Vec<CountRow> = result.take(1)?;
        Ok((products, counts.first().map(|c| c.count).unwrap_or(0)))
    }

    /// Find product by id
    pub async fn find_by_id(&self, id: &str) -> RepoResult<Option<Product>> {
        let rid = parse_record_id(PRODUCT_TABLE, id)?;
        let product: Option<Product> = self.base.db().select(rid).await?;
        Ok(product)
    }

    /// Find an active product by slug (customer-facing detail page)
    pub async fn find_by_slug(&self, slug: &str) -> RepoResult<Option<Product>> {
        let slug = slug.to_string();
        let mut result = self
            .base
            .db()
            .query("SELECT * FROM product WHERE slug = $slug AND is_active = true LIMIT 1")
            .bind(("slug", slug))
            .await?;
        let products: Vec<Product> = result.take(0)?;
        Ok(products.into_iter().next())
    }

    /// True if another product already uses this slug
    pub async fn slug_exists(&self, slug: &str, exclude_id: Option<&str>) -> RepoResult<bool> {
        self.field_exists("slug", slug, exclude_id).await
    }

    /// True if another product already uses this name
    pub async fn name_exists(&self, name: &str, exclude_id: Option<&str>) -> RepoResult<bool> {
        self.field_exists("name", name, exclude_id).await
    }

    async fn field_exists(
        &self,
        field: &str,
        value: &str,
        exclude_id: Option<&str>,
    ) -> RepoResult<bool> {
        let value = value.to_string();
        let sql = format!(
            "SELECT count() AS count FROM product WHERE {field} = $value AND id != $exclude GROUP ALL"
        );
        let exclude = match exclude_id {
            Some(id) => parse_record_id(PRODUCT_TABLE, id)?,
            None => parse_record_id(PRODUCT_TABLE, "none")?,
        };
        let mut result = self
            .base
            .db()
            .query(sql)
            .bind(("value", value))
            .bind(("exclude", exclude))
            .await?;
        let rows: Vec<CountRow> = result.take(0)?;
        Ok(rows.first().map(|r| r.count > 0).unwrap_or(false))
    }

    /// SKUs from the given set that already live on OTHER products.
    /// SKU uniqueness spans the whole catalog, not just one product.
    pub async fn conflicting_skus(
        &self,
        skus: &[String],
        exclude_id: Option<&str>,
    ) -> RepoResult<Vec<String>> {
        let exclude = match exclude_id {
            Some(id) => parse_record_id(PRODUCT_TABLE, id)?,
            None => parse_record_id(PRODUCT_TABLE, "none")?,
        };

        #[derive(serde::Deserialize)]
        struct SkuRow {
            skus: Vec<String>,
        }

        let mut result = self
            .base
            .db()
            .query(
                "SELECT variants.sku AS skus FROM product \
                 WHERE variants.sku CONTAINSANY $skus AND id != $exclude",
            )
            .bind(("skus", skus.to_vec()))
            .bind(("exclude", exclude))
            .await?;
        let rows: Vec<SkuRow> = result.take(0)?;

        let taken: Vec<String> = rows
            .into_iter()
            .flat_map(|r| r.skus)
            .filter(|sku| skus.contains(sku))
            .collect();
        Ok(taken)
    }

    /// Create a new product
    pub async fn create(&self, product: Product) -> RepoResult<Product> {
        let product = Product {
            rev: 0,
            created_at: now_millis(),
            ..product
        };
        let created: Option<Product> = self
            .base
            .db()
            .create(PRODUCT_TABLE)
            .content(product)
            .await?;
        created.ok_or_else(|| RepoError::Database("Failed to create product".to_string()))
    }

    /// Update a product. Variants are replaced wholesale (no partial patch)
    /// and every variant write bumps `rev`, so concurrent order placements
    /// re-read before committing.
    pub async fn update(&self, id: &str, data: ProductUpdate) -> RepoResult<Product> {
        let rid = parse_record_id(PRODUCT_TABLE, id)?;

        let mut set_parts: Vec<&str> = Vec::new();
        if data.name.is_some() {
            set_parts.push("name = $name");
        }
        if data.slug.is_some() {
            set_parts.push("slug = $slug");
        }
        if data.brand.is_some() {
            set_parts.push("brand = $brand");
        }
        if data.category.is_some() {
            set_parts.push("category = $category");
        }
        if data.base_price.is_some() {
            set_parts.push("base_price = $base_price");
        }
        if data.description.is_some() {
            set_parts.push("description = $description");
        }
        if data.thumbnail.is_some() {
            set_parts.push("thumbnail = $thumbnail");
        }
        if data.variants.is_some() {
            set_parts.push("variants = $variants");
            set_parts.push("rev = rev + 1");
        }
        if data.is_active.is_some() {
            set_parts.push("is_active = $is_active");
        }

        if set_parts.is_empty() {
            return self
                .find_by_id(id)
                .await?
                .ok_or_else(|| RepoError::NotFound(format!("Product {} not found", id)));
        }

        let sql = format!("UPDATE $id SET {} RETURN AFTER", set_parts.join(", "));
        let mut query = self.base.db().query(sql).bind(("id", rid));
        if let Some(v) = data.name {
            query = query.bind(("name", v));
        }
        if let Some(v) = data.slug {
            query = query.bind(("slug", v));
        }
        if let Some(v) = data.brand {
            query = query.bind(("brand", v));
        }
        if let Some(v) = data.category {
            let cat = parse_record_id("category", &v)?;
            query = query.bind(("category", cat.to_string()));
        }
        if let Some(v) = data.base_price {
            query = query.bind(("base_price", v));
        }
        if let Some(v) = data.description {
            query = query.bind(("description", v));
        }
        if let Some(v) = data.thumbnail {
            query = query.bind(("thumbnail", v));
        }
        if let Some(v) = data.variants {
            query = query.bind(("variants", normalize_variants(v)));
        }
        if let Some(v) = data.is_active {
            query = query.bind(("is_active", v));
        }

        let mut result = query.await?;
        let products: Vec<Product> = result.take(0)?;
        products
            .into_iter()
            .next()
            .ok_or_else(|| RepoError::NotFound(format!("Product {} not found", id)))
    }

    /// Soft delete: hide from customer-facing listing and purchase
    pub async fn soft_delete(&self, id: &str) -> RepoResult<Product> {
        self.update(
            id,
            ProductUpdate {
                name: None,
                slug: None,
                brand: None,
                category: None,
                base_price: None,
                description: None,
                thumbnail: None,
                variants: None,
                is_active: Some(false),
            },
        )
        .await
    }

    /// Hard delete: irreversible removal. Returns the deleted document so
    /// the caller can clean up the image asset.
    pub async fn delete(&self, id: &str) -> RepoResult<Product> {
        let rid = parse_record_id(PRODUCT_TABLE, id)?;
        let deleted: Option<Product> = self.base.db().delete(rid).await?;
        deleted.ok_or_else(|| RepoError::NotFound(format!("Product {} not found", id)))
    }
}

/// Variants as stored: input shape, stock floored at zero
fn normalize_variants(variants: Vec<VariantInput>) -> Vec<crate::db::models::Variant> {
    variants
        .into_iter()
        .map(|v| crate::db::models::Variant {
            size: v.size,
            color: v.color,
            sku: v.sku,
            price: v.price,
            stock: v.stock.max(0),
        })
        .collect()
}
