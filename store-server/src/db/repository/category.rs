//! Category Repository

use super::{BaseRepository, CountRow, RepoError, RepoResult, parse_record_id};
use crate::db::models::Category;
use crate::utils::time::now_millis;
use surrealdb::Surreal;
use surrealdb::engine::local::Db;

const CATEGORY_TABLE: &str = "category";

#[derive(Clone)]
pub struct CategoryRepository {
    base: BaseRepository,
}

impl CategoryRepository {
    pub fn new(db: Surreal<Db>) -> Self {
        Self {
            base: BaseRepository::new(db),
        }
    }

    /// All categories, sorted by name
    pub async fn find_all(&self) -> RepoResult<Vec<Category>> {
        let categories: Vec<Category> = self
            .base
            .db()
            .query("SELECT * FROM category ORDER BY name")
            .await?
            .take(0)?;
        Ok(categories)
    }

    /// Find category by id
    pub async fn find_by_id(&self, id: &str) -> RepoResult<Option<Category>> {
        let rid = parse_record_id(CATEGORY_TABLE, id)?;
        let category: Option<Category> = self.base.db().select(rid).await?;
        Ok(category)
    }

    /// True if another category already uses this name
    pub async fn name_exists(&self, name: &str, exclude_id: Option<&str>) -> RepoResult<bool> {
        self.field_exists("name", name, exclude_id).await
    }

    /// True if another category already uses this slug
    pub async fn slug_exists(&self, slug: &str, exclude_id: Option<&str>) -> RepoResult<bool> {
        self.field_exists("slug", slug, exclude_id).await
    }

    async fn field_exists(
        &self,
        field: &str,
        value: &str,
        exclude_id: Option<&str>,
    ) -> RepoResult<bool> {
        let value = value.to_string();
        let sql = format!(
            "SELECT count() AS count FROM category WHERE {field} = $value AND id != $exclude GROUP ALL"
        );
        let exclude = match exclude_id {
            Some(id) => parse_record_id(CATEGORY_TABLE, id)?,
            // A key no real record uses, so the exclusion never matches
            None => parse_record_id(CATEGORY_TABLE, "none")?,
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

    /// True if any category points at this one as parent
    pub async fn has_children(&self, id: &str) -> RepoResult<bool> {
        let rid = parse_record_id(CATEGORY_TABLE, id)?;
        let mut result = self
            .base
            .db()
            .query("SELECT count() AS count FROM category WHERE parent = $parent GROUP ALL")
            .bind(("parent", rid.to_string()))
            .await?;
        let rows: Vec<CountRow> = result.take(0)?;
        Ok(rows.first().map(|r| r.count > 0).unwrap_or(false))
    }

    /// True if any product is assigned to this category
    pub async fn has_products(&self, id: &str) -> RepoResult<bool> {
        let rid = parse_record_id(CATEGORY_TABLE, id)?;
        let mut result = self
            .base
            .db()
            .query("SELECT count() AS count FROM product WHERE category = $cat GROUP ALL")
            .bind(("cat", rid.to_string()))
            .await?;
        let rows: Vec<CountRow> = result.take(0)?;
        Ok(rows.first().map(|r| r.count > 0).unwrap_or(false))
    }

    /// Create a new category
    pub async fn create(&self, category: Category) -> RepoResult<Category> {
        let category = Category {
            created_at: now_millis(),
            ..category
        };
        let created: Option<Category> = self
            .base
            .db()
            .create(CATEGORY_TABLE)
            .content(category)
            .await?;
        created.ok_or_else(|| RepoError::Database("Failed to create category".to_string()))
    }

    /// Replace mutable fields of a category
    pub async fn update(&self, id: &str, category: &Category) -> RepoResult<Category> {
        let rid = parse_record_id(CATEGORY_TABLE, id)?;
        let mut result = self
            .base
            .db()
            .query(
                "UPDATE $id SET name = $name, slug = $slug, description = $description, \
                 parent = $parent, is_active = $is_active RETURN AFTER",
            )
            .bind(("id", rid))
            .bind(("name", category.name.clone()))
            .bind(("slug", category.slug.clone()))
            .bind(("description", category.description.clone()))
            .bind(("parent", category.parent.as_ref().map(|p| p.to_string())))
            .bind(("is_active", category.is_active))
            .await?;
        let updated: Vec<Category> = result.take(0)?;
        updated
            .into_iter()
            .next()
            .ok_or_else(|| RepoError::NotFound(format!("Category {} not found", id)))
    }

    /// Hard delete a category (guards live in the handler)
    pub async fn delete(&self, id: &str) -> RepoResult<()> {
        let rid = parse_record_id(CATEGORY_TABLE, id)?;
        let deleted: Option<Category> = self.base.db().delete(rid).await?;
        if deleted.is_none() {
            return Err(RepoError::NotFound(format!("Category {} not found", id)));
        }
        Ok(())
    }
}
