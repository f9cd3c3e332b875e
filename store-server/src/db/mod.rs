//! Database Module
//!
//! Embedded SurrealDB (RocksDB engine) plus startup schema. The database
//! lives under `WORK_DIR/data`; tests use the in-memory engine with the
//! same schema.

pub mod models;
pub mod repository;

use shared::error::AppError;
use surrealdb::Surreal;
use surrealdb::engine::local::{Db, RocksDb};

const NAMESPACE: &str = "store";
const DATABASE: &str = "store";

/// Open the embedded database and apply the schema
pub async fn init(work_dir: &str) -> Result<Surreal<Db>, AppError> {
    let data_dir = std::path::Path::new(work_dir).join("data");

    let db = Surreal::new::<RocksDb>(data_dir)
        .await
        .map_err(|e| AppError::database(format!("Failed to open database: {}", e)))?;

    db.use_ns(NAMESPACE)
        .use_db(DATABASE)
        .await
        .map_err(|e| AppError::database(format!("Failed to select namespace: {}", e)))?;

    apply_schema(&db).await?;

    tracing::info!("Database ready (SurrealDB embedded, RocksDB)");
    Ok(db)
}

/// Idempotent schema: unique indexes backing the application-level
/// uniqueness checks (slug, name, username, order code, token id).
pub async fn apply_schema(db: &Surreal<Db>) -> Result<(), AppError> {
    const SCHEMA: &str = r#"
        DEFINE TABLE IF NOT EXISTS user SCHEMALESS;
        DEFINE INDEX IF NOT EXISTS user_username ON TABLE user FIELDS username UNIQUE;

        DEFINE TABLE IF NOT EXISTS category SCHEMALESS;
        DEFINE INDEX IF NOT EXISTS category_slug ON TABLE category FIELDS slug UNIQUE;
        DEFINE INDEX IF NOT EXISTS category_name ON TABLE category FIELDS name UNIQUE;

        DEFINE TABLE IF NOT EXISTS product SCHEMALESS;
        DEFINE INDEX IF NOT EXISTS product_slug ON TABLE product FIELDS slug UNIQUE;
        DEFINE INDEX IF NOT EXISTS product_name ON TABLE product FIELDS name UNIQUE;

        DEFINE TABLE IF NOT EXISTS `order` SCHEMALESS;
        DEFINE INDEX IF NOT EXISTS order_code ON TABLE `order` FIELDS order_code UNIQUE;
        DEFINE INDEX IF NOT EXISTS order_customer ON TABLE `order` FIELDS customer;
        DEFINE INDEX IF NOT EXISTS order_created ON TABLE `order` FIELDS created_at;

        DEFINE TABLE IF NOT EXISTS payment SCHEMALESS;
        DEFINE INDEX IF NOT EXISTS payment_order ON TABLE payment FIELDS `order`;

        DEFINE TABLE IF NOT EXISTS revoked_token SCHEMALESS;
        DEFINE INDEX IF NOT EXISTS revoked_jti ON TABLE revoked_token FIELDS jti UNIQUE;
    "#;

    db.query(SCHEMA)
        .await
        .map_err(|e| AppError::database(format!("Failed to apply schema: {}", e)))?
        .check()
        .map_err(|e| AppError::database(format!("Schema statement failed: {}", e)))?;

    Ok(())
}
