//! Product Model
//!
//! A product embeds its purchasable variants (size × color), each carrying
//! its own SKU, price and stock count. SKUs are unique across the whole
//! catalog, not just within one product.

use serde::{Deserialize, Serialize};
use surrealdb::RecordId;

use super::serde_helpers;

/// Product ID type
pub type ProductId = RecordId;

/// A purchasable configuration of a product
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Variant {
    pub size: String,
    pub color: String,
    pub sku: String,
    pub price: f64,
    pub stock: i64,
}

/// Product model
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Product {
    #[serde(default, with = "serde_helpers::option_record_id")]
    pub id: Option<ProductId>,
    pub name: String,
    pub slug: String,
    #[serde(default)]
    pub brand: String,
    /// Record link to category
    #[serde(with = "serde_helpers::record_id")]
    pub category: RecordId,
    /// Reference/display price, independent of variant prices
    pub base_price: f64,
    #[serde(default)]
    pub description: String,
    /// Uploaded image URL
    pub thumbnail: Option<String>,
    pub variants: Vec<Variant>,
    #[serde(
        default = "default_true",
        deserialize_with = "serde_helpers::bool_true"
    )]
    pub is_active: bool,
    /// Optimistic-concurrency revision, bumped on every stock write
    #[serde(default)]
    pub rev: i64,
    #[serde(default)]
    pub created_at: i64,
}

fn default_true() -> bool {
    true
}

impl Product {
    /// Find a variant by exact SKU match
    pub fn variant_by_sku(&self, sku: &str) -> Option<&Variant> {
        self.variants.iter().find(|v| v.sku == sku)
    }

    /// Mutable variant lookup by SKU
    pub fn variant_by_sku_mut(&mut self, sku: &str) -> Option<&mut Variant> {
        self.variants.iter_mut().find(|v| v.sku == sku)
    }
}

/// Variant payload for create/update (variants are replaced wholesale)
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct VariantInput {
    pub size: String,
    pub color: String,
    pub sku: String,
    pub price: f64,
    pub stock: i64,
}

/// Create product payload
#[derive(Debug, Clone, Deserialize)]
pub struct ProductCreate {
    pub name: String,
    pub slug: Option<String>,
    pub brand: Option<String>,
    pub category: String,
    pub base_price: f64,
    pub description: Option<String>,
    pub thumbnail: Option<String>,
    pub variants: Vec<VariantInput>,
    pub is_active: Option<bool>,
}

/// Update product payload
#[derive(Debug, Clone, Deserialize)]
pub struct ProductUpdate {
    pub name: Option<String>,
    pub slug: Option<String>,
    pub brand: Option<String>,
    pub category: Option<String>,
    pub base_price: Option<f64>,
    pub description: Option<String>,
    pub thumbnail: Option<String>,
    /// When present, replaces the whole variant list (no partial patch)
    pub variants: Option<Vec<VariantInput>>,
    pub is_active: Option<bool>,
}
