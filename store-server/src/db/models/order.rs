//! Order Model
//!
//! Orders snapshot the purchased variant's identity and price at the time
//! of purchase. Catalog price changes never retroactively alter a placed
//! order's total. Orders are never physically deleted.

use serde::{Deserialize, Serialize};
use surrealdb::RecordId;

use super::serde_helpers;
use crate::orders::{OrderStatus, PaymentStatus};

/// Order ID type
pub type OrderId = RecordId;

/// Payment method chosen at checkout
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PaymentMethod {
    Cod,
    BankTransfer,
    Momo,
    Vnpay,
    Paypal,
}

impl PaymentMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            PaymentMethod::Cod => "cod",
            PaymentMethod::BankTransfer => "bank_transfer",
            PaymentMethod::Momo => "momo",
            PaymentMethod::Vnpay => "vnpay",
            PaymentMethod::Paypal => "paypal",
        }
    }
}

/// Variant identity and price captured at purchase time
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VariantSnapshot {
    pub size: String,
    pub color: String,
    pub sku: String,
    pub price: f64,
}

/// Immutable order line
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrderItem {
    /// Record link to the product (display joins only, never repriced)
    #[serde(with = "serde_helpers::record_id")]
    pub product: RecordId,
    pub variant: VariantSnapshot,
    pub quantity: i64,
    /// Unit price at the moment of placement
    pub price: f64,
}

/// Shipping address; name and phone are required at checkout
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ShippingAddress {
    pub name: String,
    pub phone: String,
    #[serde(default)]
    pub address: Option<String>,
    #[serde(default)]
    pub ward: Option<String>,
    #[serde(default)]
    pub district: Option<String>,
    #[serde(default)]
    pub province: Option<String>,
}

/// Order entity
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Order {
    #[serde(default, with = "serde_helpers::option_record_id")]
    pub id: Option<OrderId>,
    /// Human-readable order identifier, derived from the creation timestamp
    pub order_code: String,
    /// Owning account; absent for a guest checkout
    #[serde(default, with = "serde_helpers::option_record_id")]
    pub customer: Option<RecordId>,
    pub items: Vec<OrderItem>,
    /// Sum of `price * quantity` over items, computed once at creation
    pub total_amount: f64,
    pub shipping_address: ShippingAddress,
    pub payment_method: PaymentMethod,
    pub payment_status: PaymentStatus,
    pub order_status: OrderStatus,
    pub note: Option<String>,
    pub shipped_at: Option<i64>,
    pub delivered_at: Option<i64>,
    #[serde(default)]
    pub created_at: i64,
}

impl Order {
    /// True if `actor_id` (a "user:xxx" record id string) owns this order
    pub fn is_owned_by(&self, actor_id: &str) -> bool {
        self.customer
            .as_ref()
            .map(|c| c.to_string() == actor_id)
            .unwrap_or(false)
    }
}
