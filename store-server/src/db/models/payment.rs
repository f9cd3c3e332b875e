//! Payment Model
//!
//! One payment references exactly one order. Reconciliation between the
//! payment ledger and the order ledger is application-enforced (see
//! `orders::OrderService::apply_payment_status`). Payments are never deleted.

use serde::{Deserialize, Serialize};
use surrealdb::RecordId;

use super::PaymentMethod;
use super::serde_helpers;

/// Payment ID type
pub type PaymentId = RecordId;

/// Direction of the money flow
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PaymentType {
    Income,
    Refund,
}

/// Lifecycle of a payment record
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PaymentRecordStatus {
    Pending,
    Completed,
    Failed,
    Refunded,
    PartialRefunded,
}

/// Payment entity
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Payment {
    #[serde(default, with = "serde_helpers::option_record_id")]
    pub id: Option<PaymentId>,
    /// Record link to the order
    #[serde(with = "serde_helpers::record_id")]
    pub order: RecordId,
    pub amount: f64,
    pub method: PaymentMethod,
    #[serde(rename = "type")]
    pub payment_type: PaymentType,
    pub status: PaymentRecordStatus,
    pub transaction_id: Option<String>,
    pub paid_at: Option<i64>,
    pub refunded_at: Option<i64>,
    pub note: Option<String>,
    /// Admin who entered the payment manually, if any
    #[serde(default, with = "serde_helpers::option_record_id")]
    pub created_by: Option<RecordId>,
    #[serde(default)]
    pub created_at: i64,
}

/// Create payment payload
#[derive(Debug, Clone, Deserialize)]
pub struct PaymentCreate {
    pub order_id: String,
    /// Defaults to the order total when omitted
    pub amount: Option<f64>,
    pub method: PaymentMethod,
    #[serde(default, rename = "type")]
    pub payment_type: Option<PaymentType>,
    pub note: Option<String>,
}

/// Status update payload (admin action or inbound gateway notification)
#[derive(Debug, Clone, Deserialize)]
pub struct PaymentStatusUpdate {
    pub status: PaymentRecordStatus,
    pub transaction_id: Option<String>,
    pub note: Option<String>,
}
