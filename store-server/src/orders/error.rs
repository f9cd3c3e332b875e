//! Order domain errors

use shared::error::{AppError, ErrorCode};
use thiserror::Error;

use super::status::OrderStatus;

/// Errors from order placement and reconciliation
///
/// Every variant is a local validation failure; none are retried
/// automatically except `Conflict`, which the service retries a bounded
/// number of times before surfacing it to the caller.
#[derive(Debug, Error)]
pub enum OrderError {
    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    #[error("Product not found: {0}")]
    ProductNotFound(String),

    #[error("Variant not found: {sku} (product {product})")]
    VariantNotFound { product: String, sku: String },

    #[error("Not enough stock for {sku}: requested {requested}, available {available}")]
    InsufficientStock {
        product: String,
        sku: String,
        requested: i64,
        available: i64,
    },

    #[error("Order not found: {0}")]
    OrderNotFound(String),

    #[error("Payment not found: {0}")]
    PaymentNotFound(String),

    #[error("Permission denied: {0}")]
    Forbidden(String),

    #[error("Illegal status transition: {from} -> {to}")]
    InvalidTransition { from: OrderStatus, to: OrderStatus },

    #[error("Concurrent modification: {0}")]
    Conflict(String),

    #[error("Database error: {0}")]
    Database(String),
}

impl From<surrealdb::Error> for OrderError {
    fn from(err: surrealdb::Error) -> Self {
        OrderError::Database(err.to_string())
    }
}

impl From<OrderError> for AppError {
    fn from(err: OrderError) -> Self {
        match err {
            OrderError::InvalidRequest(msg) => AppError::validation(msg),
            OrderError::ProductNotFound(id) => {
                AppError::with_message(ErrorCode::ProductNotFound, format!("Product not found: {}", id))
                    .with_detail("product", id)
            }
            OrderError::VariantNotFound { product, sku } => {
                AppError::with_message(ErrorCode::VariantNotFound, format!("Variant not found: {}", sku))
                    .with_detail("product", product)
                    .with_detail("sku", sku)
            }
            OrderError::InsufficientStock {
                product,
                sku,
                requested,
                available,
            } => AppError::with_message(
                ErrorCode::InsufficientStock,
                format!("Not enough stock for {}", sku),
            )
            .with_detail("product", product)
            .with_detail("sku", sku)
            .with_detail("requested", requested)
            .with_detail("available", available),
            OrderError::OrderNotFound(id) => {
                AppError::with_message(ErrorCode::OrderNotFound, format!("Order not found: {}", id))
            }
            OrderError::PaymentNotFound(id) => {
                AppError::with_message(ErrorCode::PaymentNotFound, format!("Payment not found: {}", id))
            }
            OrderError::Forbidden(msg) => {
                AppError::with_message(ErrorCode::NotResourceOwner, msg)
            }
            OrderError::InvalidTransition { from, to } => AppError::with_message(
                ErrorCode::InvalidStatusTransition,
                format!("Cannot move order from {} to {}", from, to),
            )
            .with_detail("from", from.as_str())
            .with_detail("to", to.as_str()),
            OrderError::Conflict(msg) => {
                AppError::with_message(ErrorCode::StockConflict, msg)
            }
            OrderError::Database(msg) => AppError::database(msg),
        }
    }
}

/// Result type for order operations
pub type OrderResult<T> = Result<T, OrderError>;
