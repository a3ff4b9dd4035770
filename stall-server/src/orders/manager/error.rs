use super::super::cache::CacheError;
use crate::db::StorageError;
use shared::models::OrderStatus;
use shared::{AppError, ErrorCode};
use std::time::Duration;
use thiserror::Error;

/// Lifecycle engine errors
#[derive(Debug, Error)]
pub enum OrderError {
    #[error("Validation failed: {0}")]
    Validation(String),

    #[error("Order must contain at least one item")]
    Empty,

    #[error("Price mismatch for menu item {menu_item_id}: menu price {expected}, submitted {submitted}")]
    PriceMismatch {
        menu_item_id: i64,
        expected: f64,
        submitted: f64,
    },

    #[error("Menu item {0} is not available")]
    ItemUnavailable(i64),

    #[error("Order not found: {0}")]
    NotFound(String),

    #[error("Order {order_id} is {actual}, expected {expected}")]
    InvalidStatus {
        order_id: String,
        expected: OrderStatus,
        actual: OrderStatus,
    },

    /// 存储层拒绝了重复的订单号
    #[error("Duplicate order ID: {0}")]
    DuplicateId(String),

    #[error("No order sequence left for date {0}")]
    SequenceExhausted(u32),

    #[error("{operation} timed out after {}ms", .timeout.as_millis())]
    Timeout {
        operation: &'static str,
        timeout: Duration,
    },

    #[error("Storage error: {0}")]
    Store(#[from] StorageError),

    #[error("Cache error: {0}")]
    Cache(#[from] CacheError),
}

impl OrderError {
    /// Caller may simply try again
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            OrderError::DuplicateId(_)
                | OrderError::Timeout { .. }
                | OrderError::Store(StorageError::DuplicateOrderId(_))
        )
    }
}

impl From<OrderError> for AppError {
    fn from(err: OrderError) -> Self {
        match err {
            OrderError::Validation(msg) => AppError::validation(msg),
            OrderError::Empty => AppError::new(ErrorCode::OrderEmpty),
            OrderError::PriceMismatch {
                menu_item_id,
                expected,
                submitted,
            } => AppError::with_message(
                ErrorCode::PriceMismatch,
                format!(
                    "Price of menu item {} changed: now {}, submitted {}",
                    menu_item_id, expected, submitted
                ),
            )
            .with_detail("menu_item_id", menu_item_id)
            .with_detail("expected", expected)
            .with_detail("submitted", submitted),
            OrderError::ItemUnavailable(id) => AppError::with_message(
                ErrorCode::MenuItemUnavailable,
                format!("Menu item {} is not available", id),
            )
            .with_detail("menu_item_id", id),
            OrderError::NotFound(id) => AppError::with_message(
                ErrorCode::OrderNotFound,
                format!("Order {} not found", id),
            )
            .with_detail("order_id", id),
            OrderError::InvalidStatus {
                order_id,
                expected,
                actual,
            } => AppError::with_message(
                ErrorCode::OrderInvalidStatus,
                format!("Order {} is {}, expected {}", order_id, actual, expected),
            )
            .with_detail("order_id", order_id)
            .with_detail("expected", expected.as_str())
            .with_detail("actual", actual.as_str()),
            OrderError::DuplicateId(id) => AppError::new(ErrorCode::OrderDuplicateId)
                .with_detail("order_id", id),
            OrderError::SequenceExhausted(date_key)
            | OrderError::Store(StorageError::SequenceExhausted(date_key)) => AppError::new(
                ErrorCode::OrderSequenceExhausted,
            )
            .with_detail("date_key", date_key),
            OrderError::Timeout { operation, timeout } => AppError::timeout(operation)
                .with_detail("timeout_ms", timeout.as_millis() as u64),
            OrderError::Store(e @ StorageError::DuplicateOrderId(_)) => {
                AppError::with_message(ErrorCode::OrderDuplicateId, e.to_string())
            }
            OrderError::Store(e) => {
                tracing::error!(error = %e, "Order storage error");
                AppError::database(e.to_string())
            }
            OrderError::Cache(e) => AppError::with_message(ErrorCode::CacheError, e.to_string()),
        }
    }
}

pub type OrderResult<T> = Result<T, OrderError>;
