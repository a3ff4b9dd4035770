//! Shared types for the stall order backend
//!
//! Domain models, the order identifier codec and the unified error system.
//! Everything here is pure: no I/O, no storage.

pub mod error;
pub mod models;
pub mod order_id;
pub mod util;

// Re-exports
pub use axum::Json;
pub use http;
pub use serde::{Deserialize, Serialize};

pub use error::{ApiResponse, AppError, AppResult, ErrorCategory, ErrorCode};
pub use models::{
    CreateOrderRequest, MenuItem, MenuItemCreate, MenuItemUpdate, Order, OrderItem,
    OrderItemInput, OrderStatus, PaymentMethod, VerifyPaymentRequest,
};
