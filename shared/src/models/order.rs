//! Order Model

use serde::{Deserialize, Serialize};
use std::fmt;

// ============================================================================
// Status
// ============================================================================

/// 订单状态
///
/// ```text
/// PENDING_PAYMENT ──verify──▶ PAID ──complete──▶ COMPLETED
///        │
///        └──cancel / expire──▶ CANCELLED
/// ```
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum OrderStatus {
    /// 等待员工确认付款（唯一初始状态）
    PendingPayment,
    /// 已付款，已分配叫号
    Paid,
    /// Present in the schema, no transition leads here
    Ready,
    /// 已出餐（终态）
    Completed,
    /// 已取消或超时作废（终态）
    Cancelled,
}

impl OrderStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            OrderStatus::PendingPayment => "PENDING_PAYMENT",
            OrderStatus::Paid => "PAID",
            OrderStatus::Ready => "READY",
            OrderStatus::Completed => "COMPLETED",
            OrderStatus::Cancelled => "CANCELLED",
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, OrderStatus::Completed | OrderStatus::Cancelled)
    }
}

impl fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// 付款方式（员工手动确认，不接支付网关）
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PaymentMethod {
    Cash,
    #[serde(rename = "PROMPTPAY")]
    PromptPay,
}

// ============================================================================
// Entities
// ============================================================================

/// Order line item
///
/// Name and price are snapshotted from the menu at creation time and stay
/// authoritative for the life of the order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrderItem {
    pub menu_item_id: i64,
    pub name: String,
    pub price: f64,
    pub quantity: i32,
}

/// Order entity
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Order {
    /// `DDMMSSSS`, see [`crate::order_id`]
    pub id: String,
    pub customer_name: String,
    pub items: Vec<OrderItem>,
    /// Server-computed sum of price × quantity
    pub total_amount: f64,
    pub status: OrderStatus,
    /// `day * 100 + month`
    pub date_key: u32,
    /// Assigned on the PAID transition, unique per date key
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub queue_number: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub payment_method: Option<PaymentMethod>,
    /// Unix millis (UTC)
    pub created_at: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub paid_at: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub completed_at: Option<i64>,
}

// ============================================================================
// Requests
// ============================================================================

/// Line item as submitted by the client
///
/// `price` is the price the client saw; it is compared against the current
/// menu price and never used to compute the total.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrderItemInput {
    pub menu_item_id: i64,
    /// Display name seen by the client (ignored, the menu name is snapshotted)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    pub price: f64,
    pub quantity: i32,
}

/// Create order request (the ID is always minted server-side)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateOrderRequest {
    pub customer_name: String,
    pub date_key: u32,
    pub items: Vec<OrderItemInput>,
}

/// Verify payment request body
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct VerifyPaymentRequest {
    #[serde(default)]
    pub payment_method: Option<PaymentMethod>,
}
