//! Staff API Handlers

use axum::{
    Json,
    body::Bytes,
    extract::{Path, State},
};
use shared::models::{Order, VerifyPaymentRequest};
use shared::{AppError, AppResult};

use crate::core::ServerState;

/// GET /api/v1/staff/orders/pending
pub async fn pending(State(state): State<ServerState>) -> AppResult<Json<Vec<Order>>> {
    let orders = state.orders.get_pending_payment().await?;
    Ok(Json(orders))
}

/// GET /api/v1/staff/orders/completed
pub async fn completed(State(state): State<ServerState>) -> AppResult<Json<Vec<Order>>> {
    let orders = state.orders.get_completed().await?;
    Ok(Json(orders))
}

/// PUT /api/v1/staff/orders/:id/verify - body 可省略
pub async fn verify(
    State(state): State<ServerState>,
    Path(id): Path<String>,
    body: Bytes,
) -> AppResult<Json<Order>> {
    let payload: VerifyPaymentRequest = if body.iter().all(u8::is_ascii_whitespace) {
        VerifyPaymentRequest::default()
    } else {
        serde_json::from_slice(&body)
            .map_err(|e| AppError::invalid_request(format!("Invalid verify body: {}", e)))?
    };

    let order = state
        .orders
        .verify_payment(&id, payload.payment_method)
        .await?;
    Ok(Json(order))
}

/// PUT /api/v1/staff/orders/:id/complete
pub async fn complete(
    State(state): State<ServerState>,
    Path(id): Path<String>,
) -> AppResult<Json<Order>> {
    let order = state.orders.complete_order(&id).await?;
    Ok(Json(order))
}

/// DELETE /api/v1/staff/orders/:id - 取消未付款订单
pub async fn cancel(
    State(state): State<ServerState>,
    Path(id): Path<String>,
) -> AppResult<Json<Order>> {
    let order = state.orders.cancel_order(&id).await?;
    Ok(Json(order))
}
