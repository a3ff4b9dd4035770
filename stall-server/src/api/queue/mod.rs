//! 叫号队列（公共）

use axum::{Json, Router, extract::State, routing::get};
use shared::AppResult;
use shared::models::Order;

use crate::core::ServerState;

pub fn router() -> Router<ServerState> {
    Router::new().route("/api/v1/queue", get(list))
}

/// GET /api/v1/queue - 已付款待出餐的订单，先付先出
pub async fn list(State(state): State<ServerState>) -> AppResult<Json<Vec<Order>>> {
    let orders = state.orders.get_queue().await?;
    Ok(Json(orders))
}
