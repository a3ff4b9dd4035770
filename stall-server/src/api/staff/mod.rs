//! Staff API 模块
//!
//! | 路径 | 方法 | 说明 |
//! |------|------|------|
//! | /api/v1/staff/orders/pending | GET | 待付款订单 |
//! | /api/v1/staff/orders/completed | GET | 已完成订单 |
//! | /api/v1/staff/orders/{id}/verify | PUT | 确认付款，分配叫号 |
//! | /api/v1/staff/orders/{id}/complete | PUT | 出餐 |
//! | /api/v1/staff/orders/{id} | DELETE | 取消未付款订单 |

mod handler;

use axum::{
    Router,
    routing::{delete, get, put},
};

use crate::core::ServerState;

pub fn router() -> Router<ServerState> {
    Router::new().nest("/api/v1/staff/orders", routes())
}

fn routes() -> Router<ServerState> {
    Router::new()
        .route("/pending", get(handler::pending))
        .route("/completed", get(handler::completed))
        .route("/{id}/verify", put(handler::verify))
        .route("/{id}/complete", put(handler::complete))
        .route("/{id}", delete(handler::cancel))
}
