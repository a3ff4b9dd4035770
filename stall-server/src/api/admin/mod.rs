//! Admin API 模块
//!
//! | 路径 | 方法 | 说明 |
//! |------|------|------|
//! | /api/v1/admin/menu | GET | 全部菜品（含下架） |
//! | /api/v1/admin/menu | POST | 新建菜品 |
//! | /api/v1/admin/menu/{id} | GET / PUT / DELETE | 单个菜品 |
//! | /api/v1/admin/orders | GET | 全部订单（任意状态，最早的在前） |
//! | /api/v1/admin/orders | DELETE | 按 ID 批量删除，或 `?all=true` 清空 |

mod handler;

use axum::{
    Router,
    routing::get,
};

use crate::core::ServerState;

pub fn router() -> Router<ServerState> {
    Router::new().nest("/api/v1/admin", routes())
}

fn routes() -> Router<ServerState> {
    Router::new()
        .route("/menu", get(handler::list_menu).post(handler::create_menu_item))
        .route(
            "/menu/{id}",
            get(handler::get_menu_item)
                .put(handler::update_menu_item)
                .delete(handler::delete_menu_item),
        )
        .route(
            "/orders",
            get(handler::list_orders).delete(handler::purge_orders),
        )
}
