//! 菜单（公共，只读）

use axum::{Json, Router, extract::State, routing::get};
use shared::AppResult;
use shared::models::MenuItem;

use crate::core::ServerState;

pub fn router() -> Router<ServerState> {
    Router::new().route("/api/v1/menu", get(list_available))
}

/// GET /api/v1/menu - 可售菜品
pub async fn list_available(State(state): State<ServerState>) -> AppResult<Json<Vec<MenuItem>>> {
    let items = state.menu.list_available().await?;
    Ok(Json(items))
}
