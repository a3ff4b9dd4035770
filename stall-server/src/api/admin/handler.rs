//! Admin API Handlers

use axum::{
    Json,
    body::Bytes,
    extract::{Path, Query, State},
    http::StatusCode,
};
use serde::{Deserialize, Serialize};
use shared::models::{MenuItem, MenuItemCreate, MenuItemUpdate, Order};
use shared::{AppError, AppResult};

use crate::core::ServerState;

// ========== Menu ==========

/// GET /api/v1/admin/menu
pub async fn list_menu(State(state): State<ServerState>) -> AppResult<Json<Vec<MenuItem>>> {
    let items = state.menu.list().await?;
    Ok(Json(items))
}

/// GET /api/v1/admin/menu/:id
pub async fn get_menu_item(
    State(state): State<ServerState>,
    Path(id): Path<i64>,
) -> AppResult<Json<MenuItem>> {
    let item = state.menu.get(id).await?;
    Ok(Json(item))
}

/// POST /api/v1/admin/menu
pub async fn create_menu_item(
    State(state): State<ServerState>,
    Json(payload): Json<MenuItemCreate>,
) -> AppResult<(StatusCode, Json<MenuItem>)> {
    let item = state.menu.create(payload).await?;
    tracing::info!(menu_item_id = item.id, name = %item.name, price = item.price, "Menu item created");
    Ok((StatusCode::CREATED, Json(item)))
}

/// PUT /api/v1/admin/menu/:id
pub async fn update_menu_item(
    State(state): State<ServerState>,
    Path(id): Path<i64>,
    Json(payload): Json<MenuItemUpdate>,
) -> AppResult<Json<MenuItem>> {
    let item = state.menu.update(id, payload).await?;
    tracing::info!(menu_item_id = item.id, price = item.price, available = item.available, "Menu item updated");
    Ok(Json(item))
}

/// DELETE /api/v1/admin/menu/:id
pub async fn delete_menu_item(
    State(state): State<ServerState>,
    Path(id): Path<i64>,
) -> AppResult<Json<bool>> {
    state.menu.delete(id).await?;
    tracing::info!(menu_item_id = id, "Menu item deleted");
    Ok(Json(true))
}

// ========== Orders ==========

/// GET /api/v1/admin/orders
pub async fn list_orders(State(state): State<ServerState>) -> AppResult<Json<Vec<Order>>> {
    let orders = state.orders.list_orders().await?;
    Ok(Json(orders))
}

#[derive(Debug, Default, Deserialize)]
pub struct PurgeQuery {
    #[serde(default)]
    pub all: bool,
}

#[derive(Debug, Deserialize)]
pub struct PurgeRequest {
    pub ids: Vec<String>,
}

#[derive(Debug, Serialize)]
pub struct PurgeResponse {
    pub deleted: u64,
}

/// DELETE /api/v1/admin/orders - body `{"ids": [...]}` 或 `?all=true`
pub async fn purge_orders(
    State(state): State<ServerState>,
    Query(query): Query<PurgeQuery>,
    body: Bytes,
) -> AppResult<Json<PurgeResponse>> {
    let deleted = if query.all {
        state.orders.delete_all_orders().await?
    } else {
        let request: PurgeRequest = serde_json::from_slice(&body).map_err(|e| {
            AppError::invalid_request(format!("Expected {{\"ids\": [...]}} or ?all=true: {}", e))
        })?;
        if request.ids.is_empty() {
            return Err(AppError::validation("ids must not be empty"));
        }
        state.orders.delete_orders(&request.ids).await?
    };

    Ok(Json(PurgeResponse { deleted }))
}
