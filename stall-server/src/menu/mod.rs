//! Menu catalog
//!
//! 订单核心只需要 [`MenuCatalog::get_menu_item`]；增删改由管理端 API 通过
//! [`MenuStorage`] 直接调用。

mod storage;

pub use storage::{MAX_MENU_PRICE, MenuStorage};

use async_trait::async_trait;
use shared::models::MenuItem;

use crate::db::StorageResult;

/// Read-only menu lookup used for order validation
#[async_trait]
pub trait MenuCatalog: Send + Sync {
    /// Fails with `StorageError::MenuItemNotFound` if the item does not exist
    async fn get_menu_item(&self, id: i64) -> StorageResult<MenuItem>;
}
