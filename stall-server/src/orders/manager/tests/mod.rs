use super::*;
use crate::db::{DbService, StorageResult};
use crate::menu::MenuStorage;
use crate::orders::storage::OrderStorage;
use async_trait::async_trait;
use shared::models::{MenuItemCreate, OrderItemInput};
use std::sync::atomic::{AtomicBool, Ordering};


struct TestEnv {
    manager: OrdersManager,
    storage: Arc<OrderStorage>,
    menu: Arc<MenuStorage>,
}

/// Menu: 1 = Pad Thai 40, 2 = Som Tam 35.5, 3 = Mango Sticky Rice 60 (unavailable)
async fn seed_menu(db: DbService) -> MenuStorage {
    let menu = MenuStorage::new(db);
    for (name, price, available) in [
        ("Pad Thai", 40.0, true),
        ("Som Tam", 35.5, true),
        ("Mango Sticky Rice", 60.0, false),
    ] {
        menu.create(MenuItemCreate {
            name: name.to_string(),
            price,
            category: None,
            image_url: None,
            available: Some(available),
        })
        .await
        .unwrap();
    }
    menu
}

async fn create_test_env() -> TestEnv {
    let db = DbService::open_in_memory().unwrap();
    let storage = Arc::new(OrderStorage::new(db.clone()));
    let menu = Arc::new(seed_menu(db).await);
    let manager = OrdersManager::without_cache(storage.clone(), menu.clone());
    TestEnv {
        manager,
        storage,
        menu,
    }
}

fn item(menu_item_id: i64, price: f64, quantity: i32) -> OrderItemInput {
    OrderItemInput {
        menu_item_id,
        name: None,
        price,
        quantity,
    }
}

fn order_request(customer: &str, date_key: u32, items: Vec<OrderItemInput>) -> CreateOrderRequest {
    CreateOrderRequest {
        customer_name: customer.to_string(),
        date_key,
        items,
    }
}

/// One Pad Thai for John Doe on 14 January
fn simple_request() -> CreateOrderRequest {
    order_request("John Doe", 1401, vec![item(1, 40.0, 1)])
}

/// Store wrapper used to inject slowness and uniqueness conflicts
struct FaultyStore {
    inner: OrderStorage,
    get_delay: Option<Duration>,
    /// Next `insert_with_next_sequence` reports a taken ID
    conflict_once: AtomicBool,
}

impl FaultyStore {
    fn new(inner: OrderStorage) -> Self {
        Self {
            inner,
            get_delay: None,
            conflict_once: AtomicBool::new(false),
        }
    }
}

#[async_trait]
impl OrderStore for FaultyStore {
    async fn insert_order(&self, order: &Order) -> StorageResult<()> {
        self.inner.insert_order(order).await
    }

    async fn insert_with_next_sequence(&self, draft: Order) -> StorageResult<Order> {
        if self.conflict_once.swap(false, Ordering::SeqCst) {
            return Err(StorageError::DuplicateOrderId("14010001".to_string()));
        }
        self.inner.insert_with_next_sequence(draft).await
    }

    async fn get_order(&self, id: &str) -> StorageResult<Option<Order>> {
        if let Some(delay) = self.get_delay {
            tokio::time::sleep(delay).await;
        }
        self.inner.get_order(id).await
    }

    async fn get_orders_by_status(&self, status: OrderStatus) -> StorageResult<Vec<Order>> {
        self.inner.get_orders_by_status(status).await
    }

    async fn list_orders(&self) -> StorageResult<Vec<Order>> {
        self.inner.list_orders().await
    }

    async fn max_sequence_for_date(&self, date_key: u32) -> StorageResult<Option<u32>> {
        self.inner.max_sequence_for_date(date_key).await
    }

    async fn max_queue_number_for_date(&self, date_key: u32) -> StorageResult<Option<u32>> {
        self.inner.max_queue_number_for_date(date_key).await
    }

    async fn conditional_update_status(
        &self,
        id: &str,
        from: OrderStatus,
        to: OrderStatus,
        patch: StatusPatch,
    ) -> StorageResult<u64> {
        self.inner
            .conditional_update_status(id, from, to, patch)
            .await
    }

    async fn bulk_expire(&self, cutoff: i64) -> StorageResult<u64> {
        self.inner.bulk_expire(cutoff).await
    }

    async fn delete_orders(&self, ids: &[String]) -> StorageResult<u64> {
        self.inner.delete_orders(ids).await
    }

    async fn delete_all_orders(&self) -> StorageResult<u64> {
        self.inner.delete_all_orders().await
    }

    async fn ping(&self) -> StorageResult<()> {
        self.inner.ping().await
    }
}
