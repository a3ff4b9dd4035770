//! Order request validation
//!
//! 按固定顺序检查，遇到第一个失败立即返回：
//!
//! 1. 顾客名 2-50 个字符
//! 2. date_key 在 [101, 3112] 且能解出合法的日/月
//! 3. 至少一个明细
//! 4. 逐个明细：数量 1-30 → 菜品存在且可售 → 提交价格与当前菜单价格完全相等
//!
//! 通过后返回以菜单为准的明细快照（名称与价格）。

use shared::models::{CreateOrderRequest, OrderItem};
use shared::order_id::{MAX_DATE_KEY, MIN_DATE_KEY, decode_date_key, generate_order_id};
use std::sync::Arc;

use super::manager::OrderError;
use crate::db::StorageError;
use crate::menu::MenuCatalog;

pub const CUSTOMER_NAME_MIN_CHARS: usize = 2;
pub const CUSTOMER_NAME_MAX_CHARS: usize = 50;
pub const MIN_QUANTITY: i32 = 1;
pub const MAX_QUANTITY: i32 = 30;

#[derive(Clone)]
pub struct OrderValidator {
    menu: Arc<dyn MenuCatalog>,
}

impl OrderValidator {
    pub fn new(menu: Arc<dyn MenuCatalog>) -> Self {
        Self { menu }
    }

    /// Validate a create request and snapshot its lines from the menu
    pub async fn validate(&self, req: &CreateOrderRequest) -> Result<Vec<OrderItem>, OrderError> {
        let name_len = req.customer_name.chars().count();
        if !(CUSTOMER_NAME_MIN_CHARS..=CUSTOMER_NAME_MAX_CHARS).contains(&name_len) {
            return Err(OrderError::Validation(format!(
                "customer name must be {}-{} characters, got {}",
                CUSTOMER_NAME_MIN_CHARS, CUSTOMER_NAME_MAX_CHARS, name_len
            )));
        }

        check_date_key(req.date_key)?;

        if req.items.is_empty() {
            return Err(OrderError::Empty);
        }

        let mut lines = Vec::with_capacity(req.items.len());
        for (index, input) in req.items.iter().enumerate() {
            if !(MIN_QUANTITY..=MAX_QUANTITY).contains(&input.quantity) {
                return Err(OrderError::Validation(format!(
                    "item {}: quantity must be {}-{}, got {}",
                    index, MIN_QUANTITY, MAX_QUANTITY, input.quantity
                )));
            }

            let menu_item = match self.menu.get_menu_item(input.menu_item_id).await {
                Ok(item) => item,
                Err(StorageError::MenuItemNotFound(id)) => {
                    return Err(OrderError::Validation(format!(
                        "item {}: menu item {} does not exist",
                        index, id
                    )));
                }
                Err(e) => return Err(OrderError::Store(e)),
            };

            if !menu_item.available {
                return Err(OrderError::ItemUnavailable(menu_item.id));
            }

            // 精确相等，无容差
            if input.price != menu_item.price {
                return Err(OrderError::PriceMismatch {
                    menu_item_id: menu_item.id,
                    expected: menu_item.price,
                    submitted: input.price,
                });
            }

            lines.push(OrderItem {
                menu_item_id: menu_item.id,
                name: menu_item.name,
                price: menu_item.price,
                quantity: input.quantity,
            });
        }

        Ok(lines)
    }
}

fn check_date_key(date_key: u32) -> Result<(), OrderError> {
    if !(MIN_DATE_KEY..=MAX_DATE_KEY).contains(&date_key) {
        return Err(OrderError::Validation(format!(
            "date key must be in [{}, {}], got {}",
            MIN_DATE_KEY, MAX_DATE_KEY, date_key
        )));
    }
    // 1300 之类在区间内但月份为 0
    let (day, month) = decode_date_key(date_key);
    generate_order_id(day, month, 1)
        .map(|_| ())
        .map_err(|e| OrderError::Validation(format!("date key {}: {}", date_key, e)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::{DbService, StorageResult};
    use crate::menu::MenuStorage;
    use async_trait::async_trait;
    use shared::models::{MenuItem, MenuItemCreate, MenuItemUpdate, OrderItemInput};

    async fn menu_with_pad_thai() -> MenuStorage {
        let menu = MenuStorage::new(DbService::open_in_memory().unwrap());
        menu.create(MenuItemCreate {
            name: "Pad Thai".to_string(),
            price: 40.0,
            category: None,
            image_url: None,
            available: None,
        })
        .await
        .unwrap();
        menu
    }

    fn request(name: &str, date_key: u32, items: Vec<OrderItemInput>) -> CreateOrderRequest {
        CreateOrderRequest {
            customer_name: name.to_string(),
            date_key,
            items,
        }
    }

    fn line(menu_item_id: i64, price: f64, quantity: i32) -> OrderItemInput {
        OrderItemInput {
            menu_item_id,
            name: None,
            price,
            quantity,
        }
    }

    #[tokio::test]
    async fn test_valid_request_snapshots_menu() {
        let validator = OrderValidator::new(Arc::new(menu_with_pad_thai().await));
        let lines = validator
            .validate(&request("John Doe", 1401, vec![line(1, 40.0, 2)]))
            .await
            .unwrap();
        assert_eq!(
            lines,
            vec![OrderItem {
                menu_item_id: 1,
                name: "Pad Thai".to_string(),
                price: 40.0,
                quantity: 2,
            }]
        );
    }

    #[tokio::test]
    async fn test_customer_name_bounds() {
        let validator = OrderValidator::new(Arc::new(menu_with_pad_thai().await));
        for name in ["J".to_string(), "x".repeat(51)] {
            let err = validator
                .validate(&request(&name, 1401, vec![line(1, 40.0, 1)]))
                .await
                .unwrap_err();
            assert!(matches!(err, OrderError::Validation(_)), "{name}");
        }
        // 按字符计数，不按字节
        validator
            .validate(&request("สม", 1401, vec![line(1, 40.0, 1)]))
            .await
            .unwrap();
        validator
            .validate(&request(&"x".repeat(50), 1401, vec![line(1, 40.0, 1)]))
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn test_date_key_bounds() {
        let validator = OrderValidator::new(Arc::new(menu_with_pad_thai().await));
        for date_key in [0, 100, 3113, 1300, 1500] {
            let err = validator
                .validate(&request("John Doe", date_key, vec![line(1, 40.0, 1)]))
                .await
                .unwrap_err();
            assert!(matches!(err, OrderError::Validation(_)), "{date_key}");
        }
        // 不做日历校验
        validator
            .validate(&request("John Doe", 3002, vec![line(1, 40.0, 1)]))
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn test_empty_items() {
        let validator = OrderValidator::new(Arc::new(menu_with_pad_thai().await));
        let err = validator
            .validate(&request("John Doe", 1401, vec![]))
            .await
            .unwrap_err();
        assert!(matches!(err, OrderError::Empty));
    }

    #[tokio::test]
    async fn test_quantity_bounds() {
        let validator = OrderValidator::new(Arc::new(menu_with_pad_thai().await));
        for qty in [0, -1, 31] {
            let err = validator
                .validate(&request("John Doe", 1401, vec![line(1, 40.0, qty)]))
                .await
                .unwrap_err();
            assert!(matches!(err, OrderError::Validation(_)));
        }
        validator
            .validate(&request("John Doe", 1401, vec![line(1, 40.0, 30)]))
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn test_price_mismatch() {
        let validator = OrderValidator::new(Arc::new(menu_with_pad_thai().await));
        let err = validator
            .validate(&request("John Doe", 1401, vec![line(1, 50.0, 1)]))
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            OrderError::PriceMismatch { menu_item_id: 1, expected, submitted }
                if expected == 40.0 && submitted == 50.0
        ));

        // 无容差
        let err = validator
            .validate(&request("John Doe", 1401, vec![line(1, 40.000001, 1)]))
            .await
            .unwrap_err();
        assert!(matches!(err, OrderError::PriceMismatch { .. }));
    }

    #[tokio::test]
    async fn test_missing_and_unavailable_items() {
        let menu = menu_with_pad_thai().await;
        menu.update(
            1,
            MenuItemUpdate {
                available: Some(false),
                ..Default::default()
            },
        )
        .await
        .unwrap();
        let validator = OrderValidator::new(Arc::new(menu));

        let err = validator
            .validate(&request("John Doe", 1401, vec![line(1, 40.0, 1)]))
            .await
            .unwrap_err();
        assert!(matches!(err, OrderError::ItemUnavailable(1)));

        let err = validator
            .validate(&request("John Doe", 1401, vec![line(9, 40.0, 1)]))
            .await
            .unwrap_err();
        assert!(matches!(err, OrderError::Validation(msg) if msg.contains("menu item 9")));
    }

    /// Catalog that fails every lookup
    struct BrokenMenu;

    #[async_trait]
    impl MenuCatalog for BrokenMenu {
        async fn get_menu_item(&self, _id: i64) -> StorageResult<MenuItem> {
            Err(StorageError::Task("menu offline".to_string()))
        }
    }

    #[tokio::test]
    async fn test_checks_short_circuit_before_menu() {
        let validator = OrderValidator::new(Arc::new(BrokenMenu));
        // 名称错误先于菜单查询返回
        let err = validator
            .validate(&request("J", 1401, vec![line(1, 40.0, 1)]))
            .await
            .unwrap_err();
        assert!(matches!(err, OrderError::Validation(_)));

        let err = validator
            .validate(&request("John Doe", 1401, vec![line(1, 40.0, 1)]))
            .await
            .unwrap_err();
        assert!(matches!(err, OrderError::Store(_)));
    }
}
