//! OrdersManager - order lifecycle engine
//!
//! ```text
//! PENDING_PAYMENT ──verify_payment──▶ PAID ──complete_order──▶ COMPLETED
//!        │
//!        └──cancel_order / expiry sweep──▶ CANCELLED
//! ```
//!
//! # Create Flow
//!
//! ```text
//! create_order(req)
//!     ├─ 1. OrderValidator (name → date key → items → qty / menu / price)
//!     ├─ 2. insert_with_next_sequence: max(seq)+1 → generate_order_id → insert，同一个写事务
//!     └─ 3. put_order_hint (must succeed)
//! ```
//!
//! 状态变更都是条件写，引擎不持有订单副本：每次变更前重新读取，
//! 0 行受影响时再读一次区分 NotFound / InvalidStatus。变更本身从不自动重试。
//! 叫号在 PENDING_PAYMENT → PAID 的条件写内部分配。

mod error;
pub use error::*;

use shared::models::{CreateOrderRequest, Order, OrderStatus, PaymentMethod};
use shared::util::now_millis;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use super::cache::{NoopOrderCache, OrderCache};
use super::money;
use super::storage::{OrderStore, StatusPatch};
use super::validator::OrderValidator;
use crate::db::StorageError;
use crate::menu::MenuCatalog;

/// Default per-operation timeout
pub const DEFAULT_OP_TIMEOUT: Duration = Duration::from_secs(5);

#[derive(Clone)]
pub struct OrdersManager {
    store: Arc<dyn OrderStore>,
    cache: Arc<dyn OrderCache>,
    validator: OrderValidator,
    op_timeout: Duration,
}

impl std::fmt::Debug for OrdersManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OrdersManager")
            .field("op_timeout", &self.op_timeout)
            .finish_non_exhaustive()
    }
}

impl OrdersManager {
    pub fn new(
        store: Arc<dyn OrderStore>,
        menu: Arc<dyn MenuCatalog>,
        cache: Arc<dyn OrderCache>,
    ) -> Self {
        Self {
            validator: OrderValidator::new(menu),
            store,
            cache,
            op_timeout: DEFAULT_OP_TIMEOUT,
        }
    }

    /// Manager without a secondary cache
    pub fn without_cache(store: Arc<dyn OrderStore>, menu: Arc<dyn MenuCatalog>) -> Self {
        Self::new(store, menu, Arc::new(NoopOrderCache))
    }

    pub fn with_op_timeout(mut self, timeout: Duration) -> Self {
        self.op_timeout = timeout;
        self
    }

    pub fn store(&self) -> &Arc<dyn OrderStore> {
        &self.store
    }

    async fn timed<T, F>(&self, operation: &'static str, fut: F) -> OrderResult<T>
    where
        F: Future<Output = OrderResult<T>>,
    {
        match tokio::time::timeout(self.op_timeout, fut).await {
            Ok(result) => result,
            Err(_) => {
                tracing::warn!(
                    operation,
                    timeout_ms = self.op_timeout.as_millis() as u64,
                    "Order operation timed out"
                );
                Err(OrderError::Timeout {
                    operation,
                    timeout: self.op_timeout,
                })
            }
        }
    }

    // ========== Commands ==========

    /// Validate, mint an ID and persist a new PENDING_PAYMENT order
    pub async fn create_order(&self, req: CreateOrderRequest) -> OrderResult<Order> {
        self.timed("create_order", self.do_create_order(req)).await
    }

    async fn do_create_order(&self, req: CreateOrderRequest) -> OrderResult<Order> {
        let items = self.validator.validate(&req).await?;
        let total_amount = money::order_total(&items);

        let draft = Order {
            id: String::new(),
            customer_name: req.customer_name,
            items,
            total_amount,
            status: OrderStatus::PendingPayment,
            date_key: req.date_key,
            queue_number: None,
            payment_method: None,
            created_at: now_millis(),
            paid_at: None,
            completed_at: None,
        };

        let order = self
            .store
            .insert_with_next_sequence(draft)
            .await
            .map_err(|e| match e {
                StorageError::SequenceExhausted(date_key) => {
                    OrderError::SequenceExhausted(date_key)
                }
                StorageError::DuplicateOrderId(id) => OrderError::DuplicateId(id),
                e => OrderError::Store(e),
            })?;

        // 订单已落库；缓存失败仍然让本次调用失败
        self.cache.put_order_hint(&order).await?;

        tracing::info!(
            order_id = %order.id,
            date_key = order.date_key,
            total = order.total_amount,
            items = order.items.len(),
            "Order created"
        );
        Ok(order)
    }

    /// PENDING_PAYMENT → PAID, assigning the next queue number for the order's date
    pub async fn verify_payment(
        &self,
        id: &str,
        payment_method: Option<PaymentMethod>,
    ) -> OrderResult<Order> {
        self.timed("verify_payment", async {
            let patch = StatusPatch {
                assign_queue_number: true,
                payment_method,
                paid_at: Some(now_millis()),
                completed_at: None,
            };
            let order = self
                .transition(id, OrderStatus::PendingPayment, OrderStatus::Paid, patch)
                .await?;
            tracing::info!(
                order_id = %order.id,
                date_key = order.date_key,
                queue_number = ?order.queue_number,
                "Payment verified"
            );
            Ok::<_, OrderError>(order)
        })
        .await
    }

    /// PAID → COMPLETED
    pub async fn complete_order(&self, id: &str) -> OrderResult<Order> {
        self.timed("complete_order", async {
            let patch = StatusPatch {
                completed_at: Some(now_millis()),
                ..Default::default()
            };
            let order = self
                .transition(id, OrderStatus::Paid, OrderStatus::Completed, patch)
                .await?;
            tracing::info!(order_id = %order.id, queue_number = ?order.queue_number, "Order completed");
            Ok::<_, OrderError>(order)
        })
        .await
    }

    /// PENDING_PAYMENT → CANCELLED; paid orders cannot be cancelled here
    pub async fn cancel_order(&self, id: &str) -> OrderResult<Order> {
        self.timed("cancel_order", async {
            let order = self
                .transition(
                    id,
                    OrderStatus::PendingPayment,
                    OrderStatus::Cancelled,
                    StatusPatch::default(),
                )
                .await?;
            tracing::info!(order_id = %order.id, "Order cancelled");
            Ok::<_, OrderError>(order)
        })
        .await
    }

    /// Re-read, check, conditional write, re-read
    async fn transition(
        &self,
        id: &str,
        from: OrderStatus,
        to: OrderStatus,
        patch: StatusPatch,
    ) -> OrderResult<Order> {
        let current = self.load(id).await?;
        expect_status(&current, from)?;

        let rows = self
            .store
            .conditional_update_status(id, from, to, patch)
            .await?;
        if rows == 0 {
            return Err(self.rejected(id, from).await);
        }

        let order = self.load(id).await?;
        self.refresh_hint(&order).await;
        Ok(order)
    }

    /// Explain a zero-row conditional write
    async fn rejected(&self, id: &str, expected: OrderStatus) -> OrderError {
        match self.store.get_order(id).await {
            Ok(Some(order)) => OrderError::InvalidStatus {
                order_id: id.to_string(),
                expected,
                actual: order.status,
            },
            Ok(None) => OrderError::NotFound(id.to_string()),
            Err(e) => e.into(),
        }
    }

    async fn refresh_hint(&self, order: &Order) {
        if let Err(e) = self.cache.put_order_hint(order).await {
            tracing::warn!(order_id = %order.id, error = %e, "Failed to refresh cache hint");
        }
    }

    async fn load(&self, id: &str) -> OrderResult<Order> {
        self.store
            .get_order(id)
            .await?
            .ok_or_else(|| OrderError::NotFound(id.to_string()))
    }

    // ========== Queries ==========

    pub async fn get_order(&self, id: &str) -> OrderResult<Order> {
        self.timed("get_order", self.load(id)).await
    }

    /// Orders in `status`, oldest first
    pub async fn get_by_status(&self, status: OrderStatus) -> OrderResult<Vec<Order>> {
        self.timed("get_by_status", async {
            self.store
                .get_orders_by_status(status)
                .await
                .map_err(OrderError::from)
        })
        .await
    }

    /// Paid orders waiting to be served
    pub async fn get_queue(&self) -> OrderResult<Vec<Order>> {
        self.get_by_status(OrderStatus::Paid).await
    }

    pub async fn get_pending_payment(&self) -> OrderResult<Vec<Order>> {
        self.get_by_status(OrderStatus::PendingPayment).await
    }

    pub async fn get_completed(&self) -> OrderResult<Vec<Order>> {
        self.get_by_status(OrderStatus::Completed).await
    }

    // ========== Admin ==========

    /// Every order in any status, oldest first
    pub async fn list_orders(&self) -> OrderResult<Vec<Order>> {
        self.timed("list_orders", async {
            self.store.list_orders().await.map_err(OrderError::from)
        })
        .await
    }

    pub async fn delete_orders(&self, ids: &[String]) -> OrderResult<u64> {
        self.timed("delete_orders", async {
            let deleted = self.store.delete_orders(ids).await?;
            for id in ids {
                if let Err(e) = self.cache.evict(id).await {
                    tracing::warn!(order_id = %id, error = %e, "Failed to evict cache hint");
                }
            }
            tracing::warn!(requested = ids.len(), deleted, "Orders purged");
            Ok::<_, OrderError>(deleted)
        })
        .await
    }

    pub async fn delete_all_orders(&self) -> OrderResult<u64> {
        self.timed("delete_all_orders", async {
            let deleted = self.store.delete_all_orders().await?;
            if let Err(e) = self.cache.clear().await {
                tracing::warn!(error = %e, "Failed to clear cache hints");
            }
            tracing::warn!(deleted, "All orders purged");
            Ok::<_, OrderError>(deleted)
        })
        .await
    }
}

fn expect_status(order: &Order, expected: OrderStatus) -> OrderResult<()> {
    if order.status != expected {
        return Err(OrderError::InvalidStatus {
            order_id: order.id.clone(),
            expected,
            actual: order.status,
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests;
