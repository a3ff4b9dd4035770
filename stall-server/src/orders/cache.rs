//! Order cache hint
//!
//! 尽力而为的二级缓存，不参与正确性判断：引擎从不用它做状态判断，订单状态以 [`OrderStore`] 为准。
//!
//! [`MemoryOrderCache`] 只保留活跃订单（PENDING_PAYMENT / PAID）：
//! 终态订单的提示写入即删除，超时清扫和全量清理同步清缓存，条目数有上限。
//!
//! [`OrderStore`]: super::storage::OrderStore

use async_trait::async_trait;
use dashmap::DashMap;
use shared::models::{Order, OrderStatus};
use std::sync::Arc;
use thiserror::Error;

/// Default bound on cached hints
pub const DEFAULT_CACHE_CAPACITY: usize = 10_000;

#[derive(Debug, Error)]
pub enum CacheError {
    #[error("Cache unavailable: {0}")]
    Unavailable(String),
}

#[async_trait]
pub trait OrderCache: Send + Sync {
    /// Record the latest state of an order
    async fn put_order_hint(&self, order: &Order) -> Result<(), CacheError>;

    /// Drop the hint of a purged order
    async fn evict(&self, order_id: &str) -> Result<(), CacheError>;

    /// Drop PENDING_PAYMENT hints created before `cutoff`, mirroring the expiry sweep
    async fn evict_expired(&self, cutoff: i64) -> Result<u64, CacheError>;

    async fn clear(&self) -> Result<(), CacheError>;

    /// Number of cached hints, `None` when the cache keeps nothing
    fn entries(&self) -> Option<usize> {
        None
    }
}

/// 默认实现：什么都不做
#[derive(Debug, Clone, Default)]
pub struct NoopOrderCache;

#[async_trait]
impl OrderCache for NoopOrderCache {
    async fn put_order_hint(&self, _order: &Order) -> Result<(), CacheError> {
        Ok(())
    }

    async fn evict(&self, _order_id: &str) -> Result<(), CacheError> {
        Ok(())
    }

    async fn evict_expired(&self, _cutoff: i64) -> Result<u64, CacheError> {
        Ok(0)
    }

    async fn clear(&self) -> Result<(), CacheError> {
        Ok(())
    }
}

/// Process-local cache backed by DashMap
#[derive(Debug, Clone)]
pub struct MemoryOrderCache {
    orders: Arc<DashMap<String, Order>>,
    capacity: usize,
}

impl Default for MemoryOrderCache {
    fn default() -> Self {
        Self::with_capacity(DEFAULT_CACHE_CAPACITY)
    }
}

impl MemoryOrderCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            orders: Arc::new(DashMap::new()),
            capacity: capacity.max(1),
        }
    }

    pub fn get(&self, order_id: &str) -> Option<Order> {
        self.orders.get(order_id).map(|entry| entry.value().clone())
    }

    pub fn len(&self) -> usize {
        self.orders.len()
    }

    pub fn is_empty(&self) -> bool {
        self.orders.is_empty()
    }

    /// Remove the oldest hint other than `keep`
    fn evict_oldest(&self, keep: &str) {
        let oldest = self
            .orders
            .iter()
            .filter(|entry| entry.key() != keep)
            .min_by(|a, b| {
                a.value()
                    .created_at
                    .cmp(&b.value().created_at)
                    .then_with(|| a.key().cmp(b.key()))
            })
            .map(|entry| entry.key().clone());
        if let Some(id) = oldest {
            self.orders.remove(&id);
        }
    }
}

#[async_trait]
impl OrderCache for MemoryOrderCache {
    async fn put_order_hint(&self, order: &Order) -> Result<(), CacheError> {
        if order.status.is_terminal() {
            self.orders.remove(&order.id);
            return Ok(());
        }

        self.orders.insert(order.id.clone(), order.clone());
        while self.orders.len() > self.capacity {
            self.evict_oldest(&order.id);
        }
        Ok(())
    }

    async fn evict(&self, order_id: &str) -> Result<(), CacheError> {
        self.orders.remove(order_id);
        Ok(())
    }

    async fn evict_expired(&self, cutoff: i64) -> Result<u64, CacheError> {
        let before = self.orders.len();
        self.orders.retain(|_, order| {
            !(order.status == OrderStatus::PendingPayment && order.created_at < cutoff)
        });
        Ok(before.saturating_sub(self.orders.len()) as u64)
    }

    async fn clear(&self) -> Result<(), CacheError> {
        self.orders.clear();
        Ok(())
    }

    fn entries(&self) -> Option<usize> {
        Some(self.orders.len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn order(id: &str, created_at: i64) -> Order {
        Order {
            id: id.to_string(),
            customer_name: "Jane".to_string(),
            items: vec![],
            total_amount: 40.0,
            status: OrderStatus::PendingPayment,
            date_key: 1401,
            queue_number: None,
            payment_method: None,
            created_at,
            paid_at: None,
            completed_at: None,
        }
    }

    #[tokio::test]
    async fn test_memory_cache_put_and_evict() {
        let cache = MemoryOrderCache::new();
        cache.put_order_hint(&order("14010001", 0)).await.unwrap();
        assert_eq!(cache.len(), 1);
        assert_eq!(cache.entries(), Some(1));
        assert_eq!(cache.get("14010001").unwrap().total_amount, 40.0);

        cache.evict("14010001").await.unwrap();
        assert!(cache.is_empty());
        // evicting a missing key is fine
        cache.evict("14010001").await.unwrap();
    }

    #[tokio::test]
    async fn test_terminal_orders_leave_the_cache() {
        let cache = MemoryOrderCache::new();
        let mut o = order("14010001", 0);
        cache.put_order_hint(&o).await.unwrap();

        o.status = OrderStatus::Paid;
        cache.put_order_hint(&o).await.unwrap();
        assert_eq!(cache.get("14010001").unwrap().status, OrderStatus::Paid);

        o.status = OrderStatus::Completed;
        cache.put_order_hint(&o).await.unwrap();
        assert!(cache.is_empty());

        let mut cancelled = order("14010002", 0);
        cancelled.status = OrderStatus::Cancelled;
        cache.put_order_hint(&cancelled).await.unwrap();
        assert!(cache.is_empty());
    }

    #[tokio::test]
    async fn test_evict_expired_only_drops_old_pending() {
        let cache = MemoryOrderCache::new();
        cache.put_order_hint(&order("14010001", 1_000)).await.unwrap();
        cache.put_order_hint(&order("14010002", 9_000)).await.unwrap();
        let mut paid = order("14010003", 1_000);
        paid.status = OrderStatus::Paid;
        cache.put_order_hint(&paid).await.unwrap();

        assert_eq!(cache.evict_expired(5_000).await.unwrap(), 1);
        assert!(cache.get("14010001").is_none());
        assert!(cache.get("14010002").is_some());
        assert!(cache.get("14010003").is_some());

        cache.clear().await.unwrap();
        assert!(cache.is_empty());
    }

    #[tokio::test]
    async fn test_capacity_drops_oldest() {
        let cache = MemoryOrderCache::with_capacity(2);
        cache.put_order_hint(&order("14010001", 100)).await.unwrap();
        cache.put_order_hint(&order("14010002", 200)).await.unwrap();
        cache.put_order_hint(&order("14010003", 50)).await.unwrap();

        assert_eq!(cache.len(), 2);
        // 刚写入的条目即使最旧也保留
        assert!(cache.get("14010003").is_some());
        assert!(cache.get("14010001").is_none());
        assert!(cache.get("14010002").is_some());
    }

    #[tokio::test]
    async fn test_noop_cache_accepts_everything() {
        let cache = NoopOrderCache;
        cache.put_order_hint(&order("14010001", 0)).await.unwrap();
        cache.evict("14010001").await.unwrap();
        assert_eq!(cache.evict_expired(i64::MAX).await.unwrap(), 0);
        cache.clear().await.unwrap();
        assert_eq!(cache.entries(), None);
    }
}
