//! 超时订单清扫
//!
//! 启动时立即扫一次，之后按固定间隔触发：创建时间早于 `now - window` 的
//! PENDING_PAYMENT 订单统一改为 CANCELLED。已付款订单不受影响。
//!
//! 同一 cutoff 同步清掉缓存中的过期提示。由 `BackgroundTasks` 托管，停止时取消共享的 `CancellationToken`。

use shared::util::now_millis;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;

use super::cache::{NoopOrderCache, OrderCache};
use super::manager::{OrderError, OrderResult};
use super::storage::OrderStore;

pub const DEFAULT_EXPIRY_WINDOW: Duration = Duration::from_secs(60 * 60);
pub const DEFAULT_TICK_INTERVAL: Duration = Duration::from_secs(60);
pub const DEFAULT_TICK_TIMEOUT: Duration = Duration::from_secs(30);

pub struct ExpiryScheduler {
    store: Arc<dyn OrderStore>,
    cache: Arc<dyn OrderCache>,
    expiry_window: Duration,
    tick_interval: Duration,
    tick_timeout: Duration,
    shutdown: CancellationToken,
}

impl ExpiryScheduler {
    pub fn new(store: Arc<dyn OrderStore>, shutdown: CancellationToken) -> Self {
        Self {
            store,
            cache: Arc::new(NoopOrderCache),
            expiry_window: DEFAULT_EXPIRY_WINDOW,
            tick_interval: DEFAULT_TICK_INTERVAL,
            tick_timeout: DEFAULT_TICK_TIMEOUT,
            shutdown,
        }
    }

    pub fn with_cache(mut self, cache: Arc<dyn OrderCache>) -> Self {
        self.cache = cache;
        self
    }

    pub fn with_expiry_window(mut self, window: Duration) -> Self {
        self.expiry_window = window;
        self
    }

    pub fn with_tick_interval(mut self, interval: Duration) -> Self {
        self.tick_interval = interval;
        self
    }

    pub fn with_tick_timeout(mut self, timeout: Duration) -> Self {
        self.tick_timeout = timeout;
        self
    }

    /// 主循环：立即清扫一次 → 周期触发，直到 shutdown
    pub async fn run(self) {
        tracing::info!(
            window_secs = self.expiry_window.as_secs(),
            interval_secs = self.tick_interval.as_secs(),
            "Expiry scheduler started"
        );

        let mut interval = tokio::time::interval(self.tick_interval);
        interval.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            // 第一次 tick 立即返回
            tokio::select! {
                _ = interval.tick() => {}
                _ = self.shutdown.cancelled() => {
                    tracing::info!("Expiry scheduler received shutdown signal");
                    break;
                }
            }

            if let Err(e) = self.sweep_once().await {
                tracing::error!(error = %e, "Expiry sweep failed, retrying next tick");
            }
        }

        tracing::info!("Expiry scheduler stopped");
    }

    /// Cancel every PENDING_PAYMENT order created before `now - window`
    pub async fn sweep_once(&self) -> OrderResult<u64> {
        let window_ms = i64::try_from(self.expiry_window.as_millis()).unwrap_or(i64::MAX);
        let cutoff = now_millis().saturating_sub(window_ms);

        let expired = match tokio::time::timeout(self.tick_timeout, self.store.bulk_expire(cutoff))
            .await
        {
            Ok(result) => result?,
            Err(_) => {
                return Err(OrderError::Timeout {
                    operation: "expiry_sweep",
                    timeout: self.tick_timeout,
                });
            }
        };

        if let Err(e) = self.cache.evict_expired(cutoff).await {
            tracing::warn!(error = %e, "Failed to evict expired cache hints");
        }

        if expired > 0 {
            tracing::info!(expired, cutoff, "Expired unpaid orders");
        } else {
            tracing::debug!(cutoff, "No unpaid orders to expire");
        }
        Ok(expired)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::orders::cache::MemoryOrderCache;
    use crate::orders::storage::OrderStorage;
    use shared::models::{Order, OrderStatus};
    use shared::util::minutes_to_millis;

    fn pending(id: &str, age_minutes: u64) -> Order {
        Order {
            id: id.to_string(),
            customer_name: "John Doe".to_string(),
            items: vec![],
            total_amount: 40.0,
            status: OrderStatus::PendingPayment,
            date_key: 1401,
            queue_number: None,
            payment_method: None,
            created_at: now_millis() - minutes_to_millis(age_minutes),
            paid_at: None,
            completed_at: None,
        }
    }

    #[tokio::test]
    async fn test_sweep_cancels_only_stale_pending() {
        let storage = Arc::new(OrderStorage::open_in_memory().unwrap());
        storage.insert_order(&pending("14010001", 90)).await.unwrap();
        storage.insert_order(&pending("14010002", 30)).await.unwrap();

        let mut paid = pending("14010003", 120);
        paid.status = OrderStatus::Paid;
        paid.queue_number = Some(1);
        storage.insert_order(&paid).await.unwrap();

        let scheduler = ExpiryScheduler::new(storage.clone(), CancellationToken::new());
        assert_eq!(scheduler.sweep_once().await.unwrap(), 1);

        let status = |id: &'static str| {
            let storage = storage.clone();
            async move { storage.get_order(id).await.unwrap().unwrap().status }
        };
        assert_eq!(status("14010001").await, OrderStatus::Cancelled);
        assert_eq!(status("14010002").await, OrderStatus::PendingPayment);
        assert_eq!(status("14010003").await, OrderStatus::Paid);

        // 再扫一次没有新的
        assert_eq!(scheduler.sweep_once().await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_run_sweeps_immediately_and_stops_promptly() {
        let storage = Arc::new(OrderStorage::open_in_memory().unwrap());
        storage.insert_order(&pending("14010001", 90)).await.unwrap();

        let token = CancellationToken::new();
        let scheduler = ExpiryScheduler::new(storage.clone(), token.clone())
            .with_tick_interval(Duration::from_secs(3600));
        let handle = tokio::spawn(scheduler.run());

        // 等待首次清扫完成
        let mut swept = false;
        for _ in 0..100 {
            let order = storage.get_order("14010001").await.unwrap().unwrap();
            if order.status == OrderStatus::Cancelled {
                swept = true;
                break;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        assert!(swept);

        token.cancel();
        tokio::time::timeout(Duration::from_secs(1), handle)
            .await
            .expect("scheduler did not stop")
            .unwrap();
    }

    #[tokio::test]
    async fn test_sweep_evicts_cache_hints() {
        let storage = Arc::new(OrderStorage::open_in_memory().unwrap());
        let cache = Arc::new(MemoryOrderCache::new());
        for order in [pending("14010001", 90), pending("14010002", 30)] {
            storage.insert_order(&order).await.unwrap();
            cache.put_order_hint(&order).await.unwrap();
        }

        let scheduler = ExpiryScheduler::new(storage, CancellationToken::new())
            .with_cache(cache.clone());
        assert_eq!(scheduler.sweep_once().await.unwrap(), 1);

        assert!(cache.get("14010001").is_none());
        assert!(cache.get("14010002").is_some());
        assert_eq!(cache.len(), 1);
    }

    #[tokio::test]
    async fn test_custom_window() {
        let storage = Arc::new(OrderStorage::open_in_memory().unwrap());
        storage.insert_order(&pending("14010001", 30)).await.unwrap();

        let scheduler = ExpiryScheduler::new(storage.clone(), CancellationToken::new())
            .with_expiry_window(Duration::from_secs(10 * 60));
        assert_eq!(scheduler.sweep_once().await.unwrap(), 1);
    }
}
