use std::sync::Arc;

use crate::core::tasks::BackgroundTasks;
use crate::core::{CacheKind, Config, Result};
use crate::db::DbService;
use crate::menu::MenuStorage;
use crate::orders::{
    ExpiryScheduler, MemoryOrderCache, NoopOrderCache, OrderCache, OrderStorage, OrdersManager,
};

/// 服务器状态 - 持有所有服务的共享引用
///
/// 所有字段都是 Arc 或内部 Arc，clone 成本极低。
///
/// | 字段 | 说明 |
/// |------|------|
/// | config | 配置项 (不可变) |
/// | db | redb 句柄 |
/// | orders | 订单生命周期引擎 |
/// | order_storage | 订单存储（过期清扫直接使用） |
/// | order_cache | 订单缓存提示 (`ORDER_CACHE`) |
/// | menu | 菜单存储 |
#[derive(Clone)]
pub struct ServerState {
    pub config: Config,
    pub db: DbService,
    pub orders: OrdersManager,
    pub order_storage: Arc<OrderStorage>,
    pub order_cache: Arc<dyn OrderCache>,
    pub menu: Arc<MenuStorage>,
}

impl ServerState {
    /// 基于已打开的数据库组装服务
    pub fn new(config: Config, db: DbService) -> Self {
        let order_storage = Arc::new(OrderStorage::new(db.clone()));
        let menu = Arc::new(MenuStorage::new(db.clone()));
        let order_cache: Arc<dyn OrderCache> = match config.order_cache {
            CacheKind::Noop => Arc::new(NoopOrderCache),
            CacheKind::Memory => Arc::new(MemoryOrderCache::new()),
        };
        let orders = OrdersManager::new(order_storage.clone(), menu.clone(), order_cache.clone())
            .with_op_timeout(config.order_op_timeout());

        Self {
            config,
            db,
            orders,
            order_storage,
            order_cache,
            menu,
        }
    }

    /// 初始化服务器状态
    ///
    /// 1. 工作目录结构
    /// 2. 数据库 (work_dir/stall.redb)
    /// 3. 各服务
    pub async fn initialize(config: &Config) -> Result<Self> {
        config.ensure_work_dir_structure()?;

        let db_path = config.db_path();
        let db = tokio::task::spawn_blocking(move || DbService::open(db_path))
            .await
            .map_err(|e| crate::core::ServerError::Internal(e.into()))??;
        tracing::info!(path = %config.db_path().display(), "Database opened");

        Ok(Self::new(config.clone(), db))
    }

    /// 内存数据库，用于测试
    pub fn in_memory(config: Config) -> Result<Self> {
        let db = DbService::open_in_memory()?;
        Ok(Self::new(config, db))
    }

    /// 启动后台任务
    ///
    /// 启动的任务：
    /// - 过期订单清扫 (ExpiryScheduler)
    pub fn start_background_tasks(&self) -> BackgroundTasks {
        let mut tasks = BackgroundTasks::new();

        let scheduler = ExpiryScheduler::new(self.order_storage.clone(), tasks.shutdown_token())
            .with_expiry_window(self.config.order_expiry_window())
            .with_tick_interval(self.config.expiry_check_interval())
            .with_tick_timeout(self.config.expiry_tick_timeout())
            .with_cache(self.order_cache.clone());
        tasks.spawn("order_expiry", scheduler.run());

        tasks.log_summary();
        tasks
    }
}
