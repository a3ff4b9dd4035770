//! Stall Server - 单摊位点单后端
//!
//! # 架构概述
//!
//! - **订单生命周期** (`orders`): 下单校验、订单号生成、付款确认叫号、出餐、取消、超时清扫
//! - **菜单** (`menu`): 菜单目录与管理
//! - **数据库** (`db`): 嵌入式 redb 存储
//! - **HTTP API** (`api`): `/api/v1` 下的 REST 接口
//!
//! # 模块结构
//!
//! ```text
//! stall-server/src/
//! ├── core/          # 配置、状态、后台任务、错误
//! ├── api/           # HTTP 路由和处理器
//! ├── db/            # redb 句柄与表定义
//! ├── menu/          # 菜单存储
//! ├── orders/        # 订单生命周期引擎
//! └── utils/         # 日志
//! ```

pub mod api;
pub mod core;
pub mod db;
pub mod menu;
pub mod orders;
pub mod utils;

// Re-export 公共类型
pub use core::{Config, Server, ServerState};
pub use menu::{MenuCatalog, MenuStorage};
pub use orders::{ExpiryScheduler, OrderStorage, OrdersManager};
pub use shared::{ApiResponse, AppError, AppResult, ErrorCategory, ErrorCode};

// Re-export logger functions
pub use utils::logger::{cleanup_old_logs, init_logger, init_logger_with_file};

/// 日志文件保留天数
const LOG_RETENTION_DAYS: u64 = 14;

/// 设置运行环境：加载 .env → 读取配置 → 创建工作目录 → 初始化日志
pub fn setup_environment() -> core::Result<Config> {
    // .env 不存在时忽略
    let _ = dotenv::dotenv();

    let config = Config::from_env();
    config.ensure_work_dir_structure()?;

    let log_dir = config.log_dir();
    init_logger_with_file(
        Some(config.log_level.as_str()),
        config.log_json,
        Some(log_dir.as_path()),
    );
    if let Err(e) = cleanup_old_logs(&log_dir, LOG_RETENTION_DAYS) {
        tracing::warn!(error = %e, "Failed to clean up old logs");
    }

    Ok(config)
}

pub fn print_banner() {
    println!(
        r#"
   _____ __        ____
  / ___// /_____ _/ / /
  \__ \/ __/ __ `/ / /
 ___/ / /_/ /_/ / / /
/____/\__/\__,_/_/_/
    "#
    );
}
