use std::path::PathBuf;
use std::time::Duration;

use crate::db::DB_FILE;

/// 订单缓存实现
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CacheKind {
    /// 不缓存（默认）
    Noop,
    /// 进程内 DashMap
    Memory,
}

impl CacheKind {
    fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "noop" | "none" | "" => Some(CacheKind::Noop),
            "memory" => Some(CacheKind::Memory),
            _ => None,
        }
    }
}

/// 服务器配置
///
/// # 环境变量
///
/// | 环境变量 | 默认值 | 说明 |
/// |----------|--------|------|
/// | WORK_DIR | ./data | 工作目录（数据库、日志） |
/// | HTTP_PORT | 8080 | HTTP 服务端口 |
/// | ENVIRONMENT | development | 运行环境 |
/// | LOG_LEVEL | info | 日志级别 |
/// | LOG_JSON | false | JSON 日志 |
/// | ORDER_OP_TIMEOUT_MS | 5000 | 单个订单操作超时 |
/// | ORDER_EXPIRY_MINUTES | 60 | 未付款订单过期时间 |
/// | EXPIRY_CHECK_INTERVAL_SECONDS | 60 | 过期清扫间隔 |
/// | EXPIRY_TICK_TIMEOUT_MS | 30000 | 单次清扫超时 |
/// | ORDER_CACHE | noop | noop / memory |
/// | SHUTDOWN_TIMEOUT_MS | 10000 | 后台任务关闭超时 |
///
/// # 示例
///
/// ```ignore
/// WORK_DIR=/data/stall HTTP_PORT=9000 cargo run
/// ```
#[derive(Debug, Clone)]
pub struct Config {
    /// 工作目录，存放数据库和日志
    pub work_dir: String,
    /// HTTP API 服务端口
    pub http_port: u16,
    /// 运行环境: development | production
    pub environment: String,
    pub log_level: String,
    pub log_json: bool,
    /// 订单操作超时 (毫秒)
    pub order_op_timeout_ms: u64,
    /// 未付款订单过期时间 (分钟)
    pub order_expiry_minutes: u64,
    /// 过期清扫间隔 (秒)
    pub expiry_check_interval_seconds: u64,
    /// 单次清扫超时 (毫秒)
    pub expiry_tick_timeout_ms: u64,
    pub order_cache: CacheKind,
    /// 关闭超时时间 (毫秒)
    pub shutdown_timeout_ms: u64,
}

fn env_or<T: std::str::FromStr>(key: &str, default: T) -> T {
    std::env::var(key)
        .ok()
        .and_then(|v| v.trim().parse().ok())
        .unwrap_or(default)
}

impl Config {
    /// 从环境变量加载配置
    ///
    /// 未设置或无法解析时使用默认值
    pub fn from_env() -> Self {
        let order_cache = match std::env::var("ORDER_CACHE") {
            Ok(v) => CacheKind::parse(&v).unwrap_or_else(|| {
                tracing::warn!(value = %v, "Unknown ORDER_CACHE, falling back to noop");
                CacheKind::Noop
            }),
            Err(_) => CacheKind::Noop,
        };

        Self {
            work_dir: std::env::var("WORK_DIR").unwrap_or_else(|_| "./data".into()),
            http_port: env_or("HTTP_PORT", 8080),
            environment: std::env::var("ENVIRONMENT").unwrap_or_else(|_| "development".into()),
            log_level: std::env::var("LOG_LEVEL").unwrap_or_else(|_| "info".into()),
            log_json: env_or("LOG_JSON", false),
            order_op_timeout_ms: env_or("ORDER_OP_TIMEOUT_MS", 5000),
            order_expiry_minutes: env_or("ORDER_EXPIRY_MINUTES", 60),
            expiry_check_interval_seconds: env_or("EXPIRY_CHECK_INTERVAL_SECONDS", 60),
            expiry_tick_timeout_ms: env_or("EXPIRY_TICK_TIMEOUT_MS", 30000),
            order_cache,
            shutdown_timeout_ms: env_or("SHUTDOWN_TIMEOUT_MS", 10000),
        }
    }

    /// 使用自定义值覆盖部分配置
    ///
    /// 常用于测试场景
    pub fn with_overrides(work_dir: impl Into<String>, http_port: u16) -> Self {
        let mut config = Self::from_env();
        config.work_dir = work_dir.into();
        config.http_port = http_port;
        config
    }

    /// 是否生产环境
    pub fn is_production(&self) -> bool {
        self.environment == "production"
    }

    /// 是否开发环境
    pub fn is_development(&self) -> bool {
        self.environment == "development"
    }

    pub fn db_path(&self) -> PathBuf {
        PathBuf::from(&self.work_dir).join(DB_FILE)
    }

    pub fn log_dir(&self) -> PathBuf {
        PathBuf::from(&self.work_dir).join("logs")
    }

    /// 确保工作目录结构存在
    pub fn ensure_work_dir_structure(&self) -> std::io::Result<()> {
        std::fs::create_dir_all(&self.work_dir)?;
        std::fs::create_dir_all(self.log_dir())
    }

    pub fn order_op_timeout(&self) -> Duration {
        Duration::from_millis(self.order_op_timeout_ms)
    }

    pub fn order_expiry_window(&self) -> Duration {
        Duration::from_secs(self.order_expiry_minutes.saturating_mul(60))
    }

    pub fn expiry_check_interval(&self) -> Duration {
        // interval(0) 会 panic
        Duration::from_secs(self.expiry_check_interval_seconds.max(1))
    }

    pub fn expiry_tick_timeout(&self) -> Duration {
        Duration::from_millis(self.expiry_tick_timeout_ms)
    }

    pub fn shutdown_timeout(&self) -> Duration {
        Duration::from_millis(self.shutdown_timeout_ms)
    }
}

impl Default for Config {
    fn default() -> Self {
        Self::from_env()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cache_kind_parse() {
        assert_eq!(CacheKind::parse("memory"), Some(CacheKind::Memory));
        assert_eq!(CacheKind::parse(" MEMORY "), Some(CacheKind::Memory));
        assert_eq!(CacheKind::parse("noop"), Some(CacheKind::Noop));
        assert_eq!(CacheKind::parse("redis"), None);
    }

    #[test]
    fn test_derived_paths_and_durations() {
        let mut config = Config::with_overrides("/tmp/stall", 9000);
        config.order_expiry_minutes = 90;
        config.expiry_check_interval_seconds = 0;
        config.order_op_timeout_ms = 250;

        assert_eq!(config.http_port, 9000);
        assert_eq!(config.db_path(), PathBuf::from("/tmp/stall").join(DB_FILE));
        assert_eq!(config.log_dir(), PathBuf::from("/tmp/stall/logs"));
        assert_eq!(config.order_expiry_window(), Duration::from_secs(5400));
        assert_eq!(config.expiry_check_interval(), Duration::from_secs(1));
        assert_eq!(config.order_op_timeout(), Duration::from_millis(250));
    }
}
