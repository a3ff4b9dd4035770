//! Database Module
//!
//! 单文件 redb 嵌入式数据库，订单与菜单共用。
//!
//! # Tables
//!
//! | Table | Key | Value | Purpose |
//! |-------|-----|-------|---------|
//! | `orders` | `order_id` | JSON `Order` | 订单主记录（含明细） |
//! | `order_sequences` | `(date_key, sequence)` | `order_id` | 每日流水号唯一约束 + max 查询 |
//! | `queue_numbers` | `(date_key, queue_number)` | `order_id` | 每日叫号唯一约束 + max 查询 |
//! | `menu_items` | `menu_item_id` | JSON `MenuItem` | 菜单 |
//! | `counters` | name | `u64` | 菜单 ID 分配 |
//!
//! # Concurrency
//!
//! redb 写事务全局互斥，单个写事务内的 "读 → 校验 → 写" 即为原子条件更新。
//! 所有 redb 调用都通过 [`DbService::run`] 放到 blocking 线程池执行。

use redb::{Database, TableDefinition};
use std::path::Path;
use std::sync::Arc;
use thiserror::Error;

/// Database file name under the work dir
pub const DB_FILE: &str = "stall.redb";

pub(crate) const ORDERS_TABLE: TableDefinition<&str, &[u8]> = TableDefinition::new("orders");

pub(crate) const ORDER_SEQUENCES_TABLE: TableDefinition<(u32, u32), &str> =
    TableDefinition::new("order_sequences");

pub(crate) const QUEUE_NUMBERS_TABLE: TableDefinition<(u32, u32), &str> =
    TableDefinition::new("queue_numbers");

pub(crate) const MENU_ITEMS_TABLE: TableDefinition<i64, &[u8]> = TableDefinition::new("menu_items");

pub(crate) const COUNTERS_TABLE: TableDefinition<&str, u64> = TableDefinition::new("counters");

/// Storage errors
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Database error: {0}")]
    Database(#[from] redb::DatabaseError),

    #[error("Transaction error: {0}")]
    Transaction(#[from] redb::TransactionError),

    #[error("Table error: {0}")]
    Table(#[from] redb::TableError),

    #[error("Storage error: {0}")]
    Storage(#[from] redb::StorageError),

    #[error("Commit error: {0}")]
    Commit(#[from] redb::CommitError),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// `(date_key, sequence)` 已被占用
    #[error("Duplicate order ID: {0}")]
    DuplicateOrderId(String),

    /// 该日期的流水号已用完
    #[error("No order sequence left for date {0}")]
    SequenceExhausted(u32),

    #[error("Invalid order ID: {0}")]
    InvalidOrderId(String),

    #[error("Menu item not found: {0}")]
    MenuItemNotFound(i64),

    #[error("Menu item name already exists: {0}")]
    DuplicateMenuName(String),

    #[error("Blocking task failed: {0}")]
    Task(String),
}

pub type StorageResult<T> = Result<T, StorageError>;

/// Database service, cheap to clone
#[derive(Clone)]
pub struct DbService {
    db: Arc<Database>,
}

impl DbService {
    /// Open or create the database file
    ///
    /// redb 默认 `Durability::Immediate`：`commit()` 返回即落盘，
    /// copy-on-write + 原子指针切换，断电不会损坏文件。
    pub fn open(path: impl AsRef<Path>) -> StorageResult<Self> {
        let db = Database::create(path)?;
        Self::init(db)
    }

    /// Open an in-memory database (tests)
    pub fn open_in_memory() -> StorageResult<Self> {
        let db = Database::builder().create_with_backend(redb::backends::InMemoryBackend::new())?;
        Self::init(db)
    }

    fn init(db: Database) -> StorageResult<Self> {
        let write_txn = db.begin_write()?;
        {
            let _ = write_txn.open_table(ORDERS_TABLE)?;
            let _ = write_txn.open_table(ORDER_SEQUENCES_TABLE)?;
            let _ = write_txn.open_table(QUEUE_NUMBERS_TABLE)?;
            let _ = write_txn.open_table(MENU_ITEMS_TABLE)?;
            let _ = write_txn.open_table(COUNTERS_TABLE)?;
        }
        write_txn.commit()?;

        Ok(Self { db: Arc::new(db) })
    }

    /// Run a closure against the database on the blocking pool
    pub async fn run<T, F>(&self, f: F) -> StorageResult<T>
    where
        F: FnOnce(&Database) -> StorageResult<T> + Send + 'static,
        T: Send + 'static,
    {
        let db = self.db.clone();
        tokio::task::spawn_blocking(move || f(&db))
            .await
            .map_err(|e| StorageError::Task(e.to_string()))?
    }

    /// Liveness check: open and drop a read transaction
    pub async fn ping(&self) -> StorageResult<()> {
        use redb::ReadableDatabase;

        self.run(|db| {
            let read_txn = db.begin_read()?;
            let _ = read_txn.open_table(ORDERS_TABLE)?;
            Ok(())
        })
        .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use redb::{ReadableDatabase, ReadableTable};

    #[tokio::test]
    async fn test_open_in_memory_creates_tables() {
        let db = DbService::open_in_memory().unwrap();
        db.ping().await.unwrap();

        let empty = db
            .run(|db| {
                let read_txn = db.begin_read()?;
                let table = read_txn.open_table(MENU_ITEMS_TABLE)?;
                Ok(table.iter()?.next().is_none())
            })
            .await
            .unwrap();
        assert!(empty);
    }

    #[tokio::test]
    async fn test_reopen_file_keeps_data() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(DB_FILE);

        {
            let db = DbService::open(&path).unwrap();
            db.run(|db| {
                let write_txn = db.begin_write()?;
                {
                    let mut table = write_txn.open_table(COUNTERS_TABLE)?;
                    table.insert("menu_item", 7u64)?;
                }
                write_txn.commit()?;
                Ok(())
            })
            .await
            .unwrap();
        }

        let db = DbService::open(&path).unwrap();
        let value = db
            .run(|db| {
                let read_txn = db.begin_read()?;
                let table = read_txn.open_table(COUNTERS_TABLE)?;
                Ok(table.get("menu_item")?.map(|g| g.value()))
            })
            .await
            .unwrap();
        assert_eq!(value, Some(7));
    }
}
