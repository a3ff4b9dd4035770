//! Order store
//!
//! [`OrderStore`] 是生命周期引擎唯一依赖的持久化接口；[`OrderStorage`] 是 redb 实现。
//!
//! 所有状态变更都是条件写：同一个写事务内读取当前状态，状态不符则放弃事务并返回 0 行。
//! 流水号和叫号都在写事务内部按 `max + 1` 分配（见 [`sequence`](super::sequence)），
//! redb 写事务互斥，所以分配与写入是一个原子步骤。
//! `(date_key, sequence)` 索引表仍然兜底显式 ID 插入的唯一性。

use async_trait::async_trait;
use redb::{ReadableDatabase, ReadableTable, ReadableTableMetadata, WriteTransaction};
use shared::models::{Order, OrderStatus, PaymentMethod};
use shared::order_id::{decode_date_key, generate_order_id, parse_order_id};

use super::sequence::{max_in_date, next_queue_number, next_sequence};
use crate::db::{
    DbService, ORDER_SEQUENCES_TABLE, ORDERS_TABLE, QUEUE_NUMBERS_TABLE, StorageError,
    StorageResult,
};

/// Extra fields written together with a status transition
#[derive(Debug, Clone, Default, PartialEq)]
pub struct StatusPatch {
    /// Take the next queue number of the order's date inside the same write
    pub assign_queue_number: bool,
    pub payment_method: Option<PaymentMethod>,
    pub paid_at: Option<i64>,
    pub completed_at: Option<i64>,
}

impl StatusPatch {
    fn apply(&self, order: &mut Order) {
        if let Some(m) = self.payment_method {
            order.payment_method = Some(m);
        }
        if let Some(t) = self.paid_at {
            order.paid_at = Some(t);
        }
        if let Some(t) = self.completed_at {
            order.completed_at = Some(t);
        }
    }
}

/// Persistence capability consumed by the lifecycle engine
#[async_trait]
pub trait OrderStore: Send + Sync {
    /// Insert an order under its own ID; fails with `DuplicateOrderId` if its `(date_key, sequence)` is taken
    async fn insert_order(&self, order: &Order) -> StorageResult<()>;

    /// Allocate the next sequence of `draft.date_key`, mint the ID and insert, atomically
    ///
    /// `draft.id` is ignored. Fails with `SequenceExhausted` once the date has used every sequence.
    async fn insert_with_next_sequence(&self, draft: Order) -> StorageResult<Order>;

    async fn get_order(&self, id: &str) -> StorageResult<Option<Order>>;

    /// Orders in `status`, oldest first
    async fn get_orders_by_status(&self, status: OrderStatus) -> StorageResult<Vec<Order>>;

    /// Every order regardless of status, oldest first
    async fn list_orders(&self) -> StorageResult<Vec<Order>>;

    async fn max_sequence_for_date(&self, date_key: u32) -> StorageResult<Option<u32>>;

    async fn max_queue_number_for_date(&self, date_key: u32) -> StorageResult<Option<u32>>;

    /// `UPDATE ... WHERE id = ? AND status = from`, returns rows affected (0 or 1)
    async fn conditional_update_status(
        &self,
        id: &str,
        from: OrderStatus,
        to: OrderStatus,
        patch: StatusPatch,
    ) -> StorageResult<u64>;

    /// Cancel every PENDING_PAYMENT order created before `cutoff` (unix millis)
    async fn bulk_expire(&self, cutoff: i64) -> StorageResult<u64>;

    /// Administrative purge, returns rows deleted
    async fn delete_orders(&self, ids: &[String]) -> StorageResult<u64>;

    async fn delete_all_orders(&self) -> StorageResult<u64>;

    async fn ping(&self) -> StorageResult<()>;
}

/// Order storage backed by redb
#[derive(Clone)]
pub struct OrderStorage {
    db: DbService,
}

impl OrderStorage {
    pub fn new(db: DbService) -> Self {
        Self { db }
    }

    /// Standalone in-memory store (tests)
    pub fn open_in_memory() -> StorageResult<Self> {
        Ok(Self::new(DbService::open_in_memory()?))
    }

    /// Orders matching `filter`, oldest first
    async fn scan_orders<F>(&self, filter: F) -> StorageResult<Vec<Order>>
    where
        F: Fn(&Order) -> bool + Send + 'static,
    {
        self.db
            .run(move |db| {
                let read_txn = db.begin_read()?;
                let table = read_txn.open_table(ORDERS_TABLE)?;
                let mut orders = Vec::new();
                for entry in table.iter()? {
                    let (_, value) = entry?;
                    let order = decode(value.value())?;
                    if filter(&order) {
                        orders.push(order);
                    }
                }
                orders.sort_by(|a, b| {
                    a.created_at
                        .cmp(&b.created_at)
                        .then_with(|| a.id.cmp(&b.id))
                });
                Ok(orders)
            })
            .await
    }
}

fn encode(order: &Order) -> StorageResult<Vec<u8>> {
    Ok(serde_json::to_vec(order)?)
}

fn decode(bytes: &[u8]) -> StorageResult<Order> {
    Ok(serde_json::from_slice(bytes)?)
}

fn sequence_of(id: &str) -> StorageResult<u32> {
    parse_order_id(id)
        .map(|parts| parts.sequence)
        .map_err(|e| StorageError::InvalidOrderId(e.to_string()))
}

fn load_order(txn: &WriteTransaction, id: &str) -> StorageResult<Option<Order>> {
    let table = txn.open_table(ORDERS_TABLE)?;
    let bytes = table.get(id)?.map(|guard| guard.value().to_vec());
    bytes.as_deref().map(decode).transpose()
}

fn store_order(txn: &WriteTransaction, order: &Order) -> StorageResult<()> {
    let bytes = encode(order)?;
    let mut table = txn.open_table(ORDERS_TABLE)?;
    table.insert(order.id.as_str(), bytes.as_slice())?;
    Ok(())
}

/// Claim `(date_key, sequence)` and write the row
fn insert_new(txn: &WriteTransaction, order: &Order, sequence: u32) -> StorageResult<()> {
    {
        let orders = txn.open_table(ORDERS_TABLE)?;
        if orders.get(order.id.as_str())?.is_some() {
            return Err(StorageError::DuplicateOrderId(order.id.clone()));
        }
    }
    {
        let mut sequences = txn.open_table(ORDER_SEQUENCES_TABLE)?;
        if sequences.get((order.date_key, sequence))?.is_some() {
            return Err(StorageError::DuplicateOrderId(order.id.clone()));
        }
        sequences.insert((order.date_key, sequence), order.id.as_str())?;
    }
    store_order(txn, order)
}

/// Remove an order row and its index entries
fn remove_order(txn: &WriteTransaction, id: &str) -> StorageResult<bool> {
    let Some(order) = load_order(txn, id)? else {
        return Ok(false);
    };

    {
        let mut orders = txn.open_table(ORDERS_TABLE)?;
        orders.remove(id)?;
    }
    if let Ok(seq) = sequence_of(id) {
        let mut sequences = txn.open_table(ORDER_SEQUENCES_TABLE)?;
        sequences.remove((order.date_key, seq))?;
    }
    if let Some(q) = order.queue_number {
        let mut queue = txn.open_table(QUEUE_NUMBERS_TABLE)?;
        queue.remove((order.date_key, q))?;
    }
    Ok(true)
}

#[async_trait]
impl OrderStore for OrderStorage {
    async fn insert_order(&self, order: &Order) -> StorageResult<()> {
        let order = order.clone();
        self.db
            .run(move |db| {
                let seq = sequence_of(&order.id)?;
                let write_txn = db.begin_write()?;
                insert_new(&write_txn, &order, seq)?;
                write_txn.commit()?;
                Ok(())
            })
            .await
    }

    async fn insert_with_next_sequence(&self, mut draft: Order) -> StorageResult<Order> {
        self.db
            .run(move |db| {
                let write_txn = db.begin_write()?;
                let sequence = {
                    let sequences = write_txn.open_table(ORDER_SEQUENCES_TABLE)?;
                    next_sequence(&sequences, draft.date_key)?
                };

                let (day, month) = decode_date_key(draft.date_key);
                draft.id = generate_order_id(day, month, sequence).map_err(|e| {
                    if e.is_sequence_exhausted() {
                        StorageError::SequenceExhausted(draft.date_key)
                    } else {
                        StorageError::InvalidOrderId(e.to_string())
                    }
                })?;

                insert_new(&write_txn, &draft, sequence)?;
                write_txn.commit()?;
                Ok(draft)
            })
            .await
    }

    async fn get_order(&self, id: &str) -> StorageResult<Option<Order>> {
        let id = id.to_string();
        self.db
            .run(move |db| {
                let read_txn = db.begin_read()?;
                let table = read_txn.open_table(ORDERS_TABLE)?;
                let bytes = table.get(id.as_str())?.map(|guard| guard.value().to_vec());
                bytes.as_deref().map(decode).transpose()
            })
            .await
    }

    async fn get_orders_by_status(&self, status: OrderStatus) -> StorageResult<Vec<Order>> {
        self.scan_orders(move |order| order.status == status).await
    }

    async fn list_orders(&self) -> StorageResult<Vec<Order>> {
        self.scan_orders(|_| true).await
    }

    async fn max_sequence_for_date(&self, date_key: u32) -> StorageResult<Option<u32>> {
        self.db
            .run(move |db| {
                let read_txn = db.begin_read()?;
                let table = read_txn.open_table(ORDER_SEQUENCES_TABLE)?;
                max_in_date(&table, date_key)
            })
            .await
    }

    async fn max_queue_number_for_date(&self, date_key: u32) -> StorageResult<Option<u32>> {
        self.db
            .run(move |db| {
                let read_txn = db.begin_read()?;
                let table = read_txn.open_table(QUEUE_NUMBERS_TABLE)?;
                max_in_date(&table, date_key)
            })
            .await
    }

    async fn conditional_update_status(
        &self,
        id: &str,
        from: OrderStatus,
        to: OrderStatus,
        patch: StatusPatch,
    ) -> StorageResult<u64> {
        let id = id.to_string();
        self.db
            .run(move |db| {
                let write_txn = db.begin_write()?;
                let mut order = match load_order(&write_txn, &id)? {
                    Some(order) if order.status == from => order,
                    // 不存在或状态已变：放弃事务（drop 即 abort）
                    _ => return Ok(0),
                };

                if patch.assign_queue_number {
                    let mut queue = write_txn.open_table(QUEUE_NUMBERS_TABLE)?;
                    let q = next_queue_number(&queue, order.date_key)?;
                    queue.insert((order.date_key, q), id.as_str())?;
                    order.queue_number = Some(q);
                }

                order.status = to;
                patch.apply(&mut order);
                store_order(&write_txn, &order)?;
                write_txn.commit()?;
                Ok(1)
            })
            .await
    }

    async fn bulk_expire(&self, cutoff: i64) -> StorageResult<u64> {
        self.db
            .run(move |db| {
                let write_txn = db.begin_write()?;
                let expired: Vec<Order> = {
                    let table = write_txn.open_table(ORDERS_TABLE)?;
                    let mut expired = Vec::new();
                    for entry in table.iter()? {
                        let (_, value) = entry?;
                        let order = decode(value.value())?;
                        if order.status == OrderStatus::PendingPayment && order.created_at < cutoff
                        {
                            expired.push(order);
                        }
                    }
                    expired
                };

                let count = expired.len() as u64;
                for mut order in expired {
                    order.status = OrderStatus::Cancelled;
                    store_order(&write_txn, &order)?;
                }
                write_txn.commit()?;
                Ok(count)
            })
            .await
    }

    async fn delete_orders(&self, ids: &[String]) -> StorageResult<u64> {
        let ids = ids.to_vec();
        self.db
            .run(move |db| {
                let write_txn = db.begin_write()?;
                let mut deleted = 0;
                for id in &ids {
                    if remove_order(&write_txn, id)? {
                        deleted += 1;
                    }
                }
                write_txn.commit()?;
                Ok(deleted)
            })
            .await
    }

    async fn delete_all_orders(&self) -> StorageResult<u64> {
        self.db
            .run(|db| {
                let write_txn = db.begin_write()?;
                let count = {
                    let orders = write_txn.open_table(ORDERS_TABLE)?;
                    orders.len()?
                };
                write_txn.delete_table(ORDERS_TABLE)?;
                write_txn.delete_table(ORDER_SEQUENCES_TABLE)?;
                write_txn.delete_table(QUEUE_NUMBERS_TABLE)?;
                // 重建空表，后续读事务依赖表存在
                let _ = write_txn.open_table(ORDERS_TABLE)?;
                let _ = write_txn.open_table(ORDER_SEQUENCES_TABLE)?;
                let _ = write_txn.open_table(QUEUE_NUMBERS_TABLE)?;
                write_txn.commit()?;
                Ok(count)
            })
            .await
    }

    async fn ping(&self) -> StorageResult<()> {
        self.db.ping().await
    }
}
