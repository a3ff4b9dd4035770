//! Per-date counters
//!
//! 两个独立计数器，都是 `max(existing) + 1`，不在进程内保存任何状态。
//! 只在 redb 写事务内部调用：写事务互斥，读最大值和写入新号之间不会有其他写者插入，
//! 因此并发调用方拿到的号码必然不同，无需重试。

use redb::ReadableTable;

use crate::db::StorageResult;

/// Highest second component among keys `(date_key, _)`
pub(crate) fn max_in_date<T>(table: &T, date_key: u32) -> StorageResult<Option<u32>>
where
    T: ReadableTable<(u32, u32), &'static str>,
{
    let last = table.range((date_key, 0)..=(date_key, u32::MAX))?.next_back();
    match last {
        Some(entry) => {
            let (key, _) = entry?;
            Ok(Some(key.value().1))
        }
        None => Ok(None),
    }
}

/// Counter value following `max`, starting at 1
pub fn next_after(max: Option<u32>) -> u32 {
    max.map_or(1, |m| m.saturating_add(1))
}

/// Next order sequence for `date_key` (table: `order_sequences`)
pub(crate) fn next_sequence<T>(sequences: &T, date_key: u32) -> StorageResult<u32>
where
    T: ReadableTable<(u32, u32), &'static str>,
{
    Ok(next_after(max_in_date(sequences, date_key)?))
}

/// Next queue number for `date_key` (table: `queue_numbers`)
pub(crate) fn next_queue_number<T>(queue: &T, date_key: u32) -> StorageResult<u32>
where
    T: ReadableTable<(u32, u32), &'static str>,
{
    Ok(next_after(max_in_date(queue, date_key)?))
}
