//! 内存历史存储
//!
//! 历史存储约定的参考实现：
//! - created_at 在同一个存储内严格递增
//! - 排序为 (created_at 降序, id 降序)
//! - id 为 uuid v4

use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard, PoisonError};

use crate::error::StoreError;
use crate::infrastructure::history_store::HistoryStore;
use crate::models::history::sort_newest_first;
use crate::models::{HistoryRecord, NewRecord, Page, PageCursor, PageQuery, RecordId, UserId};

#[derive(Debug, Default)]
struct MemoryState {
    /// 每个用户的记录，始终按降序排列
    users: HashMap<UserId, Vec<HistoryRecord>>,
    last_stamp: Option<DateTime<Utc>>,
}

impl MemoryState {
    /// 分配一个不早于当前时间、且严格晚于上一次的时间戳
    fn next_stamp(&mut self) -> DateTime<Utc> {
        let now = Utc::now();
        let stamp = match self.last_stamp {
            Some(last) if now <= last => last + Duration::microseconds(1),
            _ => now,
        };
        self.last_stamp = Some(stamp);
        stamp
    }

    fn insert(&mut self, user_id: &UserId, record: HistoryRecord) {
        let records = self.users.entry(user_id.clone()).or_default();
        records.push(record);
        sort_newest_first(records);
    }
}

/// 内存历史存储
#[derive(Debug, Default)]
pub struct MemoryHistoryStore {
    state: Mutex<MemoryState>,
}

impl MemoryHistoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, MemoryState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// 以指定时间写入一条记录（用于导入旧数据和测试）
    pub fn insert_at(
        &self,
        user_id: &UserId,
        record: NewRecord,
        created_at: DateTime<Utc>,
    ) -> HistoryRecord {
        let stored = HistoryRecord {
            id: RecordId::generate(),
            text: record.text,
            prediction: record.prediction,
            created_at,
        };
        let mut state = self.lock();
        if state.last_stamp.map_or(true, |last| created_at > last) {
            state.last_stamp = Some(created_at);
        }
        state.insert(user_id, stored.clone());
        stored
    }

    /// 恢复已有记录（保留原 id 和时间）
    pub fn restore(&self, snapshot: HashMap<UserId, Vec<HistoryRecord>>) {
        let mut state = self.lock();
        for (user_id, records) in snapshot {
            for record in records {
                if state.last_stamp.map_or(true, |last| record.created_at > last) {
                    state.last_stamp = Some(record.created_at);
                }
                state.insert(&user_id, record);
            }
        }
    }

    /// 当前全部数据的拷贝
    pub fn snapshot(&self) -> HashMap<UserId, Vec<HistoryRecord>> {
        self.lock().users.clone()
    }

    /// 按 id 移除一条记录，返回被移除的记录
    pub fn remove(&self, user_id: &UserId, id: &RecordId) -> Option<HistoryRecord> {
        let mut state = self.lock();
        let records = state.users.get_mut(user_id)?;
        let position = records.iter().position(|r| &r.id == id)?;
        Some(records.remove(position))
    }

    /// 用户当前的记录数
    pub fn count(&self, user_id: &UserId) -> usize {
        self.lock().users.get(user_id).map_or(0, Vec::len)
    }
}

#[async_trait]
impl HistoryStore for MemoryHistoryStore {
    async fn append(
        &self,
        user_id: &UserId,
        record: NewRecord,
    ) -> Result<HistoryRecord, StoreError> {
        let mut state = self.lock();
        let stored = HistoryRecord {
            id: RecordId::generate(),
            text: record.text,
            prediction: record.prediction,
            created_at: state.next_stamp(),
        };
        state.insert(user_id, stored.clone());
        Ok(stored)
    }

    async fn query_page(&self, user_id: &UserId, query: &PageQuery) -> Result<Page, StoreError> {
        if query.page_size == 0 {
            return Err(StoreError::query(user_id, "page_size 必须大于 0"));
        }
        if let Some(cursor) = &query.after {
            if !cursor.is_valid_for(user_id, query.filter.as_ref()) {
                return Err(StoreError::query(user_id, "游标与查询条件不匹配"));
            }
        }

        let state = self.lock();
        let records: Vec<HistoryRecord> = state
            .users
            .get(user_id)
            .map(|records| {
                records
                    .iter()
                    .filter(|r| query.filter.map_or(true, |f| f.contains(r.created_at)))
                    .filter(|r| query.after.as_ref().map_or(true, |c| c.precedes(r)))
                    .take(query.page_size)
                    .cloned()
                    .collect()
            })
            .unwrap_or_default();

        let next_cursor = if records.len() < query.page_size {
            None
        } else {
            records
                .last()
                .map(|last| PageCursor::after(user_id, query.filter, last))
        };

        Ok(Page {
            records,
            next_cursor,
        })
    }

    async fn list_all(&self, user_id: &UserId) -> Result<Vec<HistoryRecord>, StoreError> {
        Ok(self.lock().users.get(user_id).cloned().unwrap_or_default())
    }

    async fn delete(&self, user_id: &UserId, id: &RecordId) -> Result<(), StoreError> {
        self.remove(user_id, id);
        Ok(())
    }
}
