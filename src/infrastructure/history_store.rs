//! 历史存储接口
//!
//! 核心逻辑只依赖这个约定，不依赖具体实现

use async_trait::async_trait;

use crate::error::StoreError;
use crate::models::{HistoryRecord, NewRecord, Page, PageQuery, RecordId, UserId};

/// 按用户划分的、只追加的分类历史存储
#[async_trait]
pub trait HistoryStore: Send + Sync {
    /// 追加一条记录，由存储分配 id 和 created_at
    ///
    /// 同一批次的多次追加并发进行，彼此独立（没有跨记录事务）。
    async fn append(&self, user_id: &UserId, record: NewRecord)
        -> Result<HistoryRecord, StoreError>;

    /// 查询一页记录，按 created_at 降序
    ///
    /// 返回数量少于 `page_size` 时 `next_cursor` 为 `None`。
    async fn query_page(&self, user_id: &UserId, query: &PageQuery) -> Result<Page, StoreError>;

    /// 获取用户当前的全部记录
    async fn list_all(&self, user_id: &UserId) -> Result<Vec<HistoryRecord>, StoreError>;

    /// 删除单条记录，记录不存在时视为成功
    async fn delete(&self, user_id: &UserId, id: &RecordId) -> Result<(), StoreError>;
}
