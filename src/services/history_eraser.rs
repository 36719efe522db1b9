//! 批量删除 - 业务能力层
//!
//! 获取用户的全部记录，并发删除每一条，所有删除完成后才返回。
//! 任意一条失败都会报告 `PartialEraseFailure`，不自动重试。

use futures::future::join_all;
use std::sync::Arc;
use tracing::{error, info, warn};

use crate::error::EraseError;
use crate::infrastructure::HistoryStore;
use crate::models::UserId;
use crate::services::history_reader::HistoryReader;

/// 批量删除服务
pub struct HistoryEraser {
    store: Arc<dyn HistoryStore>,
}

impl HistoryEraser {
    pub fn new(store: Arc<dyn HistoryStore>) -> Self {
        Self { store }
    }

    /// 删除用户的全部历史记录
    ///
    /// 成功时返回删除数量，并清空读取器中已加载的记录（不重新查询）。
    /// 对空历史调用返回 0。
    pub async fn erase_all(
        &self,
        user_id: &UserId,
        reader: Option<&HistoryReader>,
    ) -> Result<usize, EraseError> {
        let records = self.store.list_all(user_id).await.map_err(|e| {
            error!("获取待删除记录失败: {}", e);
            EraseError::Query(e)
        })?;

        if records.is_empty() {
            info!("用户 {} 没有历史记录，无需删除", user_id);
            if let Some(reader) = reader {
                reader.clear();
            }
            return Ok(0);
        }

        info!("🗑️ 开始删除用户 {} 的 {} 条历史记录", user_id, records.len());

        let outcomes = join_all(
            records
                .iter()
                .map(|record| self.store.delete(user_id, &record.id)),
        )
        .await;

        let mut failed_ids = Vec::new();
        for (record, outcome) in records.iter().zip(outcomes) {
            if let Err(e) = outcome {
                warn!("删除记录 {} 失败: {}", record.id, e);
                failed_ids.push(record.id.clone());
            }
        }

        let deleted = records.len() - failed_ids.len();
        if !failed_ids.is_empty() {
            error!(
                "❌ 批量删除未完成: 成功 {}/{}，失败 {}",
                deleted,
                records.len(),
                failed_ids.len()
            );
            return Err(EraseError::PartialEraseFailure {
                failed_ids,
                deleted,
            });
        }

        if let Some(reader) = reader {
            reader.clear();
        }

        info!("✅ 已删除 {} 条历史记录", deleted);
        Ok(deleted)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infrastructure::MemoryHistoryStore;
    use crate::models::NewRecord;

    #[tokio::test]
    async fn test_erase_twice_is_idempotent() {
        let user = UserId::from("u1");
        let store = Arc::new(MemoryHistoryStore::new());
        for i in 0..4 {
            store
                .append(
                    &user,
                    NewRecord {
                        text: format!("test case number {}", i),
                        prediction: "Security".to_string(),
                    },
                )
                .await
                .unwrap();
        }

        let eraser = HistoryEraser::new(store.clone());
        assert_eq!(eraser.erase_all(&user, None).await.unwrap(), 4);
        assert_eq!(eraser.erase_all(&user, None).await.unwrap(), 0);
        assert_eq!(store.count(&user), 0);
    }

    #[tokio::test]
    async fn test_erase_clears_reader() {
        let user = UserId::from("u1");
        let store = Arc::new(MemoryHistoryStore::new());
        store
            .append(
                &user,
                NewRecord {
                    text: "Login fails when password is empty".to_string(),
                    prediction: "Functional".to_string(),
                },
            )
            .await
            .unwrap();

        let reader = HistoryReader::new(store.clone(), 5);
        reader.load_first_page(&user, None).await.unwrap();
        assert_eq!(reader.records().len(), 1);

        let eraser = HistoryEraser::new(store);
        eraser.erase_all(&user, Some(&reader)).await.unwrap();
        assert!(reader.records().is_empty());
    }
}
