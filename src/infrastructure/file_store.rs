//! JSON 文件历史存储
//!
//! 在内存存储外包一层：启动时读取快照，每次变更后整体写回文件。
//! 写文件失败时回滚内存中的变更，保证两边一致。

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use tokio::fs;
use tokio::sync::{Mutex, MutexGuard};
use tracing::{debug, info, warn};

use crate::error::{FileError, StoreError};
use crate::infrastructure::history_store::HistoryStore;
use crate::infrastructure::memory_store::MemoryHistoryStore;
use crate::models::{HistoryRecord, NewRecord, Page, PageQuery, RecordId, UserId};

#[derive(Debug, Default, Serialize, Deserialize)]
struct Snapshot {
    users: HashMap<UserId, Vec<HistoryRecord>>,
}

/// JSON 文件历史存储
pub struct JsonFileHistoryStore {
    path: PathBuf,
    inner: MemoryHistoryStore,
    /// 串行化文件写入
    write_lock: Mutex<()>,
}

impl JsonFileHistoryStore {
    /// 打开历史文件，文件不存在时从空历史开始
    pub async fn open(path: impl AsRef<Path>) -> Result<Self, FileError> {
        let path = path.as_ref().to_path_buf();
        let path_str = path.display().to_string();
        let inner = MemoryHistoryStore::new();

        match fs::read(&path).await {
            Ok(content) => {
                let snapshot: Snapshot =
                    serde_json::from_slice(&content).map_err(|e| FileError::JsonParseFailed {
                        path: path_str.clone(),
                        source: e,
                    })?;
                let total: usize = snapshot.users.values().map(Vec::len).sum();
                inner.restore(snapshot.users);
                info!("📂 已加载历史文件 {} ({} 条记录)", path_str, total);
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                info!("📂 历史文件 {} 不存在，从空历史开始", path_str);
            }
            Err(e) => {
                return Err(FileError::ReadFailed {
                    path: path_str,
                    source: e,
                })
            }
        }

        Ok(Self {
            path,
            inner,
            write_lock: Mutex::new(()),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// 把当前内存状态写回文件
    ///
    /// 调用方持有写锁，变更、写文件和回滚在同一把锁内完成。
    async fn save(&self, _guard: &MutexGuard<'_, ()>) -> Result<(), String> {
        let snapshot = Snapshot {
            users: self.inner.snapshot(),
        };
        let content = serde_json::to_vec_pretty(&snapshot).map_err(|e| e.to_string())?;

        // 先写临时文件再改名，避免写一半的文件
        let tmp_path = self.path.with_extension("json.tmp");
        fs::write(&tmp_path, content)
            .await
            .map_err(|e| format!("写入 {} 失败: {}", tmp_path.display(), e))?;
        fs::rename(&tmp_path, &self.path)
            .await
            .map_err(|e| format!("重命名为 {} 失败: {}", self.path.display(), e))?;

        debug!("历史文件已保存: {}", self.path.display());
        Ok(())
    }
}

#[async_trait]
impl HistoryStore for JsonFileHistoryStore {
    async fn append(
        &self,
        user_id: &UserId,
        record: NewRecord,
    ) -> Result<HistoryRecord, StoreError> {
        let guard = self.write_lock.lock().await;
        let stored = self.inner.append(user_id, record).await?;
        if let Err(reason) = self.save(&guard).await {
            warn!("保存历史文件失败，回滚追加: {}", reason);
            self.inner.remove(user_id, &stored.id);
            return Err(StoreError::append(user_id, reason));
        }
        Ok(stored)
    }

    async fn query_page(&self, user_id: &UserId, query: &PageQuery) -> Result<Page, StoreError> {
        self.inner.query_page(user_id, query).await
    }

    async fn list_all(&self, user_id: &UserId) -> Result<Vec<HistoryRecord>, StoreError> {
        self.inner.list_all(user_id).await
    }

    async fn delete(&self, user_id: &UserId, id: &RecordId) -> Result<(), StoreError> {
        let guard = self.write_lock.lock().await;
        let Some(removed) = self.inner.remove(user_id, id) else {
            return Ok(());
        };

        if let Err(reason) = self.save(&guard).await {
            warn!("保存历史文件失败，回滚删除: {}", reason);
            self.inner
                .restore(HashMap::from([(user_id.clone(), vec![removed])]));
            return Err(StoreError::delete(id, reason));
        }
        Ok(())
    }
}
