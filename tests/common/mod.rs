//! 集成测试共用的替身实现
#![allow(dead_code)]

use async_trait::async_trait;
use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicBool, AtomicU64, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::Semaphore;

use test_case_tagger::error::{ClassificationError, StoreError};
use test_case_tagger::models::{
    HistoryRecord, NewRecord, Page, PageQuery, RecordId, UserId,
};
use test_case_tagger::{Classifier, HistoryStore, MemoryHistoryStore};

/// 按文本预设延迟和结果的分类器
#[derive(Default)]
pub struct ScriptedClassifier {
    script: HashMap<String, (Duration, Result<Option<String>, ClassificationError>)>,
    calls: AtomicUsize,
}

impl ScriptedClassifier {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn on(
        mut self,
        text: &str,
        delay_ms: u64,
        outcome: Result<Option<String>, ClassificationError>,
    ) -> Self {
        self.script.insert(
            text.to_string(),
            (Duration::from_millis(delay_ms), outcome),
        );
        self
    }

    pub fn label(self, text: &str, delay_ms: u64, label: &str) -> Self {
        self.on(text, delay_ms, Ok(Some(label.to_string())))
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Classifier for ScriptedClassifier {
    async fn classify(
        &self,
        text: &str,
        _labels: &[String],
    ) -> Result<Option<String>, ClassificationError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        match self.script.get(text) {
            Some((delay, outcome)) => {
                tokio::time::sleep(*delay).await;
                outcome.clone()
            }
            None => Ok(None),
        }
    }
}

/// 可注入故障的存储
#[derive(Default)]
pub struct FlakyStore {
    pub inner: MemoryHistoryStore,
    failing_appends: Mutex<HashSet<String>>,
    failing_deletes: Mutex<HashSet<RecordId>>,
    fail_queries: AtomicBool,
    query_calls: AtomicUsize,
    append_delay_ms: AtomicU64,
}

impl FlakyStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// 文本为 `text` 的追加将失败
    pub fn fail_append_of(&self, text: &str) {
        self.failing_appends.lock().unwrap().insert(text.to_string());
    }

    pub fn fail_delete_of(&self, id: &RecordId) {
        self.failing_deletes.lock().unwrap().insert(id.clone());
    }

    /// 每次追加前先等待
    pub fn set_append_delay(&self, delay_ms: u64) {
        self.append_delay_ms.store(delay_ms, Ordering::SeqCst);
    }

    pub fn set_fail_queries(&self, fail: bool) {
        self.fail_queries.store(fail, Ordering::SeqCst);
    }

    pub fn query_calls(&self) -> usize {
        self.query_calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl HistoryStore for FlakyStore {
    async fn append(
        &self,
        user_id: &UserId,
        record: NewRecord,
    ) -> Result<HistoryRecord, StoreError> {
        let delay = self.append_delay_ms.load(Ordering::SeqCst);
        if delay > 0 {
            tokio::time::sleep(Duration::from_millis(delay)).await;
        }
        if self.failing_appends.lock().unwrap().contains(&record.text) {
            return Err(StoreError::append(user_id, "injected append failure"));
        }
        self.inner.append(user_id, record).await
    }

    async fn query_page(&self, user_id: &UserId, query: &PageQuery) -> Result<Page, StoreError> {
        self.query_calls.fetch_add(1, Ordering::SeqCst);
        if self.fail_queries.load(Ordering::SeqCst) {
            return Err(StoreError::query(user_id, "injected query failure"));
        }
        self.inner.query_page(user_id, query).await
    }

    async fn list_all(&self, user_id: &UserId) -> Result<Vec<HistoryRecord>, StoreError> {
        if self.fail_queries.load(Ordering::SeqCst) {
            return Err(StoreError::query(user_id, "injected query failure"));
        }
        self.inner.list_all(user_id).await
    }

    async fn delete(&self, user_id: &UserId, id: &RecordId) -> Result<(), StoreError> {
        if self.failing_deletes.lock().unwrap().contains(id) {
            return Err(StoreError::delete(id, "injected delete failure"));
        }
        self.inner.delete(user_id, id).await
    }
}

/// 查询在放行之前一直挂起的存储
pub struct GatedStore {
    pub inner: MemoryHistoryStore,
    gate: Semaphore,
    waiting: AtomicUsize,
}

impl GatedStore {
    pub fn new() -> Self {
        Self {
            inner: MemoryHistoryStore::new(),
            gate: Semaphore::new(0),
            waiting: AtomicUsize::new(0),
        }
    }

    /// 放行 n 个挂起（或之后到达）的查询
    pub fn release(&self, n: usize) {
        self.gate.add_permits(n);
    }

    /// 等到至少 n 个查询挂在闸门上
    pub async fn wait_for_waiters(&self, n: usize) {
        while self.waiting.load(Ordering::SeqCst) < n {
            tokio::task::yield_now().await;
        }
    }
}

#[async_trait]
impl HistoryStore for GatedStore {
    async fn append(
        &self,
        user_id: &UserId,
        record: NewRecord,
    ) -> Result<HistoryRecord, StoreError> {
        self.inner.append(user_id, record).await
    }

    async fn query_page(&self, user_id: &UserId, query: &PageQuery) -> Result<Page, StoreError> {
        self.waiting.fetch_add(1, Ordering::SeqCst);
        let permit = self
            .gate
            .acquire()
            .await
            .map_err(|e| StoreError::query(user_id, e.to_string()))?;
        permit.forget();
        self.inner.query_page(user_id, query).await
    }

    async fn list_all(&self, user_id: &UserId) -> Result<Vec<HistoryRecord>, StoreError> {
        self.inner.list_all(user_id).await
    }

    async fn delete(&self, user_id: &UserId, id: &RecordId) -> Result<(), StoreError> {
        self.inner.delete(user_id, id).await
    }
}

/// 写入 n 条记录，返回存储分配的记录（按写入顺序）
pub async fn seed(store: &dyn HistoryStore, user: &UserId, n: usize) -> Vec<HistoryRecord> {
    let mut records = Vec::with_capacity(n);
    for i in 0..n {
        let record = store
            .append(
                user,
                NewRecord {
                    text: format!("seeded test case #{:03}", i),
                    prediction: "Functional".to_string(),
                },
            )
            .await
            .unwrap();
        records.push(record);
    }
    records
}

pub fn shared<T: HistoryStore + 'static>(store: T) -> (Arc<T>, Arc<dyn HistoryStore>) {
    let concrete = Arc::new(store);
    let dynamic: Arc<dyn HistoryStore> = concrete.clone();
    (concrete, dynamic)
}
