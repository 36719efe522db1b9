//! 分页历史读取器 - 业务能力层
//!
//! 状态机：`Idle -> Loading -> Loaded -> LoadingMore -> Loaded`
//!
//! ## 并发约定
//!
//! - 状态由一个互斥锁保护，锁从不跨 `.await` 持有
//! - 每次加载都会记录当时的"代数"，响应回来时代数已变化则丢弃
//!   （被新的 `load_first_page`、`set_filter` 或 `clear` 取代）
//! - 同一时间只允许一个加载；加载中调用 `load_more` 返回 `Busy`
//! - 记录顺序完全以存储为准，这里只做拼接，不重新排序

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tracing::{debug, info, warn};

use crate::error::ReaderError;
use crate::infrastructure::HistoryStore;
use crate::models::{DateFilter, HistoryRecord, PageCursor, PageQuery, UserId};

/// 读取器所处阶段
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReaderPhase {
    Idle,
    Loading,
    Loaded,
    LoadingMore,
}

/// 一次加载的结果
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadOutcome {
    /// 已应用到当前状态
    Applied { fetched: usize, has_more: bool },
    /// 没有下一页，未发起请求
    NoMore,
    /// 响应到达时已被更新的请求取代，已丢弃
    Superseded,
}

/// 查询范围：(用户, 过滤条件)
#[derive(Debug, Clone, PartialEq, Eq)]
struct Scope {
    user_id: UserId,
    filter: Option<DateFilter>,
}

#[derive(Debug)]
struct ReaderState {
    phase: ReaderPhase,
    generation: u64,
    /// 调用方最近要求的范围
    requested: Option<Scope>,
    /// 当前 records / cursor 所属的范围
    loaded: Option<Scope>,
    records: Vec<HistoryRecord>,
    cursor: Option<PageCursor>,
}

impl ReaderState {
    fn settled_phase(&self) -> ReaderPhase {
        if self.loaded.is_some() {
            ReaderPhase::Loaded
        } else {
            ReaderPhase::Idle
        }
    }
}

/// 分页历史读取器
///
/// 每个用户上下文一个实例，通过 `&self` 共享。
pub struct HistoryReader {
    store: Arc<dyn HistoryStore>,
    page_size: usize,
    state: Mutex<ReaderState>,
}

impl HistoryReader {
    pub fn new(store: Arc<dyn HistoryStore>, page_size: usize) -> Self {
        Self {
            store,
            page_size: page_size.max(1),
            state: Mutex::new(ReaderState {
                phase: ReaderPhase::Idle,
                generation: 0,
                requested: None,
                loaded: None,
                records: Vec::new(),
                cursor: None,
            }),
        }
    }

    fn lock(&self) -> MutexGuard<'_, ReaderState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// 加载第一页
    ///
    /// 丢弃旧游标，成功后用返回的记录替换已加载的集合。
    /// 失败时已加载的数据保持不变。会取代任何进行中的加载。
    pub async fn load_first_page(
        &self,
        user_id: &UserId,
        filter: Option<DateFilter>,
    ) -> Result<LoadOutcome, ReaderError> {
        let scope = Scope {
            user_id: user_id.clone(),
            filter,
        };

        let generation = {
            let mut state = self.lock();
            state.generation += 1;
            state.requested = Some(scope.clone());
            state.phase = ReaderPhase::Loading;
            state.generation
        };

        debug!("加载第一页 (用户: {}, 代数: {})", user_id, generation);

        let query = PageQuery {
            filter,
            page_size: self.page_size,
            after: None,
        };
        let result = self.store.query_page(user_id, &query).await;

        let mut state = self.lock();
        if state.generation != generation {
            debug!("第一页响应已被取代，丢弃 (代数: {})", generation);
            return Ok(LoadOutcome::Superseded);
        }

        match result {
            Ok(page) => {
                let fetched = page.records.len();
                let has_more = page.next_cursor.is_some();
                state.records = page.records;
                state.cursor = page.next_cursor;
                state.loaded = Some(scope);
                state.phase = ReaderPhase::Loaded;
                info!("✓ 已加载第一页: {} 条记录", fetched);
                Ok(LoadOutcome::Applied { fetched, has_more })
            }
            Err(e) => {
                state.phase = state.settled_phase();
                warn!("加载第一页失败: {}", e);
                Err(e.into())
            }
        }
    }

    /// 加载下一页并追加到已加载的集合
    ///
    /// - 过滤条件变化后、重新加载第一页前调用 -> `StaleCursor`
    /// - 加载进行中 -> `Busy`
    /// - 没有下一页 -> `NoMore`，不发起请求
    pub async fn load_more(&self) -> Result<LoadOutcome, ReaderError> {
        let (generation, scope, cursor) = {
            let mut state = self.lock();

            if matches!(state.phase, ReaderPhase::Loading | ReaderPhase::LoadingMore) {
                return Err(ReaderError::Busy);
            }
            if state.requested != state.loaded {
                return Err(ReaderError::StaleCursor);
            }
            let (Some(scope), Some(cursor)) = (state.loaded.clone(), state.cursor.clone()) else {
                return Ok(LoadOutcome::NoMore);
            };
            if !cursor.is_valid_for(&scope.user_id, scope.filter.as_ref()) {
                return Err(ReaderError::StaleCursor);
            }

            state.generation += 1;
            state.phase = ReaderPhase::LoadingMore;
            (state.generation, scope, cursor)
        };

        debug!("加载下一页 (用户: {}, 代数: {})", scope.user_id, generation);

        let query = PageQuery {
            filter: scope.filter,
            page_size: self.page_size,
            after: Some(cursor),
        };
        let result = self.store.query_page(&scope.user_id, &query).await;

        let mut state = self.lock();
        if state.generation != generation {
            debug!("下一页响应已被取代，丢弃 (代数: {})", generation);
            return Ok(LoadOutcome::Superseded);
        }

        match result {
            Ok(page) => {
                let fetched = page.records.len();
                let has_more = page.next_cursor.is_some();
                state.records.extend(page.records);
                state.cursor = page.next_cursor;
                state.phase = ReaderPhase::Loaded;
                info!(
                    "✓ 已加载下一页: {} 条记录 (累计 {} 条)",
                    fetched,
                    state.records.len()
                );
                Ok(LoadOutcome::Applied { fetched, has_more })
            }
            Err(e) => {
                // 游标和已加载记录保持原样，可以直接重试
                state.phase = ReaderPhase::Loaded;
                warn!("加载下一页失败: {}", e);
                Err(e.into())
            }
        }
    }

    /// 修改过滤条件
    ///
    /// 旧游标和已加载的记录一并丢弃，进行中的加载结果也会被丢弃；
    /// 即使之后改回原来的过滤条件，也要先调用 `load_first_page` 才能继续分页。
    pub fn set_filter(&self, filter: Option<DateFilter>) {
        let mut state = self.lock();
        let Some(requested) = state.requested.as_mut() else {
            return;
        };
        if requested.filter == filter {
            return;
        }
        requested.filter = filter;
        state.loaded = None;
        state.cursor = None;
        state.records.clear();
        state.generation += 1;
        state.phase = ReaderPhase::Idle;
        debug!("过滤条件已变更，游标失效");
    }

    /// 清空已加载的记录（批量删除成功后调用）
    pub fn clear(&self) {
        let mut state = self.lock();
        state.generation += 1;
        state.records.clear();
        state.cursor = None;
        state.phase = state.settled_phase();
    }

    /// 加载第一页后一直加载到没有下一页为止
    pub async fn load_all(
        &self,
        user_id: &UserId,
        filter: Option<DateFilter>,
    ) -> Result<Vec<HistoryRecord>, ReaderError> {
        let mut outcome = self.load_first_page(user_id, filter).await?;
        while let LoadOutcome::Applied { has_more: true, .. } = outcome {
            outcome = self.load_more().await?;
        }
        Ok(self.records())
    }

    /// 已加载记录的拷贝
    pub fn records(&self) -> Vec<HistoryRecord> {
        self.lock().records.clone()
    }

    pub fn phase(&self) -> ReaderPhase {
        self.lock().phase
    }

    /// 是否还有下一页
    pub fn has_more(&self) -> bool {
        self.lock().cursor.is_some()
    }

    /// 当前游标（可序列化保存）
    pub fn cursor(&self) -> Option<PageCursor> {
        self.lock().cursor.clone()
    }
}
