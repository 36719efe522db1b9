//! 历史记录相关类型
//!
//! - `HistoryRecord`：存储中的一条分类记录
//! - `DateFilter`：按日期过滤的闭区间
//! - `PageCursor`：不透明的分页游标，记录"最后看到的位置"

use chrono::{DateTime, Local, NaiveDate, TimeZone, Utc};
use serde::{Deserialize, Serialize};

use crate::error::ValidationError;
use crate::models::identity::{RecordId, UserId};

/// 待写入的记录（id 和时间由存储分配）
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewRecord {
    pub text: String,
    pub prediction: String,
}

/// 存储中的一条历史记录
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HistoryRecord {
    pub id: RecordId,
    pub text: String,
    pub prediction: String,
    pub created_at: DateTime<Utc>,
}

impl HistoryRecord {
    /// 本地时间格式的日期，用于展示和导出
    pub fn local_date(&self) -> String {
        self.created_at
            .with_timezone(&Local)
            .format("%Y-%m-%d %H:%M:%S")
            .to_string()
    }

    /// 排序键：按 (created_at, id) 降序排列
    fn sort_key(&self) -> (DateTime<Utc>, &RecordId) {
        (self.created_at, &self.id)
    }
}

/// 日期过滤区间（闭区间）
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DateFilter {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
}

impl DateFilter {
    /// 某一天在给定时区内的 [00:00:00.000, 23:59:59.999]
    pub fn for_day_in<Tz: TimeZone>(day: NaiveDate, tz: &Tz) -> Result<Self, ValidationError> {
        let invalid = || ValidationError::InvalidDate {
            date: day.to_string(),
        };

        let start_naive = day.and_hms_milli_opt(0, 0, 0, 0).ok_or_else(invalid)?;
        let end_naive = day.and_hms_milli_opt(23, 59, 59, 999).ok_or_else(invalid)?;

        let start = tz
            .from_local_datetime(&start_naive)
            .earliest()
            .ok_or_else(invalid)?;
        let end = tz
            .from_local_datetime(&end_naive)
            .latest()
            .ok_or_else(invalid)?;

        Ok(Self {
            start: start.with_timezone(&Utc),
            end: end.with_timezone(&Utc),
        })
    }

    /// 当地时区的某一天
    pub fn for_local_day(day: NaiveDate) -> Result<Self, ValidationError> {
        Self::for_day_in(day, &Local)
    }

    /// 解析 `YYYY-MM-DD` 并生成当地时区的过滤区间
    pub fn parse_local_day(value: &str) -> Result<Self, ValidationError> {
        let day = NaiveDate::parse_from_str(value.trim(), "%Y-%m-%d").map_err(|_| {
            ValidationError::InvalidDate {
                date: value.to_string(),
            }
        })?;
        Self::for_local_day(day)
    }

    pub fn contains(&self, ts: DateTime<Utc>) -> bool {
        ts >= self.start && ts <= self.end
    }
}

/// 分页游标
///
/// 保存产生它的 (用户, 过滤条件) 以及最后一条记录的位置，
/// 只在同一组合下有效。
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageCursor {
    user_id: UserId,
    filter: Option<DateFilter>,
    last_created_at: DateTime<Utc>,
    last_id: RecordId,
}

impl PageCursor {
    /// 以某条记录为"最后看到的位置"创建游标
    pub fn after(user_id: &UserId, filter: Option<DateFilter>, last: &HistoryRecord) -> Self {
        Self {
            user_id: user_id.clone(),
            filter,
            last_created_at: last.created_at,
            last_id: last.id.clone(),
        }
    }

    /// 游标是否属于这个 (用户, 过滤条件)
    pub fn is_valid_for(&self, user_id: &UserId, filter: Option<&DateFilter>) -> bool {
        &self.user_id == user_id && self.filter.as_ref() == filter
    }

    /// 在降序排列中，记录是否位于游标之后
    pub fn precedes(&self, record: &HistoryRecord) -> bool {
        record.sort_key() < (self.last_created_at, &self.last_id)
    }
}

/// 分页查询参数
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageQuery {
    pub filter: Option<DateFilter>,
    pub page_size: usize,
    pub after: Option<PageCursor>,
}

/// 一页查询结果
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Page {
    /// 按 created_at 降序
    pub records: Vec<HistoryRecord>,
    /// 返回数量少于 page_size 时为 None
    pub next_cursor: Option<PageCursor>,
}

/// 按存储约定的顺序排序：created_at 降序，id 降序作为并列裁决
pub fn sort_newest_first(records: &mut [HistoryRecord]) {
    records.sort_by(|a, b| b.sort_key().cmp(&a.sort_key()));
}
