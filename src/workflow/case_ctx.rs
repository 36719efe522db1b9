//! 用例处理上下文
//!
//! 封装"我正在处理哪个批次的第几个用例"这一信息

use std::fmt::Display;

/// 用例处理上下文
#[derive(Debug, Clone)]
pub struct CaseCtx {
    /// 批次ID（仅用于日志）
    pub batch_id: String,

    /// 用例在批次中的位置（从1开始）
    pub position: usize,

    /// 批次大小
    pub total: usize,
}

impl CaseCtx {
    pub fn new(batch_id: impl Into<String>, position: usize, total: usize) -> Self {
        Self {
            batch_id: batch_id.into(),
            position,
            total,
        }
    }
}

impl Display for CaseCtx {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[批次 {} 用例 {}/{}]", self.batch_id, self.position, self.total)
    }
}
