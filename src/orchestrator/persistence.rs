//! 分类结果持久化
//!
//! 在分类结果返回之后，以独立任务的方式写入历史。
//! 写入失败只通过报告通道和日志反映，不会改变已返回的分类结果，也不重试。

use futures::future::join_all;
use std::sync::Arc;
use tokio::sync::mpsc::UnboundedSender;
use tokio::task::JoinHandle;
use tracing::{error, info, warn};

use crate::error::StoreError;
use crate::infrastructure::HistoryStore;
use crate::models::{ClassificationResult, HistoryRecord, NewRecord, UserId};

/// 单条写入失败
#[derive(Debug, Clone)]
pub struct PersistenceFailure {
    /// 在批次结果中的下标
    pub index: usize,
    pub text: String,
    pub error: StoreError,
}

/// 一个批次的持久化报告
#[derive(Debug, Clone)]
pub struct PersistenceReport {
    pub user_id: UserId,
    pub batch_id: String,
    /// 尝试写入的数量
    pub attempted: usize,
    /// 按策略跳过的数量（错误哨兵且配置为不保存）
    pub skipped: usize,
    pub saved: Vec<HistoryRecord>,
    pub failures: Vec<PersistenceFailure>,
}

impl PersistenceReport {
    /// 所有尝试的写入都成功
    pub fn is_complete(&self) -> bool {
        self.failures.is_empty()
    }
}

/// 持久化策略
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PersistencePolicy {
    /// 错误哨兵结果是否也写入历史
    pub persist_failed_predictions: bool,
}

impl Default for PersistencePolicy {
    fn default() -> Self {
        Self {
            persist_failed_predictions: true,
        }
    }
}

/// 并发写入一个批次的结果
pub async fn persist_results(
    store: &dyn HistoryStore,
    user_id: &UserId,
    batch_id: &str,
    results: &[ClassificationResult],
    policy: PersistencePolicy,
) -> PersistenceReport {
    let selected: Vec<(usize, &ClassificationResult)> = results
        .iter()
        .enumerate()
        .filter(|(_, r)| policy.persist_failed_predictions || !r.prediction.is_error())
        .collect();
    let skipped = results.len() - selected.len();

    let outcomes = join_all(selected.iter().map(|(_, result)| {
        store.append(
            user_id,
            NewRecord {
                text: result.text.clone(),
                prediction: result.prediction.to_string(),
            },
        )
    }))
    .await;

    let mut saved = Vec::new();
    let mut failures = Vec::new();
    for ((index, result), outcome) in selected.into_iter().zip(outcomes) {
        match outcome {
            Ok(record) => saved.push(record),
            Err(e) => failures.push(PersistenceFailure {
                index,
                text: result.text.clone(),
                error: e,
            }),
        }
    }

    PersistenceReport {
        user_id: user_id.clone(),
        batch_id: batch_id.to_string(),
        attempted: results.len() - skipped,
        skipped,
        saved,
        failures,
    }
}

/// 启动独立的持久化任务
///
/// 调用方无需等待；结果写入日志，并在提供了通道时发送报告。
pub fn spawn_persistence(
    store: Arc<dyn HistoryStore>,
    user_id: UserId,
    batch_id: String,
    results: Vec<ClassificationResult>,
    policy: PersistencePolicy,
    reports: Option<UnboundedSender<PersistenceReport>>,
) -> JoinHandle<PersistenceReport> {
    tokio::spawn(async move {
        let report = persist_results(store.as_ref(), &user_id, &batch_id, &results, policy).await;

        if report.is_complete() {
            info!(
                "[批次 {}] 💾 已保存 {} 条历史记录 (跳过 {} 条)",
                batch_id,
                report.saved.len(),
                report.skipped
            );
        } else {
            for failure in &report.failures {
                warn!(
                    "[批次 {}] 第 {} 条保存失败: {}",
                    batch_id,
                    failure.index + 1,
                    failure.error
                );
            }
            error!(
                "[批次 {}] ❌ 历史保存不完整: 成功 {}/{}",
                batch_id,
                report.saved.len(),
                report.attempted
            );
        }

        if let Some(tx) = reports {
            if tx.send(report.clone()).is_err() {
                warn!("[批次 {}] 持久化报告接收端已关闭", batch_id);
            }
        }

        report
    })
}
