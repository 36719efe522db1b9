//! 批量分类器 - 编排层
//!
//! ## 职责
//!
//! 1. **并发分发**：每个用例一个任务，全部同时发出，不设并发上限
//! 2. **故障隔离**：单个用例失败只影响它自己的结果
//! 3. **汇合**：等待全部任务完成后，按输入顺序返回结果
//! 4. **持久化**：结果返回后启动独立的持久化任务
//!
//! 结果与输入按下标一一对应，与任务完成顺序无关。

use std::sync::Arc;
use tokio::sync::mpsc::UnboundedSender;
use tracing::error;

use crate::config::Config;
use crate::infrastructure::{Classifier, HistoryStore};
use crate::models::{ClassificationResult, Prediction, TestCase, UserId};
use crate::orchestrator::persistence::{spawn_persistence, PersistencePolicy, PersistenceReport};
use crate::utils::logging::{log_batch_complete, log_batch_start, BatchStats};
use crate::workflow::{CaseCtx, CaseFlow};

/// 批量分类器
pub struct BatchClassifier {
    flow: Arc<CaseFlow>,
    store: Arc<dyn HistoryStore>,
    policy: PersistencePolicy,
    reports: Option<UnboundedSender<PersistenceReport>>,
}

impl BatchClassifier {
    pub fn new(
        classifier: Arc<dyn Classifier>,
        store: Arc<dyn HistoryStore>,
        config: &Config,
    ) -> Self {
        let labels: Arc<[String]> = config.labels.clone().into();
        Self {
            flow: Arc::new(CaseFlow::new(classifier, labels, config.verbose_logging)),
            store,
            policy: PersistencePolicy {
                persist_failed_predictions: config.persist_failed_predictions,
            },
            reports: None,
        }
    }

    /// 设置持久化报告通道
    pub fn with_reports(mut self, reports: UnboundedSender<PersistenceReport>) -> Self {
        self.reports = Some(reports);
        self
    }

    /// 分类一个批次
    ///
    /// 返回与输入等长、同序的结果。持久化在返回前已启动，但不等待其完成。
    pub async fn classify_batch(
        &self,
        user_id: &UserId,
        cases: &[TestCase],
    ) -> Vec<ClassificationResult> {
        if cases.is_empty() {
            return Vec::new();
        }

        let batch_id = short_batch_id();
        let total = cases.len();
        log_batch_start(&batch_id, total);

        // 为每个用例创建并发任务
        let mut handles = Vec::with_capacity(total);
        for (idx, case) in cases.iter().enumerate() {
            let ctx = CaseCtx::new(batch_id.clone(), idx + 1, total);
            let flow = Arc::clone(&self.flow);
            let case = case.clone();

            let handle = tokio::spawn(async move { flow.run(&case, &ctx).await });
            handles.push(handle);
        }

        // 按输入顺序等待所有任务
        let mut results = Vec::with_capacity(total);
        for (case, handle) in cases.iter().zip(handles) {
            let result = match handle.await {
                Ok(result) => result,
                Err(e) => {
                    error!("[批次 {}] 任务执行失败: {}", batch_id, e);
                    ClassificationResult::new(
                        case.text(),
                        Prediction::FetchFailed {
                            reason: format!("任务异常终止: {}", e),
                        },
                    )
                }
            };
            results.push(result);
        }

        log_batch_complete(&batch_id, &BatchStats::from_results(&results));

        spawn_persistence(
            Arc::clone(&self.store),
            user_id.clone(),
            batch_id,
            results.clone(),
            self.policy,
            self.reports.clone(),
        );

        results
    }
}

fn short_batch_id() -> String {
    uuid::Uuid::new_v4().simple().to_string()[..8].to_string()
}
