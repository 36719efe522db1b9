//! 用例分类流程 - 流程层
//!
//! 核心职责：定义"一个用例"的完整处理流程
//!
//! 流程顺序：
//! 1. 调用远程分类器
//! 2. 把结果映射为预测值（标签 / No prediction / 错误哨兵）
//!
//! 任何失败都在这里被吸收为哨兵结果，不会向上抛出。

use std::sync::Arc;
use tracing::{info, warn};

use crate::infrastructure::Classifier;
use crate::models::{ClassificationResult, Prediction, TestCase};
use crate::utils::logging::truncate_text;
use crate::workflow::case_ctx::CaseCtx;

/// 用例分类流程
///
/// - 不持有批次信息，只处理单个用例
/// - 不关心持久化
pub struct CaseFlow {
    classifier: Arc<dyn Classifier>,
    labels: Arc<[String]>,
    verbose_logging: bool,
}

impl CaseFlow {
    pub fn new(classifier: Arc<dyn Classifier>, labels: Arc<[String]>, verbose_logging: bool) -> Self {
        Self {
            classifier,
            labels,
            verbose_logging,
        }
    }

    /// 分类单个用例，总是返回一个结果
    pub async fn run(&self, case: &TestCase, ctx: &CaseCtx) -> ClassificationResult {
        if self.verbose_logging {
            info!("{} 用例: {}", ctx, truncate_text(case.text(), 80));
        }

        let outcome = self.classifier.classify(case.text(), &self.labels).await;
        let prediction = Prediction::from(outcome);

        match &prediction {
            Prediction::Label(label) => info!("{} ✓ 预测: {}", ctx, label),
            Prediction::NoPrediction => warn!("{} ⚠️ 分类服务未返回标签", ctx),
            Prediction::ApiFailed { status } => {
                warn!("{} ❌ 分类服务返回错误状态 {}", ctx, status)
            }
            Prediction::FetchFailed { reason } => warn!("{} ❌ 分类请求失败: {}", ctx, reason),
        }

        ClassificationResult::new(case.text(), prediction)
    }
}
