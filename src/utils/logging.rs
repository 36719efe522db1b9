/// 日志工具模块
///
/// 提供日志初始化、格式化和输出的辅助函数
use tracing::info;
use tracing_subscriber::EnvFilter;

use crate::config::Config;
use crate::models::{ClassificationResult, Prediction};
use crate::orchestrator::persistence::PersistenceReport;

/// 初始化日志
///
/// 优先使用 `RUST_LOG`，未设置时按 `verbose` 选择 debug / info 级别。
/// 重复调用是安全的。
pub fn init(verbose: bool) {
    let default_level = if verbose { "debug" } else { "info" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .try_init();
}

/// 记录程序启动信息
pub fn log_startup(config: &Config) {
    info!("{}", "=".repeat(60));
    info!("🚀 程序启动 - 测试用例分类");
    info!("🔌 分类后端: {:?}", config.classifier_backend);
    info!("🏷️ 候选标签: {}", config.labels.join(", "));
    info!("📁 历史文件: {}", config.history_file);
    info!("{}", "=".repeat(60));
}

/// 记录批次开始信息
pub fn log_batch_start(batch_id: &str, total: usize) {
    info!("\n{}", "=".repeat(60));
    info!("📦 开始分类批次 {}", batch_id);
    info!("📄 本批用例: {} 个，全部并发发出", total);
    info!("{}", "=".repeat(60));
}

/// 批次统计
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct BatchStats {
    pub labeled: usize,
    pub no_prediction: usize,
    pub api_failed: usize,
    pub fetch_failed: usize,
}

impl BatchStats {
    pub fn from_results(results: &[ClassificationResult]) -> Self {
        let mut stats = Self::default();
        for result in results {
            match result.prediction {
                Prediction::Label(_) => stats.labeled += 1,
                Prediction::NoPrediction => stats.no_prediction += 1,
                Prediction::ApiFailed { .. } => stats.api_failed += 1,
                Prediction::FetchFailed { .. } => stats.fetch_failed += 1,
            }
        }
        stats
    }

    pub fn total(&self) -> usize {
        self.labeled + self.no_prediction + self.api_failed + self.fetch_failed
    }
}

/// 记录批次完成信息
pub fn log_batch_complete(batch_id: &str, stats: &BatchStats) {
    info!("\n{}", "─".repeat(60));
    info!(
        "✓ 批次 {} 完成: 成功 {}/{}",
        batch_id,
        stats.labeled,
        stats.total()
    );
    if stats.no_prediction > 0 {
        info!("⚠️ 无预测: {}", stats.no_prediction);
    }
    if stats.api_failed + stats.fetch_failed > 0 {
        info!(
            "❌ 失败: 服务错误 {}，请求失败 {}",
            stats.api_failed, stats.fetch_failed
        );
    }
    info!("{}", "─".repeat(60));
}

/// 打印持久化报告
pub fn log_persistence_report(report: &PersistenceReport) {
    info!("\n{}", "=".repeat(60));
    info!("💾 历史保存统计 (批次 {})", report.batch_id);
    info!("{}", "=".repeat(60));
    info!("✅ 已保存: {}/{}", report.saved.len(), report.attempted);
    if report.skipped > 0 {
        info!("⏭️ 跳过: {}", report.skipped);
    }
    if !report.failures.is_empty() {
        info!("❌ 失败: {}", report.failures.len());
    }
    info!("{}", "=".repeat(60));
}

/// 截断长文本用于日志显示
///
/// # 参数
/// - `text`: 原始文本
/// - `max_len`: 最大长度（字符数）
pub fn truncate_text(text: &str, max_len: usize) -> String {
    if text.chars().count() > max_len {
        text.chars().take(max_len).collect::<String>() + "..."
    } else {
        text.to_string()
    }
}
