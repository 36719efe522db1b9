//! 应用主结构 - 编排层
//!
//! ## 职责
//!
//! 1. **应用初始化**：打开历史存储、创建分类器
//! 2. **命令调度**：classify / history / erase
//! 3. **结果输出**：打印表格、按需导出 CSV
//!
//! 不处理单个用例的细节，全部委托给 `BatchClassifier` 与各业务服务。

use anyhow::{Context, Result};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::mpsc;
use tracing::{info, warn};

use crate::config::Config;
use crate::error::{AppError, ExportError};
use crate::infrastructure::{build_classifier, Classifier, HistoryStore, JsonFileHistoryStore};
use crate::models::{load_csv_texts, ClassificationResult, DateFilter, HistoryRecord, UserId};
use crate::orchestrator::batch_classifier::BatchClassifier;
use crate::services::{
    export_history, export_results, normalize_rows, normalize_text, HistoryEraser, HistoryReader,
    LoadOutcome,
};
use crate::utils::logging::{log_persistence_report, log_startup, truncate_text};

/// 分类输入
#[derive(Debug, Clone)]
pub enum ClassifyInput {
    /// 逗号分隔的文本
    Text(String),
    /// CSV 文件路径
    Csv(PathBuf),
}

/// 历史查看方式
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HistoryScope {
    /// 加载前 N 页
    Pages(usize),
    /// 一直加载到没有下一页
    All,
}

/// 应用主结构
pub struct App {
    config: Config,
    store: Arc<dyn HistoryStore>,
    classifier: Arc<dyn Classifier>,
}

impl App {
    /// 初始化应用
    pub async fn initialize(config: Config) -> Result<Self> {
        config.validate().map_err(AppError::from)?;
        log_startup(&config);

        let store = JsonFileHistoryStore::open(&config.history_file)
            .await
            .map_err(AppError::from)?;
        let classifier = build_classifier(&config).context("创建分类器失败")?;

        Ok(Self::with_parts(config, Arc::new(store), classifier))
    }

    /// 使用现成的存储和分类器组装应用
    pub fn with_parts(
        config: Config,
        store: Arc<dyn HistoryStore>,
        classifier: Arc<dyn Classifier>,
    ) -> Self {
        Self {
            config,
            store,
            classifier,
        }
    }

    /// 分类一批用例，打印结果并等待历史保存完成
    pub async fn classify(
        &self,
        user_id: &UserId,
        input: ClassifyInput,
        export: Option<&Path>,
    ) -> Result<Vec<ClassificationResult>> {
        let cases = match input {
            ClassifyInput::Text(text) => normalize_text(&text),
            ClassifyInput::Csv(path) => {
                info!("📁 读取 CSV 文件: {}", path.display());
                let rows = load_csv_texts(&path).await.map_err(AppError::from)?;
                normalize_rows(&rows)
            }
        }
        .map_err(AppError::from)?;

        let (tx, mut rx) = mpsc::unbounded_channel();
        let batch = BatchClassifier::new(
            Arc::clone(&self.classifier),
            Arc::clone(&self.store),
            &self.config,
        )
        .with_reports(tx);

        let results = batch.classify_batch(user_id, &cases).await;
        drop(batch);

        print_results(&results);

        let exported = export.map(|path| export_results(path, &results));

        // 进程即将退出，导出失败也要先等后台保存完成
        match rx.recv().await {
            Some(report) => log_persistence_report(&report),
            None => warn!("⚠️ 未收到历史保存报告"),
        }

        if let Some(exported) = exported {
            exported.map_err(AppError::from)?;
        }
        Ok(results)
    }

    /// 分页查看历史
    pub async fn history(
        &self,
        user_id: &UserId,
        date: Option<&str>,
        scope: HistoryScope,
        export: Option<&Path>,
    ) -> Result<Vec<HistoryRecord>> {
        let filter = date
            .map(DateFilter::parse_local_day)
            .transpose()
            .map_err(AppError::from)?;

        let reader = HistoryReader::new(Arc::clone(&self.store), self.config.page_size);
        let records = match scope {
            HistoryScope::All => reader
                .load_all(user_id, filter)
                .await
                .map_err(AppError::from)?,
            HistoryScope::Pages(pages) => {
                let mut outcome = reader
                    .load_first_page(user_id, filter)
                    .await
                    .map_err(AppError::from)?;
                for _ in 1..pages {
                    if !matches!(outcome, LoadOutcome::Applied { has_more: true, .. }) {
                        break;
                    }
                    outcome = reader.load_more().await.map_err(AppError::from)?;
                }
                reader.records()
            }
        };

        print_history(&records, reader.has_more());

        if let Some(path) = export {
            match export_history(path, &records) {
                Ok(_) => {}
                Err(ExportError::NoData) => warn!("⚠️ 没有可导出的历史记录"),
                Err(e) => return Err(AppError::from(e).into()),
            }
        }

        Ok(records)
    }

    /// 删除用户的全部历史
    pub async fn erase(&self, user_id: &UserId, skip_confirm: bool) -> Result<usize> {
        if !skip_confirm && !confirm(&format!("确定要删除用户 {} 的全部历史记录吗？", user_id)).await? {
            info!("已取消删除");
            return Ok(0);
        }

        let eraser = HistoryEraser::new(Arc::clone(&self.store));
        let deleted = eraser
            .erase_all(user_id, None)
            .await
            .map_err(AppError::from)?;
        println!("已删除 {} 条历史记录", deleted);
        Ok(deleted)
    }
}

/// 终端确认，只有输入 y / yes 才继续
async fn confirm(prompt: &str) -> Result<bool> {
    println!("{} [y/N]", prompt);
    let mut line = String::new();
    BufReader::new(tokio::io::stdin())
        .read_line(&mut line)
        .await
        .context("读取确认输入失败")?;
    Ok(matches!(line.trim().to_ascii_lowercase().as_str(), "y" | "yes"))
}

fn print_results(results: &[ClassificationResult]) {
    println!("\n{:<60} | Prediction", "Test Case");
    println!("{}", "-".repeat(80));
    for result in results {
        println!(
            "{:<60} | {}",
            truncate_text(&result.text, 57),
            result.prediction
        );
    }
}

fn print_history(records: &[HistoryRecord], has_more: bool) {
    if records.is_empty() {
        println!("没有历史记录");
        return;
    }
    println!("\n{:<19} | {:<50} | Prediction", "Date", "Test Case");
    println!("{}", "-".repeat(90));
    for record in records {
        println!(
            "{:<19} | {:<50} | {}",
            record.local_date(),
            truncate_text(&record.text, 47),
            record.prediction
        );
    }
    if has_more {
        println!("... 还有更多记录，使用 --pages 或 --all 继续加载");
    }
}
