//! # Test Case Tagger
//!
//! 把测试用例批量发给远程分类服务打标签，并按用户保存可分页浏览的历史记录
//!
//! ## 架构设计
//!
//! 本系统采用严格的四层架构：
//!
//! ### ① 基础设施层（Infrastructure）
//! - `infrastructure/` - 持有外部资源（HTTP 客户端、历史存储），只暴露能力
//! - `Classifier` - 远程分类能力（自建接口 / HuggingFace）
//! - `HistoryStore` - 历史记录的追加、分页查询、删除
//!
//! ### ② 业务能力层（Services）
//! - `services/` - 描述"我能做什么"
//! - `input_normalizer` - 把原始输入变成测试用例并校验
//! - `HistoryReader` - 带游标的分页读取状态机
//! - `HistoryEraser` - 批量删除
//! - `exporter` - CSV 导出
//!
//! ### ③ 流程层（Workflow）
//! - `workflow/` - 定义"一个用例"的完整处理流程
//! - `CaseCtx` - 上下文封装（batch_id + position）
//! - `CaseFlow` - 分类并映射为预测值或错误哨兵
//!
//! ### ④ 编排层（Orchestration）
//! - `orchestrator/batch_classifier` - 批量并发分类，按输入顺序汇合
//! - `orchestrator/persistence` - 结果返回后的后台持久化
//! - `orchestrator/app` - 命令调度
//!
//! ## 模块结构

pub mod cli;
pub mod config;
pub mod error;
pub mod infrastructure;

pub mod models;
pub mod orchestrator;
pub mod services;
pub mod utils;
pub mod workflow;

// 重新导出常用类型
pub use config::{ClassifierBackend, Config};
pub use error::{AppError, AppResult};
pub use infrastructure::{Classifier, HistoryStore, JsonFileHistoryStore, MemoryHistoryStore};
pub use models::{
    ClassificationResult, DateFilter, HistoryRecord, PageCursor, Prediction, TestCase, UserId,
};
pub use orchestrator::{App, BatchClassifier, PersistenceReport};
pub use services::{HistoryEraser, HistoryReader};
pub use workflow::{CaseCtx, CaseFlow};
