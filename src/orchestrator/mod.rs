//! 编排层（Orchestration Layer）
//!
//! ## 职责
//!
//! 本层负责批量分发和命令调度，是整个系统的"指挥中心"。
//!
//! ## 模块划分
//!
//! ### `app` - 应用主结构
//! - 管理存储与分类器的生命周期
//! - 调度 classify / history / erase 命令
//! - 输出结果表格、导出 CSV
//!
//! ### `batch_classifier` - 批量分类器
//! - 每个用例一个 tokio 任务，全部并发发出
//! - 按输入顺序汇合结果
//! - 结果返回后启动持久化任务
//!
//! ### `persistence` - 结果持久化
//! - 独立于分类结果的后台写入
//! - 通过报告通道反映写入失败
//!
//! ## 层次关系
//!
//! ```text
//! app (处理命令)
//!     ↓
//! batch_classifier (处理 Vec<TestCase>)
//!     ↓
//! workflow::CaseFlow (处理单个 TestCase)
//!     ↓
//! infrastructure (基础设施：Classifier / HistoryStore)
//! ```

pub mod app;
pub mod batch_classifier;
pub mod persistence;

// 重新导出主要类型
pub use app::{App, ClassifyInput, HistoryScope};
pub use batch_classifier::BatchClassifier;
pub use persistence::{
    persist_results, spawn_persistence, PersistenceFailure, PersistencePolicy, PersistenceReport,
};
