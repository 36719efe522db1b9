//! 基础设施层
//!
//! 持有远程资源（HTTP 客户端、存储），只暴露能力，不认识批次和分页流程

pub mod classifier;
pub mod file_store;
pub mod history_store;
pub mod http_classifier;
pub mod memory_store;

pub use classifier::{build_classifier, Classifier};
pub use file_store::JsonFileHistoryStore;
pub use history_store::HistoryStore;
pub use http_classifier::{EndpointClassifier, HuggingFaceClassifier};
pub use memory_store::MemoryHistoryStore;
