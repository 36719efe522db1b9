//! 分类结果
//!
//! 每个输入用例对应一个结果，按下标一一对应（重复文本不会被合并）

use serde::{Deserialize, Serialize};
use std::fmt::Display;

use crate::error::ClassificationError;

/// 默认标签集合
pub const DEFAULT_LABELS: [&str; 4] = ["Functional", "Performance", "Usability", "Security"];

const NO_PREDICTION: &str = "No prediction";
const API_FAILED: &str = "Error: API failed";
const FETCH_FAILED: &str = "Error: Fetch failed";

/// 预测值
///
/// 除模型标签外，还有三种哨兵值。两种错误哨兵对用户显示的文本不同，
/// 同时保留了原始错误信息用于日志。
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Prediction {
    /// 模型返回的标签
    Label(String),
    /// 调用成功但没有可用标签
    NoPrediction,
    /// 远端返回非成功状态
    ApiFailed { status: u16 },
    /// 调用没有完成
    FetchFailed { reason: String },
}

impl Prediction {
    /// 展示给用户、写入历史的文本
    pub fn as_str(&self) -> &str {
        match self {
            Prediction::Label(label) => label,
            Prediction::NoPrediction => NO_PREDICTION,
            Prediction::ApiFailed { .. } => API_FAILED,
            Prediction::FetchFailed { .. } => FETCH_FAILED,
        }
    }

    /// 是否为错误哨兵
    pub fn is_error(&self) -> bool {
        matches!(
            self,
            Prediction::ApiFailed { .. } | Prediction::FetchFailed { .. }
        )
    }

    pub fn label(&self) -> Option<&str> {
        match self {
            Prediction::Label(label) => Some(label),
            _ => None,
        }
    }
}

impl From<Result<Option<String>, ClassificationError>> for Prediction {
    fn from(outcome: Result<Option<String>, ClassificationError>) -> Self {
        match outcome {
            // 空字符串和缺失标签一样处理
            Ok(Some(label)) if !label.is_empty() => Prediction::Label(label),
            Ok(_) => Prediction::NoPrediction,
            Err(ClassificationError::RemoteRejected { status }) => Prediction::ApiFailed { status },
            Err(ClassificationError::TransportFailure { reason }) => {
                Prediction::FetchFailed { reason }
            }
        }
    }
}

impl Display for Prediction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// 单个用例的分类结果，创建后不再修改
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClassificationResult {
    pub text: String,
    pub prediction: Prediction,
}

impl ClassificationResult {
    pub fn new(text: impl Into<String>, prediction: Prediction) -> Self {
        Self {
            text: text.into(),
            prediction,
        }
    }
}

/// 导出和展示用的扁平结构
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResultRow {
    #[serde(rename = "Test Case")]
    pub text: String,
    #[serde(rename = "Prediction")]
    pub prediction: String,
}

impl From<&ClassificationResult> for ResultRow {
    fn from(result: &ClassificationResult) -> Self {
        Self {
            text: result.text.clone(),
            prediction: result.prediction.to_string(),
        }
    }
}
