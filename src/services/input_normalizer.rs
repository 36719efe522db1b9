//! 输入规范化 - 业务能力层
//!
//! 把用户输入（逗号分隔文本或 CSV 的 Text 列）变成校验过的测试用例序列。
//! 纯函数，没有副作用。

use crate::error::ValidationError;
use crate::models::{InputSource, TestCase, MIN_TEST_CASE_LEN};

/// 原始输入
#[derive(Debug, Clone)]
pub enum RawInput<'a> {
    /// 逗号分隔的文本
    Text(&'a str),
    /// CSV 中 Text 列的值
    Rows(&'a [String]),
}

impl RawInput<'_> {
    fn origin(&self) -> InputSource {
        match self {
            RawInput::Text(_) => InputSource::Text,
            RawInput::Rows(_) => InputSource::Csv,
        }
    }
}

/// 规范化并校验输入
///
/// - 文本按 `,` 切分，每段去除空白，丢弃空段
/// - CSV 行丢弃空白值
/// - 结果为空 -> `EmptyInput`
/// - 任意一项过短 -> `TooShort`，报告第一项并拒绝整个批次
pub fn normalize(raw: RawInput<'_>) -> Result<Vec<TestCase>, ValidationError> {
    let origin = raw.origin();
    let items: Vec<&str> = match raw {
        RawInput::Text(text) => text.split(',').map(str::trim).filter(|s| !s.is_empty()).collect(),
        RawInput::Rows(rows) => rows.iter().map(|r| r.trim()).filter(|s| !s.is_empty()).collect(),
    };

    if items.is_empty() {
        return Err(ValidationError::EmptyInput { origin });
    }

    items
        .into_iter()
        .map(|item| {
            TestCase::parse(item).ok_or_else(|| ValidationError::TooShort {
                item: item.to_string(),
                min_len: MIN_TEST_CASE_LEN,
            })
        })
        .collect()
}

/// 逗号分隔文本的便捷入口
pub fn normalize_text(text: &str) -> Result<Vec<TestCase>, ValidationError> {
    normalize(RawInput::Text(text))
}

/// CSV 行的便捷入口
pub fn normalize_rows(rows: &[String]) -> Result<Vec<TestCase>, ValidationError> {
    normalize(RawInput::Rows(rows))
}
