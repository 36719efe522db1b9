//! 测试用例
//!
//! 只在一次请求内存在，校验通过后才能被创建

use serde::{Deserialize, Serialize};

/// 测试用例去除首尾空白后的最小字符数
pub const MIN_TEST_CASE_LEN: usize = 10;

/// 原始输入的来源
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum InputSource {
    /// 逗号分隔的文本
    Text,
    /// CSV 文件的 Text 列
    Csv,
}

/// 单个测试用例
///
/// `text` 已经去除首尾空白，且长度不小于 [`MIN_TEST_CASE_LEN`]。
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TestCase {
    text: String,
}

impl TestCase {
    /// 校验并创建测试用例
    ///
    /// 长度按字符计算，不按字节。
    pub fn parse(raw: &str) -> Option<Self> {
        let text = raw.trim();
        if text.chars().count() < MIN_TEST_CASE_LEN {
            return None;
        }
        Some(Self {
            text: text.to_string(),
        })
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn into_text(self) -> String {
        self.text
    }
}
