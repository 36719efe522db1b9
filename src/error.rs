use thiserror::Error;

use crate::models::{InputSource, RecordId, UserId};

/// 应用程序错误类型
#[derive(Debug, Error)]
pub enum AppError {
    /// 输入校验错误
    #[error("输入校验错误: {0}")]
    Validation(#[from] ValidationError),
    /// 存储错误
    #[error("存储错误: {0}")]
    Store(#[from] StoreError),
    /// 历史分页读取错误
    #[error("历史读取错误: {0}")]
    Reader(#[from] ReaderError),
    /// 批量删除错误
    #[error("批量删除错误: {0}")]
    Erase(#[from] EraseError),
    /// 导出错误
    #[error("导出错误: {0}")]
    Export(#[from] ExportError),
    /// 文件操作错误
    #[error("文件错误: {0}")]
    File(#[from] FileError),
    /// 配置错误
    #[error("配置错误: {0}")]
    Config(#[from] ConfigError),
}

/// 输入校验错误
///
/// 任何校验错误都会在发起远程调用之前拒绝整个批次。
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    /// 没有任何有效的测试用例
    #[error("{}", empty_input_message(.origin))]
    EmptyInput { origin: InputSource },
    /// 测试用例过短（只报告第一个）
    #[error("测试用例 \"{item}\" 至少需要 {min_len} 个字符")]
    TooShort { item: String, min_len: usize },
    /// 日期无法映射为当地时间区间
    #[error("无效日期: {date}")]
    InvalidDate { date: String },
}

fn empty_input_message(origin: &InputSource) -> &'static str {
    match origin {
        InputSource::Text => "请至少输入一个测试用例",
        InputSource::Csv => "CSV 文件中没有有效的测试用例",
    }
}

/// 单条分类调用错误（只影响该条目，不会中断批次）
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ClassificationError {
    /// 远端返回了非成功状态码
    #[error("分类服务返回错误状态: {status}")]
    RemoteRejected { status: u16 },
    /// 调用本身没有完成（网络中断、超时、响应无法解析等）
    #[error("分类请求失败: {reason}")]
    TransportFailure { reason: String },
}

/// 历史存储错误
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StoreError {
    /// 追加记录失败
    #[error("追加记录失败 (用户: {user_id}): {reason}")]
    AppendFailure { user_id: UserId, reason: String },
    /// 查询失败（可重试）
    #[error("查询历史失败 (用户: {user_id}): {reason}")]
    QueryFailure { user_id: UserId, reason: String },
    /// 删除单条记录失败
    #[error("删除记录 {id} 失败: {reason}")]
    DeleteFailure { id: RecordId, reason: String },
}

/// 分页读取器错误
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ReaderError {
    /// 游标属于旧的过滤条件，必须先重新加载第一页
    #[error("游标已过期，请先重新加载第一页")]
    StaleCursor,
    /// 已有加载请求在进行中
    #[error("已有加载请求在进行中")]
    Busy,
    /// 查询失败，已加载的数据保持不变
    #[error(transparent)]
    Store(#[from] StoreError),
}

/// 批量删除错误
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EraseError {
    /// 获取现有记录失败，未发起任何删除
    #[error("获取待删除记录失败: {0}")]
    Query(StoreError),
    /// 部分记录删除失败
    #[error("{} 条记录删除失败 (已删除 {deleted} 条)", .failed_ids.len())]
    PartialEraseFailure {
        failed_ids: Vec<RecordId>,
        deleted: usize,
    },
}

/// 导出错误
#[derive(Debug, Error)]
pub enum ExportError {
    /// 没有可导出的数据
    #[error("没有可导出的数据")]
    NoData,
    /// 写入 CSV 失败
    #[error("写入导出文件失败 ({path}): {source}")]
    WriteFailed {
        path: String,
        #[source]
        source: csv::Error,
    },
}

/// 文件操作错误
#[derive(Debug, Error)]
pub enum FileError {
    /// 文件不存在
    #[error("文件不存在: {path}")]
    NotFound { path: String },
    /// 读取文件失败
    #[error("读取文件失败 ({path}): {source}")]
    ReadFailed {
        path: String,
        #[source]
        source: std::io::Error,
    },
    /// 写入文件失败
    #[error("写入文件失败 ({path}): {source}")]
    WriteFailed {
        path: String,
        #[source]
        source: std::io::Error,
    },
    /// CSV 解析失败
    #[error("CSV解析失败 ({path}): {source}")]
    CsvParseFailed {
        path: String,
        #[source]
        source: csv::Error,
    },
    /// CSV 缺少指定列
    #[error("CSV 缺少 \"{column}\" 列: {path}")]
    MissingColumn { path: String, column: String },
    /// JSON 解析失败
    #[error("JSON解析失败 ({path}): {source}")]
    JsonParseFailed {
        path: String,
        #[source]
        source: serde_json::Error,
    },
    /// TOML 解析失败
    #[error("TOML解析失败 ({path}): {source}")]
    TomlParseFailed {
        path: String,
        #[source]
        source: toml::de::Error,
    },
}

/// 配置错误
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    /// 环境变量解析失败
    #[error("环境变量 {var_name} 解析失败: 值 '{value}' 无法转换为 {expected_type}")]
    EnvVarParseFailed {
        var_name: String,
        value: String,
        expected_type: String,
    },
    /// 配置项取值不合法
    #[error("配置项 {field} 不合法: {reason}")]
    InvalidValue { field: String, reason: String },
}

// ========== 便捷构造函数 ==========

impl StoreError {
    /// 创建追加失败错误
    pub fn append(user_id: &UserId, reason: impl Into<String>) -> Self {
        StoreError::AppendFailure {
            user_id: user_id.clone(),
            reason: reason.into(),
        }
    }

    /// 创建查询失败错误
    pub fn query(user_id: &UserId, reason: impl Into<String>) -> Self {
        StoreError::QueryFailure {
            user_id: user_id.clone(),
            reason: reason.into(),
        }
    }

    /// 创建删除失败错误
    pub fn delete(id: &RecordId, reason: impl Into<String>) -> Self {
        StoreError::DeleteFailure {
            id: id.clone(),
            reason: reason.into(),
        }
    }
}

impl ClassificationError {
    pub fn transport(reason: impl Into<String>) -> Self {
        ClassificationError::TransportFailure {
            reason: reason.into(),
        }
    }
}

// ========== Result 类型别名 ==========

/// 应用程序结果类型
pub type AppResult<T> = Result<T, AppError>;
