use crate::error::{ConfigError, FileError};
use crate::models::DEFAULT_LABELS;
use serde::Deserialize;
use std::path::Path;

/// 分类服务后端
#[derive(Clone, Copy, Debug, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ClassifierBackend {
    /// 自建分类接口：`{text, labels}` -> `{label}`
    Endpoint,
    /// HuggingFace zero-shot 推理接口
    HuggingFace,
}

impl std::str::FromStr for ClassifierBackend {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "endpoint" => Ok(ClassifierBackend::Endpoint),
            "huggingface" | "hf" => Ok(ClassifierBackend::HuggingFace),
            _ => Err(ConfigError::EnvVarParseFailed {
                var_name: "CLASSIFIER_BACKEND".to_string(),
                value: s.to_string(),
                expected_type: "endpoint | huggingface".to_string(),
            }),
        }
    }
}

/// 程序配置
#[derive(Clone, Debug)]
pub struct Config {
    // --- 分类服务配置 ---
    pub classifier_backend: ClassifierBackend,
    pub classifier_url: String,
    pub huggingface_api_url: String,
    pub huggingface_api_token: String,
    /// 单次分类请求的超时时间（秒）
    pub request_timeout_secs: u64,
    /// 候选标签
    pub labels: Vec<String>,
    // --- 历史记录配置 ---
    /// 每页记录数
    pub page_size: usize,
    /// 历史记录文件
    pub history_file: String,
    /// 分类失败的结果是否也写入历史
    pub persist_failed_predictions: bool,
    /// 是否显示详细日志
    pub verbose_logging: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            classifier_backend: ClassifierBackend::Endpoint,
            classifier_url: "http://localhost:5000/classify".to_string(),
            huggingface_api_url:
                "https://api-inference.huggingface.co/models/valhalla/distilbart-mnli-12-1"
                    .to_string(),
            huggingface_api_token: String::new(),
            request_timeout_secs: 10,
            labels: DEFAULT_LABELS.iter().map(|l| l.to_string()).collect(),
            page_size: 5,
            history_file: "history.json".to_string(),
            persist_failed_predictions: true,
            verbose_logging: false,
        }
    }
}

/// TOML 配置文件，所有字段可选，缺省时使用默认值
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct ConfigFile {
    classifier_backend: Option<ClassifierBackend>,
    classifier_url: Option<String>,
    huggingface_api_url: Option<String>,
    huggingface_api_token: Option<String>,
    request_timeout_secs: Option<u64>,
    labels: Option<Vec<String>>,
    page_size: Option<usize>,
    history_file: Option<String>,
    persist_failed_predictions: Option<bool>,
    verbose_logging: Option<bool>,
}

impl Config {
    pub fn from_env() -> Self {
        Self::default().with_env_overrides()
    }

    /// 读取 TOML 配置文件，再叠加环境变量
    pub fn from_toml_file(path: &Path) -> Result<Self, FileError> {
        let path_str = path.display().to_string();
        let content = std::fs::read_to_string(path).map_err(|e| FileError::ReadFailed {
            path: path_str.clone(),
            source: e,
        })?;
        let file = Self::parse_toml(&content, &path_str)?;
        Ok(Self::default().with_file(file).with_env_overrides())
    }

    fn parse_toml(content: &str, path: &str) -> Result<ConfigFile, FileError> {
        toml::from_str(content).map_err(|e| FileError::TomlParseFailed {
            path: path.to_string(),
            source: e,
        })
    }

    fn with_file(self, file: ConfigFile) -> Self {
        Self {
            classifier_backend: file.classifier_backend.unwrap_or(self.classifier_backend),
            classifier_url: file.classifier_url.unwrap_or(self.classifier_url),
            huggingface_api_url: file.huggingface_api_url.unwrap_or(self.huggingface_api_url),
            huggingface_api_token: file
                .huggingface_api_token
                .unwrap_or(self.huggingface_api_token),
            request_timeout_secs: file
                .request_timeout_secs
                .unwrap_or(self.request_timeout_secs),
            labels: file.labels.unwrap_or(self.labels),
            page_size: file.page_size.unwrap_or(self.page_size),
            history_file: file.history_file.unwrap_or(self.history_file),
            persist_failed_predictions: file
                .persist_failed_predictions
                .unwrap_or(self.persist_failed_predictions),
            verbose_logging: file.verbose_logging.unwrap_or(self.verbose_logging),
        }
    }

    fn with_env_overrides(self) -> Self {
        Self {
            classifier_backend: std::env::var("CLASSIFIER_BACKEND").ok().and_then(|v| v.parse().ok()).unwrap_or(self.classifier_backend),
            classifier_url: std::env::var("CLASSIFIER_URL").unwrap_or(self.classifier_url),
            huggingface_api_url: std::env::var("HF_API_URL").unwrap_or(self.huggingface_api_url),
            huggingface_api_token: std::env::var("HF_API_TOKEN").unwrap_or(self.huggingface_api_token),
            request_timeout_secs: std::env::var("REQUEST_TIMEOUT_SECS").ok().and_then(|v| v.parse().ok()).unwrap_or(self.request_timeout_secs),
            labels: std::env::var("CLASSIFIER_LABELS").ok().map(|v| parse_labels(&v)).unwrap_or(self.labels),
            page_size: std::env::var("PAGE_SIZE").ok().and_then(|v| v.parse().ok()).unwrap_or(self.page_size),
            history_file: std::env::var("HISTORY_FILE").unwrap_or(self.history_file),
            persist_failed_predictions: std::env::var("PERSIST_FAILED_PREDICTIONS").ok().and_then(|v| v.parse().ok()).unwrap_or(self.persist_failed_predictions),
            verbose_logging: std::env::var("VERBOSE_LOGGING").ok().and_then(|v| v.parse().ok()).unwrap_or(self.verbose_logging),
        }
    }

    /// 检查配置是否可用
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.labels.is_empty() {
            return Err(ConfigError::InvalidValue {
                field: "labels".to_string(),
                reason: "至少需要一个标签".to_string(),
            });
        }
        if self.page_size == 0 {
            return Err(ConfigError::InvalidValue {
                field: "page_size".to_string(),
                reason: "必须大于 0".to_string(),
            });
        }
        Ok(())
    }
}

/// 逗号分隔的标签列表
fn parse_labels(value: &str) -> Vec<String> {
    value
        .split(',')
        .map(str::trim)
        .filter(|l| !l.is_empty())
        .map(str::to_string)
        .collect()
}
