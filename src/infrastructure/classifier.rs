//! 远程分类能力
//!
//! 不关心批次，只负责"给一段文本选一个标签"

use async_trait::async_trait;
use std::sync::Arc;
use std::time::Duration;

use crate::config::{ClassifierBackend, Config};
use crate::error::ClassificationError;
use crate::infrastructure::http_classifier::{EndpointClassifier, HuggingFaceClassifier};

/// 远程分类器
///
/// - `Ok(Some(label))`：成功并返回标签
/// - `Ok(None)`：成功但没有可用标签
/// - `Err(_)`：远端拒绝或调用未完成
///
/// 每次调用自己负责超时，超时返回 `TransportFailure`。
#[async_trait]
pub trait Classifier: Send + Sync {
    async fn classify(
        &self,
        text: &str,
        labels: &[String],
    ) -> Result<Option<String>, ClassificationError>;
}

/// 根据配置创建分类器
pub fn build_classifier(config: &Config) -> Result<Arc<dyn Classifier>, ClassificationError> {
    let timeout = Duration::from_secs(config.request_timeout_secs);
    let classifier: Arc<dyn Classifier> = match config.classifier_backend {
        ClassifierBackend::Endpoint => {
            Arc::new(EndpointClassifier::new(&config.classifier_url, timeout)?)
        }
        ClassifierBackend::HuggingFace => Arc::new(HuggingFaceClassifier::new(
            &config.huggingface_api_url,
            &config.huggingface_api_token,
            timeout,
        )?),
    };
    Ok(classifier)
}
