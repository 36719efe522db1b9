//! HTTP 分类客户端
//!
//! 两种后端共用同一套错误分类：
//! - 非 2xx 状态码 -> `RemoteRejected`
//! - 网络错误、超时、响应体无法解析 -> `TransportFailure`

use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::Deserialize;
use serde_json::json;
use std::time::Duration;
use tracing::{debug, warn};

use crate::error::ClassificationError;
use crate::infrastructure::classifier::Classifier;

fn build_client(timeout: Duration) -> Result<Client, ClassificationError> {
    Client::builder()
        .timeout(timeout)
        .build()
        .map_err(|e| ClassificationError::transport(format!("无法创建 HTTP 客户端: {}", e)))
}

fn transport_error(endpoint: &str, err: reqwest::Error) -> ClassificationError {
    let reason = if err.is_timeout() {
        format!("请求超时 ({})", endpoint)
    } else {
        format!("{} ({})", err, endpoint)
    };
    warn!("分类请求未完成: {}", reason);
    ClassificationError::TransportFailure { reason }
}

fn check_status(endpoint: &str, status: StatusCode) -> Result<(), ClassificationError> {
    if status.is_success() {
        Ok(())
    } else {
        warn!("分类服务返回错误状态 {} ({})", status, endpoint);
        Err(ClassificationError::RemoteRejected {
            status: status.as_u16(),
        })
    }
}

// ========== 自建分类接口 ==========

/// 分类接口的响应：`{"label": "..."}`
#[derive(Debug, Deserialize)]
struct EndpointResponse {
    #[serde(default)]
    label: Option<String>,
}

/// 解析分类接口的响应体
fn parse_endpoint_body(body: &[u8]) -> Result<Option<String>, ClassificationError> {
    let response: EndpointResponse = serde_json::from_slice(body)
        .map_err(|e| ClassificationError::transport(format!("响应体解析失败: {}", e)))?;
    Ok(response.label.filter(|label| !label.is_empty()))
}

/// 自建分类接口客户端
///
/// 请求 `{text, labels}`，成功时返回 `{label}`
pub struct EndpointClassifier {
    client: Client,
    url: String,
}

impl EndpointClassifier {
    pub fn new(url: impl Into<String>, timeout: Duration) -> Result<Self, ClassificationError> {
        Ok(Self {
            client: build_client(timeout)?,
            url: url.into(),
        })
    }
}

#[async_trait]
impl Classifier for EndpointClassifier {
    async fn classify(
        &self,
        text: &str,
        labels: &[String],
    ) -> Result<Option<String>, ClassificationError> {
        debug!("调用分类接口: {}", self.url);

        let response = self
            .client
            .post(&self.url)
            .json(&json!({ "text": text, "labels": labels }))
            .send()
            .await
            .map_err(|e| transport_error(&self.url, e))?;

        check_status(&self.url, response.status())?;

        let body = response
            .bytes()
            .await
            .map_err(|e| transport_error(&self.url, e))?;

        parse_endpoint_body(&body)
    }
}

// ========== HuggingFace zero-shot 接口 ==========

/// zero-shot 推理结果，`labels` 按得分降序
#[derive(Debug, Deserialize)]
struct ZeroShotResponse {
    #[serde(default)]
    labels: Vec<String>,
}

fn parse_zero_shot_body(body: &[u8]) -> Result<Option<String>, ClassificationError> {
    let response: ZeroShotResponse = serde_json::from_slice(body)
        .map_err(|e| ClassificationError::transport(format!("响应体解析失败: {}", e)))?;
    Ok(response.labels.into_iter().next().filter(|l| !l.is_empty()))
}

/// 直接调用 HuggingFace 推理接口
pub struct HuggingFaceClassifier {
    client: Client,
    url: String,
    token: String,
}

impl HuggingFaceClassifier {
    pub fn new(
        url: impl Into<String>,
        token: impl Into<String>,
        timeout: Duration,
    ) -> Result<Self, ClassificationError> {
        Ok(Self {
            client: build_client(timeout)?,
            url: url.into(),
            token: token.into(),
        })
    }
}

#[async_trait]
impl Classifier for HuggingFaceClassifier {
    async fn classify(
        &self,
        text: &str,
        labels: &[String],
    ) -> Result<Option<String>, ClassificationError> {
        debug!("调用 HuggingFace 推理接口: {}", self.url);

        let payload = json!({
            "inputs": text,
            "parameters": { "candidate_labels": labels }
        });

        let response = self
            .client
            .post(&self.url)
            .bearer_auth(&self.token)
            .json(&payload)
            .send()
            .await
            .map_err(|e| transport_error(&self.url, e))?;

        check_status(&self.url, response.status())?;

        let body = response
            .bytes()
            .await
            .map_err(|e| transport_error(&self.url, e))?;

        parse_zero_shot_body(&body)
    }
}
