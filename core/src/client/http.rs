use async_trait::async_trait;
use reqwest::header::CONTENT_TYPE;
use reqwest::multipart::{Form, Part};
use std::time::Duration;

use super::{ScanError, ScanRequest, ScanService};
use crate::findings::{FindingsResponse, ScanErrorBody};

/// 基于 reqwest 的扫描服务客户端
#[derive(Clone)]
pub struct HttpScanClient {
    http: reqwest::Client,
    base_url: String,
    legacy_upload: bool,
}

impl HttpScanClient {
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self, ScanError> {
        let http = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
            legacy_upload: false,
        })
    }

    /// 使用旧的 multipart 接口 `/api/scan/file`
    pub fn with_legacy_upload(mut self, legacy_upload: bool) -> Self {
        self.legacy_upload = legacy_upload;
        self
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    async fn scan_json(&self, request: &ScanRequest) -> Result<FindingsResponse, ScanError> {
        let url = format!("{}/api/scan", self.base_url);
        let resp = self.http.post(&url).json(request).send().await?;
        decode_response(resp).await
    }

    async fn scan_upload(&self, request: &ScanRequest) -> Result<FindingsResponse, ScanError> {
        let url = format!("{}/api/scan/file", self.base_url);
        let file = Part::text(request.workflow.clone())
            .file_name(request.file_path.clone())
            .mime_str("application/x-yaml")?;

        let mut form = Form::new()
            .part("file", file)
            .text("level", request.level.clone());
        if let Some(only_status) = &request.only_status {
            form = form.text("only_status", only_status.clone());
        }

        let resp = self.http.post(&url).multipart(form).send().await?;
        decode_response(resp).await
    }
}

#[async_trait]
impl ScanService for HttpScanClient {
    fn name(&self) -> String {
        "HttpScanClient".to_string()
    }

    async fn scan(&self, request: &ScanRequest) -> Result<FindingsResponse, ScanError> {
        tracing::debug!(
            "Submitting {} ({} bytes, level {}) to {}",
            request.file_path,
            request.workflow.len(),
            request.level,
            self.base_url
        );
        if self.legacy_upload {
            self.scan_upload(request).await
        } else {
            self.scan_json(request).await
        }
    }
}

/// 归一化扫描服务响应：非 JSON 为 BadResponse，非 2xx 为 Service
async fn decode_response(resp: reqwest::Response) -> Result<FindingsResponse, ScanError> {
    let status = resp.status();
    let is_json = resp
        .headers()
        .get(CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .map(|ct| ct.contains("application/json"))
        .unwrap_or(false);
    let body = resp.text().await?;

    if !is_json {
        return Err(ScanError::BadResponse {
            status: status.as_u16(),
            message: body,
        });
    }

    if !status.is_success() {
        // 错误体格式不对时也只按状态码处理
        let parsed: Option<ScanErrorBody> = serde_json::from_str(&body).ok();
        let (error, message) = parsed.map(|b| (b.error, b.message)).unwrap_or((None, None));
        return Err(ScanError::Service {
            status: status.as_u16(),
            error,
            message,
        });
    }

    serde_json::from_str(&body).map_err(|e| ScanError::Decode(e.to_string()))
}
