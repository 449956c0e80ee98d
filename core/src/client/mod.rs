// Client module - 外部扫描服务的调用接口
// 规则评估全部在服务端完成，这里只负责请求和响应归一化

pub mod http;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::findings::FindingsResponse;

pub use http::HttpScanClient;

/// 非 2xx 且没有 message 时的兜底文案
pub const REQUEST_FAILED: &str = "Request failed";

/// `POST /api/scan` 请求体
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScanRequest {
    pub level: String,
    pub file_path: String,
    pub workflow: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub only_status: Option<String>,
}

#[derive(Error, Debug)]
pub enum ScanError {
    #[error("transport error: {0}")]
    Transport(#[from] reqwest::Error),

    /// 响应不是 JSON，本地合成 `error: "bad_response"`
    #[error("bad_response (HTTP {status}): {message}")]
    BadResponse { status: u16, message: String },

    #[error("scan service returned HTTP {status}: {}", .message.as_deref().unwrap_or(REQUEST_FAILED))]
    Service {
        status: u16,
        error: Option<String>,
        message: Option<String>,
    },

    #[error("invalid findings payload: {0}")]
    Decode(String),
}

impl ScanError {
    /// 扫描服务 `error` 字段风格的错误码
    pub fn code(&self) -> &str {
        match self {
            ScanError::Transport(_) => "transport_error",
            ScanError::BadResponse { .. } => "bad_response",
            ScanError::Service { error, .. } => error.as_deref().unwrap_or("http_error"),
            ScanError::Decode(_) => "bad_response",
        }
    }

    /// 状态栏展示的文本
    pub fn user_message(&self) -> String {
        let message = match self {
            ScanError::Transport(e) => Some(e.to_string()),
            ScanError::BadResponse { message, .. } => Some(message.clone()),
            ScanError::Service { message, .. } => message.clone(),
            ScanError::Decode(e) => Some(e.clone()),
        };
        message
            .map(|m| m.trim().to_string())
            .filter(|m| !m.is_empty())
            .unwrap_or_else(|| REQUEST_FAILED.to_string())
    }
}

/// 扫描服务接口，web 层通过它调用，测试里可以替换
#[async_trait]
pub trait ScanService: Send + Sync {
    fn name(&self) -> String;

    async fn scan(&self, request: &ScanRequest) -> Result<FindingsResponse, ScanError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_status_is_omitted_when_absent() {
        let req = ScanRequest {
            level: "L1".to_string(),
            file_path: "ci.yml".to_string(),
            workflow: "on: push".to_string(),
            only_status: None,
        };
        let json = serde_json::to_value(&req).unwrap();
        assert_eq!(
            json,
            serde_json::json!({"level": "L1", "file_path": "ci.yml", "workflow": "on: push"})
        );
    }

    #[test]
    fn service_error_without_message_falls_back() {
        let err = ScanError::Service {
            status: 500,
            error: None,
            message: None,
        };
        assert_eq!(err.user_message(), REQUEST_FAILED);
        assert_eq!(err.code(), "http_error");

        let err = ScanError::Service {
            status: 400,
            error: Some("missing_workflow".to_string()),
            message: Some("   ".to_string()),
        };
        assert_eq!(err.user_message(), REQUEST_FAILED);
        assert_eq!(err.code(), "missing_workflow");
    }

    #[test]
    fn bad_response_surfaces_body_text() {
        let err = ScanError::BadResponse {
            status: 502,
            message: "<html>Bad Gateway</html>".to_string(),
        };
        assert_eq!(err.user_message(), "<html>Bad Gateway</html>");
        assert_eq!(err.code(), "bad_response");
    }
}
