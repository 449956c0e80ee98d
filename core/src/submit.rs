// Submit module - 提交前的输入校验与提交保护
// 校验失败不会发出任何网络请求

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

use crate::findings::Status;

/// 未提供文件名时的默认名称
pub const DEFAULT_DOCUMENT_NAME: &str = "workflow.yml";

/// 默认上传大小上限 1 MiB
pub const DEFAULT_MAX_UPLOAD_BYTES: usize = 1024 * 1024;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SubmitError {
    #[error("Please choose a YAML file or paste a workflow first.")]
    NoInput,

    #[error("The uploaded file is empty.")]
    EmptyUpload,

    #[error("The pasted workflow is empty.")]
    EmptyPaste,

    #[error("File too large. MAX_UPLOAD_BYTES={limit}")]
    TooLarge { limit: usize },

    #[error("Could not read file: {0}")]
    Read(String),

    #[error("A scan is already in progress.")]
    InFlight,

    #[error("level must be one of L1, L2, L3 (got `{0}`)")]
    InvalidLevel(String),

    #[error("only_status must be one of FAIL, WARN, PASS, SKIP (got `{0}`)")]
    InvalidStatusFilter(String),
}

/// 扫描严格程度
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum Level {
    #[default]
    L1,
    L2,
    L3,
}

impl Level {
    pub const ALL: [Level; 3] = [Level::L1, Level::L2, Level::L3];

    pub fn as_str(&self) -> &'static str {
        match self {
            Level::L1 => "L1",
            Level::L2 => "L2",
            Level::L3 => "L3",
        }
    }
}

impl fmt::Display for Level {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Level {
    type Err = SubmitError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_uppercase().as_str() {
            "L1" => Ok(Level::L1),
            "L2" => Ok(Level::L2),
            "L3" => Ok(Level::L3),
            _ => Err(SubmitError::InvalidLevel(s.to_string())),
        }
    }
}

/// 扫描参数
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScanParams {
    pub level: Level,
    pub only_status: Option<Status>,
}

impl ScanParams {
    /// 解析表单原始值，空值使用默认级别且不过滤状态
    pub fn parse(
        level: Option<&str>,
        only_status: Option<&str>,
        default_level: Level,
    ) -> Result<Self, SubmitError> {
        let level = match level.map(str::trim).filter(|s| !s.is_empty()) {
            Some(raw) => raw.parse()?,
            None => default_level,
        };
        let only_status = match only_status.map(str::trim).filter(|s| !s.is_empty()) {
            Some(raw) => Some(
                Status::parse(raw).ok_or_else(|| SubmitError::InvalidStatusFilter(raw.to_string()))?,
            ),
            None => None,
        };
        Ok(Self { level, only_status })
    }
}

/// 校验后的工作流文档
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Document {
    pub name: String,
    pub text: String,
}

/// 用户提交的内容：上传文件、粘贴文本或什么都没有
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ScanInput {
    Nothing,
    Upload { name: String, bytes: Vec<u8> },
    Paste { name: Option<String>, text: String },
}

impl ScanInput {
    pub fn into_document(self, max_bytes: usize) -> Result<Document, SubmitError> {
        match self {
            ScanInput::Nothing => Err(SubmitError::NoInput),
            ScanInput::Upload { name, bytes } => {
                if bytes.len() > max_bytes {
                    return Err(SubmitError::TooLarge { limit: max_bytes });
                }
                let text = String::from_utf8(bytes).map_err(|e| SubmitError::Read(e.to_string()))?;
                let text = strip_bom(text);
                if text.trim().is_empty() {
                    return Err(SubmitError::EmptyUpload);
                }
                Ok(Document {
                    name: document_name(Some(name)),
                    text,
                })
            }
            ScanInput::Paste { name, text } => {
                if text.len() > max_bytes {
                    return Err(SubmitError::TooLarge { limit: max_bytes });
                }
                if text.trim().is_empty() {
                    return Err(SubmitError::EmptyPaste);
                }
                Ok(Document {
                    name: document_name(name),
                    text,
                })
            }
        }
    }
}

fn document_name(name: Option<String>) -> String {
    name.map(|n| n.trim().to_string())
        .filter(|n| !n.is_empty())
        .unwrap_or_else(|| DEFAULT_DOCUMENT_NAME.to_string())
}

fn strip_bom(text: String) -> String {
    match text.strip_prefix('\u{feff}') {
        Some(rest) => rest.to_string(),
        None => text,
    }
}

/// 提交序号，用于丢弃过期响应
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Ticket(pub u64);

/// 同一会话的提交保护：进行中标记 + 最新序号
#[derive(Debug, Clone, Default)]
pub struct SubmitGuard {
    in_flight: bool,
    latest: u64,
}

impl SubmitGuard {
    pub fn in_flight(&self) -> bool {
        self.in_flight
    }

    pub fn acquire(&mut self) -> Ticket {
        self.latest += 1;
        self.in_flight = true;
        Ticket(self.latest)
    }

    pub fn release(&mut self) {
        self.in_flight = false;
    }

    /// 使所有已发出的序号失效，同时解除进行中标记
    pub fn invalidate(&mut self) {
        self.latest += 1;
        self.in_flight = false;
    }

    pub fn is_current(&self, ticket: Ticket) -> bool {
        ticket.0 == self.latest
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn nothing_chosen_is_rejected() {
        assert_eq!(
            ScanInput::Nothing.into_document(DEFAULT_MAX_UPLOAD_BYTES),
            Err(SubmitError::NoInput)
        );
    }

    #[test]
    fn empty_upload_and_paste_are_rejected() {
        let upload = ScanInput::Upload {
            name: "ci.yml".to_string(),
            bytes: Vec::new(),
        };
        assert_eq!(upload.into_document(16), Err(SubmitError::EmptyUpload));

        let paste = ScanInput::Paste {
            name: None,
            text: "  \n\t".to_string(),
        };
        assert_eq!(paste.into_document(16), Err(SubmitError::EmptyPaste));
    }

    #[test]
    fn oversized_upload_is_rejected() {
        let upload = ScanInput::Upload {
            name: "ci.yml".to_string(),
            bytes: vec![b'a'; 17],
        };
        assert_eq!(upload.into_document(16), Err(SubmitError::TooLarge { limit: 16 }));
    }

    #[test]
    fn non_utf8_upload_is_a_read_error() {
        let upload = ScanInput::Upload {
            name: "ci.yml".to_string(),
            bytes: vec![0xff, 0xfe, 0x00],
        };
        let err = upload.into_document(16).unwrap_err();
        assert!(matches!(err, SubmitError::Read(_)));
        assert!(err.to_string().starts_with("Could not read file:"));
    }

    #[test]
    fn upload_keeps_name_and_strips_bom() {
        let upload = ScanInput::Upload {
            name: "release.yml".to_string(),
            bytes: "\u{feff}on: push\n".as_bytes().to_vec(),
        };
        let doc = upload.into_document(DEFAULT_MAX_UPLOAD_BYTES).unwrap();
        assert_eq!(doc.name, "release.yml");
        assert_eq!(doc.text, "on: push\n");
    }

    #[test]
    fn paste_without_name_uses_default() {
        let paste = ScanInput::Paste {
            name: Some("  ".to_string()),
            text: "on: push".to_string(),
        };
        assert_eq!(paste.into_document(64).unwrap().name, DEFAULT_DOCUMENT_NAME);
    }

    #[test]
    fn params_default_and_normalize() {
        let params = ScanParams::parse(None, Some(""), Level::L2).unwrap();
        assert_eq!(params.level, Level::L2);
        assert_eq!(params.only_status, None);

        let params = ScanParams::parse(Some("l3"), Some("fail"), Level::L1).unwrap();
        assert_eq!(params.level, Level::L3);
        assert_eq!(params.only_status, Some(Status::Fail));
    }

    #[test]
    fn params_reject_unknown_values() {
        assert_eq!(
            ScanParams::parse(Some("L9"), None, Level::L1),
            Err(SubmitError::InvalidLevel("L9".to_string()))
        );
        assert_eq!(
            ScanParams::parse(None, Some("INFO"), Level::L1),
            Err(SubmitError::InvalidStatusFilter("INFO".to_string()))
        );
    }

    #[test]
    fn guard_tracks_latest_ticket() {
        let mut guard = SubmitGuard::default();
        let first = guard.acquire();
        assert!(guard.in_flight());
        assert!(guard.is_current(first));

        guard.release();
        let second = guard.acquire();
        assert!(!guard.is_current(first));
        assert!(guard.is_current(second));

        guard.invalidate();
        assert!(!guard.is_current(second));
        assert!(!guard.in_flight());
    }
}
